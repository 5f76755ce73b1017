//! Serenity-backed responder
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use serenity::http::Http;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::modal::ModalSubmitInteraction;
use serenity::model::application::interaction::InteractionResponseType;

use crate::dispatch::Responder;

/// The interaction a [`SerenityResponder`] answers.
pub enum ResponderTarget {
    Command(ApplicationCommandInteraction),
    Component(MessageComponentInteraction),
    Modal(ModalSubmitInteraction),
    Autocomplete(AutocompleteInteraction),
}

/// [`Responder`] over a serenity interaction.
pub struct SerenityResponder {
    http: Arc<Http>,
    target: ResponderTarget,
    acknowledged: AtomicBool,
}

impl SerenityResponder {
    pub fn new(http: Arc<Http>, target: ResponderTarget) -> Self {
        Self {
            http,
            target,
            acknowledged: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Responder for SerenityResponder {
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()> {
        match &self.target {
            ResponderTarget::Command(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(content).ephemeral(ephemeral)
                            })
                    })
                    .await?;
            }
            ResponderTarget::Component(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(content).ephemeral(ephemeral)
                            })
                    })
                    .await?;
            }
            ResponderTarget::Modal(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content(content).ephemeral(ephemeral)
                            })
                    })
                    .await?;
            }
            ResponderTarget::Autocomplete(_) => {
                warn!("reply() called on an autocomplete interaction");
                return Ok(());
            }
        }
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn defer(&self) -> Result<()> {
        match &self.target {
            ResponderTarget::Command(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    })
                    .await?;
            }
            ResponderTarget::Component(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    })
                    .await?;
            }
            ResponderTarget::Modal(interaction) => {
                interaction
                    .create_interaction_response(&self.http, |response| {
                        response.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    })
                    .await?;
            }
            ResponderTarget::Autocomplete(_) => {
                warn!("defer() called on an autocomplete interaction");
                return Ok(());
            }
        }
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<()> {
        match &self.target {
            ResponderTarget::Command(interaction) => {
                interaction
                    .create_followup_message(&self.http, |message| {
                        message.content(content).ephemeral(ephemeral)
                    })
                    .await?;
            }
            ResponderTarget::Component(interaction) => {
                interaction
                    .create_followup_message(&self.http, |message| {
                        message.content(content).ephemeral(ephemeral)
                    })
                    .await?;
            }
            ResponderTarget::Modal(interaction) => {
                interaction
                    .create_followup_message(&self.http, |message| {
                        message.content(content).ephemeral(ephemeral)
                    })
                    .await?;
            }
            ResponderTarget::Autocomplete(_) => {
                warn!("follow_up() called on an autocomplete interaction");
            }
        }
        Ok(())
    }

    async fn suggest(&self, choices: Vec<(String, String)>) -> Result<()> {
        match &self.target {
            ResponderTarget::Autocomplete(interaction) => {
                interaction
                    .create_autocomplete_response(&self.http, |response| {
                        for (name, value) in &choices {
                            response.add_string_choice(name, value);
                        }
                        response
                    })
                    .await?;
                Ok(())
            }
            _ => {
                warn!("suggest() called on a non-autocomplete interaction");
                Ok(())
            }
        }
    }

    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }
}

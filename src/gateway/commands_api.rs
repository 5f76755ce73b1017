//! Discord application-command deployment adapter
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::sync::Arc;

use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::application::command::Command;

use crate::core::SyncError;
use crate::sync::{CommandPayload, CommandScope, CommandsGateway};

/// [`CommandsGateway`] over the Discord REST API.
///
/// Remote commands are projected into [`CommandPayload`] through their
/// JSON form, so the diff compares like with like.
pub struct DiscordCommandsGateway {
    http: Arc<Http>,
}

impl DiscordCommandsGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn parse_guild_id(scope: &CommandScope) -> Result<Option<u64>, SyncError> {
        match scope {
            CommandScope::Global => Ok(None),
            CommandScope::Guild(id) => {
                id.parse::<u64>().map(Some).map_err(|_| SyncError::Fetch {
                    scope: scope.to_string(),
                    reason: format!("\"{id}\" is not a valid guild id"),
                })
            }
        }
    }

    fn to_payloads(
        commands: Vec<Command>,
        scope: &CommandScope,
    ) -> Result<Vec<CommandPayload>, SyncError> {
        commands
            .into_iter()
            .map(|command| {
                serde_json::to_value(&command)
                    .and_then(serde_json::from_value)
                    .map_err(|e| SyncError::Fetch {
                        scope: scope.to_string(),
                        reason: format!("unparseable remote command: {e}"),
                    })
            })
            .collect()
    }
}

#[async_trait]
impl CommandsGateway for DiscordCommandsGateway {
    async fn fetch_commands(
        &self,
        scope: &CommandScope,
    ) -> Result<Vec<CommandPayload>, SyncError> {
        let result = match Self::parse_guild_id(scope)? {
            None => self.http.get_global_application_commands().await,
            Some(guild_id) => self.http.get_guild_application_commands(guild_id).await,
        };

        let commands = result.map_err(|e| SyncError::Fetch {
            scope: scope.to_string(),
            reason: e.to_string(),
        })?;

        Self::to_payloads(commands, scope)
    }

    async fn replace_commands(
        &self,
        scope: &CommandScope,
        commands: &[CommandPayload],
    ) -> Result<(), SyncError> {
        let body = serde_json::to_value(commands).map_err(|e| SyncError::Replace {
            scope: scope.to_string(),
            reason: e.to_string(),
        })?;

        let result = match Self::parse_guild_id(scope).map_err(|e| match e {
            SyncError::Fetch { scope, reason } => SyncError::Replace { scope, reason },
            other => other,
        })? {
            None => self
                .http
                .create_global_application_commands(&body)
                .await
                .map(|_| ()),
            Some(guild_id) => self
                .http
                .create_guild_application_commands(guild_id, &body)
                .await
                .map(|_| ()),
        };

        result.map_err(|e| SyncError::Replace {
            scope: scope.to_string(),
            reason: e.to_string(),
        })
    }
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use log::info;

use relay::store::UserPatch;
use relay::{Bootstrap, Config, HandlerContext};

/// Updates the invoking user's stored locale preference.
///
/// Accepts the locale from a select-menu value, a modal field, or a
/// command option, so the language command, component and modal can all
/// share it.
fn set_language() -> relay::NativeHandler {
    Arc::new(|ctx: Arc<HandlerContext>| {
        Box::pin(async move {
            let locale = ctx
                .values()
                .first()
                .cloned()
                .or_else(|| ctx.field("locale").map(String::from))
                .or_else(|| ctx.option_str("locale").map(String::from))
                .ok_or_else(|| anyhow!("no locale value provided"))?;

            let user_id = ctx
                .params
                .get("user")
                .map(ToString::to_string)
                .or_else(|| ctx.user_id().map(String::from))
                .ok_or_else(|| anyhow!("no user to update"))?;

            ctx.services
                .store
                .update_fields(
                    &user_id,
                    UserPatch {
                        locale: Some(locale.clone()),
                        ..Default::default()
                    },
                )
                .await?;

            if let Some(responder) = ctx.responder() {
                let message = ctx
                    .services
                    .translator
                    .translate(&locale, "language.updated", &[("locale", &locale)]);
                responder.reply(&message, true).await?;
            }
            Ok(())
        })
    })
}

/// Logs a banner once the gateway reports ready.
fn announce_ready() -> relay::NativeHandler {
    Arc::new(|_ctx: Arc<HandlerContext>| {
        Box::pin(async move {
            info!("All handlers registered; runtime is ready.");
            Ok(())
        })
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_level),
    )
    .init();

    info!("Starting relay...");

    Bootstrap::new(config)
        .register_action("set_language", set_language())
        .register_action("announce_ready", announce_ready())
        .run()
        .await
}

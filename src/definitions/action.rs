//! Executable bodies for handler definitions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use log::{debug, warn};

use crate::dispatch::HandlerContext;

/// Boxed async handler body provided by the host application.
pub type NativeHandler =
    Arc<dyn Fn(Arc<HandlerContext>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A templated reply sent back on the triggering interaction.
///
/// `{name}` placeholders are substituted with extracted route parameters
/// before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplySpec {
    pub content: String,
    pub ephemeral: bool,
}

/// A subprocess invocation whose stdout becomes the reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecSpec {
    pub command: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

/// The executable body of a handler definition.
///
/// Manifest modules reference native actions by name; a name that does not
/// resolve against the host's [`ActionTable`] produces `Unresolved`, which
/// run-validation rejects so the definition is skipped rather than stored
/// with a body that can never execute.
#[derive(Clone)]
pub enum HandlerAction {
    /// Host-registered Rust closure.
    Native(NativeHandler),
    /// Templated reply string.
    Reply(ReplySpec),
    /// Subprocess execution (plugin-style).
    Exec(ExecSpec),
    /// Named native action that failed table lookup.
    Unresolved(String),
}

impl fmt::Debug for HandlerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(_) => f.write_str("Native(..)"),
            Self::Reply(spec) => f.debug_tuple("Reply").field(spec).finish(),
            Self::Exec(spec) => f.debug_tuple("Exec").field(spec).finish(),
            Self::Unresolved(name) => f.debug_tuple("Unresolved").field(name).finish(),
        }
    }
}

impl HandlerAction {
    /// Structural check used by the run-action validator.
    ///
    /// Returns the reason the action cannot run, or `None` if it is sound.
    pub fn unrunnable_reason(&self) -> Option<String> {
        match self {
            Self::Native(_) => None,
            Self::Reply(spec) if spec.content.trim().is_empty() => {
                Some("reply action has empty content".to_string())
            }
            Self::Reply(_) => None,
            Self::Exec(spec) if spec.command.trim().is_empty() => {
                Some("exec action has no command".to_string())
            }
            Self::Exec(_) => None,
            Self::Unresolved(name) => {
                Some(format!("native action \"{name}\" is not registered"))
            }
        }
    }

    /// Execute the action against the given invocation context.
    pub async fn invoke(&self, ctx: Arc<HandlerContext>) -> Result<()> {
        match self {
            Self::Native(handler) => handler(ctx).await,
            Self::Reply(spec) => {
                let content = interpolate(&spec.content, &ctx);
                match ctx.responder() {
                    Some(responder) => responder.reply(&content, spec.ephemeral).await,
                    None => {
                        // Tasks and lifecycle events have no interaction to
                        // answer; the rendered reply goes to the log instead.
                        debug!("[{}] reply action without responder: {content}", ctx.request_id);
                        Ok(())
                    }
                }
            }
            Self::Exec(spec) => {
                let output = run_exec(spec).await?;
                match ctx.responder() {
                    Some(responder) => responder.reply(output.trim(), false).await,
                    None => {
                        debug!("[{}] exec action output: {}", ctx.request_id, output.trim());
                        Ok(())
                    }
                }
            }
            Self::Unresolved(name) => Err(anyhow!("native action \"{name}\" is not registered")),
        }
    }
}

/// Substitute `{name}` placeholders with route parameters.
fn interpolate(template: &str, ctx: &HandlerContext) -> String {
    let mut rendered = template.to_string();
    for (name, value) in ctx.params.iter() {
        rendered = rendered.replace(&format!("{{{name}}}"), &value.to_string());
    }
    rendered
}

async fn run_exec(spec: &ExecSpec) -> Result<String> {
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(spec.timeout_secs),
        tokio::process::Command::new(&spec.command)
            .args(&spec.args)
            .output(),
    )
    .await
    .map_err(|_| anyhow!("exec action timed out after {} seconds", spec.timeout_secs))??;

    if !result.status.success() {
        warn!(
            "exec action \"{}\" exited with {}",
            spec.command, result.status
        );
    }

    Ok(String::from_utf8_lossy(&result.stdout).to_string())
}

/// Lookup table of host-registered native actions, keyed by name.
///
/// Populated by the composition root before the module loader runs, so
/// manifests can reference actions with `builtin: <name>`.
#[derive(Default)]
pub struct ActionTable {
    actions: std::collections::HashMap<String, NativeHandler>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: NativeHandler) {
        self.actions.insert(name.into(), handler);
    }

    /// Resolve a named action into a `HandlerAction`.
    ///
    /// Unknown names yield `Unresolved`, deferring the failure to the
    /// registry's validation step.
    pub fn resolve(&self, name: &str) -> HandlerAction {
        match self.actions.get(name) {
            Some(handler) => HandlerAction::Native(Arc::clone(handler)),
            None => HandlerAction::Unresolved(name.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrunnable_reasons() {
        let empty_reply = HandlerAction::Reply(ReplySpec {
            content: "   ".into(),
            ephemeral: false,
        });
        assert!(empty_reply.unrunnable_reason().is_some());

        let reply = HandlerAction::Reply(ReplySpec {
            content: "Pong!".into(),
            ephemeral: true,
        });
        assert!(reply.unrunnable_reason().is_none());

        let empty_exec = HandlerAction::Exec(ExecSpec {
            command: "".into(),
            args: vec![],
            timeout_secs: 30,
        });
        assert!(empty_exec.unrunnable_reason().is_some());

        let unresolved = HandlerAction::Unresolved("missing".into());
        assert!(unresolved
            .unrunnable_reason()
            .unwrap()
            .contains("missing"));
    }

    #[test]
    fn test_action_table_resolve() {
        let mut table = ActionTable::new();
        table.register(
            "noop",
            Arc::new(|_ctx| Box::pin(async { Ok(()) }) as BoxFuture<'static, Result<()>>),
        );

        assert!(matches!(table.resolve("noop"), HandlerAction::Native(_)));
        assert!(matches!(
            table.resolve("absent"),
            HandlerAction::Unresolved(_)
        ));
    }
}

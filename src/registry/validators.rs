//! Validator chain for handler registration
//!
//! Single-responsibility checks applied by each registry in a fixed order,
//! short-circuiting on the first failure. Order matters: required-field
//! checks run before checks that assume those fields exist.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::ValidationError;
use crate::definitions::{
    CommandDefinition, CommandKind, ComponentDefinition, Definition, TaskDefinition,
    CUSTOM_ID_MAX_LEN, MIN_INTERVAL_MS, Schedule,
};
use crate::schedule::CronExpr;

/// One link of a validation chain.
pub trait Validator<T>: Send + Sync {
    fn check(&self, item: &T) -> Result<(), ValidationError>;
}

/// Run a chain in order, aborting on the first failure.
pub fn run_chain<T>(
    validators: &[Box<dyn Validator<T>>],
    item: &T,
) -> Result<(), ValidationError> {
    for validator in validators {
        validator.check(item)?;
    }
    Ok(())
}

/// Requires a non-empty, non-blank registry key.
pub struct NameValidator;

impl<T: Definition> Validator<T> for NameValidator {
    fn check(&self, item: &T) -> Result<(), ValidationError> {
        if item.key().trim().is_empty() {
            return Err(ValidationError::new("item must have a non-empty name"));
        }
        Ok(())
    }
}

/// Requires a runnable action body.
///
/// The structural analogue of "run must be a function": unresolved native
/// references, empty reply templates and commandless execs are rejected.
pub struct RunActionValidator;

impl<T: Definition> Validator<T> for RunActionValidator {
    fn check(&self, item: &T) -> Result<(), ValidationError> {
        if let Some(reason) = item.action().unrunnable_reason() {
            return Err(ValidationError::new(format!(
                "item \"{}\" has no runnable action: {reason}",
                item.key()
            )));
        }
        Ok(())
    }
}

/// Requires a valid schedule: interval ≥ 1000 ms, or a parseable cron
/// expression.
pub struct TaskScheduleValidator;

impl Validator<TaskDefinition> for TaskScheduleValidator {
    fn check(&self, item: &TaskDefinition) -> Result<(), ValidationError> {
        match &item.schedule {
            Schedule::Every(ms) if *ms < MIN_INTERVAL_MS => Err(ValidationError::new(format!(
                "task \"{}\" interval must be at least {MIN_INTERVAL_MS}ms (1 second)",
                item.name
            ))),
            Schedule::Every(_) => Ok(()),
            Schedule::Cron(expr) => match expr.parse::<CronExpr>() {
                Ok(_) => Ok(()),
                Err(e) => Err(ValidationError::new(format!(
                    "task \"{}\" has an invalid cron pattern \"{expr}\": {e}",
                    item.name
                ))),
            },
        }
    }
}

/// Requires a routable custom id: non-empty, within the platform length
/// limit, with a literal first segment usable as the static key.
pub struct CustomIdValidator;

impl Validator<ComponentDefinition> for CustomIdValidator {
    fn check(&self, item: &ComponentDefinition) -> Result<(), ValidationError> {
        let custom_id = item.custom_id.trim();
        if custom_id.is_empty() {
            return Err(ValidationError::new(
                "component must have a non-empty custom id",
            ));
        }
        if item.custom_id.len() > CUSTOM_ID_MAX_LEN {
            return Err(ValidationError::new(format!(
                "custom id \"{}\" exceeds maximum length of {CUSTOM_ID_MAX_LEN} characters",
                item.custom_id
            )));
        }

        let static_key = item.static_key();
        if static_key.is_empty() {
            return Err(ValidationError::new(format!(
                "could not determine a static key for custom id \"{}\"",
                item.custom_id
            )));
        }
        if static_key.starts_with('{') {
            return Err(ValidationError::new(format!(
                "custom id \"{}\" must start with a literal segment",
                item.custom_id
            )));
        }
        Ok(())
    }
}

/// Requires every schema parameter to be bound by a `{name}` segment of the
/// custom-id pattern.
///
/// The component kind itself is a closed enum, so kind validity is a
/// compile-time property; this check covers the remaining structural way a
/// component declaration can be inconsistent with its own pattern.
pub struct SchemaParamsValidator;

impl Validator<ComponentDefinition> for SchemaParamsValidator {
    fn check(&self, item: &ComponentDefinition) -> Result<(), ValidationError> {
        for field in item.params.fields.keys() {
            let placeholder = format!("{{{field}}}");
            let bound = item
                .custom_id
                .split('/')
                .any(|segment| segment == placeholder);
            if !bound {
                return Err(ValidationError::new(format!(
                    "component \"{}\" declares schema param \"{field}\" that no pattern segment binds",
                    item.custom_id
                )));
            }
        }
        Ok(())
    }
}

/// Schema-based command validation, discriminated on the command kind.
pub struct CommandSchemaValidator;

impl Validator<CommandDefinition> for CommandSchemaValidator {
    fn check(&self, item: &CommandDefinition) -> Result<(), ValidationError> {
        if item.name.trim().is_empty() {
            return Err(ValidationError::new("command name cannot be empty"));
        }
        if item.name.len() > 32 {
            return Err(ValidationError::new(format!(
                "command name \"{}\" exceeds 32 characters",
                item.name
            )));
        }

        match item.kind {
            CommandKind::ChatInput => {
                if item.description.trim().is_empty() {
                    return Err(ValidationError::new(format!(
                        "chat input command \"{}\" must have a description",
                        item.name
                    )));
                }
                if item
                    .name
                    .chars()
                    .any(|c| c.is_uppercase() || c.is_whitespace())
                {
                    return Err(ValidationError::new(format!(
                        "chat input command name \"{}\" must be lowercase with no spaces",
                        item.name
                    )));
                }
            }
            // Context menu commands display their name verbatim and carry
            // no description on the wire.
            CommandKind::User | CommandKind::Message => {}
        }

        for guild in &item.guilds {
            if !crate::core::is_valid_snowflake(guild) {
                return Err(ValidationError::new(format!(
                    "command \"{}\" declares invalid guild id \"{guild}\"",
                    item.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{
        ComponentKind, HandlerAction, ParamSpec, ParamsSchema, ReplySpec,
    };

    fn reply_action() -> HandlerAction {
        HandlerAction::Reply(ReplySpec {
            content: "ok".into(),
            ephemeral: false,
        })
    }

    fn component(custom_id: &str) -> ComponentDefinition {
        ComponentDefinition {
            custom_id: custom_id.into(),
            kind: ComponentKind::Button,
            params: ParamsSchema::default(),
            silent: true,
            action: reply_action(),
        }
    }

    fn task(schedule: Schedule) -> TaskDefinition {
        TaskDefinition {
            name: "beat".into(),
            schedule,
            run_immediately: false,
            silent: true,
            action: reply_action(),
        }
    }

    fn command(name: &str, kind: CommandKind, description: &str) -> CommandDefinition {
        CommandDefinition {
            name: name.into(),
            kind,
            description: description.into(),
            options: vec![],
            guilds: vec![],
            default_member_permissions: None,
            contexts: None,
            middlewares: vec![],
            silent: true,
            action: reply_action(),
        }
    }

    #[test]
    fn test_run_action_validator_rejects_unresolved() {
        let mut item = component("menu/open");
        item.action = HandlerAction::Unresolved("ghost".into());
        assert!(RunActionValidator.check(&item).is_err());
        item.action = reply_action();
        assert!(RunActionValidator.check(&item).is_ok());
    }

    #[test]
    fn test_task_schedule_interval_minimum() {
        assert!(TaskScheduleValidator.check(&task(Schedule::Every(999))).is_err());
        assert!(TaskScheduleValidator.check(&task(Schedule::Every(1000))).is_ok());
    }

    #[test]
    fn test_task_schedule_cron() {
        assert!(TaskScheduleValidator
            .check(&task(Schedule::Cron("*/5 * * * *".into())))
            .is_ok());
        assert!(TaskScheduleValidator
            .check(&task(Schedule::Cron("not a cron".into())))
            .is_err());
    }

    #[test]
    fn test_custom_id_validator() {
        assert!(CustomIdValidator.check(&component("menu/open")).is_ok());
        assert!(CustomIdValidator.check(&component("  ")).is_err());
        assert!(CustomIdValidator.check(&component("{id}/open")).is_err());
        assert!(CustomIdValidator
            .check(&component(&"x".repeat(CUSTOM_ID_MAX_LEN + 1)))
            .is_err());
    }

    #[test]
    fn test_schema_params_must_be_bound() {
        let mut item = component("page/{n}");
        item.params = ParamsSchema {
            fields: [("n".to_string(), ParamSpec::default())].into(),
        };
        assert!(SchemaParamsValidator.check(&item).is_ok());

        item.params = ParamsSchema {
            fields: [("other".to_string(), ParamSpec::default())].into(),
        };
        assert!(SchemaParamsValidator.check(&item).is_err());
    }

    #[test]
    fn test_command_schema_chat_input_needs_description() {
        assert!(CommandSchemaValidator
            .check(&command("ping", CommandKind::ChatInput, ""))
            .is_err());
        assert!(CommandSchemaValidator
            .check(&command("ping", CommandKind::ChatInput, "Check latency"))
            .is_ok());
        // Context menus display the name verbatim; no description required.
        assert!(CommandSchemaValidator
            .check(&command("Report Message", CommandKind::Message, ""))
            .is_ok());
    }

    #[test]
    fn test_command_schema_rejects_bad_guild_ids() {
        let mut cmd = command("ping", CommandKind::ChatInput, "Check latency");
        cmd.guilds = vec!["not-a-snowflake".into()];
        assert!(CommandSchemaValidator.check(&cmd).is_err());
    }

    #[test]
    fn test_chain_short_circuits_on_first_failure() {
        let chain: Vec<Box<dyn Validator<ComponentDefinition>>> = vec![
            Box::new(CustomIdValidator),
            Box::new(RunActionValidator),
            Box::new(SchemaParamsValidator),
        ];

        // Empty custom id fails the first validator even though the action
        // is also unresolved; the reported error is the custom-id one.
        let mut item = component("");
        item.action = HandlerAction::Unresolved("ghost".into());
        let err = run_chain(&chain, &item).unwrap_err();
        assert!(err.to_string().contains("custom id"));
    }
}

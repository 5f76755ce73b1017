//! Scheduled task handler definitions
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use serde::Deserialize;

use super::action::HandlerAction;

/// Minimum interval accepted for repeating tasks, in milliseconds.
pub const MIN_INTERVAL_MS: u64 = 1000;

/// When a task fires.
///
/// The sum type makes `interval` and `cron` mutually exclusive: a manifest
/// declaring both fails to parse instead of producing an ambiguous task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Fixed repeat interval in milliseconds.
    Every(u64),
    /// A 5- or 6-field cron expression.
    Cron(String),
}

/// A scheduled task definition.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub name: String,
    pub schedule: Schedule,
    /// Run once right away in addition to the schedule.
    pub run_immediately: bool,
    pub silent: bool,
    pub action: HandlerAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_deserialize_every() {
        let schedule: Schedule = serde_yaml::from_str("every: 60000").unwrap();
        assert_eq!(schedule, Schedule::Every(60000));
    }

    #[test]
    fn test_schedule_deserialize_cron() {
        let schedule: Schedule = serde_yaml::from_str("cron: \"0 * * * *\"").unwrap();
        assert_eq!(schedule, Schedule::Cron("0 * * * *".to_string()));
    }

    #[test]
    fn test_schedule_rejects_both() {
        // An enum has exactly one variant; two keys cannot deserialize.
        let result: Result<Schedule, _> =
            serde_yaml::from_str("every: 60000\ncron: \"0 * * * *\"");
        assert!(result.is_err());
    }
}

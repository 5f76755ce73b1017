//! # Task Scheduling
//!
//! Cron expression parsing and the runner that drives registered tasks on
//! their interval or cron schedules.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod cron;
pub mod runner;

pub use cron::{Cron, CronError, CronExpr, WeekDay};
pub use runner::TaskRunner;

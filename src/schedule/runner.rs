//! Scheduled task runner
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::{error, info, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::cron::CronExpr;
use crate::definitions::Schedule;
use crate::dispatch::{Dispatcher, InboundEvent};

/// Above this many registered tasks, scheduling pressure is worth a
/// warning.
const MAX_TASKS: usize = 100;

/// Owns the spawned loops for every registered task.
///
/// Each task runs in its own tokio task; a failing run is logged and does
/// not stop the task's schedule or any other task.
#[derive(Default)]
pub struct TaskRunner {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one loop per registered task.
    pub fn start(&self, dispatcher: Arc<Dispatcher>, registries: &crate::registry::Registries) {
        let tasks = registries.tasks.values();
        if tasks.len() > MAX_TASKS {
            warn!(
                "Too many tasks registered ({}). Consider reducing cron tasks.",
                tasks.len()
            );
        }

        let mut handles = self.handles.lock();
        for task in &tasks {
            let dispatcher = Arc::clone(&dispatcher);
            let task = Arc::clone(task);

            let handle = tokio::spawn(async move {
                if task.run_immediately {
                    run_once(&dispatcher, &task.name).await;
                }

                match &task.schedule {
                    Schedule::Every(ms) => {
                        let mut interval =
                            tokio::time::interval(Duration::from_millis(*ms));
                        interval
                            .set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                        // The first tick resolves immediately; consume it so
                        // the schedule starts one interval from now.
                        interval.tick().await;
                        loop {
                            interval.tick().await;
                            run_once(&dispatcher, &task.name).await;
                        }
                    }
                    Schedule::Cron(expr) => {
                        // Validated at registration; a parse failure here
                        // means the definition was constructed by hand.
                        let expr = match expr.parse::<CronExpr>() {
                            Ok(expr) => expr,
                            Err(e) => {
                                error!(
                                    "Invalid cron pattern for task \"{}\": {e}",
                                    task.name
                                );
                                return;
                            }
                        };
                        loop {
                            let now = Local::now().naive_local();
                            let Some(next) = expr.next_after(now) else {
                                error!(
                                    "Cron pattern for task \"{}\" can never fire; stopping it.",
                                    task.name
                                );
                                return;
                            };
                            let wait = (next - now)
                                .to_std()
                                .unwrap_or(Duration::from_secs(1));
                            tokio::time::sleep(wait).await;
                            run_once(&dispatcher, &task.name).await;
                        }
                    }
                }
            });
            handles.push(handle);
        }

        info!("Scheduled {} task(s).", tasks.len());
    }

    /// Abort every task loop. Called during shutdown.
    pub fn shutdown(&self) {
        let mut handles = self.handles.lock();
        for handle in handles.drain(..) {
            handle.abort();
        }
        info!("Cleaned up all scheduled tasks.");
    }
}

/// Dispatch one scheduled run; errors are contained by the dispatcher.
async fn run_once(dispatcher: &Dispatcher, task: &str) {
    dispatcher
        .dispatch(
            InboundEvent::Scheduled {
                task: task.to_string(),
            },
            None,
        )
        .await;
}

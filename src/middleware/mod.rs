//! # Middleware Chain Executor
//!
//! Linear interceptor pipeline run around command handler invocation.
//! Each middleware receives the invocation context and a [`Next`] handle;
//! calling `proceed` advances to the following middleware, or to the
//! terminal handler once the chain is exhausted. A middleware that never
//! calls `proceed` short-circuits the rest of the chain, the auth-gate
//! pattern.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use log::info;

use crate::dispatch::HandlerContext;

/// Future type threaded through the chain.
pub type ChainFuture = BoxFuture<'static, Result<()>>;

/// An interceptor in the chain.
pub type Middleware = Arc<dyn Fn(Arc<HandlerContext>, Next) -> ChainFuture + Send + Sync>;

/// The terminal handler invoked when every middleware has proceeded.
pub type Terminal = Arc<dyn Fn(Arc<HandlerContext>) -> ChainFuture + Send + Sync>;

/// Handle a middleware uses to hand control to the next stage.
///
/// Consuming `self` makes "proceed at most once per stage" a compile-time
/// property; each `run_chain` invocation owns its own cursor, so chains are
/// safe to execute concurrently.
pub struct Next {
    advance: Box<dyn FnOnce() -> ChainFuture + Send>,
}

impl Next {
    /// Invoke the next middleware, or the terminal handler past the end.
    pub async fn proceed(self) -> Result<()> {
        (self.advance)().await
    }
}

/// Run `middlewares` in order around `terminal` for one invocation.
///
/// Errors from any stage propagate to the caller, which owns producing the
/// single user-visible failure response.
pub fn run_chain(
    ctx: Arc<HandlerContext>,
    middlewares: Vec<Middleware>,
    terminal: Terminal,
) -> ChainFuture {
    step(ctx, Arc::new(middlewares), terminal, 0)
}

fn step(
    ctx: Arc<HandlerContext>,
    middlewares: Arc<Vec<Middleware>>,
    terminal: Terminal,
    index: usize,
) -> ChainFuture {
    Box::pin(async move {
        match middlewares.get(index).cloned() {
            Some(middleware) => {
                let next_ctx = Arc::clone(&ctx);
                let next_middlewares = Arc::clone(&middlewares);
                let next_terminal = Arc::clone(&terminal);
                let next = Next {
                    advance: Box::new(move || {
                        step(next_ctx, next_middlewares, next_terminal, index + 1)
                    }),
                };
                middleware(ctx, next).await
            }
            None => terminal(ctx).await,
        }
    })
}

/// Named middlewares manifests can attach to commands.
#[derive(Default)]
pub struct MiddlewareTable {
    middlewares: HashMap<String, Middleware>,
}

impl MiddlewareTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, middleware: Middleware) {
        self.middlewares.insert(name.into(), middleware);
    }

    pub fn get(&self, name: &str) -> Option<Middleware> {
        self.middlewares.get(name).cloned()
    }

    /// Table pre-populated with the built-in middlewares.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("command_logger", command_logger());
        table
    }
}

/// Built-in middleware logging every command invocation before it runs.
pub fn command_logger() -> Middleware {
    Arc::new(|ctx: Arc<HandlerContext>, next: Next| {
        Box::pin(async move {
            info!(
                "[{}] command \"{}\" invoked by {}",
                ctx.request_id,
                ctx.command_name().unwrap_or("?"),
                ctx.user_id().unwrap_or("?"),
            );
            next.proceed().await
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{HandlerContext, InboundEvent, Services};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_ctx() -> Arc<HandlerContext> {
        Arc::new(HandlerContext::new(
            InboundEvent::Scheduled {
                task: "test".into(),
            },
            Default::default(),
            None,
            Arc::new(Services::for_tests()),
        ))
    }

    fn recording(order: Arc<parking_lot::Mutex<Vec<&'static str>>>, tag: &'static str) -> Middleware {
        Arc::new(move |_ctx, next: Next| {
            let order = Arc::clone(&order);
            Box::pin(async move {
                order.lock().push(tag);
                next.proceed().await
            })
        })
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let m1 = recording(Arc::clone(&order), "m1");
        let m2 = recording(Arc::clone(&order), "m2");

        let terminal_order = Arc::clone(&order);
        let terminal: Terminal = Arc::new(move |_ctx| {
            let order = Arc::clone(&terminal_order);
            Box::pin(async move {
                order.lock().push("h");
                Ok(())
            })
        });

        run_chain(test_ctx(), vec![m1, m2], terminal).await.unwrap();
        assert_eq!(*order.lock(), vec!["m1", "m2", "h"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let gate: Middleware = Arc::new(|_ctx, _next| Box::pin(async { Ok(()) }));

        let ran = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&ran);
        let m2: Middleware = Arc::new(move |_ctx, next: Next| {
            counted.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { next.proceed().await })
        });

        let terminal_ran = Arc::new(AtomicUsize::new(0));
        let terminal_counted = Arc::clone(&terminal_ran);
        let terminal: Terminal = Arc::new(move |_ctx| {
            terminal_counted.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        });

        run_chain(test_ctx(), vec![gate, m2], terminal)
            .await
            .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(terminal_ran.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_hits_terminal() {
        let terminal_ran = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&terminal_ran);
        let terminal: Terminal = Arc::new(move |_ctx| {
            counted.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        });

        run_chain(test_ctx(), vec![], terminal).await.unwrap();
        assert_eq!(terminal_ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let failing: Middleware =
            Arc::new(|_ctx, _next| Box::pin(async { Err(anyhow::anyhow!("denied")) }));
        let terminal: Terminal = Arc::new(|_ctx| Box::pin(async { Ok(()) }));

        let result = run_chain(test_ctx(), vec![failing], terminal).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_table_builtins() {
        let table = MiddlewareTable::with_builtins();
        assert!(table.get("command_logger").is_some());
        assert!(table.get("absent").is_none());
    }
}

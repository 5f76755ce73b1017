//! Response surface for the triggering event
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;

/// Capability to answer one inbound event.
///
/// Discord accepts exactly one initial response per interaction; after
/// `reply` or `defer`, further output must go through `follow_up`. The
/// `is_acknowledged` flag is what the dispatch boundary consults so a
/// failure reply is never attempted twice.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send the initial response.
    async fn reply(&self, content: &str, ephemeral: bool) -> Result<()>;

    /// Acknowledge now, answer later.
    async fn defer(&self) -> Result<()>;

    /// Send a message after the initial response.
    async fn follow_up(&self, content: &str, ephemeral: bool) -> Result<()>;

    /// Answer an autocomplete request with (name, value) suggestions.
    async fn suggest(&self, choices: Vec<(String, String)>) -> Result<()>;

    /// Whether an initial response has already been sent.
    fn is_acknowledged(&self) -> bool;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Recording responder for dispatcher tests.
    #[derive(Default)]
    pub struct RecordingResponder {
        pub replies: Mutex<Vec<String>>,
        pub follow_ups: Mutex<Vec<String>>,
        pub suggestions: Mutex<Vec<Vec<(String, String)>>>,
        acknowledged: AtomicBool,
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn reply(&self, content: &str, _ephemeral: bool) -> Result<()> {
            self.replies.lock().push(content.to_string());
            self.acknowledged.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn defer(&self) -> Result<()> {
            self.acknowledged.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn follow_up(&self, content: &str, _ephemeral: bool) -> Result<()> {
            self.follow_ups.lock().push(content.to_string());
            Ok(())
        }

        async fn suggest(&self, choices: Vec<(String, String)>) -> Result<()> {
            self.suggestions.lock().push(choices);
            Ok(())
        }

        fn is_acknowledged(&self) -> bool {
            self.acknowledged.load(Ordering::SeqCst)
        }
    }
}

//! Player discovery and observation over the scripting channel.
//!
//! The pipeline runs Registry -> Collector -> Resolver -> Fetcher once per
//! poll tick. Everything here is a stateless query; failures degrade to
//! omission so one broken player never takes down the tick.

pub mod collect;
pub mod control;
pub mod fetch;
pub mod registry;
pub mod resolve;

pub use collect::collect;
pub use fetch::fetch_track;
pub use resolve::resolve;

#[cfg(test)]
pub(crate) mod testutil {
    use async_trait::async_trait;
    use scrobblebar_osa::{ScriptBridge, ScriptError};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Canned-response bridge. Each `run_script` call pops the next queued
    /// response and records what was asked of it.
    pub struct FakeBridge {
        responses: Mutex<VecDeque<Result<String, ScriptError>>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeBridge {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn push_ok(&self, output: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(output.to_string()));
        }

        pub fn push_err(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(ScriptError::Failed(message.to_string())));
        }

        pub fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ScriptBridge for FakeBridge {
        async fn run_script(&self, source: &str, args: &[String]) -> Result<String, ScriptError> {
            self.calls
                .lock()
                .unwrap()
                .push((source.to_string(), args.to_vec()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected script invocation")
        }
    }
}

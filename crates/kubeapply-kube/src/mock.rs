//! Scripted command runner for testing
//!
//! Records every invocation and answers from a queue of canned outputs, so
//! orchestration can be exercised without kubectl or a cluster.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{KubeError, Result};
use crate::runner::{CommandOutput, CommandRunner, Invocation};

type Inspector = Arc<dyn Fn(&Invocation) + Send + Sync>;

/// In-memory [`CommandRunner`] with queued responses
#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    responses: VecDeque<Result<CommandOutput>>,
    calls: Vec<Invocation>,
    inspector: Option<Inspector>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the output of the next unanswered call
    pub fn push_output(&self, output: CommandOutput) {
        self.lock().responses.push_back(Ok(output));
    }

    /// Queue an error (for example a spawn failure) for the next call
    pub fn push_error(&self, error: KubeError) {
        self.lock().responses.push_back(Err(error));
    }

    /// Run `inspect` on every invocation before answering it
    ///
    /// Useful for checking files that only exist while the call is running.
    pub fn on_call<F>(&self, inspect: F)
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.lock().inspector = Some(Arc::new(inspect));
    }

    /// Invocations seen so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    fn program(&self) -> String {
        "kubectl".to_string()
    }

    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let inspector = {
            let mut state = self.lock();
            state.calls.push(invocation.clone());
            state.inspector.clone()
        };

        if let Some(inspect) = inspector {
            inspect(invocation);
        }

        // An unscripted call succeeds with no output
        self.lock()
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::new(Some(0), Vec::new())))
    }
}

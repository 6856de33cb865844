use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use reel_models::ProviderMode;
use reel_provider::{
    GenerationOptions, PollOutcome, ProviderError, ProviderResult, StartOutcome, VideoProvider,
};

/// What the scripted provider answers to `start_generation`.
pub enum ScriptedStart {
    /// Synchronous completion with this result URL
    Immediate(String),
    /// Long-running operation with this handle
    Operation(String),
    /// Transport failure
    FailRequest(String),
}

/// Provider fake that replays a scripted sequence of poll outcomes.
pub struct ScriptedProvider {
    start: ScriptedStart,
    polls: Mutex<VecDeque<Result<PollOutcome, String>>>,
    pub start_calls: Arc<Mutex<u32>>,
    pub poll_calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn completes_immediately(url: &str) -> Self {
        Self::with_start(ScriptedStart::Immediate(url.to_string()))
    }

    pub fn with_operation(name: &str) -> Self {
        Self::with_start(ScriptedStart::Operation(name.to_string()))
    }

    pub fn failing_start(msg: &str) -> Self {
        Self::with_start(ScriptedStart::FailRequest(msg.to_string()))
    }

    fn with_start(start: ScriptedStart) -> Self {
        Self {
            start,
            polls: Mutex::new(VecDeque::new()),
            start_calls: Arc::new(Mutex::new(0)),
            poll_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn push_poll(self, outcome: PollOutcome) -> Self {
        self.polls.lock().unwrap().push_back(Ok(outcome));
        self
    }

    pub fn push_poll_error(self, msg: &str) -> Self {
        self.polls.lock().unwrap().push_back(Err(msg.to_string()));
        self
    }

    pub fn started(&self) -> u32 {
        *self.start_calls.lock().unwrap()
    }

    pub fn polled(&self) -> usize {
        self.poll_calls.lock().unwrap().len()
    }
}

/// Poll outcome for an operation still running.
pub fn running(progress: Option<u8>) -> PollOutcome {
    PollOutcome {
        done: false,
        progress_percent: progress,
        video_uri: None,
        error_message: None,
    }
}

/// Poll outcome for a finished operation with a deliverable.
pub fn done_with(uri: &str) -> PollOutcome {
    PollOutcome {
        done: true,
        progress_percent: None,
        video_uri: Some(uri.to_string()),
        error_message: None,
    }
}

/// Poll outcome claiming done without any deliverable.
pub fn done_without_uri() -> PollOutcome {
    PollOutcome {
        done: true,
        progress_percent: None,
        video_uri: None,
        error_message: None,
    }
}

/// Poll outcome carrying a provider-side failure.
pub fn provider_failed(msg: &str) -> PollOutcome {
    PollOutcome {
        done: true,
        progress_percent: None,
        video_uri: None,
        error_message: Some(msg.to_string()),
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    async fn start_generation(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> ProviderResult<StartOutcome> {
        *self.start_calls.lock().unwrap() += 1;

        match &self.start {
            ScriptedStart::Immediate(url) => Ok(StartOutcome {
                provider: "scripted".to_string(),
                mode: ProviderMode::Simulation,
                operation_name: None,
                video_url: Some(url.clone()),
            }),
            ScriptedStart::Operation(name) => Ok(StartOutcome {
                provider: "scripted".to_string(),
                mode: ProviderMode::Production,
                operation_name: Some(name.clone()),
                video_url: None,
            }),
            ScriptedStart::FailRequest(msg) => Err(ProviderError::request(msg.clone())),
        }
    }

    async fn poll_operation(&self, operation_name: &str) -> ProviderResult<PollOutcome> {
        self.poll_calls
            .lock()
            .unwrap()
            .push(operation_name.to_string());

        match self.polls.lock().unwrap().pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(msg)) => Err(ProviderError::request(msg)),
            // Script exhausted: still running, no reported progress
            None => Ok(running(None)),
        }
    }
}

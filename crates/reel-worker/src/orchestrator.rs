//! Job orchestrator: owns the lifecycle of a generation task.
//!
//! `start_or_resume` is the single entry point. It creates nothing itself -
//! the web layer creates the pending record - but decides whether to
//! (re)start generation, recovers tasks abandoned by crashed workers, and
//! hands running operations off to the poller.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use reel_models::{TaskId, VideoTask};
use reel_provider::{GenerationOptions, ProviderError};
use reel_queue::{PollOperationJob, QueueJob};

use crate::context::SharedContext;
use crate::error::{WorkerError, WorkerResult};

/// Metadata key under which the web layer parks generation options.
const OPTIONS_METADATA_KEY: &str = "options";

/// Job orchestrator.
pub struct Orchestrator {
    ctx: SharedContext,
}

impl Orchestrator {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    /// Start or resume generation for a task.
    ///
    /// Safe under re-delivery: terminal tasks and tasks owned by another
    /// live run are no-ops. Any synchronous failure is written to the
    /// record before the error propagates, so the record is never left in
    /// processing by a failed orchestrator run.
    pub async fn start_or_resume(&self, task_id: &TaskId) -> WorkerResult<()> {
        let Some(mut task) = self.ctx.store.load(task_id).await? else {
            warn!("Orchestrator invoked for missing task {}", task_id);
            return Ok(());
        };

        if task.is_terminal() {
            info!(
                "Task {} already {} - nothing to do",
                task.id, task.status
            );
            return Ok(());
        }

        if task.is_processing() {
            if !task.is_stuck(self.ctx.config.stuck_threshold_secs()) {
                info!("Task {} is processing and healthy - another run owns it", task.id);
                return Ok(());
            }

            warn!(
                "Task {} stuck in processing since {} - resetting",
                task.id, task.updated_at
            );
            task.reset_for_retry();
            task = match self.ctx.store.save(&task).await {
                Ok(task) => task,
                Err(e) if e.is_precondition_failed() => {
                    // A concurrent orchestrator won the reset; only one
                    // proceeds past the stuck check.
                    info!("Task {} reset by a concurrent run - backing off", task.id);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
        }

        match self.run(&mut task).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.ctx.persist_failure(task_id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Drive a pending task through prompt resolution and generation start.
    async fn run(&self, task: &mut VideoTask) -> WorkerResult<()> {
        let prompt = self.resolve_prompt(task).await?;

        task.begin_processing(self.ctx.config.initial_progress);
        *task = self.ctx.store.save(task).await?;

        let options = generation_options(task);
        let outcome = self
            .ctx
            .provider
            .start_generation(&prompt, &options)
            .await?;

        task.provider = Some(outcome.provider.clone());
        task.mode = Some(outcome.mode);

        if let Some(video_url) = outcome.video_url {
            // Synchronous completion: no handle, no poll.
            task.complete(video_url);
            task.set_metadata("completed_at", json!(Utc::now().to_rfc3339()));
            self.ctx.store.save(task).await?;

            info!(
                "Task {} completed synchronously by {}",
                task.id, outcome.provider
            );
            return Ok(());
        }

        let operation_name = outcome.operation_name.ok_or_else(|| {
            WorkerError::Provider(ProviderError::protocol(
                "Provider returned neither a result nor an operation handle",
            ))
        })?;

        task.attach_operation(&operation_name);
        // The handle must be durable before the first poll can run.
        *task = self.ctx.store.save(task).await?;

        self.ctx
            .scheduler
            .schedule(
                QueueJob::PollOperation(PollOperationJob::new(task.id.clone())),
                Some(self.ctx.config.initial_poll_delay),
            )
            .await?;

        info!(
            "Task {} started on {} as {} - polling scheduled",
            task.id, outcome.provider, operation_name
        );

        Ok(())
    }

    /// Use the stored prompt, or synthesize one from the summary and
    /// persist it so re-entry never regenerates text.
    async fn resolve_prompt(&self, task: &mut VideoTask) -> WorkerResult<String> {
        if let Some(prompt) = &task.prompt {
            return Ok(prompt.clone());
        }

        let summary = task.summary_text.clone().ok_or_else(|| {
            WorkerError::config_error("Task has neither a prompt nor a summary to derive one from")
        })?;

        let prompt = self.ctx.textgen.prompt_from_summary(&summary).await?;

        task.prompt = Some(prompt.clone());
        *task = self.ctx.store.save(task).await?;

        info!("Synthesized video prompt for task {}", task.id);
        Ok(prompt)
    }
}

/// Generation options ride the record's metadata bag, set by the web layer.
fn generation_options(task: &VideoTask) -> GenerationOptions {
    task.metadata
        .get(OPTIONS_METADATA_KEY)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}

//! Operation poller: one poll attempt per delivery.
//!
//! Suspension between attempts is a delayed re-enqueue of the next
//! `PollOperationJob`, never a sleep inside the worker - the worker slot is
//! free between polls. All continuation state is the task record plus the
//! attempt counter in the job payload.

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, info, warn};

use reel_models::VideoTask;
use reel_queue::{PollOperationJob, QueueJob};

use crate::context::SharedContext;
use crate::error::WorkerResult;
use crate::progress;

/// Operation poller.
pub struct OperationPoller {
    ctx: SharedContext,
}

impl OperationPoller {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    /// Perform exactly one poll attempt for a task.
    ///
    /// Missing or already-finalized tasks are silent no-ops so re-delivery
    /// is always safe. A provider transport failure is persisted onto the
    /// record and then re-raised, so the delivery layer's own retry and
    /// dead-letter accounting applies on top.
    pub async fn poll_once(&self, job: &PollOperationJob) -> WorkerResult<()> {
        let Some(mut task) = self.ctx.store.load(&job.task_id).await? else {
            // Deleted concurrently - not an error.
            warn!("Poll received missing task {}", job.task_id);
            return Ok(());
        };

        if !task.is_processing() {
            debug!(
                "Task {} is {} - skipping poll",
                task.id, task.status
            );
            return Ok(());
        }

        let Some(operation_name) = task.operation_name.clone() else {
            // Contract violation by the dispatcher, not a transient fault.
            error!("Task {} has no operation handle - failing", task.id);
            task.fail("Missing operation handle for polling");
            self.save_final(task).await;
            return Ok(());
        };

        let outcome = match self.ctx.provider.poll_operation(&operation_name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "Polling {} for task {} failed on attempt {}: {}",
                    operation_name, task.id, job.attempt, e
                );
                self.ctx.persist_failure(&task.id, &e.to_string()).await;
                return Err(e.into());
            }
        };

        if let Some(message) = outcome.error_message {
            // Provider-side failure is terminal; no point re-polling.
            error!(
                "Operation {} failed for task {}: {}",
                operation_name, task.id, message
            );
            task.fail(message);
            self.save_final(task).await;
            return Ok(());
        }

        if !outcome.done {
            return self
                .continue_polling(task, job, outcome.progress_percent)
                .await;
        }

        let Some(video_uri) = outcome.video_uri else {
            // "Done" without a deliverable is a protocol violation, not success.
            error!(
                "Operation {} done without a video URI for task {}",
                operation_name, task.id
            );
            task.fail("Generation finished but the provider returned no video");
            self.save_final(task).await;
            return Ok(());
        };

        task.complete(video_uri);
        task.set_metadata("completed_at", json!(Utc::now().to_rfc3339()));
        task.set_metadata("poll_attempts", json!(job.attempt + 1));
        self.save_final(task).await;

        info!(
            "Task {} completed after {} poll attempts",
            job.task_id,
            job.attempt + 1
        );
        Ok(())
    }

    /// Update the progress estimate and re-schedule, unless the attempt
    /// budget is spent.
    async fn continue_polling(
        &self,
        mut task: VideoTask,
        job: &PollOperationJob,
        reported: Option<u8>,
    ) -> WorkerResult<()> {
        if job.attempt >= self.ctx.config.max_poll_attempts {
            error!(
                "Task {} timed out after {} poll attempts",
                task.id, job.attempt
            );
            task.fail(format!(
                "Video generation timed out after {} poll attempts",
                job.attempt
            ));
            self.save_final(task).await;
            return Ok(());
        }

        let estimate = progress::estimate(
            task.progress,
            reported,
            task.created_at,
            job.attempt,
            &self.ctx.config,
        );

        if task.record_progress(estimate) {
            if let Err(e) = self.ctx.store.save(&task).await {
                // Progress is cosmetic; a lost write must not stop the poll
                // chain. The next attempt re-reads and re-estimates.
                debug!("Skipping progress write for task {}: {}", task.id, e);
            }
        }

        self.ctx
            .scheduler
            .schedule(
                QueueJob::PollOperation(job.next_attempt()),
                Some(self.ctx.config.poll_delay),
            )
            .await?;

        debug!(
            "Task {} still generating (attempt {}, progress {})",
            job.task_id, job.attempt, task.progress
        );
        Ok(())
    }

    /// Persist a terminal transition, deferring to whoever beat us there.
    async fn save_final(&self, task: VideoTask) {
        let task_id = task.id.clone();
        match self.ctx.store.save(&task).await {
            Ok(_) => {}
            Err(e) if e.is_precondition_failed() => {
                warn!(
                    "Task {} was updated concurrently during finalization",
                    task_id
                );
            }
            Err(e) => {
                error!("Failed to finalize task {}: {}", task_id, e);
            }
        }
    }
}

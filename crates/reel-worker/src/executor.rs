//! Job executor: consumes deliveries and dispatches them to the engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use reel_queue::{JobQueue, QueueJob};

use crate::context::SharedContext;
use crate::error::WorkerResult;
use crate::orchestrator::Orchestrator;
use crate::poller::OperationPoller;

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    ctx: SharedContext,
    queue: Arc<JobQueue>,
    job_semaphore: Arc<Semaphore>,
    shutdown: tokio::sync::watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(ctx: SharedContext, queue: Arc<JobQueue>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs));
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            ctx,
            queue,
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Start the executor.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting job executor '{}' with {} max concurrent jobs",
            self.consumer_name, self.ctx.config.max_concurrent_jobs
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();

        // Promotion loop: move due delayed jobs (poll continuations) onto
        // the ready stream.
        let queue_promote = Arc::clone(&self.queue);
        let promote_interval = self.ctx.config.promote_interval;
        let mut shutdown_rx_promote = self.shutdown.subscribe();

        let promote_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(promote_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_promote.changed() => {
                        if *shutdown_rx_promote.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_promote.promote_due(50).await {
                            Ok(promoted) if promoted > 0 => {
                                debug!("Promoted {} due jobs", promoted);
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to promote due jobs: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Claim loop: pick up deliveries orphaned by crashed workers.
        let queue_claim = Arc::clone(&self.queue);
        let consumer_name = self.consumer_name.clone();
        let ctx_claim = Arc::clone(&self.ctx);
        let semaphore_claim = Arc::clone(&self.job_semaphore);
        let claim_interval = self.ctx.config.claim_interval;
        let claim_min_idle = self.ctx.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx_claim = self.shutdown.subscribe();

        let claim_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx_claim.changed() => {
                        if *shutdown_rx_claim.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue_claim.claim_pending(&consumer_name, claim_min_idle, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!("Claimed {} pending jobs", jobs.len());
                                for (message_id, job) in jobs {
                                    let ctx = Arc::clone(&ctx_claim);
                                    let queue = Arc::clone(&queue_claim);
                                    let Ok(permit) = semaphore_claim.clone().acquire_owned().await else {
                                        break;
                                    };

                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!("Failed to claim pending jobs: {}", e);
                            }
                        }
                    }
                }
            }
        });

        // Main job consumption loop
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Error consuming jobs: {}", e);
                        // Back off on error
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        promote_task.abort();
        claim_task.abort();

        info!("Waiting for in-flight jobs to complete...");
        let _ = tokio::time::timeout(self.ctx.config.shutdown_timeout, self.wait_for_jobs()).await;

        info!("Job executor stopped");
        Ok(())
    }

    /// Consume and process jobs from the queue.
    async fn consume_jobs(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            // All slots busy, wait a bit
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(
                &self.consumer_name,
                1000, // Block for 1 second
                available.min(5),
            )
            .await?;

        if jobs.is_empty() {
            return Ok(());
        }

        debug!("Consumed {} jobs from queue", jobs.len());

        for (message_id, job) in jobs {
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);
            let Ok(permit) = self.job_semaphore.clone().acquire_owned().await else {
                break;
            };

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, queue, message_id, job).await;
            });
        }

        Ok(())
    }

    /// Execute a single job with retry and DLQ handling.
    async fn execute_job(
        ctx: SharedContext,
        queue: Arc<JobQueue>,
        message_id: String,
        job: QueueJob,
    ) {
        let job_id = job.job_id().to_string();
        debug!("Executing {} job {}", job.kind(), job_id);

        let result = Self::process_job(&ctx, &job).await;

        match result {
            Ok(()) => {
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack job {}: {}", job_id, e);
                }
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);

                let retry_count = queue.increment_retry(&message_id).await.unwrap_or(999);
                let max_retries = queue.max_retries();

                if retry_count >= max_retries || !e.is_retryable() {
                    warn!(
                        "Job {} exhausted delivery retries ({}/{}), moving to DLQ",
                        job_id, retry_count, max_retries
                    );
                    if let Err(dlq_err) = queue.dlq(&message_id, &job, &e.to_string()).await {
                        error!("Failed to move job {} to DLQ: {}", job_id, dlq_err);
                    }
                } else {
                    info!(
                        "Job {} will be redelivered (attempt {}/{})",
                        job_id, retry_count, max_retries
                    );
                    // Redelivery happens via the claim loop once the
                    // delivery goes idle.
                }
            }
        }
    }

    /// Wait for all in-flight jobs to complete.
    async fn wait_for_jobs(&self) {
        loop {
            let available = self.job_semaphore.available_permits();
            if available == self.ctx.config.max_concurrent_jobs {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Dispatch a job to its handler.
    async fn process_job(ctx: &SharedContext, job: &QueueJob) -> WorkerResult<()> {
        match job {
            QueueJob::GenerateVideo(j) => {
                Orchestrator::new(Arc::clone(ctx))
                    .start_or_resume(&j.task_id)
                    .await
            }
            QueueJob::PollOperation(j) => {
                OperationPoller::new(Arc::clone(ctx)).poll_once(j).await
            }
        }
    }
}

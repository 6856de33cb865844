use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use reel_queue::{JobScheduler, QueueJob, QueueResult};

/// Scheduler fake that records what would have been enqueued.
#[derive(Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<(QueueJob, Option<Duration>)>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything scheduled so far.
    pub fn drain(&self) -> Vec<(QueueJob, Option<Duration>)> {
        std::mem::take(&mut *self.scheduled.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.scheduled.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn schedule(&self, job: QueueJob, delay: Option<Duration>) -> QueueResult<()> {
        self.scheduled.lock().unwrap().push((job, delay));
        Ok(())
    }
}

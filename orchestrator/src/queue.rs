use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// A job is just a URL. The state machine re-derives everything else from the store and the
/// scrape, which keeps redelivery idempotent after a crash between dequeue and completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub url: String,
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError>;
}

/// In-memory queue over a Tokio channel, used when `JOB_BROKER_URL` is unset or points nowhere
/// external; a real broker integration would implement the same trait.
pub struct ChannelJobQueue {
    sender: mpsc::Sender<Job>,
}

impl ChannelJobQueue {
    pub fn new(sender: mpsc::Sender<Job>) -> Self {
        Self { sender }
    }

    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender), receiver)
    }
}

#[async_trait]
impl JobQueue for ChannelJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.sender.send(job).await.map_err(|_| QueueError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueued_job_is_received() {
        let (queue, mut receiver) = ChannelJobQueue::bounded(4);
        queue.enqueue(Job { url: "https://example.com".to_string() }).await.unwrap();

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.url, "https://example.com");
    }
}

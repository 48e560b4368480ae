use common::{Job, JobId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::JobApi;

/// Owner of one running poll chain. Dropping the handle cancels the chain.
pub struct PollHandle {
    job_id: JobId,
    cancel: CancellationToken,
    snapshots: watch::Receiver<Option<Job>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Most recent successfully fetched snapshot.
    pub fn latest(&self) -> Option<Job> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Job>> {
        self.snapshots.clone()
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("Cancelling poll for job {}", self.job_id);
            self.cancel.cancel();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Resolves once the chain stops: with the terminal snapshot, or with
    /// whatever was last seen if it was cancelled first.
    pub async fn wait_terminal(&self) -> Option<Job> {
        wait_terminal(self.subscribe()).await
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub async fn wait_terminal(mut rx: watch::Receiver<Option<Job>>) -> Option<Job> {
    loop {
        {
            let current = rx.borrow_and_update();
            if current.as_ref().is_some_and(Job::is_terminal) {
                return current.clone();
            }
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

/// Starts polling `job_id`: one request right away, then one `interval`
/// after each request settles, until a non-`processing` status is seen or
/// the handle is cancelled.
pub fn spawn<A: JobApi>(api: Arc<A>, job_id: JobId, interval: Duration) -> PollHandle {
    let cancel = CancellationToken::new();
    let (tx, rx) = watch::channel(None);

    let task = tokio::spawn(run(api, job_id.clone(), interval, tx, cancel.clone()));

    PollHandle {
        job_id,
        cancel,
        snapshots: rx,
        task,
    }
}

async fn run<A: JobApi>(
    api: Arc<A>,
    job_id: JobId,
    interval: Duration,
    tx: watch::Sender<Option<Job>>,
    cancel: CancellationToken,
) {
    log::info!("Polling job {} every {:?}", job_id, interval);
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            r = api.fetch_job(&job_id) => r,
        };

        match result {
            Ok(job) => {
                if let Err(reason) = job.check_shape() {
                    log::warn!("Job {} snapshot is inconsistent: {}", job_id, reason);
                }
                let status = job.status;
                tx.send_replace(Some(job));
                if status.is_terminal() {
                    log::info!("Job {} finished with status {} after {} poll(s)", job_id, status, attempt);
                    return;
                }
                log::debug!("Job {} still {} (poll {})", job_id, status, attempt);
            }
            // Swallowed: the next scheduled poll is the retry.
            Err(e) => log::warn!("Polling error for job {} (poll {}): {}", job_id, attempt, e),
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log::info!("Stopped polling job {} before it finished", job_id);
}

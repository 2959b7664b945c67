use crate::app::capture::Capture;
use crate::app::classify::{classify, CASE_SUMMARY};
use crate::app::model::{Status, Test, TestHandle};
use crate::connection::{Execute, ExecutionError};
use crate::view::event::Message;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

#[derive(Debug, Error)]
#[error("execution queue closed")]
pub struct QueueClosed;

/// Sending side of the execution queue.
///
/// The channel holds a single entry, so a submission waits while the worker is busy and
/// the slot is taken.
#[derive(Debug, Clone)]
pub struct Queue {
    tx: mpsc::Sender<TestHandle>,
}

impl Queue {
    pub fn new() -> (Self, mpsc::Receiver<TestHandle>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }

    /// Marks the test `RUNNING` and enqueues it. Returns `false` without enqueueing when
    /// the test is already running.
    pub async fn submit(&self, handle: TestHandle) -> Result<bool, QueueClosed> {
        {
            let mut test = lock!(handle);
            if test.status == Status::Running {
                debug!("{} is already running", test);
                return Ok(false);
            }
            test.status = Status::Running;
        }
        self.tx.send(handle).await.map_err(|_| QueueClosed)?;
        Ok(true)
    }

    /// Submits every handle in order, notifying the view after each one.
    pub async fn submit_all(
        &self,
        handles: Vec<TestHandle>,
        notify: mpsc::UnboundedSender<Message>,
    ) -> Result<usize, QueueClosed> {
        let mut submitted = 0;
        for handle in handles {
            if self.submit(handle).await? {
                submitted += 1;
                let _ = notify.send(Message::TestUpdated);
            }
        }
        Ok(submitted)
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Executes queued tests one at a time.
pub struct Worker<E> {
    executor: E,
    capture: Capture,
    limit: Duration,
}

impl<E: Execute> Worker<E> {
    pub fn new(executor: E, capture: Capture, limit: Duration) -> Self {
        Self {
            executor,
            capture,
            limit,
        }
    }

    /// Takes tests off the queue until it closes or `shutdown` fires. A test caught in
    /// flight by the shutdown ends as `ERROR`. The session is dropped on return.
    pub async fn run(
        mut self,
        mut queue: mpsc::Receiver<TestHandle>,
        notify: mpsc::UnboundedSender<Message>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("Worker started, per-test time limit {:?}", self.limit);
        loop {
            let handle = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                next = queue.recv() => match next {
                    Some(handle) => handle,
                    None => break,
                },
            };
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    {
                        let mut test = lock!(handle);
                        warn!("{} interrupted by shutdown", test);
                        test.status = Status::Error;
                        test.results = vec![ExecutionError::Closed.message()];
                    }
                    let _ = notify.send(Message::TestUpdated);
                    break;
                }
                _ = self.run_one(&handle) => {}
            }
            if notify.send(Message::TestUpdated).is_err() {
                debug!("View is gone, stopping worker");
                break;
            }
        }
        info!("Worker stopped");
    }

    /// Runs a single test and stores its outcome on the handle.
    pub async fn run_one(&mut self, handle: &TestHandle) {
        let test = lock!(handle).clone();
        let identity = test.to_string();

        self.capture.clear(&identity);
        let started = Instant::now();
        let result = {
            let _scope = self.capture.enter(&identity);
            match timeout(self.limit, self.executor.execute(&identity)).await {
                Ok(result) => result,
                Err(_) => Err(ExecutionError::Timeout(self.limit)),
            }
        };
        let captured = self.capture.retrieve(&identity);
        let (status, results) = settle(&test, captured, result);
        info!(
            "{} finished as {} in {} ms",
            identity,
            status,
            started.elapsed().as_millis()
        );

        let mut test = lock!(handle);
        test.status = status;
        test.results = results;
    }
}

/// Turns the call result and captured lines into the status and lines to store.
pub fn settle(
    test: &Test,
    captured: Option<Vec<String>>,
    result: Result<(), ExecutionError>,
) -> (Status, Vec<String>) {
    let mut lines = match captured {
        Some(lines) => lines,
        None => {
            return (
                Status::Error,
                vec![format!("no results for test {}", test)],
            )
        }
    };

    if let Err(err) = result {
        let message = err.message();
        if !message.contains(CASE_SUMMARY) {
            error!("{} failed to execute: {}", test, err);
            return (Status::Error, vec![message]);
        }
        // tSQLt reports failing runs by raising the summary as an error.
        lines.push(message);
    }

    match classify(test, &lines) {
        Ok(outcome) => (outcome.status, outcome.lines),
        Err(err) => {
            warn!("Cannot classify {} ({}): {}", test, err.status, err);
            let mut results = Vec::with_capacity(lines.len() + 1);
            results.push(err.message);
            results.extend(lines);
            (Status::Error, results)
        }
    }
}

use std::sync::mpsc;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Dedicated worker thread for asynchronous write dispatch.
///
/// Jobs execute in submission order on the worker, but there is no ordering
/// guarantee relative to the frame-merge protocol: the debug single-sample
/// path runs here precisely so it never interacts with the in-flight map.
///
/// Dropping the queue closes the channel and joins the worker, so queued
/// jobs finish before drop returns.
#[derive(Debug)]
pub struct WriteQueue {
    tx: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl WriteQueue {
    /// Spawn the worker thread.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        let worker = std::thread::Builder::new()
            .name("frameloom-write".into())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    job();
                }
            })
            .ok();
        if worker.is_none() {
            tracing::error!("failed to spawn write worker; queued jobs will run inline");
        }
        Self {
            tx: Some(tx),
            worker,
        }
    }

    /// Submit a job. Runs inline if the worker could not be spawned or has
    /// already shut down.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        match (&self.tx, &self.worker) {
            (Some(tx), Some(_)) => {
                if let Err(e) = tx.send(Box::new(job)) {
                    tracing::warn!("write worker gone; running job inline");
                    (e.0)();
                }
            }
            _ => job(),
        }
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

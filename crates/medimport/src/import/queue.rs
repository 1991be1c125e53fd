use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::device::VolumeInspector;
use crate::error::ImportError;
use crate::fsutil;
use crate::import::copier::{self, ImportStats};
use crate::model::{ImportRequest, ImportStatus, SourceFile};
use crate::processor::{self, Processor};

/// Snapshot of a finished job, handed to its completion callback. The job
/// row itself is gone by the time the callback runs.
#[derive(Debug)]
pub struct JobOutcome {
    pub job_id: u64,
    pub volume_path: PathBuf,
    pub status: ImportStatus,
    pub files_total: usize,
    pub stats: ImportStats,
}

pub type CompletionCallback = Box<dyn FnOnce(JobOutcome) + Send + 'static>;

struct ImportJob {
    request: ImportRequest,
    /// Installed by `submit` after recognition; the worker leaves a job
    /// alone until these arrive.
    processors: Option<Vec<Box<dyn Processor>>>,
    files: Vec<SourceFile>,
    status: ImportStatus,
    callback: Option<CompletionCallback>,
}

struct QueueShared {
    config: Config,
    inspector: Arc<dyn VolumeInspector>,
    table: Mutex<BTreeMap<u64, ImportJob>>,
    next_id: AtomicU64,
    shutdown: AtomicBool,
    wake_sender: Sender<()>,
}

/// Process-wide import job queue.
///
/// One dedicated worker thread drains the table in job-id order, so imports
/// run strictly one at a time in submission order. The lock is held only for
/// table bookkeeping; enumeration and copying always run outside it, and
/// submissions are never blocked by an in-progress import.
pub struct ImportQueue {
    shared: Arc<QueueShared>,
    worker: Option<JoinHandle<()>>,
}

impl ImportQueue {
    pub fn new(config: Config, inspector: Arc<dyn VolumeInspector>) -> Self {
        // Capacity 1 is enough: the wake channel is a doorbell, the table is
        // the queue.
        let (wake_sender, wake_receiver) = bounded::<()>(1);

        let shared = Arc::new(QueueShared {
            config,
            inspector,
            table: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            wake_sender,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || {
            run_worker(worker_shared, wake_receiver);
        });

        info!("import queue worker started");

        Self {
            shared,
            worker: Some(worker),
        }
    }

    /// Queues an import job and returns its id.
    ///
    /// The volume path is validated and processor recognition runs here, on
    /// the submitting thread, so "nothing handles this volume" surfaces to
    /// the caller promptly instead of minutes later in a log. The callback
    /// fires exactly once, after the job row is removed, on both the success
    /// and the failure path.
    pub fn submit(
        &self,
        mut request: ImportRequest,
        callback: CompletionCallback,
    ) -> Result<u64, ImportError> {
        if self.shared.shutdown.load(Ordering::Relaxed) {
            return Err(ImportError::ShuttingDown);
        }

        if !fsutil::directory_exists(&request.volume_path) {
            error!(
                volume = %request.volume_path.display(),
                "cannot import, volume directory not found"
            );
            return Err(ImportError::VolumeNotFound(request.volume_path));
        }

        request.dry_run = request.dry_run || self.shared.config.force_dry_run;

        let job_id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            job_id,
            volume = %request.volume_path.display(),
            "queueing import"
        );

        {
            let mut table = self.shared.table.lock().expect("job table lock poisoned");
            table.insert(
                job_id,
                ImportJob {
                    request: request.clone(),
                    processors: None,
                    files: Vec::new(),
                    status: ImportStatus::Pending,
                    callback: Some(callback),
                },
            );
        }

        // Recognition runs without the lock; it reads the volume and may
        // take a while on slow media.
        let processors = processor::find_processors(
            &self.shared.config,
            &request.volume_path,
            &self.shared.inspector,
        );

        {
            let mut table = self.shared.table.lock().expect("job table lock poisoned");
            if let Some(job) = table.get_mut(&job_id) {
                job.processors = Some(processors);
            }
        }

        // Doorbell only; a full channel means the worker is already awake.
        let _ = self.shared.wake_sender.try_send(());

        Ok(job_id)
    }

    /// Stops accepting new submissions. The worker finishes the job it is
    /// on, reports every still-queued job as failed, and exits.
    pub fn shutdown(&self) {
        info!("shutting down import queue");
        self.shared.shutdown.store(true, Ordering::Relaxed);
        let _ = self.shared.wake_sender.try_send(());
    }

    /// Shuts down and blocks until the worker thread has exited.
    pub fn wait(mut self) {
        self.shutdown();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                error!("import worker panicked: {:?}", e);
            }
        }
        info!("import queue worker stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Relaxed)
    }

    /// Current status of a job still in the table. `None` once the job has
    /// finished; rows are removed the moment the worker is done with them.
    pub fn job_status(&self, job_id: u64) -> Option<ImportStatus> {
        let table = self.shared.table.lock().expect("job table lock poisoned");
        table.get(&job_id).map(|job| job.status)
    }

    /// Files discovered so far for a job still in the table. Empty until the
    /// job reaches the importing stage.
    pub fn job_files(&self, job_id: u64) -> Option<Vec<SourceFile>> {
        let table = self.shared.table.lock().expect("job table lock poisoned");
        table.get(&job_id).map(|job| job.files.clone())
    }
}

/// Claim data copied out of the table so the long-running work happens
/// without the lock.
struct ClaimedJob {
    id: u64,
    request: ImportRequest,
    processors: Vec<Box<dyn Processor>>,
}

fn claim_next_job(shared: &QueueShared) -> Option<ClaimedJob> {
    let mut table = shared.table.lock().expect("job table lock poisoned");

    // Always the lowest id: jobs complete in submission order, and a
    // not-yet-ready head of the queue is never overtaken.
    let (&id, job) = table.iter_mut().next()?;

    if job.processors.is_none() {
        debug!(job_id = id, "processors not yet assigned, trying again");
        return None;
    }

    job.status = ImportStatus::Scanning;
    Some(ClaimedJob {
        id,
        request: job.request.clone(),
        processors: job.processors.take().unwrap_or_default(),
    })
}

fn finish_job(shared: &QueueShared, id: u64, outcome: JobOutcome) {
    let callback = {
        let mut table = shared.table.lock().expect("job table lock poisoned");
        table.remove(&id).and_then(|job| job.callback)
    };

    info!(
        job_id = id,
        status = %outcome.status,
        files = outcome.files_total,
        copied = outcome.stats.copied,
        skipped = outcome.stats.skipped,
        errors = outcome.stats.errors,
        "finished processing import job"
    );

    if let Some(callback) = callback {
        callback(outcome);
    }
}

fn run_job(shared: &QueueShared, claimed: ClaimedJob) {
    let ClaimedJob {
        id,
        request,
        mut processors,
    } = claimed;

    info!(
        job_id = id,
        volume = %request.volume_path.display(),
        "processing import job"
    );

    let files = processor::enumerate_sources(&mut processors, request.dump);

    {
        let mut table = shared.table.lock().expect("job table lock poisoned");
        if let Some(job) = table.get_mut(&id) {
            job.files = files.clone();
            job.status = ImportStatus::Importing;
        }
    }

    let stats = if request.dump {
        // Dump mode is inspection only; the file list was printed during
        // aggregation and nothing is copied.
        ImportStats::default()
    } else {
        copier::import_files(&shared.config.live_data_dir, &files, request.dry_run)
    };

    let status = if stats.errors > 0 {
        ImportStatus::Failed
    } else {
        ImportStatus::Completed
    };

    finish_job(
        shared,
        id,
        JobOutcome {
            job_id: id,
            volume_path: request.volume_path,
            status,
            files_total: files.len(),
            stats,
        },
    );
}

/// Reports every job still in the table as failed. Runs once, when the
/// worker exits on shutdown.
fn abandon_queued_jobs(shared: &QueueShared) {
    let abandoned = {
        let mut table = shared.table.lock().expect("job table lock poisoned");
        std::mem::take(&mut *table)
    };

    for (id, mut job) in abandoned {
        warn!(
            job_id = id,
            volume = %job.request.volume_path.display(),
            "abandoning queued import job on shutdown"
        );

        if let Some(callback) = job.callback.take() {
            callback(JobOutcome {
                job_id: id,
                volume_path: job.request.volume_path,
                status: ImportStatus::Failed,
                files_total: 0,
                stats: ImportStats::default(),
            });
        }
    }
}

fn run_worker(shared: Arc<QueueShared>, wake_receiver: Receiver<()>) {
    debug!("import worker started");

    loop {
        if shared.shutdown.load(Ordering::Relaxed) {
            break;
        }

        match wake_receiver.recv_timeout(Duration::from_millis(500)) {
            Ok(()) | Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("import worker wake channel disconnected");
                break;
            }
        }

        // Drain everything that is ready before sleeping again. A per-job
        // fault never escapes run_job, so the loop always advances. Once
        // shutdown is flagged no further job is started; the in-flight one
        // (if any) has already run to completion.
        while !shared.shutdown.load(Ordering::Relaxed) {
            let Some(claimed) = claim_next_job(&shared) else {
                break;
            };
            run_job(&shared, claimed);
        }
    }

    abandon_queued_jobs(&shared);
    debug!("import worker stopped");
}

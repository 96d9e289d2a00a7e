use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::path::AssetPath;

use super::generator::{DecodeError, PeakGenerator};
use super::key::CacheKey;
use super::model::PeakSet;
use super::storage::CacheStorage;

#[derive(Debug, Clone, Error)]
pub enum WaveformError {
    #[error("asset has no usable path")]
    PathInvalid,
    #[error("peak generation failed for {asset}: {source}")]
    GenerationFailed {
        asset: AssetPath,
        #[source]
        source: Arc<DecodeError>,
    },
    #[error("waveform workers have stopped")]
    WorkersGone,
}

/// What the cache can say about an asset right now.
#[derive(Debug, Clone)]
pub enum PeakStatus {
    Ready(Arc<PeakSet>),
    /// Generation or a disk load is in progress; ask again after a `tick`.
    Pending,
    Failed(WaveformError),
}

/// A request that finished since the last `tick`.
#[derive(Debug, Clone)]
pub struct PeakEvent {
    pub asset: AssetPath,
    pub outcome: Result<Arc<PeakSet>, WaveformError>,
}

#[derive(Debug)]
struct Job {
    asset: AssetPath,
    /// Skip the stored entry and overwrite it.
    force: bool,
}

#[derive(Debug)]
struct JobResult {
    asset: AssetPath,
    outcome: Result<PeakSet, DecodeError>,
}

/// Everything a worker needs to turn a job into a result.
struct JobContext {
    storage: Arc<CacheStorage>,
    generator: Arc<dyn PeakGenerator>,
    resolution: u32,
    store_warned: AtomicBool,
}

impl JobContext {
    fn run(&self, job: &Job) -> JobResult {
        let key = CacheKey::for_asset(&job.asset, self.resolution);

        if !job.force {
            if let Some(peaks) = self.storage.load(&key) {
                debug!(asset = %job.asset, key = %key, "peak cache hit");
                return JobResult {
                    asset: job.asset.clone(),
                    outcome: Ok(peaks),
                };
            }
        }

        let generated = panic::catch_unwind(AssertUnwindSafe(|| {
            self.generator.generate_peaks(&job.asset, self.resolution)
        }))
        .unwrap_or_else(|_| Err(DecodeError::Other("peak generator panicked".to_string())));

        if let Ok(peaks) = &generated {
            if let Err(e) = self.storage.store(&key, peaks) {
                if self.store_warned.swap(true, Ordering::Relaxed) {
                    debug!(error = %e, "peak cache write failed");
                } else {
                    warn!(error = %e, "peak cache write failed");
                }
            }
        }

        JobResult {
            asset: job.asset.clone(),
            outcome: generated,
        }
    }
}

fn worker_loop(ctx: Arc<JobContext>, jobs: Arc<Mutex<Receiver<Job>>>, results: Sender<JobResult>) {
    loop {
        let next = {
            let rx = jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rx.recv()
        };
        let Ok(job) = next else {
            break;
        };
        if results.send(ctx.run(&job)).is_err() {
            break;
        }
    }
}

/// Memoizing front of the peak cache.
///
/// Owned and driven by one control thread. Disk loads and generation run on
/// a small worker pool; finished work is picked up by [`WaveformCache::tick`].
/// At most one job per asset is outstanding at any time.
pub struct WaveformCache {
    ctx: Arc<JobContext>,
    memo: HashMap<AssetPath, Arc<PeakSet>>,
    failed: HashMap<AssetPath, WaveformError>,
    in_flight: HashSet<AssetPath>,
    /// Assets to regenerate once their current job lands.
    rerun: HashSet<AssetPath>,
    jobs: Option<Sender<Job>>,
    results_tx: Sender<JobResult>,
    results: Receiver<JobResult>,
    workers: Vec<JoinHandle<()>>,
}

impl WaveformCache {
    pub fn new(
        storage: CacheStorage,
        generator: Arc<dyn PeakGenerator>,
        resolution: u32,
        workers: usize,
    ) -> Self {
        let ctx = Arc::new(JobContext {
            storage: Arc::new(storage),
            generator,
            resolution: resolution.max(1),
            store_warned: AtomicBool::new(false),
        });

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (results_tx, results) = mpsc::channel::<JobResult>();

        let mut handles = Vec::new();
        for i in 0..workers.max(1) {
            let ctx = Arc::clone(&ctx);
            let jobs = Arc::clone(&job_rx);
            let tx = results_tx.clone();
            match thread::Builder::new()
                .name(format!("peaks-{i}"))
                .spawn(move || worker_loop(ctx, jobs, tx))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => error!(error = %e, "failed to spawn waveform worker"),
            }
        }

        // Without workers, jobs run inline on the caller's thread.
        let jobs = if handles.is_empty() { None } else { Some(job_tx) };

        Self {
            ctx,
            memo: HashMap::new(),
            failed: HashMap::new(),
            in_flight: HashSet::new(),
            rerun: HashSet::new(),
            jobs,
            results_tx,
            results,
            workers: handles,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.ctx.resolution
    }

    /// Whether peaks are persisted, as opposed to regenerated every session.
    pub fn storage_available(&self) -> bool {
        self.ctx.storage.is_available()
    }

    /// Ask for the peaks of `asset` without blocking.
    pub fn request(&mut self, asset: &AssetPath) -> PeakStatus {
        if asset.is_empty() {
            return PeakStatus::Failed(WaveformError::PathInvalid);
        }
        if let Some(peaks) = self.memo.get(asset) {
            return PeakStatus::Ready(Arc::clone(peaks));
        }
        if let Some(err) = self.failed.get(asset) {
            return PeakStatus::Failed(err.clone());
        }
        if self.in_flight.contains(asset) {
            debug!(asset = %asset, "duplicate request joined in-flight job");
            return PeakStatus::Pending;
        }

        self.dispatch(Job {
            asset: asset.clone(),
            force: false,
        });
        PeakStatus::Pending
    }

    /// Peaks already in memory, if any. Never starts work.
    pub fn peek(&self, asset: &AssetPath) -> Option<Arc<PeakSet>> {
        self.memo.get(asset).cloned()
    }

    pub fn is_pending(&self, asset: &AssetPath) -> bool {
        self.in_flight.contains(asset)
    }

    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Collect finished jobs. Call once per frame of the control loop.
    pub fn tick(&mut self) -> Vec<PeakEvent> {
        let mut events = Vec::new();
        while let Ok(done) = self.results.try_recv() {
            if let Some(event) = self.complete(done) {
                events.push(event);
            }
        }
        events
    }

    /// Blocking variant of [`request`](Self::request): returns once `asset`
    /// is resolved. Other jobs finishing meanwhile are recorded as usual.
    pub fn wait_for(&mut self, asset: &AssetPath) -> Result<Arc<PeakSet>, WaveformError> {
        if let PeakStatus::Failed(e) = self.request(asset) {
            return Err(e);
        }

        while self.in_flight.contains(asset) {
            let done = self
                .results
                .recv()
                .map_err(|_| WaveformError::WorkersGone)?;
            self.complete(done);
        }

        match self.memo.get(asset) {
            Some(peaks) => Ok(Arc::clone(peaks)),
            None => Err(self
                .failed
                .get(asset)
                .cloned()
                .unwrap_or(WaveformError::WorkersGone)),
        }
    }

    /// Throw away what is known about `asset` and rebuild its entry from the
    /// source audio, overwriting the stored one.
    pub fn regenerate(&mut self, asset: &AssetPath) {
        if asset.is_empty() {
            return;
        }
        self.memo.remove(asset);
        self.failed.remove(asset);

        if self.in_flight.contains(asset) {
            self.rerun.insert(asset.clone());
            return;
        }
        self.dispatch(Job {
            asset: asset.clone(),
            force: true,
        });
    }

    /// Drop the in-memory copy of `asset`. The stored entry stays.
    pub fn forget(&mut self, asset: &AssetPath) {
        self.memo.remove(asset);
        self.failed.remove(asset);
    }

    /// Forget every remembered failure so the next `request` retries.
    pub fn clear_failures(&mut self) {
        if !self.failed.is_empty() {
            debug!(count = self.failed.len(), "cleared remembered waveform failures");
        }
        self.failed.clear();
    }

    /// Drop in-memory entries for assets `keep` rejects. Stored entries and
    /// in-flight jobs are untouched.
    pub fn retain(&mut self, mut keep: impl FnMut(&AssetPath) -> bool) {
        let before = self.memo.len();
        self.memo.retain(|asset, _| keep(asset));
        self.failed.retain(|asset, _| keep(asset));
        if self.memo.len() != before {
            debug!(dropped = before - self.memo.len(), "dropped unused waveforms");
        }
    }

    /// Number of peak sets held in memory.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    fn dispatch(&mut self, job: Job) {
        self.in_flight.insert(job.asset.clone());

        let job = match &self.jobs {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                Err(mpsc::SendError(job)) => {
                    error!("waveform workers are gone, generating inline");
                    self.jobs = None;
                    job
                }
            },
            None => job,
        };

        let result = self.ctx.run(&job);
        // The receiver lives in `self`, so this cannot fail.
        let _ = self.results_tx.send(result);
    }

    fn complete(&mut self, done: JobResult) -> Option<PeakEvent> {
        let JobResult { asset, outcome } = done;
        self.in_flight.remove(&asset);

        if self.rerun.remove(&asset) {
            self.dispatch(Job { asset, force: true });
            return None;
        }

        let outcome = match outcome {
            Ok(peaks) => {
                let peaks = Arc::new(peaks);
                self.memo.insert(asset.clone(), Arc::clone(&peaks));
                Ok(peaks)
            }
            Err(source) => {
                let err = WaveformError::GenerationFailed {
                    asset: asset.clone(),
                    source: Arc::new(source),
                };
                warn!(error = %err, "no waveform for asset");
                self.failed.insert(asset.clone(), err.clone());
                Err(err)
            }
        };
        Some(PeakEvent { asset, outcome })
    }
}

impl Drop for WaveformCache {
    fn drop(&mut self) {
        // Closing the job channel lets idle workers exit; busy ones finish first.
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

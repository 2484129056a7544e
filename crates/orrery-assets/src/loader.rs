//! Worker pool that fetches and decodes assets off the main thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::decode::DEFAULT_MAX_DIMENSION;
use crate::{AssetError, AssetKind, AssetSource, AssetTarget, LoadedAsset, decode};

/// A request to load one asset.
#[derive(Clone, Debug)]
pub struct AssetRequest {
    pub target: AssetTarget,
    pub source: AssetSource,
    pub kind: AssetKind,
}

/// A finished load, successful or not.
#[derive(Debug)]
pub struct LoadOutcome {
    pub target: AssetTarget,
    pub source: AssetSource,
    pub result: Result<LoadedAsset, AssetError>,
    /// Fetch plus decode time in milliseconds.
    pub load_time_ms: u64,
}

/// Loader tuning.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Number of worker threads (at least one is always spawned).
    pub worker_threads: usize,
    /// Timeout for a whole HTTP request.
    pub http_timeout: Duration,
    /// Capacity of the request and outcome channels.
    pub queue_capacity: usize,
    /// Longest image edge handed to the renderer; larger images are scaled down.
    pub max_dimension: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            http_timeout: Duration::from_secs(30),
            queue_capacity: 16,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Fire-and-forget asset loading across a small thread pool.
///
/// Dropping the loader closes the request channel; idle workers exit, and a
/// worker mid-request exits once its result can no longer be delivered.
pub struct AssetLoader {
    request_sender: Sender<AssetRequest>,
    outcome_receiver: Receiver<LoadOutcome>,
    in_flight: Arc<AtomicU64>,
    live_workers: Arc<AtomicUsize>,
}

/// Counts a worker thread as alive until the thread's closure is dropped.
struct LiveWorker(Arc<AtomicUsize>);

impl LiveWorker {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }
}

impl Drop for LiveWorker {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl AssetLoader {
    pub fn new(config: LoaderConfig) -> Result<Self, AssetError> {
        let capacity = config.queue_capacity.max(1);
        let (request_sender, request_receiver) = bounded::<AssetRequest>(capacity);
        let (outcome_sender, outcome_receiver) = bounded::<LoadOutcome>(capacity);
        let in_flight = Arc::new(AtomicU64::new(0));
        let live_workers = Arc::new(AtomicUsize::new(0));

        let client = reqwest::blocking::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("orrery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let threads = config.worker_threads.max(1);
        let max_dimension = config.max_dimension;
        for index in 0..threads {
            let receiver = request_receiver.clone();
            let sender = outcome_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let client = client.clone();
            let live = LiveWorker::enter(&live_workers);

            std::thread::Builder::new()
                .name(format!("asset-loader-{index}"))
                .spawn(move || {
                    let _live = live;
                    while let Ok(request) = receiver.recv() {
                        let start = Instant::now();
                        let result = load(&request, &client, max_dimension);
                        let outcome = LoadOutcome {
                            target: request.target,
                            source: request.source,
                            result,
                            load_time_ms: start.elapsed().as_millis() as u64,
                        };
                        in_flight.fetch_sub(1, Ordering::Relaxed);
                        if sender.send(outcome).is_err() {
                            break;
                        }
                    }
                })?;
        }

        log::debug!("Asset loader started with {} workers", threads);

        Ok(Self {
            request_sender,
            outcome_receiver,
            in_flight,
            live_workers,
        })
    }

    /// Queue a request.
    ///
    /// Returns `Err(request)` if the queue is full.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, request: AssetRequest) -> Result<(), AssetRequest> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        log::debug!("Queued {} from {}", request.target, request.source);
        self.request_sender.try_send(request).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            e.into_inner()
        })
    }

    /// Collect every finished load without blocking.
    ///
    /// Call this once per frame on the main thread.
    pub fn drain_outcomes(&self) -> Vec<LoadOutcome> {
        self.outcome_receiver.try_iter().collect()
    }

    /// Number of requests queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Worker threads that have not exited yet.
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Acquire)
    }

    #[cfg(test)]
    fn live_worker_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live_workers)
    }
}

/// Fetch and decode one asset on the calling thread.
fn load(
    request: &AssetRequest,
    client: &reqwest::blocking::Client,
    max_dimension: u32,
) -> Result<LoadedAsset, AssetError> {
    let bytes = request.source.read(client)?;
    decode(&bytes, request.kind, max_dimension)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use super::*;
    use crate::ImagePixels;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    fn wait_for(loader: &AssetLoader, count: usize) -> Vec<LoadOutcome> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outcomes = Vec::new();
        while outcomes.len() < count && Instant::now() < deadline {
            outcomes.extend(loader.drain_outcomes());
            std::thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn test_loads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 4, 4);
        write_png(&dir.path().join("b.png"), 8, 2);

        let loader = AssetLoader::new(LoaderConfig::default()).unwrap();
        for (i, name) in ["a.png", "b.png"].iter().enumerate() {
            loader
                .submit(AssetRequest {
                    target: AssetTarget::Orbiter(i),
                    source: AssetSource::parse(name, dir.path()),
                    kind: AssetKind::ColorMap { srgb: true },
                })
                .unwrap();
        }

        let mut outcomes = wait_for(&loader, 2);
        assert_eq!(outcomes.len(), 2);
        outcomes.sort_by_key(|o| o.target);
        let LoadedAsset::Image(image) = outcomes[1].result.as_ref().unwrap() else {
            panic!("expected image");
        };
        assert_eq!((image.width, image.height), (8, 2));
        assert!(matches!(image.pixels, ImagePixels::Rgba8(_)));
        assert_eq!(loader.in_flight_count(), 0);
    }

    #[test]
    fn test_missing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(LoaderConfig::default()).unwrap();
        loader
            .submit(AssetRequest {
                target: AssetTarget::Backdrop,
                source: AssetSource::parse("stars.jpg", dir.path()),
                kind: AssetKind::ColorMap { srgb: false },
            })
            .unwrap();

        let outcomes = wait_for(&loader, 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].target, AssetTarget::Backdrop);
        assert!(matches!(outcomes[0].result, Err(AssetError::Io(_))));
    }

    fn wait_until_idle(counter: &AtomicUsize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(10);
        while counter.load(Ordering::Acquire) > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        counter.load(Ordering::Acquire)
    }

    #[test]
    fn test_dropping_loader_stops_idle_workers() {
        let loader = AssetLoader::new(LoaderConfig {
            worker_threads: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(loader.live_workers(), 3);

        let counter = loader.live_worker_counter();
        drop(loader);
        assert_eq!(wait_until_idle(&counter), 0);
    }

    #[test]
    fn test_dropping_loader_with_undelivered_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(LoaderConfig {
            worker_threads: 1,
            ..Default::default()
        })
        .unwrap();
        loader
            .submit(AssetRequest {
                target: AssetTarget::Environment,
                source: AssetSource::parse("sky.hdr", dir.path()),
                kind: AssetKind::Environment,
            })
            .unwrap();

        let counter = loader.live_worker_counter();
        drop(loader);
        assert_eq!(wait_until_idle(&counter), 0);
    }

    #[test]
    fn test_drain_without_requests_is_empty() {
        let loader = AssetLoader::new(LoaderConfig {
            worker_threads: 1,
            ..Default::default()
        })
        .unwrap();
        assert!(loader.drain_outcomes().is_empty());
        assert_eq!(loader.in_flight_count(), 0);
    }

    #[test]
    fn test_full_queue_returns_request() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(LoaderConfig {
            worker_threads: 1,
            queue_capacity: 1,
            ..Default::default()
        })
        .unwrap();

        // Flood the queue faster than one worker can drain it.
        let mut rejected = 0;
        for i in 0..64 {
            let request = AssetRequest {
                target: AssetTarget::Orbiter(i),
                source: AssetSource::parse("nope.png", dir.path()),
                kind: AssetKind::ColorMap { srgb: true },
            };
            if loader.submit(request).is_err() {
                rejected += 1;
            }
        }
        assert!(rejected > 0);
    }
}

//! Hot-reloading container for a single decoded file.
//!
//! A [`LiveAsset`] loads its source once up front and then keeps a poll
//! watcher running in the background. Whenever the file changes, the watcher
//! thread rereads and decodes it; successful decodes are published to readers
//! by swapping an `Arc<T>`, failed ones are remembered and leave the previous
//! value in place:
//!
//! ```text
//!   PollWatcher thread                      render thread
//!   ──────────────────                      ─────────────
//!   mtime changed ─▶ fs::read ─▶ decode
//!                                  │ Ok     value() ─▶ Arc<T> (old or new, never torn)
//!                                  ├──────▶ RwLock<Arc<T>>
//!                                  │ Err    error() ─▶ Option<AssetError>
//!                                  └──────▶ Mutex<Option<AssetError>>
//! ```
//!
//! Reads take the lock only long enough to clone the `Arc`; decoding always
//! happens outside of it.

mod error;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, Dispatch};

pub use error::{AssetError, DecodeError};

/// How often watchers check their file when no interval is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Shareable decode function, as handed out by codec providers.
pub type DecodeFn<T> = Arc<dyn Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync>;

/// Tuning for the background watcher of a [`LiveAsset`].
#[derive(Clone, Debug)]
pub struct WatchOptions {
    /// Interval between two modification checks.
    pub poll_interval: Duration,
    /// Dispatcher used for log events raised on the watcher thread.
    ///
    /// When `None`, the watcher thread logs through whatever default
    /// dispatcher is active for it.
    pub dispatch: Option<Dispatch>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            dispatch: None,
        }
    }
}

impl WatchOptions {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}

struct Shared<T> {
    path: PathBuf,
    current: RwLock<Arc<T>>,
    last_error: Mutex<Option<AssetError>>,
    generation: AtomicU64,
    // Held across read, decode and publish so reloads land in read order.
    reloading: Mutex<()>,
}

impl<T> Shared<T> {
    fn reload<F>(&self, decode: &F)
    where
        F: Fn(&[u8]) -> Result<T, DecodeError>,
    {
        let _reloading = self.reloading.lock();
        match load(&self.path, decode) {
            Ok(value) => self.publish(value),
            Err(err) => {
                debug!(
                    path = %self.path.display(),
                    error = %err,
                    "reload failed; keeping previous value"
                );
                self.record(err);
            }
        }
    }

    fn publish(&self, value: T) {
        let previous = std::mem::replace(&mut *self.current.write(), Arc::new(value));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        *self.last_error.lock() = None;
        drop(previous);
        debug!(path = %self.path.display(), generation, "published reloaded asset");
    }

    fn record(&self, err: AssetError) {
        *self.last_error.lock() = Some(err);
    }

    /// Watcher failures only surface when no reload error is pending, so a
    /// deleted file keeps reporting the read that failed.
    fn record_watch_error(&self, err: AssetError) {
        let mut last_error = self.last_error.lock();
        if last_error.is_none() {
            debug!(path = %self.path.display(), error = %err, "watcher error");
            *last_error = Some(err);
        }
    }
}

/// A decoded file that follows its source on disk.
///
/// Created once per path; the background watcher lives as long as the asset.
pub struct LiveAsset<T> {
    shared: Arc<Shared<T>>,
    _watcher: PollWatcher,
}

impl<T> LiveAsset<T>
where
    T: Send + Sync + 'static,
{
    /// Loads `path` with `decode` and starts watching it with default options.
    ///
    /// Fails if the initial read or decode fails; there is no stale value to
    /// fall back to at that point.
    pub fn open<F>(path: impl Into<PathBuf>, decode: F) -> Result<Self, AssetError>
    where
        F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        Self::open_with(path, decode, WatchOptions::default())
    }

    /// Like [`LiveAsset::open`], with an explicit watcher configuration.
    pub fn open_with<F>(
        path: impl Into<PathBuf>,
        decode: F,
        options: WatchOptions,
    ) -> Result<Self, AssetError>
    where
        F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
    {
        let path = path.into();
        let stamp = modified_at(&path);
        let initial = load(&path, &decode)?;
        let shared = Arc::new(Shared {
            path,
            current: RwLock::new(Arc::new(initial)),
            last_error: Mutex::new(None),
            generation: AtomicU64::new(0),
            reloading: Mutex::new(()),
        });

        let decode = Arc::new(decode);
        let watcher = spawn_watcher(Arc::clone(&shared), Arc::clone(&decode), &options)?;

        // An edit that landed between the initial read and the watcher's first
        // scan would otherwise go unnoticed until the next one.
        if shared.generation.load(Ordering::Acquire) == 0 && modified_at(&shared.path) != stamp {
            shared.reload(decode.as_ref());
        }

        debug!(
            path = %shared.path.display(),
            poll_ms = options.poll_interval.as_millis() as u64,
            "watching asset"
        );

        Ok(Self {
            shared,
            _watcher: watcher,
        })
    }
}

impl<T> LiveAsset<T> {
    /// Latest successfully decoded value.
    pub fn value(&self) -> Arc<T> {
        Arc::clone(&self.shared.current.read())
    }

    /// Error from the most recent reload attempt, if it failed.
    pub fn error(&self) -> Option<AssetError> {
        self.shared.last_error.lock().clone()
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Number of reloads published since the initial load.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }
}

impl<T> fmt::Debug for LiveAsset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveAsset")
            .field("path", &self.shared.path)
            .field("generation", &self.generation())
            .field("error", &self.shared.last_error.lock().as_ref().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

fn load<T, F>(path: &Path, decode: &F) -> Result<T, AssetError>
where
    F: Fn(&[u8]) -> Result<T, DecodeError> + ?Sized,
{
    let bytes = fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source: Arc::new(source),
    })?;
    decode(&bytes).map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn spawn_watcher<T, F>(
    shared: Arc<Shared<T>>,
    decode: Arc<F>,
    options: &WatchOptions,
) -> Result<PollWatcher, AssetError>
where
    T: Send + Sync + 'static,
    F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    let watch_error = |path: &Path, source: notify::Error| AssetError::Watch {
        path: path.to_path_buf(),
        source: Arc::new(source),
    };

    let path = shared.path.clone();
    let dispatch = options.dispatch.clone();
    let config = notify::Config::default().with_poll_interval(options.poll_interval);
    let mut watcher = PollWatcher::new(
        move |result: notify::Result<Event>| {
            let handle = || match result {
                Ok(event) if is_content_change(&event.kind) => shared.reload(decode.as_ref()),
                Ok(_) => {}
                Err(err) => shared.record_watch_error(watch_error(&shared.path, err)),
            };
            match &dispatch {
                Some(dispatch) => tracing::dispatcher::with_default(dispatch, handle),
                None => handle(),
            }
        },
        config,
    )
    .map_err(|err| watch_error(&path, err))?;

    watcher
        .watch(&path, RecursiveMode::NonRecursive)
        .map_err(|err| watch_error(&path, err))?;

    Ok(watcher)
}

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::config::ManifestConfig;
use crate::error::{ManifestError, ManifestResult};
use crate::manifest::{create_manifest, Manifest};

/// Events closer together than this are handled by a single rebuild.
const DEBOUNCE: Duration = Duration::from_millis(50);

/// Rebuilds the manifest whenever the project changes on disk.
///
/// Every successful build is published as a fresh snapshot to subscribers.
/// A failed build is logged and subscribers keep the last good manifest.
pub struct ManifestWatcher {
    config: ManifestConfig,
    tx: watch::Sender<Arc<Manifest>>,
    events: mpsc::UnboundedReceiver<Event>,
    _watcher: RecommendedWatcher,
}

impl ManifestWatcher {
    /// Builds the initial manifest and starts watching the routes, params and
    /// assets directories. A directory that does not exist yet is picked up
    /// through its nearest existing ancestor once it is created.
    pub fn new(config: ManifestConfig) -> ManifestResult<Self> {
        let initial = create_manifest(&config)?;
        let (tx, _) = watch::channel(Arc::new(initial));
        let (event_tx, events) = mpsc::unbounded_channel();

        let mut targets = Vec::new();
        let mut roots = Vec::new();
        for dir in [config.routes_dir(), config.params_dir(), config.assets_dir()] {
            let (target, root) = watch_target(&dir)?;
            if target != root {
                debug!("{} does not exist yet, watching {}", dir.display(), target.display());
            }
            targets.push(target);
            roots.push(root);
        }

        let filter_roots = roots.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Access(_))
                        && touches_roots(&event, &filter_roots)
                    {
                        // the receiver is gone once the watcher is dropped
                        let _ = event_tx.send(event);
                    }
                }
                Err(e) => error!("Watch error: {:?}", e),
            }
        })?;

        for target in covering(targets) {
            watcher.watch(&target, RecursiveMode::Recursive)?;
            info!("Watching {}", target.display());
        }

        Ok(Self {
            config,
            tx,
            events,
            _watcher: watcher,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Manifest>> {
        self.tx.subscribe()
    }

    /// The most recently published manifest.
    pub fn current(&self) -> Arc<Manifest> {
        self.tx.borrow().clone()
    }

    /// Builds a new manifest off the async runtime and publishes it.
    pub async fn rebuild(&self) -> ManifestResult<Arc<Manifest>> {
        let config = self.config.clone();
        let manifest = tokio::task::spawn_blocking(move || create_manifest(&config)).await??;

        let manifest = Arc::new(manifest);
        self.tx.send_replace(manifest.clone());
        Ok(manifest)
    }

    /// Handles file system events until the watcher shuts down. Builds run
    /// one at a time.
    pub async fn run(mut self) -> ManifestResult<()> {
        while let Some(event) = self.events.recv().await {
            debug!("Change detected: {:?}", event.paths);

            // let a burst of events settle into one rebuild
            while let Ok(Some(event)) = tokio::time::timeout(DEBOUNCE, self.events.recv()).await {
                debug!("Change detected: {:?}", event.paths);
            }

            match self.rebuild().await {
                Ok(manifest) => info!("Rebuilt manifest with {} routes", manifest.routes.len()),
                Err(e) => error!("Failed to rebuild manifest: {}", e),
            }
        }

        Ok(())
    }
}

/// The directory to watch for `root`, and `root` spelled the way the
/// watcher reports paths under that directory.
fn watch_target(root: &Path) -> ManifestResult<(PathBuf, PathBuf)> {
    let mut existing = root;
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => break,
        }
    }

    let target = existing
        .canonicalize()
        .map_err(|e| ManifestError::io(existing, e))?;
    let root = missing.iter().rev().fold(target.clone(), |path, name| path.join(name));
    Ok((target, root))
}

/// Drops duplicate targets and targets inside another target.
fn covering(mut targets: Vec<PathBuf>) -> Vec<PathBuf> {
    targets.sort();
    targets.dedup();
    let mut kept: Vec<PathBuf> = Vec::new();
    for target in targets {
        if !kept.iter().any(|outer| target.starts_with(outer)) {
            kept.push(target);
        }
    }
    kept
}

/// Whether the event concerns a root, something inside one, or a directory
/// on the way to one that does not exist yet.
fn touches_roots(event: &Event, roots: &[PathBuf]) -> bool {
    event.paths.iter().any(|path| {
        roots
            .iter()
            .any(|root| path.starts_with(root) || root.starts_with(path))
    })
}

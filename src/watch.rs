//! Rebuilds the site when its sources change. The [`Orchestrator`] is either
//! idle or rebuilding. A relevant filesystem event moves it from idle to
//! rebuilding: subscribers are told a rebuild is starting and the build
//! pipeline runs on its own thread. Events that arrive while a rebuild is in
//! progress are dropped, not queued. When the pipeline finishes, successfully
//! or not, the orchestrator is idle again.

use crate::util::has_source_extension;
use crossbeam_channel::{unbounded, Receiver, Sender};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// The work run on every rebuild. Implemented for any
/// `Fn() -> Result<(), E>` closure whose error can be displayed.
pub trait Pipeline: Send + Sync + 'static {
    type Error: fmt::Display;

    fn run(&self) -> Result<(), Self::Error>;
}

impl<F, E> Pipeline for F
where
    F: Fn() -> Result<(), E> + Send + Sync + 'static,
    E: fmt::Display,
{
    type Error = E;

    fn run(&self) -> Result<(), E> {
        self()
    }
}

/// Sent to every subscriber when a rebuild starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RebuildStarted;

/// The set of parties interested in [`RebuildStarted`] notifications. A
/// subscription ends when its receiver is dropped.
#[derive(Default)]
pub struct Subscribers {
    senders: Mutex<Vec<Sender<RebuildStarted>>>,
}

impl Subscribers {
    pub fn subscribe(&self) -> Receiver<RebuildStarted> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    /// Notifies every live subscriber, forgetting the ones whose receiver
    /// has been dropped. Returns the number notified.
    pub fn notify(&self) -> usize {
        let mut senders = self.lock();
        senders.retain(|tx| tx.send(RebuildStarted).is_ok());
        senders.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<RebuildStarted>>> {
        // A panic while holding the lock can't leave the list inconsistent.
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Idle,
    Rebuilding,
}

/// Coalesces change events into non-overlapping runs of a [`Pipeline`].
pub struct Orchestrator<P> {
    pipeline: Arc<P>,
    rebuilding: Arc<AtomicBool>,
    subscribers: Arc<Subscribers>,
}

impl<P: Pipeline> Orchestrator<P> {
    pub fn new(pipeline: P) -> Orchestrator<P> {
        Orchestrator::with_subscribers(pipeline, Arc::new(Subscribers::default()))
    }

    /// Creates an orchestrator that notifies an existing set of subscribers.
    pub fn with_subscribers(pipeline: P, subscribers: Arc<Subscribers>) -> Orchestrator<P> {
        Orchestrator {
            pipeline: Arc::new(pipeline),
            rebuilding: Arc::new(AtomicBool::new(false)),
            subscribers,
        }
    }

    pub fn state(&self) -> State {
        if self.rebuilding.load(Ordering::Acquire) {
            State::Rebuilding
        } else {
            State::Idle
        }
    }

    pub fn subscribers(&self) -> &Arc<Subscribers> {
        &self.subscribers
    }

    /// Starts a rebuild unless one is already running. Never blocks on the
    /// rebuild itself; returns the rebuild thread's handle, or `None` if the
    /// request was absorbed by the rebuild in progress.
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rebuild already in progress; ignoring change");
            return None;
        }
        let gate = Gate(Arc::clone(&self.rebuilding));

        let notified = self.subscribers.notify();
        debug!("Notified {} rebuild subscribers", notified);

        let pipeline = Arc::clone(&self.pipeline);
        let spawned = thread::Builder::new()
            .name("rebuild".to_owned())
            .spawn(move || {
                let _gate = gate;
                info!("Rebuilding");
                match pipeline.run() {
                    Ok(()) => info!("Rebuilding complete"),
                    Err(err) => {
                        error!("{}", err);
                        info!("Rebuild aborted");
                    }
                }
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("Starting rebuild thread: {}", err);
                None
            }
        }
    }

    /// Triggers a rebuild if `event` is relevant (see [`is_relevant`]).
    pub fn handle_event(&self, event: &Event) -> Option<JoinHandle<()>> {
        if is_relevant(event) {
            debug!("Change detected: {:?} {:?}", event.kind, event.paths);
            self.trigger()
        } else {
            None
        }
    }

    /// Watches `root` recursively and rebuilds on every relevant change.
    /// Only returns if the watcher can't be set up.
    pub fn watch(&self, root: &Path) -> notify::Result<()> {
        let (tx, rx) = unbounded();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("Watching {} for changes", root.display());

        for res in rx {
            match res {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(err) => warn!("Watcher error: {}", err),
            }
        }
        Ok(())
    }
}

/// Returns the orchestrator to idle when dropped, including when the
/// pipeline panics.
struct Gate(Arc<AtomicBool>);

impl Drop for Gate {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// True for creations, removals, renames and modifications that involve at
/// least one markdown file.
pub fn is_relevant(event: &Event) -> bool {
    let kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_)
    );
    kind && event.paths.iter().any(|path| has_source_extension(path))
}

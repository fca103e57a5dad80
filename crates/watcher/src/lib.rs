//! Config directory watching for the agent reloader
//!
//! This crate provides:
//! - A single-directory watcher with separate event and error streams
//! - Suffix/operation filtering of raw notifications
//! - A replace-on-arm debounce timer
//! - The watch session that ties them to a [`ReloadHandler`](reload_core::ReloadHandler)

pub mod debounce;
pub mod error;
pub mod filter;
pub mod session;

pub use debounce::Debouncer;
pub use error::{StreamKind, WatchError};
pub use filter::{EventFilter, Verdict};
pub use session::WatchSession;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use reload_core::{ChangeEvent, Op};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::info;

/// Watches exactly one directory (non-recursive)
///
/// The OS-level watch lives as long as this value; dropping it unregisters
/// the watch and eventually closes both streams.
pub struct DirectoryWatcher {
    _watcher: RecommendedWatcher,
}

/// Receiving ends of a watcher
///
/// Both channels are unbounded so the notification backend never blocks on
/// a slow consumer.
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl WatchStreams {
    pub fn new(
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        errors: mpsc::UnboundedReceiver<notify::Error>,
    ) -> Self {
        Self { events, errors }
    }
}

impl DirectoryWatcher {
    /// Register a watch on `path` and return the live streams
    pub fn start(path: &Path) -> Result<(Self, WatchStreams), WatchError> {
        if !path.exists() {
            return Err(WatchError::MissingDirectory(path.to_path_buf()));
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for change in translate(event) {
                        // Receiver gone means the session is over
                        let _ = event_tx.send(change);
                    }
                }
                Err(e) => {
                    let _ = error_tx.send(e);
                }
            }
        })
        .map_err(WatchError::Init)?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Started watching {} for changes...", path.display());

        Ok((
            Self { _watcher: watcher },
            WatchStreams::new(event_rx, error_rx),
        ))
    }
}

/// Map a backend event kind onto the operation set
pub fn op_from_kind(kind: &EventKind) -> Op {
    match kind {
        EventKind::Create(_) => Op::CREATE,
        // The destination of a rename is a new file under that name
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Op::CREATE,
        EventKind::Modify(ModifyKind::Name(_)) => Op::RENAME,
        EventKind::Modify(ModifyKind::Metadata(_)) => Op::CHMOD,
        EventKind::Modify(_) => Op::WRITE,
        EventKind::Remove(_) => Op::REMOVE,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Op::empty(),
    }
}

/// Split one backend notification into per-path change events
///
/// A paired rename (`[from, to]`) reports the source as renamed and the
/// destination as created, so a file renamed into place counts as new.
pub fn translate(event: notify::Event) -> impl Iterator<Item = ChangeEvent> {
    let op = op_from_kind(&event.kind);
    let paired_rename = matches!(event.kind, EventKind::Modify(ModifyKind::Name(RenameMode::Both)));

    event.paths.into_iter().enumerate().map(move |(index, path)| {
        if paired_rename && index == 1 {
            ChangeEvent::new(path, Op::CREATE)
        } else {
            ChangeEvent::new(path, op)
        }
    })
}

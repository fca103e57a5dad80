//! Watch session: directory events → filter → debounce → reload

use crate::debounce::Debouncer;
use crate::error::{StreamKind, WatchError};
use crate::filter::EventFilter;
use crate::{DirectoryWatcher, WatchStreams};
use reload_core::{ChangeEvent, ReloadHandler};
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// One watch session over a single directory
///
/// The session never ends successfully: it runs until a watcher stream
/// closes or setup fails, and the caller decides whether to start over.
pub struct WatchSession {
    target: PathBuf,
    filter: EventFilter,
    debouncer: Debouncer,
    handler: Arc<dyn ReloadHandler>,
}

impl WatchSession {
    pub fn new(
        target: impl Into<PathBuf>,
        filter: EventFilter,
        delay: Duration,
        handler: Arc<dyn ReloadHandler>,
    ) -> Self {
        Self {
            target: target.into(),
            filter,
            debouncer: Debouncer::new(delay),
            handler,
        }
    }

    /// Start the directory watcher and process its streams
    ///
    /// Setup failures are returned immediately. The OS watch is released
    /// when this future completes or is dropped.
    pub async fn run(self) -> Result<Infallible, WatchError> {
        let (_watcher, streams) = DirectoryWatcher::start(&self.target)?;
        self.drive(streams).await
    }

    /// Consume already-open streams until one of them closes
    pub async fn drive(&self, mut streams: WatchStreams) -> Result<Infallible, WatchError> {
        loop {
            tokio::select! {
                event = streams.events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => return Err(self.stream_closed(StreamKind::Events)),
                },
                err = streams.errors.recv() => match err {
                    Some(err) => error!("Watcher error: {}", err),
                    None => return Err(self.stream_closed(StreamKind::Errors)),
                },
            }
        }
    }

    fn handle_event(&self, event: ChangeEvent) {
        if !self.filter.is_reload_worthy(&event) {
            return;
        }

        let trigger = event.path;
        let handler = Arc::clone(&self.handler);
        debug!(
            "Scheduling reload in {:?} for {}",
            self.debouncer.delay(),
            trigger.display()
        );

        self.debouncer.arm(move || async move {
            info!("Config changes settled, reloading (last change: {})", trigger.display());
            handler.reload(&trigger).await;
        });
    }

    fn stream_closed(&self, kind: StreamKind) -> WatchError {
        let err = WatchError::StreamClosed(kind);
        error!("Stopped watching {}: {}", self.target.display(), err);
        err
    }
}

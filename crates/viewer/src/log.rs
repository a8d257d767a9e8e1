use tracing::Dispatch;

/// Where the viewer sends its log events.
///
/// The sink is passed in explicitly instead of relying on a process-wide
/// subscriber, so watcher threads and the render thread share one dispatcher.
#[derive(Clone, Debug, Default)]
pub struct LogSink {
    dispatch: Option<Dispatch>,
}

impl LogSink {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }

    /// A sink that leaves events to whatever dispatcher is already current.
    pub fn ambient() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) -> Option<&Dispatch> {
        self.dispatch.as_ref()
    }

    /// Runs `f` with this sink as the current dispatcher.
    pub fn scoped<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

use std::sync::Arc;
use std::time::Instant;

use cadence_codec_core::component::Component;
use cadence_codec_core::format::MediaFormat;

/// Lifecycle state of a codec controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
    /// No component; the initial and terminal state.
    Released,
    /// Component creation is in flight on the dispatcher.
    Allocating,
    /// A component is installed but not started.
    Allocated,
    /// Component start is in flight on the dispatcher.
    Starting,
    /// The component is processing work.
    Running,
    /// A flush is in flight on the dispatcher.
    Flushing,
    /// Flushed; waiting for a resume.
    Flushed,
    /// A resume is in flight.
    Resuming,
    /// A stop is in flight on the dispatcher.
    Stopping,
    /// A release is in flight on a transient thread.
    Releasing,
}

/// Lifecycle state together with the owning component handle.
///
/// The handle is present only between a completed allocation and the release
/// that tears it down; entry to `Released` clears it.
pub(crate) struct ControllerState {
    state: CodecState,
    pub(crate) component: Option<Arc<dyn Component>>,
}

impl ControllerState {
    pub(crate) fn new() -> Self {
        Self {
            state: CodecState::Released,
            component: None,
        }
    }

    pub(crate) fn get(&self) -> CodecState {
        self.state
    }

    pub(crate) fn set(&mut self, state: CodecState) {
        self.state = state;
    }
}

/// Input/output format pair derived during configure.
#[derive(Default)]
pub(crate) struct FormatPair {
    pub(crate) input: MediaFormat,
    pub(crate) output: MediaFormat,
}

/// Completion deadline of the command currently executing on the dispatcher.
///
/// `None` means no command is in flight ("never").
#[derive(Default)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    pub(crate) fn set(&mut self, at: Option<Instant>) {
        self.0 = at;
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<Instant> {
        self.0
    }

    pub(crate) fn is_elapsed(&self, now: Instant) -> bool {
        match self.0 {
            Some(at) => at < now,
            None => false,
        }
    }
}

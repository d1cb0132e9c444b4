//! Codec controller: the lifecycle state machine behind the client API.
//!
//! # Execution model
//!
//! Every `initiate_*`/`signal_*` entrypoint is non-blocking: it validates the
//! current state, transitions it to an in-progress state, and posts a command
//! to the dispatcher thread, which runs the matching blocking worker. Results
//! arrive through the client callback sink as [`CodecEvent`]s. Release is the
//! exception twice over: it runs on a
//! transient thread of its own (the dispatcher may be the thread that is
//! stuck), and it is what the watchdog forces when a command overstays its
//! deadline.

mod state;
mod workers;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crossbeam_channel::Sender;
use tracing::warn;

use cadence_codec_core::channel::{BufferChannel, Surface};
use cadence_codec_core::component::ComponentStore;
use cadence_codec_core::format::MediaFormat;
use cadence_codec_core::status::{ActionCode, Status};
use cadence_codec_core::work::WorkItem;

use crate::config::CodecConfig;
use crate::dispatcher::{self, CodecCommand};
use crate::events::{CodecEvent, CodecEventCallback};
use crate::watchdog::Watchdog;

pub use state::CodecState;
use state::{ControllerState, Deadline, FormatPair};

/// The codec control surface exposed to the client.
///
/// All commands are non-blocking; completion and errors arrive through the
/// callback sink passed at construction.
pub struct CodecController {
    pub(crate) inner: Arc<ControllerInner>,
}

impl CodecController {
    pub fn new(
        store: Arc<dyn ComponentStore>,
        channel: Arc<dyn BufferChannel>,
        callback: CodecEventCallback,
        config: CodecConfig,
    ) -> Self {
        Self::with_watchdog(store, channel, callback, config, Watchdog::global())
    }

    pub(crate) fn with_watchdog(
        store: Arc<dyn ComponentStore>,
        channel: Arc<dyn BufferChannel>,
        callback: CodecEventCallback,
        config: CodecConfig,
        watchdog: &Watchdog,
    ) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let inner = Arc::new(ControllerInner {
            state: Mutex::new(ControllerState::new()),
            formats: Mutex::new(FormatPair::default()),
            deadline: Mutex::new(Deadline::default()),
            work_done_queue: Mutex::new(VecDeque::new()),
            command_tx,
            callback,
            channel,
            store,
        });
        dispatcher::spawn(Arc::downgrade(&inner), config, command_rx);
        watchdog.register(Arc::downgrade(&inner));
        Self { inner }
    }

    /// Snapshot of the current lifecycle state.
    pub fn state(&self) -> CodecState {
        self.inner.current_state()
    }

    /// Creates the named component. Completes with `ComponentAllocated` or
    /// `Error`.
    pub fn initiate_allocate_component(&self, component_name: impl Into<String>) {
        self.inner.initiate_allocate_component(component_name.into());
    }

    /// Applies a configuration bag. Completes with `ComponentConfigured` or
    /// `Error`.
    pub fn initiate_configure_component(&self, format: MediaFormat) {
        self.inner.initiate_configure_component(format);
    }

    /// Creates an input surface and wires it into the buffer channel.
    pub fn initiate_create_input_surface(&self) {
        self.inner.post(CodecCommand::CreateInputSurface);
    }

    /// Offers a persistent input surface; currently always declined.
    pub fn initiate_set_input_surface(&self, surface: Surface) {
        self.inner.post(CodecCommand::SetInputSurface { surface });
    }

    /// Starts the component. Completes with `StartCompleted` or `Error`.
    pub fn initiate_start(&self) {
        self.inner.initiate_start();
    }

    /// Stops the component, keeping it allocated. Always completes with
    /// `StopCompleted`; stopping an already-stopped codec is a no-op that
    /// still reports completion.
    pub fn initiate_stop(&self) {
        self.inner.initiate_stop();
    }

    /// Stops or releases depending on whether the component should survive.
    pub fn initiate_shutdown(&self, keep_component_allocated: bool) {
        if keep_component_allocated {
            self.inner.initiate_stop();
        } else {
            self.inner.initiate_release(true);
        }
    }

    /// Releases the component from any state. Idempotent; reports
    /// `ReleaseCompleted` when `send_callback` is set.
    pub fn initiate_release(&self, send_callback: bool) {
        self.inner.initiate_release(send_callback);
    }

    /// Flushes in-flight work. Completes with `FlushCompleted` or `Error`.
    pub fn signal_flush(&self) {
        self.inner.signal_flush();
    }

    /// Resumes after a flush. No completion event; subsequent failures
    /// arrive through error events.
    pub fn signal_resume(&self) {
        self.inner.signal_resume();
    }

    /// Accepted for interface compatibility; parameter updates are not
    /// applied yet.
    pub fn signal_set_parameters(&self, _params: MediaFormat) {}

    /// Accepted for interface compatibility; not applied yet.
    pub fn signal_end_of_input_stream(&self) {}

    /// Accepted for interface compatibility; not applied yet.
    pub fn signal_request_idr_frame(&self) {}

    /// Routes an output surface to the buffer channel.
    pub fn set_surface(&self, surface: Surface) -> Result<(), Status> {
        self.inner.channel.set_surface(surface)
    }
}

/// Shared controller state and logic.
///
/// Referenced weakly by the dispatcher thread, the component listener, and
/// the watchdog registry, so none of them can outlive-and-retain a released
/// controller; the transient release thread takes a strong reference for its
/// own (bounded) lifetime.
pub(crate) struct ControllerInner {
    state: Mutex<ControllerState>,
    formats: Mutex<FormatPair>,
    deadline: Mutex<Deadline>,
    work_done_queue: Mutex<VecDeque<WorkItem>>,
    command_tx: Sender<CodecCommand>,
    callback: CodecEventCallback,
    pub(crate) channel: Arc<dyn BufferChannel>,
    pub(crate) store: Arc<dyn ComponentStore>,
}

impl ControllerInner {
    fn initiate_allocate_component(&self, component_name: String) {
        let accepted = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Released {
                state.set(CodecState::Allocating);
                true
            } else {
                false
            }
        };
        if !accepted {
            self.emit_error(Status::InvalidOperation);
            return;
        }
        self.post(CodecCommand::Allocate { component_name });
    }

    fn initiate_configure_component(&self, format: MediaFormat) {
        let allowed = self.current_state() == CodecState::Allocated;
        if !allowed {
            self.emit_error(Status::Unknown);
            return;
        }
        self.post(CodecCommand::Configure { format });
    }

    fn initiate_start(&self) {
        let accepted = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Allocated {
                state.set(CodecState::Starting);
                true
            } else {
                false
            }
        };
        if !accepted {
            self.emit_error(Status::Unknown);
            return;
        }
        self.post(CodecCommand::Start);
    }

    fn initiate_stop(&self) {
        let already_stopped = {
            let mut state = self.lock_state();
            match state.get() {
                CodecState::Allocated
                | CodecState::Released
                | CodecState::Stopping
                | CodecState::Releasing => true,
                _ => {
                    state.set(CodecState::Stopping);
                    false
                },
            }
        };
        if already_stopped {
            // Stopped, released, or already on the way there.
            self.emit(CodecEvent::StopCompleted);
            return;
        }
        self.post(CodecCommand::Stop);
    }

    pub(crate) fn initiate_release(self: &Arc<Self>, send_callback: bool) {
        enum Disposition {
            AlreadyDone,
            AbortAllocation,
            Proceed,
        }

        let disposition = {
            let mut state = self.lock_state();
            match state.get() {
                CodecState::Released | CodecState::Releasing => Disposition::AlreadyDone,
                CodecState::Allocating => {
                    // The in-flight allocation worker observes the altered
                    // state and aborts without installing a component.
                    state.set(CodecState::Releasing);
                    Disposition::AbortAllocation
                },
                _ => {
                    state.set(CodecState::Releasing);
                    Disposition::Proceed
                },
            }
        };
        match disposition {
            Disposition::AlreadyDone | Disposition::AbortAllocation => {
                if send_callback {
                    self.emit(CodecEvent::ReleaseCompleted);
                }
            },
            Disposition::Proceed => {
                let codec = Arc::clone(self);
                // Never on the dispatcher: the dispatcher may be the thread
                // that is stuck, and release must still make progress.
                std::thread::Builder::new()
                    .name("cadence-codec-release".to_string())
                    .spawn(move || codec.release(send_callback))
                    .expect("failed to spawn release thread");
            },
        }
    }

    fn signal_flush(&self) {
        let accepted = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Running {
                state.set(CodecState::Flushing);
                true
            } else {
                false
            }
        };
        if !accepted {
            self.emit_error(Status::Unknown);
            return;
        }
        self.post(CodecCommand::Flush);
    }

    fn signal_resume(&self) {
        let accepted = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Flushed {
                state.set(CodecState::Resuming);
                true
            } else {
                false
            }
        };
        if !accepted {
            self.emit_error(Status::Unknown);
            return;
        }
        self.channel.start(None, None);
        let resumed = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Resuming {
                state.set(CodecState::Running);
                true
            } else {
                false
            }
        };
        if !resumed {
            self.emit_error(Status::Unknown);
        }
    }

    /// Called by the component listener; items keep component-completion
    /// order and are drained one per dispatched `WorkDone` command.
    pub(crate) fn on_work_done(&self, items: Vec<WorkItem>) {
        {
            let mut queue = self.lock_work_done_queue();
            queue.extend(items);
        }
        self.post(CodecCommand::WorkDone);
    }

    /// Called by the watchdog on every tick.
    pub(crate) fn initiate_release_if_stuck(self: &Arc<Self>) {
        {
            let deadline = self.deadline.lock().expect("deadline mutex poisoned");
            if !deadline.is_elapsed(Instant::now()) {
                return;
            }
        }
        warn!("command deadline elapsed, forcing release");
        self.emit_error(Status::Unknown);
        self.initiate_release(true);
    }

    pub(crate) fn handle_command(self: &Arc<Self>, command: CodecCommand) {
        match command {
            CodecCommand::Allocate { component_name } => self.allocate(&component_name),
            CodecCommand::Configure { format } => self.configure(format),
            CodecCommand::Start => self.start(),
            CodecCommand::Stop => self.stop(),
            CodecCommand::Flush => self.flush(),
            CodecCommand::CreateInputSurface => self.create_input_surface(),
            CodecCommand::SetInputSurface { surface } => self.set_input_surface(surface),
            CodecCommand::WorkDone => self.work_done(),
        }
    }

    pub(crate) fn set_deadline(&self, at: Option<Instant>) {
        self.deadline.lock().expect("deadline mutex poisoned").set(at);
    }

    #[cfg(test)]
    pub(crate) fn deadline_snapshot(&self) -> Option<Instant> {
        self.deadline.lock().expect("deadline mutex poisoned").get()
    }

    pub(crate) fn current_state(&self) -> CodecState {
        self.lock_state().get()
    }

    pub(crate) fn post(&self, command: CodecCommand) {
        // A send can only fail once the dispatcher is gone, i.e. during
        // teardown; the command is moot by then.
        let _ = self.command_tx.send(command);
    }

    pub(crate) fn emit(&self, event: CodecEvent) {
        (self.callback)(event);
    }

    pub(crate) fn emit_error(&self, status: Status) {
        self.emit(CodecEvent::Error {
            status,
            action: ActionCode::Fatal,
        });
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("state mutex poisoned")
    }

    pub(crate) fn lock_formats(&self) -> MutexGuard<'_, FormatPair> {
        self.formats.lock().expect("formats mutex poisoned")
    }

    pub(crate) fn lock_work_done_queue(&self) -> MutexGuard<'_, VecDeque<WorkItem>> {
        self.work_done_queue
            .lock()
            .expect("work-done queue mutex poisoned")
    }
}

#[cfg(test)]
#[path = "../tests/controller/mod.rs"]
mod tests;

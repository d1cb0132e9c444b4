//! Blocking command workers, run one at a time on the dispatcher thread.
//!
//! Workers re-check the lifecycle state after every blocking step: a release
//! may have been forced in the meantime (watchdog, or a client release racing
//! an allocation), in which case the worker's post-conditions observe the
//! altered state and bail out instead of installing stale results.

use std::sync::Arc;

use tracing::warn;

use cadence_codec_core::channel::{GraphicBufferSource, Surface};
use cadence_codec_core::component::{Component, ComponentListener};
use cadence_codec_core::format::MediaFormat;
use cadence_codec_core::status::Status;
use cadence_codec_core::work::FlushMode;

use super::ControllerInner;
use super::state::CodecState;
use crate::dispatcher::CodecCommand;
use crate::events::CodecEvent;
use crate::listener::CodecListener;

impl ControllerInner {
    pub(crate) fn allocate(self: &Arc<Self>, component_name: &str) {
        let listener: Arc<dyn ComponentListener> =
            Arc::new(CodecListener::new(Arc::downgrade(self)));
        let component = match self.store.create(component_name) {
            Ok(component) => component,
            Err(error) => {
                warn!(component = component_name, message = %error, "component creation failed");
                self.lock_state().set(CodecState::Released);
                self.emit_error(Status::Unknown);
                return;
            },
        };
        let _ = component.set_listener(listener, true);
        let installed = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Allocating {
                state.set(CodecState::Allocated);
                state.component = Some(Arc::clone(&component));
                true
            } else {
                // A release intervened; drop the freshly created component.
                state.set(CodecState::Released);
                false
            }
        };
        if !installed {
            self.emit_error(Status::Unknown);
            return;
        }
        self.channel.set_component(Arc::clone(&component));
        self.emit(CodecEvent::ComponentAllocated {
            name: component.name(),
        });
    }

    pub(crate) fn configure(&self, format: MediaFormat) {
        let (input_format, output_format) = match self.build_formats(&format) {
            Ok(pair) => pair,
            Err(status) => {
                self.emit_error(status);
                return;
            },
        };
        {
            let mut formats = self.lock_formats();
            formats.input = input_format.clone();
            formats.output = output_format.clone();
        }
        self.emit(CodecEvent::ComponentConfigured {
            input_format,
            output_format,
        });
    }

    /// Derives the input/output format pair from a configure request.
    ///
    /// The raw side of the pair mirrors the supplied mime's kind: a decoder
    /// produces `<kind>/raw` output, an encoder consumes `<kind>/raw` input.
    fn build_formats(&self, format: &MediaFormat) -> Result<(MediaFormat, MediaFormat), Status> {
        let Some(mime) = format.find_str("mime") else {
            return Err(Status::BadValue);
        };
        let encoder = format.find_i32("encoder").unwrap_or(0) != 0;
        if let Some(surface) = format.find_surface("native-window")
            && let Err(error) = self.channel.set_surface(surface.clone())
        {
            warn!(message = %error, "failed to route configured surface");
        }

        let audio = mime
            .get(.."audio/".len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("audio/"));
        let kind = if audio { "audio" } else { "video" };
        let mut input = MediaFormat::new();
        let mut output = MediaFormat::new();
        if encoder {
            output.set_str("mime", mime);
            input.set_str("mime", format!("{kind}/raw"));
            if audio {
                input.set_i32("channel-count", 1);
                input.set_i32("sample-rate", 44100);
                output.set_i32("channel-count", 1);
                output.set_i32("sample-rate", 44100);
            } else {
                output.set_i32("width", 1080);
                output.set_i32("height", 1920);
            }
        } else {
            input.set_str("mime", mime);
            output.set_str("mime", format!("{kind}/raw"));
            if audio {
                output.set_i32("channel-count", 2);
                output.set_i32("sample-rate", 44100);
            }
        }
        Ok((input, output))
    }

    pub(crate) fn start(&self) {
        let component = {
            let state = self.lock_state();
            if state.get() == CodecState::Starting {
                state.component.clone()
            } else {
                None
            }
        };
        let Some(component) = component else {
            self.emit_error(Status::Unknown);
            return;
        };
        if let Err(error) = component.start() {
            warn!(message = %error, "component start failed");
            self.emit_error(Status::Unknown);
            return;
        }
        let (input_format, output_format) = {
            let formats = self.lock_formats();
            (formats.input.clone(), formats.output.clone())
        };
        self.channel.start(Some(input_format), Some(output_format));
        let running = {
            let mut state = self.lock_state();
            if state.get() == CodecState::Starting {
                state.set(CodecState::Running);
                true
            } else {
                false
            }
        };
        if !running {
            self.emit_error(Status::Unknown);
            return;
        }
        self.emit(CodecEvent::StartCompleted);
    }

    pub(crate) fn stop(&self) {
        enum Gate {
            Proceed(Arc<dyn Component>),
            ReleaseInProgress,
            WrongState,
        }

        let gate = {
            let state = self.lock_state();
            match (state.get(), state.component.clone()) {
                (CodecState::Releasing, _) => Gate::ReleaseInProgress,
                (CodecState::Stopping, Some(component)) => Gate::Proceed(component),
                _ => Gate::WrongState,
            }
        };
        let component = match gate {
            Gate::Proceed(component) => component,
            Gate::ReleaseInProgress => {
                // A release is already tearing everything down.
                self.emit(CodecEvent::StopCompleted);
                return;
            },
            Gate::WrongState => {
                self.emit_error(Status::Unknown);
                return;
            },
        };
        self.channel.stop();
        if let Err(error) = component.stop() {
            warn!(message = %error, "component stop failed");
            self.emit_error(Status::Unknown);
        }
        {
            let mut state = self.lock_state();
            if state.get() == CodecState::Stopping {
                state.set(CodecState::Allocated);
            }
        }
        self.emit(CodecEvent::StopCompleted);
    }

    pub(crate) fn flush(&self) {
        let component = {
            let state = self.lock_state();
            if state.get() == CodecState::Flushing {
                state.component.clone()
            } else {
                None
            }
        };
        let Some(component) = component else {
            self.emit_error(Status::Unknown);
            return;
        };
        self.channel.stop();
        let flushed_work = match component.flush(FlushMode::Component) {
            Ok(work) => work,
            Err(error) => {
                warn!(message = %error, "component flush failed");
                self.emit_error(Status::Unknown);
                Vec::new()
            },
        };
        self.channel.flush(flushed_work);
        self.lock_state().set(CodecState::Flushed);
        self.emit(CodecEvent::FlushCompleted);
    }

    /// Runs on a transient thread spawned by `initiate_release`.
    pub(crate) fn release(&self, send_callback: bool) {
        let component = {
            let state = self.lock_state();
            if state.get() == CodecState::Released {
                if send_callback {
                    drop(state);
                    self.emit(CodecEvent::ReleaseCompleted);
                }
                return;
            }
            state.component.clone()
        };
        self.channel.stop();
        if let Some(component) = component {
            let _ = component.release();
        }
        {
            let mut state = self.lock_state();
            state.set(CodecState::Released);
            state.component = None;
        }
        if send_callback {
            self.emit(CodecEvent::ReleaseCompleted);
        }
    }

    pub(crate) fn create_input_surface(&self) {
        let source = Arc::new(GraphicBufferSource::new());
        if let Err(status) = source.init_check() {
            warn!(message = %status, "graphic buffer source failed its init check");
            self.emit(CodecEvent::InputSurfaceCreationFailed { status });
            return;
        }
        let producer = source.producer();
        if let Err(status) = self.channel.set_graphic_buffer_source(source) {
            warn!(message = %status, "failed to install graphic buffer source");
            self.emit(CodecEvent::InputSurfaceCreationFailed { status });
            return;
        }
        let (input_format, output_format) = {
            let formats = self.lock_formats();
            (formats.input.clone(), formats.output.clone())
        };
        self.emit(CodecEvent::InputSurfaceCreated {
            input_format,
            output_format,
            producer,
        });
    }

    pub(crate) fn set_input_surface(&self, _surface: Surface) {
        // Persistent input surfaces are not supported.
        self.emit(CodecEvent::InputSurfaceDeclined {
            status: Status::Unsupported,
        });
    }

    pub(crate) fn work_done(&self) {
        let work = {
            let mut queue = self.lock_work_done_queue();
            let Some(work) = queue.pop_front() else {
                return;
            };
            if !queue.is_empty() {
                // One item per dispatch keeps draining fair against
                // concurrently arriving commands.
                self.post(CodecCommand::WorkDone);
            }
            work
        };
        self.channel.on_work_done(work);
    }
}

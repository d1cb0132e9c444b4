//! Single-threaded command delivery for the codec controller.
//!
//! Commands are executed strictly in arrival order on one dedicated thread.
//! On entry to each command the controller deadline is stamped from the
//! per-command budget; on exit it is cleared, so the watchdog only ever sees
//! a finite deadline while a command is actually running.

use std::sync::Weak;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use cadence_codec_core::channel::Surface;
use cadence_codec_core::format::MediaFormat;

use crate::config::CodecConfig;
use crate::controller::ControllerInner;

/// Command envelope delivered to the controller worker thread.
pub(crate) enum CodecCommand {
    Allocate { component_name: String },
    Configure { format: MediaFormat },
    Start,
    Stop,
    Flush,
    CreateInputSurface,
    SetInputSurface { surface: Surface },
    WorkDone,
}

/// Spawns the dispatcher thread for a controller.
///
/// The thread holds only a weak reference so it cannot keep the controller
/// alive; it exits once the controller (and with it every command sender) is
/// gone.
pub(crate) fn spawn(
    codec: Weak<ControllerInner>,
    config: CodecConfig,
    commands: Receiver<CodecCommand>,
) {
    thread::Builder::new()
        .name("cadence-codec-dispatch".to_string())
        .spawn(move || dispatch_loop(codec, config, commands))
        .expect("failed to spawn codec dispatcher");
}

fn dispatch_loop(
    codec: Weak<ControllerInner>,
    config: CodecConfig,
    commands: Receiver<CodecCommand>,
) {
    while let Ok(command) = commands.recv() {
        let Some(codec) = codec.upgrade() else {
            break;
        };
        let deadline = command_budget(&command, &config).map(|budget| Instant::now() + budget);
        codec.set_deadline(deadline);
        codec.handle_command(command);
        codec.set_deadline(None);
    }
}

fn command_budget(command: &CodecCommand, config: &CodecConfig) -> Option<Duration> {
    match command {
        CodecCommand::Allocate { .. } => Some(config.allocate_deadline),
        CodecCommand::Configure { .. } => Some(config.configure_deadline),
        CodecCommand::Start => Some(config.start_deadline),
        CodecCommand::Stop => Some(config.stop_deadline),
        CodecCommand::Flush => Some(config.flush_deadline),
        CodecCommand::CreateInputSurface | CodecCommand::SetInputSurface { .. } => {
            Some(config.input_surface_deadline)
        },
        // Draining completed work is unbounded.
        CodecCommand::WorkDone => None,
    }
}

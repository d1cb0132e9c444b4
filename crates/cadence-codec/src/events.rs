use std::sync::Arc;

use cadence_codec_core::channel::BufferProducer;
use cadence_codec_core::format::MediaFormat;
use cadence_codec_core::status::{ActionCode, Status};

/// Event payload delivered to the client callback sink.
///
/// Every `initiate_*` command that is accepted eventually produces exactly
/// one terminal event here, unless a release supersedes it.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecEvent {
    /// A component was created and installed.
    ComponentAllocated {
        /// Name reported by the component itself.
        name: String,
    },
    /// Configuration was applied and the format pair derived.
    ComponentConfigured {
        input_format: MediaFormat,
        output_format: MediaFormat,
    },
    /// An input surface was created and wired into the buffer channel.
    InputSurfaceCreated {
        input_format: MediaFormat,
        output_format: MediaFormat,
        /// Producer endpoint for the client to feed.
        producer: BufferProducer,
    },
    /// Input surface creation or installation failed.
    InputSurfaceCreationFailed { status: Status },
    /// A persistent input surface was offered but is not supported.
    InputSurfaceDeclined { status: Status },
    /// The codec reached the running state.
    StartCompleted,
    /// The codec stopped (or was already stopped).
    StopCompleted,
    /// The codec released its component (or was already released).
    ReleaseCompleted,
    /// In-flight work was flushed.
    FlushCompleted,
    /// A command failed; the state machine did not move.
    Error { status: Status, action: ActionCode },
}

/// Client callback sink.
///
/// Invoked from controller-internal threads with no controller lock held;
/// callbacks may re-enter the controller.
pub type CodecEventCallback = Arc<dyn Fn(CodecEvent) + Send + Sync>;

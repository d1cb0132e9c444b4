use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::component::Component;
use crate::format::MediaFormat;
use crate::status::Status;
use crate::work::WorkItem;

/// Opaque handle to a client-supplied rendering surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    token: u64,
}

impl Surface {
    pub fn new(token: u64) -> Self {
        Self { token }
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Opaque producer endpoint handed back from input surface creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferProducer {
    token: u64,
}

impl BufferProducer {
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Producer-side graphics buffer queue backing an input surface.
///
/// The actual buffer plumbing lives in the data plane; the control plane only
/// creates the source, checks it, and hands its producer endpoint around.
#[derive(Debug)]
pub struct GraphicBufferSource {
    producer: BufferProducer,
}

impl GraphicBufferSource {
    pub fn new() -> Self {
        static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
        Self {
            producer: BufferProducer {
                token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            },
        }
    }

    pub fn init_check(&self) -> Result<(), Status> {
        Ok(())
    }

    pub fn producer(&self) -> BufferProducer {
        self.producer.clone()
    }
}

impl Default for GraphicBufferSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Data-plane adapter carrying buffers between the client and the component.
pub trait BufferChannel: Send + Sync {
    fn set_component(&self, component: Arc<dyn Component>);

    fn set_surface(&self, surface: Surface) -> Result<(), Status>;

    fn set_graphic_buffer_source(&self, source: Arc<GraphicBufferSource>) -> Result<(), Status>;

    /// Starts buffer circulation. Formats are absent when resuming after a
    /// flush.
    fn start(&self, input_format: Option<MediaFormat>, output_format: Option<MediaFormat>);

    fn stop(&self);

    /// Returns work the component could not finish back into circulation.
    fn flush(&self, flushed_work: Vec<WorkItem>);

    /// One completed work item, handed over in component-completion order.
    fn on_work_done(&self, work: WorkItem);
}

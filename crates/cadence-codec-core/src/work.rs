/// A unit of codec work travelling between the client and the component.
///
/// The control plane treats the payload as opaque cargo; only delivery order
/// matters to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub frame_index: u64,
    pub payload: Vec<u8>,
}

impl WorkItem {
    pub fn new(frame_index: u64, payload: Vec<u8>) -> Self {
        Self {
            frame_index,
            payload,
        }
    }
}

/// Scope of a component flush request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    Component,
}

/// Outcome of a rejected component setting, delivered through `on_tripped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingResult {
    pub field: String,
}

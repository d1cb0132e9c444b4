use std::sync::Weak;

use cadence_codec_core::component::ComponentListener;
use cadence_codec_core::work::{SettingResult, WorkItem};

use crate::controller::ControllerInner;

/// Forwards component notifications back into the controller.
///
/// Holds a weak reference so tail notifications from a still-draining
/// component cannot keep a released controller alive; notifications arriving
/// after the controller is gone are dropped.
pub(crate) struct CodecListener {
    codec: Weak<ControllerInner>,
}

impl CodecListener {
    pub(crate) fn new(codec: Weak<ControllerInner>) -> Self {
        Self { codec }
    }
}

impl ComponentListener for CodecListener {
    fn on_work_done(&self, items: Vec<WorkItem>) {
        let Some(codec) = self.codec.upgrade() else {
            return;
        };
        codec.on_work_done(items);
    }

    fn on_tripped(&self, _results: Vec<SettingResult>) {
        // Extension point: setting trips are not surfaced to the client yet.
    }

    fn on_error(&self, _error_code: u32) {
        // Extension point: component-reported errors are not surfaced yet.
    }
}

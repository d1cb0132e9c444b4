use std::sync::Arc;

use crate::status::ComponentError;
use crate::work::{FlushMode, SettingResult, WorkItem};

/// Asynchronous sink for component notifications.
///
/// The component may deliver notifications from any of its own threads;
/// implementations must not assume which one.
pub trait ComponentListener: Send + Sync {
    /// Completed work items, in the order the component finished them.
    fn on_work_done(&self, items: Vec<WorkItem>);

    /// Setting changes the component could not apply.
    fn on_tripped(&self, results: Vec<SettingResult>);

    /// A component-internal error code.
    fn on_error(&self, error_code: u32);
}

/// Contract assumed of an underlying codec engine.
pub trait Component: Send + Sync {
    fn name(&self) -> String;

    fn set_listener(
        &self,
        listener: Arc<dyn ComponentListener>,
        may_block: bool,
    ) -> Result<(), ComponentError>;

    fn start(&self) -> Result<(), ComponentError>;

    fn stop(&self) -> Result<(), ComponentError>;

    /// Flushes in-flight work, returning the items the component could not
    /// finish.
    fn flush(&self, mode: FlushMode) -> Result<Vec<WorkItem>, ComponentError>;

    fn release(&self) -> Result<(), ComponentError>;
}

/// Registry used to create components by name.
pub trait ComponentStore: Send + Sync {
    fn create(&self, name: &str) -> Result<Arc<dyn Component>, ComponentError>;
}

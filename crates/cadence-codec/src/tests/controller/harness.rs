use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cadence_codec_core::channel::{BufferChannel, GraphicBufferSource, Surface};
use cadence_codec_core::component::{Component, ComponentListener, ComponentStore};
use cadence_codec_core::format::MediaFormat;
use cadence_codec_core::status::{ComponentError, Status};
use cadence_codec_core::work::{FlushMode, WorkItem};

use crate::config::CodecConfig;
use crate::controller::CodecController;
use crate::events::{CodecEvent, CodecEventCallback};
use crate::watchdog::Watchdog;

pub(super) const WAIT_BUDGET: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum StartBehavior {
    Succeed,
    Fail,
    /// Blocks inside `start()` until the component is released, then fails.
    BlockUntilReleased,
}

pub(super) struct TestComponent {
    name: String,
    start_behavior: StartBehavior,
    stop_error: bool,
    flush_error: bool,
    flush_work: Vec<WorkItem>,
    listener: Mutex<Option<Arc<dyn ComponentListener>>>,
    released: AtomicBool,
}

impl TestComponent {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start_behavior: StartBehavior::Succeed,
            stop_error: false,
            flush_error: false,
            flush_work: Vec::new(),
            listener: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    pub(super) fn start_behavior(mut self, behavior: StartBehavior) -> Self {
        self.start_behavior = behavior;
        self
    }

    pub(super) fn stop_error(mut self) -> Self {
        self.stop_error = true;
        self
    }

    pub(super) fn flush_error(mut self) -> Self {
        self.flush_error = true;
        self
    }

    pub(super) fn flush_work(mut self, work: Vec<WorkItem>) -> Self {
        self.flush_work = work;
        self
    }

    pub(super) fn listener(&self) -> Arc<dyn ComponentListener> {
        self.listener
            .lock()
            .expect("listener mutex poisoned")
            .clone()
            .expect("listener not installed")
    }

    pub(super) fn was_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Component for TestComponent {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn set_listener(
        &self,
        listener: Arc<dyn ComponentListener>,
        _may_block: bool,
    ) -> Result<(), ComponentError> {
        *self.listener.lock().expect("listener mutex poisoned") = Some(listener);
        Ok(())
    }

    fn start(&self) -> Result<(), ComponentError> {
        match self.start_behavior {
            StartBehavior::Succeed => Ok(()),
            StartBehavior::Fail => Err(ComponentError::Refused),
            StartBehavior::BlockUntilReleased => {
                while !self.released.load(Ordering::Acquire) {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(ComponentError::BadState)
            },
        }
    }

    fn stop(&self) -> Result<(), ComponentError> {
        if self.stop_error {
            Err(ComponentError::Refused)
        } else {
            Ok(())
        }
    }

    fn flush(&self, _mode: FlushMode) -> Result<Vec<WorkItem>, ComponentError> {
        if self.flush_error {
            Err(ComponentError::Refused)
        } else {
            Ok(self.flush_work.clone())
        }
    }

    fn release(&self) -> Result<(), ComponentError> {
        self.released.store(true, Ordering::Release);
        Ok(())
    }
}

pub(super) struct TestStore {
    component: Arc<TestComponent>,
    create_delay: Duration,
    fail_create: bool,
}

impl TestStore {
    pub(super) fn new(component: Arc<TestComponent>) -> Self {
        Self {
            component,
            create_delay: Duration::ZERO,
            fail_create: false,
        }
    }

    pub(super) fn create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub(super) fn fail_create(mut self) -> Self {
        self.fail_create = true;
        self
    }
}

impl ComponentStore for TestStore {
    fn create(&self, name: &str) -> Result<Arc<dyn Component>, ComponentError> {
        if self.fail_create {
            return Err(ComponentError::NotFound {
                name: name.to_string(),
            });
        }
        if !self.create_delay.is_zero() {
            thread::sleep(self.create_delay);
        }
        Ok(Arc::clone(&self.component) as Arc<dyn Component>)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ChannelOp {
    SetComponent { name: String },
    SetSurface { token: u64 },
    SetGraphicBufferSource,
    Start { with_formats: bool },
    Stop,
    Flush { frame_indices: Vec<u64> },
    WorkDone { frame_index: u64 },
}

#[derive(Default)]
pub(super) struct RecordingChannel {
    ops: Mutex<Vec<ChannelOp>>,
    reject_surface: bool,
    reject_graphic_buffer_source: bool,
}

impl RecordingChannel {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn reject_surface(mut self) -> Self {
        self.reject_surface = true;
        self
    }

    pub(super) fn reject_graphic_buffer_source(mut self) -> Self {
        self.reject_graphic_buffer_source = true;
        self
    }

    pub(super) fn ops(&self) -> Vec<ChannelOp> {
        self.ops.lock().expect("ops mutex poisoned").clone()
    }

    fn record(&self, op: ChannelOp) {
        self.ops.lock().expect("ops mutex poisoned").push(op);
    }
}

impl BufferChannel for RecordingChannel {
    fn set_component(&self, component: Arc<dyn Component>) {
        self.record(ChannelOp::SetComponent {
            name: component.name(),
        });
    }

    fn set_surface(&self, surface: Surface) -> Result<(), Status> {
        if self.reject_surface {
            return Err(Status::BadValue);
        }
        self.record(ChannelOp::SetSurface {
            token: surface.token(),
        });
        Ok(())
    }

    fn set_graphic_buffer_source(&self, _source: Arc<GraphicBufferSource>) -> Result<(), Status> {
        if self.reject_graphic_buffer_source {
            return Err(Status::Unknown);
        }
        self.record(ChannelOp::SetGraphicBufferSource);
        Ok(())
    }

    fn start(&self, input_format: Option<MediaFormat>, output_format: Option<MediaFormat>) {
        self.record(ChannelOp::Start {
            with_formats: input_format.is_some() && output_format.is_some(),
        });
    }

    fn stop(&self) {
        self.record(ChannelOp::Stop);
    }

    fn flush(&self, flushed_work: Vec<WorkItem>) {
        self.record(ChannelOp::Flush {
            frame_indices: flushed_work.iter().map(|work| work.frame_index).collect(),
        });
    }

    fn on_work_done(&self, work: WorkItem) {
        self.record(ChannelOp::WorkDone {
            frame_index: work.frame_index,
        });
    }
}

pub(super) fn event_recorder() -> (CodecEventCallback, Arc<Mutex<Vec<CodecEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_for_callback = Arc::clone(&events);
    let callback: CodecEventCallback = Arc::new(move |event| {
        events_for_callback
            .lock()
            .expect("events mutex poisoned")
            .push(event);
    });
    (callback, events)
}

pub(super) struct TestBench {
    pub(super) controller: CodecController,
    pub(super) events: Arc<Mutex<Vec<CodecEvent>>>,
    pub(super) channel: Arc<RecordingChannel>,
    pub(super) component: Arc<TestComponent>,
    _watchdog: Watchdog,
}

pub(super) fn bench(component: Arc<TestComponent>) -> TestBench {
    bench_with(
        Arc::clone(&component),
        TestStore::new(component),
        RecordingChannel::new(),
        CodecConfig::default(),
        Duration::from_secs(60),
    )
}

pub(super) fn bench_with(
    component: Arc<TestComponent>,
    store: TestStore,
    channel: RecordingChannel,
    config: CodecConfig,
    watch_interval: Duration,
) -> TestBench {
    let (callback, events) = event_recorder();
    let channel = Arc::new(channel);
    let watchdog = Watchdog::with_interval(watch_interval);
    let controller = CodecController::with_watchdog(
        Arc::new(store),
        Arc::clone(&channel) as Arc<dyn BufferChannel>,
        callback,
        config,
        &watchdog,
    );
    TestBench {
        controller,
        events,
        channel,
        component,
        _watchdog: watchdog,
    }
}

impl TestBench {
    pub(super) fn recorded(&self) -> Vec<CodecEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    pub(super) fn wait_for_event(&self, pred: impl Fn(&CodecEvent) -> bool) {
        let deadline = Instant::now() + WAIT_BUDGET;
        loop {
            if self.recorded().iter().any(&pred) {
                return;
            }
            if Instant::now() >= deadline {
                panic!("event not observed in time; saw {:?}", self.recorded());
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    pub(super) fn allocate(&self) {
        self.controller
            .initiate_allocate_component(self.component.name());
        self.wait_for_event(|event| matches!(event, CodecEvent::ComponentAllocated { .. }));
    }

    pub(super) fn configure(&self, format: MediaFormat) {
        self.controller.initiate_configure_component(format);
        self.wait_for_event(|event| matches!(event, CodecEvent::ComponentConfigured { .. }));
    }

    pub(super) fn start(&self) {
        self.controller.initiate_start();
        self.wait_for_event(|event| matches!(event, CodecEvent::StartCompleted));
    }
}

pub(super) fn wait_until(cond: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT_BUDGET;
    while !cond() {
        if Instant::now() >= deadline {
            panic!("condition not met within {WAIT_BUDGET:?}");
        }
        thread::sleep(Duration::from_millis(5));
    }
}

pub(super) fn audio_decoder_format() -> MediaFormat {
    let mut format = MediaFormat::new();
    format.set_str("mime", "audio/mp4a-latm");
    format
}

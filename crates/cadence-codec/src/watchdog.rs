//! Process-wide liveness monitor for codec controllers.

use std::sync::{OnceLock, Weak};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select};

use crate::controller::ControllerInner;

const WATCH_INTERVAL: Duration = Duration::from_secs(3);

/// Polls every live controller and forces a release once a command deadline
/// has elapsed.
///
/// The registry holds weak references only, so a registered controller can
/// still be dropped; dead entries are purged on the tick that finds them.
pub(crate) struct Watchdog {
    register_tx: Sender<Weak<ControllerInner>>,
}

impl Watchdog {
    /// The process-wide instance, started on first use and never torn down.
    pub(crate) fn global() -> &'static Watchdog {
        static INSTANCE: OnceLock<Watchdog> = OnceLock::new();
        INSTANCE.get_or_init(|| Watchdog::with_interval(WATCH_INTERVAL))
    }

    /// Starts a dedicated watchdog with a custom polling cadence.
    ///
    /// The watch thread quiesces once this handle is dropped, which lets test
    /// harnesses run an isolated, fast-ticking instance.
    pub(crate) fn with_interval(interval: Duration) -> Self {
        let (register_tx, register_rx) = crossbeam_channel::unbounded();
        thread::Builder::new()
            .name("cadence-codec-watchdog".to_string())
            .spawn(move || watch_loop(interval, register_rx))
            .expect("failed to spawn codec watchdog");
        Self { register_tx }
    }

    /// Registers a controller without blocking on the watch loop.
    pub(crate) fn register(&self, codec: Weak<ControllerInner>) {
        let _ = self.register_tx.send(codec);
    }
}

fn watch_loop(interval: Duration, register_rx: Receiver<Weak<ControllerInner>>) {
    let tick = crossbeam_channel::tick(interval);
    let mut codecs: Vec<Weak<ControllerInner>> = Vec::new();
    loop {
        select! {
            recv(register_rx) -> msg => match msg {
                Ok(codec) => codecs.push(codec),
                Err(_) => break,
            },
            recv(tick) -> _ => {
                codecs.retain(|entry| match entry.upgrade() {
                    Some(codec) => {
                        codec.initiate_release_if_stuck();
                        true
                    },
                    None => false,
                });
            },
        }
    }
}

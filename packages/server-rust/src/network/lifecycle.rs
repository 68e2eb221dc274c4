//! Broker lifecycle: which phase the ingress is in and how many dispatches are
//! still running.
//!
//! The phase is swapped atomically and read by the health endpoints. The
//! in-flight count lives in a `watch` channel so draining wakes on the last
//! finished dispatch instead of polling.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use broker_core::TransportKind;
use tokio::sync::watch;

/// Ingress phase. Moves forward only: Starting, Serving, Draining, Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Backends are connected but the listener is not serving yet.
    Starting,
    /// Submissions are accepted.
    Serving,
    /// Shutdown was signalled; waiting for in-flight dispatches.
    Draining,
    /// Every dispatch finished before the drain deadline.
    Stopped,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Serving => "serving",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Shared lifecycle of one broker process.
#[derive(Debug)]
pub struct Lifecycle {
    phase: ArcSwap<Phase>,
    in_flight: Arc<watch::Sender<usize>>,
    log_transport: TransportKind,
}

impl Lifecycle {
    /// `log_transport` is the single route `log` actions were wired to.
    #[must_use]
    pub fn new(log_transport: TransportKind) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            phase: ArcSwap::from_pointee(Phase::Starting),
            in_flight: Arc::new(in_flight),
            log_transport,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        **self.phase.load()
    }

    #[must_use]
    pub fn log_transport(&self) -> TransportKind {
        self.log_transport
    }

    pub fn begin_serving(&self) {
        self.phase.store(Arc::new(Phase::Serving));
    }

    /// Counts one dispatch as in flight until the returned ticket is dropped.
    #[must_use]
    pub fn track_dispatch(&self) -> DispatchTicket {
        self.in_flight.send_modify(|n| *n += 1);
        DispatchTicket {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Enters `Draining` and waits up to `timeout` for the in-flight count to
    /// reach zero. On success the phase becomes `Stopped` and `true` is
    /// returned; otherwise the phase stays `Draining`.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.phase.store(Arc::new(Phase::Draining));

        let mut idle = self.in_flight.subscribe();
        let drained = matches!(
            tokio::time::timeout(timeout, idle.wait_for(|n| *n == 0)).await,
            Ok(Ok(_))
        );

        if drained {
            self.phase.store(Arc::new(Phase::Stopped));
        }
        drained
    }
}

/// Held by the submission handler for the length of one dispatch. Released on
/// drop, including on unwind.
#[derive(Debug)]
pub struct DispatchTicket {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Drop for DispatchTicket {
    fn drop(&mut self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

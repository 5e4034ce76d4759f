//! Poll scheduling for a surface.
//!
//! [`PollScheduler`] is a synchronous state machine deciding *whether* a
//! refresh should happen; [`PollTrigger`] decides *when* the next chance
//! comes. The surface driver owns one of each. Swapping the interval
//! trigger for a push-driven [`ChannelTrigger`] changes nothing else.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

/// Result of a state re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Activated,
    Deactivated,
}

/// What the driver should do with a trigger tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// Issue one refresh. The scheduler now counts it as in flight.
    Poll,
    /// A scheduled refresh is still in flight; drop this tick. Only reachable
    /// when ticks are delivered outside the loop that awaits the refresh.
    SkipInFlight,
    /// Nothing to poll for.
    Idle,
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    state: SchedulerState,
    enabled: bool,
    in_flight: bool,
    disposed: bool,
}

impl PollScheduler {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: SchedulerState::Idle,
            enabled,
            in_flight: false,
            disposed: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Re-evaluate against the current pending state.
    pub fn evaluate(&mut self, has_pending: bool) -> Transition {
        if self.disposed {
            return Transition::Unchanged;
        }
        match self.state {
            SchedulerState::Idle if has_pending && self.enabled && !self.in_flight => {
                self.state = SchedulerState::Active;
                Transition::Activated
            }
            SchedulerState::Active if !has_pending => {
                self.state = SchedulerState::Idle;
                Transition::Deactivated
            }
            _ => Transition::Unchanged,
        }
    }

    pub fn on_tick(&mut self) -> TickDecision {
        if self.disposed || self.state != SchedulerState::Active {
            return TickDecision::Idle;
        }
        if self.in_flight {
            return TickDecision::SkipInFlight;
        }
        self.in_flight = true;
        TickDecision::Poll
    }

    /// Mark the scheduled refresh as finished, whether it succeeded or not,
    /// and re-evaluate against the pending state as it is now.
    ///
    /// Records that became pending while the refresh was in flight could
    /// not activate the scheduler then; they do here. A failed refresh with
    /// pending records left keeps the state, so the next tick tries again.
    pub fn finish_poll(&mut self, has_pending: bool) -> Transition {
        self.in_flight = false;
        self.evaluate(has_pending)
    }

    /// Global auto-refresh switch. Turning it on re-evaluates immediately.
    pub fn set_enabled(&mut self, enabled: bool, has_pending: bool) -> Transition {
        self.enabled = enabled;
        if enabled {
            return self.evaluate(has_pending);
        }
        if self.state == SchedulerState::Active {
            self.state = SchedulerState::Idle;
            Transition::Deactivated
        } else {
            Transition::Unchanged
        }
    }

    /// Forced, permanent transition to idle when the owning surface goes away.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.state = SchedulerState::Idle;
    }
}

/// Source of "time to refresh" signals for an active scheduler.
#[async_trait]
pub trait PollTrigger: Send {
    /// Wait for the next refresh opportunity.
    async fn tick(&mut self);

    /// Called when the scheduler (re)enters the active state.
    fn reset(&mut self) {}
}

/// Fixed-period trigger. Ticks missed while a refresh runs are skipped
/// rather than bunched up.
#[derive(Debug)]
pub struct IntervalTrigger {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTrigger {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl PollTrigger for IntervalTrigger {
    async fn tick(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        interval.tick().await;
    }

    fn reset(&mut self) {
        // First tick comes one full period after activation
        self.interval = None;
    }
}

/// Event-driven trigger fed by a [`TriggerHandle`], for services that can
/// push "something changed" notifications instead of being polled.
#[derive(Debug)]
pub struct ChannelTrigger {
    rx: mpsc::Receiver<()>,
}

/// Sending side of a [`ChannelTrigger`].
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    tx: mpsc::Sender<()>,
}

impl ChannelTrigger {
    pub fn new() -> (Self, TriggerHandle) {
        // Capacity 1 coalesces bursts into a single pending refresh
        let (tx, rx) = mpsc::channel(1);
        (Self { rx }, TriggerHandle { tx })
    }
}

impl TriggerHandle {
    /// Request a refresh. Returns false if one is already queued or the
    /// trigger is gone.
    pub fn fire(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

#[async_trait]
impl PollTrigger for ChannelTrigger {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            // All handles dropped: no more refreshes will ever be requested
            std::future::pending::<()>().await;
        }
    }
}

//! Surface adapters.
//!
//! A surface is one independent presentation of gallery state (the list
//! view, a detail view). Each surface owns its reconciled view value, a
//! [`PollScheduler`], a driver task that refreshes from the Image Store
//! Service while something it tracks is pending, and two outputs for the
//! rendering layer: a `watch` channel carrying the latest view and an
//! event stream carrying completions and notices.
//!
//! Surfaces never talk to each other. Two surfaces showing the same record
//! converge because both reconcile against the same service.
//!
//! Disposal (explicit or on drop) cancels the driver's timer at once. A
//! refresh already in flight runs to completion, but its response is
//! discarded because the surface is no longer alive.

mod detail;
mod list;

pub use detail::DetailView;
pub use list::ListView;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collection::{PendingSet, RecordLookup};
use crate::config::GalleryConfig;
use crate::notice::Notice;
use crate::notifier::diff_completions;
use crate::record::ImageRecord;
use crate::scheduler::{
    IntervalTrigger, PollScheduler, PollTrigger, SchedulerState, TickDecision, Transition,
};
use crate::store::ImageStore;

/// A reconciled view a surface can hold.
pub trait SurfaceView: RecordLookup + Clone + Send + Sync + 'static {
    /// Name used in logs.
    const KIND: &'static str;

    /// Ids whose completion this surface waits for.
    fn pending(&self) -> PendingSet;

    /// Reconcile a full "list all" snapshot.
    fn apply_snapshot(&self, snapshot: Vec<ImageRecord>) -> Self;

    /// Reconcile one changed record.
    fn apply_record(&self, record: ImageRecord) -> Self;

    fn has_pending(&self) -> bool {
        !self.pending().is_empty()
    }
}

/// Something the rendering layer should react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// A record this surface was waiting for now has its description.
    Completed(ImageRecord),
    Notice(Notice),
}

/// Receiving end of a surface's events.
#[derive(Debug)]
pub struct SurfaceEvents {
    rx: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl SurfaceEvents {
    /// Next event, or `None` once the surface is gone and the queue drained.
    pub async fn next(&mut self) -> Option<SurfaceEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_next(&mut self) -> Option<SurfaceEvent> {
        self.rx.try_recv().ok()
    }
}

/// What a refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot merged; `completed` records finished processing.
    Applied { completed: usize },
    /// A fetch started later had already been applied; this one was dropped.
    Stale,
    /// The fetch failed; state is unchanged and a notice was emitted.
    Failed { message: String },
    /// The surface was disposed; nothing was applied.
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshKind {
    Scheduled,
    Manual,
}

struct Inner<V> {
    view: V,
    scheduler: PollScheduler,
    alive: bool,
    /// Sequence number handed to the next fetch
    next_seq: u64,
    /// Sequence number of the newest fetch whose snapshot was applied
    applied_seq: u64,
}

struct Shared<V> {
    inner: Mutex<Inner<V>>,
    store: Arc<dyn ImageStore>,
    state_tx: watch::Sender<V>,
    events_tx: mpsc::UnboundedSender<SurfaceEvent>,
    wake: Notify,
    cancel: CancellationToken,
}

/// One mounted surface. Disposed when dropped.
pub struct Surface<V: SurfaceView> {
    shared: Arc<Shared<V>>,
}

pub type ListSurface = Surface<ListView>;
pub type DetailSurface = Surface<DetailView>;

impl<V: SurfaceView> Surface<V> {
    /// Mount a surface around `view` and start its driver task.
    ///
    /// Must be called from within a tokio runtime. If `view` already has
    /// pending records and `auto_refresh` is on, polling starts right away.
    pub fn mount<T>(
        store: Arc<dyn ImageStore>,
        view: V,
        trigger: T,
        auto_refresh: bool,
    ) -> (Self, SurfaceEvents)
    where
        T: PollTrigger + 'static,
    {
        let (state_tx, _) = watch::channel(view.clone());
        let (events_tx, rx) = mpsc::unbounded_channel();
        let mut scheduler = PollScheduler::new(auto_refresh);
        scheduler.evaluate(view.has_pending());

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                view,
                scheduler,
                alive: true,
                next_seq: 0,
                applied_seq: 0,
            }),
            store,
            state_tx,
            events_tx,
            wake: Notify::new(),
            cancel: CancellationToken::new(),
        });

        tokio::spawn(drive(Arc::clone(&shared), trigger));
        info!(surface = V::KIND, auto_refresh, "Surface mounted");

        (Self { shared }, SurfaceEvents { rx })
    }

    /// Fetch a full snapshot now, outside the scheduled loop.
    ///
    /// Runs alongside any scheduled refresh and leaves the poll timer alone.
    pub async fn refresh(&self) -> RefreshOutcome {
        self.shared.refresh(RefreshKind::Manual).await
    }

    /// Merge one changed record (an upload response, for instance).
    pub fn upsert(&self, record: ImageRecord) {
        self.shared.apply(|view| view.apply_record(record));
    }

    /// Global auto-refresh switch for this surface.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut inner = self.shared.lock();
        let has_pending = inner.view.has_pending();
        let transition = inner.scheduler.set_enabled(enabled, has_pending);
        drop(inner);
        info!(surface = V::KIND, enabled, "Auto-refresh toggled");
        self.shared.on_transition(transition);
    }

    pub fn auto_refresh(&self) -> bool {
        self.shared.lock().scheduler.is_enabled()
    }

    /// Current reconciled view.
    pub fn snapshot(&self) -> V {
        self.shared.lock().view.clone()
    }

    /// Subscribe to view updates.
    pub fn watch(&self) -> watch::Receiver<V> {
        self.shared.state_tx.subscribe()
    }

    /// Whether anything this surface tracks is still processing.
    pub fn is_processing(&self) -> bool {
        self.shared.lock().view.has_pending()
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.shared.lock().scheduler.state()
    }

    pub fn is_alive(&self) -> bool {
        self.shared.lock().alive
    }

    pub(crate) fn store(&self) -> Arc<dyn ImageStore> {
        Arc::clone(&self.shared.store)
    }

    /// Queue a notice for the rendering layer.
    pub(crate) fn notify(&self, notice: Notice) {
        self.shared.emit(SurfaceEvent::Notice(notice));
    }

    /// Tear the surface down. Idempotent.
    pub fn dispose(&self) {
        let mut inner = self.shared.lock();
        if !inner.alive {
            return;
        }
        inner.alive = false;
        inner.scheduler.dispose();
        drop(inner);
        self.shared.cancel.cancel();
        info!(surface = V::KIND, "Surface disposed");
    }
}

impl Surface<ListView> {
    /// Mount a list surface and perform its initial load.
    ///
    /// A failed initial load is not fatal: the surface starts empty, the
    /// failure is reported as a notice, and the returned outcome says so.
    pub async fn open_list(
        store: Arc<dyn ImageStore>,
        config: &GalleryConfig,
    ) -> (Self, SurfaceEvents, RefreshOutcome) {
        let (surface, events) = Self::mount(
            store,
            ListView::default(),
            IntervalTrigger::new(config.list_poll_interval),
            config.auto_refresh,
        );
        let outcome = surface.refresh().await;
        (surface, events, outcome)
    }
}

impl Surface<DetailView> {
    /// Mount a detail surface focused on `record`. It polls only while that
    /// record is processing.
    pub fn open_detail(
        store: Arc<dyn ImageStore>,
        record: ImageRecord,
        config: &GalleryConfig,
    ) -> (Self, SurfaceEvents) {
        Self::mount(
            store,
            DetailView::new(record),
            IntervalTrigger::new(config.detail_poll_interval),
            config.auto_refresh,
        )
    }
}

impl<V: SurfaceView> Drop for Surface<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<V: SurfaceView> Shared<V> {
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn refresh(&self, kind: RefreshKind) -> RefreshOutcome {
        let seq = {
            let mut inner = self.lock();
            if !inner.alive {
                if kind == RefreshKind::Scheduled {
                    let has_pending = inner.view.has_pending();
                    inner.scheduler.finish_poll(has_pending);
                }
                return RefreshOutcome::Disposed;
            }
            inner.next_seq += 1;
            inner.next_seq
        };
        debug!(surface = V::KIND, ?kind, seq, "Refreshing from image store");

        let result = self.store.list_images().await;

        let mut inner = self.lock();
        // Records may have turned pending while this poll was out; they
        // could not activate the scheduler until it finished.
        if kind == RefreshKind::Scheduled {
            let has_pending = inner.view.has_pending();
            let transition = inner.scheduler.finish_poll(has_pending);
            self.on_transition(transition);
        }
        if !inner.alive {
            debug!(surface = V::KIND, seq, "Discarding response for disposed surface");
            return RefreshOutcome::Disposed;
        }

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                drop(inner);
                warn!(surface = V::KIND, error = %e, "Refresh failed, keeping previous state");
                let message = e.to_string();
                self.emit(SurfaceEvent::Notice(Notice::from_error(
                    "Failed to refresh images",
                    &e,
                )));
                return RefreshOutcome::Failed { message };
            }
        };

        if seq <= inner.applied_seq {
            debug!(
                surface = V::KIND,
                seq,
                applied_seq = inner.applied_seq,
                "Dropping out-of-order snapshot"
            );
            return RefreshOutcome::Stale;
        }
        inner.applied_seq = seq;

        let completed = self.commit(&mut inner, |view| view.apply_snapshot(snapshot));
        RefreshOutcome::Applied { completed }
    }

    fn apply<F>(&self, merge: F)
    where
        F: FnOnce(&V) -> V,
    {
        let mut inner = self.lock();
        if !inner.alive {
            debug!(surface = V::KIND, "Ignoring update for disposed surface");
            return;
        }
        self.commit(&mut inner, merge);
    }

    /// Merge, diff, publish and re-evaluate as one step under the lock.
    fn commit<F>(&self, inner: &mut MutexGuard<'_, Inner<V>>, merge: F) -> usize
    where
        F: FnOnce(&V) -> V,
    {
        let old_pending = inner.view.pending();
        let view = merge(&inner.view);
        let completed = diff_completions(&old_pending, &view);

        inner.view = view.clone();
        let transition = inner.scheduler.evaluate(view.has_pending());
        self.state_tx.send_replace(view);

        for record in &completed {
            info!(surface = V::KIND, id = %record.id, "Image processing completed");
            self.emit(SurfaceEvent::Completed(record.clone()));
        }
        self.on_transition(transition);
        completed.len()
    }

    fn on_transition(&self, transition: Transition) {
        match transition {
            Transition::Activated => {
                info!(surface = V::KIND, "Polling started");
                self.wake.notify_one();
            }
            Transition::Deactivated => info!(surface = V::KIND, "Polling stopped"),
            Transition::Unchanged => {}
        }
    }

    fn emit(&self, event: SurfaceEvent) {
        // Nobody listening is fine; events are advisory
        let _ = self.events_tx.send(event);
    }
}

/// Driver task: sleeps while idle, refreshes on each trigger tick while
/// active, exits on disposal.
async fn drive<V, T>(shared: Arc<Shared<V>>, mut trigger: T)
where
    V: SurfaceView,
    T: PollTrigger,
{
    trigger.reset();
    loop {
        let active = shared.lock().scheduler.state() == SchedulerState::Active;
        if !active {
            tokio::select! {
                _ = shared.cancel.cancelled() => break,
                _ = shared.wake.notified() => {
                    trigger.reset();
                    continue;
                }
            }
        }

        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            _ = trigger.tick() => {}
        }

        let decision = shared.lock().scheduler.on_tick();
        match decision {
            TickDecision::Poll => {
                shared.refresh(RefreshKind::Scheduled).await;
            }
            // The refresh above is awaited inline, so a tick never finds
            // this loop's own poll in flight
            TickDecision::SkipInFlight | TickDecision::Idle => {}
        }
    }
    debug!(surface = V::KIND, "Surface driver stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{pending, record};
    use crate::record::ImageId;
    use crate::store::MockImageStore;
    use std::time::Duration;

    fn config() -> GalleryConfig {
        GalleryConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_is_not_a_completion() {
        let store = Arc::new(MockImageStore::with_images(vec![record("1", 0, "a cat")]));
        let (surface, mut events, outcome) = ListSurface::open_list(store.clone(), &config()).await;

        assert_eq!(outcome, RefreshOutcome::Applied { completed: 0 });
        assert_eq!(surface.snapshot().len(), 1);
        assert_eq!(surface.scheduler_state(), SchedulerState::Idle);
        assert!(events.try_next().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_initial_load_reports_notice() {
        let store = Arc::new(MockImageStore::new());
        store.push_list_failure("connection refused");
        let (surface, mut events, outcome) = ListSurface::open_list(store, &config()).await;

        assert!(matches!(outcome, RefreshOutcome::Failed { .. }));
        assert!(surface.snapshot().is_empty());
        match events.try_next() {
            Some(SurfaceEvent::Notice(notice)) => {
                assert_eq!(notice.level, crate::notice::NoticeLevel::Error);
                assert!(notice.message.contains("connection refused"));
            }
            other => panic!("expected notice, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_upsert_activates_polling() {
        let store = Arc::new(MockImageStore::new());
        let (surface, _events, _) = ListSurface::open_list(store, &config()).await;

        surface.upsert(pending("7", 0));
        assert!(surface.is_processing());
        assert_eq!(surface.scheduler_state(), SchedulerState::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_publishes_merged_view() {
        let store = Arc::new(MockImageStore::new());
        let (surface, _events, _) = ListSurface::open_list(store, &config()).await;
        let mut rx = surface.watch();

        surface.upsert(record("1", 0, "a lamp"));
        rx.changed().await.unwrap();
        assert!(rx.borrow().get(&ImageId::new("1")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_auto_refresh_does_not_poll() {
        let store = Arc::new(MockImageStore::new());
        let mut cfg = config();
        cfg.auto_refresh = false;
        let (surface, _events, _) = ListSurface::open_list(store.clone(), &cfg).await;
        surface.upsert(pending("7", 0));
        assert_eq!(surface.scheduler_state(), SchedulerState::Idle);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.list_calls(), 1);

        surface.set_auto_refresh(true);
        assert_eq!(surface.scheduler_state(), SchedulerState::Active);
        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_is_idempotent_and_blocks_updates() {
        let store = Arc::new(MockImageStore::new());
        let (surface, _events, _) = ListSurface::open_list(store, &config()).await;
        surface.dispose();
        surface.dispose();
        assert!(!surface.is_alive());

        surface.upsert(pending("7", 0));
        assert!(surface.snapshot().is_empty());
        assert_eq!(surface.refresh().await, RefreshOutcome::Disposed);
    }
}

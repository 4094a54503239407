//! Per-project session registry.
//!
//! At most one live [`SessionOrchestrator`] exists per project id. Each id
//! gets its own async lock (a *slot*), so a slow restore for one project
//! never blocks another. Slots are created atomically through the map entry
//! API and pruned once they are empty and unreferenced.
//!
//! A single background task sweeps the registry and releases sessions that
//! have been idle longer than the inactivity timeout.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use artreal_core::ProjectId;
use artreal_settings::RegistrySettings;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::errors::RuntimeError;
use crate::orchestrator::factory::OrchestratorFactory;
use crate::orchestrator::session::SessionOrchestrator;

/// Sweep cadence and idle threshold.
#[derive(Clone, Copy, Debug)]
pub struct RegistryConfig {
    /// Time between sweeps.
    pub sweep_interval: Duration,
    /// Idle time after which a session is released.
    pub inactivity_timeout: Duration,
}

impl From<&RegistrySettings> for RegistryConfig {
    fn from(settings: &RegistrySettings) -> Self {
        Self {
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs),
            inactivity_timeout: Duration::from_secs(settings.inactivity_timeout_secs),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::from(&RegistrySettings::default())
    }
}

struct LiveSession {
    orchestrator: Arc<SessionOrchestrator>,
    last_access: Instant,
}

type Slot = Arc<Mutex<Option<LiveSession>>>;

/// Process-wide map from project id to live orchestrator.
pub struct SessionRegistry {
    factory: Arc<dyn OrchestratorFactory>,
    config: RegistryConfig,
    slots: DashMap<ProjectId, Slot>,
    sweeper: OnceLock<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl SessionRegistry {
    /// Empty registry. The sweeper starts with the first session.
    pub fn new(factory: Arc<dyn OrchestratorFactory>, config: RegistryConfig) -> Arc<Self> {
        Arc::new(Self {
            factory,
            config,
            slots: DashMap::new(),
            sweeper: OnceLock::new(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Atomic get-or-create of the slot for `id`.
    fn slot(&self, id: &ProjectId) -> Slot {
        Arc::clone(self.slots.entry(id.clone()).or_default().value())
    }

    /// Drop the slot for `id` if it is empty and nobody else holds it.
    fn prune(&self, id: &ProjectId) {
        let _ = self.slots.remove_if(id, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|guard| guard.is_none())
        });
    }

    /// The live orchestrator for `id`, creating and restoring one on first
    /// use. Concurrent callers for the same id get the same instance.
    #[instrument(skip_all, fields(project_id = %id))]
    pub async fn acquire(
        self: &Arc<Self>,
        id: &ProjectId,
    ) -> Result<Arc<SessionOrchestrator>, RuntimeError> {
        if self.shutdown.is_cancelled() {
            return Err(RuntimeError::ShuttingDown);
        }

        let slot = self.slot(id);
        let mut guard = slot.lock().await;
        if let Some(live) = guard.as_mut() {
            live.last_access = Instant::now();
            debug!("reusing live session");
            return Ok(Arc::clone(&live.orchestrator));
        }

        let orchestrator = match self.factory.create(id).await {
            Ok(o) => Arc::new(o),
            Err(e) => {
                drop(guard);
                drop(slot);
                self.prune(id);
                return Err(e);
            }
        };
        let restored = orchestrator.restore(id).await;
        *guard = Some(LiveSession {
            orchestrator: Arc::clone(&orchestrator),
            last_access: Instant::now(),
        });
        drop(guard);
        info!(restored, "session started");

        self.ensure_sweeper();
        Ok(orchestrator)
    }

    /// Persist and close the session for `id`, if live. Releasing an id that
    /// is not live does nothing.
    #[instrument(skip_all, fields(project_id = %id))]
    pub async fn release(&self, id: &ProjectId) {
        let Some(slot) = self.slots.get(id).map(|entry| Arc::clone(entry.value())) else {
            return;
        };
        {
            let mut guard = slot.lock().await;
            if let Some(live) = guard.take() {
                live.orchestrator.persist(id).await;
                live.orchestrator.close().await;
                info!("session released");
            }
        }
        drop(slot);
        self.prune(id);
    }

    /// Release every session idle for longer than the inactivity timeout.
    /// Sessions that are mid-run or locked by another caller are skipped.
    /// Returns how many were released.
    pub async fn sweep_once(&self) -> usize {
        let now = Instant::now();
        let candidates: Vec<(ProjectId, Slot)> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut released = 0;
        for (id, slot) in candidates {
            {
                let Ok(mut guard) = slot.try_lock() else {
                    continue;
                };
                let stale = guard.as_ref().is_some_and(|live| {
                    !live.orchestrator.is_busy()
                        && now.duration_since(live.last_access) > self.config.inactivity_timeout
                });
                if !stale {
                    continue;
                }
                if let Some(live) = guard.take() {
                    live.orchestrator.persist(&id).await;
                    live.orchestrator.close().await;
                    released += 1;
                    info!(project_id = %id, "idle session released");
                }
            }
            drop(slot);
            self.prune(&id);
        }
        released
    }

    fn ensure_sweeper(self: &Arc<Self>) {
        let _ = self.sweeper.get_or_init(|| {
            debug!(interval_secs = self.config.sweep_interval.as_secs(), "starting session sweeper");
            tokio::spawn(sweep_loop(
                Arc::downgrade(self),
                self.config.sweep_interval,
                self.shutdown.clone(),
            ))
        });
    }

    /// Whether `id` has a live session.
    pub async fn is_live(&self, id: &ProjectId) -> bool {
        let Some(slot) = self.slots.get(id).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        slot.lock().await.is_some()
    }

    /// Number of slots currently tracked.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Stop the sweeper and release every live session.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let ids: Vec<ProjectId> = self.slots.iter().map(|entry| entry.key().clone()).collect();
        for id in &ids {
            self.release(id).await;
        }
        info!(released = ids.len(), "session registry shut down");
    }
}

/// Background sweep. Each pass runs in its own task so a panic inside one
/// pass is logged and the loop keeps going.
async fn sweep_loop(registry: Weak<SessionRegistry>, period: Duration, cancel: CancellationToken) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                match tokio::spawn(async move { registry.sweep_once().await }).await {
                    Ok(0) => {}
                    Ok(released) => debug!(released, "sweep pass finished"),
                    Err(e) => error!(error = %e, "sweep pass failed"),
                }
            }
            () = cancel.cancelled() => {
                debug!("session sweeper stopped");
                return;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use artreal_core::Turn;
    use artreal_tools::ToolRegistry;
    use async_trait::async_trait;

    use crate::orchestrator::session::OrchestratorConfig;
    use crate::orchestrator::state::{MemoryStateStore, SessionState, StateError, StateStore};
    use crate::testing::ScriptedClient;

    struct CountingFactory {
        store: Arc<MemoryStateStore>,
        state: Arc<dyn StateStore>,
        created: AtomicUsize,
        clients: parking_lot::Mutex<Vec<Arc<ScriptedClient>>>,
    }

    impl CountingFactory {
        fn new() -> Arc<Self> {
            let store = Arc::new(MemoryStateStore::new());
            Self::over(store.clone(), store)
        }

        /// Sessions save through `state`; counters come from `store`.
        fn over(store: Arc<MemoryStateStore>, state: Arc<dyn StateStore>) -> Arc<Self> {
            Arc::new(Self {
                store,
                state,
                created: AtomicUsize::new(0),
                clients: parking_lot::Mutex::new(Vec::new()),
            })
        }
    }

    /// Panics when saving one particular project.
    struct FragileStore {
        inner: Arc<MemoryStateStore>,
        fragile: ProjectId,
    }

    #[async_trait]
    impl StateStore for FragileStore {
        async fn load(&self, id: &ProjectId) -> Result<Option<SessionState>, StateError> {
            self.inner.load(id).await
        }

        async fn save(&self, id: &ProjectId, state: &SessionState) -> Result<(), StateError> {
            if *id == self.fragile {
                panic!("state volume unavailable for project {id}");
            }
            self.inner.save(id, state).await
        }
    }

    #[async_trait]
    impl OrchestratorFactory for CountingFactory {
        async fn create(&self, id: &ProjectId) -> Result<SessionOrchestrator, RuntimeError> {
            let _ = self.created.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let client = Arc::new(ScriptedClient::new([]));
            self.clients.lock().push(Arc::clone(&client));
            Ok(SessionOrchestrator::new(
                id.clone(),
                "/tmp",
                client,
                ToolRegistry::new(),
                Arc::clone(&self.state),
                OrchestratorConfig::default(),
            ))
        }
    }

    fn registry(factory: &Arc<CountingFactory>, timeout_secs: u64) -> Arc<SessionRegistry> {
        SessionRegistry::new(
            factory.clone(),
            RegistryConfig {
                sweep_interval: Duration::from_secs(60),
                inactivity_timeout: Duration::from_secs(timeout_secs),
            },
        )
    }

    #[tokio::test]
    async fn acquire_twice_restores_once() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1200);
        let id = ProjectId::from("42");

        let a = registry.acquire(&id).await.unwrap();
        let b = registry.acquire(&id).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(factory.store.load_count(), 1);
    }

    #[tokio::test]
    async fn release_persists_closes_and_restores_fresh() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1200);
        let id = ProjectId::from("42");
        let seeded = SessionState {
            history: vec![Turn::user("build a page")],
            ..SessionState::default()
        };
        factory
            .store
            .insert_raw(&id, serde_json::to_string(&seeded).unwrap());

        let first = registry.acquire(&id).await.unwrap();
        assert_eq!(first.history().await.len(), 1);
        registry.release(&id).await;
        assert_eq!(factory.store.save_count(), 1);
        assert!(factory.clients.lock()[0].is_closed());
        assert!(!registry.is_live(&id).await);
        assert_eq!(registry.slot_count(), 0);

        let second = registry.acquire(&id).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.store.load_count(), 2);
        assert_eq!(second.history().await.len(), 1);
    }

    #[tokio::test]
    async fn release_unknown_id_is_noop() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1200);
        registry.release(&ProjectId::from("nope")).await;
        registry.release(&ProjectId::from("nope")).await;
        assert_eq!(factory.store.save_count(), 0);
        assert_eq!(registry.slot_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_acquires_share_one_instance() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1200);
        let id = ProjectId::from("42");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let id = id.clone();
                tokio::spawn(async move { registry.acquire(&id).await.unwrap() })
            })
            .collect();
        let sessions: Vec<Arc<SessionOrchestrator>> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(factory.store.load_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_releases_only_stale_sessions() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1);
        let stale = ProjectId::from("1");
        let fresh = ProjectId::from("2");

        let _ = registry.acquire(&stale).await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        let _ = registry.acquire(&fresh).await.unwrap();

        assert_eq!(registry.sweep_once().await, 1);
        assert!(!registry.is_live(&stale).await);
        assert!(registry.is_live(&fresh).await);
        assert_eq!(factory.store.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reacquire_refreshes_last_access() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 10);
        let id = ProjectId::from("1");

        let _ = registry.acquire(&id).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        let _ = registry.acquire(&id).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(registry.sweep_once().await, 0);
        assert!(registry.is_live(&id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_runs_on_interval() {
        let factory = CountingFactory::new();
        let registry = SessionRegistry::new(
            factory.clone(),
            RegistryConfig {
                sweep_interval: Duration::from_secs(5),
                inactivity_timeout: Duration::from_secs(3),
            },
        );
        let id = ProjectId::from("1");
        let _ = registry.acquire(&id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(!registry.is_live(&id).await);
        assert_eq!(factory.store.save_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_survives_a_panicking_pass() {
        let store = Arc::new(MemoryStateStore::new());
        let bad = ProjectId::from("bad");
        let factory = CountingFactory::over(
            store.clone(),
            Arc::new(FragileStore {
                inner: store.clone(),
                fragile: bad.clone(),
            }),
        );
        let registry = SessionRegistry::new(
            factory.clone(),
            RegistryConfig {
                sweep_interval: Duration::from_secs(5),
                inactivity_timeout: Duration::from_secs(3),
            },
        );

        let _ = registry.acquire(&bad).await.unwrap();
        // First pass (t=5) panics while persisting `bad`.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!registry.is_live(&bad).await);
        assert_eq!(store.save_count(), 0);

        let good = ProjectId::from("good");
        let _ = registry.acquire(&good).await.unwrap();
        // A later pass still runs and evicts the idle session.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!registry.is_live(&good).await);
        assert_eq!(store.save_count(), 1);
        assert!(store.raw(&good).is_some());
    }

    #[tokio::test]
    async fn shutdown_releases_everything_and_refuses_new_sessions() {
        let factory = CountingFactory::new();
        let registry = registry(&factory, 1200);
        let _ = registry.acquire(&ProjectId::from("1")).await.unwrap();
        let _ = registry.acquire(&ProjectId::from("2")).await.unwrap();

        registry.shutdown().await;
        assert_eq!(factory.store.save_count(), 2);
        assert!(factory.clients.lock().iter().all(|c| c.is_closed()));
        assert!(matches!(
            registry.acquire(&ProjectId::from("3")).await,
            Err(RuntimeError::ShuttingDown)
        ));
    }
}

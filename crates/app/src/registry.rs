//! Technology registry — catalog and runtime lifecycle of driver modules.
//!
//! The registry keeps one entry per installed technology family: the live
//! driver instance, its lifecycle state, and a bounded queue of triggers
//! received while the technology is not running. Lifecycle operations are
//! bounded by a timeout so a wedged driver can never hang a dispatch.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};

use domo_domain::error::{DomoError, NotFoundError, ValidationError};
use domo_domain::event::{Event, EventType};
use domo_domain::technology_type::{TechnologyType, TechnologyTypeFilter};
use domo_domain::trigger::Trigger;

use crate::ports::{Endpoint, Technology, TechnologyContext, TechnologyTypeRepository};

/// Lifecycle state of an installed technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnologyState {
    /// Installed, never started.
    Registered,
    /// Driver startup in progress.
    Starting,
    /// Accepting event dispatch.
    Running,
    /// Driver shutdown in progress.
    Stopping,
    /// Cleanly shut down; may be started again.
    Stopped,
    /// Unrecoverable driver error; may be started again after repair.
    Failed,
}

impl TechnologyState {
    /// Whether a technology in this state accepts event dispatch.
    #[must_use]
    pub fn accepts_dispatch(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Registered, Self::Starting)
                | (Self::Starting, Self::Running | Self::Failed)
                | (Self::Running, Self::Stopping | Self::Failed)
                | (Self::Stopping, Self::Stopped | Self::Failed)
                | (Self::Stopped | Self::Failed, Self::Starting)
        )
    }
}

impl fmt::Display for TechnologyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registered => "registered",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A live handle onto a running technology.
#[derive(Clone)]
pub struct TechnologyHandle {
    family: String,
    technology: Arc<dyn Technology>,
}

impl TechnologyHandle {
    /// Wrap a technology instance in a handle.
    #[must_use]
    pub fn new(family: impl Into<String>, technology: Arc<dyn Technology>) -> Self {
        Self {
            family: family.into(),
            technology,
        }
    }

    /// Family name this handle addresses.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Timeout preferred by the technology, when it declares one.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.technology.default_timeout()
    }

    /// Look up a named endpoint on the technology.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::UnknownEndpoint`] when the technology does not
    /// implement an endpoint with this name.
    pub fn endpoint(&self, name: &str) -> Result<Arc<dyn Endpoint>, DomoError> {
        self.technology
            .endpoint(name)
            .ok_or_else(|| DomoError::UnknownEndpoint {
                technology: self.family.clone(),
                endpoint: name.to_owned(),
            })
    }

    /// Write a value directly through the technology.
    ///
    /// # Errors
    ///
    /// Propagates the driver failure reported by the technology.
    pub async fn set(&self, address: &str, value: Value) -> Result<(), DomoError> {
        self.technology.set(address, value).await
    }
}

impl fmt::Debug for TechnologyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TechnologyHandle")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

/// Routing decision for a trigger aimed at a technology.
#[derive(Debug)]
pub enum Routed {
    /// The technology is running; run the handler with this handle.
    Ready {
        handle: TechnologyHandle,
        trigger: Trigger,
    },
    /// The technology is not running; the trigger was queued for redelivery
    /// after startup.
    Queued,
}

struct RegistryEntry {
    technology: Arc<dyn Technology>,
    state: TechnologyState,
    queue: VecDeque<Trigger>,
}

/// Process-scoped registry of installed technologies.
///
/// Cheaply cloneable; clones share the same entry table.
pub struct TechnologyRegistry<TR> {
    types: TR,
    entries: Arc<Mutex<HashMap<String, RegistryEntry>>>,
    context: Arc<dyn TechnologyContext>,
    queue_capacity: usize,
    lifecycle_timeout: Duration,
}

impl<TR: Clone> Clone for TechnologyRegistry<TR> {
    fn clone(&self) -> Self {
        Self {
            types: self.types.clone(),
            entries: Arc::clone(&self.entries),
            context: Arc::clone(&self.context),
            queue_capacity: self.queue_capacity,
            lifecycle_timeout: self.lifecycle_timeout,
        }
    }
}

impl<TR: TechnologyTypeRepository> TechnologyRegistry<TR> {
    /// Create a registry backed by the given catalog repository.
    ///
    /// `queue_capacity` bounds the per-technology trigger queue;
    /// `lifecycle_timeout` bounds every driver start/stop call.
    pub fn new(
        types: TR,
        context: Arc<dyn TechnologyContext>,
        queue_capacity: usize,
        lifecycle_timeout: Duration,
    ) -> Self {
        Self {
            types,
            entries: Arc::new(Mutex::new(HashMap::new())),
            context,
            queue_capacity,
            lifecycle_timeout,
        }
    }

    /// Record a technology module in the catalog.
    ///
    /// Idempotent per `kind`: registering an already-known kind returns the
    /// existing row instead of inserting a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when `kind` is empty, or a storage
    /// error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn register(
        &self,
        kind: &str,
        language: &str,
        path: &str,
    ) -> Result<TechnologyType, DomoError> {
        let existing = self
            .types
            .find(TechnologyTypeFilter {
                kind: Some(kind.to_owned()),
                ..TechnologyTypeFilter::default()
            })
            .await?;
        if let Some(found) = existing.into_iter().next() {
            return Ok(found);
        }
        let draft = TechnologyType::builder()
            .kind(kind)
            .language(language)
            .path(path)
            .build()?;
        let created = self.types.create(draft).await?;
        tracing::info!(kind, id = %created.id, "technology type registered");
        Ok(created)
    }

    /// Install a live technology instance in the `Registered` state.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] when its family is already
    /// installed.
    pub fn install(&self, technology: Arc<dyn Technology>) -> Result<(), DomoError> {
        let family = technology.family().to_owned();
        let mut entries = self.lock_entries();
        if entries.contains_key(&family) {
            return Err(ValidationError::DuplicateTechnology(family).into());
        }
        entries.insert(
            family,
            RegistryEntry {
                technology,
                state: TechnologyState::Registered,
                queue: VecDeque::new(),
            },
        );
        Ok(())
    }

    /// Whether a technology with this family is installed.
    #[must_use]
    pub fn contains(&self, family: &str) -> bool {
        self.lock_entries().contains_key(family)
    }

    /// Current lifecycle state of a family, if installed.
    #[must_use]
    pub fn state(&self, family: &str) -> Option<TechnologyState> {
        self.lock_entries().get(family).map(|entry| entry.state)
    }

    /// Installed family names.
    #[must_use]
    pub fn families(&self) -> Vec<String> {
        self.lock_entries().keys().cloned().collect()
    }

    /// Resolve a live handle for a running technology.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] for an unknown family and
    /// [`DomoError::TechnologyUnavailable`] when it is installed but not
    /// `Running`.
    pub fn resolve(&self, family: &str) -> Result<TechnologyHandle, DomoError> {
        let entries = self.lock_entries();
        let entry = entries.get(family).ok_or_else(|| NotFoundError {
            entity: "Technology",
            id: family.to_owned(),
        })?;
        if !entry.state.accepts_dispatch() {
            return Err(DomoError::TechnologyUnavailable {
                technology: family.to_owned(),
                state: entry.state.to_string(),
            });
        }
        Ok(TechnologyHandle::new(family, Arc::clone(&entry.technology)))
    }

    /// Route a trigger: hand out a handle when the technology is running,
    /// queue the trigger otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] for an unknown family and
    /// [`DomoError::TechnologyUnavailable`] when the queue is full.
    pub fn route(&self, family: &str, trigger: Trigger) -> Result<Routed, DomoError> {
        let mut entries = self.lock_entries();
        let entry = entries.get_mut(family).ok_or_else(|| NotFoundError {
            entity: "Technology",
            id: family.to_owned(),
        })?;
        if entry.state.accepts_dispatch() {
            return Ok(Routed::Ready {
                handle: TechnologyHandle::new(family, Arc::clone(&entry.technology)),
                trigger,
            });
        }
        if entry.queue.len() >= self.queue_capacity {
            tracing::warn!(
                technology = family,
                capacity = self.queue_capacity,
                "trigger queue full, rejecting event"
            );
            return Err(DomoError::TechnologyUnavailable {
                technology: family.to_owned(),
                state: entry.state.to_string(),
            });
        }
        tracing::debug!(technology = family, event = %trigger.event, "technology not running, trigger queued");
        entry.queue.push_back(trigger);
        Ok(Routed::Queued)
    }

    /// Start a technology and return the triggers queued while it was down,
    /// in arrival order, for redelivery.
    ///
    /// Starting an already-running technology is a no-op returning an empty
    /// queue.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] for an unknown family,
    /// [`DomoError::TechnologyUnavailable`] when a lifecycle transition is
    /// already in progress, the driver's own error when startup fails, and
    /// [`DomoError::Cancelled`] when startup exceeds the lifecycle timeout.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self, family: &str) -> Result<Vec<Trigger>, DomoError> {
        let technology = {
            let mut entries = self.lock_entries();
            let entry = entries.get_mut(family).ok_or_else(|| NotFoundError {
                entity: "Technology",
                id: family.to_owned(),
            })?;
            match entry.state {
                TechnologyState::Running => {
                    tracing::debug!(technology = family, "already running");
                    return Ok(Vec::new());
                }
                state if state.can_transition_to(TechnologyState::Starting) => {
                    entry.state = TechnologyState::Starting;
                    Arc::clone(&entry.technology)
                }
                state => {
                    return Err(DomoError::TechnologyUnavailable {
                        technology: family.to_owned(),
                        state: state.to_string(),
                    });
                }
            }
        };
        self.announce(family, TechnologyState::Starting).await;

        let started = tokio::time::timeout(
            self.lifecycle_timeout,
            technology.start(Arc::clone(&self.context)),
        )
        .await;
        match started {
            Ok(Ok(())) => {
                let queued = {
                    let mut entries = self.lock_entries();
                    let entry = entries
                        .get_mut(family)
                        .ok_or_else(|| NotFoundError {
                            entity: "Technology",
                            id: family.to_owned(),
                        })?;
                    entry.state = TechnologyState::Running;
                    entry.queue.drain(..).collect::<Vec<_>>()
                };
                self.announce(family, TechnologyState::Running).await;
                tracing::info!(
                    technology = family,
                    queued = queued.len(),
                    "technology started"
                );
                Ok(queued)
            }
            Ok(Err(error)) => {
                self.mark_failed(family).await;
                tracing::error!(technology = family, error = %error, "technology failed to start");
                Err(error)
            }
            Err(_) => {
                self.mark_failed(family).await;
                tracing::error!(technology = family, "technology start timed out");
                Err(DomoError::Cancelled {
                    technology: family.to_owned(),
                    operation: "start".to_owned(),
                })
            }
        }
    }

    /// Stop a running technology.
    ///
    /// Stopping a technology that is `Registered`, `Stopped` or `Failed`
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] for an unknown family,
    /// [`DomoError::TechnologyUnavailable`] when a lifecycle transition is
    /// in progress, the driver's own error when shutdown fails, and
    /// [`DomoError::Cancelled`] on timeout.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self, family: &str) -> Result<(), DomoError> {
        let technology = {
            let mut entries = self.lock_entries();
            let entry = entries.get_mut(family).ok_or_else(|| NotFoundError {
                entity: "Technology",
                id: family.to_owned(),
            })?;
            match entry.state {
                TechnologyState::Registered
                | TechnologyState::Stopped
                | TechnologyState::Failed => return Ok(()),
                TechnologyState::Running => {
                    entry.state = TechnologyState::Stopping;
                    Arc::clone(&entry.technology)
                }
                state => {
                    return Err(DomoError::TechnologyUnavailable {
                        technology: family.to_owned(),
                        state: state.to_string(),
                    });
                }
            }
        };
        self.announce(family, TechnologyState::Stopping).await;

        let stopped = tokio::time::timeout(self.lifecycle_timeout, technology.stop()).await;
        match stopped {
            Ok(Ok(())) => {
                self.set_state(family, TechnologyState::Stopped);
                self.announce(family, TechnologyState::Stopped).await;
                tracing::info!(technology = family, "technology stopped");
                Ok(())
            }
            Ok(Err(error)) => {
                self.mark_failed(family).await;
                tracing::error!(technology = family, error = %error, "technology failed to stop");
                Err(error)
            }
            Err(_) => {
                self.mark_failed(family).await;
                tracing::error!(technology = family, "technology stop timed out");
                Err(DomoError::Cancelled {
                    technology: family.to_owned(),
                    operation: "stop".to_owned(),
                })
            }
        }
    }

    /// Stop every installed technology, logging failures instead of
    /// propagating them. Used on process shutdown.
    pub async fn stop_all(&self) {
        for family in self.families() {
            if let Err(error) = self.stop(&family).await {
                tracing::warn!(technology = %family, error = %error, "shutdown stop failed");
            }
        }
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, family: &str, state: TechnologyState) {
        if let Some(entry) = self.lock_entries().get_mut(family) {
            entry.state = state;
        }
    }

    async fn mark_failed(&self, family: &str) {
        self.set_state(family, TechnologyState::Failed);
        self.announce(family, TechnologyState::Failed).await;
    }

    async fn announce(&self, family: &str, state: TechnologyState) {
        let event = Event::new(
            EventType::TechnologyStateChanged,
            None,
            json!({"technology": family, "state": state.to_string()}),
        );
        if let Err(error) = self.context.publish(event).await {
            tracing::debug!(technology = family, error = %error, "state change event dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use domo_domain::channel::{Channel, ChannelFilter, NewChannel};
    use domo_domain::device::{Device, DeviceFilter, NewDevice};
    use domo_domain::error::EndpointError;
    use domo_domain::id::{ChannelId, DeviceId, ObjectId, TechnologyTypeId};
    use domo_domain::object::{NewObject, Object};
    use domo_domain::technology_type::NewTechnologyType;

    #[derive(Default)]
    struct SpyContext {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl TechnologyContext for SpyContext {
        async fn upsert_object(&self, object: NewObject) -> Result<Object, DomoError> {
            Ok(object.into_object(ObjectId::new(1)))
        }

        async fn update_object_value(
            &self,
            _technology: &str,
            technology_id: &str,
            value: String,
            status: i64,
        ) -> Result<Object, DomoError> {
            let draft = Object::builder()
                .name("spy")
                .technology_id(technology_id)
                .value(value)
                .status(status)
                .build()?;
            Ok(draft.into_object(ObjectId::new(1)))
        }

        async fn upsert_device(&self, device: NewDevice) -> Result<Device, DomoError> {
            Ok(device.into_device(DeviceId::new(1)))
        }

        async fn upsert_channel(&self, channel: NewChannel) -> Result<Channel, DomoError> {
            Ok(channel.into_channel(ChannelId::new(1)))
        }

        async fn update_channel_value(
            &self,
            value_id: &str,
            value: String,
        ) -> Result<Channel, DomoError> {
            let draft = Channel::builder().value_id(value_id).value(value).build()?;
            Ok(draft.into_channel(ChannelId::new(1)))
        }

        async fn remove_node(&self, _node_id: i64) -> Result<(), DomoError> {
            Ok(())
        }

        async fn publish(&self, event: Event) -> Result<(), DomoError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    enum StartBehavior {
        Succeed,
        Fail,
        Hang,
    }

    struct FakeTechnology {
        family: &'static str,
        behavior: StartBehavior,
        starts: AtomicUsize,
    }

    impl FakeTechnology {
        fn new(behavior: StartBehavior) -> Self {
            Self {
                family: "fake-tech",
                behavior,
                starts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Technology for FakeTechnology {
        fn family(&self) -> &str {
            self.family
        }

        async fn start(&self, _context: Arc<dyn TechnologyContext>) -> Result<(), DomoError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                StartBehavior::Succeed => Ok(()),
                StartBehavior::Fail => Err(EndpointError {
                    technology: self.family.to_owned(),
                    endpoint: "driver".to_owned(),
                    source: "port unavailable".into(),
                }
                .into()),
                StartBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(600)).await;
                    Ok(())
                }
            }
        }

        async fn stop(&self) -> Result<(), DomoError> {
            Ok(())
        }

        fn endpoint(&self, _name: &str) -> Option<Arc<dyn Endpoint>> {
            None
        }

        async fn set(&self, _address: &str, _value: Value) -> Result<(), DomoError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryTechnologyTypeRepo {
        store: Mutex<HashMap<TechnologyTypeId, TechnologyType>>,
        seq: std::sync::atomic::AtomicI64,
    }

    impl TechnologyTypeRepository for InMemoryTechnologyTypeRepo {
        fn create(
            &self,
            technology_type: NewTechnologyType,
        ) -> impl Future<Output = Result<TechnologyType, DomoError>> + Send {
            let id = TechnologyTypeId::new(self.seq.fetch_add(1, Ordering::SeqCst) + 1);
            let row = technology_type.into_technology_type(id);
            let mut store = self.store.lock().unwrap();
            store.insert(id, row.clone());
            async { Ok(row) }
        }

        fn get_by_id(
            &self,
            id: TechnologyTypeId,
        ) -> impl Future<Output = Result<Option<TechnologyType>, DomoError>> + Send {
            let store = self.store.lock().unwrap();
            let result = store.get(&id).cloned();
            async { Ok(result) }
        }

        fn get_all(&self) -> impl Future<Output = Result<Vec<TechnologyType>, DomoError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<TechnologyType> = store.values().cloned().collect();
            async { Ok(result) }
        }

        fn find(
            &self,
            filter: TechnologyTypeFilter,
        ) -> impl Future<Output = Result<Vec<TechnologyType>, DomoError>> + Send {
            let store = self.store.lock().unwrap();
            let result: Vec<TechnologyType> = store
                .values()
                .filter(|t| filter.matches(t))
                .cloned()
                .collect();
            async { Ok(result) }
        }

        fn update(
            &self,
            technology_type: TechnologyType,
        ) -> impl Future<Output = Result<TechnologyType, DomoError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.insert(technology_type.id, technology_type.clone());
            async { Ok(technology_type) }
        }

        fn delete(
            &self,
            id: TechnologyTypeId,
        ) -> impl Future<Output = Result<(), DomoError>> + Send {
            let mut store = self.store.lock().unwrap();
            store.remove(&id);
            async { Ok(()) }
        }
    }

    fn make_registry(
        queue_capacity: usize,
        timeout: Duration,
    ) -> (TechnologyRegistry<InMemoryTechnologyTypeRepo>, Arc<SpyContext>) {
        let context = Arc::new(SpyContext::default());
        let registry = TechnologyRegistry::new(
            InMemoryTechnologyTypeRepo::default(),
            Arc::clone(&context) as Arc<dyn TechnologyContext>,
            queue_capacity,
            timeout,
        );
        (registry, context)
    }

    #[test]
    fn should_allow_restart_from_stopped_and_failed() {
        assert!(TechnologyState::Stopped.can_transition_to(TechnologyState::Starting));
        assert!(TechnologyState::Failed.can_transition_to(TechnologyState::Starting));
        assert!(!TechnologyState::Starting.can_transition_to(TechnologyState::Stopping));
        assert!(!TechnologyState::Registered.can_transition_to(TechnologyState::Running));
    }

    #[tokio::test]
    async fn should_register_technology_type_once() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        let first = registry.register("zwave", "rust", "adapters/zwave").await.unwrap();
        let second = registry.register("zwave", "rust", "adapters/zwave").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(registry.types.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_reject_duplicate_install() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)))
            .unwrap();
        let result = registry.install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)));
        assert!(matches!(
            result,
            Err(DomoError::Validation(
                ValidationError::DuplicateTechnology(_)
            ))
        ));
    }

    #[tokio::test]
    async fn should_fail_resolve_until_running() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        assert!(matches!(
            registry.resolve("fake-tech"),
            Err(DomoError::NotFound(_))
        ));

        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)))
            .unwrap();
        assert!(matches!(
            registry.resolve("fake-tech"),
            Err(DomoError::TechnologyUnavailable { .. })
        ));

        registry.start("fake-tech").await.unwrap();
        let handle = registry.resolve("fake-tech").unwrap();
        assert_eq!(handle.family(), "fake-tech");
    }

    #[tokio::test]
    async fn should_announce_lifecycle_states_on_start() {
        let (registry, context) = make_registry(4, Duration::from_secs(1));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)))
            .unwrap();
        registry.start("fake-tech").await.unwrap();

        let events = context.events.lock().unwrap();
        let states: Vec<String> = events
            .iter()
            .map(|e| e.data["state"].as_str().unwrap_or_default().to_owned())
            .collect();
        assert_eq!(states, vec!["starting", "running"]);
        assert_eq!(registry.state("fake-tech"), Some(TechnologyState::Running));
    }

    #[tokio::test]
    async fn should_mark_failed_when_start_errors() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Fail)))
            .unwrap();

        let result = registry.start("fake-tech").await;
        assert!(matches!(result, Err(DomoError::Endpoint(_))));
        assert_eq!(registry.state("fake-tech"), Some(TechnologyState::Failed));
    }

    #[tokio::test]
    async fn should_cancel_start_after_lifecycle_timeout() {
        let (registry, _) = make_registry(4, Duration::from_millis(50));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Hang)))
            .unwrap();

        let result = registry.start("fake-tech").await;
        assert!(matches!(result, Err(DomoError::Cancelled { .. })));
        assert_eq!(registry.state("fake-tech"), Some(TechnologyState::Failed));
    }

    #[tokio::test]
    async fn should_queue_triggers_until_running_and_drain_on_start() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)))
            .unwrap();

        let routed = registry
            .route("fake-tech", Trigger::new("pair"))
            .unwrap();
        assert!(matches!(routed, Routed::Queued));
        let routed = registry
            .route("fake-tech", Trigger::new("set"))
            .unwrap();
        assert!(matches!(routed, Routed::Queued));

        let queued = registry.start("fake-tech").await.unwrap();
        let names: Vec<&str> = queued.iter().map(|t| t.event.as_str()).collect();
        assert_eq!(names, vec!["pair", "set"]);

        let routed = registry
            .route("fake-tech", Trigger::new("set"))
            .unwrap();
        assert!(matches!(routed, Routed::Ready { .. }));
    }

    #[tokio::test]
    async fn should_reject_trigger_when_queue_is_full() {
        let (registry, _) = make_registry(1, Duration::from_secs(1));
        registry
            .install(Arc::new(FakeTechnology::new(StartBehavior::Succeed)))
            .unwrap();

        registry.route("fake-tech", Trigger::new("pair")).unwrap();
        let result = registry.route("fake-tech", Trigger::new("set"));
        assert!(matches!(
            result,
            Err(DomoError::TechnologyUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn should_stop_running_technology_and_allow_restart() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        let technology = Arc::new(FakeTechnology::new(StartBehavior::Succeed));
        registry.install(Arc::clone(&technology) as Arc<dyn Technology>).unwrap();

        registry.start("fake-tech").await.unwrap();
        registry.stop("fake-tech").await.unwrap();
        assert_eq!(registry.state("fake-tech"), Some(TechnologyState::Stopped));

        // Stopping again is a no-op.
        registry.stop("fake-tech").await.unwrap();

        registry.start("fake-tech").await.unwrap();
        assert_eq!(registry.state("fake-tech"), Some(TechnologyState::Running));
        assert_eq!(technology.starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_ignore_start_when_already_running() {
        let (registry, _) = make_registry(4, Duration::from_secs(1));
        let technology = Arc::new(FakeTechnology::new(StartBehavior::Succeed));
        registry.install(Arc::clone(&technology) as Arc<dyn Technology>).unwrap();

        registry.start("fake-tech").await.unwrap();
        let queued = registry.start("fake-tech").await.unwrap();
        assert!(queued.is_empty());
        assert_eq!(technology.starts.load(Ordering::SeqCst), 1);
    }
}

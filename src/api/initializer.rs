//! Resource acquisition state machine
//!
//! A [`ResourceInitializer`] turns permission, GPS and compass providers into a
//! single cached [`ResourceState`]. Any number of callers may call
//! [`ResourceInitializer::initialize`] concurrently; at most one acquisition
//! runs per instance and every caller observes its outcome.
//!
//! ```text
//!            initialize()                  success / skip policy
//! NotInitialized ───────────► Initializing ───────────────────────► Ready
//!       ▲   ▲                      │                                  │
//!       │   │ initialize()         │ failure / cancel()               │
//!       │   └──────────────── Failed ◄──────────┘                     │
//!       └──────────────────────── reset() ────────────────────────────┘
//! ```
//!
//! The acquisition itself runs on its own task, so a caller dropping its
//! future (a screen being torn down) never strands the other waiters.
//! [`ResourceInitializer::cancel`] aborts the in-flight acquisition as a unit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::algorithms::geodesic::{normalize_degrees, qibla};
use crate::api::resources::{ensure_permission, ResourceKind};
use crate::api::types::{
    BearingSource, InitializerConfig, ResourcePayload, ResourceState, ResourceStatus,
};
use crate::core::{BearingResult, GeoPoint, HEADING_SAMPLE_TIMEOUT};
use crate::processing::CacheEntry;
use crate::providers::{
    HeadingProvider, LocationProvider, PermissionKind, PermissionProvider, PermissionStatus,
    ProviderError,
};
use crate::validation::{validate_fix, AcquisitionError, AcquisitionStage, ErrorKind};

type Payload<K> = ResourcePayload<<K as ResourceKind>::Extras>;
type State<K> = ResourceState<<K as ResourceKind>::Extras>;

/// Outcome of trying to start an acquisition
enum Claim<E> {
    /// Already ready, nothing to do
    Cached(ResourceState<E>),
    /// Another caller is acquiring; wait for it
    Join,
    /// This caller owns a new acquisition
    Acquire {
        generation: u64,
        token: CancellationToken,
    },
}

struct Inner<K: ResourceKind> {
    kind: K,
    permissions: Arc<dyn PermissionProvider>,
    location: Arc<dyn LocationProvider>,
    heading: Option<Arc<dyn HeadingProvider>>,
    config: InitializerConfig,
    /// Current state; every transition is one assignment through this channel
    state: watch::Sender<State<K>>,
    /// Incremented per acquisition and per reset; stale results are discarded
    generation: AtomicU64,
    /// Cancels the acquisition of the current generation
    cancellation: Mutex<CancellationToken>,
    /// Last real (non-fallback) payload, kept across resets
    last_known: Mutex<Option<CacheEntry<Payload<K>>>>,
    acquisitions: AtomicU64,
}

/// Acquires and caches one resource; cheap to clone, clones share state
pub struct ResourceInitializer<K: ResourceKind> {
    inner: Arc<Inner<K>>,
}

impl<K: ResourceKind> Clone for ResourceInitializer<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: ResourceKind> ResourceInitializer<K> {
    pub fn new(
        kind: K,
        permissions: Arc<dyn PermissionProvider>,
        location: Arc<dyn LocationProvider>,
        heading: Option<Arc<dyn HeadingProvider>>,
        config: InitializerConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResourceState::not_initialized());
        Self {
            inner: Arc::new(Inner {
                kind,
                permissions,
                location,
                heading,
                config,
                state,
                generation: AtomicU64::new(0),
                cancellation: Mutex::new(CancellationToken::new()),
                last_known: Mutex::new(None),
                acquisitions: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> State<K> {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> ResourceStatus {
        self.inner.state.borrow().status()
    }

    /// Receive every state transition
    pub fn subscribe(&self) -> watch::Receiver<State<K>> {
        self.inner.state.subscribe()
    }

    pub fn config(&self) -> &InitializerConfig {
        &self.inner.config
    }

    pub fn name(&self) -> &'static str {
        self.inner.kind.name()
    }

    /// Number of acquisitions started since creation
    pub fn acquisitions_started(&self) -> u64 {
        self.inner.acquisitions.load(Ordering::SeqCst)
    }

    /// Acquire the resource, or join/return an existing acquisition
    ///
    /// Returns the terminal state (`Ready` or `Failed`). When
    /// `override_bearing` is given, permission and GPS steps are skipped and
    /// the bearing is taken as is.
    pub async fn initialize(&self, override_bearing: Option<f64>) -> State<K> {
        loop {
            match self.claim() {
                Claim::Cached(state) => return state,
                Claim::Join => {
                    if let Some(state) = self.join_in_flight().await {
                        return state;
                    }
                    debug!(resource = self.name(), "joined acquisition was reset, retrying");
                }
                Claim::Acquire { generation, token } => {
                    let inner = Arc::clone(&self.inner);
                    let task = tokio::spawn(async move {
                        inner.acquire(generation, override_bearing, token).await
                    });

                    return match task.await {
                        Ok(state) => state,
                        Err(join_error) => {
                            let error = AcquisitionError::new(
                                ErrorKind::Unknown,
                                AcquisitionStage::Lifecycle,
                                format!("acquisition task failed: {}", join_error),
                            );
                            let state = ResourceState::failed(error);
                            self.inner.commit(generation, state.clone());
                            state
                        }
                    };
                }
            }
        }
    }

    /// Return to `NotInitialized`, abandoning any in-flight acquisition
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.state.send_modify(|state| {
            inner.generation.fetch_add(1, Ordering::SeqCst);
            inner.cancellation.lock().cancel();
            *state = ResourceState::not_initialized();
        });
        info!(resource = self.name(), "resource reset");
    }

    /// Cancel the in-flight acquisition, if any
    ///
    /// The acquisition finishes as `Failed` with [`ErrorKind::Cancelled`] and
    /// every waiter receives that state. Returns whether one was running.
    pub fn cancel(&self) -> bool {
        let inner = &self.inner;
        let mut in_flight = false;

        // Checked under the state lock, so a newer claim cannot slip in between
        inner.state.send_if_modified(|state| {
            if state.status() == ResourceStatus::Initializing {
                inner.cancellation.lock().cancel();
                in_flight = true;
            }
            false
        });
        if in_flight {
            info!(resource = self.name(), "acquisition cancelled");
        }
        in_flight
    }

    /// Whether the ready fix is older than the configured TTL
    pub fn is_stale(&self) -> bool {
        let Some(ttl) = self.inner.config.fix_ttl else {
            return false;
        };
        let state = self.inner.state.borrow();
        match state.ready_at() {
            Some(ready_at) if state.is_ready() => ready_at.elapsed() >= ttl,
            _ => false,
        }
    }

    /// Reset when the ready fix is stale; returns whether a reset happened
    pub fn reset_if_stale(&self) -> bool {
        if self.is_stale() {
            debug!(resource = self.name(), "ready fix is stale");
            self.reset();
            true
        } else {
            false
        }
    }

    /// Last computed payload if it is younger than `ttl`, even after a reset
    pub fn last_known(&self, ttl: Duration) -> Option<Payload<K>> {
        self.inner
            .last_known
            .lock()
            .as_ref()
            .and_then(|entry| entry.fresh_value(ttl).cloned())
    }

    fn claim(&self) -> Claim<K::Extras> {
        let inner = &self.inner;
        let mut claim = Claim::Join;

        inner.state.send_if_modified(|state| match state.status() {
            ResourceStatus::Ready => {
                claim = Claim::Cached(state.clone());
                false
            }
            ResourceStatus::Initializing => false,
            ResourceStatus::NotInitialized | ResourceStatus::Failed => {
                let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let token = CancellationToken::new();
                *inner.cancellation.lock() = token.clone();
                *state = ResourceState::initializing();
                claim = Claim::Acquire { generation, token };
                true
            }
        });

        claim
    }

    /// Wait for the in-flight acquisition; `None` if it was reset instead
    async fn join_in_flight(&self) -> Option<State<K>> {
        let mut receiver = self.inner.state.subscribe();
        let settled = receiver
            .wait_for(|state| state.status() != ResourceStatus::Initializing)
            .await
            .map(|state| state.clone());

        match settled {
            Ok(state) if state.is_terminal() => Some(state),
            Ok(_) => None,
            Err(_) => Some(ResourceState::failed(AcquisitionError::new(
                ErrorKind::Unknown,
                AcquisitionStage::Lifecycle,
                "state channel closed",
            ))),
        }
    }
}

impl<K: ResourceKind> Inner<K> {
    async fn acquire(
        self: Arc<Self>,
        generation: u64,
        override_bearing: Option<f64>,
        token: CancellationToken,
    ) -> State<K> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        info!(resource = self.kind.name(), generation, "acquisition started");

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(AcquisitionError::cancelled()),
            result = self.acquire_payload(override_bearing) => result,
        };

        let state = match outcome {
            Ok(payload) => {
                info!(
                    resource = self.kind.name(),
                    bearing = payload.bearing.bearing_degrees,
                    source = ?payload.source,
                    "resource ready"
                );
                if payload.source != BearingSource::Fallback {
                    *self.last_known.lock() = Some(CacheEntry::new(payload.clone()));
                }
                ResourceState::ready(payload, Instant::now())
            }
            Err(error) => {
                warn!(
                    resource = self.kind.name(),
                    kind = ?error.kind(),
                    remediation = ?error.remediation(),
                    %error,
                    "acquisition failed"
                );
                ResourceState::failed(error)
            }
        };

        if !self.commit(generation, state.clone()) {
            debug!(resource = self.kind.name(), generation, "acquisition superseded by reset");
        }
        state
    }

    /// Publish `state` if no reset or newer acquisition happened meanwhile
    fn commit(&self, generation: u64, state: State<K>) -> bool {
        self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) == generation {
                *current = state;
                true
            } else {
                false
            }
        })
    }

    async fn acquire_payload(
        &self,
        override_bearing: Option<f64>,
    ) -> Result<Payload<K>, AcquisitionError> {
        if let Some(bearing) = override_bearing {
            return Ok(self.override_payload(bearing).await);
        }

        let extras = self.kind.prepare(self.permissions.as_ref()).await?;

        match self.locate().await {
            Ok(fix) => {
                let bearing = qibla(fix);
                debug!(
                    resource = self.kind.name(),
                    %fix,
                    bearing = bearing.bearing_degrees,
                    distance_km = bearing.distance_km,
                    "fix acquired"
                );
                Ok(ResourcePayload {
                    fix: Some(fix),
                    bearing,
                    heading_degrees: self.first_heading().await,
                    source: BearingSource::Computed,
                    location_permission: Some(PermissionStatus::Granted),
                    extras,
                })
            }
            Err(error) if self.config.skip_on_location_failure && error.is_location_failure() => {
                // Reports true north as if it were real; see BearingSource::Fallback
                warn!(
                    resource = self.kind.name(),
                    kind = ?error.kind(),
                    %error,
                    "location unavailable, falling back to north"
                );
                Ok(ResourcePayload {
                    fix: None,
                    bearing: BearingResult::without_distance(0.0),
                    heading_degrees: 0.0,
                    source: BearingSource::Fallback,
                    location_permission: None,
                    extras,
                })
            }
            Err(error) => Err(error),
        }
    }

    async fn override_payload(&self, bearing: f64) -> Payload<K> {
        let location_permission = match self.permissions.status(PermissionKind::Location).await {
            Ok(status) => Some(status),
            Err(error) => {
                debug!(%error, "location permission query failed, ignoring");
                None
            }
        };
        let extras = self.kind.observe(self.permissions.as_ref()).await;

        ResourcePayload {
            fix: None,
            bearing: BearingResult::without_distance(normalize_degrees(bearing)),
            heading_degrees: self.first_heading().await,
            source: BearingSource::Override,
            location_permission,
            extras,
        }
    }

    async fn locate(&self) -> Result<GeoPoint, AcquisitionError> {
        let enabled = self
            .location
            .services_enabled()
            .await
            .map_err(|e| AcquisitionError::provider(AcquisitionStage::Permission, &e))?;
        if !enabled {
            return Err(AcquisitionError::services_disabled());
        }

        ensure_permission(
            self.permissions.as_ref(),
            PermissionKind::Location,
            AcquisitionStage::Permission,
        )
        .await?;

        // Dropping the stream on return unsubscribes from the provider
        let mut fixes = self.location.fixes();
        let first = tokio::time::timeout(self.config.timeout, fixes.next())
            .await
            .map_err(|_| AcquisitionError::timeout(self.config.timeout))?;

        match first {
            Some(Ok(fix)) => validate_fix(fix).map_err(|e| {
                AcquisitionError::new(ErrorKind::Unknown, AcquisitionStage::Location, e.to_string())
            }),
            Some(Err(error)) => Err(AcquisitionError::provider(AcquisitionStage::Location, &error)),
            None => Err(AcquisitionError::provider(
                AcquisitionStage::Location,
                &ProviderError::StreamEnded {
                    provider: "location".to_string(),
                },
            )),
        }
    }

    /// One heading sample within the fixed budget, 0 on any failure
    async fn first_heading(&self) -> f64 {
        let Some(provider) = &self.heading else {
            return 0.0;
        };

        let mut samples = provider.samples();
        let detail = match tokio::time::timeout(HEADING_SAMPLE_TIMEOUT, samples.next()).await {
            Ok(Some(Ok(sample))) => return normalize_degrees(sample.heading_degrees),
            Ok(Some(Err(error))) => error.to_string(),
            Ok(None) => "heading stream ended".to_string(),
            Err(_) => format!(
                "no heading sample within {} ms",
                HEADING_SAMPLE_TIMEOUT.as_millis()
            ),
        };

        let error =
            AcquisitionError::new(ErrorKind::SensorUnavailable, AcquisitionStage::Heading, detail);
        warn!(resource = self.kind.name(), %error, "heading unavailable, defaulting to 0");
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::resources::{AugmentedViewResource, CompassResource};
    use crate::core::OrientationSample;
    use crate::providers::{MockHeading, MockLocation, MockPermissions};
    use futures::future::join_all;

    const JEDDAH_OUTSKIRTS: GeoPoint = GeoPoint::new(21.0, 39.0);

    fn compass(
        permissions: MockPermissions,
        location: Arc<MockLocation>,
        heading: Option<MockHeading>,
        config: InitializerConfig,
    ) -> ResourceInitializer<CompassResource> {
        ResourceInitializer::new(
            CompassResource,
            Arc::new(permissions),
            location,
            heading.map(|h| Arc::new(h) as Arc<dyn HeadingProvider>),
            config,
        )
    }

    fn steady_heading(degrees: f64) -> MockHeading {
        MockHeading::steady(
            OrientationSample::new(degrees, 0.0, 0),
            Duration::from_millis(10),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_acquisition() {
        let location = Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            Some(steady_heading(90.0)),
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert_eq!(state.status(), ResourceStatus::Ready);
        assert!(state.ready_at().is_some());
        let payload = state.payload().unwrap();
        assert_eq!(payload.fix, Some(JEDDAH_OUTSKIRTS));
        assert!((payload.bearing.bearing_degrees - 61.10).abs() < 0.5);
        assert!(payload.bearing.distance_km > 90.0);
        assert_eq!(payload.heading_degrees, 90.0);
        assert_eq!(payload.source, BearingSource::Computed);
        assert_eq!(init.state(), state);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_acquisition() {
        let location = Arc::new(MockLocation::fix_after(
            JEDDAH_OUTSKIRTS,
            Duration::from_millis(100),
        ));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        let states = join_all((0..10).map(|_| init.initialize(None))).await;

        assert_eq!(location.invocations(), 1);
        assert_eq!(init.acquisitions_started(), 1);
        assert_eq!(states.len(), 10);
        assert!(states.iter().all(|s| s == &states[0]));
        assert!(states[0].is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_state_is_cached() {
        let location = Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        let first = init.initialize(None).await;
        let second = init.initialize(None).await;

        assert_eq!(first, second);
        assert_eq!(location.invocations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_location_times_out() {
        let timeout = Duration::from_secs(60);
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::silent()),
            None,
            InitializerConfig::default().with_timeout(timeout),
        );

        let started = Instant::now();
        let state = init.initialize(None).await;
        let elapsed = started.elapsed();

        assert_eq!(state.status(), ResourceStatus::Failed);
        assert_eq!(state.error().unwrap().kind(), ErrorKind::Timeout);
        assert!(elapsed >= timeout, "failed early after {:?}", elapsed);
        assert!(elapsed < timeout + Duration::from_millis(50), "failed late after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_on_location_failure_falls_back_to_north() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::failing(ProviderError::failed("gps", "no satellites"))),
            Some(steady_heading(123.0)),
            InitializerConfig::default().with_skip_on_location_failure(true),
        );

        let state = init.initialize(None).await;

        assert!(state.is_ready());
        let payload = state.payload().unwrap();
        assert_eq!(payload.bearing.bearing_degrees, 0.0);
        assert_eq!(payload.heading_degrees, 0.0);
        assert_eq!(payload.source, BearingSource::Fallback);
        assert!(payload.fix.is_none());
        assert!(init.last_known(Duration::from_secs(3600)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_is_unknown() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::failing(ProviderError::failed("gps", "no satellites"))),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;
        let error = state.error().unwrap();

        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert!(error.detail().contains("no satellites"));
        assert!(!error.remediation_message().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_fix_is_rejected() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fixed(GeoPoint::new(123.0, 0.0))),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;
        assert_eq!(state.error().unwrap().kind(), ErrorKind::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_services_disabled() {
        let location = Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS).with_services_enabled(false));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert_eq!(state.error().unwrap().kind(), ErrorKind::ServicesDisabled);
        assert_eq!(location.invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_requested_once_then_denied() {
        let permissions = Arc::new(
            MockPermissions::not_yet_asked()
                .with_request_outcome(PermissionKind::Location, PermissionStatus::Denied),
        );
        let init: ResourceInitializer<CompassResource> = ResourceInitializer::new(
            CompassResource,
            permissions.clone(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert_eq!(state.error().unwrap().kind(), ErrorKind::PermissionDenied);
        assert_eq!(permissions.request_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_granted_after_request() {
        let init = compass(
            MockPermissions::not_yet_asked(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default(),
        );

        assert!(init.initialize(None).await.is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanently_denied_is_not_requested() {
        let permissions = Arc::new(
            MockPermissions::granted()
                .with_status(PermissionKind::Location, PermissionStatus::PermanentlyDenied),
        );
        let init: ResourceInitializer<CompassResource> = ResourceInitializer::new(
            CompassResource,
            permissions.clone(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert_eq!(state.error().unwrap().kind(), ErrorKind::PermissionDenied);
        assert_eq!(permissions.request_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_bearing_skips_location() {
        let location = Arc::new(MockLocation::silent());
        let init = compass(
            MockPermissions::granted().failing_with(ProviderError::failed("permissions", "gone")),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(Some(-30.0)).await;

        assert!(state.is_ready());
        let payload = state.payload().unwrap();
        assert_eq!(payload.bearing.bearing_degrees, 330.0);
        assert_eq!(payload.source, BearingSource::Override);
        assert!(payload.location_permission.is_none());
        assert_eq!(location.invocations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heading_failure_defaults_to_zero() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            Some(MockHeading::failing(ProviderError::unavailable("compass", "no magnetometer"))),
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert!(state.is_ready());
        assert_eq!(state.payload().unwrap().heading_degrees, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_heading_waits_fixed_budget() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            Some(MockHeading::silent()),
            InitializerConfig::default(),
        );

        let started = Instant::now();
        let state = init.initialize(None).await;

        assert!(state.is_ready());
        assert_eq!(state.payload().unwrap().heading_degrees, 0.0);
        assert!(started.elapsed() >= HEADING_SAMPLE_TIMEOUT);
        assert!(started.elapsed() < HEADING_SAMPLE_TIMEOUT + Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_allows_fresh_acquisition() {
        let location = Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        assert!(init.initialize(None).await.is_ready());
        init.reset();
        assert_eq!(init.status(), ResourceStatus::NotInitialized);
        assert!(init.state().payload().is_none());

        assert!(init.initialize(None).await.is_ready());
        assert_eq!(location.invocations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_retries_on_next_call() {
        let location = Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS).with_services_enabled(false));
        let init = compass(
            MockPermissions::granted(),
            location,
            None,
            InitializerConfig::default(),
        );

        assert_eq!(init.initialize(None).await.status(), ResourceStatus::Failed);
        assert_eq!(init.initialize(None).await.status(), ResourceStatus::Failed);
        assert_eq!(init.acquisitions_started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_fails_all_waiters() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::silent()),
            None,
            InitializerConfig::default(),
        );

        let claimant = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        let waiter = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        // Wait until the second caller is parked on the in-flight acquisition
        while init.inner.state.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(init.status(), ResourceStatus::Initializing);

        assert!(init.cancel());

        let claimed = claimant.await.unwrap();
        let waited = waiter.await.unwrap();
        assert_eq!(claimed.error().unwrap().kind(), ErrorKind::Cancelled);
        assert_eq!(claimed, waited);
        assert_eq!(init.status(), ResourceStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_does_not_strand_waiters() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fix_after(JEDDAH_OUTSKIRTS, Duration::from_secs(1))),
            None,
            InitializerConfig::default(),
        );

        let claimant = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        while init.status() != ResourceStatus::Initializing {
            tokio::task::yield_now().await;
        }
        let waiter = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });

        claimant.abort();

        let state = waiter.await.unwrap();
        assert!(state.is_ready());
        assert_eq!(init.acquisitions_started(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_without_acquisition_is_a_no_op() {
        let location = Arc::new(MockLocation::fix_after(
            JEDDAH_OUTSKIRTS,
            Duration::from_millis(100),
        ));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        assert!(!init.cancel());
        assert!(init.initialize(None).await.is_ready());
        assert!(!init.cancel());
        assert_eq!(init.status(), ResourceStatus::Ready);

        init.reset();
        let state = init.initialize(None).await;
        assert!(state.is_ready(), "got {:?}", state.error());
        assert_eq!(location.invocations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_retries_after_reset() {
        let location = Arc::new(MockLocation::fix_after(
            JEDDAH_OUTSKIRTS,
            Duration::from_secs(1),
        ));
        let init = compass(
            MockPermissions::granted(),
            location.clone(),
            None,
            InitializerConfig::default(),
        );

        let claimant = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        while location.invocations() == 0 {
            tokio::task::yield_now().await;
        }
        let waiter = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        while init.inner.state.receiver_count() == 0 {
            tokio::task::yield_now().await;
        }

        init.reset();

        let superseded = claimant.await.unwrap();
        let retried = waiter.await.unwrap();
        assert_eq!(superseded.error().unwrap().kind(), ErrorKind::Cancelled);
        assert!(retried.is_ready());
        assert_eq!(init.status(), ResourceStatus::Ready);
        assert_eq!(init.acquisitions_started(), 2);
        assert_eq!(location.invocations(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_stream_end_is_unknown() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::empty()),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;
        let error = state.error().unwrap();

        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(error.stage(), AcquisitionStage::Location);
        assert!(error.detail().contains("stream ended"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_acquisition_is_not_overwritten() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fix_after(JEDDAH_OUTSKIRTS, Duration::from_secs(1))),
            None,
            InitializerConfig::default(),
        );

        let claimant = tokio::spawn({
            let init = init.clone();
            async move { init.initialize(None).await }
        });
        while init.status() != ResourceStatus::Initializing {
            tokio::task::yield_now().await;
        }

        init.reset();
        let superseded = claimant.await.unwrap();

        assert_eq!(superseded.error().unwrap().kind(), ErrorKind::Cancelled);
        assert_eq!(init.status(), ResourceStatus::NotInitialized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fix_resets_but_last_known_survives() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default().with_fix_ttl(Duration::from_secs(600)),
        );

        init.initialize(None).await;
        assert!(!init.is_stale());
        assert!(!init.reset_if_stale());

        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(init.is_stale());
        assert!(init.reset_if_stale());
        assert_eq!(init.status(), ResourceStatus::NotInitialized);

        let remembered = init.last_known(Duration::from_secs(3600)).unwrap();
        assert_eq!(remembered.fix, Some(JEDDAH_OUTSKIRTS));
        assert!(init.last_known(Duration::from_secs(60)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let init = compass(
            MockPermissions::granted(),
            Arc::new(MockLocation::fix_after(JEDDAH_OUTSKIRTS, Duration::from_millis(10))),
            None,
            InitializerConfig::default(),
        );
        let mut receiver = init.subscribe();
        assert_eq!(receiver.borrow().status(), ResourceStatus::NotInitialized);

        init.initialize(None).await;

        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_augmented_view_requires_camera() {
        let permissions = MockPermissions::granted()
            .with_status(PermissionKind::Camera, PermissionStatus::PermanentlyDenied);
        let init: ResourceInitializer<AugmentedViewResource> = ResourceInitializer::new(
            AugmentedViewResource,
            Arc::new(permissions),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default().with_skip_on_location_failure(true),
        );

        let state = init.initialize(None).await;
        let error = state.error().unwrap();

        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
        assert_eq!(error.stage(), AcquisitionStage::Prerequisite);
    }

    #[tokio::test(start_paused = true)]
    async fn test_augmented_view_records_camera_access() {
        let init: ResourceInitializer<AugmentedViewResource> = ResourceInitializer::new(
            AugmentedViewResource,
            Arc::new(MockPermissions::not_yet_asked()),
            Arc::new(MockLocation::fixed(JEDDAH_OUTSKIRTS)),
            None,
            InitializerConfig::default(),
        );

        let state = init.initialize(None).await;

        assert!(state.is_ready());
        assert!(state.payload().unwrap().extras.is_granted());
    }
}

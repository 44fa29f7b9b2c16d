//! Mock providers for testing and development

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use crate::core::{GeoPoint, OrientationSample};
use crate::providers::{
    FixStream, HeadingProvider, LocationProvider, PermissionKind, PermissionProvider,
    PermissionStatus, ProviderError, ProviderResult, SampleStream,
};

/// Mock permission provider with scripted answers
pub struct MockPermissions {
    statuses: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    request_outcomes: Mutex<HashMap<PermissionKind, PermissionStatus>>,
    failing: Mutex<Option<ProviderError>>,
    status_calls: AtomicUsize,
    request_calls: AtomicUsize,
}

impl MockPermissions {
    /// Every permission already granted
    pub fn granted() -> Self {
        let permissions = Self::empty();
        permissions.set_status(PermissionKind::Camera, PermissionStatus::Granted);
        permissions.set_status(PermissionKind::Location, PermissionStatus::Granted);
        permissions
    }

    /// Nothing asked yet; requests are answered with `Granted` unless overridden
    pub fn not_yet_asked() -> Self {
        let permissions = Self::empty();
        permissions.set_status(PermissionKind::Camera, PermissionStatus::Denied);
        permissions.set_status(PermissionKind::Location, PermissionStatus::Denied);
        permissions
    }

    fn empty() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            request_outcomes: Mutex::new(HashMap::new()),
            failing: Mutex::new(None),
            status_calls: AtomicUsize::new(0),
            request_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_status(self, kind: PermissionKind, status: PermissionStatus) -> Self {
        self.set_status(kind, status);
        self
    }

    pub fn with_request_outcome(self, kind: PermissionKind, outcome: PermissionStatus) -> Self {
        self.request_outcomes.lock().insert(kind, outcome);
        self
    }

    /// Make every call fail with `error`
    pub fn failing_with(self, error: ProviderError) -> Self {
        *self.failing.lock() = Some(error);
        self
    }

    pub fn set_status(&self, kind: PermissionKind, status: PermissionStatus) {
        self.statuses.lock().insert(kind, status);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> ProviderResult<()> {
        match self.failing.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PermissionProvider for MockPermissions {
    async fn status(&self, kind: PermissionKind) -> ProviderResult<PermissionStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self
            .statuses
            .lock()
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::Denied))
    }

    async fn request(&self, kind: PermissionKind) -> ProviderResult<PermissionStatus> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let outcome = self
            .request_outcomes
            .lock()
            .get(&kind)
            .copied()
            .unwrap_or(PermissionStatus::Granted);
        // A real dialog changes what later status queries report
        self.set_status(kind, outcome);
        Ok(outcome)
    }
}

/// Scripted behaviour of a mock sequence
#[derive(Debug, Clone)]
enum Script<T> {
    /// Emit each value after `delay`
    Values { values: Vec<T>, delay: Duration },
    /// Emit the same value forever, one every `interval`
    Repeat { value: T, interval: Duration },
    /// Never emit anything
    Silent,
    /// Yield a single error
    Fail(ProviderError),
}

impl<T: Clone + Send + 'static> Script<T> {
    fn into_stream(self) -> stream::BoxStream<'static, ProviderResult<T>> {
        match self {
            Script::Values { values, delay } => stream::iter(values)
                .then(move |value| async move {
                    tokio::time::sleep(delay).await;
                    Ok(value)
                })
                .boxed(),
            Script::Repeat { value, interval } => stream::repeat(value)
                .then(move |value| async move {
                    tokio::time::sleep(interval).await;
                    Ok(value)
                })
                .boxed(),
            Script::Silent => stream::pending().boxed(),
            Script::Fail(error) => stream::once(async move { Err(error) }).boxed(),
        }
    }
}

/// Mock GPS that counts how often a fix sequence is started
pub struct MockLocation {
    script: Script<GeoPoint>,
    services_enabled: bool,
    invocations: Arc<AtomicUsize>,
}

impl MockLocation {
    /// Yield `fix` once after `delay`
    pub fn fix_after(fix: GeoPoint, delay: Duration) -> Self {
        Self::from_script(Script::Values {
            values: vec![fix],
            delay,
        })
    }

    pub fn fixed(fix: GeoPoint) -> Self {
        Self::fix_after(fix, Duration::ZERO)
    }

    /// A provider whose sequence never produces a fix
    pub fn silent() -> Self {
        Self::from_script(Script::Silent)
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::from_script(Script::Fail(error))
    }

    /// A provider whose sequence ends immediately
    pub fn empty() -> Self {
        Self::from_script(Script::Values {
            values: Vec::new(),
            delay: Duration::ZERO,
        })
    }

    fn from_script(script: Script<GeoPoint>) -> Self {
        Self {
            script,
            services_enabled: true,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_services_enabled(mut self, enabled: bool) -> Self {
        self.services_enabled = enabled;
        self
    }

    /// Number of times `fixes()` has been called
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for MockLocation {
    async fn services_enabled(&self) -> ProviderResult<bool> {
        Ok(self.services_enabled)
    }

    fn fixes(&self) -> FixStream {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.script.clone().into_stream()
    }
}

/// Mock compass producing scripted readings
pub struct MockHeading {
    script: Script<OrientationSample>,
    subscriptions: AtomicUsize,
}

impl MockHeading {
    /// Emit `samples` in order, each after `interval`, then end
    pub fn sequence(samples: Vec<OrientationSample>, interval: Duration) -> Self {
        Self::from_script(Script::Values {
            values: samples,
            delay: interval,
        })
    }

    /// Emit the same reading forever
    pub fn steady(sample: OrientationSample, interval: Duration) -> Self {
        Self::from_script(Script::Repeat {
            value: sample,
            interval,
        })
    }

    pub fn silent() -> Self {
        Self::from_script(Script::Silent)
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::from_script(Script::Fail(error))
    }

    fn from_script(script: Script<OrientationSample>) -> Self {
        Self {
            script,
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Number of times `samples()` has been called
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl HeadingProvider for MockHeading {
    fn samples(&self) -> SampleStream {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.script.clone().into_stream()
    }
}

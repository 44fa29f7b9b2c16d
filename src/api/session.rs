//! Live heading → smoothed orientation → screen position pipeline
//!
//! A [`FusionSession`] subscribes to a heading provider on its own task and
//! publishes the latest [`PositionUpdate`] on a watch channel. Stopping or
//! dropping the session drops the sample stream, which unsubscribes from the
//! sensor.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::algorithms::geodesic::normalize_degrees;
use crate::api::positioner::{ScreenPositioner, Viewport};
use crate::core::{FusedOrientation, NavigationHint, OrientationSample, ScreenPosition};
use crate::processing::OrientationFilter;
use crate::providers::{HeadingProvider, ProviderResult, SampleStream};

/// One output of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionUpdate {
    pub fused: FusedOrientation,
    pub position: ScreenPosition,
    pub hint: NavigationHint,
    /// Samples folded into the filter so far
    pub sample_count: u64,
}

/// Running fusion pipeline; owns its filter and positioner state
pub struct FusionSession {
    updates: watch::Receiver<Option<PositionUpdate>>,
    target: watch::Sender<f64>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl FusionSession {
    /// Spawn the pipeline on the current tokio runtime
    pub fn start(
        provider: Arc<dyn HeadingProvider>,
        target_bearing: f64,
        filter: OrientationFilter,
        positioner: ScreenPositioner,
        viewport: Viewport,
    ) -> Self {
        let (updates_tx, updates) = watch::channel(None);
        let (target, target_rx) = watch::channel(normalize_degrees(target_bearing));
        let token = CancellationToken::new();

        let pipeline = Pipeline {
            filter,
            positioner,
            viewport,
            target: target_rx,
            updates: updates_tx,
        };
        let task = tokio::spawn(pipeline.run(provider.samples(), token.clone()));
        info!(target_bearing, "fusion session started");

        Self {
            updates,
            target,
            token,
            task: Some(task),
        }
    }

    /// Receive every published update
    pub fn subscribe(&self) -> watch::Receiver<Option<PositionUpdate>> {
        self.updates.clone()
    }

    /// Most recent update, `None` before the first sample
    pub fn latest(&self) -> Option<PositionUpdate> {
        *self.updates.borrow()
    }

    pub fn target_bearing(&self) -> f64 {
        *self.target.borrow()
    }

    /// Change the target; the current orientation is re-projected at once
    pub fn set_target_bearing(&self, bearing: f64) {
        self.target.send_replace(normalize_degrees(bearing));
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the pipeline and wait for its task to finish
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                warn!(%error, "fusion task ended abnormally");
            }
        }
        info!("fusion session stopped");
    }
}

impl Drop for FusionSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

enum Event {
    Sample(Option<ProviderResult<OrientationSample>>),
    TargetChanged,
    Stop,
}

struct Pipeline {
    filter: OrientationFilter,
    positioner: ScreenPositioner,
    viewport: Viewport,
    target: watch::Receiver<f64>,
    updates: watch::Sender<Option<PositionUpdate>>,
}

impl Pipeline {
    async fn run(mut self, mut samples: SampleStream, token: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => Event::Stop,
                changed = self.target.changed() => match changed {
                    Ok(()) => Event::TargetChanged,
                    Err(_) => Event::Stop,
                },
                next = samples.next() => Event::Sample(next),
            };

            match event {
                Event::Stop => break,
                Event::TargetChanged => {
                    if let Some(fused) = self.filter.current() {
                        self.publish(fused);
                    }
                }
                Event::Sample(Some(Ok(sample))) => match self.filter.update(&sample) {
                    Ok(fused) => self.publish(fused),
                    Err(error) => warn!(%error, "discarding unusable heading sample"),
                },
                Event::Sample(Some(Err(error))) => {
                    warn!(%error, "heading sample failed, skipping");
                }
                Event::Sample(None) => {
                    debug!("heading stream ended");
                    break;
                }
            }
        }
        debug!(samples = self.filter.samples_seen(), "fusion pipeline finished");
    }

    fn publish(&mut self, fused: FusedOrientation) {
        let target = *self.target.borrow_and_update();
        let position = self.positioner.position_for(
            target,
            fused.heading_degrees,
            fused.pitch_degrees,
            &self.viewport,
        );
        let hint = self.positioner.hint_for(&position);

        self.updates.send_replace(Some(PositionUpdate {
            fused,
            position,
            hint,
            sample_count: self.filter.samples_seen(),
        }));
    }
}

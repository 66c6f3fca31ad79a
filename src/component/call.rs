use std::{cell::Cell, rc::Rc};

use futures::future;
use medea_reactive::ObservableCell;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    component::{
        media::{
            LocalMedia, MediaAcquisition, MediaSourceKind, Reacquisition,
            TrackIdentity,
        },
        negotiation::{NegotiationKind, RenegotiationTrigger},
    },
    config::{Config, MediaConfiguration},
    errors::CallMediaError,
    sys::{AudioProcessing, MediaDevices, MediaStream, StreamId},
};

/// Local media of one call.
///
/// Every [`CallMedia::start`] and [`CallMedia::reconfigure`] runs as one
/// cycle: plan, release stale tracks, acquire, install, negotiate. Cycles are
/// queued in call order and never interleave.
pub struct CallMedia {
    acquisition: MediaAcquisition,
    local: LocalMedia,
    negotiation: RenegotiationTrigger,
    cycle: Mutex<()>,
    configuration: Cell<Option<MediaConfiguration>>,
    is_closed: Cell<bool>,
}

impl CallMedia {
    pub fn new<F>(
        devices: Rc<dyn MediaDevices>,
        config: &Config,
        negotiate: F,
    ) -> Rc<Self>
    where
        F: Fn(bool) + 'static,
    {
        let audio_processing = AudioProcessing {
            noise_suppression: config.noise_suppression,
            echo_cancellation: config.echo_cancellation,
        };
        Rc::new(Self {
            acquisition: MediaAcquisition::new(devices, audio_processing),
            local: LocalMedia::new(),
            negotiation: RenegotiationTrigger::new(negotiate),
            cycle: Mutex::new(()),
            configuration: Cell::new(None),
            is_closed: Cell::new(false),
        })
    }

    /// Acquires media for the first time and establishes the connection.
    pub async fn start(
        &self,
        config: MediaConfiguration,
    ) -> Result<NegotiationKind, CallMediaError> {
        self.run_cycle(config).await
    }

    /// Moves local media to `config`, reacquiring only what enablement
    /// alone cannot provide, then renegotiates.
    pub async fn reconfigure(
        &self,
        config: MediaConfiguration,
    ) -> Result<NegotiationKind, CallMediaError> {
        self.run_cycle(config).await
    }

    async fn run_cycle(
        &self,
        config: MediaConfiguration,
    ) -> Result<NegotiationKind, CallMediaError> {
        let _cycle = self.cycle.lock().await;
        if self.is_closed.get() {
            return Err(CallMediaError::Closed);
        }

        let plan = self.local.plan(&config);
        debug!(?config, ?plan, "Reconfiguring local media");
        for source in [MediaSourceKind::Device, MediaSourceKind::Display] {
            if plan.get(source) != Reacquisition::Keep {
                self.local.release(source);
            }
        }

        let (user, display) = {
            let _acquiring = self.negotiation.acquisition_started();
            future::join(
                self.reacquire(MediaSourceKind::Device, plan.user, config),
                self.reacquire(MediaSourceKind::Display, plan.display, config),
            )
            .await
        };

        if self.is_closed.get() {
            Self::discard([user, display]);
            return Err(CallMediaError::Closed);
        }

        for (source, stream) in [
            (MediaSourceKind::Device, user),
            (MediaSourceKind::Display, display),
        ] {
            if plan.get(source) == Reacquisition::Reacquire {
                self.local.install(source, stream, &config);
            } else {
                self.local.apply(source, &config);
            }
        }
        self.configuration.set(Some(config));

        self.negotiation.when_settled().await;
        if self.is_closed.get() {
            return Err(CallMediaError::Closed);
        }
        Ok(self.negotiation.fire())
    }

    async fn reacquire(
        &self,
        source: MediaSourceKind,
        step: Reacquisition,
        config: MediaConfiguration,
    ) -> Option<MediaStream> {
        if step != Reacquisition::Reacquire {
            return None;
        }
        match source {
            MediaSourceKind::Device => {
                self.acquisition.acquire_user(config).await
            }
            MediaSourceKind::Display => {
                self.acquisition.acquire_display(config).await
            }
        }
    }

    fn discard(streams: [Option<MediaStream>; 2]) {
        for stream in streams.into_iter().flatten() {
            let released = stream.release_all();
            debug!(
                stream_id = %stream.id(),
                released,
                "Discarded media resolved after teardown"
            );
        }
    }

    /// Releases every local track. Cycles still queued or in flight finish
    /// with [`CallMediaError::Closed`] and never negotiate.
    pub fn teardown(&self) -> usize {
        if self.is_closed.replace(true) {
            return 0;
        }
        let released = self.local.teardown();
        info!(released, "Local media torn down");
        released
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed.get()
    }

    /// Resolves once every cycle queued before this call has finished.
    pub async fn when_settled(&self) {
        drop(self.cycle.lock().await);
    }

    /// Configuration applied by the last finished cycle.
    pub fn configuration(&self) -> Option<MediaConfiguration> {
        self.configuration.get()
    }

    pub fn user_stream(&self) -> Option<MediaStream> {
        self.local.user_stream()
    }

    pub fn display_stream(&self) -> Option<MediaStream> {
        self.local.display_stream()
    }

    pub fn identities(&self) -> Vec<TrackIdentity> {
        self.local.identities()
    }

    pub fn user_media_stream_id(&self) -> &ObservableCell<Option<StreamId>> {
        self.local.user_media_stream_id()
    }

    pub fn display_media_stream_id(
        &self,
    ) -> &ObservableCell<Option<StreamId>> {
        self.local.display_media_stream_id()
    }

    /// Number of cycles currently waiting on capture devices.
    pub fn acquisitions_in_progress(&self) -> u32 {
        self.negotiation.acquisitions_in_progress()
    }

    /// Number of negotiations requested so far.
    pub fn negotiations(&self) -> u32 {
        self.negotiation.negotiations()
    }
}

impl Drop for CallMedia {
    fn drop(&mut self) {
        self.teardown();
    }
}

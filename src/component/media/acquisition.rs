use std::rc::Rc;

use futures::future;
use tracing::{debug, warn};

use crate::{
    config::MediaConfiguration,
    sys::{
        AudioProcessing, DisplayMediaConstraints, MediaDevices, MediaStream,
        UserMediaConstraints,
    },
};

/// Streams obtained by one acquisition. Either may be absent.
#[derive(Debug, Default)]
pub struct AcquiredMedia {
    pub user: Option<MediaStream>,
    pub display: Option<MediaStream>,
}

/// Requests capture devices for a [`MediaConfiguration`].
///
/// A failed request is logged and leaves its stream absent; it never fails the
/// other request or the acquisition as a whole.
pub struct MediaAcquisition {
    devices: Rc<dyn MediaDevices>,
    audio_processing: AudioProcessing,
}

impl MediaAcquisition {
    pub fn new(
        devices: Rc<dyn MediaDevices>,
        audio_processing: AudioProcessing,
    ) -> Self {
        Self {
            devices,
            audio_processing,
        }
    }

    /// Requests user and display media concurrently.
    pub async fn acquire(&self, config: MediaConfiguration) -> AcquiredMedia {
        let (user, display) = future::join(
            self.acquire_user(config),
            self.acquire_display(config),
        )
        .await;
        AcquiredMedia { user, display }
    }

    /// Requests the camera, and the microphone if user audio is enabled.
    pub async fn acquire_user(
        &self,
        config: MediaConfiguration,
    ) -> Option<MediaStream> {
        let audio = config.user_media.audio.then_some(self.audio_processing);
        let constraints = UserMediaConstraints::new(audio);

        match self.devices.get_user_media(constraints).await {
            Ok(stream) => {
                debug!(stream_id = %stream.id(), "User media acquired");
                Some(stream)
            }
            Err(e) => {
                warn!(error = %e, ?constraints, "User media unavailable");
                None
            }
        }
    }

    /// Requests the screen if display video is enabled.
    pub async fn acquire_display(
        &self,
        config: MediaConfiguration,
    ) -> Option<MediaStream> {
        if !config.display_media.video {
            return None;
        }
        let constraints =
            DisplayMediaConstraints::new(config.display_media.audio);

        match self.devices.get_display_media(constraints).await {
            Ok(stream) => {
                debug!(stream_id = %stream.id(), "Display media acquired");
                Some(stream)
            }
            Err(e) => {
                warn!(error = %e, ?constraints, "Display media unavailable");
                None
            }
        }
    }
}

//! Capture device boundary.
//!
//! Platforms reject a user-media request that carries no video member, and
//! require video on every display-media request. The constraint types below
//! therefore always request video; callers disable the resulting track when
//! video is not wanted.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    time::Duration,
};

use futures::future::LocalBoxFuture;
use serde::{Serialize, Serializer};
use tokio::time::sleep;
use tracing::debug;

use super::{MediaKind, MediaStream, MediaStreamTrack};
use crate::errors::DeviceError;

/// Processing hints for captured microphone audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProcessing {
    pub noise_suppression: bool,
    pub echo_cancellation: bool,
}

impl Default for AudioProcessing {
    fn default() -> Self {
        Self {
            noise_suppression: true,
            echo_cancellation: true,
        }
    }
}

/// Camera and microphone request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct UserMediaConstraints {
    #[serde(serialize_with = "serialize_audio")]
    audio: Option<AudioProcessing>,
    video: bool,
}

impl UserMediaConstraints {
    /// Requests the camera, plus the microphone when `audio` is given.
    pub fn new(audio: Option<AudioProcessing>) -> Self {
        Self { audio, video: true }
    }

    pub fn audio(&self) -> Option<AudioProcessing> {
        self.audio
    }

    /// Always `true`.
    pub fn video(&self) -> bool {
        self.video
    }
}

fn serialize_audio<S: Serializer>(
    audio: &Option<AudioProcessing>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match audio {
        Some(processing) => processing.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

/// Screen capture request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayMediaConstraints {
    audio: bool,
    video: bool,
}

impl DisplayMediaConstraints {
    pub fn new(audio: bool) -> Self {
        Self { audio, video: true }
    }

    pub fn audio(&self) -> bool {
        self.audio
    }

    /// Always `true`.
    pub fn video(&self) -> bool {
        self.video
    }
}

/// Platform capture API.
pub trait MediaDevices {
    /// Captures camera video and, if requested, microphone audio.
    fn get_user_media(
        &self,
        constraints: UserMediaConstraints,
    ) -> LocalBoxFuture<'static, Result<MediaStream, DeviceError>>;

    /// Opens the display picker and captures the chosen surface.
    fn get_display_media(
        &self,
        constraints: DisplayMediaConstraints,
    ) -> LocalBoxFuture<'static, Result<MediaStream, DeviceError>>;
}

/// Which virtual devices are present and how the user answers prompts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceAvailability {
    pub camera: bool,
    pub microphone: bool,
    pub display: bool,
    pub display_audio: bool,
    pub permission_granted: bool,
    pub display_picker_cancelled: bool,
}

impl Default for DeviceAvailability {
    fn default() -> Self {
        Self {
            camera: true,
            microphone: true,
            display: true,
            display_audio: true,
            permission_granted: true,
            display_picker_cancelled: false,
        }
    }
}

struct VirtualDevicesInner {
    availability: Cell<DeviceAvailability>,
    latency: Duration,
    user_requests: Cell<u32>,
    display_requests: Cell<u32>,
    issued: RefCell<Vec<MediaStreamTrack>>,
}

/// In-process capture backend.
///
/// Answers after a fixed start-up latency and remembers every track it ever
/// handed out.
#[derive(Clone)]
pub struct VirtualMediaDevices(Rc<VirtualDevicesInner>);

impl VirtualMediaDevices {
    pub fn new(availability: DeviceAvailability, latency: Duration) -> Self {
        Self(Rc::new(VirtualDevicesInner {
            availability: Cell::new(availability),
            latency,
            user_requests: Cell::new(0),
            display_requests: Cell::new(0),
            issued: RefCell::default(),
        }))
    }

    pub fn availability(&self) -> DeviceAvailability {
        self.0.availability.get()
    }

    pub fn set_availability(&self, availability: DeviceAvailability) {
        self.0.availability.set(availability);
    }

    /// Number of user-media requests received so far.
    pub fn user_requests(&self) -> u32 {
        self.0.user_requests.get()
    }

    /// Number of display-media requests received so far.
    pub fn display_requests(&self) -> u32 {
        self.0.display_requests.get()
    }

    /// Every track handed out so far, live or not.
    pub fn issued_tracks(&self) -> Vec<MediaStreamTrack> {
        self.0.issued.borrow().clone()
    }

    pub fn live_tracks(&self) -> usize {
        self.0.issued.borrow().iter().filter(|t| t.is_live()).count()
    }

    async fn start_up(&self) {
        if !self.0.latency.is_zero() {
            sleep(self.0.latency).await;
        }
    }

    fn capture(&self, kinds: &[MediaKind]) -> MediaStream {
        let tracks: Vec<_> =
            kinds.iter().map(|kind| MediaStreamTrack::new(*kind)).collect();
        self.0.issued.borrow_mut().extend(tracks.iter().cloned());
        MediaStream::with_tracks(tracks)
    }

    async fn user_media(
        self,
        constraints: UserMediaConstraints,
    ) -> Result<MediaStream, DeviceError> {
        self.0.user_requests.set(self.0.user_requests.get() + 1);
        self.start_up().await;

        let available = self.availability();
        if !available.permission_granted {
            return Err(DeviceError::PermissionDenied);
        }
        if constraints.video() && !available.camera {
            return Err(DeviceError::NotFound);
        }
        if constraints.audio().is_some() && !available.microphone {
            return Err(DeviceError::NotFound);
        }

        let mut kinds = vec![MediaKind::Video];
        if constraints.audio().is_some() {
            kinds.push(MediaKind::Audio);
        }
        let stream = self.capture(&kinds);
        debug!(stream_id = %stream.id(), ?constraints, "User media captured");
        Ok(stream)
    }

    async fn display_media(
        self,
        constraints: DisplayMediaConstraints,
    ) -> Result<MediaStream, DeviceError> {
        self.0.display_requests.set(self.0.display_requests.get() + 1);
        self.start_up().await;

        let available = self.availability();
        if available.display_picker_cancelled {
            return Err(DeviceError::Cancelled);
        }
        if !available.permission_granted {
            return Err(DeviceError::PermissionDenied);
        }
        if !available.display {
            return Err(DeviceError::NotFound);
        }

        let mut kinds = vec![MediaKind::Video];
        if constraints.audio() && available.display_audio {
            kinds.push(MediaKind::Audio);
        }
        let stream = self.capture(&kinds);
        debug!(
            stream_id = %stream.id(),
            ?constraints,
            "Display media captured"
        );
        Ok(stream)
    }
}

impl MediaDevices for VirtualMediaDevices {
    fn get_user_media(
        &self,
        constraints: UserMediaConstraints,
    ) -> LocalBoxFuture<'static, Result<MediaStream, DeviceError>> {
        Box::pin(self.clone().user_media(constraints))
    }

    fn get_display_media(
        &self,
        constraints: DisplayMediaConstraints,
    ) -> LocalBoxFuture<'static, Result<MediaStream, DeviceError>> {
        Box::pin(self.clone().display_media(constraints))
    }
}

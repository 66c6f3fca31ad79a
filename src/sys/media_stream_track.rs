use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use tracing::debug;
use uuid::Uuid;

/// Kind of captured media.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Advisory tag describing what a track carries.
///
/// Metadata only: it never gates delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentHint {
    Motion,
    Speech,
    Detail,
    Music,
}

impl ContentHint {
    /// Platform string of this hint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Speech => "speech",
            Self::Detail => "detail",
            Self::Music => "music",
        }
    }
}

/// Liveness of a [`MediaStreamTrack`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaStreamTrackState {
    /// Underlying device is producing media.
    Live,

    /// Hardware was released. A track never leaves this state.
    Ended,
}

/// Identifier of a single captured track.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Inner {
    id: TrackId,
    kind: MediaKind,
    enabled: Cell<bool>,
    content_hint: RefCell<Option<ContentHint>>,
    state: Cell<MediaStreamTrackState>,
}

/// Handle to a captured track.
///
/// Clones share the same underlying track, so disabling or stopping through
/// one handle is observed by every holder (the stream, the peer connection).
#[derive(Clone)]
pub struct MediaStreamTrack(Rc<Inner>);

impl MediaStreamTrack {
    pub fn new(kind: MediaKind) -> Self {
        Self(Rc::new(Inner {
            id: TrackId::random(),
            kind,
            enabled: Cell::new(true),
            content_hint: RefCell::new(None),
            state: Cell::new(MediaStreamTrackState::Live),
        }))
    }

    pub fn id(&self) -> &TrackId {
        &self.0.id
    }

    pub fn kind(&self) -> MediaKind {
        self.0.kind
    }

    pub fn enabled(&self) -> bool {
        self.0.enabled.get()
    }

    /// Mutes or unmutes the track without releasing its device.
    pub fn set_enabled(&self, enabled: bool) {
        self.0.enabled.set(enabled);
    }

    pub fn content_hint(&self) -> Option<ContentHint> {
        *self.0.content_hint.borrow()
    }

    pub fn set_content_hint(&self, hint: ContentHint) {
        *self.0.content_hint.borrow_mut() = Some(hint);
    }

    pub fn state(&self) -> MediaStreamTrackState {
        self.0.state.get()
    }

    pub fn is_live(&self) -> bool {
        self.state() == MediaStreamTrackState::Live
    }

    /// Releases the underlying device. Idempotent.
    pub fn stop(&self) {
        if self.0.state.replace(MediaStreamTrackState::Ended)
            == MediaStreamTrackState::Live
        {
            debug!(track_id = %self.0.id, kind = ?self.0.kind, "Track stopped");
        }
    }

    /// Whether both handles point to the same track.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MediaStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStreamTrack")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("enabled", &self.0.enabled.get())
            .field("content_hint", &self.content_hint())
            .field("state", &self.0.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_shared_and_idempotent() {
        let track = MediaStreamTrack::new(MediaKind::Audio);
        let handle = track.clone();

        handle.stop();
        handle.stop();

        assert!(!track.is_live());
        assert_eq!(track.state(), MediaStreamTrackState::Ended);
        assert!(track.ptr_eq(&handle));
    }

    #[test]
    fn test_new_track_is_live_and_enabled() {
        let track = MediaStreamTrack::new(MediaKind::Video);
        assert!(track.is_live());
        assert!(track.enabled());
        assert_eq!(track.content_hint(), None);

        track.set_enabled(false);
        track.set_content_hint(ContentHint::Motion);
        assert!(!track.enabled());
        assert_eq!(
            track.content_hint().map(ContentHint::as_str),
            Some("motion")
        );
    }
}

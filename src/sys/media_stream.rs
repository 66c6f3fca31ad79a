use std::{cell::RefCell, fmt, rc::Rc};

use uuid::Uuid;

use super::{MediaKind, MediaStreamTrack};

/// Identifier of a captured stream.
///
/// Every acquisition yields a new id, so peers can tell a reacquired stream
/// apart from the one it replaced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mutable collection of tracks sharing one capture session.
#[derive(Clone)]
pub struct MediaStream {
    id: StreamId,
    tracks: Rc<RefCell<Vec<MediaStreamTrack>>>,
}

impl MediaStream {
    pub fn new() -> Self {
        Self::with_tracks(Vec::new())
    }

    pub fn with_tracks(tracks: Vec<MediaStreamTrack>) -> Self {
        Self {
            id: StreamId::random(),
            tracks: Rc::new(RefCell::new(tracks)),
        }
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn tracks(&self) -> Vec<MediaStreamTrack> {
        self.tracks.borrow().clone()
    }

    pub fn audio_tracks(&self) -> Vec<MediaStreamTrack> {
        self.tracks_of(MediaKind::Audio)
    }

    pub fn video_tracks(&self) -> Vec<MediaStreamTrack> {
        self.tracks_of(MediaKind::Video)
    }

    fn tracks_of(&self, kind: MediaKind) -> Vec<MediaStreamTrack> {
        self.tracks
            .borrow()
            .iter()
            .filter(|t| t.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.borrow().is_empty()
    }

    /// Adds the track unless this stream already holds it.
    pub fn add_track(&self, track: MediaStreamTrack) {
        let mut tracks = self.tracks.borrow_mut();
        if !tracks.iter().any(|t| t.ptr_eq(&track)) {
            tracks.push(track);
        }
    }

    /// Removes the track from this stream without stopping it.
    pub fn remove_track(&self, track: &MediaStreamTrack) -> bool {
        let mut tracks = self.tracks.borrow_mut();
        let before = tracks.len();
        tracks.retain(|t| !t.ptr_eq(track));
        tracks.len() != before
    }

    /// Removes and stops every track, returning how many were released.
    pub fn release_all(&self) -> usize {
        let released: Vec<_> = self.tracks.borrow_mut().drain(..).collect();
        for track in &released {
            track.stop();
        }
        released.len()
    }
}

impl Default for MediaStream {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &*self.tracks.borrow())
            .finish()
    }
}

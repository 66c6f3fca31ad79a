use std::cell::{Cell, RefCell};

use medea_reactive::ObservableCell;
use tracing::debug;

use crate::{
    config::{MediaConfiguration, MediaToggles},
    sys::{ContentHint, MediaKind, MediaStream, StreamId, TrackId},
};

/// Where a local track comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaSourceKind {
    /// Camera or microphone.
    Device,

    /// Screen capture.
    Display,
}

impl MediaSourceKind {
    /// Content hint a track of `kind` from this source is tagged with.
    pub fn content_hint(self, kind: MediaKind) -> ContentHint {
        match (self, kind) {
            (Self::Device, MediaKind::Video) => ContentHint::Motion,
            (Self::Device, MediaKind::Audio) => ContentHint::Speech,
            (Self::Display, MediaKind::Video) => ContentHint::Detail,
            (Self::Display, MediaKind::Audio) => ContentHint::Music,
        }
    }

    fn toggles(self, config: &MediaConfiguration) -> MediaToggles {
        match self {
            Self::Device => config.user_media,
            Self::Display => config.display_media,
        }
    }
}

/// Identity of one installed track, used to correlate tracks across
/// renegotiations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackIdentity {
    pub stream_id: StreamId,
    pub track_id: TrackId,
    pub kind: MediaKind,
    pub source: MediaSourceKind,
}

/// What a reconfiguration does to one source category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reacquisition {
    /// Existing tracks stay, only enablement is re-applied.
    Keep,

    /// Existing tracks are released and fresh ones requested.
    Reacquire,

    /// Existing tracks are released and nothing replaces them.
    Release,
}

/// Per-category [`Reacquisition`] for one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReacquisitionPlan {
    pub user: Reacquisition,
    pub display: Reacquisition,
}

impl ReacquisitionPlan {
    pub fn get(&self, source: MediaSourceKind) -> Reacquisition {
        match source {
            MediaSourceKind::Device => self.user,
            MediaSourceKind::Display => self.display,
        }
    }
}

/// Canonical local streams of a call.
///
/// Holds at most one user-media and one display-media stream. Tracks of a
/// replaced stream are always released before its successor is installed.
pub struct LocalMedia {
    user: RefCell<Option<MediaStream>>,
    display: RefCell<Option<MediaStream>>,
    user_requested: Cell<Option<MediaToggles>>,
    display_requested: Cell<Option<MediaToggles>>,
    user_media_stream_id: ObservableCell<Option<StreamId>>,
    display_media_stream_id: ObservableCell<Option<StreamId>>,
}

impl LocalMedia {
    pub fn new() -> Self {
        Self {
            user: RefCell::new(None),
            display: RefCell::new(None),
            user_requested: Cell::new(None),
            display_requested: Cell::new(None),
            user_media_stream_id: ObservableCell::new(None),
            display_media_stream_id: ObservableCell::new(None),
        }
    }

    fn slot(&self, source: MediaSourceKind) -> &RefCell<Option<MediaStream>> {
        match source {
            MediaSourceKind::Device => &self.user,
            MediaSourceKind::Display => &self.display,
        }
    }

    /// Toggles the installed stream of `source` was acquired for.
    fn requested(
        &self,
        source: MediaSourceKind,
    ) -> &Cell<Option<MediaToggles>> {
        match source {
            MediaSourceKind::Device => &self.user_requested,
            MediaSourceKind::Display => &self.display_requested,
        }
    }

    fn stream_id_cell(
        &self,
        source: MediaSourceKind,
    ) -> &ObservableCell<Option<StreamId>> {
        match source {
            MediaSourceKind::Device => &self.user_media_stream_id,
            MediaSourceKind::Display => &self.display_media_stream_id,
        }
    }

    pub fn user_stream(&self) -> Option<MediaStream> {
        self.user.borrow().clone()
    }

    pub fn display_stream(&self) -> Option<MediaStream> {
        self.display.borrow().clone()
    }

    /// Id of the live user-media stream, observable.
    pub fn user_media_stream_id(&self) -> &ObservableCell<Option<StreamId>> {
        &self.user_media_stream_id
    }

    /// Id of the live display-media stream, observable.
    pub fn display_media_stream_id(
        &self,
    ) -> &ObservableCell<Option<StreamId>> {
        &self.display_media_stream_id
    }

    /// Decides which categories need fresh hardware for `config`.
    ///
    /// A category whose tracks can satisfy `config` by being enabled or
    /// disabled is kept. Audio counts as satisfied once it was requested,
    /// even if the platform answered without it, so applying the same
    /// configuration twice never reacquires anything.
    pub fn plan(&self, config: &MediaConfiguration) -> ReacquisitionPlan {
        ReacquisitionPlan {
            user: self.plan_source(MediaSourceKind::Device, config),
            display: self.plan_source(MediaSourceKind::Display, config),
        }
    }

    fn plan_source(
        &self,
        source: MediaSourceKind,
        config: &MediaConfiguration,
    ) -> Reacquisition {
        let wanted = source.toggles(config);
        if source == MediaSourceKind::Display && !wanted.video {
            return Reacquisition::Release;
        }

        let slot = self.slot(source).borrow();
        match (&*slot, self.requested(source).get()) {
            (Some(stream), Some(requested))
                if Self::is_live(stream, MediaKind::Video)
                    && (requested.audio || !wanted.audio) =>
            {
                Reacquisition::Keep
            }
            _ => Reacquisition::Reacquire,
        }
    }

    fn is_live(stream: &MediaStream, kind: MediaKind) -> bool {
        stream
            .tracks()
            .iter()
            .any(|t| t.kind() == kind && t.is_live())
    }

    /// Releases every track of `source` and forgets its stream.
    pub fn release(&self, source: MediaSourceKind) -> usize {
        let released = self
            .slot(source)
            .borrow_mut()
            .take()
            .map_or(0, |stream| stream.release_all());
        self.requested(source).set(None);
        self.stream_id_cell(source).set(None);
        if released > 0 {
            debug!(?source, released, "Released local tracks");
        }
        released
    }

    /// Installs a freshly acquired stream for `source`.
    ///
    /// Any stream still installed for `source` is released first.
    pub fn install(
        &self,
        source: MediaSourceKind,
        stream: Option<MediaStream>,
        config: &MediaConfiguration,
    ) {
        self.release(source);
        let Some(stream) = stream else {
            return;
        };

        Self::configure_tracks(&stream, source, config);
        debug!(
            ?source,
            stream_id = %stream.id(),
            tracks = stream.tracks().len(),
            "Installed local stream"
        );
        self.requested(source).set(Some(source.toggles(config)));
        self.stream_id_cell(source).set(Some(stream.id().clone()));
        *self.slot(source).borrow_mut() = Some(stream);
    }

    /// Re-applies enablement and hints to the installed stream of `source`.
    pub fn apply(&self, source: MediaSourceKind, config: &MediaConfiguration) {
        if let Some(stream) = &*self.slot(source).borrow() {
            Self::configure_tracks(stream, source, config);
        }
    }

    /// Tracks whose kind is disabled are muted, never dropped. Camera video is
    /// always captured and relies on this to stay dark when video is off.
    fn configure_tracks(
        stream: &MediaStream,
        source: MediaSourceKind,
        config: &MediaConfiguration,
    ) {
        let toggles = source.toggles(config);
        for track in stream.tracks() {
            let kind = track.kind();
            track.set_content_hint(source.content_hint(kind));
            track.set_enabled(match kind {
                MediaKind::Audio => toggles.audio,
                MediaKind::Video => toggles.video,
            });
        }
    }

    /// Releases every track of every stream.
    ///
    /// The streams stay behind as empty containers.
    pub fn teardown(&self) -> usize {
        let released: usize = [&self.user, &self.display]
            .iter()
            .filter_map(|slot| slot.borrow().clone())
            .map(|stream| stream.release_all())
            .sum();
        self.user_requested.set(None);
        self.display_requested.set(None);
        self.user_media_stream_id.set(None);
        self.display_media_stream_id.set(None);
        released
    }

    /// Identities of all installed tracks, user media first.
    pub fn identities(&self) -> Vec<TrackIdentity> {
        [MediaSourceKind::Device, MediaSourceKind::Display]
            .into_iter()
            .filter_map(|source| {
                self.slot(source)
                    .borrow()
                    .clone()
                    .map(|stream| (source, stream))
            })
            .flat_map(|(source, stream)| {
                let stream_id = stream.id().clone();
                stream.tracks().into_iter().map(move |track| TrackIdentity {
                    stream_id: stream_id.clone(),
                    track_id: track.id().clone(),
                    kind: track.kind(),
                    source,
                })
            })
            .collect()
    }
}

impl Default for LocalMedia {
    fn default() -> Self {
        Self::new()
    }
}

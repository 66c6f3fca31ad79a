mod media_devices;
mod media_stream;
mod media_stream_track;

pub use self::{
    media_devices::{
        AudioProcessing, DeviceAvailability, DisplayMediaConstraints,
        MediaDevices, UserMediaConstraints, VirtualMediaDevices,
    },
    media_stream::{MediaStream, StreamId},
    media_stream_track::{
        ContentHint, MediaKind, MediaStreamTrack, MediaStreamTrackState,
        TrackId,
    },
};

mod acquisition;
mod local;

pub use self::{
    acquisition::{AcquiredMedia, MediaAcquisition},
    local::{
        LocalMedia, MediaSourceKind, Reacquisition, ReacquisitionPlan,
        TrackIdentity,
    },
};

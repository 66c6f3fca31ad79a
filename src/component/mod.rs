mod call;
pub mod media;
mod negotiation;

pub use self::{
    call::CallMedia,
    negotiation::{AcquisitionGuard, NegotiationKind, RenegotiationTrigger},
};

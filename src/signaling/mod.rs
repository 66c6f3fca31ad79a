mod channel;
mod router;
mod subscriptions;

pub use self::{
    channel::{OutboundChannel, ReadyState, SignalingChannel},
    router::{classify, decode, SignalingMessageRouter},
    subscriptions::SubscriptionManager,
};

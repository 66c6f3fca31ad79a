//! Real-time call core of the chat client.
//!
//! * [`component`]: local capture media of a call. Acquires camera,
//!   microphone and screen, keeps the canonical local streams consistent
//!   across reconfigurations and tells the connection layer when to
//!   (re)negotiate.
//! * [`signaling`]: classifies inbound signaling frames into
//!   [`proto::SignalingMessage`]s, routes them to consumers and manages
//!   topic subscriptions.
//!
//! Everything is single-threaded: run it on a [`tokio::task::LocalSet`].

pub mod component;
pub mod config;
pub mod errors;
pub mod proto;
pub mod signaling;
pub mod sys;

pub use self::{
    component::CallMedia,
    config::{Config, MediaConfiguration},
    signaling::{SignalingMessageRouter, SubscriptionManager},
};

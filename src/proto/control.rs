use std::fmt;

use serde::Serialize;

/// Interest subscription announced over the signaling channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `room=<id>`
    pub fn room(id: &str) -> Self {
        Self::new(format!("room={id}"))
    }

    /// `user=<id>`
    pub fn user(id: &str) -> Self {
        Self::new(format!("user={id}"))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound control frame, keyed by `event_type` rather than `TYPE`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlFrame {
    OpenSubscription {
        name: Topic,
    },
    OpenSubscriptions {
        names: Vec<Topic>,
    },
    CloseSubscription {
        name: Topic,
    },
    WatchRoom {
        #[serde(rename = "ID")]
        id: String,
    },
    StopWatchingRoom {
        #[serde(rename = "ID")]
        id: String,
    },
    WatchUser {
        #[serde(rename = "ID")]
        id: String,
    },
    StopWatchingUser {
        #[serde(rename = "ID")]
        id: String,
    },
}

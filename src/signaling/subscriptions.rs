use std::{cell::RefCell, rc::Rc};

use tracing::{debug, warn};

use crate::{
    proto::{ControlFrame, Topic},
    signaling::SignalingChannel,
};

/// Topics this client announced interest in.
///
/// The local set only changes after the matching frame was handed to the
/// channel, so it never claims a subscription the server was not told about.
/// Every successful open counts as one interest in its topic; the topic is
/// withdrawn once the last interest closes.
pub struct SubscriptionManager {
    channel: Rc<dyn SignalingChannel>,
    topics: RefCell<Vec<(Topic, u32)>>,
}

impl SubscriptionManager {
    pub fn new(channel: Rc<dyn SignalingChannel>) -> Self {
        Self {
            channel,
            topics: RefCell::default(),
        }
    }

    /// Announces `topic` and adds one interest in it. The frame is sent even
    /// if already subscribed.
    pub fn open(&self, topic: Topic) -> bool {
        let frame = ControlFrame::OpenSubscription {
            name: topic.clone(),
        };
        if !self.send(&frame) {
            return false;
        }
        self.insert(topic);
        true
    }

    /// Announces every topic in a single frame.
    pub fn open_many<I>(&self, topics: I) -> bool
    where
        I: IntoIterator<Item = Topic>,
    {
        let names: Vec<_> = topics.into_iter().collect();
        let frame = ControlFrame::OpenSubscriptions {
            names: names.clone(),
        };
        if !self.send(&frame) {
            return false;
        }
        for topic in names {
            self.insert(topic);
        }
        true
    }

    /// Drops one interest in `topic`.
    ///
    /// The withdraw frame is only sent when no other interest remains.
    pub fn close(&self, topic: &Topic) -> bool {
        if self.interests(topic) > 1 {
            self.with_entry(topic, |count| *count -= 1);
            debug!(%topic, "Subscription interest dropped");
            return true;
        }

        let frame = ControlFrame::CloseSubscription {
            name: topic.clone(),
        };
        if !self.send(&frame) {
            return false;
        }
        self.topics.borrow_mut().retain(|(t, _)| t != topic);
        debug!(%topic, "Subscription closed");
        true
    }

    /// Re-announces the whole set, e.g. after the connection was
    /// re-established.
    pub fn resubscribe_all(&self) -> bool {
        let names = self.topics();
        if names.is_empty() {
            return true;
        }
        self.send(&ControlFrame::OpenSubscriptions { names })
    }

    pub fn watch_room(&self, id: &str) -> bool {
        self.send(&ControlFrame::WatchRoom { id: id.to_owned() })
    }

    pub fn stop_watching_room(&self, id: &str) -> bool {
        self.send(&ControlFrame::StopWatchingRoom { id: id.to_owned() })
    }

    pub fn watch_user(&self, id: &str) -> bool {
        self.send(&ControlFrame::WatchUser { id: id.to_owned() })
    }

    pub fn stop_watching_user(&self, id: &str) -> bool {
        self.send(&ControlFrame::StopWatchingUser { id: id.to_owned() })
    }

    /// Subscribed topics in the order they were first announced.
    pub fn topics(&self) -> Vec<Topic> {
        self.topics.borrow().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn is_subscribed(&self, topic: &Topic) -> bool {
        self.interests(topic) > 0
    }

    /// Number of open interests in `topic`.
    pub fn interests(&self, topic: &Topic) -> u32 {
        self.topics
            .borrow()
            .iter()
            .find(|(t, _)| t == topic)
            .map_or(0, |(_, count)| *count)
    }

    fn with_entry(&self, topic: &Topic, f: impl FnOnce(&mut u32)) {
        if let Some((_, count)) =
            self.topics.borrow_mut().iter_mut().find(|(t, _)| t == topic)
        {
            f(count);
        }
    }

    fn insert(&self, topic: Topic) {
        if self.is_subscribed(&topic) {
            self.with_entry(&topic, |count| *count += 1);
            return;
        }
        debug!(%topic, "Subscription opened");
        self.topics.borrow_mut().push((topic, 1));
    }

    fn send(&self, frame: &ControlFrame) -> bool {
        let encoded = match serde_json::to_string(frame) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, ?frame, "Failed to encode control frame");
                return false;
            }
        };
        match self.channel.send(encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, ?frame, "Signaling channel unavailable");
                false
            }
        }
    }
}

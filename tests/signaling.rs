#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;

use chat_call_core::{
    errors::ProtocolDecodeError,
    proto::{
        Ban, CallStatus, MessageCategory, SignalingMessage, Topic,
        WebRtcSignal,
    },
    signaling::{classify, OutboundChannel, ReadyState},
    SignalingMessageRouter, SubscriptionManager,
};
use futures::{channel::mpsc, StreamExt as _};
use serde_json::{json, Value};

type Outbound = mpsc::UnboundedReceiver<String>;

fn open_manager() -> (SubscriptionManager, Rc<OutboundChannel>, Outbound) {
    let (channel, rx) = OutboundChannel::new();
    let channel = Rc::new(channel);
    channel.set_ready_state(ReadyState::Open);
    (SubscriptionManager::new(channel.clone()), channel, rx)
}

fn sent(rx: &mut Outbound) -> Vec<Value> {
    let mut frames = Vec::new();
    while let Ok(Some(frame)) = rx.try_next() {
        frames.push(serde_json::from_str(&frame).unwrap());
    }
    frames
}

#[test]
fn opening_twice_sends_twice_but_subscribes_once() {
    let (subscriptions, _channel, mut rx) = open_manager();
    let topic = Topic::room("1");

    assert!(subscriptions.open(topic.clone()));
    assert!(subscriptions.open(topic.clone()));

    assert_eq!(
        sent(&mut rx),
        vec![
            json!({"event_type": "OPEN_SUBSCRIPTION", "name": "room=1"}),
            json!({"event_type": "OPEN_SUBSCRIPTION", "name": "room=1"}),
        ]
    );
    assert_eq!(subscriptions.topics(), vec![topic]);
}

#[test]
fn nothing_changes_while_channel_is_not_open() {
    let (subscriptions, channel, mut rx) = open_manager();
    assert!(subscriptions.open(Topic::user("7")));
    channel.set_ready_state(ReadyState::Closed);

    assert!(!subscriptions.open(Topic::room("1")));
    assert!(!subscriptions.close(&Topic::user("7")));
    assert!(!subscriptions.watch_room("1"));

    assert_eq!(subscriptions.topics(), vec![Topic::user("7")]);
    assert_eq!(sent(&mut rx).len(), 1);
}

#[test]
fn topic_is_withdrawn_only_after_last_interest_closes() {
    let (subscriptions, _channel, mut rx) = open_manager();
    let topic = Topic::room("42");

    subscriptions.open(topic.clone());
    subscriptions.open(topic.clone());
    assert_eq!(subscriptions.interests(&topic), 2);
    assert_eq!(sent(&mut rx).len(), 2);

    assert!(subscriptions.close(&topic));
    assert!(subscriptions.is_subscribed(&topic));
    assert!(sent(&mut rx).is_empty());

    assert!(subscriptions.close(&topic));
    assert!(!subscriptions.is_subscribed(&topic));
    assert_eq!(
        sent(&mut rx),
        vec![json!({"event_type": "CLOSE_SUBSCRIPTION", "name": "room=42"})]
    );
}

#[test]
fn open_many_announces_all_in_one_frame() {
    let (subscriptions, _channel, mut rx) = open_manager();
    subscriptions.open(Topic::room("1"));

    assert!(subscriptions.open_many([
        Topic::room("1"),
        Topic::room("2"),
        Topic::user("3"),
    ]));

    let frames = sent(&mut rx);
    assert_eq!(
        frames[1],
        json!({
            "event_type": "OPEN_SUBSCRIPTIONS",
            "names": ["room=1", "room=2", "user=3"],
        })
    );
    assert_eq!(
        subscriptions.topics(),
        vec![Topic::room("1"), Topic::room("2"), Topic::user("3")]
    );
}

#[test]
fn close_removes_topic_and_resubscribe_replays_the_rest() {
    let (subscriptions, _channel, mut rx) = open_manager();
    assert!(subscriptions.resubscribe_all());
    assert!(sent(&mut rx).is_empty());

    subscriptions.open_many([Topic::room("1"), Topic::room("2")]);
    assert!(subscriptions.close(&Topic::room("1")));
    assert!(!subscriptions.is_subscribed(&Topic::room("1")));
    assert!(subscriptions.resubscribe_all());

    let frames = sent(&mut rx);
    assert_eq!(
        frames[1],
        json!({"event_type": "CLOSE_SUBSCRIPTION", "name": "room=1"})
    );
    assert_eq!(
        frames[2],
        json!({"event_type": "OPEN_SUBSCRIPTIONS", "names": ["room=2"]})
    );
}

#[test]
fn watch_frames_carry_id() {
    let (subscriptions, _channel, mut rx) = open_manager();

    subscriptions.watch_room("r");
    subscriptions.stop_watching_room("r");
    subscriptions.watch_user("u");
    subscriptions.stop_watching_user("u");

    assert_eq!(
        sent(&mut rx),
        vec![
            json!({"event_type": "WATCH_ROOM", "ID": "r"}),
            json!({"event_type": "STOP_WATCHING_ROOM", "ID": "r"}),
            json!({"event_type": "WATCH_USER", "ID": "u"}),
            json!({"event_type": "STOP_WATCHING_USER", "ID": "u"}),
        ]
    );
    assert!(subscriptions.topics().is_empty());
}

fn frame(tag: &str, data: Value) -> String {
    json!({"TYPE": tag, "DATA": data.to_string()}).to_string()
}

#[test]
fn classifies_social_and_call_frames() {
    assert_eq!(
        classify(&frame(
            "BANNED",
            json!({"banner": "a", "banned": "b", "room_id": "r"}),
        ))
        .unwrap(),
        SignalingMessage::Banned(Ban {
            banner: "a".into(),
            banned: "b".into(),
            room_id: Some("r".into()),
        })
    );

    assert_eq!(
        classify(&frame(
            "CALL_USER_RESPONSE",
            json!({"called": "b", "caller": "a", "accept": true}),
        ))
        .unwrap(),
        SignalingMessage::CallResponse(CallStatus {
            called: "b".into(),
            caller: "a".into(),
            accept: Some(true),
        })
    );

    let offer = classify(&frame(
        "CALL_WEBRTC_OFFER_FROM_INITIATOR",
        json!({"signal": "sdp", "um_stream_id": "u1", "dm_stream_id": ""}),
    ))
    .unwrap();
    assert_eq!(
        offer,
        SignalingMessage::WebRtcOffer(WebRtcSignal {
            signal: "sdp".into(),
            um_stream_id: "u1".into(),
            dm_stream_id: String::new(),
        })
    );
    assert_eq!(offer.category(), MessageCategory::Call);

    assert_eq!(
        classify(r#"{"TYPE":"CALL_WEBRTC_REQUESTED_REINITIALIZATION"}"#)
            .unwrap(),
        SignalingMessage::ReinitializationRequested
    );
}

#[test]
fn payload_mismatch_is_a_decode_error() {
    let err = classify(&frame("BANNED", json!({"banner": 1}))).unwrap_err();

    assert!(matches!(
        err,
        ProtocolDecodeError::Payload { tag: "BANNED", .. }
    ));
}

#[tokio::test]
async fn router_delivers_only_to_matching_category() {
    let router = SignalingMessageRouter::new();
    let mut call = router.subscribe(MessageCategory::Call);
    let mut unhandled = router.subscribe(MessageCategory::Unhandled);

    assert_eq!(
        router
            .route(r#"{"TYPE":"CALL_WEBRTC_REQUESTED_REINITIALIZATION"}"#)
            .unwrap(),
        MessageCategory::Call
    );
    assert_eq!(
        router.route(r#"{"TYPE":"SOMETHING_NEW","x":1}"#).unwrap(),
        MessageCategory::Unhandled
    );
    assert_eq!(
        router
            .route(r#"{"TYPE":"RESPONSE_MESSAGE","msg":"ok","err":false}"#)
            .unwrap(),
        MessageCategory::Response
    );
    assert!(router.route("[1, 2]").is_err());

    assert_eq!(
        call.next().await.unwrap(),
        SignalingMessage::ReinitializationRequested
    );
    match unhandled.next().await.unwrap() {
        SignalingMessage::Unhandled { tag, frame } => {
            assert_eq!(tag.as_deref(), Some("SOMETHING_NEW"));
            assert_eq!(frame["x"], 1);
        }
        other => panic!("unexpected message: {other:?}"),
    }

    drop(call);
    assert_eq!(
        router.dispatch(SignalingMessage::ReinitializationRequested),
        0
    );
}

use std::{cell::RefCell, collections::HashMap};

use futures::{channel::mpsc, stream::LocalBoxStream};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    errors::ProtocolDecodeError,
    proto::{tags, MessageCategory, SignalingMessage},
};

/// Parses a frame and decodes its nested `DATA` in place.
///
/// A frame without `DATA` (or with a `null` or empty one) is terminal and
/// returned as parsed.
pub fn decode(raw: &str) -> Result<Value, ProtocolDecodeError> {
    let mut frame: Value =
        serde_json::from_str(raw).map_err(ProtocolDecodeError::Frame)?;
    let object = frame
        .as_object_mut()
        .ok_or(ProtocolDecodeError::NotAnObject)?;

    match object.get("DATA") {
        None | Some(Value::Null) => {}
        Some(Value::String(data)) if data.is_empty() => {}
        Some(Value::String(data)) => {
            let data = serde_json::from_str(data)
                .map_err(ProtocolDecodeError::Data)?;
            object.insert("DATA".to_owned(), data);
        }
        Some(_) => return Err(ProtocolDecodeError::DataNotString),
    }
    Ok(frame)
}

/// Decodes a frame and classifies it by its `TYPE` tag.
pub fn classify(raw: &str) -> Result<SignalingMessage, ProtocolDecodeError> {
    match decode(raw)? {
        Value::Object(frame) => classify_frame(frame),
        _ => Err(ProtocolDecodeError::NotAnObject),
    }
}

fn payload<T: DeserializeOwned>(
    tag: &'static str,
    data: Value,
) -> Result<T, ProtocolDecodeError> {
    serde_json::from_value(data)
        .map_err(|source| ProtocolDecodeError::Payload { tag, source })
}

/// `METHOD` and `ENTITY` of a change may sit on the outer frame next to
/// `DATA`.
fn change_payload(frame: &Map<String, Value>) -> Value {
    let mut merged = match frame.get("DATA") {
        Some(Value::Object(data)) => data.clone(),
        _ => Map::new(),
    };
    for key in ["METHOD", "ENTITY", "ID"] {
        if let Some(value) = frame.get(key) {
            merged.entry(key).or_insert_with(|| value.clone());
        }
    }
    Value::Object(merged)
}

/// Tag fields travel either inside `DATA` or flat on the frame itself.
fn tag_payload(frame: &Map<String, Value>) -> Value {
    match frame.get("DATA") {
        None | Some(Value::Null) => {}
        Some(Value::String(data)) if data.is_empty() => {}
        Some(data) => return data.clone(),
    }
    let mut flat = frame.clone();
    flat.remove("TYPE");
    flat.remove("DATA");
    Value::Object(flat)
}

fn classify_frame(
    frame: Map<String, Value>,
) -> Result<SignalingMessage, ProtocolDecodeError> {
    use SignalingMessage as M;

    let Some(tag) = frame.get("TYPE").and_then(Value::as_str) else {
        return Ok(M::Unhandled {
            tag: None,
            frame: Value::Object(frame),
        });
    };
    let data = tag_payload(&frame);

    Ok(match tag {
        tags::CHANGE => {
            M::Change(payload(tags::CHANGE, change_payload(&frame))?)
        }
        tags::OUT_ROOM_MESSAGE => {
            M::RoomMessage(payload(tags::OUT_ROOM_MESSAGE, data)?)
        }
        tags::OUT_ROOM_MESSAGE_UPDATE => {
            M::RoomMessageUpdate(payload(tags::OUT_ROOM_MESSAGE_UPDATE, data)?)
        }
        tags::OUT_ROOM_MESSAGE_DELETE => {
            M::RoomMessageDelete(payload(tags::OUT_ROOM_MESSAGE_DELETE, data)?)
        }
        tags::OUT_DIRECT_MESSAGE => {
            M::DirectMessage(payload(tags::OUT_DIRECT_MESSAGE, data)?)
        }
        tags::OUT_DIRECT_MESSAGE_UPDATE => M::DirectMessageUpdate(payload(
            tags::OUT_DIRECT_MESSAGE_UPDATE,
            data,
        )?),
        tags::OUT_DIRECT_MESSAGE_DELETE => M::DirectMessageDelete(payload(
            tags::OUT_DIRECT_MESSAGE_DELETE,
            data,
        )?),
        tags::OUT_ROOM_INVITATION => {
            M::RoomInvitation(payload(tags::OUT_ROOM_INVITATION, data)?)
        }
        tags::OUT_ROOM_INVITATION_RESPONSE => M::RoomInvitationResponse(
            payload(tags::OUT_ROOM_INVITATION_RESPONSE, data)?,
        ),
        tags::OUT_ROOM_INVITATION_DELETE => M::RoomInvitationDelete(payload(
            tags::OUT_ROOM_INVITATION_DELETE,
            data,
        )?),
        tags::OUT_FRIEND_REQUEST => {
            M::FriendRequest(payload(tags::OUT_FRIEND_REQUEST, data)?)
        }
        tags::OUT_FRIEND_REQUEST_RESPONSE => M::FriendRequestResponse(
            payload(tags::OUT_FRIEND_REQUEST_RESPONSE, data)?,
        ),
        tags::OUT_FRIEND_REQUEST_DELETE => M::FriendRequestDelete(payload(
            tags::OUT_FRIEND_REQUEST_DELETE,
            data,
        )?),
        tags::BANNED => M::Banned(payload(tags::BANNED, data)?),
        tags::UNBANNED => M::Unbanned(payload(tags::UNBANNED, data)?),
        tags::BLOCKED => M::Blocked(payload(tags::BLOCKED, data)?),
        tags::UNBLOCKED => M::Unblocked(payload(tags::UNBLOCKED, data)?),
        tags::ATTACHMENT_REQUEST => {
            M::AttachmentRequest(payload(tags::ATTACHMENT_REQUEST, data)?)
        }
        tags::ATTACHMENT_PROGRESS => {
            M::AttachmentProgress(payload(tags::ATTACHMENT_PROGRESS, data)?)
        }
        tags::ATTACHMENT_METADATA => {
            M::AttachmentMetadata(payload(tags::ATTACHMENT_METADATA, data)?)
        }
        tags::RESPONSE_MESSAGE => {
            M::Response(payload(tags::RESPONSE_MESSAGE, data)?)
        }
        tags::CALL_USER_ACKNOWLEDGE => {
            M::CallAcknowledge(payload(tags::CALL_USER_ACKNOWLEDGE, data)?)
        }
        tags::CALL_USER_RESPONSE => {
            M::CallResponse(payload(tags::CALL_USER_RESPONSE, data)?)
        }
        tags::CALL_LEFT => M::CallLeft(payload(tags::CALL_LEFT, data)?),
        tags::CALL_WEBRTC_OFFER_FROM_INITIATOR => M::WebRtcOffer(payload(
            tags::CALL_WEBRTC_OFFER_FROM_INITIATOR,
            data,
        )?),
        tags::CALL_WEBRTC_ANSWER_FROM_RECIPIENT => M::WebRtcAnswer(payload(
            tags::CALL_WEBRTC_ANSWER_FROM_RECIPIENT,
            data,
        )?),
        tags::CALL_WEBRTC_REQUESTED_REINITIALIZATION => {
            M::ReinitializationRequested
        }
        _ => {
            let tag = tag.to_owned();
            M::Unhandled {
                tag: Some(tag),
                frame: Value::Object(frame),
            }
        }
    })
}

/// Fans classified frames out to the consumers of their category.
#[derive(Default)]
pub struct SignalingMessageRouter {
    subscribers: RefCell<
        HashMap<MessageCategory, Vec<mpsc::UnboundedSender<SignalingMessage>>>,
    >,
}

impl SignalingMessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream of every routed message of `category`.
    pub fn subscribe(
        &self,
        category: MessageCategory,
    ) -> LocalBoxStream<'static, SignalingMessage> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers
            .borrow_mut()
            .entry(category)
            .or_default()
            .push(tx);
        Box::pin(rx)
    }

    /// Classifies `raw` and hands it to its consumers.
    ///
    /// Returns the classified message's category. Decode failures are
    /// returned untouched so the caller can drop the frame or disconnect.
    pub fn route(
        &self,
        raw: &str,
    ) -> Result<MessageCategory, ProtocolDecodeError> {
        let message = classify(raw)?;
        let category = message.category();
        self.dispatch(message);
        Ok(category)
    }

    /// Hands an already classified message to its consumers, returning how
    /// many received it. Dropped consumers are forgotten.
    pub fn dispatch(&self, message: SignalingMessage) -> usize {
        let category = message.category();
        if category == MessageCategory::Unhandled {
            debug!(tag = ?message.tag(), "Unhandled signaling message");
        }

        let mut subscribers = self.subscribers.borrow_mut();
        let Some(senders) = subscribers.get_mut(&category) else {
            return 0;
        };
        senders.retain(|tx| tx.unbounded_send(message.clone()).is_ok());
        senders.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use futures::StreamExt as _;
    use serde_json::json;

    use super::*;
    use crate::proto::{
        AttachmentRequest, Ban, CallStatus, ChangeEntity, ChangeMethod,
        RoomMessage,
    };

    const ROOM_MESSAGE: &str = concat!(
        r#"{"TYPE":"OUT_ROOM_MESSAGE","DATA":"{\"ID\":\"1\","#,
        r#"\"content\":\"hi\",\"author\":\"a\",\"has_attachment\":false}"}"#,
    );

    #[test]
    fn test_decode_nested_data() {
        let frame = decode(ROOM_MESSAGE).unwrap();
        assert_eq!(frame["DATA"]["content"], "hi");
        assert_eq!(frame["TYPE"], "OUT_ROOM_MESSAGE");
    }

    #[test]
    fn test_decode_without_data_is_unchanged() {
        let raw = r#"{"TYPE":"CALL_WEBRTC_REQUESTED_REINITIALIZATION","x":1}"#;
        let frame = decode(raw).unwrap();
        assert_eq!(
            frame,
            json!({"TYPE": "CALL_WEBRTC_REQUESTED_REINITIALIZATION", "x": 1})
        );
    }

    #[test]
    fn test_classify_room_message() {
        let message = classify(ROOM_MESSAGE).unwrap();
        assert_eq!(
            message,
            SignalingMessage::RoomMessage(RoomMessage {
                id: "1".into(),
                content: "hi".into(),
                author: "a".into(),
                has_attachment: false,
            })
        );
        assert_eq!(message.category(), MessageCategory::Chat);
        assert_eq!(message.tag(), Some("OUT_ROOM_MESSAGE"));
    }

    #[test]
    fn test_classify_flat_frames() {
        let banned = classify(
            r#"{"TYPE":"BANNED","banner":"a","banned":"b","room_id":"r"}"#,
        )
        .unwrap();
        assert_eq!(
            banned,
            SignalingMessage::Banned(Ban {
                banner: "a".into(),
                banned: "b".into(),
                room_id: Some("r".into()),
            })
        );

        let acknowledge = json!({
            "TYPE": "CALL_USER_ACKNOWLEDGE",
            "called": "b",
            "caller": "a",
        })
        .to_string();
        assert_eq!(
            classify(&acknowledge).unwrap(),
            SignalingMessage::CallAcknowledge(CallStatus {
                called: "b".into(),
                caller: "a".into(),
                accept: None,
            })
        );

        let message = json!({
            "TYPE": "OUT_ROOM_MESSAGE",
            "ID": "1",
            "content": "hi",
            "author": "a",
            "has_attachment": false,
            "DATA": "",
        })
        .to_string();
        assert!(matches!(
            classify(&message).unwrap(),
            SignalingMessage::RoomMessage(RoomMessage { content, .. })
                if content == "hi"
        ));

        let request = json!({
            "TYPE": "ATTACHMENT_REQUEST",
            "ID": "m1",
            "is_room": true,
        })
        .to_string();
        assert_eq!(
            classify(&request).unwrap(),
            SignalingMessage::AttachmentRequest(AttachmentRequest {
                id: "m1".into(),
                is_room: true,
            })
        );
    }

    #[test]
    fn test_classify_change_with_outer_method() {
        let raw = json!({
            "TYPE": "CHANGE",
            "METHOD": "UPDATE_IMAGE",
            "ENTITY": "USER",
            "DATA": r#"{"ID":"u1"}"#,
        })
        .to_string();

        let SignalingMessage::Change(change) = classify(&raw).unwrap() else {
            panic!("expected a change");
        };
        assert_eq!(change.method, ChangeMethod::UpdateImage);
        assert_eq!(change.entity, ChangeEntity::User);
        assert_eq!(change.id, "u1");
    }

    #[test]
    fn test_unknown_tag_is_unhandled() {
        let raw = r#"{"TYPE":"SOMETHING_NEW","DATA":"{\"a\":1}"}"#;

        let message = classify(raw).unwrap();
        assert_eq!(
            message,
            SignalingMessage::Unhandled {
                tag: Some("SOMETHING_NEW".into()),
                frame: json!({"TYPE": "SOMETHING_NEW", "DATA": {"a": 1}}),
            }
        );
        assert_eq!(message.category(), MessageCategory::Unhandled);

        let untagged = classify(r#"{"hello":"world"}"#).unwrap();
        assert!(matches!(
            untagged,
            SignalingMessage::Unhandled { tag: None, .. }
        ));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(
            classify("{not json"),
            Err(ProtocolDecodeError::Frame(_))
        ));
        assert!(matches!(
            classify(r#"{"TYPE":"OUT_ROOM_MESSAGE","DATA":"{oops"}"#),
            Err(ProtocolDecodeError::Data(_))
        ));
        assert!(matches!(
            classify(r#"{"TYPE":"OUT_ROOM_MESSAGE","DATA":{"ID":"1"}}"#),
            Err(ProtocolDecodeError::DataNotString)
        ));
        assert!(matches!(
            classify("[1,2]"),
            Err(ProtocolDecodeError::NotAnObject)
        ));
        let progress =
            json!({"TYPE": "ATTACHMENT_PROGRESS", "DATA": r#"{"ID":"1"}"#});
        assert!(matches!(
            classify(&progress.to_string()),
            Err(ProtocolDecodeError::Payload {
                tag: "ATTACHMENT_PROGRESS",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_route_to_category_subscribers() {
        let router = SignalingMessageRouter::new();
        let mut call = router.subscribe(MessageCategory::Call);
        let chat = router.subscribe(MessageCategory::Chat);
        drop(chat);

        let raw = json!({
            "TYPE": "CALL_WEBRTC_OFFER_FROM_INITIATOR",
            "DATA": json!({
                "signal": "sdp",
                "um_stream_id": "um",
                "dm_stream_id": "",
            })
            .to_string(),
        })
        .to_string();

        assert_eq!(router.route(&raw).unwrap(), MessageCategory::Call);
        let SignalingMessage::WebRtcOffer(offer) = call.next().await.unwrap()
        else {
            panic!("expected an offer");
        };
        assert_eq!(offer.signal, "sdp");
        assert_eq!(offer.um_stream_id, "um");

        assert_eq!(router.route(ROOM_MESSAGE).unwrap(), MessageCategory::Chat);
        assert_eq!(
            router.dispatch(classify(ROOM_MESSAGE).unwrap()),
            0,
            "dropped chat subscriber is pruned"
        );
    }
}

//! `DATA` payloads of inbound signaling frames.

use serde::{Deserialize, Serialize};

/// Kind of change announced by a `CHANGE` frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeMethod {
    Update,
    Insert,
    Delete,
    UpdateImage,
}

/// Entity a `CHANGE` frame refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeEntity {
    Room,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "METHOD")]
    pub method: ChangeMethod,
    #[serde(rename = "ENTITY")]
    pub entity: ChangeEntity,
    #[serde(rename = "ID")]
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub content: String,
    pub author: String,
    pub has_attachment: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessageUpdate {
    #[serde(rename = "ID")]
    pub id: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMessageDelete {
    #[serde(rename = "ID")]
    pub id: String,
}

/// Direct message create, update or delete. Deletes carry no content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub author: String,
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
}

/// Room invitation lifecycle. `accept` is set on responses only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInvitation {
    #[serde(rename = "ID")]
    pub id: String,
    pub author: String,
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<bool>,
}

/// Friend request lifecycle. `accept` is set on responses only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    #[serde(rename = "ID")]
    pub id: String,
    pub author: String,
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ban {
    pub banner: String,
    pub banned: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub blocker: String,
}

/// Server asks for an attachment upload to start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRequest {
    #[serde(rename = "ID")]
    pub id: String,
    pub is_room: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttachmentProgress {
    #[serde(rename = "ID")]
    pub id: String,
    pub ratio: f32,
    pub err: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    #[serde(rename = "ID")]
    pub id: String,
    pub meta: String,
    pub name: String,
    pub size: u64,
}

/// Generic server notice, e.g. the outcome of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub msg: String,
    pub err: bool,
}

/// Call acknowledge, response or leave notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStatus {
    pub called: String,
    pub caller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<bool>,
}

/// Relayed WebRTC session description plus the ids of the sender's streams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebRtcSignal {
    pub signal: String,
    #[serde(default)]
    pub um_stream_id: String,
    #[serde(default)]
    pub dm_stream_id: String,
}

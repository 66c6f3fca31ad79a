//! Signaling wire protocol.
//!
//! Inbound frames are JSON objects `{ TYPE, ...fields, DATA? }` where `DATA`
//! is itself a JSON-encoded string. Outbound control frames use a separate
//! schema keyed by `event_type`, see [`ControlFrame`].

mod control;
mod payload;

use serde_json::Value;

pub use self::{
    control::{ControlFrame, Topic},
    payload::{
        AttachmentMetadata, AttachmentProgress, AttachmentRequest, Ban, Block,
        CallStatus, ChangeEntity, ChangeEvent, ChangeMethod, DirectMessage,
        FriendRequest, ResponseMessage, RoomInvitation, RoomMessage,
        RoomMessageDelete, RoomMessageUpdate, WebRtcSignal,
    },
};

/// `TYPE` tags of inbound frames.
pub mod tags {
    pub const CHANGE: &str = "CHANGE";
    pub const OUT_ROOM_MESSAGE: &str = "OUT_ROOM_MESSAGE";
    pub const OUT_ROOM_MESSAGE_UPDATE: &str = "OUT_ROOM_MESSAGE_UPDATE";
    pub const OUT_ROOM_MESSAGE_DELETE: &str = "OUT_ROOM_MESSAGE_DELETE";
    pub const OUT_DIRECT_MESSAGE: &str = "OUT_DIRECT_MESSAGE";
    pub const OUT_DIRECT_MESSAGE_UPDATE: &str = "OUT_DIRECT_MESSAGE_UPDATE";
    pub const OUT_DIRECT_MESSAGE_DELETE: &str = "OUT_DIRECT_MESSAGE_DELETE";
    pub const OUT_ROOM_INVITATION: &str = "OUT_ROOM_INVITATION";
    pub const OUT_ROOM_INVITATION_RESPONSE: &str =
        "OUT_ROOM_INVITATION_RESPONSE";
    pub const OUT_ROOM_INVITATION_DELETE: &str = "OUT_ROOM_INVITATION_DELETE";
    pub const OUT_FRIEND_REQUEST: &str = "OUT_FRIEND_REQUEST";
    pub const OUT_FRIEND_REQUEST_RESPONSE: &str = "OUT_FRIEND_REQUEST_RESPONSE";
    pub const OUT_FRIEND_REQUEST_DELETE: &str = "OUT_FRIEND_REQUEST_DELETE";
    pub const BANNED: &str = "BANNED";
    pub const UNBANNED: &str = "UNBANNED";
    pub const BLOCKED: &str = "BLOCKED";
    pub const UNBLOCKED: &str = "UNBLOCKED";
    pub const ATTACHMENT_REQUEST: &str = "ATTACHMENT_REQUEST";
    pub const ATTACHMENT_PROGRESS: &str = "ATTACHMENT_PROGRESS";
    pub const ATTACHMENT_METADATA: &str = "ATTACHMENT_METADATA";
    pub const RESPONSE_MESSAGE: &str = "RESPONSE_MESSAGE";
    pub const CALL_USER_ACKNOWLEDGE: &str = "CALL_USER_ACKNOWLEDGE";
    pub const CALL_USER_RESPONSE: &str = "CALL_USER_RESPONSE";
    pub const CALL_LEFT: &str = "CALL_LEFT";
    pub const CALL_WEBRTC_OFFER_FROM_INITIATOR: &str =
        "CALL_WEBRTC_OFFER_FROM_INITIATOR";
    pub const CALL_WEBRTC_ANSWER_FROM_RECIPIENT: &str =
        "CALL_WEBRTC_ANSWER_FROM_RECIPIENT";
    pub const CALL_WEBRTC_REQUESTED_REINITIALIZATION: &str =
        "CALL_WEBRTC_REQUESTED_REINITIALIZATION";
}

/// Classified inbound signaling frame.
#[derive(Clone, Debug, PartialEq)]
pub enum SignalingMessage {
    Change(ChangeEvent),

    RoomMessage(RoomMessage),
    RoomMessageUpdate(RoomMessageUpdate),
    RoomMessageDelete(RoomMessageDelete),
    DirectMessage(DirectMessage),
    DirectMessageUpdate(DirectMessage),
    DirectMessageDelete(DirectMessage),

    RoomInvitation(RoomInvitation),
    RoomInvitationResponse(RoomInvitation),
    RoomInvitationDelete(RoomInvitation),
    FriendRequest(FriendRequest),
    FriendRequestResponse(FriendRequest),
    FriendRequestDelete(FriendRequest),
    Banned(Ban),
    Unbanned(Ban),
    Blocked(Block),
    Unblocked(Block),

    AttachmentRequest(AttachmentRequest),
    AttachmentProgress(AttachmentProgress),
    AttachmentMetadata(AttachmentMetadata),

    Response(ResponseMessage),

    CallAcknowledge(CallStatus),
    CallResponse(CallStatus),
    CallLeft(CallStatus),
    WebRtcOffer(WebRtcSignal),
    WebRtcAnswer(WebRtcSignal),
    ReinitializationRequested,

    /// Frame with a missing or unknown `TYPE`, kept decoded as received.
    Unhandled { tag: Option<String>, frame: Value },
}

/// Group of consumers a [`SignalingMessage`] is meant for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    /// Room and user entity changes.
    Change,
    /// Room and direct messages.
    Chat,
    /// Invitations, friend requests, bans and blocks.
    Social,
    Attachment,
    Response,
    /// Call engine.
    Call,
    Unhandled,
}

impl SignalingMessage {
    /// Wire tag of this message.
    pub fn tag(&self) -> Option<&str> {
        use SignalingMessage as M;

        Some(match self {
            M::Change(_) => tags::CHANGE,
            M::RoomMessage(_) => tags::OUT_ROOM_MESSAGE,
            M::RoomMessageUpdate(_) => tags::OUT_ROOM_MESSAGE_UPDATE,
            M::RoomMessageDelete(_) => tags::OUT_ROOM_MESSAGE_DELETE,
            M::DirectMessage(_) => tags::OUT_DIRECT_MESSAGE,
            M::DirectMessageUpdate(_) => tags::OUT_DIRECT_MESSAGE_UPDATE,
            M::DirectMessageDelete(_) => tags::OUT_DIRECT_MESSAGE_DELETE,
            M::RoomInvitation(_) => tags::OUT_ROOM_INVITATION,
            M::RoomInvitationResponse(_) => tags::OUT_ROOM_INVITATION_RESPONSE,
            M::RoomInvitationDelete(_) => tags::OUT_ROOM_INVITATION_DELETE,
            M::FriendRequest(_) => tags::OUT_FRIEND_REQUEST,
            M::FriendRequestResponse(_) => tags::OUT_FRIEND_REQUEST_RESPONSE,
            M::FriendRequestDelete(_) => tags::OUT_FRIEND_REQUEST_DELETE,
            M::Banned(_) => tags::BANNED,
            M::Unbanned(_) => tags::UNBANNED,
            M::Blocked(_) => tags::BLOCKED,
            M::Unblocked(_) => tags::UNBLOCKED,
            M::AttachmentRequest(_) => tags::ATTACHMENT_REQUEST,
            M::AttachmentProgress(_) => tags::ATTACHMENT_PROGRESS,
            M::AttachmentMetadata(_) => tags::ATTACHMENT_METADATA,
            M::Response(_) => tags::RESPONSE_MESSAGE,
            M::CallAcknowledge(_) => tags::CALL_USER_ACKNOWLEDGE,
            M::CallResponse(_) => tags::CALL_USER_RESPONSE,
            M::CallLeft(_) => tags::CALL_LEFT,
            M::WebRtcOffer(_) => tags::CALL_WEBRTC_OFFER_FROM_INITIATOR,
            M::WebRtcAnswer(_) => tags::CALL_WEBRTC_ANSWER_FROM_RECIPIENT,
            M::ReinitializationRequested => {
                tags::CALL_WEBRTC_REQUESTED_REINITIALIZATION
            }
            M::Unhandled { tag, .. } => return tag.as_deref(),
        })
    }

    pub fn category(&self) -> MessageCategory {
        use SignalingMessage as M;

        match self {
            M::Change(_) => MessageCategory::Change,
            M::RoomMessage(_)
            | M::RoomMessageUpdate(_)
            | M::RoomMessageDelete(_)
            | M::DirectMessage(_)
            | M::DirectMessageUpdate(_)
            | M::DirectMessageDelete(_) => MessageCategory::Chat,
            M::RoomInvitation(_)
            | M::RoomInvitationResponse(_)
            | M::RoomInvitationDelete(_)
            | M::FriendRequest(_)
            | M::FriendRequestResponse(_)
            | M::FriendRequestDelete(_)
            | M::Banned(_)
            | M::Unbanned(_)
            | M::Blocked(_)
            | M::Unblocked(_) => MessageCategory::Social,
            M::AttachmentRequest(_)
            | M::AttachmentProgress(_)
            | M::AttachmentMetadata(_) => MessageCategory::Attachment,
            M::Response(_) => MessageCategory::Response,
            M::CallAcknowledge(_)
            | M::CallResponse(_)
            | M::CallLeft(_)
            | M::WebRtcOffer(_)
            | M::WebRtcAnswer(_)
            | M::ReinitializationRequested => MessageCategory::Call,
            M::Unhandled { .. } => MessageCategory::Unhandled,
        }
    }
}

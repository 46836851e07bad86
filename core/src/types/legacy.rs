//! Request types for the form-encoded protocols (legacy and V2).

use std::collections::BTreeMap;

use crate::types::Platforms;

/// How the single `receiver_value` of a form request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverType {
    Tag,
    Alias,
    Broadcast,
    RegistrationId,
    /// Devices carrying every listed tag. V2 only.
    TagAnd,
}

impl ReceiverType {
    /// The `receiver_type` wire code, also part of the verification code.
    pub fn code(self) -> u8 {
        match self {
            ReceiverType::Tag => 2,
            ReceiverType::Alias => 3,
            ReceiverType::Broadcast => 4,
            ReceiverType::RegistrationId => 5,
            ReceiverType::TagAnd => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    #[default]
    Notification,
    /// Delivered to the app instead of the notification tray. Android only.
    CustomizedMessage,
}

impl MessageType {
    pub fn code(self) -> u8 {
        match self {
            MessageType::Notification => 1,
            MessageType::CustomizedMessage => 2,
        }
    }
}

/// Platform-agnostic notification content.
///
/// `badge` and `sound` only apply to iOS; `title` and `builder_id` only to
/// Android. A `builder_id` outside 1..=1000 is not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushMessage {
    pub content: String,
    pub custom_values: Option<BTreeMap<String, String>>,
    pub badge: i32,
    pub sound: Option<String>,
    pub title: Option<String>,
    pub builder_id: u32,
}

impl PushMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_custom_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_values
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// A complete form-protocol push: content plus targeting and delivery policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessageRequest {
    pub message: PushMessage,
    pub receiver_type: ReceiverType,
    pub receiver_value: Option<String>,
    pub message_type: MessageType,
    pub platforms: Platforms,
    pub description: Option<String>,
    /// Seconds. Values above `MAX_TIME_TO_LIVE` are clamped, zero is not sent.
    pub life_time: Option<u32>,
    pub override_message_id: Option<String>,
    /// APNs sandbox instead of production. Only sent when iOS is targeted.
    pub is_test_environment: bool,
}

impl PushMessageRequest {
    pub fn new(
        receiver_type: ReceiverType,
        receiver_value: Option<String>,
        platforms: Platforms,
        message: PushMessage,
    ) -> Self {
        Self {
            message,
            receiver_type,
            receiver_value,
            message_type: MessageType::Notification,
            platforms,
            description: None,
            life_time: None,
            override_message_id: None,
            is_test_environment: false,
        }
    }

    pub fn broadcast(platforms: Platforms, message: PushMessage) -> Self {
        Self::new(ReceiverType::Broadcast, None, platforms, message)
    }
}

//! Request types for the JSON protocol (V3).
//!
//! # Design
//! These serialize directly to the `POST /v3/push` body. Absent optional
//! fields are omitted rather than sent as `null`, and the "everyone"
//! sentinels for platform and audience serialize as the string `"all"`.

use std::collections::BTreeMap;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::types::Platforms;

pub const MAX_TAG: usize = 20;
pub const MAX_TAG_AND: usize = 20;
pub const MAX_ALIAS: usize = 1000;
pub const MAX_REGISTRATION_ID: usize = 1000;

/// Target platforms of a V3 push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformTarget {
    All,
    Only(Vec<String>),
}

impl From<Platforms> for PlatformTarget {
    fn from(platforms: Platforms) -> Self {
        PlatformTarget::Only(platforms.names().into_iter().map(str::to_string).collect())
    }
}

impl Serialize for PlatformTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlatformTarget::All => serializer.serialize_str("all"),
            PlatformTarget::Only(names) => {
                let mut seq = serializer.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(name)?;
                }
                seq.end()
            }
        }
    }
}

/// Who receives a V3 push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    All,
    Selectors(AudienceSelectors),
}

impl Audience {
    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Selectors(AudienceSelectors {
            tag: Some(tags.into_iter().map(Into::into).collect()),
            ..AudienceSelectors::default()
        })
    }

    pub fn tags_and<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Selectors(AudienceSelectors {
            tag_and: Some(tags.into_iter().map(Into::into).collect()),
            ..AudienceSelectors::default()
        })
    }

    pub fn aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Selectors(AudienceSelectors {
            alias: Some(aliases.into_iter().map(Into::into).collect()),
            ..AudienceSelectors::default()
        })
    }

    pub fn registration_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Audience::Selectors(AudienceSelectors {
            registration_id: Some(ids.into_iter().map(Into::into).collect()),
            ..AudienceSelectors::default()
        })
    }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Audience::All => serializer.serialize_str("all"),
            Audience::Selectors(selectors) => selectors.serialize(serializer),
        }
    }
}

/// Audience selectors. Every attached list narrows the audience; the
/// gateway combines them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AudienceSelectors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_and: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winphone: Option<WinPhoneNotification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IosNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WinPhoneNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "_open_page", skip_serializing_if = "Option::is_none")]
    pub open_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<BTreeMap<String, String>>,
}

/// In-app custom message, delivered to the application instead of the
/// notification tray.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomMessage {
    #[serde(rename = "msg_content")]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    /// Correlation number echoed by the gateway. Filled in from the client's
    /// send identity when left empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sendno: Option<i32>,
    /// Seconds. Unlike the form protocols, values above the ceiling are
    /// rejected rather than clamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_msg_id: Option<i64>,
    /// Left out of the body when `false`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub apns_production: bool,
}

/// A complete V3 push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JPushMessage {
    pub platform: PlatformTarget,
    pub audience: Audience,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<CustomMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
}

impl JPushMessage {
    pub fn new(platform: PlatformTarget, audience: Audience) -> Self {
        Self {
            platform,
            audience,
            notification: None,
            message: None,
            options: None,
        }
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_message(mut self, message: CustomMessage) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_sentinels_serialize_as_strings() {
        let message = JPushMessage::new(PlatformTarget::All, Audience::All);
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"platform": "all", "audience": "all"}));
    }

    #[test]
    fn selectors_omit_absent_lists() {
        let value = serde_json::to_value(Audience::tags(["beijing", "vip"])).unwrap();
        assert_eq!(value, json!({"tag": ["beijing", "vip"]}));
    }

    #[test]
    fn platform_set_converts_to_names() {
        let target = PlatformTarget::from(Platforms::ANDROID | Platforms::WINDOWS_PHONE);
        assert_eq!(serde_json::to_value(target).unwrap(), json!(["android", "winphone"]));
    }

    #[test]
    fn notification_uses_gateway_field_names() {
        let message = JPushMessage::new(PlatformTarget::All, Audience::registration_ids(["0606a164ac1"]))
            .with_notification(Notification {
                ios: Some(IosNotification {
                    badge: Some(3),
                    content_available: Some(true),
                    ..IosNotification::default()
                }),
                winphone: Some(WinPhoneNotification {
                    open_page: Some("/Page.xaml".to_string()),
                    ..WinPhoneNotification::default()
                }),
                ..Notification::default()
            })
            .with_message(CustomMessage {
                content: "payload".to_string(),
                ..CustomMessage::default()
            })
            .with_options(Options {
                time_to_live: Some(60),
                ..Options::default()
            });
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["audience"], json!({"registration_id": ["0606a164ac1"]}));
        assert_eq!(value["notification"]["ios"], json!({"badge": 3, "content-available": true}));
        assert_eq!(value["notification"]["winphone"]["_open_page"], "/Page.xaml");
        assert_eq!(value["message"], json!({"msg_content": "payload"}));
        assert_eq!(value["options"], json!({"time_to_live": 60}));
    }

    #[test]
    fn apns_production_is_sent_only_when_set() {
        let options = Options {
            apns_production: true,
            ..Options::default()
        };
        assert_eq!(serde_json::to_value(&options).unwrap(), json!({"apns_production": true}));
        assert_eq!(serde_json::to_value(Options::default()).unwrap(), json!({}));
    }
}

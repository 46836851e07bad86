//! Payload codec for the form protocols.
//!
//! Produces the JSON document carried in the `msg_content` form field, e.g.
//! `{"n_content":"hi","n_extras":{"ios":{"badge":88},"user_key":"value"}}`.
//!
//! # Design
//! `serde_json::Map` keeps keys sorted, so encoding the same message twice
//! yields byte-identical output. Custom values are copied into `n_extras`
//! first and platform blocks are merged on top, last write wins.
//!
//! When iOS is targeted, a non-blank `sound` is merged into the custom values
//! before they are copied, so it lands in the shared `n_extras` map rather
//! than the `ios` block. Without custom values there is nothing to merge into
//! and the sound is dropped. Gateway compatibility depends on this layout.

use serde_json::{json, Map, Value};

use crate::error::ValidationError;
use crate::types::legacy::PushMessage;
use crate::types::Platforms;

/// Highest Android builder id the gateway accepts.
pub const MAX_BUILDER_ID: u32 = 1000;

/// Encode `message` for the given platforms.
pub fn encode(message: &PushMessage, platforms: Platforms) -> Value {
    let targets_ios = platforms.contains(Platforms::IOS);

    let mut custom_values = message.custom_values.clone();
    if targets_ios {
        if let (Some(values), Some(sound)) = (custom_values.as_mut(), non_blank(&message.sound)) {
            values.insert("sound".to_string(), sound.to_string());
        }
    }

    let mut extras = Map::new();
    for (key, value) in custom_values.iter().flatten() {
        extras.insert(key.clone(), Value::String(value.clone()));
    }
    if targets_ios {
        extras.insert("ios".to_string(), json!({ "badge": message.badge }));
    }

    let mut result = Map::new();
    result.insert("n_content".to_string(), Value::String(message.content.clone()));
    if platforms.contains(Platforms::ANDROID) {
        if let Some(title) = non_blank(&message.title) {
            result.insert("n_title".to_string(), Value::String(title.to_string()));
        }
        if (1..=MAX_BUILDER_ID).contains(&message.builder_id) {
            result.insert("n_builder_id".to_string(), json!(message.builder_id));
        }
    }
    result.insert("n_extras".to_string(), Value::Object(extras));

    Value::Object(result)
}

/// Encode `message` and serialize it for the `msg_content` field.
pub fn encode_to_string(message: &PushMessage, platforms: Platforms) -> Result<String, ValidationError> {
    serde_json::to_string(&encode(message, platforms)).map_err(|e| ValidationError::Serialization(e.to_string()))
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> PushMessage {
        PushMessage {
            content: "hello".to_string(),
            custom_values: None,
            badge: 88,
            sound: Some("happy".to_string()),
            title: Some("hi".to_string()),
            builder_id: 2,
        }
    }

    #[test]
    fn android_gets_title_and_builder() {
        let value = encode(&message(), Platforms::ANDROID);
        assert_eq!(
            value,
            json!({"n_content": "hello", "n_title": "hi", "n_builder_id": 2, "n_extras": {}})
        );
    }

    #[test]
    fn ios_gets_badge_block_only() {
        let value = encode(&message(), Platforms::IOS);
        assert_eq!(value, json!({"n_content": "hello", "n_extras": {"ios": {"badge": 88}}}));
    }

    #[test]
    fn sound_leaks_into_custom_values_on_ios() {
        let msg = message().with_custom_value("CK1", "CV1");
        let value = encode(&msg, Platforms::ANDROID_AND_IOS);
        assert_eq!(value["n_extras"]["sound"], "happy");
        assert_eq!(value["n_extras"]["CK1"], "CV1");
        assert_eq!(value["n_extras"]["ios"], json!({"badge": 88}));
    }

    #[test]
    fn sound_ignored_without_ios() {
        let msg = message().with_custom_value("CK1", "CV1");
        let value = encode(&msg, Platforms::ANDROID);
        assert!(value["n_extras"].get("sound").is_none());
    }

    #[test]
    fn ios_block_overrides_custom_ios_key() {
        let msg = message().with_custom_value("ios", "user value");
        let value = encode(&msg, Platforms::IOS);
        assert_eq!(value["n_extras"]["ios"], json!({"badge": 88}));
    }

    #[test]
    fn builder_id_outside_range_is_dropped() {
        for builder_id in [0, 1001] {
            let msg = PushMessage { builder_id, ..message() };
            let value = encode(&msg, Platforms::ANDROID);
            assert!(value.get("n_builder_id").is_none(), "builder_id {builder_id}");
        }
        let msg = PushMessage { builder_id: 1000, ..message() };
        assert_eq!(encode(&msg, Platforms::ANDROID)["n_builder_id"], 1000);
    }

    #[test]
    fn blank_title_is_not_sent() {
        let msg = PushMessage { title: Some("   ".to_string()), ..message() };
        let value = encode(&msg, Platforms::ANDROID);
        assert!(value.get("n_title").is_none());
    }

    #[test]
    fn encoding_leaves_the_message_untouched() {
        let msg = message().with_custom_value("CK1", "CV1");
        let before = msg.clone();
        encode(&msg, Platforms::IOS);
        assert_eq!(msg, before);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn encoding_is_deterministic(
                content in ".{0,40}",
                title in proptest::option::of(".{0,20}"),
                sound in proptest::option::of("[a-z]{0,10}"),
                extras in proptest::option::of(proptest::collection::btree_map("[a-zA-Z0-9_]{1,8}", ".{0,12}", 0..8)),
                badge in any::<i32>(),
                builder_id in 0u32..1200,
                platform_bits in 0u8..8,
            ) {
                let msg = PushMessage {
                    content,
                    custom_values: extras,
                    badge,
                    sound,
                    title,
                    builder_id,
                };
                let platforms = [
                    Platforms::NONE,
                    Platforms::ANDROID,
                    Platforms::IOS,
                    Platforms::ANDROID_AND_IOS,
                    Platforms::WINDOWS_PHONE,
                    Platforms::ANDROID | Platforms::WINDOWS_PHONE,
                    Platforms::IOS | Platforms::WINDOWS_PHONE,
                    Platforms::ANDROID_AND_IOS | Platforms::WINDOWS_PHONE,
                ][platform_bits as usize];
                let first = encode_to_string(&msg, platforms).unwrap();
                let second = encode_to_string(&msg, platforms).unwrap();
                prop_assert_eq!(first, second);
            }
        }
    }
}

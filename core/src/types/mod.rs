//! Domain types shared by every protocol generation.
//!
//! # Design
//! The form-encoded generations (legacy and V2) and the JSON generation (V3)
//! describe messages differently, so their request types live in `legacy`
//! and `v3`. What comes back from the gateway is the same for all of them
//! and lives here, together with the platform set and proxy settings.

pub mod legacy;
pub mod v3;

use std::fmt;
use std::ops::BitOr;

/// Ten days, the longest time-to-live the gateway keeps a message.
pub const MAX_TIME_TO_LIVE: u32 = 10 * 24 * 60 * 60;

/// A set of target platforms, stored as the upstream bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Platforms(u8);

impl Platforms {
    pub const NONE: Platforms = Platforms(0);
    pub const ANDROID: Platforms = Platforms(1);
    pub const IOS: Platforms = Platforms(2);
    pub const WINDOWS_PHONE: Platforms = Platforms(4);
    pub const ANDROID_AND_IOS: Platforms = Platforms(1 | 2);

    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when the two sets share at least one platform.
    pub fn contains(self, other: Platforms) -> bool {
        self.0 & other.0 != 0
    }

    /// Lower-case platform names in upstream order.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Platforms::ANDROID) {
            names.push("android");
        }
        if self.contains(Platforms::IOS) {
            names.push("ios");
        }
        if self.contains(Platforms::WINDOWS_PHONE) {
            names.push("winphone");
        }
        names
    }

    /// The form-encoded `platform` field. Only android and ios are named
    /// on the form protocols.
    pub fn to_form_value(self) -> String {
        self.names()
            .into_iter()
            .filter(|name| *name != "winphone")
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl BitOr for Platforms {
    type Output = Platforms;

    fn bitor(self, rhs: Platforms) -> Platforms {
        Platforms(self.0 | rhs.0)
    }
}

/// Result classification of a push, mirroring the gateway's error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushResponseCode {
    Succeed,
    SystemInternalError,
    InternalError,
    PostOnly,
    MissingParameter,
    InvalidParameter,
    VerificationFailed,
    MessageTooLarge,
    InvalidReceiverValue,
    InvalidAppKey,
    InvalidMessageContent,
    NoTarget,
    CustomMessageUnsupportedOnIos,
    InvalidContentType,
    SensitiveContent,
    HttpsRequired,
    InternalTimeout,
    RateLimited,
    PermissionDenied,
    /// Transport failures, malformed replies and codes this client does not know.
    ServiceError,
}

impl PushResponseCode {
    /// Classify an upstream `errcode`. Unknown codes become `ServiceError`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Succeed,
            10 => Self::SystemInternalError,
            1000 => Self::InternalError,
            1001 => Self::PostOnly,
            1002 => Self::MissingParameter,
            1003 => Self::InvalidParameter,
            1004 => Self::VerificationFailed,
            1005 => Self::MessageTooLarge,
            1007 => Self::InvalidReceiverValue,
            1008 => Self::InvalidAppKey,
            1010 => Self::InvalidMessageContent,
            1011 => Self::NoTarget,
            1012 => Self::CustomMessageUnsupportedOnIos,
            1013 => Self::InvalidContentType,
            1014 => Self::SensitiveContent,
            1020 => Self::HttpsRequired,
            1030 => Self::InternalTimeout,
            2002 => Self::RateLimited,
            2003 => Self::PermissionDenied,
            _ => Self::ServiceError,
        }
    }

    /// The upstream numeric code; `ServiceError` has none and reports -1.
    pub fn code(self) -> i64 {
        match self {
            Self::Succeed => 0,
            Self::SystemInternalError => 10,
            Self::InternalError => 1000,
            Self::PostOnly => 1001,
            Self::MissingParameter => 1002,
            Self::InvalidParameter => 1003,
            Self::VerificationFailed => 1004,
            Self::MessageTooLarge => 1005,
            Self::InvalidReceiverValue => 1007,
            Self::InvalidAppKey => 1008,
            Self::InvalidMessageContent => 1010,
            Self::NoTarget => 1011,
            Self::CustomMessageUnsupportedOnIos => 1012,
            Self::InvalidContentType => 1013,
            Self::SensitiveContent => 1014,
            Self::HttpsRequired => 1020,
            Self::InternalTimeout => 1030,
            Self::RateLimited => 2002,
            Self::PermissionDenied => 2003,
            Self::ServiceError => -1,
        }
    }
}

impl fmt::Display for PushResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}

/// Outcome of a send.
///
/// `message_id` and `send_identity` are only populated on `Succeed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    pub code: PushResponseCode,
    pub message: Option<String>,
    pub message_id: Option<String>,
    pub send_identity: Option<String>,
}

impl PushResponse {
    pub fn service_error(message: impl Into<String>) -> Self {
        Self {
            code: PushResponseCode::ServiceError,
            message: Some(message.into()),
            message_id: None,
            send_identity: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == PushResponseCode::Succeed
    }
}

/// Delivery counts for one message. `None` means the gateway sent no count,
/// which is different from a count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessageStatus {
    pub message_id: String,
    pub android_delivered_count: Option<u64>,
    pub apple_push_notification_delivered_count: Option<u64>,
}

/// Outbound proxy configuration.
///
/// An enabled proxy with an empty `url` falls back to the proxy configured
/// in the environment. Credentials are only used when both `user` and
/// `password` are set; otherwise the proxy is used with ambient credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxySettings {
    pub enabled: bool,
    pub url: String,
    pub user: String,
    pub password: String,
    pub domain: String,
}

impl ProxySettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            enabled: true,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.user.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((self.user.as_str(), self.password.as_str()))
        }
    }
}

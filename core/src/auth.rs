//! Send identity, verification code and HTTP Basic credentials.
//!
//! The verification code is a wire contract with the gateway: MD5 over the
//! decimal send identity, the decimal receiver type, the raw receiver value
//! and the master secret, concatenated without separators and rendered as
//! upper-case hex. The receiver value must not be URL-encoded first.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

/// 2014-01-01T00:00:00Z in milliseconds since the Unix epoch.
pub const SEND_IDENTITY_EPOCH_MILLIS: i64 = 1_388_534_400_000;

/// Milliseconds elapsed between 2014-01-01 UTC and `now`, reduced modulo
/// `i32::MAX`. Always within `0..=i32::MAX - 1`, including for instants
/// before the epoch.
pub fn derive_send_identity(now: DateTime<Utc>) -> i32 {
    let elapsed = now.timestamp_millis() - SEND_IDENTITY_EPOCH_MILLIS;
    let reduced = elapsed.rem_euclid(i64::from(i32::MAX));
    // reduced < i32::MAX, so the conversion is lossless
    reduced as i32
}

pub fn derive_verification_code(
    send_identity: i32,
    receiver_type: u8,
    receiver_value: &str,
    master_secret: &str,
) -> String {
    let input = format!("{send_identity}{receiver_type}{receiver_value}{master_secret}");
    hex::encode_upper(Md5::digest(input.as_bytes()))
}

/// `Authorization` header value: app key as user, master secret as password.
pub fn basic_auth_token(app_key: &str, master_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{app_key}:{master_secret}")))
}

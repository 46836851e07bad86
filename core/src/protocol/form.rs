//! Form-encoded generations: legacy and V2.
//!
//! Both send `POST {base}/v2/push` with an `application/x-www-form-urlencoded`
//! body built from `PushMessageRequest`. They differ only in authentication:
//! legacy signs every request with a verification code, V2 relies on HTTP
//! Basic alone.

use std::collections::BTreeMap;

use tracing::debug;
use url::form_urlencoded;

use crate::auth;
use crate::codec::{self, non_blank};
use crate::error::ValidationError;
use crate::http::{HttpMethod, HttpRequest};
use crate::protocol::{ProtocolAdapter, RequestContext};
use crate::types::legacy::{PushMessageRequest, ReceiverType};
use crate::types::{Platforms, MAX_TIME_TO_LIVE};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// First-generation protocol: form body plus per-request verification code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Legacy;

/// Form body authenticated by HTTP Basic only.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2;

impl ProtocolAdapter for Legacy {
    type Message = PushMessageRequest;

    const NAME: &'static str = "legacy";

    fn api_path(&self) -> &'static str {
        "/v2/"
    }

    fn validate(&self, message: &PushMessageRequest) -> Result<(), ValidationError> {
        match message.receiver_type {
            ReceiverType::TagAnd => Err(ValidationError::UnsupportedReceiverType {
                protocol: Self::NAME,
                code: message.receiver_type.code(),
            }),
            _ => Ok(()),
        }
    }

    fn build_send_request(
        &self,
        ctx: &RequestContext<'_>,
        message: &PushMessageRequest,
    ) -> Result<HttpRequest, ValidationError> {
        let mut fields = form_fields(ctx, message)?;
        let code = auth::derive_verification_code(
            ctx.send_identity,
            message.receiver_type.code(),
            message.receiver_value.as_deref().unwrap_or_default(),
            &ctx.credentials.master_secret,
        );
        fields.insert("verification_code", code);
        Ok(form_request(ctx, self.api_path(), &fields))
    }
}

impl ProtocolAdapter for V2 {
    type Message = PushMessageRequest;

    const NAME: &'static str = "v2";

    fn api_path(&self) -> &'static str {
        "/v2/"
    }

    fn validate(&self, _message: &PushMessageRequest) -> Result<(), ValidationError> {
        Ok(())
    }

    fn build_send_request(
        &self,
        ctx: &RequestContext<'_>,
        message: &PushMessageRequest,
    ) -> Result<HttpRequest, ValidationError> {
        let fields = form_fields(ctx, message)?;
        Ok(form_request(ctx, self.api_path(), &fields))
    }
}

/// Fields common to both generations. Inserting an existing key replaces it.
fn form_fields(
    ctx: &RequestContext<'_>,
    request: &PushMessageRequest,
) -> Result<BTreeMap<&'static str, String>, ValidationError> {
    let mut fields = BTreeMap::new();

    fields.insert("receiver_type", request.receiver_type.code().to_string());
    fields.insert("msg_type", request.message_type.code().to_string());
    fields.insert("msg_content", codec::encode_to_string(&request.message, request.platforms)?);
    fields.insert("platform", request.platforms.to_form_value());
    if request.platforms.contains(Platforms::IOS) {
        let production = if request.is_test_environment { "0" } else { "1" };
        fields.insert("apns_production", production.to_string());
    }

    if let Some(value) = non_blank(&request.receiver_value) {
        fields.insert("receiver_value", value.to_string());
    }
    if let Some(description) = non_blank(&request.description) {
        fields.insert("send_description", description.to_string());
    }
    if let Some(ttl) = request.life_time.filter(|ttl| *ttl > 0) {
        fields.insert("time_to_live", ttl.min(MAX_TIME_TO_LIVE).to_string());
    }
    if let Some(id) = non_blank(&request.override_message_id) {
        fields.insert("override_msg_id", id.to_string());
    }

    fields.insert("sendno", ctx.send_identity.to_string());
    fields.insert("app_key", ctx.credentials.app_key.clone());

    Ok(fields)
}

fn form_request(ctx: &RequestContext<'_>, api_path: &str, fields: &BTreeMap<&'static str, String>) -> HttpRequest {
    let body = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter())
        .finish();
    let url = format!("{}push", ctx.endpoint.base_url(api_path));
    debug!(%url, sendno = ctx.send_identity, fields = fields.len(), "built form push request");
    HttpRequest {
        method: HttpMethod::Post,
        url,
        headers: vec![
            ctx.auth_header(),
            ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
        ],
        body: Some(body),
        timeout: ctx.timeout,
    }
}

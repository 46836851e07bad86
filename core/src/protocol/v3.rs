//! JSON generation: `POST {base}/v3/push` with a `JPushMessage` body.

use tracing::debug;

use crate::error::ValidationError;
use crate::http::{HttpMethod, HttpRequest};
use crate::protocol::{ProtocolAdapter, RequestContext};
use crate::types::v3::{
    Audience, JPushMessage, Options, MAX_ALIAS, MAX_REGISTRATION_ID, MAX_TAG, MAX_TAG_AND,
};
use crate::types::MAX_TIME_TO_LIVE;

#[derive(Debug, Clone, Copy, Default)]
pub struct V3;

impl ProtocolAdapter for V3 {
    type Message = JPushMessage;

    const NAME: &'static str = "v3";

    fn api_path(&self) -> &'static str {
        "/v3/"
    }

    fn validate(&self, message: &JPushMessage) -> Result<(), ValidationError> {
        if let Audience::Selectors(selectors) = &message.audience {
            check_selector("tag", selectors.tag.as_deref(), MAX_TAG)?;
            check_selector("tag_and", selectors.tag_and.as_deref(), MAX_TAG_AND)?;
            check_selector("alias", selectors.alias.as_deref(), MAX_ALIAS)?;
            check_selector(
                "registration_id",
                selectors.registration_id.as_deref(),
                MAX_REGISTRATION_ID,
            )?;
        }
        if let Some(ttl) = message.options.as_ref().and_then(|o| o.time_to_live) {
            if ttl > MAX_TIME_TO_LIVE {
                return Err(ValidationError::TimeToLiveTooLong {
                    ttl,
                    max: MAX_TIME_TO_LIVE,
                });
            }
        }
        Ok(())
    }

    fn build_send_request(
        &self,
        ctx: &RequestContext<'_>,
        message: &JPushMessage,
    ) -> Result<HttpRequest, ValidationError> {
        let mut message = message.clone();
        let options = message.options.get_or_insert_with(Options::default);
        let sendno = *options.sendno.get_or_insert(ctx.send_identity);

        let body = serde_json::to_string(&message).map_err(|e| ValidationError::Serialization(e.to_string()))?;
        let url = format!("{}push", ctx.endpoint.base_url(self.api_path()));
        debug!(%url, sendno, bytes = body.len(), "built json push request");

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![
                ctx.auth_header(),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
            timeout: ctx.timeout,
        })
    }
}

fn check_selector(selector: &'static str, values: Option<&[String]>, max: usize) -> Result<(), ValidationError> {
    match values {
        Some(values) if values.len() > max => Err(ValidationError::AudienceTooLarge {
            selector,
            count: values.len(),
            max,
        }),
        _ => Ok(()),
    }
}

//! Defaults Endpoint
//!
//! `GET <defaults>/{id}/` returning `{ ok, client: {...} }`.

use super::ensure_json;
use crate::error::AutofillResult;
use crate::models::{parse_defaults_body, ClientDefaults};

/// Decode a defaults response into normalized defaults
pub fn decode_defaults(status: u16, content_type: &str, body: &str) -> AutofillResult<ClientDefaults> {
    ensure_json(status, content_type, body)?;
    parse_defaults_body(body)
}

//! Search Endpoint
//!
//! `GET <search>/?q=&limit=` returning `{ results: [{id, name}], has_more }`.

use super::ensure_json;
use crate::error::{AutofillError, AutofillResult};
use crate::models::SearchPage;

/// Decode a search response. An empty `q` is a browse request; its page is
/// returned as-is.
pub fn decode_search(status: u16, content_type: &str, body: &str) -> AutofillResult<SearchPage> {
    ensure_json(status, content_type, body)?;
    serde_json::from_str(body).map_err(|e| AutofillError::format(content_type, e.to_string()))
}

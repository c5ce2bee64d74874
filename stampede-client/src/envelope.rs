//! Response envelope
//!
//! Every platform response wraps its payload as `{ code, data, meta }`.
//! Paging metadata arrives in both snake_case and camelCase depending on the
//! service version, so the fields carry serde aliases for both spellings.

use crate::errors::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Body code of a successful platform response
pub const SUCCESS_CODE: &str = "api.ok";

/// Standard response envelope
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Cursor- or offset-based paging metadata
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PageMeta {
    #[serde(default, alias = "hasNextPage")]
    pub has_next_page: bool,

    #[serde(default, alias = "endCursor")]
    pub end_cursor: Option<String>,

    #[serde(default, alias = "startCursor")]
    pub start_cursor: Option<String>,

    /// Next offset for offset-paged endpoints
    #[serde(default)]
    pub offset: Option<u64>,

    #[serde(default)]
    pub total: Option<u64>,
}

/// One page of results plus its paging metadata
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub list: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ListData<T> {
    #[serde(default)]
    list: Vec<T>,
    #[serde(default)]
    meta: PageMeta,
}

/// Parse a response body into a typed envelope
pub fn parse<T: DeserializeOwned>(body: Value) -> ClientResult<Envelope<T>> {
    serde_json::from_value(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

/// Extract `data` from a body, failing when it is absent
pub fn require_data<T: DeserializeOwned>(
    body: Option<Value>,
    context: &'static str,
) -> ClientResult<T> {
    let body = body.ok_or(ClientError::MissingData { context })?;
    parse::<T>(body)?
        .data
        .ok_or(ClientError::MissingData { context })
}

/// Extract a content-service page, where paging lives inside `data`
pub fn page_in_data<T: DeserializeOwned>(
    body: Option<Value>,
    context: &'static str,
) -> ClientResult<Page<T>> {
    let data: ListData<T> = require_data(body, context)?;
    Ok(Page {
        list: data.list,
        meta: data.meta,
    })
}

/// Extract a group-service page, where `data` is a bare array and paging
/// sits beside it in the envelope
pub fn page_in_envelope<T: DeserializeOwned>(
    body: Option<Value>,
    context: &'static str,
) -> ClientResult<Page<T>> {
    let body = body.ok_or(ClientError::MissingData { context })?;
    let envelope = parse::<Vec<T>>(body)?;
    Ok(Page {
        list: envelope.data.unwrap_or_default(),
        meta: envelope.meta.unwrap_or_default(),
    })
}

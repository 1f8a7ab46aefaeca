//! Request builder and response parser for one backend table.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Row filters use the backend's `column=eq.value` query syntax and writes
//! ask for `return=representation`, so inserts and updates answer with the
//! stored rows, backend-assigned columns included.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::client::SupabaseClient;
use crate::error::{ApiError, ApiResult};
use crate::http::{encode_identifier, HttpMethod, HttpRequest, HttpResponse};

pub struct Table<'a, R> {
    client: &'a SupabaseClient,
    name: String,
    _row: PhantomData<fn() -> R>,
}

impl<'a, R: DeserializeOwned> Table<'a, R> {
    pub(crate) fn new(client: &'a SupabaseClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
            _row: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every row of the table, in backend order.
    pub fn build_select(&self) -> ApiResult<HttpRequest> {
        self.request(HttpMethod::Get, "select=*", None)
    }

    /// Every row, sorted by `column` (percent-encoded into the query).
    pub fn build_select_ordered(&self, column: &str, ascending: bool) -> ApiResult<HttpRequest> {
        let direction = if ascending { "asc" } else { "desc" };
        self.request(
            HttpMethod::Get,
            &format!("select=*&order={}.{direction}", encode_identifier(column)),
            None,
        )
    }

    pub fn build_get(&self, id: Uuid) -> ApiResult<HttpRequest> {
        self.request(HttpMethod::Get, &format!("select=*&id=eq.{id}"), None)
    }

    pub fn build_insert<P: Serialize>(&self, payload: &P) -> ApiResult<HttpRequest> {
        let body = to_body(payload)?;
        self.request(HttpMethod::Post, "select=*", Some(body))
    }

    pub fn build_update<P: Serialize>(&self, id: Uuid, patch: &P) -> ApiResult<HttpRequest> {
        let body = to_body(patch)?;
        self.request(HttpMethod::Patch, &format!("select=*&id=eq.{id}"), Some(body))
    }

    pub fn build_delete(&self, id: Uuid) -> ApiResult<HttpRequest> {
        self.request(HttpMethod::Delete, &format!("id=eq.{id}"), None)
    }

    pub fn parse_rows(&self, response: HttpResponse) -> ApiResult<Vec<R>> {
        check_status(&response, &[200])?;
        from_body(&response.body)
    }

    /// The single row of a filtered read. No match is `NotFound`.
    pub fn parse_one(&self, response: HttpResponse) -> ApiResult<R> {
        self.parse_rows(response)?
            .into_iter()
            .next()
            .ok_or(ApiError::NotFound)
    }

    pub fn parse_inserted(&self, response: HttpResponse) -> ApiResult<R> {
        check_status(&response, &[201])?;
        from_body::<Vec<R>>(&response.body)?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::DeserializationError("insert returned no rows".to_string()))
    }

    /// An update whose filter matched nothing is `NotFound`.
    pub fn parse_updated(&self, response: HttpResponse) -> ApiResult<R> {
        self.parse_one(response)
    }

    pub fn parse_deleted(&self, response: HttpResponse) -> ApiResult<()> {
        check_status(&response, &[200, 204])
    }

    fn request(
        &self,
        method: HttpMethod,
        query: &str,
        body: Option<String>,
    ) -> ApiResult<HttpRequest> {
        let path = format!("{}?{query}", self.client.rest_url(&self.name)?);
        let mut headers = self.client.auth_headers();
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
            headers.push(("prefer".to_string(), "return=representation".to_string()));
        }
        debug!(method = method.as_str(), %path, "built table request");
        Ok(HttpRequest {
            method,
            path,
            headers,
            body,
        })
    }
}

fn to_body<P: Serialize>(payload: &P) -> ApiResult<String> {
    serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn from_body<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> ApiResult<()> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound),
        401 | 403 => Err(ApiError::Unauthorized(response.body.clone())),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

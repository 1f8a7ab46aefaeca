//! The backend client handle and its process-wide shared instance.
//!
//! # Design
//! `SupabaseClient` holds the endpoint URL and the anon key, nothing else.
//! It performs no I/O: table handles obtained from it build `HttpRequest`
//! values and parse `HttpResponse` values, and the caller runs the
//! round-trip. The handle is immutable, so one instance serves every thread.

use std::fmt;
use std::sync::OnceLock;

use tracing::info;

use crate::config::{SupabaseConfig, ANON_KEY_VAR, URL_VAR};
use crate::error::{ApiError, ApiResult};
use crate::http::encode_identifier;
use crate::table::Table;
use crate::types::TableRow;

/// Path prefix of the table-row API on the hosted backend.
pub const REST_PREFIX: &str = "/rest/v1";

static SHARED: OnceLock<SupabaseClient> = OnceLock::new();

/// The application-wide client, built from the environment on first use.
///
/// Every call returns the same instance. Missing settings do not fail
/// here; they surface as `ApiError::MissingConfig` when a request is built.
pub fn shared() -> &'static SupabaseClient {
    SHARED.get_or_init(|| {
        let client = SupabaseClient::from_config(&SupabaseConfig::from_env());
        info!(url = %client.url, "backend client initialised");
        client
    })
}

#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseClient {
    url: String,
    anon_key: String,
}

impl fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn from_config(config: &SupabaseConfig) -> Self {
        Self::new(&config.url, &config.anon_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Typed handle on the table that stores `R`.
    pub fn table<R: TableRow>(&self) -> Table<'_, R> {
        Table::new(self, R::TABLE)
    }

    /// Untyped handle on any table; rows come back as JSON values. The name
    /// is percent-encoded when placed in the URL.
    pub fn from(&self, table: &str) -> Table<'_, serde_json::Value> {
        Table::new(self, table)
    }

    pub(crate) fn rest_url(&self, table: &str) -> ApiResult<String> {
        self.ensure_configured()?;
        Ok(format!("{}{REST_PREFIX}/{}", self.url, encode_identifier(table)))
    }

    /// Headers every request carries: the key both as `apikey` and as a
    /// bearer token for the anonymous role.
    pub(crate) fn auth_headers(&self) -> Vec<(String, String)> {
        vec![
            ("apikey".to_string(), self.anon_key.clone()),
            ("authorization".to_string(), format!("Bearer {}", self.anon_key)),
        ]
    }

    fn ensure_configured(&self) -> ApiResult<()> {
        if self.url.is_empty() {
            return Err(ApiError::MissingConfig(URL_VAR));
        }
        if self.anon_key.is_empty() {
            return Err(ApiError::MissingConfig(ANON_KEY_VAR));
        }
        Ok(())
    }
}

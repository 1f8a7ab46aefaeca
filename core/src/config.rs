//! Connection settings for the hosted backend.
//!
//! Values come from the process environment, with a `.env` file loaded
//! first when one exists. Both the plain names and the `VITE_`-prefixed
//! names used by the web frontend are recognised. Nothing is validated
//! here; an empty value is reported when the client is first used.

use tracing::warn;

pub const URL_VAR: &str = "SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
const URL_VAR_FALLBACK: &str = "VITE_SUPABASE_URL";
const ANON_KEY_VAR_FALLBACK: &str = "VITE_SUPABASE_ANON_KEY";

#[derive(Clone, PartialEq, Eq, Default)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup`, preferring the plain variable
    /// names over the `VITE_` ones. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |primary: &str, fallback: &str| {
            lookup(primary)
                .filter(|v| !v.is_empty())
                .or_else(|| lookup(fallback).filter(|v| !v.is_empty()))
                .unwrap_or_else(|| {
                    warn!(var = primary, "backend setting is not set");
                    String::new()
                })
        };

        Self {
            url: resolve(URL_VAR, URL_VAR_FALLBACK),
            anon_key: resolve(ANON_KEY_VAR, ANON_KEY_VAR_FALLBACK),
        }
    }
}

//! Typed client core for the hosted backend's table API.
//!
//! # Overview
//! One shared `SupabaseClient`, configured from the environment, plus the
//! row shapes of the `todos` and `fruit_inventory` tables. Table handles
//! build `HttpRequest` values and parse `HttpResponse` values without
//! touching the network (host-does-IO pattern).
//!
//! # Design
//! - `SupabaseClient` is immutable; `shared()` hands out one process-wide
//!   instance.
//! - Each table operation is split into `build_*` and `parse_*`, so the
//!   I/O boundary is explicit.
//! - Row types are defined independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod table;
pub mod types;

pub use client::{shared, SupabaseClient};
pub use config::SupabaseConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use table::Table;
pub use types::{
    FruitInventory, MovementType, NewFruitInventory, NewTodo, TableRow, Todo, TodoPatch,
};

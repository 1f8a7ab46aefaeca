//! In-memory stand-in for the hosted backend's table API.
//!
//! Serves `/rest/v1/{table}` for the `todos` and `fruit_inventory` tables
//! with the subset of query syntax the client core emits: `col=eq.value`
//! filters, `order=col.asc|desc`, and `prefer: return=representation`.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const TABLES: [&str; 2] = ["todos", "fruit_inventory"];

pub struct Backend {
    anon_key: String,
    tables: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
}

pub type Db = Arc<Backend>;

pub fn app(anon_key: &str) -> Router {
    let tables = TABLES
        .iter()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();
    let db: Db = Arc::new(Backend {
        anon_key: anon_key.to_string(),
        tables: RwLock::new(tables),
    });
    Router::new()
        .route(
            "/rest/v1/{table}",
            get(select_rows)
                .post(insert_rows)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .with_state(db)
}

/// The anon key the server expects, resolved the same way as the client
/// core: `SUPABASE_ANON_KEY`, then `VITE_SUPABASE_ANON_KEY`. Empty values
/// count as missing.
pub fn resolve_anon_key<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
}

pub async fn run(listener: TcpListener, anon_key: &str) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr()?, "mock backend listening");
    axum::serve(listener, app(anon_key)).await
}

type Params = HashMap<String, String>;

/// A failed request, rendered the way the hosted backend reports errors.
#[derive(Debug)]
struct ApiFailure {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiFailure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({ "code": self.code, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

fn authorize(db: &Backend, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let supplied = headers.get("apikey").and_then(|v| v.to_str().ok());
    if supplied == Some(db.anon_key.as_str()) {
        Ok(())
    } else {
        Err(ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "PGRST301",
            "Invalid API key",
        ))
    }
}

fn unknown_table(table: &str) -> ApiFailure {
    ApiFailure::new(
        StatusCode::NOT_FOUND,
        "PGRST205",
        format!("Could not find the table 'public.{table}' in the schema cache"),
    )
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("return=representation"))
}

fn column_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `col=eq.value` pairs from the query string; `select` and `order` are not filters.
fn filters(params: &Params) -> Vec<(&str, &str)> {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != "select" && k.as_str() != "order")
        .filter_map(|(k, v)| v.strip_prefix("eq.").map(|v| (k.as_str(), v)))
        .collect()
}

fn row_matches(row: &Map<String, Value>, filters: &[(&str, &str)]) -> bool {
    filters
        .iter()
        .all(|(col, expected)| row.get(*col).map(column_text).as_deref() == Some(*expected))
}

fn sort_rows(rows: &mut [Map<String, Value>], order: Option<&String>) {
    let Some((column, direction)) = order.and_then(|o| o.split_once('.')) else {
        return;
    };
    rows.sort_by(|a, b| {
        let ordering = compare_columns(a.get(column), b.get(column));
        if direction == "desc" {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Numbers compare numerically, anything else by its text form. Missing
/// values sort first.
fn compare_columns(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (a, b) => a.map(column_text).cmp(&b.map(column_text)),
    }
}

fn check_constraints(table: &str, row: &Map<String, Value>) -> Result<(), ApiFailure> {
    if table == "fruit_inventory" {
        let kind = row.get("type").and_then(Value::as_str);
        if !matches!(kind, Some("in") | Some("out")) {
            return Err(ApiFailure::new(
                StatusCode::BAD_REQUEST,
                "23514",
                "new row for relation \"fruit_inventory\" violates check constraint \"fruit_inventory_type_check\"",
            ));
        }
    }
    Ok(())
}

async fn select_rows(
    State(db): State<Db>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Result<Json<Vec<Map<String, Value>>>, ApiFailure> {
    authorize(&db, &headers)?;
    let tables = db.tables.read().await;
    let rows = tables.get(&table).ok_or_else(|| unknown_table(&table))?;
    let filters = filters(&params);
    let mut selected: Vec<_> = rows.iter().filter(|r| row_matches(r, &filters)).cloned().collect();
    sort_rows(&mut selected, params.get("order"));
    debug!(%table, count = selected.len(), "select");
    Ok(Json(selected))
}

async fn insert_rows(
    State(db): State<Db>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<Response, ApiFailure> {
    authorize(&db, &headers)?;
    let objects = match input {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => Ok(obj),
                _ => Err(invalid_body()),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(invalid_body()),
    };

    let mut tables = db.tables.write().await;
    let rows = tables.get_mut(&table).ok_or_else(|| unknown_table(&table))?;

    let mut inserted = Vec::with_capacity(objects.len());
    for mut row in objects {
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        check_constraints(&table, &row)?;
        inserted.push(row);
    }
    rows.extend(inserted.iter().cloned());
    debug!(%table, count = inserted.len(), "insert");

    Ok(respond(StatusCode::CREATED, &headers, inserted))
}

async fn update_rows(
    State(db): State<Db>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
    Json(patch): Json<Map<String, Value>>,
) -> Result<Response, ApiFailure> {
    authorize(&db, &headers)?;
    let mut tables = db.tables.write().await;
    let rows = tables.get_mut(&table).ok_or_else(|| unknown_table(&table))?;
    let filters = filters(&params);

    let updated = apply_patch(&table, rows, &filters, &patch)?;
    debug!(%table, count = updated.len(), "update");

    Ok(respond(StatusCode::OK, &headers, updated))
}

/// Patch every row matching `filters`. Either all matched rows change or,
/// when any candidate violates a constraint, none do.
fn apply_patch(
    table: &str,
    rows: &mut [Map<String, Value>],
    filters: &[(&str, &str)],
    patch: &Map<String, Value>,
) -> Result<Vec<Map<String, Value>>, ApiFailure> {
    let mut candidates = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if !row_matches(row, filters) {
            continue;
        }
        let mut candidate = row.clone();
        for (k, v) in patch {
            if k != "id" && k != "created_at" {
                candidate.insert(k.clone(), v.clone());
            }
        }
        check_constraints(table, &candidate)?;
        candidates.push((index, candidate));
    }

    let mut updated = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates {
        rows[index] = candidate.clone();
        updated.push(candidate);
    }
    Ok(updated)
}

async fn delete_rows(
    State(db): State<Db>,
    Path(table): Path<String>,
    Query(params): Query<Params>,
    headers: HeaderMap,
) -> Result<Response, ApiFailure> {
    authorize(&db, &headers)?;
    let mut tables = db.tables.write().await;
    let rows = tables.get_mut(&table).ok_or_else(|| unknown_table(&table))?;
    let filters = filters(&params);

    let (removed, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|r| row_matches(r, &filters));
    *rows = kept;
    debug!(%table, count = removed.len(), "delete");

    Ok(respond(StatusCode::OK, &headers, removed))
}

fn invalid_body() -> ApiFailure {
    ApiFailure::new(
        StatusCode::BAD_REQUEST,
        "PGRST102",
        "All object keys must match",
    )
}

/// Affected rows when the caller sent `prefer: return=representation`;
/// otherwise an empty body (201 for inserts, 204 for the rest).
fn respond(status: StatusCode, headers: &HeaderMap, rows: Vec<Map<String, Value>>) -> Response {
    if wants_representation(headers) {
        return (status, Json(rows)).into_response();
    }
    if status == StatusCode::CREATED {
        status.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

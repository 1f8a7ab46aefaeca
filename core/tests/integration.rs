//! Full table lifecycle against the live mock backend.
//!
//! # Design
//! Starts the mock backend on a random port, then exercises every table
//! operation over real HTTP using ureq. Validates that request building and
//! response parsing work end-to-end for both row types.

use supabase_core::{
    ApiError, FruitInventory, HttpMethod, HttpRequest, HttpResponse, MovementType,
    NewFruitInventory, NewTodo, SupabaseClient, TableRow, Todo, TodoPatch,
};
use uuid::Uuid;

const KEY: &str = "integration-anon-key";

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => with_headers(agent.get(&req.path), &req.headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&req.path), &req.headers).call(),
        (HttpMethod::Post, body) => with_headers(agent.post(&req.path), &req.headers)
            .send(body.unwrap_or_default().as_bytes()),
        (HttpMethod::Patch, body) => with_headers(agent.patch(&req.path), &req.headers)
            .send(body.unwrap_or_default().as_bytes()),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers,
        body,
    }
}

/// Start the mock backend on a random port and return its base URL.
fn start_backend() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_postgrest::run(listener, KEY).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn todo_lifecycle() {
    let client = SupabaseClient::new(&start_backend(), KEY);
    let todos = client.table::<Todo>();

    // Empty to start with.
    let rows = todos.parse_rows(execute(todos.build_select().unwrap())).unwrap();
    assert!(rows.is_empty(), "expected empty table");

    // Insert an unowned todo; backend fills id and created_at.
    let created = todos
        .parse_inserted(execute(todos.build_insert(&NewTodo::new("Integration test")).unwrap()))
        .unwrap();
    assert_eq!(created.title, "Integration test");
    assert!(!created.completed);
    assert!(created.user_id.is_none());
    let id = created.id;

    // Insert an owned todo.
    let owner = Uuid::new_v4();
    let owned = todos
        .parse_inserted(execute(todos.build_insert(&NewTodo::new("Mine").owned_by(owner)).unwrap()))
        .unwrap();
    assert_eq!(owned.user_id, Some(owner));

    // Get by id.
    let fetched = todos.parse_one(execute(todos.build_get(id).unwrap())).unwrap();
    assert_eq!(fetched, created);

    // Update title, then completion.
    let patch = TodoPatch {
        title: Some("Updated title".to_string()),
        completed: None,
    };
    let updated = todos
        .parse_updated(execute(todos.build_update(id, &patch).unwrap()))
        .unwrap();
    assert_eq!(updated.title, "Updated title");
    assert!(!updated.completed);
    assert_eq!(updated.created_at, created.created_at);

    let patch = TodoPatch {
        title: None,
        completed: Some(true),
    };
    let updated = todos
        .parse_updated(execute(todos.build_update(id, &patch).unwrap()))
        .unwrap();
    assert_eq!(updated.title, "Updated title");
    assert!(updated.completed);

    // Two rows now.
    let rows = todos.parse_rows(execute(todos.build_select().unwrap())).unwrap();
    assert_eq!(rows.len(), 2);

    // Delete, then the row is gone.
    todos.parse_deleted(execute(todos.build_delete(id).unwrap())).unwrap();
    let err = todos.parse_one(execute(todos.build_get(id).unwrap())).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Updating a deleted row matches nothing.
    let err = todos
        .parse_updated(execute(todos.build_update(id, &TodoPatch::default()).unwrap()))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn fruit_inventory_ledger() {
    let client = SupabaseClient::new(&start_backend(), KEY);
    let ledger = client.table::<FruitInventory>();

    let movements = [
        NewFruitInventory::new("Apple", MovementType::In, 10.0, 2.5, "weekly delivery"),
        NewFruitInventory::new("Apple", MovementType::Out, 4.0, 3.0, "market stall"),
        NewFruitInventory::new("Pear", MovementType::In, 40.0, 2.5, "wholesale"),
    ];
    for movement in &movements {
        let stored = ledger
            .parse_inserted(execute(ledger.build_insert(movement).unwrap()))
            .unwrap();
        assert_eq!(stored.fruit_name, movement.fruit_name);
        assert_eq!(stored.movement, movement.movement);
        assert_eq!(stored.total_amount, movement.total_amount);
    }

    let rows = ledger
        .parse_rows(execute(ledger.build_select_ordered("total_amount", false).unwrap()))
        .unwrap();
    let totals: Vec<f64> = rows.iter().map(|r| r.total_amount).collect();
    assert_eq!(totals, vec![100.0, 25.0, 12.0]);
    assert_eq!(rows[2].movement, MovementType::Out);

    // The backend enforces the closed set of movement types too.
    let err = client
        .from(FruitInventory::TABLE)
        .parse_inserted(execute(
            client
                .from(FruitInventory::TABLE)
                .build_insert(&serde_json::json!({
                    "fruit_name": "Apple",
                    "type": "transfer",
                    "quantity": 1,
                    "unit_price": 1,
                    "total_amount": 1,
                    "description": ""
                }))
                .unwrap(),
        ))
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));
}

#[test]
fn wrong_key_is_unauthorized() {
    let client = SupabaseClient::new(&start_backend(), "not-the-key");
    let todos = client.table::<Todo>();
    let err = todos
        .parse_rows(execute(todos.build_select().unwrap()))
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

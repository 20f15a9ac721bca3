use fairway_api::app::{AppServices, build_app};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, bound to an ephemeral port.
        let app = build_app(AppServices::in_memory(4));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn golfer(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .post("/api/golfers", json!({ "name": name, "email": email }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn tee_time(&self, start_time: &str, capacity: Option<i64>) -> String {
        let (status, body) = self
            .post(
                "/api/teetimes",
                json!({ "start_time": start_time, "capacity": capacity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn book(&self, tee_time_id: &str, golfer_id: &str, players: i64) -> (StatusCode, Value) {
        self.post(
            "/api/bookings",
            json!({
                "tee_time_id": tee_time_id,
                "golfer_id": golfer_id,
                "number_of_players": players,
            }),
        )
        .await
    }

    async fn available_slots(&self, tee_time_id: &str) -> i64 {
        let (status, body) = self.get(&format!("/api/teetimes/{tee_time_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["available_slots"].as_i64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let request_id = res
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn golfer_crud_lifecycle() {
    let server = TestServer::spawn().await;

    let (status, created) = server
        .post(
            "/api/golfers",
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "555-0100",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "ada@example.com");
    assert_eq!(created["phone"], "555-0100");
    assert!(created["notes"].is_null());
    let id = created["id"].as_str().unwrap();

    let (status, updated) = server
        .put(
            &format!("/api/golfers/{id}"),
            json!({ "name": "Ada King", "email": "ada@example.com", "notes": "lefty" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Ada King");
    assert_eq!(updated["notes"], "lefty");
    assert!(updated["phone"].is_null());

    let (status, list) = server.get("/api/golfers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    assert_eq!(server.delete(&format!("/api/golfers/{id}")).await, StatusCode::NO_CONTENT);
    let (status, body) = server.get(&format!("/api/golfers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn duplicate_golfer_email_is_a_validation_error() {
    let server = TestServer::spawn().await;
    server.golfer("First", "dup@example.com").await;

    let (status, body) = server
        .post("/api/golfers", json!({ "name": "Second", "email": "dup@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn scheduling_applies_defaults_and_ignores_client_slots() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .post(
            "/api/teetimes",
            json!({ "start_time": "2030-05-01T08:00:00Z", "available_slots": 99 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["course_section"], "Main Course");
    assert_eq!(body["capacity"], 4);
    assert_eq!(body["available_slots"], 4);
    assert_eq!(body["booked_players"], 0);

    let (status, body) = server
        .post(
            "/api/teetimes",
            json!({ "start_time": "2030-05-01T08:00:00Z", "capacity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = server
        .post(
            "/api/teetimes",
            json!({ "start_time": "2030-05-01T09:00:00Z", "capacity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tee_times_are_listed_by_start_time() {
    let server = TestServer::spawn().await;
    server.tee_time("2030-05-01T10:00:00Z", None).await;
    server.tee_time("2030-05-01T08:00:00Z", None).await;
    server.tee_time("2030-05-01T09:00:00Z", None).await;

    let starts = |body: &Value| -> Vec<String> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["start_time"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, asc) = server.get("/api/teetimes").await;
    assert_eq!(status, StatusCode::OK);
    let asc = starts(&asc);
    let mut sorted = asc.clone();
    sorted.sort();
    assert_eq!(asc, sorted);

    let (status, desc) = server.get("/api/teetimes?ordering=-start_time").await;
    assert_eq!(status, StatusCode::OK);
    let mut desc = starts(&desc);
    desc.reverse();
    assert_eq!(desc, sorted);

    let (status, body) = server.get("/api/teetimes?ordering=capacity").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn booking_lifecycle_keeps_slots_consistent() {
    let server = TestServer::spawn().await;
    let golfer = server.golfer("Grace", "grace@example.com").await;
    let tee_time = server.tee_time("2030-06-01T07:30:00Z", None).await;

    let (status, booking) = server.book(&tee_time, &golfer, 3).await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["number_of_players"], 3);
    assert_eq!(booking["tee_time"]["id"], tee_time.as_str());
    assert_eq!(booking["tee_time"]["available_slots"], 1);
    assert_eq!(booking["golfer"]["id"], golfer.as_str());
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, body) = server.book(&tee_time, &golfer, 2).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "capacity_exceeded");
    assert_eq!(server.available_slots(&tee_time).await, 1);

    let (status, list) = server.get("/api/bookings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let (status, fetched) = server.get(&format!("/api/bookings/{booking_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["golfer"]["email"], "grace@example.com");

    assert_eq!(
        server.delete(&format!("/api/bookings/{booking_id}")).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(server.available_slots(&tee_time).await, 4);

    assert_eq!(
        server.delete(&format!("/api/bookings/{booking_id}")).await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(server.available_slots(&tee_time).await, 4);
}

#[tokio::test]
async fn booking_rejects_bad_input() {
    let server = TestServer::spawn().await;
    let golfer = server.golfer("Grace", "grace@example.com").await;
    let tee_time = server.tee_time("2030-06-01T07:30:00Z", None).await;

    let (status, body) = server.book(&tee_time, &golfer, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server.book("not-a-uuid", &golfer, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let missing = uuid::Uuid::now_v7().to_string();
    let (status, _) = server.book(&missing, &golfer, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.book(&tee_time, &missing, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(server.available_slots(&tee_time).await, 4);

    let (status, body) = server.get("/api/teetimes/42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn reschedule_cannot_drop_capacity_below_booked_players() {
    let server = TestServer::spawn().await;
    let golfer = server.golfer("Grace", "grace@example.com").await;
    let tee_time = server.tee_time("2030-06-01T07:30:00Z", None).await;
    let (status, _) = server.book(&tee_time, &golfer, 3).await;
    assert_eq!(status, StatusCode::CREATED);

    let path = format!("/api/teetimes/{tee_time}");
    let (status, body) = server
        .put(&path, json!({ "start_time": "2030-06-01T07:30:00Z", "capacity": 2 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server
        .put(
            &path,
            json!({
                "start_time": "2030-06-01T08:00:00Z",
                "course_section": "Back Nine",
                "capacity": 6,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["course_section"], "Back Nine");
    assert_eq!(body["capacity"], 6);
    assert_eq!(body["available_slots"], 3);
}

#[tokio::test]
async fn removing_a_tee_time_removes_its_bookings() {
    let server = TestServer::spawn().await;
    let golfer = server.golfer("Grace", "grace@example.com").await;
    let tee_time = server.tee_time("2030-06-01T07:30:00Z", None).await;
    let (_, booking) = server.book(&tee_time, &golfer, 2).await;
    let booking_id = booking["id"].as_str().unwrap();

    assert_eq!(
        server.delete(&format!("/api/teetimes/{tee_time}")).await,
        StatusCode::NO_CONTENT
    );

    let (status, _) = server.get(&format!("/api/bookings/{booking_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = server.get("/api/bookings").await;
    assert!(list["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn removing_a_golfer_releases_their_slots() {
    let server = TestServer::spawn().await;
    let leaving = server.golfer("Leaving", "leaving@example.com").await;
    let staying = server.golfer("Staying", "staying@example.com").await;
    let tee_time = server.tee_time("2030-06-01T07:30:00Z", None).await;

    server.book(&tee_time, &leaving, 2).await;
    server.book(&tee_time, &staying, 1).await;
    assert_eq!(server.available_slots(&tee_time).await, 1);

    assert_eq!(
        server.delete(&format!("/api/golfers/{leaving}")).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(server.available_slots(&tee_time).await, 3);

    let (_, list) = server.get("/api/bookings").await;
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["golfer"]["id"], staying.as_str());
}

#[tokio::test]
async fn malformed_bodies_are_json_validation_errors() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/api/bookings"))
        .json(&json!({
            "tee_time_id": "x",
            "golfer_id": "y",
            "number_of_players": "two",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server.post("/api/golfers", json!({ "name": "No Email" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = server
        .post("/api/teetimes", json!({ "start_time": "tomorrow morning" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

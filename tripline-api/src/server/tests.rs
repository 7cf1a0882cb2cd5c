use crate::server::{ServerState, Shell, app};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use tripline_store::{RecordStore, RepositorySource, StorageMode};

const USERS: &str = "id,name,password_hash,follows,created_at\n\
alice,Alice,secret,\"[\"\"bob\"\"]\",1700000000000\n\
bob,Bob,hunter2,[],1700000000000\n\
carol,Carol,pw,\"[\"\"alice\"\"]\",1700000000000\n";

const JOURNEYS: &str = "id,author_id,title,cover_img,start_date,end_date,summary,highlight_comment,folders,days,created_at,updated_at\n\
j1,alice,Alps,alps.jpg,2024-01-01,2024-01-05,Snow,Summit,\"[\"\"Europe\"\",\"\"2024\"\"]\",\"[{\"\"waypoints\"\":[1,2]},{\"\"waypoints\"\":[3]}]\",1,2\n\
j2,bob,Dunes,dunes.jpg,2024-03-01,2024-03-01,Sand,,[],[],1,2\n\
j3,carol,Fjords,,2025-01-01,2025-01-02,,,[],[],1,2\n\
j4,alice,Lakes,,2023-06-01,2023-06-01,,,,,1,2\n\
j5,ghost,Ruins,,2022-01-01,2022-01-01,,,[],[],1,2\n";

struct TestApp {
    dir: TempDir,
    router: Router,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }

    fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .map(|value| value.to_str().unwrap())
    }
}

fn seed(dir: &Path) {
    std::fs::write(dir.join("users.csv"), USERS).unwrap();
    std::fs::write(dir.join("journeys.csv"), JOURNEYS).unwrap();
    std::fs::write(dir.join("index.html"), "<html>tripline</html>").unwrap();
}

impl TestApp {
    async fn new(mode: StorageMode) -> Self {
        let dir = TempDir::new().unwrap();
        seed(dir.path());

        let repositories = RepositorySource::open(RecordStore::new(dir.path()), mode)
            .await
            .unwrap();
        let shell = Shell::new(dir.path().join("index.html"));
        let router = app(ServerState::new(repositories, shell));

        Self { dir, router }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str, user: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, user, Body::empty()))
            .await
    }

    async fn post(&self, uri: &str, user: Option<&str>, body: &str) -> TestResponse {
        self.send(request(Method::POST, uri, user, Body::from(body.to_owned())))
            .await
    }

    async fn like(&self, user: &str, post_id: &str, action: &str) -> TestResponse {
        let body = json!({ "post_id": post_id, "action": action }).to_string();
        self.post("/api/like", Some(user), &body).await
    }

    fn stored_likes(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("likes.csv")).unwrap_or_default()
    }
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::COOKIE, format!("tripline_user={user}"));
    }
    builder.body(body).unwrap()
}

fn item_ids(items: &Value) -> Vec<&str> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn login_with_stored_secret_sets_session_cookie() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app
        .post(
            "/api/login",
            None,
            r#"{"username":"alice","password":"secret"}"#,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true, "name": "Alice" }));
    assert_eq!(
        response.set_cookie(),
        Some("tripline_user=alice; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400")
    );
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let app = TestApp::new(StorageMode::Durable).await;

    for body in [
        r#"{"username":"alice","password":"wrong"}"#,
        r#"{"username":"nobody","password":"secret"}"#,
        r#"{"username":"alice"}"#,
        "",
    ] {
        let response = app.post("/api/login", None, body).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{body}");
        assert_eq!(response.json(), json!({ "error": "Invalid credentials" }));
        assert!(response.set_cookie().is_none());
    }
}

#[tokio::test]
async fn malformed_login_body_is_a_bad_request() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.post("/api/login", None, "{username:").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Bad request" }));
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.post("/api/logout", None, "").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), json!({ "ok": true }));
    assert_eq!(
        response.set_cookie(),
        Some("tripline_user=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    );
}

#[tokio::test]
async fn whoami_reports_known_sessions_only() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.get("/api/whoami", Some("alice")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json(),
        json!({ "username": "alice", "name": "Alice" })
    );

    for user in [None, Some("mallory")] {
        let response = app.get("/api/whoami", user).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), Value::Null);
    }
}

#[tokio::test]
async fn guarded_endpoints_reject_missing_sessions() {
    let app = TestApp::new(StorageMode::Durable).await;

    for uri in ["/api/feed", "/api/journey?id=j1", "/api/account", "/api/nope"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json(), json!({ "error": "Not authenticated" }));
    }

    let response = app
        .post("/api/like", None, r#"{"post_id":"j1","action":"like"}"#)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(app.stored_likes().lines().nth(1).is_none());
}

#[tokio::test]
async fn guarded_endpoints_reject_unknown_users() {
    let app = TestApp::new(StorageMode::Durable).await;

    for uri in ["/api/feed", "/api/journey?id=j1", "/api/account"] {
        let response = app.get(uri, Some("mallory")).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.json(), json!({ "error": "Unknown user" }));
    }
}

#[tokio::test]
async fn feed_shows_self_and_follows_newest_first() {
    let app = TestApp::new(StorageMode::Durable).await;
    app.like("bob", "j1", "like").await;

    let response = app.get("/api/feed", Some("alice")).await;

    assert_eq!(response.status, StatusCode::OK);
    let feed = response.json();
    assert_eq!(item_ids(&feed["items"]), ["j2", "j1", "j4"]);
    assert_eq!(feed["global_like_count"], 1);

    let alps = &feed["items"][1];
    assert_eq!(alps["author"], "alice");
    assert_eq!(alps["author_name"], "Alice");
    assert_eq!(alps["title"], "Alps");
    assert_eq!(alps["date_range"], "2024-01-01 → 2024-01-05");
    assert_eq!(alps["total_waypoints"], 3);
    assert_eq!(alps["like_count"], 1);
    assert_eq!(alps["liked_by_me"], false);
    assert_eq!(alps["folders"], json!(["Europe", "2024"]));
    assert_eq!(alps["created_at"], 1);
    assert_eq!(alps["updated_at"], 2);

    let lakes = &feed["items"][2];
    assert_eq!(lakes["date_range"], "2023-06-01");
    assert_eq!(lakes["folders"], json!([]));
    assert_eq!(lakes["days"], json!([]));
}

#[tokio::test]
async fn feed_never_includes_unfollowed_authors() {
    let app = TestApp::new(StorageMode::Durable).await;

    let bob = app.get("/api/feed", Some("bob")).await.json();
    assert_eq!(item_ids(&bob["items"]), ["j2"]);

    let carol = app.get("/api/feed", Some("carol")).await.json();
    assert_eq!(item_ids(&carol["items"]), ["j3", "j1", "j4"]);
}

#[tokio::test]
async fn journey_is_enriched_like_a_feed_item() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.get("/api/journey?id=j5", Some("bob")).await;

    assert_eq!(response.status, StatusCode::OK);
    let journey = response.json();
    assert_eq!(journey["id"], "j5");
    assert_eq!(journey["author_name"], "ghost");
    assert_eq!(journey["date_range"], "2022-01-01");
    assert_eq!(journey["total_waypoints"], 0);
    assert_eq!(journey["like_count"], 0);
    assert_eq!(journey["liked_by_me"], false);
}

#[tokio::test]
async fn unknown_journeys_are_not_found() {
    let app = TestApp::new(StorageMode::Durable).await;

    for uri in ["/api/journey?id=j9", "/api/journey"] {
        let response = app.get(uri, Some("alice")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response.json(), json!({ "error": "Not found" }));
    }
}

#[tokio::test]
async fn liking_twice_counts_once() {
    let app = TestApp::new(StorageMode::Durable).await;

    for _ in 0..2 {
        let response = app.like("alice", "j1", "like").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.json(),
            json!({
                "post_id": "j1",
                "like_count": 1,
                "liked_by_me": true,
                "global_like_count": 1,
            })
        );
    }

    let response = app.like("bob", "j1", "like").await;
    assert_eq!(response.json()["like_count"], 2);

    for _ in 0..2 {
        let response = app.like("alice", "j1", "unlike").await;
        assert_eq!(
            response.json(),
            json!({
                "post_id": "j1",
                "like_count": 1,
                "liked_by_me": false,
                "global_like_count": 1,
            })
        );
    }
}

#[tokio::test]
async fn like_validates_post_before_action() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.like("alice", "j9", "like").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Post not found" }));

    let response = app.like("alice", "j9", "love").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post("/api/like", Some("alice"), "").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.post("/api/like", Some("alice"), "null").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "Post not found" }));

    let response = app.like("alice", "j1", "love").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Invalid action" }));

    let response = app
        .post("/api/like", Some("alice"), r#"{"post_id":"j1"}"#)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app.post("/api/like", Some("alice"), "not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json(), json!({ "error": "Bad request" }));
}

#[tokio::test]
async fn durable_likes_are_written_and_shared() {
    let app = TestApp::new(StorageMode::Durable).await;
    assert_eq!(app.stored_likes(), "post_id,user_id,created_at\n");

    app.like("alice", "j2", "like").await;

    let stored = app.stored_likes();
    let rows: Vec<&str> = stored.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].starts_with("j2,alice,"));

    let feed = app.get("/api/feed", Some("alice")).await.json();
    assert_eq!(feed["items"][0]["id"], "j2");
    assert_eq!(feed["items"][0]["liked_by_me"], true);

    app.like("alice", "j2", "unlike").await;
    assert_eq!(app.stored_likes(), "post_id,user_id,created_at\n");
}

#[tokio::test]
async fn ephemeral_likes_last_one_request() {
    let app = TestApp::new(StorageMode::Ephemeral).await;

    let response = app.like("alice", "j2", "like").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["like_count"], 1);
    assert_eq!(response.json()["liked_by_me"], true);

    let journey = app.get("/api/journey?id=j2", Some("alice")).await.json();
    assert_eq!(journey["like_count"], 0);
    assert!(!app.dir.path().join("likes.csv").exists());
}

#[tokio::test]
async fn account_groups_journeys_by_folder() {
    let app = TestApp::new(StorageMode::Durable).await;
    app.like("alice", "j4", "like").await;

    let response = app.get("/api/account", Some("alice")).await;

    assert_eq!(response.status, StatusCode::OK);
    let account = response.json();
    assert_eq!(account["username"], "alice");
    assert_eq!(account["name"], "Alice");
    assert_eq!(account["global_like_count"], 1);

    let folders = account["folders"].as_object().unwrap();
    let mut labels: Vec<&str> = folders.keys().map(String::as_str).collect();
    labels.sort_unstable();
    assert_eq!(labels, ["2024", "Europe", "Uncategorized"]);
    assert_eq!(item_ids(&folders["Europe"]), ["j1"]);
    assert_eq!(item_ids(&folders["2024"]), ["j1"]);
    assert_eq!(item_ids(&folders["Uncategorized"]), ["j4"]);

    let lakes = &folders["Uncategorized"][0];
    assert_eq!(lakes["liked_by_me"], true);
    assert_eq!(lakes["like_count"], 1);
    assert!(lakes.get("author_name").is_none());
}

#[tokio::test]
async fn unknown_api_endpoints_need_a_session_first() {
    let app = TestApp::new(StorageMode::Durable).await;

    let response = app.get("/api/nope", Some("alice")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "No such endpoint" }));

    let response = app.get("/api/like", Some("alice")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json(), json!({ "error": "No such endpoint" }));

    let response = app.get("/api/login", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn app_routes_serve_the_shell() {
    let app = TestApp::new(StorageMode::Durable).await;

    for uri in ["/", "/login", "/feed", "/account", "/journey/j1"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "{uri}");
        assert_eq!(
            response.headers[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(response.text(), "<html>tripline</html>");
    }

    let response = app.get("/elsewhere", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Not found");
}

#[tokio::test]
async fn missing_shell_is_not_found() {
    let app = TestApp::new(StorageMode::Durable).await;
    std::fs::remove_file(app.dir.path().join("index.html")).unwrap();

    let response = app.get("/feed", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "index.html not found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_like_requests_leave_one_record() {
    let app = std::sync::Arc::new(TestApp::new(StorageMode::Durable).await);

    let requests: Vec<_> = (0..32)
        .map(|i| {
            let app = std::sync::Arc::clone(&app);
            let action = if i % 2 == 0 { "like" } else { "unlike" };
            tokio::spawn(async move { app.like("alice", "j1", action).await.status })
        })
        .collect();

    for request in requests {
        assert_eq!(request.await.unwrap(), StatusCode::OK);
    }

    let final_state = app.get("/api/journey?id=j1", Some("alice")).await.json();
    let like_count = final_state["like_count"].as_u64().unwrap();
    assert!(like_count <= 1);
    assert_eq!(final_state["liked_by_me"], like_count == 1);

    let stored_rows = app.stored_likes().lines().count() - 1;
    assert_eq!(stored_rows as u64, like_count);
}

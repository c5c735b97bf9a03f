use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use eventcal_client::{CalendarClient, Config, EventDraft};
use jiff::Timestamp;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn concurrent_failures_share_one_refresh() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(|req: &Request| {
            if bearer(req).as_deref() == Some("fresh-token") {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(|req: &Request| {
            if bearer(req).as_deref() == Some("fresh-token") {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "user": { "_id": "u9", "name": "Ada", "email": "ada@example.com" }
                }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/events/ev1"))
        .respond_with(|req: &Request| {
            if bearer(req).as_deref() == Some("fresh-token") {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "ok" }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    // Slow refresh keeps the flag latched long enough for every failure to
    // queue behind the first one.
    Mock::given(method("GET"))
        .and(path("/api/users/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "accessToken": "fresh-token" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CalendarClient::new(Config::from_values(server.uri(), None, None, None))
        .expect("client new failed");
    client.credentials().set("stale-token");

    let start = "2026-04-01T08:00:00Z".parse::<Timestamp>().unwrap();
    let draft = EventDraft::new("moved", start).with_description("pushed out a week");

    let (events, user, updated) = tokio::join!(
        client.events(),
        client.current_user(),
        client.update_event("ev1", &draft),
    );

    assert!(events.expect("events replay").is_empty());
    assert_eq!(user.expect("me replay").name, "Ada");
    updated.expect("update replay");

    let requests = server.received_requests().await.unwrap_or_default();
    let refresh_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/api/users/refresh")
        .count();
    assert_eq!(
        refresh_calls, 1,
        "three concurrent failures must fold into one refresh"
    );
}

#[tokio::test]
async fn flag_resets_so_a_later_failure_starts_a_new_cycle() {
    init_logging();
    let server = MockServer::start().await;

    // Tokens handed out by the refresh endpoint, newest last. Requests are
    // accepted only with the newest one.
    let issued: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let issued_events = issued.clone();
    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(move |req: &Request| {
            let current = bearer(req)
                .map(|t| issued_events.lock().unwrap().last() == Some(&t))
                .unwrap_or(false);
            if current {
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] }))
            } else {
                ResponseTemplate::new(400)
            }
        })
        .expect(4)
        .mount(&server)
        .await;

    let issued_refresh = issued.clone();
    Mock::given(method("GET"))
        .and(path("/api/users/refresh"))
        .respond_with(move |_req: &Request| {
            let mut guard = issued_refresh.lock().unwrap();
            let token = format!("t{}", guard.len() + 1);
            guard.push(token.clone());
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "accessToken": token }))
        })
        .expect(2)
        .mount(&server)
        .await;

    let client = CalendarClient::new(Config::from_values(server.uri(), None, None, None))
        .expect("client new failed");

    client.credentials().set("boot-token");
    client.events().await.expect("first cycle");
    assert_eq!(client.credentials().get().as_deref(), Some("t1"));

    client.credentials().set("stale-again");
    client.events().await.expect("second cycle");
    assert_eq!(client.credentials().get().as_deref(), Some("t2"));
}

fn bearer(req: &Request) -> Option<String> {
    req.headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

static INIT: Once = Once::new();
fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

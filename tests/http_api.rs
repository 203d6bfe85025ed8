//! End-to-end tests against a fake manifesto server
//!
//! Uses wiremock to serve the listing, search, total and session endpoints
//! and drives the reqwest transport, the feed controller and the session
//! controller through them.

use serde_json::{json, Value};
use signatory_feed::{
    feed::ControllerConfig, Enricher, FeedController, FeedError, FeedHandle, ManifestoApi,
    Provider, ReqwestTransport, SessionController, View,
};
use std::time::Duration;
use tokio::time::timeout;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(10);

fn signatories(prefix: &str, count: usize) -> Value {
    let now = chrono::Utc::now().timestamp_millis();
    let records: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "provider": "github",
                "name": format!("{prefix}-{i}"),
                "avatarUrl": format!("https://avatars.example/{prefix}-{i}.png"),
                "signed": now - (i as i64) * 3_600_000,
            })
        })
        .collect();
    json!(records)
}

fn api_for(server: &MockServer) -> ManifestoApi<ReqwestTransport> {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
    ManifestoApi::new(transport, server.uri())
}

fn feed_for(server: &MockServer) -> FeedHandle {
    let (feed, _task) =
        FeedController::spawn(api_for(server), Enricher::default(), ControllerConfig::default());
    feed
}

async fn mount_listing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/signatories/total"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 500})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/signatories"))
        .and(query_param("per_page", "30"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(signatories("p1", 30))
                .insert_header(
                    "Link",
                    format!("<{}/signatories?cursor=abc>; rel=\"next\"", server.uri()).as_str(),
                ),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/signatories"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signatories("p2", 15)))
        .mount(server)
        .await;
}

// =============================================================================
// ManifestoApi
// =============================================================================

#[tokio::test]
async fn test_api_reads_pages_and_link_header() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    let api = api_for(&server);

    assert_eq!(api.total().await.unwrap(), 500);

    let first = api.list(30).await.unwrap();
    assert_eq!(first.signatories.len(), 30);
    let cursor = first.next.expect("next page");
    assert_eq!(cursor, format!("{}/signatories?cursor=abc", server.uri()));

    let second = api.page(&cursor).await.unwrap();
    assert_eq!(second.signatories.len(), 15);
    assert_eq!(second.next, None);
}

#[tokio::test]
async fn test_api_reads_cursor_from_separate_link_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signatories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(signatories("p2", 2))
                .append_header("Link", "<https://x/p1>; rel=\"prev\"")
                .append_header("Link", "<https://x/p3>; rel=\"next\""),
        )
        .mount(&server)
        .await;

    let page = api_for(&server).list(30).await.unwrap();
    assert_eq!(page.next.as_deref(), Some("https://x/p3"));
}

#[tokio::test]
async fn test_api_keeps_page_with_odd_signed_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signatories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "a", "signed": 1_000},
            {"name": "b", "signed": null},
            {"name": "c"},
            {"name": "d", "signed": 1_410_825_600_000.0}
        ])))
        .mount(&server)
        .await;

    let page = api_for(&server).list(30).await.unwrap();
    assert_eq!(page.signatories.len(), 4);
    let records = Enricher::default().enrich_now(page.signatories);
    let names: Vec<_> = records.iter().map(|r| r.identity.display_name()).collect();
    assert_eq!(names, ["a", "d"]);
}

#[tokio::test]
async fn test_api_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    match api_for(&server).search("react").await {
        Err(FeedError::Server { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_rejects_non_array_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signatories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"oops": true})))
        .mount(&server)
        .await;

    assert!(matches!(
        api_for(&server).list(30).await,
        Err(FeedError::InvalidResponse(_))
    ));
}

// =============================================================================
// Feed controller over HTTP
// =============================================================================

#[tokio::test]
async fn test_initial_load_then_fetch_more() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    let feed = feed_for(&server);

    feed.initial_load(View::Home).await.unwrap();
    let snapshot = timeout(WAIT, feed.settled()).await.unwrap().unwrap();
    assert_eq!(snapshot.total, Some(500));
    assert_eq!(snapshot.roster.len(), 30);
    assert!(snapshot.has_more());
    assert_eq!(snapshot.roster[0].display_age, "a minute ago");
    assert_eq!(snapshot.roster[2].display_age, "2 hours ago");
    assert_eq!(snapshot.roster[0].document_version.label, "2.0");

    feed.fetch_more().await.unwrap();
    let snapshot = timeout(WAIT, feed.settled()).await.unwrap().unwrap();
    assert_eq!(snapshot.roster.len(), 45);
    assert!(!snapshot.has_more());
    assert_eq!(snapshot.roster[30].identity.display_name(), "p2-0");
}

#[tokio::test]
async fn test_full_list_view_uses_long_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/signatories"))
        .and(query_param("per_page", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signatories("all", 200)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/signatories/total"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 200})))
        .mount(&server)
        .await;

    let feed = feed_for(&server);
    feed.initial_load(View::FullList).await.unwrap();
    let snapshot = timeout(WAIT, feed.settled()).await.unwrap().unwrap();
    assert_eq!(snapshot.roster.len(), 200);
    assert!(!snapshot.has_more());
}

#[tokio::test]
async fn test_search_sends_encoded_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "jonas bonér"))
        .respond_with(ResponseTemplate::new(200).set_body_json(signatories("jonas", 1)))
        .expect(1)
        .mount(&server)
        .await;

    let feed = feed_for(&server);
    feed.set_term("jonas bonér").await.unwrap();
    let snapshot = timeout(WAIT, feed.settled()).await.unwrap().unwrap();
    assert_eq!(snapshot.roster.len(), 1);
    assert_eq!(snapshot.last_error, None);
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_sign_updates_user_and_reloads_feed() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    Mock::given(method("PUT"))
        .and(path("/user/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "provider": "twitter",
            "name": "Ada",
            "signed": chrono::Utc::now().timestamp_millis()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feed = feed_for(&server);
    let session = SessionController::new(api_for(&server), feed.clone());

    let user = session.sign().await.unwrap().expect("user");
    assert!(user.has_signed());
    assert!(session.snapshot().is_logged_in());

    let snapshot = timeout(WAIT, feed.settled()).await.unwrap().unwrap();
    assert_eq!(snapshot.total, Some(500));
    assert_eq!(snapshot.roster.len(), 30);
}

#[tokio::test]
async fn test_unsign_and_logout() {
    let server = MockServer::start().await;
    mount_listing(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/user/sign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let feed = feed_for(&server);
    let session = SessionController::new(api_for(&server), feed.clone());

    let user = session.unsign().await.unwrap().expect("user");
    assert!(!user.has_signed());

    session.logout().await.unwrap();
    assert!(!session.snapshot().is_logged_in());
}

#[tokio::test]
async fn test_login_completes_through_channel() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "provider": "github",
            "name": "Grace"
        })))
        .mount(&server)
        .await;

    let feed = feed_for(&server);
    let session = SessionController::new(api_for(&server), feed);

    let (pending, completion) = session.login(Provider::GitHub);
    assert_eq!(pending.popup.url, format!("{}/github/auth", server.uri()));
    assert_eq!(pending.popup.window_name, "reactivemanifestologin");
    assert_eq!((pending.popup.width, pending.popup.height), (1024, 640));

    tokio::spawn(async move { completion.complete() });
    let user = timeout(WAIT, session.finish_login(pending))
        .await
        .unwrap()
        .unwrap()
        .expect("logged in");
    assert_eq!(user.identity.display_name(), "Grace");
    assert!(session.snapshot().is_logged_in());
}

#[tokio::test]
async fn test_abandoned_login_is_reported() {
    let server = MockServer::start().await;
    let session = SessionController::new(api_for(&server), feed_for(&server));

    let (pending, completion) = session.login(Provider::Twitter);
    drop(completion);

    assert!(matches!(
        session.finish_login(pending).await,
        Err(FeedError::LoginAbandoned(provider)) if provider == "twitter"
    ));
    assert!(!session.snapshot().is_logged_in());
}

#[tokio::test]
async fn test_logged_out_user_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let session = SessionController::new(api_for(&server), feed_for(&server));
    assert_eq!(session.refresh_user().await.unwrap(), None);
    session.begin_signing();
    assert!(session.snapshot().signing);
    session.cancel_signing();
    assert!(!session.snapshot().signing);
}

use proofmint_server::bootstrap::build_state;
use proofmint_server::{AppConfig, AppState, StorageBackend, build_app};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(upstream: &MockServer) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.google.client_id = "client-123".into();
    cfg.google.client_secret = "google-secret".into();
    cfg.google.redirect_uri = "http://localhost:8080/oauth2callback".into();
    cfg.google.token_endpoint = format!("{}/token", upstream.uri());
    cfg.google.youtube_api_base = format!("{}/youtube/v3", upstream.uri());
    cfg.proof.endpoint = format!("{}/proof", upstream.uri());
    cfg.proof.app_id = "0xapp".into();
    cfg.proof.app_secret = "0xsecret".into();
    cfg.storage.backend = StorageBackend::Memory;
    cfg
}

async fn start_server(
    cfg: AppConfig,
) -> (String, AppState, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let state = build_state(&cfg).expect("build state");
    let app = build_app(&cfg, state.clone());

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{addr}"), state, tx, server)
}

fn channel_body() -> Value {
    json!({
        "kind": "youtube#channelListResponse",
        "items": [{
            "id": "UC1",
            "snippet": {
                "title": "Chan",
                "thumbnails": {
                    "default": {"url": "https://yt3.example/default.jpg"},
                    "high": {"url": "https://yt3.example/high.jpg"}
                }
            },
            "statistics": {"subscriberCount": "1200", "viewCount": "50000", "videoCount": "42"}
        }]
    })
}

fn proof_body() -> Value {
    json!({
        "proof": {
            "identifier": "claim1",
            "claimData": {
                "provider": "http",
                "context": "{\"extractedParameters\":{\"channelId\":\"UC1\",\"title\":\"Chan\"}}",
                "timestampS": 1_700_000_000u64
            },
            "signatures": ["0xsig"]
        }
    })
}

async fn mount_exchange(upstream: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "refresh_token": "ref1",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(upstream)
        .await;
}

async fn mount_channel(upstream: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .and(header("authorization", format!("Bearer {access_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .mount(upstream)
        .await;
}

async fn mount_proof_service(upstream: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/proof/zkfetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(proof_body()))
        .mount(upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/proof/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn health_endpoints_work() {
    let upstream = MockServer::start().await;
    let (base, _state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["service"], "Proofmint Server");
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn callback_publishes_metadata() {
    let upstream = MockServer::start().await;
    mount_exchange(&upstream, "tok1").await;
    mount_channel(&upstream, "tok1").await;
    mount_proof_service(&upstream).await;

    let dir = tempfile::tempdir().expect("tmp dir");
    let snapshot_path = dir.path().join("metadata.json");
    let mut cfg = test_config(&upstream);
    cfg.metadata.snapshot_path = Some(snapshot_path.clone());

    let (base, _state, shutdown_tx, handle) = start_server(cfg).await;
    let client = reqwest::Client::new();

    // Nothing built yet
    let resp = client.get(format!("{base}/getmetadata")).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/oauth2callback?code=abc123"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channelId"], "UC1");
    let token_uri = body["tokenURI"].as_str().unwrap();
    assert!(token_uri.starts_with("ipfs://f01551220"), "{token_uri}");

    let resp = client.get(format!("{base}/getmetadata")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let metadata = &body["metadata"];
    assert_eq!(metadata["name"], "YouTube Ownership NFT");
    assert_eq!(metadata["description"], "Proof of Owner for YouTube account: Chan");
    assert_eq!(metadata["image"], "https://yt3.example/high.jpg");
    assert_eq!(metadata["attributes"][0]["trait_type"], "Channel Name");
    assert_eq!(metadata["attributes"][0]["value"], "Chan");
    assert_eq!(metadata["attributes"][0]["verified"], true);

    let written: Value =
        serde_json::from_slice(&std::fs::read(&snapshot_path).expect("snapshot written")).unwrap();
    assert_eq!(&written, metadata);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn empty_code_makes_no_downstream_calls() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/proof/zkfetch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, _state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;
    let client = reqwest::Client::new();

    for url in [
        format!("{base}/oauth2callback?code="),
        format!("{base}/oauth2callback"),
    ] {
        let resp = client.get(url).send().await.unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.text().await.unwrap(), "No authorization code provided.");
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn null_proof_is_bad_request() {
    let upstream = MockServer::start().await;
    mount_exchange(&upstream, "tok1").await;
    mount_channel(&upstream, "tok1").await;
    Mock::given(method("POST"))
        .and(path("/proof/zkfetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"proof": null})))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/proof/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, _state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;

    let resp = reqwest::get(format!("{base}/oauth2callback?code=abc123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Failed to generate proof.");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn expired_token_is_refreshed_once() {
    let upstream = MockServer::start().await;
    mount_exchange(&upstream, "tok1").await;
    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .and(header("authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Request had invalid authentication credentials."}
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=ref1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok2",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    mount_channel(&upstream, "tok2").await;
    Mock::given(method("POST"))
        .and(path("/proof/zkfetch"))
        .and(body_partial_json(json!({
            "privateOptions": {"headers": {"Authorization": "Bearer tok2"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(proof_body()))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/proof/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .mount(&upstream)
        .await;

    let (base, state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;

    let resp = reqwest::get(format!("{base}/oauth2callback?code=abc123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["channelId"], "UC1");

    // The refreshed pair is remembered for the identity, keeping the original refresh token
    let stored = state
        .orchestrator
        .token_store()
        .get("channel:UC1")
        .await
        .expect("tokens stored for channel");
    assert_eq!(stored.access_token, "tok2");
    assert_eq!(stored.refresh_token.as_deref(), Some("ref1"));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn consent_redirect_and_state_round_trip() {
    let upstream = MockServer::start().await;
    mount_exchange(&upstream, "tok1").await;
    mount_channel(&upstream, "tok1").await;
    mount_proof_service(&upstream).await;

    let (base, state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let resp = client.get(format!("{base}/auth")).send().await.unwrap();
    assert!(resp.status().is_redirection());
    let location = resp
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    let url = reqwest::Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("accounts.google.com"));

    let query: std::collections::HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["client_id"], "client-123");
    assert_eq!(query["redirect_uri"], "http://localhost:8080/oauth2callback");
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["access_type"], "offline");
    assert_eq!(query["prompt"], "consent");
    assert_eq!(
        query["scope"],
        "https://www.googleapis.com/auth/youtube.readonly"
    );
    let consent_state = query["state"].clone();
    assert_eq!(consent_state.len(), 43);

    let resp = client
        .get(format!("{base}/oauth2callback?code=abc123&state={consent_state}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Tokens are scoped to the consent session that produced them
    let stored = state
        .orchestrator
        .token_store()
        .get(&consent_state)
        .await
        .expect("tokens stored under consent state");
    assert_eq!(stored.access_token, "tok1");
    assert!(state.consents.is_empty());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn denied_consent_is_bad_request() {
    let upstream = MockServer::start().await;
    let (base, _state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;

    let resp = reqwest::get(format!("{base}/oauth2callback?error=access_denied"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "Authorization was denied: access_denied");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn rejected_grant_is_bad_request() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, _state, shutdown_tx, handle) = start_server(test_config(&upstream)).await;

    let resp = reqwest::get(format!("{base}/oauth2callback?code=abc123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let text = resp.text().await.unwrap();
    assert!(text.starts_with("Failed to obtain access token."), "{text}");

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn publish_failure_is_server_error() {
    let upstream = MockServer::start().await;
    mount_exchange(&upstream, "tok1").await;
    mount_channel(&upstream, "tok1").await;
    mount_proof_service(&upstream).await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("authorization", "Bearer storage-key"))
        .respond_with(ResponseTemplate::new(503).set_body_string("pinning unavailable"))
        .expect(1)
        .mount(&upstream)
        .await;

    let mut cfg = test_config(&upstream);
    cfg.storage.backend = StorageBackend::Http;
    cfg.storage.upload_url = format!("{}/upload", upstream.uri());
    cfg.storage.api_key = "storage-key".into();

    let (base, state, shutdown_tx, handle) = start_server(cfg).await;

    let resp = reqwest::get(format!("{base}/oauth2callback?code=abc123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Internal Server Error.");
    assert!(state.last_metadata.load().is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

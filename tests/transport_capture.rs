//! End-to-end capture over a local mock server: the default reqwest
//! transport, scope isolation, redirect chains, and display rendering.

use reqscope::{InspectConfig, InspectedClient, InspectionPanel};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> InspectedClient {
    InspectedClient::new(InspectConfig::new()).expect("client should build")
}

#[tokio::test]
async fn json_response_is_captured_and_pretty_printed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"b":1,"a":2}"#, "application/json"))
        .mount(&server)
        .await;

    let client = client();
    let mut panel = InspectionPanel::new();
    let scope = panel.on_unit_start();

    let response = scope
        .enter(client.get(format!("{}/users", server.uri())).send())
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 200);

    panel.on_unit_finish();

    assert_eq!(panel.stats().count, 1);
    assert_eq!(panel.subtitle(), format!("1 request in {} ms", panel.stats().total_elapsed_ms));

    let call = &panel.calls()[0];
    assert_eq!(call.method().as_str(), "GET");
    assert_eq!(call.url().path(), "/users");
    assert_eq!(call.response_body_text(), "{\n  \"a\": 2,\n  \"b\": 1\n}");
    assert!(call.response_headers_text().contains("content-type: application/json"));
    assert_eq!(call.stack_text(), None);
}

#[tokio::test]
async fn redirect_chain_records_first_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let client = client();
    let mut panel = InspectionPanel::new();
    let scope = panel.on_unit_start();

    let response = scope
        .enter(client.get(format!("{}/old", server.uri())).send())
        .await
        .unwrap();

    // The caller sees the end of the chain...
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(&response.body[..], b"done");

    panel.on_unit_finish();

    // ...while the record references the first response.
    let call = &panel.calls()[0];
    assert_eq!(call.status().as_u16(), 302);
    assert_eq!(call.url().path(), "/old");
}

#[tokio::test]
async fn see_other_downgrades_post_to_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "/result"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result"))
        .respond_with(ResponseTemplate::new(200).set_body_string("created"))
        .mount(&server)
        .await;

    let client = client();
    let response = client
        .post(format!("{}/submit", server.uri()))
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(&response.body[..], b"created");
}

#[tokio::test]
async fn authorization_is_masked_and_not_forwarded_cross_host() {
    let origin = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jump"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/landing", elsewhere.uri()).as_str()),
        )
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&elsewhere)
        .await;

    let client = client();
    let mut panel = InspectionPanel::new();
    let scope = panel.on_unit_start();

    scope
        .enter(
            client
                .get(format!("{}/jump", origin.uri()))
                .bearer_auth("abc123")
                .send(),
        )
        .await
        .unwrap();

    panel.on_unit_finish();

    // Rendered request headers mask the credential.
    let call = &panel.calls()[0];
    let headers_text = call.request_headers_text();
    assert!(headers_text.contains("authorization: ******"));
    assert!(!headers_text.contains("abc123"));

    // The redirect crossed hosts, so the credential was not forwarded.
    let forwarded = elsewhere.received_requests().await.unwrap();
    assert_eq!(forwarded.len(), 1);
    assert!(forwarded[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn concurrent_units_see_only_their_own_calls() {
    let server = MockServer::start().await;
    for unit in ["alpha", "beta"] {
        Mock::given(method("GET"))
            .and(path(format!("/{unit}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(unit))
            .mount(&server)
            .await;
    }

    let client = client();
    let base = server.uri();

    let mut handles = Vec::new();
    for (unit, call_count) in [("alpha", 2usize), ("beta", 3usize)] {
        let client = client.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            let mut panel = InspectionPanel::new();
            let scope = panel.on_unit_start();
            scope
                .enter(async {
                    for _ in 0..call_count {
                        client
                            .get(format!("{base}/{unit}"))
                            .send()
                            .await
                            .unwrap();
                        tokio::task::yield_now().await;
                    }
                })
                .await;
            panel.on_unit_finish();
            (unit, call_count, panel)
        }));
    }

    for handle in handles {
        let (unit, call_count, panel) = handle.await.unwrap();
        assert_eq!(panel.stats().count, call_count);
        for call in panel.calls() {
            assert_eq!(call.url().path(), format!("/{unit}"));
        }
    }
}

#[tokio::test]
async fn transport_failure_leaves_unit_empty() {
    // An unpooled server: `MockServer::start()` hands out a pooled
    // instance whose listener survives `drop` for reuse, so its port
    // would still answer below.
    let server = MockServer::builder().start().await;
    let dead_uri = server.uri();
    drop(server);

    let client = client();
    let mut panel = InspectionPanel::new();
    let scope = panel.on_unit_start();

    let result = scope
        .enter(client.get(format!("{dead_uri}/gone")).send())
        .await;
    assert!(result.is_err());

    panel.on_unit_finish();
    assert!(panel.calls().is_empty());
    assert_eq!(panel.stats().count, 0);
}

#[tokio::test]
async fn sends_outside_any_scope_succeed_and_vanish() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/free"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client();
    let response = client
        .get(format!("{}/free", server.uri()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status.as_u16(), 200);
}

#[tokio::test]
async fn stack_capture_is_attached_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/traced"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = InspectedClient::new(InspectConfig::new().capture_stacks(true)).unwrap();
    let mut panel = InspectionPanel::new();
    let scope = panel.on_unit_start();

    scope
        .enter(client.get(format!("{}/traced", server.uri())).send())
        .await
        .unwrap();
    panel.on_unit_finish();

    let call = &panel.calls()[0];
    assert_eq!(call.stack_text().is_some(), !call.stack_frames().is_empty());
}

//! End-to-end tests against a live server
//!
//! Each test boots its own server over a throwaway store and drives the
//! HTTP API the way a real client would.

use bugtrack_e2e::TestServer;
use bugtrack_server::ApiAuth;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_bug(client: &reqwest::Client, server: &TestServer, payload: Value) -> Value {
    let resp = client
        .post(server.url("/api/bugs"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn list_bugs(client: &reqwest::Client, server: &TestServer, query: &str) -> Vec<Value> {
    let resp = client
        .get(server.url(&format!("/api/bugs{query}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

async fn stats(client: &reqwest::Client, server: &TestServer) -> Value {
    let resp = client.get(server.url("/api/stats")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "bugtrack-server");
}

#[tokio::test]
async fn create_bug_with_all_fields() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({
            "title": "Bug de test",
            "priority": "high",
            "severity": "major",
            "description": "Description détaillée du bug de test",
            "assignee": "alice",
            "environment": "staging",
            "steps": "1. Étape 1\n2. Étape 2",
            "expected": "Comportement attendu",
            "actual": "Comportement actuel"
        }),
    )
    .await;

    assert!(bug["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(bug["title"], "Bug de test");
    assert_eq!(bug["priority"], "high");
    assert_eq!(bug["severity"], "major");
    assert_eq!(bug["assignee"], "alice");
    assert_eq!(bug["status"], "open");

    // The new bug is the first card in the list.
    let bugs = list_bugs(&client, &server, "").await;
    assert_eq!(bugs[0]["id"], bug["id"]);
}

#[tokio::test]
async fn create_bug_with_mandatory_fields_only() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({
            "title": "Bug minimal",
            "priority": "low",
            "severity": "trivial",
            "description": "Description minimale"
        }),
    )
    .await;

    assert_eq!(bug["status"], "open");
    assert_eq!(bug["priority"], "low");
    assert_eq!(bug["severity"], "trivial");

    let fetched: Value = client
        .get(server.url(&format!("/api/bugs/{}", bug["id"].as_str().unwrap())))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["title"], "Bug minimal");
}

#[tokio::test]
async fn omitted_priority_and_severity_get_defaults() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({"title": "Bug à supprimer", "description": "Test"}),
    )
    .await;

    assert_eq!(bug["priority"], "medium");
    assert_eq!(bug["severity"], "minor");
    assert_eq!(bug["status"], "open");
}

#[tokio::test]
async fn create_without_title_is_rejected_and_writes_nothing() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    // Missing field entirely: rejected at the request boundary.
    let resp = client
        .post(server.url("/api/bugs"))
        .json(&json!({"description": "Description"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Present but empty: rejected by validation.
    let resp = client
        .post(server.url("/api/bugs"))
        .json(&json!({"title": "", "description": "Description"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("title"));

    assert!(list_bugs(&client, &server, "").await.is_empty());
}

#[tokio::test]
async fn unknown_assignee_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/bugs"))
        .json(&json!({
            "title": "Assigned to a ghost",
            "description": "desc",
            "assignee": "mallory"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert!(list_bugs(&client, &server, "").await.is_empty());
}

#[tokio::test]
async fn stats_track_creation_and_state_changes() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let before = stats(&client, &server).await;
    assert_eq!(before["total"], 0);

    let bug = create_bug(
        &client,
        &server,
        json!({"title": "Bug pour stats", "description": "Test des stats"}),
    )
    .await;

    let after_create = stats(&client, &server).await;
    assert_eq!(after_create["total"], 1);
    assert_eq!(after_create["open"], 1);

    // Move it through the lifecycle and watch the counts follow.
    let id = bug["id"].as_str().unwrap();
    let resp = client
        .put(server.url(&format!("/api/bugs/{id}")))
        .json(&json!({"status": "in_progress"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mid = stats(&client, &server).await;
    assert_eq!(mid["open"], 0);
    assert_eq!(mid["in_progress"], 1);

    client
        .put(server.url(&format!("/api/bugs/{id}")))
        .json(&json!({"status": "resolved"}))
        .send()
        .await
        .unwrap();

    let done = stats(&client, &server).await;
    assert_eq!(done["resolved"], 1);
    assert_eq!(done["total"], 1);
}

#[tokio::test]
async fn update_rewrites_title_and_keeps_id() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({"title": "Titre original", "description": "desc"}),
    )
    .await;
    let id = bug["id"].as_str().unwrap();

    let resp = client
        .put(server.url(&format!("/api/bugs/{id}")))
        .json(&json!({"title": "Titre modifié"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["id"], bug["id"]);
    assert_eq!(updated["title"], "Titre modifié");
    assert_eq!(updated["description"], "desc");

    let bugs = list_bugs(&client, &server, "").await;
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0]["title"], "Titre modifié");
}

#[tokio::test]
async fn update_unknown_bug_is_not_found() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .put(server.url("/api/bugs/no-such-id"))
        .json(&json!({"title": "whatever"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn confirmed_delete_removes_the_bug() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({"title": "Bug à supprimer", "description": "Test"}),
    )
    .await;
    let id = bug["id"].as_str().unwrap();

    let count_before = list_bugs(&client, &server, "").await.len();

    let resp = client
        .delete(server.url(&format!("/api/bugs/{id}?confirm=true")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let bugs = list_bugs(&client, &server, "").await;
    assert_eq!(bugs.len(), count_before - 1);

    let resp = client
        .get(server.url(&format!("/api/bugs/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn declined_delete_leaves_the_bug_in_place() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let bug = create_bug(
        &client,
        &server,
        json!({"title": "Bug à supprimer", "description": "Test"}),
    )
    .await;
    let id = bug["id"].as_str().unwrap();

    let count_before = list_bugs(&client, &server, "").await.len();

    // No confirmation gesture: nothing may change.
    let resp = client
        .delete(server.url(&format!("/api/bugs/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PRECONDITION_REQUIRED);

    // An explicit decline behaves the same.
    let resp = client
        .delete(server.url(&format!("/api/bugs/{id}?confirm=false")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PRECONDITION_REQUIRED);

    assert_eq!(list_bugs(&client, &server, "").await.len(), count_before);
}

#[tokio::test]
async fn delete_unknown_bug_is_not_found() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .delete(server.url("/api/bugs/no-such-id?confirm=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_newest_first_and_filters_apply() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    create_bug(
        &client,
        &server,
        json!({
            "title": "Crash au paiement",
            "description": "le checkout explose",
            "priority": "high",
            "severity": "critical",
            "assignee": "alice"
        }),
    )
    .await;
    let newest = create_bug(
        &client,
        &server,
        json!({
            "title": "Typo sur la page d'accueil",
            "description": "accent manquant",
            "priority": "low",
            "severity": "trivial",
            "assignee": "bob"
        }),
    )
    .await;

    let bugs = list_bugs(&client, &server, "").await;
    assert_eq!(bugs.len(), 2);
    assert_eq!(bugs[0]["id"], newest["id"]);

    let high = list_bugs(&client, &server, "?priority=high").await;
    assert_eq!(high.len(), 1);
    assert_eq!(high[0]["title"], "Crash au paiement");

    let trivial = list_bugs(&client, &server, "?severity=trivial").await;
    assert_eq!(trivial.len(), 1);

    let bobs = list_bugs(&client, &server, "?assignee=bob").await;
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0]["assignee"], "bob");

    // Search matches title and description, case-insensitively.
    let by_title = list_bugs(&client, &server, "?q=TYPO").await;
    assert_eq!(by_title.len(), 1);
    let by_description = list_bugs(&client, &server, "?q=checkout").await;
    assert_eq!(by_description.len(), 1);

    let open = list_bugs(&client, &server, "?status=open").await;
    assert_eq!(open.len(), 2);
}

#[tokio::test]
async fn three_users_are_seeded() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client.get(server.url("/api/users")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let users: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(users.len(), 3);

    let handles: Vec<&str> = users.iter().filter_map(|u| u["handle"].as_str()).collect();
    assert_eq!(handles, vec!["alice", "bob", "charlie"]);
}

#[tokio::test]
async fn duplicate_user_handle_conflicts() {
    let server = TestServer::start().await.unwrap();
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/users"))
        .json(&json!({"handle": "alice", "display_name": "Alice Again"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bearer_token_guards_the_api_but_not_health() {
    let server = TestServer::start_with_auth(ApiAuth::Token("secret-token".to_string()))
        .await
        .unwrap();
    let client = reqwest::Client::new();

    // Health stays public for probes.
    let resp = client.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client.get(server.url("/api/bugs")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(server.url("/api/bugs"))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(server.url("/api/bugs"))
        .bearer_auth("secret-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

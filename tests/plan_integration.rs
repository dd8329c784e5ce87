use std::sync::{Arc, Mutex};

use artifactory_client::ArtifactoryClient;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use common::config::Configuration;
use rules::registry;
use serde_json::{Value, json};
use tokio::net::TcpListener;

type Queries = Arc<Mutex<Vec<String>>>;

async fn storage(Path(repo): Path<String>) -> StatusCode {
    if repo == "libs-release" {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn aql(State(queries): State<Queries>, body: String) -> Json<Value> {
    queries.lock().unwrap().push(body);
    Json(json!({
        "results": [
            {"repo": "libs-release", "path": "app/1.0", "name": "app-1.0.jar",
             "properties": [{"key": "do_not_delete", "value": "1"}]},
            {"repo": "libs-release", "path": "app/1.1", "name": "app-1.1.jar",
             "properties": [{"key": "do_not_delete", "value": "0"}]},
            {"repo": "libs-release", "path": "app/1.2", "name": "app-1.2.jar"}
        ]
    }))
}

async fn start_artifactory(queries: Queries) -> String {
    let app = Router::new()
        .route("/artifactory/api/storage/:repo", get(storage))
        .route("/artifactory/api/search/aql", post(aql))
        .with_state(queries);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/artifactory")
}

fn write_config(dir: &tempfile::TempDir, url: &str) -> std::path::PathBuf {
    let path = dir.path().join("artifact-cleanup.toml");
    std::fs::write(
        &path,
        format!(
            r#"
            [artifactory]
            url = "{url}"
            timeout = "5s"
            include = ["*", "property"]

            [[policies]]
            name = "release"
            rules = [
                {{ rule = "repo", name = "libs-release" }},
                {{ rule = "PropertyNeq", key = "do_not_delete", value = 1 }},
            ]

            [[policies]]
            name = "missing"
            rules = [{{ rule = "Repo", name = "libs-missing" }}]
            "#
        ),
    )
    .unwrap();
    path
}

#[tokio::test]
async fn test_configured_policy_against_http_store() {
    let queries = Queries::default();
    let url = start_artifactory(queries.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = Configuration::load_from_path(&write_config(&dir, &url)).unwrap();

    let client = ArtifactoryClient::new(&config.artifactory).unwrap();
    let policy = registry::build_policy(config.policy("release").unwrap()).unwrap();

    let names: Vec<_> = policy
        .candidates(&client)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();

    assert_eq!(names, vec!["app-1.1.jar", "app-1.2.jar"]);
    assert_eq!(
        *queries.lock().unwrap(),
        vec![r#"items.find({"$and":[{"repo":{"$eq":"libs-release"}}]}).include("*","property")"#]
    );
}

#[tokio::test]
async fn test_missing_repository_fails_the_policy() {
    let queries = Queries::default();
    let url = start_artifactory(queries.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = Configuration::load_from_path(&write_config(&dir, &url)).unwrap();

    let client = ArtifactoryClient::new(&config.artifactory).unwrap();
    let policy = registry::build_policy(config.policy("missing").unwrap()).unwrap();

    let err = policy.candidates(&client).await.unwrap_err();

    assert!(err.to_string().contains("libs-missing"));
    assert!(queries.lock().unwrap().is_empty());
}

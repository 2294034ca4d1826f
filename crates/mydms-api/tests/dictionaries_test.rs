mod helpers;

use helpers::{api_path, fixtures, setup_test_app};
use serde_json::Value;

#[tokio::test]
async fn test_dictionaries_grow_with_documents() {
    let app = setup_test_app().await;

    for (title, tags, senders) in [
        ("first", vec!["Work", "2024"], vec!["ACME"]),
        ("second", vec!["work", "Private"], vec!["acme", "Bank"]),
    ] {
        let response = app
            .client()
            .post(&api_path("/documents"))
            .add_header("Authorization", app.bearer())
            .json(&fixtures::document(title, &tags, &senders))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let response = app
        .client()
        .get(&api_path("/tags"))
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let tags: Vec<Value> = response.json();
    let mut names: Vec<&str> = tags.iter().map(|t| t["name"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["2024", "Private", "Work"]);

    let response = app
        .client()
        .get(&api_path("/senders/search"))
        .add_query_param("name", "ba")
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let senders: Vec<Value> = response.json();
    assert_eq!(senders.len(), 1);
    assert_eq!(senders[0]["name"], "Bank");
}

#[tokio::test]
async fn test_search_tags_without_name_returns_all() {
    let app = setup_test_app().await;
    sqlx::query("INSERT INTO tags (name) VALUES ('alpha'), ('beta')")
        .execute(app.pool())
        .await
        .unwrap();

    let response = app
        .client()
        .get(&api_path("/tags/search"))
        .add_header("Authorization", app.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
    let tags: Vec<Value> = response.json();
    assert_eq!(tags.len(), 2);
}

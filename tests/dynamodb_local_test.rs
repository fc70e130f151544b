//! Tests against a real DynamoDB endpoint, normally DynamoDB Local:
//!
//!   docker run -d -p 8000:8000 amazon/dynamodb-local
//!   cargo test --test dynamodb_local_test -- --ignored
//!
//! `AWS_ENDPOINT_URL` defaults to http://localhost:8000. Each test provisions
//! its own uniquely named table.

use std::sync::Arc;

use chatstore::{db, AwsSettings, ChatError, ChatRecord, ChatStore, ChatUpdate};
use uuid::Uuid;

fn local_settings(table: &str) -> AwsSettings {
    let env_or = |key: &str, default: &str| {
        std::env::var(key).unwrap_or_else(|_| default.to_string())
    };
    let endpoint = env_or("AWS_ENDPOINT_URL", "http://localhost:8000");
    let region = env_or("AWS_REGION", "us-east-1");

    AwsSettings::from_lookup(|key| match key {
        "AWS_ACCESS_KEY_ID" | "AWS_SECRET_ACCESS_KEY" => Some("local".to_string()),
        "AWS_REGION" => Some(region.clone()),
        "AWS_ENDPOINT_URL" => Some(endpoint.clone()),
        "CHATS_TABLE_NAME" => Some(table.to_string()),
        _ => None,
    })
    .unwrap()
}

async fn local_store() -> Arc<dyn ChatStore> {
    let table = format!("chats-test-{}", Uuid::new_v4());
    let store = db::dynamo(&local_settings(&table)).await;
    let created = store.create_table().await.unwrap();
    assert_eq!(created.table_name, table);
    store
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamodb_chat_lifecycle() {
    let store = local_store().await;

    store
        .create_chat(&ChatRecord::new("u1", "c1", "hello", 1000))
        .await
        .unwrap();
    let created = store.get_single_chat("u1", "c1").await.unwrap().unwrap();
    assert_eq!(created, ChatRecord::new("u1", "c1", "hello", 1000));

    let updated = store
        .update_chat(&ChatUpdate::new("u1", "c1", "world"))
        .await
        .unwrap();
    assert_eq!(updated.title, "world");
    assert_eq!(updated.created_at, 1000);
    assert!(updated.updated_at.is_some_and(|t| t >= updated.created_at));
    assert_eq!(
        store.get_single_chat("u1", "c1").await.unwrap(),
        Some(updated)
    );

    store.delete_chat("u1", "c1").await.unwrap();
    assert_eq!(store.get_single_chat("u1", "c1").await.unwrap(), None);
    // Deleting again is not an error.
    store.delete_chat("u1", "c1").await.unwrap();
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamodb_create_table_twice_reports_resource_in_use() {
    let store = local_store().await;

    let err = store.create_table().await.unwrap_err();
    assert!(
        matches!(
            err,
            ChatError::Remote(aws_sdk_dynamodb::Error::ResourceInUseException(_))
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamodb_query_for_unknown_user_is_empty() {
    let store = local_store().await;

    assert!(store.get_user_chats("nonexistent").await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamodb_user_chats_come_back_in_key_order() {
    let store = local_store().await;
    for (owner, chat) in [("u1", "c3"), ("u2", "c2"), ("u1", "c1"), ("u1", "c2")] {
        store
            .create_chat(&ChatRecord::new(owner, chat, format!("{owner}/{chat}"), 1000))
            .await
            .unwrap();
    }

    let chats = store.get_user_chats("u1").await.unwrap();
    let ids: Vec<&str> = chats.iter().map(|c| c.chat_id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_dynamodb_missing_table_reports_resource_not_found() {
    let table = format!("chats-missing-{}", Uuid::new_v4());
    let store = db::dynamo(&local_settings(&table)).await;

    let err = store.get_single_chat("u1", "c1").await.unwrap_err();
    assert!(
        matches!(
            err,
            ChatError::Remote(aws_sdk_dynamodb::Error::ResourceNotFoundException(_))
        ),
        "unexpected error: {err:?}"
    );
}

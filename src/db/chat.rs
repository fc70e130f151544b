use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use serde::{Deserialize, Serialize};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use crate::error::{ChatError, Result};

use super::DynamoDb;

pub const USER_ID_ATTR: &str = "user_id";
pub const CHAT_ID_ATTR: &str = "chat_id";
pub const TITLE_ATTR: &str = "title";
pub const CREATED_AT_ATTR: &str = "created_at";
pub const UPDATED_AT_ATTR: &str = "updated_at";

pub type Item = HashMap<String, AttributeValue>;

/// A chat owned by a user, keyed by `(owner_id, chat_id)`.
///
/// Timestamps are unix seconds. `updated_at` is absent until the first update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "user_id")]
    pub owner_id: String,
    pub chat_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl ChatRecord {
    pub fn new(
        owner_id: impl Into<String>,
        chat_id: impl Into<String>,
        title: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            chat_id: chat_id.into(),
            title: title.into(),
            created_at,
            updated_at: None,
        }
    }
}

/// New title for an existing chat. The ids only locate the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUpdate {
    pub owner_id: String,
    pub chat_id: String,
    pub title: String,
}

impl ChatUpdate {
    pub fn new(
        owner_id: impl Into<String>,
        chat_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            chat_id: chat_id.into(),
            title: title.into(),
        }
    }
}

pub fn chat_to_item(chat: &ChatRecord) -> Result<Item> {
    to_item(chat).map_err(ChatError::Marshal)
}

pub fn item_to_chat(item: Item) -> Result<ChatRecord> {
    from_item(item).map_err(ChatError::Unmarshal)
}

/// DynamoDB rejects empty strings in key attributes; catch them before sending.
pub fn check_owner_id(owner_id: &str) -> Result<()> {
    if owner_id.is_empty() {
        return Err(ChatError::InvalidKey(USER_ID_ATTR));
    }
    Ok(())
}

pub fn check_chat_key(owner_id: &str, chat_id: &str) -> Result<()> {
    check_owner_id(owner_id)?;
    if chat_id.is_empty() {
        return Err(ChatError::InvalidKey(CHAT_ID_ATTR));
    }
    Ok(())
}

pub fn chat_key(owner_id: &str, chat_id: &str) -> Item {
    HashMap::from([
        (USER_ID_ATTR.to_string(), AttributeValue::S(owner_id.to_string())),
        (CHAT_ID_ATTR.to_string(), AttributeValue::S(chat_id.to_string())),
    ])
}

impl DynamoDb {
    /// Unconditional put: an existing chat with the same key is replaced.
    pub async fn create_chat(&self, chat: &ChatRecord) -> Result<()> {
        check_chat_key(&chat.owner_id, &chat.chat_id)?;
        let item = chat_to_item(chat)?;

        tracing::debug!(
            table = %self.chats_table,
            user_id = %chat.owner_id,
            chat_id = %chat.chat_id,
            "PutItem chat"
        );

        self.client
            .put_item()
            .table_name(&self.chats_table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(ChatError::remote)?;

        Ok(())
    }

    /// All chats of one user, in ascending `chat_id` order as returned by the store.
    pub async fn get_user_chats(&self, owner_id: &str) -> Result<Vec<ChatRecord>> {
        check_owner_id(owner_id)?;

        tracing::debug!(table = %self.chats_table, user_id = %owner_id, "Query chats");

        let response = self
            .client
            .query()
            .table_name(&self.chats_table)
            .key_condition_expression("#uid = :uid")
            .expression_attribute_names("#uid", USER_ID_ATTR)
            .expression_attribute_values(":uid", AttributeValue::S(owner_id.to_string()))
            .send()
            .await
            .map_err(ChatError::remote)?;

        response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(item_to_chat)
            .collect()
    }

    pub async fn get_single_chat(
        &self,
        owner_id: &str,
        chat_id: &str,
    ) -> Result<Option<ChatRecord>> {
        check_chat_key(owner_id, chat_id)?;

        tracing::debug!(
            table = %self.chats_table,
            user_id = %owner_id,
            chat_id = %chat_id,
            "GetItem chat"
        );

        let response = self
            .client
            .get_item()
            .table_name(&self.chats_table)
            .set_key(Some(chat_key(owner_id, chat_id)))
            .send()
            .await
            .map_err(ChatError::remote)?;

        match response.item {
            Some(item) if !item.is_empty() => Ok(Some(item_to_chat(item)?)),
            _ => Ok(None),
        }
    }

    /// Set a new title and stamp `updated_at`. No existence check is made, so
    /// updating a missing key creates a bare item.
    pub async fn update_chat(&self, update: &ChatUpdate) -> Result<ChatRecord> {
        check_chat_key(&update.owner_id, &update.chat_id)?;
        let now = chrono::Utc::now().timestamp();

        tracing::debug!(
            table = %self.chats_table,
            user_id = %update.owner_id,
            chat_id = %update.chat_id,
            "UpdateItem chat"
        );

        let response = self
            .client
            .update_item()
            .table_name(&self.chats_table)
            .set_key(Some(chat_key(&update.owner_id, &update.chat_id)))
            .update_expression("SET #title = :title, #updated_at = :updated_at")
            .expression_attribute_names("#title", TITLE_ATTR)
            .expression_attribute_names("#updated_at", UPDATED_AT_ATTR)
            .expression_attribute_values(":title", AttributeValue::S(update.title.clone()))
            .expression_attribute_values(":updated_at", AttributeValue::N(now.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(ChatError::remote)?;

        item_to_chat(response.attributes.unwrap_or_default())
    }

    /// Deleting a key that does not exist succeeds.
    pub async fn delete_chat(&self, owner_id: &str, chat_id: &str) -> Result<()> {
        check_chat_key(owner_id, chat_id)?;

        tracing::debug!(
            table = %self.chats_table,
            user_id = %owner_id,
            chat_id = %chat_id,
            "DeleteItem chat"
        );

        self.client
            .delete_item()
            .table_name(&self.chats_table)
            .set_key(Some(chat_key(owner_id, chat_id)))
            .send()
            .await
            .map_err(ChatError::remote)?;

        Ok(())
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::error::{ResourceInUseException, ResourceNotFoundException};
use aws_sdk_dynamodb::types::AttributeValue;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::DEFAULT_CHATS_TABLE_NAME;
use crate::error::{ChatError, Result};

use super::chat::{
    chat_key, chat_to_item, check_chat_key, check_owner_id, item_to_chat, ChatRecord, ChatUpdate,
    Item, TITLE_ATTR, UPDATED_AT_ATTR,
};
use super::table::{TableDescriptor, TableSchema};
use super::ChatStore;

/// Items of one user, ordered by `chat_id` like a DynamoDB partition.
type Partition = BTreeMap<String, Item>;

struct MemoryTable {
    partitions: BTreeMap<String, Partition>,
}

/// In-memory chat store for local development and testing.
///
/// Items are kept in their attribute-map form, so every call goes through the
/// same marshalling as the DynamoDB backend. Missing tables and duplicate
/// table creation fail with the service's own error variants.
#[derive(Clone)]
pub struct MemoryDb {
    schema: TableSchema,
    table: Arc<RwLock<Option<MemoryTable>>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::with_table_name(DEFAULT_CHATS_TABLE_NAME)
    }

    pub fn with_table_name(table_name: impl Into<String>) -> Self {
        Self {
            schema: TableSchema::chats(table_name),
            table: Arc::new(RwLock::new(None)),
        }
    }

    fn table_not_found(&self) -> ChatError {
        ChatError::Remote(aws_sdk_dynamodb::Error::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message(format!(
                    "Requested resource not found: Table: {} not found",
                    self.schema.table_name
                ))
                .build(),
        ))
    }

    fn table_in_use(&self) -> ChatError {
        ChatError::Remote(aws_sdk_dynamodb::Error::ResourceInUseException(
            ResourceInUseException::builder()
                .message(format!("Table already exists: {}", self.schema.table_name))
                .build(),
        ))
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryDb {
    async fn create_table(&self) -> Result<TableDescriptor> {
        let mut table = self.table.write().await;
        if table.is_some() {
            return Err(self.table_in_use());
        }

        let table_id = Uuid::new_v4().to_string();
        let descriptor = TableDescriptor {
            table_name: self.schema.table_name.clone(),
            table_arn: Some(format!(
                "arn:aws:dynamodb:local:000000000000:table/{}",
                self.schema.table_name
            )),
            table_id: Some(table_id),
            status: Some("ACTIVE".to_string()),
        };

        tracing::info!(table = %descriptor.table_name, "Created in-memory chats table");

        *table = Some(MemoryTable {
            partitions: BTreeMap::new(),
        });

        Ok(descriptor)
    }

    async fn create_chat(&self, chat: &ChatRecord) -> Result<()> {
        check_chat_key(&chat.owner_id, &chat.chat_id)?;
        let item = chat_to_item(chat)?;

        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or_else(|| self.table_not_found())?;

        table
            .partitions
            .entry(chat.owner_id.clone())
            .or_default()
            .insert(chat.chat_id.clone(), item);

        Ok(())
    }

    async fn get_user_chats(&self, owner_id: &str) -> Result<Vec<ChatRecord>> {
        check_owner_id(owner_id)?;

        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or_else(|| self.table_not_found())?;

        table
            .partitions
            .get(owner_id)
            .into_iter()
            .flat_map(|partition| partition.values())
            .map(|item| item_to_chat(item.clone()))
            .collect()
    }

    async fn get_single_chat(
        &self,
        owner_id: &str,
        chat_id: &str,
    ) -> Result<Option<ChatRecord>> {
        check_chat_key(owner_id, chat_id)?;

        let guard = self.table.read().await;
        let table = guard.as_ref().ok_or_else(|| self.table_not_found())?;

        table
            .partitions
            .get(owner_id)
            .and_then(|partition| partition.get(chat_id))
            .map(|item| item_to_chat(item.clone()))
            .transpose()
    }

    async fn update_chat(&self, update: &ChatUpdate) -> Result<ChatRecord> {
        check_chat_key(&update.owner_id, &update.chat_id)?;
        let now = chrono::Utc::now().timestamp();

        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or_else(|| self.table_not_found())?;

        let item = table
            .partitions
            .entry(update.owner_id.clone())
            .or_default()
            .entry(update.chat_id.clone())
            .or_insert_with(|| chat_key(&update.owner_id, &update.chat_id));

        item.insert(
            TITLE_ATTR.to_string(),
            AttributeValue::S(update.title.clone()),
        );
        item.insert(
            UPDATED_AT_ATTR.to_string(),
            AttributeValue::N(now.to_string()),
        );

        item_to_chat(item.clone())
    }

    async fn delete_chat(&self, owner_id: &str, chat_id: &str) -> Result<()> {
        check_chat_key(owner_id, chat_id)?;

        let mut guard = self.table.write().await;
        let table = guard.as_mut().ok_or_else(|| self.table_not_found())?;

        if let Some(partition) = table.partitions.get_mut(owner_id) {
            partition.remove(chat_id);
            if partition.is_empty() {
                table.partitions.remove(owner_id);
            }
        }

        Ok(())
    }
}

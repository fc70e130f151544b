pub mod chat;
pub mod memory;
pub mod table;

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::SdkConfig;

use crate::{config::AwsSettings, error::Result};

use self::chat::{ChatRecord, ChatUpdate};
use self::table::TableDescriptor;

/// Storage abstraction over the chats table.
///
/// Every method maps to exactly one request against the backing store.
#[async_trait]
pub trait ChatStore: Send + Sync {
    // Administrative
    async fn create_table(&self) -> Result<TableDescriptor>;

    // Chat operations
    async fn create_chat(&self, chat: &ChatRecord) -> Result<()>;
    async fn get_user_chats(&self, owner_id: &str) -> Result<Vec<ChatRecord>>;
    async fn get_single_chat(&self, owner_id: &str, chat_id: &str)
        -> Result<Option<ChatRecord>>;
    async fn update_chat(&self, update: &ChatUpdate) -> Result<ChatRecord>;
    async fn delete_chat(&self, owner_id: &str, chat_id: &str) -> Result<()>;
}

/// DynamoDB-backed storage for production use.
#[derive(Clone, Debug)]
pub struct DynamoDb {
    pub(crate) client: aws_sdk_dynamodb::Client,
    pub chats_table: String,
}

impl DynamoDb {
    pub fn new(client: aws_sdk_dynamodb::Client, chats_table: impl Into<String>) -> Self {
        Self {
            client,
            chats_table: chats_table.into(),
        }
    }
}

#[async_trait]
impl ChatStore for DynamoDb {
    async fn create_table(&self) -> Result<TableDescriptor> {
        DynamoDb::create_table(self).await
    }

    async fn create_chat(&self, chat: &ChatRecord) -> Result<()> {
        DynamoDb::create_chat(self, chat).await
    }

    async fn get_user_chats(&self, owner_id: &str) -> Result<Vec<ChatRecord>> {
        DynamoDb::get_user_chats(self, owner_id).await
    }

    async fn get_single_chat(
        &self,
        owner_id: &str,
        chat_id: &str,
    ) -> Result<Option<ChatRecord>> {
        DynamoDb::get_single_chat(self, owner_id, chat_id).await
    }

    async fn update_chat(&self, update: &ChatUpdate) -> Result<ChatRecord> {
        DynamoDb::update_chat(self, update).await
    }

    async fn delete_chat(&self, owner_id: &str, chat_id: &str) -> Result<()> {
        DynamoDb::delete_chat(self, owner_id, chat_id).await
    }
}

/// Build a DynamoDB client from a resolved SDK configuration.
///
/// Pure construction, no request is made until the client is first used.
pub fn new_client(config: &SdkConfig) -> aws_sdk_dynamodb::Client {
    aws_sdk_dynamodb::Client::new(config)
}

/// Create a DynamoDB-backed store from resolved settings.
pub async fn dynamo(settings: &AwsSettings) -> Arc<dyn ChatStore> {
    let config = settings.load_sdk_config().await;
    tracing::info!(
        region = %settings.region,
        table = %settings.chats_table,
        "Using DynamoDB chat store"
    );
    Arc::new(DynamoDb::new(new_client(&config), &settings.chats_table))
}

/// Create an in-memory store for local development and testing.
pub fn memory() -> Arc<dyn ChatStore> {
    Arc::new(memory::MemoryDb::new())
}

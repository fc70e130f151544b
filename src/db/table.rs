use aws_sdk_dynamodb::operation::create_table::CreateTableOutput;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};

use crate::error::{ChatError, Result};

use super::chat::{CHAT_ID_ATTR, USER_ID_ATTR};
use super::DynamoDb;

/// A key attribute of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: ScalarAttributeType,
}

/// Static definition of a table with a composite primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
}

impl TableSchema {
    /// Schema of the chats table: `user_id` hash key, `chat_id` range key,
    /// billed per request.
    pub fn chats(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: KeyAttribute {
                name: USER_ID_ATTR.to_string(),
                attribute_type: ScalarAttributeType::S,
            },
            sort_key: KeyAttribute {
                name: CHAT_ID_ATTR.to_string(),
                attribute_type: ScalarAttributeType::S,
            },
            billing_mode: BillingMode::PayPerRequest,
        }
    }

    pub fn key_schema(&self) -> Result<Vec<KeySchemaElement>> {
        Ok(vec![
            KeySchemaElement::builder()
                .attribute_name(&self.partition_key.name)
                .key_type(KeyType::Hash)
                .build()?,
            KeySchemaElement::builder()
                .attribute_name(&self.sort_key.name)
                .key_type(KeyType::Range)
                .build()?,
        ])
    }

    pub fn attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
        [&self.partition_key, &self.sort_key]
            .into_iter()
            .map(|key| {
                AttributeDefinition::builder()
                    .attribute_name(&key.name)
                    .attribute_type(key.attribute_type.clone())
                    .build()
                    .map_err(ChatError::from)
            })
            .collect()
    }
}

/// What the store reports back about a freshly created table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub table_name: String,
    pub table_id: Option<String>,
    pub table_arn: Option<String>,
    pub status: Option<String>,
}

impl TableDescriptor {
    fn from_output(output: CreateTableOutput, fallback_name: &str) -> Self {
        match output.table_description {
            Some(description) => Self {
                table_name: description
                    .table_name
                    .unwrap_or_else(|| fallback_name.to_string()),
                table_id: description.table_id,
                table_arn: description.table_arn,
                status: description.table_status.map(|s| s.as_str().to_string()),
            },
            None => Self {
                table_name: fallback_name.to_string(),
                table_id: None,
                table_arn: None,
                status: None,
            },
        }
    }
}

impl DynamoDb {
    /// Provision the chats table.
    ///
    /// Not idempotent: if the table already exists the service's
    /// `ResourceInUseException` is returned as is.
    pub async fn create_table(&self) -> Result<TableDescriptor> {
        let schema = TableSchema::chats(&self.chats_table);

        tracing::info!(table = %schema.table_name, "Creating chats table");

        let output = self
            .client
            .create_table()
            .table_name(&schema.table_name)
            .set_key_schema(Some(schema.key_schema()?))
            .set_attribute_definitions(Some(schema.attribute_definitions()?))
            .billing_mode(schema.billing_mode.clone())
            .send()
            .await
            .map_err(ChatError::remote)?;

        Ok(TableDescriptor::from_output(output, &schema.table_name))
    }
}

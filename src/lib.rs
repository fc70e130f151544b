pub mod config;
pub mod db;
pub mod error;

pub use config::AwsSettings;
pub use db::chat::{ChatRecord, ChatUpdate};
pub use db::table::{TableDescriptor, TableSchema};
pub use db::{ChatStore, DynamoDb};
pub use error::{ChatError, Result};

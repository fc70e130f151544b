use std::process::ExitCode;
use std::sync::Arc;

use chatstore::{db, AwsSettings, ChatRecord, ChatStore, ChatUpdate, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Manage chats stored in DynamoDB.
#[derive(Parser, Debug)]
#[command(name = "chatstore")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Use an in-memory store instead of DynamoDB. The table is created on start
    /// and everything is lost when the process exits, so nothing is shared
    /// between invocations
    #[arg(long, global = true, env = "CHATSTORE_MEMORY")]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the chats table
    CreateTable,
    /// Store a chat, replacing any chat with the same ids
    Create {
        #[arg(long)]
        user: String,
        /// Defaults to a new random id
        #[arg(long)]
        chat: Option<String>,
        #[arg(long)]
        title: String,
    },
    /// List every chat of a user
    List {
        #[arg(long)]
        user: String,
    },
    /// Show one chat
    Get {
        #[arg(long)]
        user: String,
        #[arg(long)]
        chat: String,
    },
    /// Change the title of a chat
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        chat: String,
        #[arg(long)]
        title: String,
    },
    /// Remove a chat
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        chat: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let store = open_store(&cli).await?;
    run(store.as_ref(), cli.command).await
}

async fn open_store(cli: &Cli) -> Result<Arc<dyn ChatStore>> {
    if cli.memory {
        tracing::info!("Using in-memory chat store");
        let store = db::memory();
        if !matches!(cli.command, Command::CreateTable) {
            store.create_table().await?;
        }
        return Ok(store);
    }

    // Missing credentials are fatal; nothing is sent before this succeeds.
    let settings = AwsSettings::from_env()?;
    Ok(db::dynamo(&settings).await)
}

async fn run(store: &dyn ChatStore, command: Command) -> Result<()> {
    match command {
        Command::CreateTable => {
            let table = store.create_table().await?;
            println!(
                "Table ID: {}\nTable Name: {}",
                table.table_id.as_deref().unwrap_or("-"),
                table.table_name
            );
        }
        Command::Create { user, chat, title } => {
            let chat_id = chat.unwrap_or_else(|| Uuid::new_v4().to_string());
            let record = ChatRecord::new(user, chat_id, title, chrono::Utc::now().timestamp());
            store.create_chat(&record).await?;
            println!("New chat created: {}", record.chat_id);
        }
        Command::List { user } => {
            for chat in store.get_user_chats(&user).await? {
                print_chat(&chat);
            }
        }
        Command::Get { user, chat } => match store.get_single_chat(&user, &chat).await? {
            Some(chat) => print_chat(&chat),
            None => println!("Chat not found"),
        },
        Command::Update { user, chat, title } => {
            let updated = store
                .update_chat(&ChatUpdate::new(user, chat, title))
                .await?;
            println!("Updated {}", updated.chat_id);
        }
        Command::Delete { user, chat } => {
            store.delete_chat(&user, &chat).await?;
            println!("Deleted {chat}");
        }
    }

    Ok(())
}

fn print_chat(chat: &ChatRecord) {
    println!(
        "User ID: {}\nChat ID: {}\nChat Title: {}\n",
        chat.owner_id, chat.chat_id, chat.title
    );
}

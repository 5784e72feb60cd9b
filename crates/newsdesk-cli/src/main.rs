use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(about = "A CLI for the Newsdesk news and magazine service")]
struct Cli {
    /// Base URL for the Newsdesk service
    #[arg(long, default_value = "http://localhost:3000")]
    service_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a news item
    Submit {
        /// Uploader identifier ("admin" submissions are approved directly)
        #[arg(long)]
        uploaded_by: String,
        /// Title of the news item
        title: String,
        /// Body text
        #[arg(short, long)]
        content: Option<String>,
        /// Category (placement, certification, training, outreach, event, other)
        #[arg(long)]
        category: Option<String>,
        /// Path to an image file attached to the item
        #[arg(short, long)]
        image: Option<PathBuf>,
    },
    /// Approve or decline a pending item
    Review {
        /// News item id
        id: i32,
        /// "approved" or "declined"
        status: String,
        /// Reviewer identifier
        #[arg(long)]
        reviewed_by: String,
        /// Required when declining
        #[arg(long)]
        reason: Option<String>,
    },
    /// Retract an item with a reason
    Retract {
        id: i32,
        #[arg(long)]
        reason: String,
        #[arg(long)]
        reviewed_by: String,
    },
    /// Set an uploader's ranking priority (lower = higher)
    Priority { user_id: String, priority: i32 },
    /// Show the active/upcoming/published feed for a viewer
    Feed {
        /// Viewer identifier ("admin" sees the global pools)
        #[arg(long)]
        user_id: String,
        /// Partition to fetch: all, active, upcoming, published
        #[arg(long, default_value = "all")]
        section: String,
    },
    /// Generate a magazine from a pages JSON file
    Generate {
        /// Path to a JSON file with the curated pages
        pages_file: PathBuf,
    },
    /// List generated magazine PDFs
    List,
    /// Convert a generated magazine to a flipbook
    Flipbook { filename: String },
}

#[derive(Serialize)]
struct SubmitEntry {
    title: String,
    content: Option<String>,
    category: Option<String>,
    image: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = cli.service_url;

    match cli.command {
        Commands::Submit {
            uploaded_by,
            title,
            content,
            category,
            image,
        } => {
            let image = match image {
                Some(path) => {
                    let bytes = std::fs::read(&path)?;
                    Some(format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)))
                }
                None => None,
            };
            let payload = json!({
                "uploaded_by": uploaded_by,
                "entries": [SubmitEntry { title, content, category, image }],
            });
            send(client.post(format!("{base}/api/v1/news")).json(&payload)).await?;
        }
        Commands::Review {
            id,
            status,
            reviewed_by,
            reason,
        } => {
            let payload = json!({
                "status": status,
                "reviewed_by": reviewed_by,
                "rejected_reason": reason,
            });
            send(
                client
                    .post(format!("{base}/api/v1/news/{id}/review"))
                    .json(&payload),
            )
            .await?;
        }
        Commands::Retract {
            id,
            reason,
            reviewed_by,
        } => {
            let payload = json!({ "reason": reason, "reviewed_by": reviewed_by });
            send(
                client
                    .post(format!("{base}/api/v1/news/{id}/retract"))
                    .json(&payload),
            )
            .await?;
        }
        Commands::Priority { user_id, priority } => {
            let payload = json!({ "user_id": user_id, "priority": priority });
            send(client.put(format!("{base}/api/v1/priority")).json(&payload)).await?;
        }
        Commands::Feed { user_id, section } => {
            send(
                client
                    .get(format!("{base}/api/v1/feed"))
                    .query(&[("user_id", user_id), ("section", section)]),
            )
            .await?;
        }
        Commands::Generate { pages_file } => {
            let pages: Value = serde_json::from_str(&std::fs::read_to_string(&pages_file)?)?;
            let payload = if pages.get("pages").is_some() {
                pages
            } else {
                json!({ "pages": pages })
            };
            send(
                client
                    .post(format!("{base}/api/v1/magazine"))
                    .json(&payload),
            )
            .await?;
        }
        Commands::List => {
            send(client.get(format!("{base}/api/v1/magazine"))).await?;
        }
        Commands::Flipbook { filename } => {
            let payload = json!({ "filename": filename });
            send(
                client
                    .post(format!("{base}/api/v1/magazine/flipbook"))
                    .json(&payload),
            )
            .await?;
        }
    }

    Ok(())
}

async fn send(request: reqwest::RequestBuilder) -> Result<(), Box<dyn Error>> {
    let response = request.send().await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        eprintln!("Request failed with status {status}");
        eprintln!("{}", serde_json::to_string_pretty(&body)?);
        std::process::exit(1);
    }

    Ok(())
}

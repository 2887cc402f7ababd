use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Management CLI for the site guard admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key. Falls back to the ADMIN_API_KEY environment variable.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// Inspect or clear rate-limit windows
    Limits {
        #[command(subcommand)]
        action: LimitAction,
    },
}

#[derive(Subcommand)]
enum LimitAction {
    /// Show the window for an identifier, e.g. login:203.0.113.9
    Show { identifier: String },
    /// Clear the window for an identifier
    Reset { identifier: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let key = match cli.key.or_else(|| std::env::var("ADMIN_API_KEY").ok()) {
        Some(key) => key,
        None => {
            eprintln!("Error: no admin key given (use --key or ADMIN_API_KEY)");
            std::process::exit(2);
        }
    };

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {key}"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let base = cli.url.trim_end_matches('/');
    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{base}/admin/status"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Limits { action: LimitAction::Show { identifier } } => {
            client
                .get(format!("{base}/admin/rate-limits/{identifier}"))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Limits { action: LimitAction::Reset { identifier } } => {
            client
                .delete(format!("{base}/admin/rate-limits/{identifier}"))
                .headers(headers)
                .send()
                .await?
        }
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("OK");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

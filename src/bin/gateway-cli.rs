use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the market data gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "GATEWAY_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Per-source breaker state and health score
    Health,
    /// Reset one source's breaker, or every breaker
    Reset { source: Option<String> },
    /// Show which source a category would use right now
    Best { category: String },
    /// Enable a source until the next config reload
    Enable { source: String },
    /// Disable a source until the next config reload
    Disable { source: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match &cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Health => client.get(format!("{}/admin/health", cli.url)),
        Commands::Reset { source: None } => client.post(format!("{}/admin/breakers/reset", cli.url)),
        Commands::Reset { source: Some(id) } => {
            client.post(format!("{}/admin/breakers/{}/reset", cli.url, id))
        }
        Commands::Best { category } => {
            client.get(format!("{}/admin/categories/{}/best", cli.url, category))
        }
        Commands::Enable { source } => {
            client.post(format!("{}/admin/sources/{}/enable", cli.url, source))
        }
        Commands::Disable { source } => {
            client.post(format!("{}/admin/sources/{}/disable", cli.url, source))
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "redirector-cli")]
#[command(about = "Management CLI for the tmpnb redirector", long_about = None)]
struct Cli {
    /// Hosts API base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:9001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a target host
    Add { host: String },
    /// Unregister a target host
    Remove { host: String },
    /// Show per-host capacity and availability
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let hosts_url = format!("{}/hosts", cli.url.trim_end_matches('/'));

    let res = match cli.command {
        Commands::Add { host } => client.post(&hosts_url).json(&json!({ "host": host })).send().await?,
        Commands::Remove { host } => client.delete(&hosts_url).json(&json!({ "host": host })).send().await?,
        Commands::Stats => client.get(&hosts_url).send().await?,
    };
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: hosts API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

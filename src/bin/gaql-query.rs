use ads_console::config::{Credentials, DEFAULT_CONFIG_PATH};
use ads_console::setup;
use clap::Parser;

/// Run a single GAQL query and print the rows as JSON lines
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the key=value credential file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Customer id to query (falls back to the configured one)
    #[arg(long)]
    customer_id: Option<String>,

    /// GAQL query string
    #[arg(long)]
    query: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let credentials = Credentials::load(&args.config)?;
    if !credentials.has_api_credentials() {
        return Err(format!(
            "Missing required credentials ({}); run ads-console once to set them up",
            credentials.missing_api_credentials().join(", ")
        )
        .into());
    }

    let customer_id = args
        .customer_id
        .or_else(|| credentials.customer_id.clone())
        .ok_or("No customer id: pass --customer-id or configure one with ads-console")?;

    let client = setup::build_client(&credentials).await?;

    eprintln!("Running query against customer {}", customer_id);
    let rows = client.search(&customer_id, &args.query).await?;

    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }
    eprintln!("{} row(s)", rows.len());

    Ok(())
}

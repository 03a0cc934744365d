use ads_console::config::{Credentials, DEFAULT_CONFIG_PATH};
use ads_console::setup;
use chrono::{Duration, Utc};
use clap::Parser;
use gaql_client::ReportQuery;
use std::fs::OpenOptions;
use std::io::Write;

/// Collect per-day campaign stats for the trailing window and append them
/// to a file as JSON lines
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the key=value credential file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Customer id to query (falls back to the configured one)
    #[arg(long)]
    customer_id: Option<String>,

    /// Number of trailing days to collect
    #[arg(long, default_value = "90")]
    days: i64,

    /// Path to output file where JSON rows will be written (one per line)
    #[arg(long, default_value = "daily_stats.jsonl")]
    output_file: String,
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

    eprintln!("Output file: {}", args.output_file);
    let mut output_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.output_file)
        .map_err(|e| format!("Failed to open output file '{}': {}", args.output_file, e))?;

    let today = Utc::now().date_naive();
    eprintln!(
        "Collecting {} day(s) of campaign stats for customer {}",
        args.days, customer_id
    );

    // Oldest day first so the output file reads chronologically. A failed
    // day is reported and skipped; the loop keeps going.
    for offset in (1..=args.days).rev() {
        let day = today - Duration::days(offset);
        let date = day.format("%Y-%m-%d").to_string();

        let report = ReportQuery::new("campaign")
            .attribute("campaign.id")
            .attribute("campaign.name")
            .metric("impressions")
            .metric("clicks")
            .metric("conversions")
            .metric("cost_micros")
            .constraint(format!("segments.date = '{}'", date));

        match report.run(&client, &customer_id).await {
            Ok(rows) => {
                for row in &rows {
                    let line = serde_json::json!({ "date": date, "row": row });
                    writeln!(output_file, "{}", serde_json::to_string(&line)?)?;
                }
                output_file.flush()?;
                eprintln!("{}: {} row(s)", date, rows.len());
            }
            Err(e) => {
                eprintln!("{}: query failed: {}", date, e);
            }
        }
    }

    eprintln!("Done");
    Ok(())
}

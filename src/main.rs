use ads_console::config::{Credentials, DEFAULT_CONFIG_PATH};
use ads_console::{prompt, setup};
use clap::Parser;
use gaql_client::{GoogleAdsClient, ReportQuery};

/// Interactive Google Ads console - authenticate via OAuth2 and run GAQL
/// queries against the API
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the key=value credential file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // The credential bundle is built once here and passed by reference to
    // every operation.
    let mut credentials = Credentials::load(&args.config)?;
    setup::ensure_api_credentials(&mut credentials)?;
    setup::ensure_refresh_token(&mut credentials).await?;
    credentials.save(&args.config)?;
    eprintln!("Credentials saved to: {}", args.config);

    let mut client = setup::build_client(&credentials).await?;

    loop {
        eprintln!();
        eprintln!("=== Google Ads console ===");
        eprintln!(
            "Active customer: {}",
            credentials.customer_id.as_deref().unwrap_or("(none)")
        );
        eprintln!("  1) List accessible accounts");
        eprintln!("  2) Set active customer id");
        eprintln!("  3) Run GAQL query");
        eprintln!("  4) Campaign performance report");
        eprintln!("  5) Re-run authorization");
        eprintln!("  6) Update a resource field");
        eprintln!("  0) Quit");

        let choice = prompt::prompt_line("Select")?;

        // Every operation error is printed and control returns to the menu;
        // only an explicit quit leaves the loop.
        let result = match choice.as_str() {
            "1" => list_accounts(&client).await,
            "2" => set_customer_id(&mut credentials, &args.config),
            "3" => run_query(&client, &mut credentials, &args.config).await,
            "4" => campaign_report(&client, &mut credentials, &args.config).await,
            "5" => reauthorize(&mut credentials, &mut client, &args.config).await,
            "6" => update_field(&client, &mut credentials, &args.config).await,
            "0" | "q" => break,
            "" => continue,
            other => {
                eprintln!("Unknown choice: {}", other);
                continue;
            }
        };

        if let Err(e) = result {
            eprintln!("Error: {}", e);
        }
    }

    eprintln!("Bye");
    Ok(())
}

async fn list_accounts(client: &GoogleAdsClient) -> Result<(), Box<dyn std::error::Error>> {
    let names = client.list_accessible_customers().await?;
    if names.is_empty() {
        eprintln!("No accessible accounts found");
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn set_customer_id(
    credentials: &mut Credentials,
    config_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let id = prompt::prompt_nonempty("Customer id (e.g. 123-456-7890)")?;
    credentials.customer_id = Some(id);
    credentials.save(config_path)?;
    Ok(())
}

/// Resolve the active customer id, prompting for (and persisting) one when
/// none is configured yet
fn active_customer_id(
    credentials: &mut Credentials,
    config_path: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(id) = &credentials.customer_id {
        return Ok(id.clone());
    }
    let id = prompt::prompt_nonempty("Customer id (e.g. 123-456-7890)")?;
    credentials.customer_id = Some(id.clone());
    credentials.save(config_path)?;
    Ok(id)
}

fn print_rows(rows: &[serde_json::Value]) -> Result<(), Box<dyn std::error::Error>> {
    for row in rows {
        println!("{}", serde_json::to_string(row)?);
    }
    eprintln!("{} row(s)", rows.len());
    Ok(())
}

async fn run_query(
    client: &GoogleAdsClient,
    credentials: &mut Credentials,
    config_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let customer_id = active_customer_id(credentials, config_path)?;
    let query = prompt::prompt_nonempty("GAQL query")?;
    let rows = client.search(&customer_id, &query).await?;
    print_rows(&rows)
}

async fn campaign_report(
    client: &GoogleAdsClient,
    credentials: &mut Credentials,
    config_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let customer_id = active_customer_id(credentials, config_path)?;
    let start = prompt::prompt_nonempty("Start date (YYYY-MM-DD)")?;
    let end = prompt::prompt_nonempty("End date (YYYY-MM-DD)")?;

    let report = ReportQuery::new("campaign")
        .attribute("campaign.id")
        .attribute("campaign.name")
        .attribute("campaign.status")
        .segment("date")
        .metric("impressions")
        .metric("clicks")
        .metric("cost_micros")
        .between(start, end)
        .order_by("segments.date");

    let rows = report.run(client, &customer_id).await?;
    print_rows(&rows)
}

async fn reauthorize(
    credentials: &mut Credentials,
    client: &mut GoogleAdsClient,
    config_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    setup::obtain_refresh_token(credentials).await?;
    credentials.save(config_path)?;
    *client = setup::build_client(credentials).await?;
    eprintln!("Authorization updated");
    Ok(())
}

async fn update_field(
    client: &GoogleAdsClient,
    credentials: &mut Credentials,
    config_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let customer_id = active_customer_id(credentials, config_path)?;
    let entity = prompt::prompt_with_default("Mutate entity", "conversionActions")?;
    let resource_name =
        prompt::prompt_nonempty("Resource name (e.g. customers/123/conversionActions/456)")?;
    let field = prompt::prompt_nonempty("Field to update (e.g. status)")?;
    let value = prompt::prompt_nonempty("New value")?;

    let mut fields = serde_json::Map::new();
    fields.insert(field, serde_json::Value::String(value));

    let mutated = client
        .update_fields(&customer_id, &entity, &resource_name, &fields)
        .await?;
    eprintln!("Updated: {}", mutated);
    Ok(())
}

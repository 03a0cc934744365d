use ads_oauth::{OAUTH_CALLBACK_PORT, OAuthConfig, authorize};
use clap::Parser;
use std::io::Write;

/// OAuth 2.0 helper tool for Google Ads API authentication
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// OAuth client ID
    #[arg(long, required = true)]
    client_id: String,

    /// OAuth client secret
    #[arg(long, required = true)]
    client_secret: String,

    /// Local port for the OAuth callback listener
    #[arg(long, default_value_t = OAUTH_CALLBACK_PORT)]
    port: u16,
}

fn ask_yes_no(question: &str) -> Result<bool, Box<dyn std::error::Error>> {
    eprint!("{} [y/N]: ", question);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = OAuthConfig::with_port(args.client_id, args.client_secret, args.port);

    // Visible retry loop: every attempt tears down and rebinds the listener,
    // and another round only happens when the operator asks for one.
    let refresh_token = loop {
        match authorize(&config).await {
            Ok(grant) => match grant.refresh_token {
                Some(token) => break token,
                None => {
                    eprintln!(
                        "The provider did not return a refresh token \
                        (consent may have been granted under another flow)."
                    );
                }
            },
            Err(e) => eprintln!("Authorization failed: {}", e),
        }

        if !ask_yes_no("Retry the authorization flow?")? {
            return Err("Authorization abandoned by operator".into());
        }
    };

    // The refresh token goes to stdout so it can be captured by scripts;
    // everything else stays on stderr.
    println!("{}", refresh_token);
    eprintln!("\nStore this refresh token in your ads-credentials.env file.");

    Ok(())
}

//! Interactive setup: fill in missing credentials, obtain a refresh token
//! through the browser flow, and construct an authenticated API client.

use crate::config::Credentials;
use crate::prompt;
use ads_oauth::OAuthConfig;
use gaql_client::GoogleAdsClient;

/// Build the OAuth configuration from the credential bundle
pub fn oauth_config(credentials: &Credentials) -> OAuthConfig {
    OAuthConfig::new(
        credentials.client_id.clone(),
        credentials.client_secret.clone(),
    )
}

/// Prompt for any missing required credential (developer token, client id,
/// client secret). A configuration gap is never a hard failure; it is
/// resolved here before any API call proceeds.
pub fn ensure_api_credentials(
    credentials: &mut Credentials,
) -> Result<(), Box<dyn std::error::Error>> {
    if credentials.has_api_credentials() {
        return Ok(());
    }

    eprintln!(
        "Missing required credentials: {}",
        credentials.missing_api_credentials().join(", ")
    );

    if credentials.developer_token.trim().is_empty() {
        credentials.developer_token = prompt::prompt_nonempty("Developer token")?;
    }
    if credentials.client_id.trim().is_empty() {
        credentials.client_id = prompt::prompt_nonempty("OAuth client ID")?;
    }
    if credentials.client_secret.trim().is_empty() {
        credentials.client_secret = prompt::prompt_nonempty("OAuth client secret")?;
    }

    Ok(())
}

/// Run the browser authorization flow until a refresh token is stored.
///
/// Every failed attempt (exchange error, or a grant without a refresh
/// token) is reported and the operator decides whether to run another
/// round; declining falls back to pasting a refresh token manually. The
/// listener is torn down and rebound between attempts.
pub async fn obtain_refresh_token(
    credentials: &mut Credentials,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = oauth_config(credentials);

    loop {
        match ads_oauth::authorize(&config).await {
            Ok(grant) => {
                if let Some(token) = grant.refresh_token {
                    credentials.refresh_token = Some(token);
                    return Ok(());
                }
                eprintln!(
                    "The provider did not return a refresh token \
                    (consent may already be granted under another flow)."
                );
            }
            Err(e) => eprintln!("Authorization failed: {}", e),
        }

        // Stored credentials are untouched on failure; the operator picks
        // the next step.
        if !prompt::ask_yes_no("Retry the authorization flow?")? {
            let token = prompt::prompt_nonempty("Paste a refresh token manually")?;
            credentials.refresh_token = Some(token);
            return Ok(());
        }
    }
}

/// Make sure a refresh token is present, running the flow if needed
pub async fn ensure_refresh_token(
    credentials: &mut Credentials,
) -> Result<(), Box<dyn std::error::Error>> {
    if credentials.require_refresh_token().is_ok() {
        return Ok(());
    }
    eprintln!("No refresh token configured; starting authorization setup.");
    obtain_refresh_token(credentials).await
}

/// Mint an access token from the stored refresh token and construct the
/// API client
pub async fn build_client(
    credentials: &Credentials,
) -> Result<GoogleAdsClient, Box<dyn std::error::Error>> {
    let refresh_token = credentials.require_refresh_token()?;
    let config = oauth_config(credentials);

    eprintln!("Refreshing access token...");
    let access_token = ads_oauth::refresh_access_token(&config, refresh_token).await?;

    Ok(GoogleAdsClient::new(
        credentials.developer_token.clone(),
        access_token,
        credentials.login_customer_id.clone(),
    ))
}

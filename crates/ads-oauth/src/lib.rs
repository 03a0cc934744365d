pub mod server;

pub use server::CaptureServer;

/// Default OAuth callback port
pub const OAUTH_CALLBACK_PORT: u16 = 8080;

/// Google OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth 2.0 token endpoint
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// OAuth scope covering the Google Ads API
pub const ADWORDS_SCOPE: &str = "https://www.googleapis.com/auth/adwords";

/// Result of a token-endpoint exchange
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token, when the provider issued one. Google omits it when
    /// consent was already granted under another flow path.
    pub refresh_token: Option<String>,
}

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Local port the callback listener binds to
    pub callback_port: u16,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    /// OAuth scope(s)
    pub scope: String,
    /// Authorization endpoint (Google's unless overridden for tests)
    pub auth_endpoint: String,
    /// Token endpoint (Google's unless overridden for tests)
    pub token_endpoint: String,
}

impl OAuthConfig {
    /// Create new OAuth configuration with Google Ads defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self::with_port(client_id, client_secret, OAUTH_CALLBACK_PORT)
    }

    /// Create a configuration with a specific callback port
    pub fn with_port(client_id: String, client_secret: String, port: u16) -> Self {
        Self {
            client_id,
            client_secret,
            callback_port: port,
            redirect_uri: format!("http://localhost:{}/", port),
            scope: ADWORDS_SCOPE.to_string(),
            auth_endpoint: GOOGLE_AUTH_ENDPOINT.to_string(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
        }
    }
}

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use rand::Rng;
    use rand::distributions::Alphanumeric;
    use sha2::{Digest, Sha256};

    // Generate random verifier (43-128 characters) using cryptographically secure RNG
    let verifier: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // Generate challenge: base64url(SHA256(verifier))
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Generate authorization URL. `access_type=offline` together with
/// `prompt=consent` forces Google to issue a refresh token even when the
/// user granted consent before.
pub fn generate_auth_url(config: &OAuthConfig) -> (String, String) {
    let (verifier, challenge) = generate_pkce();

    let auth_url = format!(
        "{}?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline&\
        prompt=consent",
        config.auth_endpoint,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(&challenge),
    );

    (auth_url, verifier)
}

/// Exchange authorization code for tokens. A missing `refresh_token` in the
/// response is not an error here; the caller decides whether to retry the
/// flow or fall back to manual entry.
pub async fn exchange_code(
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenGrant, Box<dyn std::error::Error>> {
    eprintln!("Exchanging authorization code for tokens...");

    let client = reqwest::Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];

    let response = client
        .post(&config.token_endpoint)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await?;
        return Err(format!(
            "Failed to exchange authorization code (status {}): {}",
            status, body
        )
        .into());
    }

    let token_response: serde_json::Value = response.json().await?;

    let access_token = token_response
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or("Missing access_token in token response")?
        .to_string();

    let refresh_token = token_response
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let grant = TokenGrant {
        access_token,
        refresh_token,
    };

    eprintln!("Successfully obtained OAuth tokens");

    Ok(grant)
}

/// Mint a fresh access token from a stored refresh token
pub async fn refresh_access_token(
    config: &OAuthConfig,
    refresh_token: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = client
        .post(&config.token_endpoint)
        .form(&params)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await?;
        return Err(format!(
            "Failed to refresh OAuth token (status {}): {}",
            status, body
        )
        .into());
    }

    let refresh_response: serde_json::Value = response.json().await?;

    let access_token = refresh_response
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or("Missing access_token in refresh response")?
        .to_string();

    Ok(access_token)
}

/// Run one pass of the authorization flow: bind the callback listener,
/// print the authorization URL, wait for the browser redirect (no timeout;
/// the operator either completes the flow or interrupts the process), then
/// exchange the code. Retry policy belongs to the caller.
pub async fn authorize(config: &OAuthConfig) -> Result<TokenGrant, Box<dyn std::error::Error>> {
    let server = CaptureServer::bind(config.callback_port).await?;

    let (auth_url, verifier) = generate_auth_url(config);

    eprintln!("\n=================================================");
    eprintln!("OAuth 2.0 Authorization Required");
    eprintln!("=================================================");
    eprintln!("\nPlease visit the following URL to authorize the application:\n");
    eprintln!("{}\n", auth_url);
    eprintln!("Waiting for authorization...");
    eprintln!("=================================================\n");

    let code = server.wait_for_code().await?;

    exchange_code(config, &code, &verifier).await
}

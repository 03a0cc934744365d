//! Credential bundle for the Google Ads API scripts.
//!
//! Loaded once at startup from a key=value file plus `GOOGLE_ADS_*`
//! environment overrides, then passed by reference to each operation.
//! Persisted back to the same file at the end of interactive setup.

/// Default credential file next to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "ads-credentials.env";

const KEY_DEVELOPER_TOKEN: &str = "GOOGLE_ADS_DEVELOPER_TOKEN";
const KEY_CLIENT_ID: &str = "GOOGLE_ADS_CLIENT_ID";
const KEY_CLIENT_SECRET: &str = "GOOGLE_ADS_CLIENT_SECRET";
const KEY_REFRESH_TOKEN: &str = "GOOGLE_ADS_REFRESH_TOKEN";
const KEY_CUSTOMER_ID: &str = "GOOGLE_ADS_CUSTOMER_ID";
const KEY_LOGIN_CUSTOMER_ID: &str = "GOOGLE_ADS_LOGIN_CUSTOMER_ID";

/// Everything the scripts need to talk to the API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Google Ads developer token
    pub developer_token: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Long-lived OAuth refresh token
    pub refresh_token: Option<String>,
    /// Active customer account id
    pub customer_id: Option<String>,
    /// Manager (login) customer id, when operating under an MCC
    pub login_customer_id: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

impl Credentials {
    /// Parse key=value content. Unknown keys, blank lines and `#` comments
    /// are ignored.
    pub fn parse(content: &str) -> Self {
        let mut credentials = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                credentials.set(key.trim(), value.trim());
            }
        }
        credentials
    }

    fn set(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key {
            KEY_DEVELOPER_TOKEN => self.developer_token = value,
            KEY_CLIENT_ID => self.client_id = value,
            KEY_CLIENT_SECRET => self.client_secret = value,
            KEY_REFRESH_TOKEN => self.refresh_token = non_empty(value),
            KEY_CUSTOMER_ID => self.customer_id = non_empty(value),
            KEY_LOGIN_CUSTOMER_ID => self.login_customer_id = non_empty(value),
            _ => {}
        }
    }

    /// Apply overrides from (key, value) pairs; non-empty values win over
    /// whatever the file had. Split out from [`Credentials::load`] so tests
    /// do not have to mutate process environment.
    pub fn apply_overrides<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in pairs {
            if !value.trim().is_empty() {
                self.set(&key, &value);
            }
        }
    }

    /// Load from a key=value file (a missing file yields empty credentials),
    /// then let `GOOGLE_ADS_*` environment variables take precedence.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut credentials = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(format!("Failed to read config file '{}': {}", path, e).into()),
        };
        credentials.apply_overrides(std::env::vars().filter(|(k, _)| k.starts_with("GOOGLE_ADS_")));
        Ok(credentials)
    }

    /// Render back to key=value form
    pub fn render(&self) -> String {
        let mut out = String::from("# Google Ads API credentials\n");
        out.push_str(&format!("{}={}\n", KEY_DEVELOPER_TOKEN, self.developer_token));
        out.push_str(&format!("{}={}\n", KEY_CLIENT_ID, self.client_id));
        out.push_str(&format!("{}={}\n", KEY_CLIENT_SECRET, self.client_secret));
        out.push_str(&format!(
            "{}={}\n",
            KEY_REFRESH_TOKEN,
            self.refresh_token.as_deref().unwrap_or("")
        ));
        out.push_str(&format!(
            "{}={}\n",
            KEY_CUSTOMER_ID,
            self.customer_id.as_deref().unwrap_or("")
        ));
        out.push_str(&format!(
            "{}={}\n",
            KEY_LOGIN_CUSTOMER_ID,
            self.login_customer_id.as_deref().unwrap_or("")
        ));
        out
    }

    /// Save to file with secure permissions (owner read/write only) on
    /// Unix-like systems
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.render())
            .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions).map_err(|e| {
                format!("Failed to set permissions on config file '{}': {}", path, e)
            })?;
        }

        Ok(())
    }

    /// Developer token, client id and client secret must be non-empty
    /// before any API call is attempted
    pub fn has_api_credentials(&self) -> bool {
        !self.developer_token.trim().is_empty()
            && !self.client_id.trim().is_empty()
            && !self.client_secret.trim().is_empty()
    }

    /// Names of the required credentials still missing
    pub fn missing_api_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.developer_token.trim().is_empty() {
            missing.push("developer token");
        }
        if self.client_id.trim().is_empty() {
            missing.push("client ID");
        }
        if self.client_secret.trim().is_empty() {
            missing.push("client secret");
        }
        missing
    }

    /// Refresh token, required before any authenticated call
    pub fn require_refresh_token(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.refresh_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| "No refresh token configured; run the authorization setup first".into())
    }
}

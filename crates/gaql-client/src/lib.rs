//! REST client for the Google Ads API.
//!
//! Covers the small surface the console scripts need: accessible-account
//! listing, paginated GAQL search, and field mutation by resource name.
//! Query construction for reports lives in [`query::ReportQuery`].

pub mod query;

pub use query::ReportQuery;

/// Production API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://googleads.googleapis.com";

/// API version path segment
pub const API_VERSION: &str = "v17";

/// Google Ads API client over REST
pub struct GoogleAdsClient {
    http: reqwest::Client,
    endpoint: String,
    developer_token: String,
    access_token: String,
    login_customer_id: Option<String>,
}

/// Strip the dashes people habitually write into customer ids (123-456-7890).
pub fn normalize_customer_id(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-').collect()
}

impl GoogleAdsClient {
    /// Create a client against the production endpoint
    pub fn new(
        developer_token: String,
        access_token: String,
        login_customer_id: Option<String>,
    ) -> Self {
        Self::with_endpoint(
            DEFAULT_ENDPOINT.to_string(),
            developer_token,
            access_token,
            login_customer_id,
        )
    }

    /// Create a client against a specific endpoint (tests point this at a stub)
    pub fn with_endpoint(
        endpoint: String,
        developer_token: String,
        access_token: String,
        login_customer_id: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            developer_token,
            access_token,
            login_customer_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.endpoint, API_VERSION, path)
    }

    fn apply_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("developer-token", &self.developer_token)
            .bearer_auth(&self.access_token);
        match &self.login_customer_id {
            Some(id) => request.header("login-customer-id", normalize_customer_id(id)),
            None => request,
        }
    }

    async fn check(
        response: reqwest::Response,
        what: &str,
    ) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("Failed to {} (status {}): {}", what, status, body).into());
        }
        Ok(response.json().await?)
    }

    /// List the customer resource names the authenticated user can access
    pub async fn list_accessible_customers(
        &self,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let request = self
            .http
            .get(self.url("customers:listAccessibleCustomers"));
        let response = self.apply_headers(request).send().await?;
        let body = Self::check(response, "list accessible customers").await?;

        let names = body
            .get("resourceNames")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Ok(names)
    }

    /// Execute a GAQL query, following pagination until all rows are in
    pub async fn search(
        &self,
        customer_id: &str,
        query: &str,
    ) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
        let customer_id = normalize_customer_id(customer_id);
        let path = format!("customers/{}/googleAds:search", customer_id);

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = serde_json::json!({ "query": query });
            if let Some(token) = &page_token {
                body["pageToken"] = serde_json::Value::String(token.clone());
            }

            let request = self.http.post(self.url(&path)).json(&body);
            let response = self.apply_headers(request).send().await?;
            let page = Self::check(response, "execute GAQL query").await?;

            if let Some(results) = page.get("results").and_then(|v| v.as_array()) {
                rows.extend(results.iter().cloned());
            }

            match page.get("nextPageToken").and_then(|v| v.as_str()) {
                Some(token) if !token.is_empty() => page_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(rows)
    }

    /// Update specific fields of a resource addressed by its resource name.
    ///
    /// The entity is the mutate service path segment (e.g. `campaigns`,
    /// `conversionActions`); the update mask is derived from the field keys.
    /// Returns the mutated resource name echoed by the API.
    pub async fn update_fields(
        &self,
        customer_id: &str,
        entity: &str,
        resource_name: &str,
        fields: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, Box<dyn std::error::Error>> {
        if fields.is_empty() {
            return Err("No fields given to update".into());
        }

        let customer_id = normalize_customer_id(customer_id);
        let path = format!("customers/{}/{}:mutate", customer_id, entity);

        let update_mask = fields.keys().cloned().collect::<Vec<_>>().join(",");
        let mut update = serde_json::Value::Object(fields.clone());
        update["resourceName"] = serde_json::Value::String(resource_name.to_string());

        let body = serde_json::json!({
            "operations": [{
                "update": update,
                "updateMask": update_mask,
            }],
        });

        let request = self.http.post(self.url(&path)).json(&body);
        let response = self.apply_headers(request).send().await?;
        let result = Self::check(response, &format!("mutate {}", entity)).await?;

        let mutated = result
            .get("results")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|r| r.get("resourceName"))
            .and_then(|v| v.as_str())
            .ok_or("Mutate response missing resourceName")?;

        Ok(mutated.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    /// Captured request: path, selected headers, parsed JSON body (if any).
    #[derive(Clone, Debug)]
    struct Captured {
        path: String,
        developer_token: String,
        authorization: String,
        login_customer_id: Option<String>,
        body: Option<serde_json::Value>,
    }

    type Capture = Arc<Mutex<Vec<Captured>>>;

    /// Stub API server: records every request and answers from the given
    /// queue of JSON bodies (last entry repeats).
    async fn start_api_stub(responses: Vec<serde_json::Value>) -> (String, Capture) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let capture: Capture = Arc::new(Mutex::new(Vec::new()));

        let capture_clone = capture.clone();
        let responses = Arc::new(responses);

        let app = axum::Router::new().fallback(move |request: Request<Body>| {
            let capture = capture_clone.clone();
            let responses = responses.clone();
            async move {
                let path = request.uri().path().to_string();
                let headers = request.headers().clone();
                let bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                    .await
                    .unwrap();
                let body = serde_json::from_slice(&bytes).ok();

                let mut seen = capture.lock().await;
                let index = seen.len().min(responses.len() - 1);
                seen.push(Captured {
                    path,
                    developer_token: headers
                        .get("developer-token")
                        .map(|v| v.to_str().unwrap().to_string())
                        .unwrap_or_default(),
                    authorization: headers
                        .get("authorization")
                        .map(|v| v.to_str().unwrap().to_string())
                        .unwrap_or_default(),
                    login_customer_id: headers
                        .get("login-customer-id")
                        .map(|v| v.to_str().unwrap().to_string()),
                    body,
                });

                axum::Json(responses[index].clone())
            }
        });

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), capture)
    }

    fn test_client(endpoint: &str) -> GoogleAdsClient {
        GoogleAdsClient::with_endpoint(
            endpoint.to_string(),
            "DEV-TOKEN".into(),
            "ACCESS".into(),
            Some("111-222-3333".into()),
        )
    }

    #[test]
    fn customer_id_normalization_strips_dashes() {
        assert_eq!(normalize_customer_id("123-456-7890"), "1234567890");
        assert_eq!(normalize_customer_id("1234567890"), "1234567890");
    }

    #[tokio::test]
    async fn list_accessible_customers_returns_resource_names() {
        let (endpoint, capture) = start_api_stub(vec![serde_json::json!({
            "resourceNames": ["customers/1111111111", "customers/2222222222"],
        })])
        .await;

        let client = test_client(&endpoint);
        let names = client.list_accessible_customers().await.unwrap();

        assert_eq!(names, vec!["customers/1111111111", "customers/2222222222"]);

        let seen = capture.lock().await;
        assert_eq!(
            seen[0].path,
            format!("/{}/customers:listAccessibleCustomers", API_VERSION)
        );
        assert_eq!(seen[0].developer_token, "DEV-TOKEN");
        assert_eq!(seen[0].authorization, "Bearer ACCESS");
        assert_eq!(seen[0].login_customer_id.as_deref(), Some("1112223333"));
    }

    #[tokio::test]
    async fn search_follows_pagination() {
        let (endpoint, capture) = start_api_stub(vec![
            serde_json::json!({
                "results": [{"campaign": {"id": "1"}}, {"campaign": {"id": "2"}}],
                "nextPageToken": "P2",
            }),
            serde_json::json!({
                "results": [{"campaign": {"id": "3"}}],
            }),
        ])
        .await;

        let client = test_client(&endpoint);
        let rows = client
            .search("123-456-7890", "SELECT campaign.id FROM campaign")
            .await
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["campaign"]["id"], "3");

        let seen = capture.lock().await;
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[0].path,
            format!("/{}/customers/1234567890/googleAds:search", API_VERSION)
        );
        assert_eq!(
            seen[0].body.as_ref().unwrap()["query"],
            "SELECT campaign.id FROM campaign"
        );
        assert!(seen[0].body.as_ref().unwrap().get("pageToken").is_none());
        assert_eq!(seen[1].body.as_ref().unwrap()["pageToken"], "P2");
    }

    #[tokio::test]
    async fn search_surfaces_api_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().fallback(|| async {
            (
                axum::http::StatusCode::FORBIDDEN,
                r#"{"error":{"message":"The developer token is not approved"}}"#,
            )
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = test_client(&format!("http://{}", addr));
        let err = client
            .search("1234567890", "SELECT campaign.id FROM campaign")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("status 403"));
        assert!(err.to_string().contains("developer token"));
    }

    #[tokio::test]
    async fn update_fields_sends_update_mask_and_resource_name() {
        let (endpoint, capture) = start_api_stub(vec![serde_json::json!({
            "results": [{"resourceName": "customers/1234567890/conversionActions/456"}],
        })])
        .await;

        let client = test_client(&endpoint);
        let mut fields = serde_json::Map::new();
        fields.insert("status".into(), serde_json::json!("ENABLED"));

        let mutated = client
            .update_fields(
                "1234567890",
                "conversionActions",
                "customers/1234567890/conversionActions/456",
                &fields,
            )
            .await
            .unwrap();

        assert_eq!(mutated, "customers/1234567890/conversionActions/456");

        let seen = capture.lock().await;
        assert_eq!(
            seen[0].path,
            format!(
                "/{}/customers/1234567890/conversionActions:mutate",
                API_VERSION
            )
        );
        let body = seen[0].body.as_ref().unwrap();
        let op = &body["operations"][0];
        assert_eq!(op["updateMask"], "status");
        assert_eq!(op["update"]["status"], "ENABLED");
        assert_eq!(
            op["update"]["resourceName"],
            "customers/1234567890/conversionActions/456"
        );
    }

    #[tokio::test]
    async fn update_fields_rejects_empty_field_set() {
        let client = test_client("http://127.0.0.1:1");
        let fields = serde_json::Map::new();
        let err = client
            .update_fields("1234567890", "campaigns", "customers/1/campaigns/2", &fields)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No fields"));
    }
}

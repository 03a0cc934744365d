//! GAQL report-query builder.

use crate::GoogleAdsClient;

/// Builder for the entity/attributes/metrics/constraints style of report
/// call. `build` renders the GAQL string; `run` executes it through
/// [`GoogleAdsClient::search`].
#[derive(Debug, Clone)]
pub struct ReportQuery {
    entity: String,
    attributes: Vec<String>,
    metrics: Vec<String>,
    segments: Vec<String>,
    constraints: Vec<String>,
    date_range: Option<(String, String)>,
    order_by: Option<String>,
    limit: Option<u64>,
}

impl ReportQuery {
    /// Start a report over the given reporting entity (the FROM clause)
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            attributes: Vec::new(),
            metrics: Vec::new(),
            segments: Vec::new(),
            constraints: Vec::new(),
            date_range: None,
            order_by: None,
            limit: None,
        }
    }

    /// Select an attribute field (e.g. `campaign.name`)
    pub fn attribute(mut self, field: impl Into<String>) -> Self {
        self.attributes.push(field.into());
        self
    }

    /// Select a metric; bare names are prefixed with `metrics.`
    pub fn metric(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if field.contains('.') {
            self.metrics.push(field);
        } else {
            self.metrics.push(format!("metrics.{}", field));
        }
        self
    }

    /// Select a segment; bare names are prefixed with `segments.`
    pub fn segment(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if field.contains('.') {
            self.segments.push(field);
        } else {
            self.segments.push(format!("segments.{}", field));
        }
        self
    }

    /// Add a WHERE condition; conditions are AND-ed together
    pub fn constraint(mut self, condition: impl Into<String>) -> Self {
        self.constraints.push(condition.into());
        self
    }

    /// Restrict to a date range (inclusive, YYYY-MM-DD)
    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.date_range = Some((start.into(), end.into()));
        self
    }

    /// ORDER BY clause body (e.g. `metrics.impressions DESC`)
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    /// LIMIT clause
    pub fn limit(mut self, rows: u64) -> Self {
        self.limit = Some(rows);
        self
    }

    /// Render the GAQL string
    pub fn build(&self) -> Result<String, Box<dyn std::error::Error>> {
        let mut selected: Vec<&str> = Vec::new();
        selected.extend(self.attributes.iter().map(String::as_str));
        selected.extend(self.segments.iter().map(String::as_str));
        selected.extend(self.metrics.iter().map(String::as_str));

        if selected.is_empty() {
            return Err(format!("Report over '{}' selects no fields", self.entity).into());
        }
        if self.entity.trim().is_empty() {
            return Err("Report entity is empty".into());
        }

        let mut query = format!("SELECT {} FROM {}", selected.join(", "), self.entity);

        let mut conditions = self.constraints.clone();
        if let Some((start, end)) = &self.date_range {
            conditions.push(format!("segments.date BETWEEN '{}' AND '{}'", start, end));
        }
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        if let Some(order) = &self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        if let Some(limit) = self.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(query)
    }

    /// Build and execute against a customer account
    pub async fn run(
        &self,
        client: &GoogleAdsClient,
        customer_id: &str,
    ) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
        let query = self.build()?;
        client.search(customer_id, &query).await
    }
}

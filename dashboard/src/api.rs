use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::errors::DashboardError;

/// Port the traffic API listens on, on the same host as the page.
pub const API_PORT: u16 = 8000;

/// Flat query parameters, serialized in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

/// Outcome of one API call. Transport and decoding failures never escape as
/// `Err`; they become [`ApiResponse::Error`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Status { status: u16, data: Value },
    Error { error: String },
}

impl ApiResponse {
    /// Only an exact 200 counts as success.
    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Status { status: 200, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiResponse::Status { status, .. } => Some(*status),
            ApiResponse::Error { .. } => None,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiResponse::Status { data, .. } => Some(data),
            ApiResponse::Error { .. } => None,
        }
    }

    /// Text shown for a failed call: the transport message, or the payload as compact JSON.
    pub fn failure_message(&self) -> String {
        match self {
            ApiResponse::Error { error } => error.clone(),
            ApiResponse::Status { data, .. } => normalize_numbers(data).to_string(),
        }
    }
}

/// Integral floats as JavaScript prints them, `33.0` becomes `33`.
pub fn normalize_numbers(value: &Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
                Value::from(f as i64)
            }
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), normalize_numbers(item)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// `http://<host>:8000`, the API served next to the page.
    pub fn from_page_host(host: &str) -> Result<Self, DashboardError> {
        let base_url = Url::parse(&format!("http://{}:{}", host, API_PORT))?;
        Ok(Self::new(base_url))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint_url(&self, endpoint: &str, params: &QueryParams) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if params.is_empty() {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}{}?{}", base, endpoint, params.to_query_string())
        }
    }

    pub async fn fetch_api(&self, endpoint: &str, params: &QueryParams) -> ApiResponse {
        let url = self.endpoint_url(endpoint, params);
        log::debug!("GET {}", url);

        match self.get_json(&url).await {
            Ok((status, data)) => ApiResponse::Status { status, data },
            Err(e) => {
                log::warn!("Request to {} failed: {}", url, e);
                ApiResponse::Error {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn get_json(&self, url: &str) -> Result<(u16, Value), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let data = response.json::<Value>().await?;
        Ok((status, data))
    }
}

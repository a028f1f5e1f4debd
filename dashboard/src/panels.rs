use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{normalize_numbers, ApiClient, ApiResponse, QueryParams};
use crate::page::{escape_html, LinkForm, Prompt, QueryPanel, RecentForm, StatsPanel, Status};

pub const DEFAULT_MINUTES: &str = "10";
pub const DEFAULT_LIMIT: &str = "100";
pub const LINK_QUERY_LIMIT: u32 = 50;
pub const LINK_ID_REQUIRED: &str = "Please enter a link ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkId::Text(text) => write!(f, "{}", text),
            LinkId::Number(number) => write!(f, "{}", number),
        }
    }
}

/// One row of `/api/traffic/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub link_id: LinkId,
    pub avg_speed_mean: f64,
    pub count: u64,
}

/// JSON with 2-space indentation.
pub fn pretty_json(value: &Value) -> String {
    let value = normalize_numbers(value);
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

/// Two decimals, exact halves rounded away from zero as `toFixed(2)` does.
pub fn to_fixed_2(value: f64) -> String {
    // Wide enough to hold the exact expansion of any tie
    let exact = format!("{:.60}", value.abs());
    let tie = exact
        .split_once('.')
        .is_some_and(|(_, digits)| &digits[2..3] == "5" && digits[3..].bytes().all(|b| b == b'0'));
    if tie {
        format!("{:.2}", value + 0.001_f64.copysign(value))
    } else {
        format!("{:.2}", value)
    }
}

fn item_count(data: &Value) -> String {
    match data {
        Value::Array(items) => items.len().to_string(),
        _ => "n/a".to_string(),
    }
}

fn listing_html(label: &str, data: &Value) -> String {
    format!(
        "<span class=\"success\">{}: {}</span>\n\n{}",
        label,
        item_count(data),
        escape_html(&pretty_json(data))
    )
}

fn error_html(message: &str) -> String {
    format!(
        r#"<span class="error">Error: {}</span>"#,
        escape_html(message)
    )
}

fn render_failure(panel: &mut QueryPanel, result: &ApiResponse, status_text: &str) {
    panel.status.set(Status::Error, status_text);
    panel.result.set_html(error_html(&result.failure_message()));
}

fn render_listing(panel: &mut QueryPanel, result: &ApiResponse, label: &str) {
    match result.data() {
        Some(data) if result.is_ok() => {
            panel.status.set(Status::Success, "Success");
            panel.result.set_html(listing_html(label, data));
        }
        _ => render_failure(panel, result, "Failed"),
    }
}

pub fn stats_table(records: &[LinkStats]) -> String {
    let mut html =
        String::from("<table><tr><th>Link ID</th><th>Average speed</th><th>Samples</th></tr>");
    for record in records {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{} km/h</td><td>{}</td></tr>",
            escape_html(&record.link_id.to_string()),
            to_fixed_2(record.avg_speed_mean),
            record.count
        ));
    }
    html.push_str("</table>");
    html
}

/// Recent traffic records, `minutes` and `limit` defaulting to 10 and 100.
pub async fn get_recent_traffic(api: &ApiClient, form: &RecentForm, panel: &mut QueryPanel) {
    panel.begin_loading();

    let params = QueryParams::new()
        .with("minutes", form.minutes.value_or(DEFAULT_MINUTES))
        .with("limit", form.limit.value_or(DEFAULT_LIMIT))
        .with("skip", 0);
    let result = api.fetch_api("/api/traffic/recent", &params).await;
    render_listing(panel, &result, "Items");
}

/// Records of one link. A blank link ID is refused before any request.
pub async fn get_traffic_by_link(
    api: &ApiClient,
    form: &LinkForm,
    panel: &mut QueryPanel,
    prompt: &dyn Prompt,
) {
    let Some(link_id) = form.link_id.value() else {
        prompt.alert(LINK_ID_REQUIRED);
        return;
    };

    panel.begin_loading();

    let endpoint = format!("/api/traffic/link/{}", urlencoding::encode(link_id));
    let params = QueryParams::new().with("limit", LINK_QUERY_LIMIT);
    let result = api.fetch_api(&endpoint, &params).await;
    render_listing(panel, &result, "Items");
}

pub async fn get_traffic_stats(api: &ApiClient, panel: &mut StatsPanel) {
    panel.panel.begin_loading();

    let result = api.fetch_api("/api/traffic/stats", &QueryParams::new()).await;
    let data = match result.data() {
        Some(data) if result.is_ok() => data,
        _ => {
            render_failure(&mut panel.panel, &result, "Failed");
            panel.table.clear();
            return;
        }
    };

    match serde_json::from_value::<Vec<LinkStats>>(data.clone()) {
        Ok(records) => {
            panel.panel.status.set(Status::Success, "Success");
            panel.panel.result.set_html(listing_html("Links", data));
            panel.table.set_html(stats_table(&records));
        }
        Err(e) => {
            log::error!("Unexpected stats payload: {}", e);
            panel.panel.status.set(Status::Error, "Failed");
            panel
                .panel
                .result
                .set_html(error_html(&format!("unexpected stats payload: {}", e)));
            panel.table.clear();
        }
    }
}

pub async fn get_health(api: &ApiClient, panel: &mut QueryPanel) {
    panel.begin_loading();

    let result = api.fetch_api("/health", &QueryParams::new()).await;
    match result.data() {
        Some(data) if result.is_ok() => {
            panel.status.set(Status::Success, "Server OK");
            panel.result.set_html(format!(
                r#"<span class="success">{}</span>"#,
                escape_html(&pretty_json(data))
            ));
        }
        _ => render_failure(panel, &result, "Server error"),
    }
}

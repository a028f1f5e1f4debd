//! Headless page model.
//!
//! Every element carries the identifier the page template uses for it, so the
//! rendered document keeps the same element contract as the browser page.
//! Functions that write to the page receive the elements they own instead of
//! looking them up by identifier.

use std::fmt::Write as _;

use crate::cctv::CctvPanel;
use crate::video::MediaCapabilities;

pub const LOADING_TEXT: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Loading,
    Success,
    Error,
}

impl Status {
    pub fn class(&self) -> &'static str {
        match self {
            Status::Loading => "status loading",
            Status::Success => "status success",
            Status::Error => "status error",
        }
    }
}

/// Escape text for HTML element content. Quotes are left as they are.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Blocking user prompt
pub trait Prompt {
    fn alert(&self, message: &str);
}

/// Prints alerts on the terminal.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn alert(&self, message: &str) {
        log::warn!("Alert: {}", message);
        eprintln!("{}", message);
    }
}

#[derive(Debug, Clone)]
pub struct StatusIndicator {
    id: String,
    text: String,
    status: Option<Status>,
}

impl StatusIndicator {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: String::new(),
            status: None,
        }
    }

    pub fn set(&mut self, status: Status, text: &str) {
        self.status = Some(status);
        self.text = text.to_string();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Hidden until the first `set`
    pub fn is_visible(&self) -> bool {
        self.status.is_some()
    }

    pub fn render(&self) -> String {
        match self.status {
            Some(status) => format!(
                r#"<div id="{}" class="{}" style="display: inline-block">{}</div>"#,
                self.id,
                status.class(),
                escape_html(&self.text)
            ),
            None => format!(
                r#"<div id="{}" class="status" style="display: none"></div>"#,
                self.id
            ),
        }
    }
}

/// Element whose inner HTML is replaced wholesale on every render.
#[derive(Debug, Clone)]
pub struct ResultArea {
    id: String,
    html: String,
}

impl ResultArea {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            html: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: String) {
        self.html = html;
    }

    pub fn clear(&mut self) {
        self.html.clear();
    }

    pub fn render(&self, tag: &str) -> String {
        format!(r#"<{tag} id="{}">{}</{tag}>"#, self.id, self.html)
    }
}

/// Text label, e.g. a CCTV stream name.
#[derive(Debug, Clone)]
pub struct Label {
    id: String,
    text: String,
}

impl Label {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn render(&self) -> String {
        format!(r#"<span id="{}">{}</span>"#, self.id, escape_html(&self.text))
    }
}

#[derive(Debug, Clone)]
pub struct InputField {
    id: String,
    value: String,
}

impl InputField {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            value: String::new(),
        }
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
    }

    /// Trimmed value, `None` when blank.
    pub fn value(&self) -> Option<&str> {
        let value = self.value.trim();
        (!value.is_empty()).then_some(value)
    }

    pub fn value_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.value().unwrap_or(default)
    }

    pub fn render(&self) -> String {
        format!(
            r#"<input id="{}" value="{}">"#,
            self.id,
            escape_html(&self.value).replace('"', "&quot;")
        )
    }
}

/// Result area plus status indicator of one query.
#[derive(Debug, Clone)]
pub struct QueryPanel {
    pub result: ResultArea,
    pub status: StatusIndicator,
}

impl QueryPanel {
    /// Elements `{prefix}-response` and `{prefix}-status`
    pub fn new(prefix: &str) -> Self {
        Self {
            result: ResultArea::new(&format!("{}-response", prefix)),
            status: StatusIndicator::new(&format!("{}-status", prefix)),
        }
    }

    pub fn begin_loading(&mut self) {
        self.result
            .set_html(format!(r#"<span class="loading">{}</span>"#, LOADING_TEXT));
        self.status.set(Status::Loading, LOADING_TEXT);
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.status.render(), self.result.render("pre"))
    }
}

#[derive(Debug, Clone)]
pub struct StatsPanel {
    pub panel: QueryPanel,
    pub table: ResultArea,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self {
            panel: QueryPanel::new("stats"),
            table: ResultArea::new("stats-table"),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}", self.panel.render(), self.table.render("div"))
    }
}

impl Default for StatsPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct RecentForm {
    pub minutes: InputField,
    pub limit: InputField,
}

impl Default for RecentForm {
    fn default() -> Self {
        Self {
            minutes: InputField::new("minutes"),
            limit: InputField::new("limit"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkForm {
    pub link_id: InputField,
}

impl Default for LinkForm {
    fn default() -> Self {
        Self {
            link_id: InputField::new("linkId"),
        }
    }
}

pub struct DashboardPage {
    pub recent_form: RecentForm,
    pub recent: QueryPanel,
    pub link_form: LinkForm,
    pub link: QueryPanel,
    pub stats: StatsPanel,
    pub health: QueryPanel,
    pub cctv: CctvPanel,
}

impl DashboardPage {
    pub fn new(cctv_slots: usize, capabilities: MediaCapabilities) -> Self {
        Self {
            recent_form: RecentForm::default(),
            recent: QueryPanel::new("recent"),
            link_form: LinkForm::default(),
            link: QueryPanel::new("link"),
            stats: StatsPanel::new(),
            health: QueryPanel::new("health"),
            cctv: CctvPanel::new(cctv_slots, capabilities),
        }
    }

    pub async fn render_html(&self) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Traffic Dashboard</title></head>\n<body>\n");
        let _ = writeln!(
            html,
            "<section>\n<h2>Recent traffic</h2>\n{}\n{}\n{}\n</section>",
            self.recent_form.minutes.render(),
            self.recent_form.limit.render(),
            self.recent.render()
        );
        let _ = writeln!(
            html,
            "<section>\n<h2>Traffic by link</h2>\n{}\n{}\n</section>",
            self.link_form.link_id.render(),
            self.link.render()
        );
        let _ = writeln!(
            html,
            "<section>\n<h2>Link statistics</h2>\n{}\n</section>",
            self.stats.render()
        );
        let _ = writeln!(
            html,
            "<section>\n<h2>Health</h2>\n{}\n</section>",
            self.health.render()
        );
        let _ = writeln!(
            html,
            "<section>\n<h2>CCTV</h2>\n{}\n</section>",
            self.cctv.render().await
        );
        let _ = writeln!(
            html,
            "<footer>Rendered {}</footer>\n</body>\n</html>",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        html
    }
}

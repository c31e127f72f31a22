//! Server-rendered HTML for the three navigable views.
//!
//! DESIGN
//! ======
//! Page shells live in `templates/` with `{{PLACEHOLDER}}` slots filled by
//! plain string replacement. Every value that came from a user or an
//! external service goes through [`escape_html`] before it is inserted;
//! braces are escaped too so inserted text can never form a slot.

mod results;

pub use results::{ResultsView, render_results};

use time::OffsetDateTime;
use time::macros::format_description;

use crate::labels::SPORTS_LABELS;

const LAYOUT_TEMPLATE: &str = include_str!("../../templates/layout.html");
const LANDING_TEMPLATE: &str = include_str!("../../templates/landing.html");
const UPLOAD_TEMPLATE: &str = include_str!("../../templates/upload.html");

/// Chart labels longer than this are shortened.
const CHART_LABEL_MAX: usize = 15;
const CHART_LABEL_KEEP: usize = 12;

// =============================================================================
// NAVIGATION + NOTICES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Landing,
    Upload,
    Results,
}

impl Page {
    const ALL: [Page; 3] = [Page::Landing, Page::Upload, Page::Results];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Upload => "/upload",
            Self::Results => "/results",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Landing => "Home",
            Self::Upload => "Predict",
            Self::Results => "Results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message rendered at the top of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(title: &str, message: &str) -> Self {
        Self { kind: NoticeKind::Success, title: title.to_owned(), message: message.to_owned() }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, title: "Error".to_owned(), message: message.into() }
    }

    /// Notices reachable through a `?notice=` redirect after a successful POST.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            NOTICE_PREDICTED => Some(Self::success("Prediction complete!", "Your image has been classified.")),
            NOTICE_FEEDBACK_SENT => Some(Self::success("Thank you!", "Your feedback helps improve our model.")),
            _ => None,
        }
    }

    fn render(&self) -> String {
        let class = match self.kind {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        };
        format!(
            r#"<div class="notice {class}" role="status"><strong>{}</strong> {}</div>"#,
            escape_html(&self.title),
            escape_html(&self.message)
        )
    }
}

pub const NOTICE_PREDICTED: &str = "predicted";
pub const NOTICE_FEEDBACK_SENT: &str = "feedback-sent";

// =============================================================================
// PAGES
// =============================================================================

fn render_page(title: &str, active: Page, notice: Option<&Notice>, content: &str) -> String {
    let nav = Page::ALL
        .iter()
        .map(|page| {
            let class = if *page == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{}"{class}>{}</a>"#, page.path(), page.label())
        })
        .collect::<Vec<_>>()
        .join("\n    ");

    LAYOUT_TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{NAV}}", &nav)
        .replace("{{NOTICE}}", &notice.map(Notice::render).unwrap_or_default())
        .replace("{{CONTENT}}", content)
}

#[must_use]
pub fn render_landing() -> String {
    let content = LANDING_TEMPLATE.replace("{{LABEL_COUNT}}", &SPORTS_LABELS.len().to_string());
    render_page("Home", Page::Landing, None, &content)
}

#[must_use]
pub fn render_upload(notice: Option<&Notice>) -> String {
    let content = UPLOAD_TEMPLATE.replace("{{LABEL_COUNT}}", &SPORTS_LABELS.len().to_string());
    render_page("Predict", Page::Upload, notice, &content)
}

// =============================================================================
// FORMATTING
// =============================================================================

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Confidence in [0,1] as a whole percent. Values outside the range are
/// shown as-is.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

/// `Oct 16, 03:04 PM UTC`
#[must_use]
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [hour repr:12]:[minute] [period]");
    ts.format(&format)
        .map(|s| format!("{s} UTC"))
        .unwrap_or_else(|_| ts.to_string())
}

/// Shortened label for the confidence chart axis.
#[must_use]
pub fn chart_label(sport: &str) -> String {
    if sport.chars().count() > CHART_LABEL_MAX {
        let kept: String = sport.chars().take(CHART_LABEL_KEEP).collect();
        format!("{kept}...")
    } else {
        sport.to_owned()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

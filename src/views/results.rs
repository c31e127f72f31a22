//! Results view: latest prediction, top-5 chart, feedback form, history.
//!
//! The empty store renders its own "No Predictions Yet" state; it is not an
//! error and shares nothing with the failure notice.

use std::fmt::Write as _;
use std::sync::Arc;

use super::{Notice, Page, chart_label, escape_html, format_timestamp, percent, render_page};
use crate::labels::SPORTS_LABELS;
use crate::store::PredictionResult;

/// Everything the results page needs, read from the store up front.
#[derive(Debug, Clone, Default)]
pub struct ResultsView {
    /// Prediction featured in the card, chart, popup and feedback form: the
    /// caller's own prediction when known, otherwise the newest one.
    pub latest: Option<Arc<PredictionResult>>,
    pub history: Vec<Arc<PredictionResult>>,
    /// History entry opened in the detail dialog.
    pub selected: Option<Arc<PredictionResult>>,
    pub notice: Option<Notice>,
    /// Show the result popup for a prediction that was just made.
    pub show_popup: bool,
    pub feedback_enabled: bool,
    pub feedback_submitted: bool,
}

const HEADER: &str = r#"<header style="text-align:center">
  <h1>Prediction <span class="gold">Results</span></h1>
  <p class="muted">View detailed analysis and confidence scores for your sports image predictions.</p>
</header>"#;

const EMPTY_STATE: &str = r#"<section class="card" style="text-align:center">
  <h2>No Predictions Yet</h2>
  <p class="muted">Upload a sports image to see the CNN model's prediction results.</p>
  <a class="button" href="/upload">Upload Image</a>
</section>"#;

#[must_use]
pub fn render_results(view: &ResultsView) -> String {
    let mut content = String::from(HEADER);

    match &view.latest {
        None => content.push_str(EMPTY_STATE),
        Some(latest) => {
            content.push_str(&latest_card(latest));
            content.push_str(&top_chart(latest));
            content.push_str(&model_info());
            if view.feedback_submitted {
                content.push_str(FEEDBACK_SUBMITTED);
            } else if view.feedback_enabled {
                content.push_str(&feedback_form(latest));
            }
            content.push_str(r#"<p><a class="button" href="/upload">New Prediction</a></p>"#);
        }
    }

    if !view.history.is_empty() {
        content.push_str(&history_grid(&view.history));
    }

    if view.show_popup {
        if let Some(latest) = &view.latest {
            content.push_str(&result_popup(latest));
        }
    }

    if let Some(selected) = &view.selected {
        content.push_str(&history_detail(selected));
    }

    render_page("Results", Page::Results, view.notice.as_ref(), &content)
}

fn latest_card(latest: &PredictionResult) -> String {
    format!(
        r#"<section class="card latest">
  <h2>Latest Prediction</h2>
  <img src="{image}" alt="Analyzed">
  <p class="muted">Detected Sport</p>
  <p style="font-size:2rem;font-weight:900;text-transform:capitalize" class="gold">{sport}</p>
  <p>Confidence <strong class="gold">{pct}%</strong> · Time <strong>{time}</strong></p>
</section>"#,
        image = escape_html(&latest.image_data),
        sport = escape_html(&latest.sport),
        pct = percent(latest.confidence),
        time = format_timestamp(latest.timestamp),
    )
}

fn top_chart(latest: &PredictionResult) -> String {
    let mut rows = String::new();
    for (idx, top) in latest.top_predictions.iter().enumerate() {
        let pct = percent(top.confidence);
        let width = pct.clamp(0, 100);
        let class = if idx == 0 { "bar top" } else { "bar" };
        let _ = write!(
            rows,
            r#"<div class="chart-row" title="{full}"><span>{label}</span><div class="{class}" style="width:{width}%"></div><span>{pct}%</span></div>"#,
            full = escape_html(&top.sport),
            label = escape_html(&chart_label(&top.sport)),
        );
    }
    format!(r#"<section class="card"><h2>Top 5 Predictions</h2>{rows}</section>"#)
}

fn model_info() -> String {
    let rows = [
        ("Architecture", "MobileNetV2".to_owned()),
        ("Classes", format!("{} Sports", SPORTS_LABELS.len())),
        ("Input Size", "224×224".to_owned()),
        ("Training", "Transfer Learning".to_owned()),
    ];
    let rows: String = rows
        .iter()
        .map(|(name, value)| format!(r#"<p class="spread"><span class="muted">{name}</span> <strong>{value}</strong></p>"#))
        .collect();
    format!(r#"<section class="card"><h3>Model Information</h3>{rows}</section>"#)
}

const FEEDBACK_SUBMITTED: &str = r#"<section class="card" style="text-align:center">
  <h3>Feedback Submitted!</h3>
  <p class="muted">Thanks for helping us improve.</p>
</section>"#;

fn feedback_form(latest: &PredictionResult) -> String {
    let options: String = SPORTS_LABELS
        .iter()
        .map(|sport| format!(r#"<option value="{sport}">{sport}</option>"#))
        .collect();
    format!(
        r#"<form class="card" method="post" action="/results/feedback" data-once>
  <h3>Was this prediction correct?</h3>
  <input type="hidden" name="prediction_id" value="{id}">
  <label><input type="radio" name="feedback_type" value="correct" required> Correct</label>
  <label><input type="radio" name="feedback_type" value="incorrect"> Incorrect</label>
  <p><label class="muted">What's the correct sport? (only when incorrect)
    <select name="correct_sport"><option value="">Select sport...</option>{options}</select></label></p>
  <p><label class="muted">Additional comments (optional)
    <textarea name="comment" rows="3" placeholder="Any additional feedback..."></textarea></label></p>
  <button class="button" type="submit">Submit Feedback</button>
</form>"#,
        id = latest.id,
    )
}

fn history_grid(history: &[Arc<PredictionResult>]) -> String {
    let mut items = String::new();
    for prediction in history {
        let _ = write!(
            items,
            r#"<a class="history-item" href="/results?selected={id}"><img src="{image}" alt="{sport}"><strong style="text-transform:capitalize">{sport}</strong><br><span class="gold">{pct}%</span> <span class="muted">{time}</span></a>"#,
            id = prediction.id,
            image = escape_html(&prediction.image_data),
            sport = escape_html(&prediction.sport),
            pct = percent(prediction.confidence),
            time = format_timestamp(prediction.timestamp),
        );
    }
    format!(r#"<section><h2>Prediction History</h2><div class="grid">{items}</div></section>"#)
}

fn result_popup(latest: &PredictionResult) -> String {
    format!(
        r#"<dialog open id="result-popup">
  <p class="muted">Prediction Result</p>
  <h2 class="gold" style="text-transform:capitalize">{sport}</h2>
  <p style="font-size:2rem;font-weight:900">{pct}%</p>
  <p class="muted">Our CNN model has classified your image with high confidence.</p>
  <a class="button" href="/results">Close</a>
</dialog>"#,
        sport = escape_html(&latest.sport),
        pct = percent(latest.confidence),
    )
}

fn history_detail(selected: &PredictionResult) -> String {
    let mut tops = String::new();
    for (rank, top) in selected.top_predictions.iter().take(3).enumerate() {
        let _ = write!(
            tops,
            r#"<div class="chart-row"><span>#{n} {sport}</span><span></span><span>{pct}%</span></div>"#,
            n = rank + 1,
            sport = escape_html(&top.sport),
            pct = percent(top.confidence),
        );
    }
    format!(
        r#"<dialog open id="history-detail">
  <img src="{image}" alt="{sport}">
  <h2 style="text-transform:capitalize">{sport}</h2>
  <p><span class="gold">{pct}% confidence</span> · <span class="muted">{time}</span></p>
  {tops}
  <a class="button" href="/results">Close</a>
</dialog>"#,
        image = escape_html(&selected.image_data),
        sport = escape_html(&selected.sport),
        pct = percent(selected.confidence),
        time = format_timestamp(selected.timestamp),
    )
}

#[cfg(test)]
#[path = "results_test.rs"]
mod tests;

//! Terminal and JSON output of a presence view.

use std::fmt::Write;

use lanyard_config::schema::DisplayConfig;
use lanyard_presence::display::{DisplayView, Platform};
use lanyard_presence::{Diagnostics, PresenceError, PresenceView};
use serde_json::json;

const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub json: bool,
    pub diagnostics: bool,
    pub raw_response_limit: usize,
    pub show_hidden_activities: bool,
}

impl RenderOptions {
    pub fn new(display: &DisplayConfig, diagnostics_flag: bool, json: bool) -> Self {
        Self {
            json,
            diagnostics: diagnostics_flag || display.show_diagnostics,
            raw_response_limit: display.raw_response_limit as usize,
            show_hidden_activities: display.show_hidden_activities,
        }
    }

    pub fn render(&self, view: &PresenceView, now_ms: i64) -> String {
        if self.json {
            self.render_json(view, now_ms)
        } else {
            self.render_card(view, now_ms)
        }
    }

    fn render_json(&self, view: &PresenceView, now_ms: i64) -> String {
        let display = view
            .snapshot
            .as_ref()
            .map(|s| DisplayView::project(s, now_ms, self.show_hidden_activities));
        let mut out = json!({
            "loading": view.loading,
            "snapshot": view.snapshot,
            "display": display,
            "error": view.error.as_ref().map(error_json),
        });
        if self.diagnostics {
            out["diagnostics"] = json!(view.diagnostics);
        }
        out.to_string()
    }

    fn render_card(&self, view: &PresenceView, now_ms: i64) -> String {
        let mut out = String::new();

        match &view.snapshot {
            Some(snapshot) => {
                let card = DisplayView::project(snapshot, now_ms, self.show_hidden_activities);
                write_card(&mut out, &card);
            }
            None if view.loading => out.push_str("Loading presence...\n"),
            None => out.push_str("No presence data.\n"),
        }

        // Transient errors are retried silently while nothing is shown yet.
        if let Some(err) = &view.error {
            if !(err.kind.is_transient() && view.loading) {
                let _ = writeln!(out, "\nerror: {} ({})", err.message, err.code());
            }
        }

        if self.diagnostics {
            write_diagnostics(&mut out, &view.diagnostics, self.raw_response_limit);
        }
        out
    }
}

fn error_json(err: &PresenceError) -> serde_json::Value {
    json!({
        "code": err.code(),
        "message": err.message,
        "endpoint": err.endpoint,
        "attempt": err.attempt,
        "statusCode": err.status_code,
        "details": err.details,
    })
}

fn write_card(out: &mut String, card: &DisplayView) {
    let _ = write!(out, "{}", card.display_name);
    if card.username != card.display_name {
        let _ = write!(out, " (@{})", card.username);
    }
    if let Some(clan) = &card.clan {
        let _ = write!(out, " [{}]", clan.tag);
    }
    out.push('\n');

    let _ = write!(out, "{}", card.status);
    match card.platform {
        Some(Platform::Mobile) => out.push_str(" on mobile"),
        Some(Platform::Desktop) => out.push_str(" on desktop"),
        None => {}
    }
    out.push('\n');

    for activity in &card.activities {
        let _ = writeln!(out, "\n  {}", activity.name);
        if let Some(details) = &activity.details {
            let _ = writeln!(out, "    {details}");
        }
        if let Some(state) = &activity.state {
            let _ = writeln!(out, "    {state}");
        }
        if let Some(elapsed) = &activity.elapsed {
            let _ = writeln!(out, "    {elapsed}");
        }
    }

    if let Some(music) = &card.music {
        let _ = writeln!(out, "\n  Listening to {} by {}", music.title, music.artist);
        if !music.album.is_empty() {
            let _ = writeln!(out, "    on {}", music.album);
        }
        let _ = writeln!(
            out,
            "    {} {} {}",
            music.position,
            progress_bar(music.percent),
            music.length
        );
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn write_diagnostics(out: &mut String, diag: &Diagnostics, limit: usize) {
    out.push_str("\n-- diagnostics --\n");
    let _ = writeln!(out, "connection:   {}", diag.transport);
    let _ = writeln!(out, "attempts:     {}", diag.attempts);
    let _ = writeln!(out, "last attempt: {}", diag.last_attempt.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out, "endpoint:     {}", diag.last_endpoint);
    if let Some(preview) = diag.response_preview(limit) {
        let _ = writeln!(out, "response:     {preview}");
    }
}

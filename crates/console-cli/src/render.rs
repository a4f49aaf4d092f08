use std::fmt::Write;

use colored::Colorize;
use console_metrics::{
    DeviceControl, HslaColor, InfoPanelOptions, MetricsSnapshot, PanelSection, ProcessorSeries,
    ViewState,
};

/// Multi-line text view of a snapshot, mirroring the console panel.
pub fn render_text(snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    if let Some(placeholder) = snapshot.view.placeholder() {
        let _ = writeln!(
            out,
            "{} ({})",
            placeholder.dimmed(),
            snapshot.connection.as_str()
        );
        if snapshot.view == ViewState::Disconnected {
            let _ = writeln!(
                out,
                "{}",
                "Connect to an agent to view metrics in real-time.".dimmed()
            );
        }
        return out;
    }

    if let Some(totals) = snapshot.totals {
        let _ = writeln!(out, "{}", "Token Usage".bold());
        for field in &snapshot.visible_token_fields {
            let _ = writeln!(out, "  {:<18} {}", field.title(), totals.get(*field));
        }
    }

    if !snapshot.series.is_empty() {
        let _ = writeln!(out, "{}", "TTFB Metrics".bold());
        for (series, chart) in snapshot.series.iter().zip(&snapshot.charts) {
            let (r, g, b) = hsl_to_rgb(&chart.border_color);
            let _ = writeln!(
                out,
                "  {} {}",
                "●".truecolor(r, g, b),
                series_line(series, chart.points.last().copied())
            );
        }
    }

    out
}

/// One-line summary used when streaming.
pub fn render_compact(snapshot: &MetricsSnapshot) -> String {
    let mut line = format!("[{}]", snapshot.connection.as_str());
    if let Some(totals) = snapshot.totals {
        for field in &snapshot.visible_token_fields {
            let _ = write!(line, " {}={}", field.as_str(), totals.get(*field));
        }
    }
    for (series, chart) in snapshot.series.iter().zip(&snapshot.charts) {
        if let Some(last) = chart.points.last() {
            let _ = write!(line, " {}={:.2}ms", series.processor, last);
        }
    }
    if let Some(placeholder) = snapshot.view.placeholder() {
        let _ = write!(line, " {}", placeholder);
    }
    line
}

/// Section outline of the session info panel.
pub fn render_panel(options: &InfoPanelOptions) -> String {
    let sections = options.layout();
    if sections.is_empty() {
        return "(info panel hidden)\n".to_string();
    }

    let mut out = String::new();
    for section in sections {
        match section {
            PanelSection::Status => {
                let _ = writeln!(out, "Status");
            }
            PanelSection::Devices { controls } => {
                let _ = writeln!(out, "Devices");
                for control in controls {
                    let name = match control {
                        DeviceControl::UserAudio => "user audio",
                        DeviceControl::UserVideo => "user video",
                        DeviceControl::AudioOutput => "audio output",
                    };
                    let _ = writeln!(out, "  {}", name);
                }
            }
            PanelSection::Session => {
                let _ = writeln!(out, "Session");
            }
        }
    }
    out
}

fn series_line(series: &ProcessorSeries, last_ms: Option<f64>) -> String {
    let mut line = format!("{:<28} n={:<3}", series.processor, series.len());
    if let Some(last) = last_ms {
        let _ = write!(line, " last={:>8.2} ms", last);
    }
    if let Some(mean) = series.mean_millis() {
        let _ = write!(line, " mean={:>8.2} ms", mean);
    }
    line
}

pub fn hsl_to_rgb(color: &HslaColor) -> (u8, u8, u8) {
    let h = f64::from(color.hue) / 360.0;
    let s = f64::from(color.saturation) / 100.0;
    let l = f64::from(color.lightness) / 100.0;

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };

    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

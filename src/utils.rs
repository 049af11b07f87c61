use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;
    let seconds = duration.num_seconds() % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parses a CLI weight argument: "bw" stands for bodyweight and logs as 0.
/// Negative weights are rejected.
pub fn parse_weight(arg: &str) -> Option<f32> {
    if arg.eq_ignore_ascii_case("bw") {
        return Some(0.0);
    }
    match arg.parse::<f32>() {
        Ok(w) if w >= 0.0 && w.is_finite() => Some(w),
        _ => None,
    }
}

pub fn display_weight(weight: f32) -> String {
    if weight == 0.0 {
        "bw".to_string()
    } else {
        format!("{}kg", weight)
    }
}

pub fn config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("setflow").join("config"))
        .context("Could not determine config directory")
}

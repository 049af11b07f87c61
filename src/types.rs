use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

pub static ALLOWED_MUSCLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "biceps",
        "triceps",
        "forearms",
        "chest",
        "shoulders",
        "back",
        "quads",
        "hamstrings",
        "glutes",
        "calves",
        "abs",
    ])
});

/// Returns the canonical lowercase muscle name or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let m = m.as_ref().trim().to_ascii_lowercase();
    if ALLOWED_MUSCLES.contains(m.as_str()) {
        Some(m)
    } else {
        None
    }
}

/// Return the closest allowed muscle for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_muscle_suggestion(input: &str) -> Option<&'static str> {
    let inp = input.to_ascii_lowercase();

    // Collect (muscle, score) pairs, highest score first.
    let mut scores: Vec<(&'static str, f64)> = ALLOWED_MUSCLES
        .iter()
        .copied()
        .map(|m| (m, jaro_winkler(&inp, m)))
        .collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (best, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Plain,
    Json,
}

/// Prints `data` as JSON in `--json` mode, otherwise runs the pretty
/// printer.
pub fn emit<T: Serialize>(fmt: OutputFmt, data: &T, pretty: impl FnOnce()) {
    match fmt {
        OutputFmt::Json => match serde_json::to_string_pretty(data) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("failed to serialize output: {}", e),
        },
        OutputFmt::Plain => pretty(),
    }
}

/// Key/value config backing the engine policies:
/// `user` (persistence key, defaults to "local") and
/// `rest_secs` (auto rest-timer duration; unset disables it).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config `{}`", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config `{}`", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating config directory `{}`", dir.display()))?;
        }
        let content = toml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing config `{}`", path.display()))
    }

    pub fn user(&self) -> String {
        self.map
            .get("user")
            .cloned()
            .unwrap_or_else(|| "local".to_string())
    }

    pub fn rest_secs(&self) -> Option<u32> {
        self.map.get("rest_secs").and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_muscle_normalizes_case() {
        assert_eq!(canonical_muscle("Chest"), Some("chest".to_string()));
        assert_eq!(canonical_muscle(" BACK "), Some("back".to_string()));
        assert_eq!(canonical_muscle("wings"), None);
    }

    #[test]
    fn suggestion_catches_near_misses_only() {
        assert_eq!(best_muscle_suggestion("shuolders"), Some("shoulders"));
        assert_eq!(best_muscle_suggestion("xyzzy"), None);
    }

    #[test]
    fn config_policies_have_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.user(), "local");
        assert_eq!(cfg.rest_secs(), None);

        let mut cfg = Config::default();
        cfg.map.insert("rest_secs".into(), "90".into());
        cfg.map.insert("user".into(), "anna".into());
        assert_eq!(cfg.rest_secs(), Some(90));
        assert_eq!(cfg.user(), "anna");
    }

    #[test]
    fn config_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");

        let mut cfg = Config::default();
        cfg.map.insert("rest_secs".into(), "120".into());
        cfg.save(&path).unwrap();

        let back = Config::load(&path).unwrap();
        assert_eq!(back.rest_secs(), Some(120));
    }
}

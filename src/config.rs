use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use scour_search::{
    DEFAULT_HIGHLIGHT_COLOR, DEFAULT_MARKER_CLASS, DEFAULT_MAX_VISIBLE,
    DEFAULT_SELECTED_HIGHLIGHT_COLOR, DEFAULT_SELECTED_MARKER_CLASS, FindConfig,
};

const DEFAULT_TIME_BUDGET_MS: u64 = 100;
const MIN_TIME_BUDGET_MS: u64 = 1;
const MAX_TIME_BUDGET_MS: u64 = 10_000;
const MIN_MAX_VISIBLE: usize = 1;
const MAX_MAX_VISIBLE: usize = 10_000;

const DEFAULT_CONFIG: &str = "# Time slice for each search step in milliseconds\n\
time_budget_ms = 100\n\
# Matches past this many visible ones all report the same ordinal\n\
max_visible_matches = 100\n\
\n\
# Highlight classes applied to marker nodes\n\
# marker_class = scour-match\n\
# selected_marker_class = scour-match-selected\n\
# Highlight colors used by the generated stylesheet\n\
# highlight_color = #ffff00\n\
# selected_highlight_color = #ff9632\n";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub time_budget_ms: u64,
    pub max_visible_matches: usize,
    pub marker_class: String,
    pub selected_marker_class: String,
    pub highlight_color: String,
    pub selected_highlight_color: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            max_visible_matches: DEFAULT_MAX_VISIBLE,
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            selected_marker_class: DEFAULT_SELECTED_MARKER_CLASS.to_string(),
            highlight_color: DEFAULT_HIGHLIGHT_COLOR.to_string(),
            selected_highlight_color: DEFAULT_SELECTED_HIGHLIGHT_COLOR.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path`, or the default config file (creating it if missing).
    /// Unreadable files fall back to defaults.
    pub fn load_or_create(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => ensure_config_file(),
        };
        let Some(path) = path else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_contents(&contents),
            Err(err) => {
                log::warn!("Could not read config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn from_contents(contents: &str) -> Self {
        let mut config = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if key.eq_ignore_ascii_case("time_budget_ms")
                && let Ok(budget) = value.parse::<u64>()
            {
                config.time_budget_ms = budget.clamp(MIN_TIME_BUDGET_MS, MAX_TIME_BUDGET_MS);
            }

            if (key.eq_ignore_ascii_case("max_visible_matches")
                || key.eq_ignore_ascii_case("max_visible"))
                && let Ok(max_visible) = value.parse::<usize>()
            {
                config.max_visible_matches = max_visible.clamp(MIN_MAX_VISIBLE, MAX_MAX_VISIBLE);
            }

            if key.eq_ignore_ascii_case("marker_class")
                && let Some(class) = parse_class_name(value)
            {
                config.marker_class = class;
            }

            if key.eq_ignore_ascii_case("selected_marker_class")
                && let Some(class) = parse_class_name(value)
            {
                config.selected_marker_class = class;
            }

            if key.eq_ignore_ascii_case("highlight_color")
                && let Some(color) = parse_color(value)
            {
                config.highlight_color = color;
            }

            if key.eq_ignore_ascii_case("selected_highlight_color")
                && let Some(color) = parse_color(value)
            {
                config.selected_highlight_color = color;
            }
        }

        config
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    pub fn find_config(&self) -> FindConfig {
        FindConfig {
            max_visible: self.max_visible_matches,
            marker_class: self.marker_class.clone(),
            selected_marker_class: self.selected_marker_class.clone(),
            highlight_color: self.highlight_color.clone(),
            selected_highlight_color: self.selected_highlight_color.clone(),
        }
    }
}

fn parse_string_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unquoted = if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let unquoted = unquoted.trim();
    if unquoted.is_empty() {
        return None;
    }

    Some(unquoted.to_string())
}

fn parse_class_name(value: &str) -> Option<String> {
    let class = parse_string_value(value)?;
    class
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .then_some(class)
}

fn parse_color(value: &str) -> Option<String> {
    let color = parse_string_value(value)?;
    let hex = color.strip_prefix('#')?;
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(color.to_ascii_lowercase())
    } else {
        None
    }
}

pub fn ensure_config_file() -> Option<PathBuf> {
    let path = config_path()?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let _ = fs::write(&path, DEFAULT_CONFIG);
    }
    Some(path)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(Path::new(&xdg_config_home).join("scour/config.txt"));
    }

    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().map(|p| p.join("scour").join("config.txt"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|p| p.join(".config").join("scour").join("config.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::time::Duration;

    #[test]
    fn defaults_match_engine_defaults() {
        let config = AppConfig::from_contents("");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.time_budget(), Duration::from_millis(100));
        assert_eq!(config.find_config(), scour_search::FindConfig::default());
    }

    #[test]
    fn default_file_parses_to_defaults() {
        assert_eq!(
            AppConfig::from_contents(super::DEFAULT_CONFIG),
            AppConfig::default()
        );
    }

    #[test]
    fn time_budget_parses_and_clamps() {
        let custom = AppConfig::from_contents("time_budget_ms = 16\n");
        assert_eq!(custom.time_budget_ms, 16);

        let clamped_low = AppConfig::from_contents("time_budget_ms = 0\n");
        assert_eq!(clamped_low.time_budget_ms, 1);

        let clamped_high = AppConfig::from_contents("TIME_BUDGET_MS = 999999\n");
        assert_eq!(clamped_high.time_budget_ms, 10_000);

        let invalid = AppConfig::from_contents("time_budget_ms = soon\n");
        assert_eq!(invalid.time_budget_ms, 100);
    }

    #[test]
    fn max_visible_parses_and_clamps() {
        let custom = AppConfig::from_contents("max_visible_matches = 50\n");
        assert_eq!(custom.max_visible_matches, 50);

        let alias = AppConfig::from_contents("max_visible = 7\n");
        assert_eq!(alias.max_visible_matches, 7);

        let clamped_low = AppConfig::from_contents("max_visible_matches = 0\n");
        assert_eq!(clamped_low.max_visible_matches, 1);
        assert_eq!(clamped_low.find_config().max_visible, 1);
    }

    #[test]
    fn classes_and_colors_are_validated() {
        let config = AppConfig::from_contents(
            "# custom look\n\
             marker_class = \"hit\"\n\
             selected_marker_class = hit current\n\
             highlight_color = #ABC\n\
             selected_highlight_color = orange\n",
        );

        assert_eq!(config.marker_class, "hit");
        assert_eq!(config.selected_marker_class, "scour-match-selected");
        assert_eq!(config.highlight_color, "#abc");
        assert_eq!(config.selected_highlight_color, "#ff9632");
    }
}

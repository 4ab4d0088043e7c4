use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

fn aspect_ratio_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"--ar (\d+:\d+)").expect("aspect ratio pattern"))
}

/// First `--ar W:H` directive in the text, or `1:1`.
pub fn extract_aspect_ratio(text: &str) -> String {
    let ratio = aspect_ratio_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_ASPECT_RATIO);
    debug!("extract_aspect_ratio: ratio={ratio}");
    ratio.to_string()
}

/// Drops every `--ar W:H` directive and trims the ends. Whitespace around a
/// removed directive in the middle of the text is left alone.
pub fn clean_prompt(text: &str) -> String {
    aspect_ratio_regex().replace_all(text, "").trim().to_string()
}

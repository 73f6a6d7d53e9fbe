//! Canonical picture names: `img_<yymmdd_HHMMSS>_n<burst number>`.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::OnceLock;

/// Timestamp part of a canonical name
pub const CANONICAL_DATE_FORMAT: &str = "%y%m%d_%H%M%S";

fn canonical_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^img_(\d{6}_\d{6})_n(\d+)$").expect("valid regex"))
}

/// Canonical base name for a capture time and burst number
pub fn canonical_base(date: &NaiveDateTime, number: u32) -> String {
    format!("img_{}_n{}", date.format(CANONICAL_DATE_FORMAT), number)
}

/// Capture time and burst number encoded in a canonical base name
pub fn parse_canonical(base: &str) -> Option<(NaiveDateTime, u32)> {
    let caps = canonical_pattern().captures(base)?;
    let date = NaiveDateTime::parse_from_str(&caps[1], CANONICAL_DATE_FORMAT).ok()?;
    let number = caps[2].parse().ok()?;
    Some((date, number))
}

/// Burst number of a canonical base name
pub fn burst_number(base: &str) -> Option<u32> {
    parse_canonical(base).map(|(_, number)| number)
}

/// Smallest burst number from `start` on whose canonical name is not taken
pub fn unique_name_number<F>(date: &NaiveDateTime, start: u32, taken: F) -> (String, u32)
where
    F: Fn(&str) -> bool,
{
    let mut number = start;
    loop {
        let name = canonical_base(date, number);
        if !taken(&name) {
            return (name, number);
        }
        number += 1;
    }
}

/// `<base>_<n>` for the smallest n >= 1 that is not taken
pub fn unique_suffixed<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    (1u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}

//! Size strings: `10G` to bytes, and bytes to human readable text

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{DomainError, DomainResult};

pub const MIB: u64 = 1 << 20;
pub const GIB: u64 = 1 << 30;
pub const TIB: u64 = 1 << 40;

fn size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([0-9]+)([MGT]?)$").expect("valid size regex"))
}

/// Parse `<digits>[M|G|T]` (case-insensitive) into a byte count.
///
/// A bare digit run is a raw byte count. Anything else, including values that
/// do not fit in 64 bits, is rejected.
pub fn parse_size(text: &str) -> DomainResult<u64> {
    let bad = || DomainError::BadSizeFormat(text.to_string());

    let caps = size_regex().captures(text.trim()).ok_or_else(bad)?;
    let number: u64 = caps[1].parse().map_err(|_| bad())?;

    let multiplier = match caps[2].to_ascii_uppercase().as_str() {
        "M" => MIB,
        "G" => GIB,
        "T" => TIB,
        _ => 1,
    };

    number.checked_mul(multiplier).ok_or_else(bad)
}

/// Render a byte count for display.
///
/// With `human` set, picks the largest of TiB/GiB/MiB the value reaches and
/// prints two decimals; smaller values (and `human == false`) stay raw.
pub fn format_human(bytes: u64, human: bool) -> String {
    if human {
        let scaled = [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB")]
            .into_iter()
            .find(|(unit, _)| bytes >= *unit);

        if let Some((unit, suffix)) = scaled {
            return format!("{:.2} {}", bytes as f64 / unit as f64, suffix);
        }
    }
    bytes.to_string()
}

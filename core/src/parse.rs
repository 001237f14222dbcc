//! Text-to-number extraction for the formatted values the page renders.
//!
//! Every function here is total: page text is outside our control and
//! changes without notice, so malformed input yields 0.0 (unrecognized
//! distance suffix) or NaN, never an error.

pub const METERS_PER_KM: f64 = 1000.0;
pub const METERS_PER_MI: f64 = 1609.34;

/// Drop a leading label ("Distance", "Moving Time", ...) by skipping to the
/// first digit. Labels never contain digits.
fn strip_label(raw: &str) -> &str {
    match raw.find(|c: char| c.is_ascii_digit()) {
        Some(i) => &raw[i..],
        None => "",
    }
}

/// Leading decimal number of a string, parseFloat-style: "5.64 km" → 5.64.
/// NaN when the string does not start with a number.
fn leading_number(raw: &str) -> f64 {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot && end > 0 {
            seen_dot = true;
            end = i + 1;
        } else {
            break;
        }
    }
    if end == 0 {
        return f64::NAN;
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// Distance text → meters. Suffix priority km → mi → m; no recognized
/// suffix yields 0.0 (explicit, not an error).
pub fn parse_distance_m(raw: &str) -> f64 {
    let text = strip_label(raw);
    if let Some(i) = text.find("km") {
        leading_number(&text[..i]) * METERS_PER_KM
    } else if let Some(i) = text.find("mi") {
        leading_number(&text[..i]) * METERS_PER_MI
    } else if let Some(i) = text.find(" m") {
        leading_number(&text[..i])
    } else {
        0.0
    }
}

/// Duration text → seconds. "1:02:03" → 3723, "2:03" → 123, "45" → 45.
pub fn parse_duration_s(raw: &str) -> f64 {
    let text = strip_label(raw);
    let parts: Vec<f64> = text
        .split(':')
        .map(|p| p.trim().parse::<f64>().unwrap_or(f64::NAN))
        .collect();
    match parts.as_slice() {
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        [m, s] => m * 60.0 + s,
        [s] => *s,
        _ => f64::NAN,
    }
}

/// Wattage text ("254 W", "Form Power71 W") → watts, NaN on failure.
pub fn parse_power_w(raw: &str) -> f64 {
    leading_number(strip_label(raw))
}

/// Cadence text ("185 spm") → steps/min, NaN on failure.
pub fn parse_cadence_spm(raw: &str) -> f64 {
    leading_number(strip_label(raw))
}

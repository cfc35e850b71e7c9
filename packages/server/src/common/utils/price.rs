/// Marker for the "major" price unit (억 = 100,000,000 KRW).
pub const MAJOR_UNIT_MARKER: char = '억';

/// How many "minor" units (만 = 10,000 KRW) make up one major unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 10_000;

/// Convert a localized price string into a plain number of 만원 units.
///
/// - `"1억 5,000"` → `"15000"`
/// - `"2억"` → `"20000"`
/// - `"3,000"` → `"3000"`
/// - `""` → `""`
///
/// Each side of the major-unit marker is parsed from its leading digits and
/// falls back to 0 when nothing parses. Strings without the marker are
/// returned cleaned (separators removed, trimmed) but otherwise unchanged,
/// as are amounts too large for an `i64`.
pub fn normalize_price(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let cleaned = raw.replace(',', "");

    match cleaned.split_once(MAJOR_UNIT_MARKER) {
        Some((major, minor)) => leading_int(major)
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|major| major.checked_add(leading_int(minor)))
            .map(|total| total.to_string())
            .unwrap_or_else(|| cleaned.trim().to_string()),
        None => cleaned.trim().to_string(),
    }
}

/// Parse the integer at the start of `s` (after trimming), 0 if there is none.
fn leading_int(s: &str) -> i64 {
    let s = s.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    digits[..end]
        .parse::<i64>()
        .map(|n| sign * n)
        .unwrap_or(0)
}

/// Split combined floor text (`"5/15"`) into `(floor, max_floor)`.
///
/// Values are not validated: `"고/25"` yields `("고", "25")`, and text with no
/// separator yields only a floor.
pub fn split_floor_info(raw: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(raw) = raw else {
        return (None, None);
    };

    let mut parts = raw.split('/');
    let floor = parts.next().map(str::to_string);
    let max_floor = parts.next().map(str::to_string);
    (floor, max_floor)
}

//! Abbreviated download counts.
//!
//! Storefronts publish download numbers as short labels (`12K`, `5+`,
//! `1M+`). [`parse_abbreviated`] turns such a label back into an integer
//! estimate and [`format_rounded`] produces the compact form shown on
//! project cards. The two directions are independent: rendering is lossy and
//! is never fed back into the parser.
//!
//! | Label | Parsed |
//! |-------|--------|
//! | `1234` | 1234 |
//! | `12K` | 12000 |
//! | `1.2K` | 1200 |
//! | `5+` | 6 |
//! | `10K+` | 10000 |
//! | `1M+` | 1000000 |

/// Parse a human-readable abbreviated count.
///
/// - `K` / `M` suffix multiplies by one thousand / one million and truncates
///   any fraction (`1.25K` → 1250, `1.2345K` → 1234).
/// - A trailing `+` means "at least N" and adds one as an estimate, unless a
///   multiplier suffix is also present, in which case the multiplier wins.
/// - Thousands separators (`,`) and surrounding whitespace are ignored.
///
/// Returns `None` when the text holds no digits at all, or when the count
/// does not fit in a `u64`.
pub fn parse_abbreviated(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let (body, plus) = match cleaned.strip_suffix('+') {
        Some(rest) => (rest, true),
        None => (cleaned.as_str(), false),
    };

    let (digits, multiplier) = if let Some(rest) = body.strip_suffix(['K', 'k']) {
        (rest, Some(1_000u64))
    } else if let Some(rest) = body.strip_suffix(['M', 'm']) {
        (rest, Some(1_000_000u64))
    } else {
        (body, None)
    };

    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    match multiplier {
        Some(factor) => scale_decimal(digits, factor),
        None => {
            let value: u64 = digits.parse().ok()?;
            if plus { value.checked_add(1) } else { Some(value) }
        }
    }
}

/// Multiply a decimal literal by `factor`, truncating towards zero.
///
/// Done on the digit string so `1.2K` is exactly 1200 rather than whatever
/// `1.2 * 1000.0` rounds to.
fn scale_decimal(digits: &str, factor: u64) -> Option<u64> {
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(factor)?;

    let mut place = factor;
    for digit in fraction.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        value = value.checked_add(u64::from(digit.to_digit(10)?) * place)?;
    }
    Some(value)
}

/// Render a count in compact display form.
///
/// Counts below one thousand are shown as-is. Larger counts use a `K` or `M`
/// suffix with at most one decimal, always rounded down so the label never
/// overstates (`1299` → `1.2K`, `12000` → `12K`, `2_500_000` → `2.5M`).
pub fn format_rounded(count: u64) -> String {
    match count {
        0..=999 => count.to_string(),
        1_000..=999_999 => with_suffix(count, 1_000, "K"),
        _ => with_suffix(count, 1_000_000, "M"),
    }
}

fn with_suffix(count: u64, unit: u64, suffix: &str) -> String {
    let tenths = count / (unit / 10);
    let (whole, decimal) = (tenths / 10, tenths % 10);
    if decimal == 0 || whole >= 100 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole}.{decimal}{suffix}")
    }
}

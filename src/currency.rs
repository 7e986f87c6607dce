//! Fixed-point money helpers.
//!
//! All balances and amounts are integer cents (`i64`). Interest rates are
//! annual basis points on a 360-day banking year, so a full 30-day accrual
//! window earns one twelfth of the annual rate.

/// Days in one accrual window.
pub const WINDOW_DAYS: i64 = 30;

/// Days in the banking year used for interest arithmetic.
pub const BANKING_YEAR_DAYS: i64 = 360;

/// Interest in cents for `days` elapsed at `rate_bps` annual basis points.
///
/// Truncates toward zero; fractional cents are never credited.
pub fn interest_for_window(balance_cents: i64, rate_bps: i64, days: i64) -> i64 {
    if balance_cents <= 0 || rate_bps <= 0 || days <= 0 {
        return 0;
    }
    // i128 keeps balance * rate_bps * days from overflowing for any
    // realistic balance.
    let numerator = balance_cents as i128 * rate_bps as i128 * days as i128;
    (numerator / (10_000 * BANKING_YEAR_DAYS) as i128) as i64
}

/// Formats cents as an `LKR 1,234.56` display amount for descriptions
/// and log lines.
pub fn format_lkr(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let major = abs / 100;
    let minor = abs % 100;
    let digits = major.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("LKR -{}.{:02}", grouped, minor)
    } else {
        format!("LKR {}.{:02}", grouped, minor)
    }
}

/// Converts whole currency units to cents.
pub fn cents(major: i64) -> i64 {
    major * 100
}

/// Renders basis points as a percentage for descriptions, e.g. `1300` →
/// `13%`, `1250` → `12.5%`.
pub fn format_rate_percent(rate_bps: i64) -> String {
    if rate_bps % 100 == 0 {
        format!("{}%", rate_bps / 100)
    } else {
        let value = rate_bps as f64 / 100.0;
        let text = format!("{value:.2}");
        format!("{}%", text.trim_end_matches('0').trim_end_matches('.'))
    }
}

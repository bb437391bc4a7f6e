//! Display formatters for rates and USD amounts.
//!
//! Every formatter renders a missing or NaN value as [`PLACEHOLDER`].

/// Shown in place of an absent value.
pub const PLACEHOLDER: &str = "–";

/// Display names of known exchange ids.
const EXCHANGE_LABELS: [(&str, &str); 8] = [
    ("bybit", "Bybit"),
    ("mexc", "MEXC"),
    ("bingx", "BingX"),
    ("paradex", "Paradex"),
    ("binance", "Binance"),
    ("hyperliquid", "Hyperliquid"),
    ("gate", "Gate.io"),
    ("okx", "OKX"),
];

fn present(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}

/// Annualized rate with two decimals, e.g. `5.26%`.
pub fn format_apr(v: Option<f64>) -> String {
    format_percent(v, 2)
}

pub fn format_percent(v: Option<f64>, decimals: usize) -> String {
    match present(v) {
        Some(x) => format!("{x:.decimals$}%"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Compact USD with at most one fraction digit: `$1.5M`, `$2.3K`, `$150`.
pub fn format_compact_usd(v: Option<f64>) -> String {
    let Some(x) = present(v) else {
        return PLACEHOLDER.to_string();
    };
    const UNITS: [(f64, &str); 4] = [(1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];

    let abs = x.abs();
    let sign = if x < 0.0 { "-" } else { "" };
    let mut unit = UNITS.iter().rposition(|(scale, _)| abs >= *scale);
    loop {
        let (scaled, suffix) = match unit {
            Some(i) => (round1(abs / UNITS[i].0), UNITS[i].1),
            None => (round1(abs), ""),
        };
        // 999.96K rounds to 1000K; carry into the next unit.
        let next = unit.map_or(0, |i| i + 1);
        if scaled >= 1000.0 && next < UNITS.len() {
            unit = Some(next);
            continue;
        }
        return format!("${sign}{}{suffix}", trim_fraction(scaled));
    }
}

/// Whole-dollar USD with thousands separators, e.g. `$1,234,567`.
pub fn format_usd(v: Option<f64>) -> String {
    let Some(x) = present(v) else {
        return PLACEHOLDER.to_string();
    };
    let rounded = x.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${sign}{grouped}")
}

/// Display name of an exchange id, or the id itself if unknown.
pub fn format_exchange(exchange: &str) -> &str {
    EXCHANGE_LABELS
        .iter()
        .find(|(id, _)| *id == exchange)
        .map_or(exchange, |(_, label)| *label)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn trim_fraction(x: f64) -> String {
    let s = format!("{x:.1}");
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

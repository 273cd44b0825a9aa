const SUFFIXES: [&str; 9] = ["", "k", "M", "B", "T", "P", "E", "Z", "Y"];

/// Abbreviates a number with a thousands suffix, keeping `precision`
/// decimals and dropping trailing zeros: `1234.5 -> "1.2k"`,
/// `2_000_000 -> "2M"`.
pub fn millify(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let idx = if value == 0.0 {
        0
    } else {
        let magnitude = (value.abs().log10() / 3.0).floor().max(0.0) as usize;
        magnitude.min(SUFFIXES.len() - 1)
    };
    let scaled = value / 1000f64.powi(idx as i32);

    let mut text = format!("{scaled:.precision$}");
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    format!("{text}{}", SUFFIXES[idx])
}

/// `millify` with a currency prefix.
pub fn money(value: f64, currency: &str, precision: usize) -> String {
    format!("{currency}{}", millify(value, precision))
}

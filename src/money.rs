use rust_decimal::Decimal;

/// Round a Leone amount to the nearest cent
pub fn round_sle(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Format a Leone amount with thousands separators for display and
/// calculation-step text, e.g. "SLE 1,000,000.00"
pub fn display_sle(amount: Decimal) -> String {
    let rounded = round_sle(amount);
    let negative = rounded.is_sign_negative();
    let abs = rounded.abs();
    let s = format!("{abs:.2}");
    let (whole, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let mut grouped = String::new();
    let digits: Vec<char> = whole.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if negative { "-" } else { "" };
    format!("SLE {sign}{grouped}.{frac}")
}

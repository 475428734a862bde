/// Group the integer digits of a non-negative number string: 1234567 → 1,234,567
fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format an amount in the dataset's unit with thousands separators.
/// Whole numbers print without decimals; fractions keep two places.
pub fn amount(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let body = if abs.fract() == 0.0 {
        group_thousands(&format!("{abs:.0}"))
    } else {
        let fixed = format!("{abs:.2}");
        let (int_part, dec_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
        format!("{}.{dec_part}", group_thousands(int_part))
    };
    if negative && body.chars().any(|c| c != '0' && c != ',' && c != '.') {
        format!("-{body}")
    } else {
        body
    }
}

/// Amount prefixed with a currency symbol: ₱1,234 / -₱50
pub fn money(val: f64, symbol: &str) -> String {
    let formatted = amount(val);
    match formatted.strip_prefix('-') {
        Some(rest) => format!("-{symbol}{rest}"),
        None => format!("{symbol}{formatted}"),
    }
}

/// Signed change with an explicit plus: +1,200 / -300 / 0
pub fn delta(val: f64) -> String {
    if val > 0.0 {
        format!("+{}", amount(val))
    } else {
        amount(val)
    }
}

/// Shorten a name to `width` characters, marking the cut with an ellipsis.
pub fn truncate(name: &str, width: usize) -> String {
    let count = name.chars().count();
    if count <= width {
        return name.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let kept: String = name.chars().take(width - 1).collect();
    format!("{}\u{2026}", kept.trim_end())
}

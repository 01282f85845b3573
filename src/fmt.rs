use crate::models::TransactionType;

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    // -0.001 rounds to 0.00 and should not print a sign
    if val < 0.0 && cents != "0.00" {
        format!("-${grouped}.{dec_part}")
    } else {
        format!("${grouped}.{dec_part}")
    }
}

/// Amount with the sign derived from the transaction type: +$10.00 / -$10.00
pub fn signed_money(amount: f64, kind: TransactionType) -> String {
    match kind {
        TransactionType::Income => format!("+{}", money(amount)),
        TransactionType::Expense => format!("-{}", money(amount)),
    }
}

/// Horizontal bar scaled to `max`, at most `width` cells wide.
pub fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "\u{2588}".repeat(cells.clamp(1, width))
}

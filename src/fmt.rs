use crate::models::Direction;

/// Format an amount in yuan with thousands separators: ¥1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let fixed = format!("{:.2}", val.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-¥{grouped}.{dec_part}")
    } else {
        format!("¥{grouped}.{dec_part}")
    }
}

/// Amount with the sign implied by its direction.
pub fn signed_money(amount: f64, direction: Direction) -> String {
    match direction {
        Direction::Income => format!("+{}", money(amount)),
        Direction::Expense => money(-amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "¥1,234.56");
        assert_eq!(money(-500.00), "-¥500.00");
        assert_eq!(money(0.0), "¥0.00");
        assert_eq!(money(1000000.99), "¥1,000,000.99");
        assert_eq!(money(100.5), "¥100.50");
    }

    #[test]
    fn test_signed_money() {
        assert_eq!(signed_money(66.0, Direction::Income), "+¥66.00");
        assert_eq!(signed_money(32.0, Direction::Expense), "-¥32.00");
    }
}

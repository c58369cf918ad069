use rust_decimal::Decimal;

/// Format a decimal as a dollar amount with thousands separators: $1,234.56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!("{:.2}", val.abs());
    let mut parts = cents.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next().unwrap_or("00");

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Format a decimal as a percentage: 12.50%
pub fn percent(val: Decimal) -> String {
    format!("{:.2}%", val)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec(123456)), "$1,234.56");
        assert_eq!(money(dec(-50000)), "-$500.00");
        assert_eq!(money(dec(0)), "$0.00");
        assert_eq!(money(dec(100000099)), "$1,000,000.99");
        assert_eq!(money(dec(4210)), "$42.10");
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(percent(dec(1250)), "12.50%");
        assert_eq!(percent(Decimal::new(100, 0)), "100.00%");
    }
}

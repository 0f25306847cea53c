/// Format a float with thousands separators and two decimals: 1,234.56
pub fn number(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let fixed = format!("{:.2}", abs);
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative && fixed != "0.00" {
        format!("-{with_commas}.{dec_part}")
    } else {
        format!("{with_commas}.{dec_part}")
    }
}

/// Format a percentage with two decimals: 12.34%
pub fn pct(val: f64) -> String {
    format!("{val:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(1234.56), "1,234.56");
        assert_eq!(number(-500.00), "-500.00");
        assert_eq!(number(0.0), "0.00");
        assert_eq!(number(1000000.99), "1,000,000.99");
        assert_eq!(number(42.10), "42.10");
        assert_eq!(number(-0.001), "0.00");
    }

    #[test]
    fn test_pct_formatting() {
        assert_eq!(pct(12.346), "12.35%");
        assert_eq!(pct(0.0), "0.00%");
        assert_eq!(pct(-3.5), "-3.50%");
    }
}

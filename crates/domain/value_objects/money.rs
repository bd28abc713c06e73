/// Rounds a currency amount to two decimal places.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Converts a USD amount into integer cents.
pub fn usd_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn cents_to_usd(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(10.005), 10.01);
        assert_eq!(round2(1234.5649), 1234.56);
    }

    #[test]
    fn usd_to_cents_rounds_half_up() {
        assert_eq!(usd_to_cents(150.555), 15056);
        assert_eq!(usd_to_cents(0.01), 1);
        assert_eq!(cents_to_usd(15056), 150.56);
    }
}

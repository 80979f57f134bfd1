use rust_decimal::Decimal;
use std::str::FromStr;

/// Lamports in one SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const MAX_DECIMAL_SCALE: u32 = 28;

/// Math utility functions
pub struct MathUtils;

impl MathUtils {
    /// Convert lamports to SOL
    pub fn lamports_to_sol(lamports: u64) -> Decimal {
        Decimal::from_i128_with_scale(lamports as i128, 9)
    }

    /// Scale a raw integer amount down by `decimals` places.
    ///
    /// `None` when `decimals` exceeds the 28 fractional digits Decimal can hold.
    pub fn atomic_to_ui(amount: u64, decimals: u32) -> Option<Decimal> {
        if decimals > MAX_DECIMAL_SCALE {
            return None;
        }
        Some(Decimal::from_i128_with_scale(amount as i128, decimals))
    }

    /// Convert a float reported by an API into a Decimal without binary noise.
    ///
    /// Goes through the shortest round-trip string form, so `142.37_f64`
    /// becomes exactly `142.37`.
    pub fn decimal_from_f64(value: f64) -> Option<Decimal> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_str(&value.to_string()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(MathUtils::lamports_to_sol(2_500_000_000), Decimal::new(25, 1));
        assert_eq!(MathUtils::lamports_to_sol(LAMPORTS_PER_SOL), Decimal::ONE);
        assert_eq!(MathUtils::lamports_to_sol(0), Decimal::ZERO);
        assert_eq!(MathUtils::lamports_to_sol(1), Decimal::new(1, 9));
    }

    #[test]
    fn test_atomic_to_ui() {
        assert_eq!(MathUtils::atomic_to_ui(10_000_000, 6), Some(Decimal::from(10)));
        assert_eq!(MathUtils::atomic_to_ui(15, 0), Some(Decimal::from(15)));
        assert_eq!(MathUtils::atomic_to_ui(5, 28), Some(Decimal::new(5, 28)));
    }

    #[test]
    fn test_atomic_to_ui_rejects_unrepresentable_scale() {
        assert_eq!(MathUtils::atomic_to_ui(5, 29), None);
        assert_eq!(MathUtils::atomic_to_ui(5, 30), None);
    }

    #[test]
    fn test_decimal_from_f64() {
        assert_eq!(MathUtils::decimal_from_f64(142.37), Some(Decimal::new(14237, 2)));
        assert_eq!(MathUtils::decimal_from_f64(10.0), Some(Decimal::from(10)));
        assert_eq!(MathUtils::decimal_from_f64(f64::NAN), None);
        assert_eq!(MathUtils::decimal_from_f64(f64::INFINITY), None);
    }
}

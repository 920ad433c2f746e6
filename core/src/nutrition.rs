//! Unit conversion from an ingredient's per-100g basis to absolute amounts.
//!
//! Energy and protein are rounded to one decimal and cost to two decimals
//! every time a contribution is computed *and* every time contributions are
//! summed. A meal total is therefore the rounded sum of already-rounded line
//! values, not the rounded sum of exact values.

use crate::models::{Ingredient, LineMode, Totals};

/// Round half-up to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor + 0.5).floor() / factor
}

#[must_use]
pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

impl Totals {
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            kcal: round1(self.kcal),
            protein: round1(self.protein),
            cost: round2(self.cost),
        }
    }

    /// Add another (already rounded) contribution without rounding.
    pub fn accumulate(&mut self, other: Totals) {
        self.kcal += other.kcal;
        self.protein += other.protein;
        self.cost += other.cost;
    }
}

/// Sum contributions, then round the sum.
pub fn sum_rounded<I>(parts: I) -> Totals
where
    I: IntoIterator<Item = Totals>,
{
    let mut total = Totals::default();
    for part in parts {
        total.accumulate(part);
    }
    total.rounded()
}

fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

/// Nutrition and cost for `grams` of an ingredient.
#[must_use]
pub fn from_grams(ingredient: &Ingredient, grams: f64) -> Totals {
    if !valid_amount(grams) {
        return Totals::default();
    }
    let ratio = grams / 100.0;
    let cost = match ingredient.price_per_kg {
        Some(price) if price.is_finite() && price > 0.0 => (price / 1000.0) * grams,
        _ => 0.0,
    };
    Totals {
        kcal: ingredient.kcal100 * ratio,
        protein: ingredient.protein100 * ratio,
        cost,
    }
    .rounded()
}

/// Nutrition and cost for `count` portions. Without a usable portion size the
/// portion counts as zero grams.
#[must_use]
pub fn from_portions(ingredient: &Ingredient, count: f64) -> Totals {
    if !valid_amount(count) {
        return Totals::default();
    }
    let grams = ingredient.usable_portion_grams().unwrap_or(0.0) * count;
    from_grams(ingredient, grams)
}

/// Contribution of one meal line.
#[must_use]
pub fn line_nutrition(ingredient: &Ingredient, mode: LineMode, amount: f64) -> Totals {
    match mode {
        LineMode::Grams => from_grams(ingredient, amount),
        LineMode::Portion => from_portions(ingredient, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie() -> Ingredient {
        Ingredient {
            id: "ing-cookie".to_string(),
            name: "Cookie".to_string(),
            brand: None,
            kcal100: 500.0,
            protein100: 6.0,
            price_per_kg: Some(6.5),
            portion_name: Some("cookie".to_string()),
            portion_grams: Some(8.0),
            notes: None,
        }
    }

    fn oats() -> Ingredient {
        Ingredient {
            id: "ing-oats".to_string(),
            name: "Oats".to_string(),
            brand: None,
            kcal100: 389.0,
            protein100: 16.9,
            price_per_kg: None,
            portion_name: None,
            portion_grams: None,
            notes: None,
        }
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round1(0.48), 0.5);
        assert_eq!(round1(0.44), 0.4);
        assert_eq!(round2(0.052), 0.05);
        assert_eq!(round2(0.104), 0.1);
        assert_eq!(round1(-2.25), -2.2);
    }

    #[test]
    fn test_from_grams() {
        let t = from_grams(&oats(), 100.0);
        assert_eq!(t.kcal, 389.0);
        assert_eq!(t.protein, 16.9);
        assert_eq!(t.cost, 0.0);

        let t = from_grams(&oats(), 300.0);
        assert!((t.kcal - 1167.0).abs() < 1e-9);
        assert!((t.protein - 50.7).abs() < 1e-9);

        let t = from_grams(&oats(), 33.0);
        // 389 * 0.33 = 128.37, 16.9 * 0.33 = 5.577
        assert!((t.kcal - 128.4).abs() < 1e-9);
        assert!((t.protein - 5.6).abs() < 1e-9);
    }

    #[test]
    fn test_one_cookie() {
        let t = from_portions(&cookie(), 1.0);
        assert_eq!(t.kcal, 40.0);
        assert_eq!(t.protein, 0.5);
        assert_eq!(t.cost, 0.05);
    }

    #[test]
    fn test_portions_equal_grams() {
        let c = cookie();
        for n in [0.0, 0.5, 1.0, 2.0, 3.5, 12.0] {
            assert_eq!(from_portions(&c, n), from_grams(&c, 8.0 * n));
        }
    }

    #[test]
    fn test_portion_without_portion_data_is_zero() {
        let t = line_nutrition(&oats(), LineMode::Portion, 3.0);
        assert_eq!(t, Totals::default());

        let mut zero_portion = cookie();
        zero_portion.portion_grams = Some(0.0);
        assert_eq!(from_portions(&zero_portion, 2.0), Totals::default());
    }

    #[test]
    fn test_invalid_amount_contributes_zero() {
        let c = cookie();
        assert_eq!(from_grams(&c, -10.0), Totals::default());
        assert_eq!(from_grams(&c, f64::NAN), Totals::default());
        assert_eq!(from_portions(&c, f64::INFINITY), Totals::default());
    }

    #[test]
    fn test_sum_rounds_already_rounded_parts() {
        let total = sum_rounded([
            line_nutrition(&oats(), LineMode::Grams, 100.0),
            line_nutrition(&cookie(), LineMode::Portion, 2.0),
        ]);
        assert_eq!(total.kcal, 469.0);
        assert_eq!(total.protein, 17.9);
        assert_eq!(total.cost, 0.1);
    }

    #[test]
    fn test_rounding_order_differs_from_exact_sum() {
        // Each 1 g line is 0.06 protein -> rounds to 0.1; exact sum of ten is 0.6.
        let c = cookie();
        let lines = (0..10).map(|_| line_nutrition(&c, LineMode::Grams, 1.0));
        let total = sum_rounded(lines);
        assert_eq!(total.protein, 1.0);
        assert_eq!(from_grams(&c, 10.0).protein, 0.6);
    }
}

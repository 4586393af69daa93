//! Derived area and price figures for a property.

/// Living area plus garden area, in square meters.
pub fn compute_total_area(living_area: u32, garden_area: u32) -> f64 {
    f64::from(living_area) + f64::from(garden_area)
}

/// Highest offered price, or `0.0` when no offers exist.
pub fn compute_best_price<I>(offer_prices: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    offer_prices
        .into_iter()
        .fold(None, |best: Option<f64>, price| match best {
            Some(current) if current >= price => Some(current),
            _ => Some(price),
        })
        .unwrap_or(0.0)
}

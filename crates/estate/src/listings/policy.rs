use chrono::{Months, NaiveDate};

pub const DEFAULT_AVAILABILITY_MONTHS: u32 = 3;
pub const DEFAULT_OFFER_VALIDITY_DAYS: i32 = 7;
pub const DEFAULT_BEDROOMS: u32 = 2;

/// Defaults applied to new listings and offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    pub availability_lead_months: u32,
    pub offer_validity_days: i32,
    pub default_bedrooms: u32,
}

impl ListingPolicy {
    /// Availability date for a property listed on `today`.
    pub fn default_availability(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_add_months(Months::new(self.availability_lead_months))
    }
}

impl Default for ListingPolicy {
    fn default() -> Self {
        Self {
            availability_lead_months: DEFAULT_AVAILABILITY_MONTHS,
            offer_validity_days: DEFAULT_OFFER_VALIDITY_DAYS,
            default_bedrooms: DEFAULT_BEDROOMS,
        }
    }
}

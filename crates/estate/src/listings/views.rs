use chrono::NaiveDate;
use serde::Serialize;

use super::aggregation::{compute_best_price, compute_total_area};
use super::deadline::deadline_from_validity;
use super::domain::{Offer, OfferId, Property};
use super::validation::ValidationError;

/// Property as exposed to callers, with derived figures evaluated against its current offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub state_label: &'static str,
    pub total_area: f64,
    pub best_price: f64,
    pub offer_ids: Vec<OfferId>,
}

impl PropertyView {
    pub fn new(property: Property, offers: &[Offer]) -> Self {
        let total_area = compute_total_area(property.living_area, property.garden_area);
        let best_price = compute_best_price(offers.iter().map(|offer| offer.price));
        let offer_ids = offers.iter().map(|offer| offer.id).collect();

        Self {
            state_label: property.state.label(),
            property,
            total_area,
            best_price,
            offer_ids,
        }
    }
}

/// Offer as exposed to callers, carrying its derived deadline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub date_deadline: NaiveDate,
}

impl OfferView {
    pub fn new(offer: Offer, today: NaiveDate) -> Result<Self, ValidationError> {
        let date_deadline = deadline_from_validity(offer.create_date, offer.validity, today)?;
        Ok(Self {
            offer,
            date_deadline,
        })
    }
}

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for listed properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub u64);

/// Identifier wrapper for offers made on a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyTypeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TagId(pub u64);

/// Internal user acting as salesperson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    pub const ADMINISTRATOR: UserId = UserId(1);
}

/// External contact: buyers and offering parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub u64);

/// Who is acting and when. Defaults that depend on the acting user or the clock read from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    pub user: UserId,
    pub now: NaiveDateTime,
}

impl ActionContext {
    pub fn new(user: UserId, now: NaiveDateTime) -> Self {
        Self { user, now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GardenOrientation {
    North,
    South,
    East,
    West,
}

impl GardenOrientation {
    pub const fn label(self) -> &'static str {
        match self {
            GardenOrientation::North => "North",
            GardenOrientation::South => "South",
            GardenOrientation::East => "East",
            GardenOrientation::West => "West",
        }
    }
}

/// Sale lifecycle of a property. `Sold` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyState {
    #[default]
    New,
    OfferReceived,
    OfferAccepted,
    Sold,
    Canceled,
}

impl PropertyState {
    pub const fn label(self) -> &'static str {
        match self {
            PropertyState::New => "new",
            PropertyState::OfferReceived => "offer_received",
            PropertyState::OfferAccepted => "offer_accepted",
            PropertyState::Sold => "sold",
            PropertyState::Canceled => "canceled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PropertyState::Sold | PropertyState::Canceled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Accepted,
    Refused,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Accepted => "accepted",
            OfferStatus::Refused => "refused",
        }
    }
}

/// A listed property as stored. Derived values live on [`super::PropertyView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub description: Option<String>,
    pub postcode: Option<String>,
    pub date_availability: Option<NaiveDate>,
    pub expected_price: f64,
    pub selling_price: f64,
    pub bedrooms: u32,
    pub living_area: u32,
    pub facades: u32,
    pub garage: bool,
    pub garden: bool,
    pub garden_area: u32,
    pub garden_orientation: Option<GardenOrientation>,
    pub active: bool,
    pub state: PropertyState,
    pub property_type_id: Option<PropertyTypeId>,
    pub salesperson_id: UserId,
    pub buyer_id: Option<PartnerId>,
    pub tag_ids: BTreeSet<TagId>,
}

/// Fields accepted when creating a property. Unset fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDraft {
    pub name: String,
    pub description: Option<String>,
    pub postcode: Option<String>,
    pub date_availability: Option<NaiveDate>,
    pub expected_price: f64,
    pub bedrooms: Option<u32>,
    pub living_area: u32,
    pub facades: u32,
    pub garage: bool,
    pub garden: bool,
    pub garden_area: u32,
    pub garden_orientation: Option<GardenOrientation>,
    pub active: bool,
    pub property_type_id: Option<PropertyTypeId>,
    pub salesperson_id: Option<UserId>,
    pub tag_ids: BTreeSet<TagId>,
}

/// Partial update. Selling price, buyer and state are not user-editable here.
///
/// Nullable fields use a nested option: absent leaves the value alone, `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyPatch {
    pub name: Option<String>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub postcode: Option<Option<String>>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub date_availability: Option<Option<NaiveDate>>,
    pub expected_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub living_area: Option<u32>,
    pub facades: Option<u32>,
    pub garage: Option<bool>,
    pub garden: Option<bool>,
    pub garden_area: Option<u32>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub garden_orientation: Option<Option<GardenOrientation>>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub property_type_id: Option<Option<PropertyTypeId>>,
    pub salesperson_id: Option<UserId>,
    pub tag_ids: Option<BTreeSet<TagId>>,
}

/// Marks a field that appeared in the payload, including an explicit `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PropertyPatch {
    /// Whether committing this patch requires the price constraints to run again.
    pub fn touches_prices(&self) -> bool {
        self.expected_price.is_some()
    }
}

/// Terms recorded when an offer is accepted elsewhere and the property is sold to a buyer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaleTerms {
    pub selling_price: f64,
    pub buyer_id: PartnerId,
}

/// An offer on a property as stored. `create_date` anchors the deadline once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub price: f64,
    pub status: Option<OfferStatus>,
    pub partner_id: PartnerId,
    pub property_id: PropertyId,
    pub validity: i32,
    pub create_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferDraft {
    pub price: f64,
    pub partner_id: PartnerId,
    pub property_id: PropertyId,
    #[serde(default)]
    pub status: Option<OfferStatus>,
    #[serde(default)]
    pub validity: Option<i32>,
    #[serde(default)]
    pub date_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferPatch {
    pub price: Option<f64>,
    pub status: Option<OfferStatus>,
    pub validity: Option<i32>,
    pub date_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: PropertyTypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Filter for property searches. Inactive properties are hidden unless requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PropertyQuery {
    pub include_inactive: bool,
    pub state: Option<PropertyState>,
}

impl PropertyQuery {
    pub fn matches(&self, property: &Property) -> bool {
        (self.include_inactive || property.active)
            && self.state.map_or(true, |state| property.state == state)
    }
}

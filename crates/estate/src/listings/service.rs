use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::deadline::validity_from_deadline;
use super::domain::{
    ActionContext, Offer, OfferDraft, OfferId, OfferPatch, Property, PropertyDraft, PropertyId,
    PropertyPatch, PropertyQuery, PropertyState, PropertyType, PropertyTypeId, SaleTerms, Tag,
    TagId,
};
use super::garden::{garden_assist, GardenAssist};
use super::lifecycle::{ActionOutcome, BatchOutcome, LifecycleAction, LifecycleError};
use super::policy::ListingPolicy;
use super::repository::{ListingRepository, RepositoryError};
use super::validation::{
    validate_prices, validate_reference_name, validate_title, ValidationError,
};
use super::views::{OfferView, PropertyView};

/// Service applying listing rules on top of a repository.
///
/// Derived values are recomputed at every mutation site; nothing here reacts to writes made
/// directly against the repository.
pub struct ListingService<R> {
    repository: Arc<R>,
    policy: ListingPolicy,
    property_sequence: AtomicU64,
    offer_sequence: AtomicU64,
    property_type_sequence: AtomicU64,
    tag_sequence: AtomicU64,
}

impl<R> ListingService<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: ListingPolicy) -> Self {
        Self {
            repository,
            policy,
            property_sequence: AtomicU64::new(1),
            offer_sequence: AtomicU64::new(1),
            property_type_sequence: AtomicU64::new(1),
            tag_sequence: AtomicU64::new(1),
        }
    }

    pub fn policy(&self) -> &ListingPolicy {
        &self.policy
    }

    /// Create a property, filling defaults from the policy and the acting context.
    pub fn create_property(
        &self,
        draft: PropertyDraft,
        ctx: &ActionContext,
    ) -> Result<Property, ListingServiceError> {
        validate_title(&draft.name)?;
        validate_prices(draft.expected_price, 0.0)?;
        self.ensure_references(draft.property_type_id, draft.tag_ids.iter().copied())?;

        let id = PropertyId(self.property_sequence.fetch_add(1, Ordering::Relaxed));
        let property = Property {
            id,
            name: draft.name,
            description: draft.description,
            postcode: draft.postcode,
            date_availability: draft
                .date_availability
                .or_else(|| self.policy.default_availability(ctx.today())),
            expected_price: draft.expected_price,
            selling_price: 0.0,
            bedrooms: draft.bedrooms.unwrap_or(self.policy.default_bedrooms),
            living_area: draft.living_area,
            facades: draft.facades,
            garage: draft.garage,
            garden: draft.garden,
            garden_area: draft.garden_area,
            garden_orientation: draft.garden_orientation,
            active: draft.active,
            state: PropertyState::New,
            property_type_id: draft.property_type_id,
            salesperson_id: draft.salesperson_id.unwrap_or(ctx.user),
            buyer_id: None,
            tag_ids: draft.tag_ids,
        };

        let stored = self.repository.insert_property(property)?;
        info!(property_id = stored.id.0, name = %stored.name, "property listed");
        Ok(stored)
    }

    /// Apply a partial update; price constraints run again when a price is written.
    pub fn update_property(
        &self,
        id: PropertyId,
        patch: PropertyPatch,
    ) -> Result<Property, ListingServiceError> {
        if let Some(name) = &patch.name {
            validate_title(name)?;
        }
        if patch.property_type_id.is_some() || patch.tag_ids.is_some() {
            let tags = patch.tag_ids.iter().flatten().copied();
            self.ensure_references(patch.property_type_id.flatten(), tags)?;
        }

        self.repository
            .modify_property(id, |property| apply_patch(property, patch))
    }

    /// Record the agreed selling price and buyer once an offer is accepted.
    pub fn record_sale(
        &self,
        id: PropertyId,
        terms: SaleTerms,
    ) -> Result<Property, ListingServiceError> {
        let property = self.repository.modify_property(id, |property| {
            validate_prices(property.expected_price, terms.selling_price)?;
            property.selling_price = terms.selling_price;
            property.buyer_id = Some(terms.buyer_id);
            Ok::<_, ListingServiceError>(())
        })?;

        info!(
            property_id = id.0,
            selling_price = terms.selling_price,
            buyer_id = terms.buyer_id.0,
            "sale terms recorded"
        );
        Ok(property)
    }

    /// Copy a property. Availability, selling price, state, buyer and offers are not carried over.
    pub fn duplicate_property(
        &self,
        id: PropertyId,
        ctx: &ActionContext,
    ) -> Result<Property, ListingServiceError> {
        let source = self.load_property(id)?;
        let copy = Property {
            id: PropertyId(self.property_sequence.fetch_add(1, Ordering::Relaxed)),
            date_availability: self.policy.default_availability(ctx.today()),
            selling_price: 0.0,
            state: PropertyState::New,
            buyer_id: None,
            ..source
        };

        let stored = self.repository.insert_property(copy)?;
        info!(source_id = id.0, property_id = stored.id.0, "property duplicated");
        Ok(stored)
    }

    pub fn search_properties(
        &self,
        query: PropertyQuery,
    ) -> Result<Vec<Property>, ListingServiceError> {
        let mut properties: Vec<Property> = self
            .repository
            .properties()?
            .into_iter()
            .filter(|property| query.matches(property))
            .collect();
        properties.sort_by_key(|property| property.id);
        Ok(properties)
    }

    /// Property with total area and best price evaluated against its current offers.
    pub fn property_view(&self, id: PropertyId) -> Result<PropertyView, ListingServiceError> {
        let property = self.load_property(id)?;
        let offers = self.repository.offers_for(id)?;
        Ok(PropertyView::new(property, &offers))
    }

    pub fn garden_assist(&self, garden: bool) -> GardenAssist {
        garden_assist(garden)
    }

    /// Create an offer. A deadline given on the draft is converted to validity against today.
    pub fn create_offer(
        &self,
        draft: OfferDraft,
        ctx: &ActionContext,
    ) -> Result<OfferView, ListingServiceError> {
        if self.repository.fetch_property(draft.property_id)?.is_none() {
            return Err(ValidationError::UnknownProperty(draft.property_id).into());
        }

        let validity = match draft.date_deadline {
            Some(deadline) => validity_from_deadline(deadline, None, ctx.today()),
            None => draft.validity.unwrap_or(self.policy.offer_validity_days),
        };

        let offer = Offer {
            id: OfferId(self.offer_sequence.fetch_add(1, Ordering::Relaxed)),
            price: draft.price,
            status: draft.status,
            partner_id: draft.partner_id,
            property_id: draft.property_id,
            validity,
            create_date: Some(ctx.now),
        };
        let view = OfferView::new(offer, ctx.today())?;

        let stored = self.repository.insert_offer(view.offer.clone())?;
        info!(
            offer_id = stored.id.0,
            property_id = stored.property_id.0,
            price = stored.price,
            "offer registered"
        );
        Ok(view)
    }

    /// Update an offer. When both validity and deadline are given, the deadline wins.
    pub fn update_offer(
        &self,
        id: OfferId,
        patch: OfferPatch,
        today: NaiveDate,
    ) -> Result<OfferView, ListingServiceError> {
        let mut offer = self.load_offer(id)?;

        if let Some(price) = patch.price {
            offer.price = price;
        }
        if let Some(status) = patch.status {
            offer.status = Some(status);
        }
        if let Some(validity) = patch.validity {
            offer.validity = validity;
        }
        if let Some(deadline) = patch.date_deadline {
            offer.validity = validity_from_deadline(deadline, offer.create_date, today);
        }

        let view = OfferView::new(offer, today)?;
        self.repository.update_offer(view.offer.clone())?;
        Ok(view)
    }

    pub fn offer_view(
        &self,
        id: OfferId,
        today: NaiveDate,
    ) -> Result<OfferView, ListingServiceError> {
        let offer = self.load_offer(id)?;
        Ok(OfferView::new(offer, today)?)
    }

    /// Apply `action` to a single property.
    pub fn apply_action(
        &self,
        id: PropertyId,
        action: LifecycleAction,
    ) -> Result<Property, ListingServiceError> {
        let result = self.repository.modify_property(id, |property| {
            property.state = action.apply(property.state)?;
            Ok::<_, ListingServiceError>(())
        });

        match result {
            Ok(property) => {
                info!(
                    property_id = id.0,
                    state = property.state.label(),
                    "property state changed"
                );
                Ok(property)
            }
            Err(ListingServiceError::Lifecycle(err)) => {
                warn!(property_id = id.0, action = action.label(), %err, "action refused");
                Err(err.into())
            }
            Err(err) => Err(err),
        }
    }

    /// Apply `action` to each property independently. A refusal leaves that record untouched
    /// and does not undo siblings already processed.
    pub fn apply_batch(&self, ids: &[PropertyId], action: LifecycleAction) -> BatchOutcome {
        let outcomes = ids
            .iter()
            .map(|&id| match self.apply_action(id, action) {
                Ok(property) => ActionOutcome::succeeded(id, property.state),
                Err(err) => ActionOutcome::failed(id, err),
            })
            .collect();

        BatchOutcome { action, outcomes }
    }

    pub fn mark_sold(&self, ids: &[PropertyId]) -> BatchOutcome {
        self.apply_batch(ids, LifecycleAction::MarkSold)
    }

    pub fn mark_canceled(&self, ids: &[PropertyId]) -> BatchOutcome {
        self.apply_batch(ids, LifecycleAction::MarkCanceled)
    }

    pub fn create_property_type(
        &self,
        name: String,
    ) -> Result<PropertyType, ListingServiceError> {
        validate_reference_name("property type", &name)?;
        let property_type = PropertyType {
            id: PropertyTypeId(self.property_type_sequence.fetch_add(1, Ordering::Relaxed)),
            name,
        };
        Ok(self.repository.insert_property_type(property_type)?)
    }

    pub fn property_types(&self) -> Result<Vec<PropertyType>, ListingServiceError> {
        Ok(self.repository.property_types()?)
    }

    pub fn create_tag(&self, name: String) -> Result<Tag, ListingServiceError> {
        validate_reference_name("tag", &name)?;
        let tag = Tag {
            id: TagId(self.tag_sequence.fetch_add(1, Ordering::Relaxed)),
            name,
        };
        Ok(self.repository.insert_tag(tag)?)
    }

    pub fn tags(&self) -> Result<Vec<Tag>, ListingServiceError> {
        Ok(self.repository.tags()?)
    }

    fn load_property(&self, id: PropertyId) -> Result<Property, ListingServiceError> {
        let property = self
            .repository
            .fetch_property(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(property)
    }

    fn load_offer(&self, id: OfferId) -> Result<Offer, ListingServiceError> {
        let offer = self
            .repository
            .fetch_offer(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(offer)
    }

    fn ensure_references(
        &self,
        property_type_id: Option<PropertyTypeId>,
        tag_ids: impl IntoIterator<Item = TagId>,
    ) -> Result<(), ListingServiceError> {
        if let Some(type_id) = property_type_id {
            if self.repository.fetch_property_type(type_id)?.is_none() {
                return Err(ValidationError::UnknownPropertyType(type_id).into());
            }
        }
        for tag_id in tag_ids {
            if self.repository.fetch_tag(tag_id)?.is_none() {
                return Err(ValidationError::UnknownTag(tag_id).into());
            }
        }
        Ok(())
    }
}

/// Write `patch` onto `property`. Reference checks happen before the record is locked.
fn apply_patch(property: &mut Property, patch: PropertyPatch) -> Result<(), ListingServiceError> {
    let revalidate_prices = patch.touches_prices();

    if let Some(name) = patch.name {
        property.name = name;
    }
    if let Some(description) = patch.description {
        property.description = description;
    }
    if let Some(postcode) = patch.postcode {
        property.postcode = postcode;
    }
    if let Some(date) = patch.date_availability {
        property.date_availability = date;
    }
    if let Some(expected_price) = patch.expected_price {
        property.expected_price = expected_price;
    }
    if let Some(bedrooms) = patch.bedrooms {
        property.bedrooms = bedrooms;
    }
    if let Some(living_area) = patch.living_area {
        property.living_area = living_area;
    }
    if let Some(facades) = patch.facades {
        property.facades = facades;
    }
    if let Some(garage) = patch.garage {
        property.garage = garage;
    }
    if let Some(garden) = patch.garden {
        property.garden = garden;
    }
    if let Some(garden_area) = patch.garden_area {
        property.garden_area = garden_area;
    }
    if let Some(orientation) = patch.garden_orientation {
        property.garden_orientation = orientation;
    }
    if let Some(active) = patch.active {
        property.active = active;
    }
    if let Some(salesperson_id) = patch.salesperson_id {
        property.salesperson_id = salesperson_id;
    }
    if let Some(property_type_id) = patch.property_type_id {
        property.property_type_id = property_type_id;
    }
    if let Some(tag_ids) = patch.tag_ids {
        property.tag_ids = tag_ids;
    }

    if revalidate_prices {
        validate_prices(property.expected_price, property.selling_price)?;
    }
    Ok(())
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

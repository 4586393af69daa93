use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Offer, OfferId, Property, PropertyId, PropertyType, PropertyTypeId, Tag, TagId,
};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ListingRepository: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn update_property(&self, property: Property) -> Result<(), RepositoryError>;
    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn properties(&self) -> Result<Vec<Property>, RepositoryError>;
    /// Read, change and write back a property as one step. The stored record is left as it
    /// was when `apply` fails.
    fn modify_property<E, F>(&self, id: PropertyId, apply: F) -> Result<Property, E>
    where
        F: FnOnce(&mut Property) -> Result<(), E>,
        E: From<RepositoryError>;

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError>;
    fn fetch_offer(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError>;
    /// Offers whose back-reference points at `property_id`.
    fn offers_for(&self, property_id: PropertyId) -> Result<Vec<Offer>, RepositoryError>;

    fn insert_property_type(
        &self,
        property_type: PropertyType,
    ) -> Result<PropertyType, RepositoryError>;
    fn fetch_property_type(
        &self,
        id: PropertyTypeId,
    ) -> Result<Option<PropertyType>, RepositoryError>;
    fn property_types(&self) -> Result<Vec<PropertyType>, RepositoryError>;

    fn insert_tag(&self, tag: Tag) -> Result<Tag, RepositoryError>;
    fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, RepositoryError>;
    fn tags(&self) -> Result<Vec<Tag>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct Tables {
    properties: BTreeMap<PropertyId, Property>,
    offers: BTreeMap<OfferId, Offer>,
    property_types: BTreeMap<PropertyTypeId, PropertyType>,
    tags: BTreeMap<TagId, Tag>,
}

/// Process-local repository used by the API binary, the demo and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryListingRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryListingRepository {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

fn insert_unique<K: Ord, V: Clone>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
) -> Result<V, RepositoryError> {
    if table.contains_key(&key) {
        return Err(RepositoryError::Conflict);
    }
    table.insert(key, value.clone());
    Ok(value)
}

fn replace_existing<K: Ord, V>(
    table: &mut BTreeMap<K, V>,
    key: K,
    value: V,
) -> Result<(), RepositoryError> {
    match table.get_mut(&key) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(RepositoryError::NotFound),
    }
}

impl ListingRepository for InMemoryListingRepository {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut tables = self.tables()?;
        insert_unique(&mut tables.properties, property.id, property)
    }

    fn update_property(&self, property: Property) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace_existing(&mut tables.properties, property.id, property)
    }

    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self.tables()?.properties.get(&id).cloned())
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.tables()?.properties.values().cloned().collect())
    }

    fn modify_property<E, F>(&self, id: PropertyId, apply: F) -> Result<Property, E>
    where
        F: FnOnce(&mut Property) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut tables = self.tables()?;
        let slot = tables
            .properties
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;

        let mut changed = slot.clone();
        apply(&mut changed)?;
        *slot = changed.clone();
        Ok(changed)
    }

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        let mut tables = self.tables()?;
        insert_unique(&mut tables.offers, offer.id, offer)
    }

    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        replace_existing(&mut tables.offers, offer.id, offer)
    }

    fn fetch_offer(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        Ok(self.tables()?.offers.get(&id).cloned())
    }

    fn offers_for(&self, property_id: PropertyId) -> Result<Vec<Offer>, RepositoryError> {
        Ok(self
            .tables()?
            .offers
            .values()
            .filter(|offer| offer.property_id == property_id)
            .cloned()
            .collect())
    }

    fn insert_property_type(
        &self,
        property_type: PropertyType,
    ) -> Result<PropertyType, RepositoryError> {
        let mut tables = self.tables()?;
        insert_unique(&mut tables.property_types, property_type.id, property_type)
    }

    fn fetch_property_type(
        &self,
        id: PropertyTypeId,
    ) -> Result<Option<PropertyType>, RepositoryError> {
        Ok(self.tables()?.property_types.get(&id).cloned())
    }

    fn property_types(&self) -> Result<Vec<PropertyType>, RepositoryError> {
        Ok(self.tables()?.property_types.values().cloned().collect())
    }

    fn insert_tag(&self, tag: Tag) -> Result<Tag, RepositoryError> {
        let mut tables = self.tables()?;
        insert_unique(&mut tables.tags, tag.id, tag)
    }

    fn fetch_tag(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        Ok(self.tables()?.tags.get(&id).cloned())
    }

    fn tags(&self) -> Result<Vec<Tag>, RepositoryError> {
        Ok(self.tables()?.tags.values().cloned().collect())
    }
}

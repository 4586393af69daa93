use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use super::common::*;
use crate::listings::domain::{
    GardenOrientation, OfferDraft, OfferPatch, OfferStatus, PartnerId, PropertyId, PropertyPatch,
    PropertyQuery, PropertyState, SaleTerms, TagId, UserId,
};
use crate::listings::repository::{ListingRepository, RepositoryError};
use crate::listings::{
    LifecycleAction, LifecycleError, ListingPolicy, ListingService, ListingServiceError,
    ValidationError,
};

fn offer_draft(property_id: PropertyId, price: f64) -> OfferDraft {
    OfferDraft {
        price,
        partner_id: PartnerId(42),
        property_id,
        status: None,
        validity: None,
        date_deadline: None,
    }
}

#[test]
fn create_property_applies_defaults_from_context() {
    let (service, _) = build_service();
    let property = service
        .create_property(draft("Family house", 250_000.0), &context())
        .expect("property listed");

    assert_eq!(property.state, PropertyState::New);
    assert_eq!(property.bedrooms, 2);
    assert_eq!(property.selling_price, 0.0);
    assert_eq!(property.salesperson_id, UserId(7));
    assert_eq!(property.date_availability, Some(date(2024, 4, 1)));
    assert!(property.buyer_id.is_none());
}

#[test]
fn create_property_rejects_blank_title_and_non_positive_price() {
    let (service, repository) = build_service();

    match service.create_property(draft("  ", 100_000.0), &context()) {
        Err(ListingServiceError::Validation(ValidationError::MissingTitle)) => {}
        other => panic!("expected missing title, got {other:?}"),
    }
    match service.create_property(draft("Shed", 0.0), &context()) {
        Err(ListingServiceError::Validation(ValidationError::NonPositiveExpectedPrice {
            ..
        })) => {}
        other => panic!("expected price validation, got {other:?}"),
    }

    assert!(repository.properties().expect("list").is_empty());
}

#[test]
fn create_property_requires_known_references() {
    let (service, _) = build_service();
    let mut listing = draft("Loft", 180_000.0);
    listing.tag_ids = BTreeSet::from([TagId(99)]);

    match service.create_property(listing, &context()) {
        Err(ListingServiceError::Validation(ValidationError::UnknownTag(TagId(99)))) => {}
        other => panic!("expected unknown tag, got {other:?}"),
    }

    let tag = service.create_tag("renovated".to_string()).expect("tag");
    let kind = service
        .create_property_type("Apartment".to_string())
        .expect("type");
    let mut listing = draft("Loft", 180_000.0);
    listing.tag_ids = BTreeSet::from([tag.id]);
    listing.property_type_id = Some(kind.id);
    let property = service
        .create_property(listing, &context())
        .expect("references resolve");
    assert!(property.tag_ids.contains(&tag.id));
    assert_eq!(property.property_type_id, Some(kind.id));
}

#[test]
fn property_view_derives_area_and_best_price() {
    let (service, _) = build_service();
    let mut listing = draft("Villa", 400_000.0);
    listing.living_area = 180;
    listing.garden = true;
    listing.garden_area = 45;
    let property = service
        .create_property(listing, &context())
        .expect("listed");

    let empty = service.property_view(property.id).expect("view");
    assert_eq!(empty.total_area, 225.0);
    assert_eq!(empty.best_price, 0.0);

    for price in [50_000.0, 80_000.0, 65_000.0] {
        service
            .create_offer(offer_draft(property.id, price), &context())
            .expect("offer registered");
    }

    let view = service.property_view(property.id).expect("view");
    assert_eq!(view.best_price, 80_000.0);
    assert_eq!(view.offer_ids.len(), 3);

    service
        .update_property(
            property.id,
            PropertyPatch {
                garden_area: Some(5),
                ..PropertyPatch::default()
            },
        )
        .expect("updated");
    assert_eq!(
        service.property_view(property.id).expect("view").total_area,
        185.0
    );
}

#[test]
fn offer_deadline_follows_creation_date_and_validity() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Townhouse");
    let later = date(2024, 2, 20);

    let offer = service
        .create_offer(offer_draft(property.id, 95_000.0), &context())
        .expect("offer registered");
    assert_eq!(offer.offer.validity, 7);
    assert_eq!(offer.date_deadline, date(2024, 1, 8));

    let moved = service
        .update_offer(
            offer.offer.id,
            OfferPatch {
                date_deadline: Some(date(2024, 1, 15)),
                ..OfferPatch::default()
            },
            later,
        )
        .expect("deadline moved");
    assert_eq!(moved.offer.validity, 14);
    assert_eq!(moved.date_deadline, date(2024, 1, 15));

    let viewed = service.offer_view(offer.offer.id, later).expect("view");
    assert_eq!(viewed.date_deadline, date(2024, 1, 15));
}

#[test]
fn offer_draft_deadline_counts_from_today() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Bungalow");
    let mut draft = offer_draft(property.id, 99_000.0);
    draft.date_deadline = Some(date(2024, 1, 11));

    let offer = service
        .create_offer(draft, &context())
        .expect("offer registered");
    assert_eq!(offer.offer.validity, 10);
    assert_eq!(offer.date_deadline, date(2024, 1, 11));
}

#[test]
fn offer_patch_prefers_deadline_over_validity() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Chalet");
    let offer = service
        .create_offer(offer_draft(property.id, 90_000.0), &context())
        .expect("offer");

    let updated = service
        .update_offer(
            offer.offer.id,
            OfferPatch {
                validity: Some(30),
                date_deadline: Some(date(2023, 12, 30)),
                status: Some(OfferStatus::Refused),
                ..OfferPatch::default()
            },
            date(2024, 1, 2),
        )
        .expect("updated");

    assert_eq!(updated.offer.validity, -2);
    assert_eq!(updated.offer.status, Some(OfferStatus::Refused));
}

#[test]
fn offer_requires_existing_property() {
    let (service, _) = build_service();
    match service.create_offer(offer_draft(PropertyId(404), 1.0), &context()) {
        Err(ListingServiceError::Validation(ValidationError::UnknownProperty(PropertyId(404)))) => {
        }
        other => panic!("expected unknown property, got {other:?}"),
    }
}

#[test]
fn mark_sold_refuses_canceled_property_and_keeps_state() {
    let (service, repository) = build_service();
    let property = listed_property(&service, "Cabin");

    service
        .apply_action(property.id, LifecycleAction::MarkCanceled)
        .expect("cancel succeeds");

    match service.apply_action(property.id, LifecycleAction::MarkSold) {
        Err(ListingServiceError::Lifecycle(LifecycleError::CanceledCannotBeSold)) => {}
        other => panic!("expected lifecycle refusal, got {other:?}"),
    }

    let stored = repository
        .fetch_property(property.id)
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.state, PropertyState::Canceled);
}

#[test]
fn mark_canceled_refuses_sold_property() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Farm");

    let sold = service.mark_sold(&[property.id]);
    assert!(sold.all_succeeded());
    assert_eq!(sold.outcomes[0].state, Some("sold"));

    let canceled = service.mark_canceled(&[property.id]);
    assert!(!canceled.all_succeeded());
    assert_eq!(
        canceled.outcomes[0].reason.as_deref(),
        Some("a sold property cannot be canceled")
    );
}

#[test]
fn batch_actions_report_each_record_independently() {
    let (service, repository) = build_service();
    let first = listed_property(&service, "North lot");
    let second = listed_property(&service, "South lot");
    let third = listed_property(&service, "East lot");
    service.mark_canceled(&[second.id]);

    let batch = service.mark_sold(&[first.id, second.id, PropertyId(999), third.id]);

    let successes: Vec<bool> = batch.outcomes.iter().map(|o| o.success).collect();
    assert_eq!(successes, vec![true, false, false, true]);
    assert_eq!(batch.failures().count(), 2);
    assert_eq!(batch.outcomes[2].reason.as_deref(), Some("record not found"));

    let state_of = |id| {
        repository
            .fetch_property(id)
            .expect("fetch")
            .expect("present")
            .state
    };
    assert_eq!(state_of(first.id), PropertyState::Sold);
    assert_eq!(state_of(second.id), PropertyState::Canceled);
    assert_eq!(state_of(third.id), PropertyState::Sold);
}

#[test]
fn record_sale_enforces_ninety_percent_floor() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Penthouse");

    match service.record_sale(
        property.id,
        SaleTerms {
            selling_price: 85_000.0,
            buyer_id: PartnerId(5),
        },
    ) {
        Err(ListingServiceError::Validation(ValidationError::SellingPriceTooLow { .. })) => {}
        other => panic!("expected selling price validation, got {other:?}"),
    }

    let sold = service
        .record_sale(
            property.id,
            SaleTerms {
                selling_price: 90_000.0,
                buyer_id: PartnerId(5),
            },
        )
        .expect("sale recorded");
    assert_eq!(sold.selling_price, 90_000.0);
    assert_eq!(sold.buyer_id, Some(PartnerId(5)));

    match service.update_property(
        property.id,
        PropertyPatch {
            expected_price: Some(120_000.0),
            ..PropertyPatch::default()
        },
    ) {
        Err(ListingServiceError::Validation(ValidationError::SellingPriceTooLow {
            minimum,
            ..
        })) => assert_eq!(minimum, 108_000.0),
        other => panic!("raising the expected price should revalidate, got {other:?}"),
    }
}

#[test]
fn duplicate_resets_fields_that_are_not_copied() {
    let (service, _) = build_service();
    let property = listed_property(&service, "Original");
    service
        .create_offer(offer_draft(property.id, 95_000.0), &context())
        .expect("offer");
    service
        .record_sale(
            property.id,
            SaleTerms {
                selling_price: 95_000.0,
                buyer_id: PartnerId(3),
            },
        )
        .expect("sale");
    service.mark_sold(&[property.id]);

    let later = crate::listings::ActionContext::new(
        UserId(8),
        date(2024, 6, 1).and_hms_opt(8, 0, 0).expect("valid time"),
    );
    let copy = service
        .duplicate_property(property.id, &later)
        .expect("duplicated");

    assert_ne!(copy.id, property.id);
    assert_eq!(copy.name, "Original");
    assert_eq!(copy.expected_price, 100_000.0);
    assert_eq!(copy.selling_price, 0.0);
    assert_eq!(copy.state, PropertyState::New);
    assert!(copy.buyer_id.is_none());
    assert_eq!(copy.salesperson_id, UserId(7));
    assert_eq!(copy.date_availability, Some(date(2024, 9, 1)));
    assert!(service
        .property_view(copy.id)
        .expect("view")
        .offer_ids
        .is_empty());
}

#[test]
fn default_search_hides_inactive_properties() {
    let (service, _) = build_service();
    let active = listed_property(&service, "Visible");
    let mut hidden = draft("Hidden", 100_000.0);
    hidden.active = false;
    let hidden = service
        .create_property(hidden, &context())
        .expect("listed");

    let found = service
        .search_properties(PropertyQuery::default())
        .expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, active.id);

    let everything = service
        .search_properties(PropertyQuery {
            include_inactive: true,
            state: None,
        })
        .expect("search");
    assert_eq!(everything.len(), 2);

    service.mark_sold(&[hidden.id]);
    let sold = service
        .search_properties(PropertyQuery {
            include_inactive: true,
            state: Some(PropertyState::Sold),
        })
        .expect("search");
    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].id, hidden.id);
}

#[test]
fn garden_assist_prefills_and_clears() {
    let (service, _) = build_service();
    let enabled = service.garden_assist(true);
    assert_eq!(enabled.garden_area, Some(10));
    assert!(enabled.warning.is_some());

    let disabled = service.garden_assist(false);
    assert_eq!(disabled.garden_area, None);
    assert_eq!(disabled.garden_orientation, None);
}

#[test]
fn policy_overrides_offer_validity_and_bedrooms() {
    let repository = Arc::new(crate::listings::InMemoryListingRepository::default());
    let policy = ListingPolicy {
        offer_validity_days: 21,
        default_bedrooms: 4,
        ..ListingPolicy::default()
    };
    let service = ListingService::new(repository, policy);

    let property = listed_property(&service, "Big house");
    assert_eq!(property.bedrooms, 4);
    let offer = service
        .create_offer(offer_draft(property.id, 120_000.0), &context())
        .expect("offer");
    assert_eq!(offer.date_deadline, date(2024, 1, 22));
}

#[test]
fn repository_outages_propagate() {
    let service = ListingService::new(Arc::new(UnavailableRepository), ListingPolicy::default());

    match service.create_property(draft("Offline", 100_000.0), &context()) {
        Err(ListingServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable repository, got {other:?}"),
    }

    let batch = service.mark_sold(&[PropertyId(1)]);
    assert!(!batch.all_succeeded());
    assert!(batch.outcomes[0]
        .reason
        .as_deref()
        .is_some_and(|reason| reason.contains("database offline")));
}

#[test]
fn patch_clears_nullable_fields() {
    let (service, _) = build_service();
    let mut garden = draft("Orchard house", 180_000.0);
    garden.garden = true;
    garden.garden_area = 40;
    garden.garden_orientation = Some(GardenOrientation::North);
    let property = service
        .create_property(garden, &context())
        .expect("listed");

    let updated = service
        .update_property(
            property.id,
            PropertyPatch {
                garden: Some(false),
                garden_area: Some(0),
                garden_orientation: Some(None),
                description: Some(None),
                ..PropertyPatch::default()
            },
        )
        .expect("updated");

    assert!(!updated.garden);
    assert_eq!(updated.garden_area, 0);
    assert_eq!(updated.garden_orientation, None);
    assert_eq!(updated.description, None);
    assert_eq!(updated.postcode.as_deref(), Some("1000"));

    let stored = service.property_view(property.id).expect("view");
    assert_eq!(stored.property.garden_orientation, None);
    assert_eq!(stored.total_area, 120.0);
}

#[test]
fn concurrent_sold_and_canceled_cannot_both_win() {
    let (service, _) = build_service();

    for round in 0..200 {
        let property = listed_property(&service, &format!("Contested {round}"));
        let barrier = Barrier::new(2);

        let (sold, canceled) = thread::scope(|scope| {
            let sold = scope.spawn(|| {
                barrier.wait();
                service.mark_sold(&[property.id])
            });
            let canceled = scope.spawn(|| {
                barrier.wait();
                service.mark_canceled(&[property.id])
            });
            (
                sold.join().expect("sold thread"),
                canceled.join().expect("canceled thread"),
            )
        });

        assert_ne!(
            sold.all_succeeded(),
            canceled.all_succeeded(),
            "exactly one action wins in round {round}"
        );
        let expected = if sold.all_succeeded() {
            PropertyState::Sold
        } else {
            PropertyState::Canceled
        };
        let stored = service.property_view(property.id).expect("view");
        assert_eq!(stored.property.state, expected);
    }
}

#[test]
fn concurrent_sale_terms_and_state_change_both_persist() {
    let (service, _) = build_service();

    for round in 0..200 {
        let property = listed_property(&service, &format!("Busy {round}"));
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                service
                    .record_sale(
                        property.id,
                        SaleTerms {
                            selling_price: 95_000.0,
                            buyer_id: PartnerId(8),
                        },
                    )
                    .expect("sale recorded");
            });
            scope.spawn(|| {
                barrier.wait();
                assert!(service.mark_sold(&[property.id]).all_succeeded());
            });
        });

        let stored = service.property_view(property.id).expect("view").property;
        assert_eq!(stored.state, PropertyState::Sold);
        assert_eq!(stored.selling_price, 95_000.0);
        assert_eq!(stored.buyer_id, Some(PartnerId(8)));
    }
}

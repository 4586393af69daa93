use chrono::{Local, NaiveDate, NaiveTime};
use clap::Args;
use estate::error::AppError;
use estate::listings::{
    ActionContext, GardenOrientation, InMemoryListingRepository, ListingPolicy, ListingService,
    OfferDraft, OfferPatch, PartnerId, PropertyDraft, PropertyView, SaleTerms, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Listing date for the walkthrough (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Expected price of the demo property.
    #[arg(long, default_value_t = 100_000.0)]
    pub(crate) expected_price: f64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        expected_price,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let ctx = ActionContext::new(UserId::ADMINISTRATOR, today.and_time(NaiveTime::MIN));
    let service = ListingService::new(
        Arc::new(InMemoryListingRepository::default()),
        ListingPolicy::default(),
    );

    println!("Estate listing demo (listed {today})");

    let house = service.create_tag("family".to_string())?;
    let kind = service.create_property_type("House".to_string())?;
    let mut draft = PropertyDraft {
        name: "Demo house".to_string(),
        description: Some("Detached house with a south-facing garden".to_string()),
        postcode: Some("1000".to_string()),
        expected_price,
        living_area: 140,
        facades: 4,
        garage: true,
        active: true,
        property_type_id: Some(kind.id),
        ..PropertyDraft::default()
    };
    draft.tag_ids.insert(house.id);

    let assist = service.garden_assist(true);
    if let Some(warning) = &assist.warning {
        println!("[{}] {}", warning.title, warning.message);
    }
    draft.garden = assist.garden;
    draft.garden_area = assist.garden_area.unwrap_or_default();
    draft.garden_orientation = Some(GardenOrientation::South);

    let property = service.create_property(draft, &ctx)?;
    render_property(&service.property_view(property.id)?);

    println!("\nOffers");
    let ratios = [0.5, 0.8, 0.65];
    let mut offers = Vec::with_capacity(ratios.len());
    for (index, ratio) in ratios.into_iter().enumerate() {
        let offer = service.create_offer(
            OfferDraft {
                price: (expected_price * ratio).round(),
                partner_id: PartnerId(index as u64 + 10),
                property_id: property.id,
                status: None,
                validity: None,
                date_deadline: None,
            },
            &ctx,
        )?;
        println!(
            "- offer {} from partner {}: {:.2}, valid {} days (deadline {})",
            offer.offer.id.0,
            offer.offer.partner_id.0,
            offer.offer.price,
            offer.offer.validity,
            offer.date_deadline
        );
        offers.push(offer);
    }

    if let Some(first) = offers.first() {
        let extended_to = first.date_deadline + chrono::Duration::days(7);
        let extended = service.update_offer(
            first.offer.id,
            OfferPatch {
                date_deadline: Some(extended_to),
                ..OfferPatch::default()
            },
            today,
        )?;
        println!(
            "- offer {} deadline moved to {}: validity now {} days",
            extended.offer.id.0, extended.date_deadline, extended.offer.validity
        );
    }

    let view = service.property_view(property.id)?;
    println!("Best offer: {:.2}", view.best_price);

    println!("\nSale");
    let low = expected_price * 0.85;
    match service.record_sale(
        property.id,
        SaleTerms {
            selling_price: low,
            buyer_id: PartnerId(11),
        },
    ) {
        Ok(_) => println!("- selling at {low:.2} accepted"),
        Err(err) => println!("- selling at {low:.2} refused: {err}"),
    }
    service.record_sale(
        property.id,
        SaleTerms {
            selling_price: view.best_price.max(expected_price * 0.9),
            buyer_id: PartnerId(11),
        },
    )?;

    for batch in [
        service.mark_sold(&[property.id]),
        service.mark_canceled(&[property.id]),
    ] {
        for outcome in &batch.outcomes {
            match (&outcome.state, &outcome.reason) {
                (Some(state), _) => println!(
                    "- {} on property {}: now {}",
                    batch.action.label(),
                    outcome.property_id.0,
                    state
                ),
                (None, Some(reason)) => println!(
                    "- {} on property {} refused: {}",
                    batch.action.label(),
                    outcome.property_id.0,
                    reason
                ),
                (None, None) => {}
            }
        }
    }

    println!();
    render_property(&service.property_view(property.id)?);
    Ok(())
}

fn render_property(view: &PropertyView) {
    let property = &view.property;
    println!(
        "Property {} '{}' [{}]",
        property.id.0, property.name, view.state_label
    );
    println!(
        "- expected {:.2}, selling {:.2}, best offer {:.2}",
        property.expected_price, property.selling_price, view.best_price
    );
    println!(
        "- {} bedrooms, living {} sqm, garden {} sqm ({}), total {} sqm",
        property.bedrooms,
        property.living_area,
        property.garden_area,
        property
            .garden_orientation
            .map_or("no orientation", |orientation| orientation.label()),
        view.total_area
    );
    if let Some(available) = property.date_availability {
        println!("- available from {available}");
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use clap::Args;

use hostel_finder::catalog::{HostelDraft, HostelId};
use hostel_finder::engagement::{InteractionKind, SummaryPeriod};
use hostel_finder::error::AppError;
use hostel_finder::identity::{Principal, PrincipalProvider, UserId};
use hostel_finder::moderation::{
    DocumentRef, Evidence, ReviewOutcome, VerificationTarget,
};
use hostel_finder::search::SearchQuery;

use crate::infra::{parse_date, seed_store, InMemoryStore};
use crate::routes::ApiContext;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date for the analytics summary (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn demo_err(err: impl std::fmt::Display) -> AppError {
    std::io::Error::other(err.to_string()).into()
}

fn principal(context: &ApiContext, id: u64) -> Principal {
    context
        .store
        .principal(UserId(id))
        .expect("in-memory lookup cannot fail")
        .expect("seeded principal present")
}

/// Walk the seeded store through the three core workflows and print each
/// result, so the whole pipeline can be eyeballed without an HTTP client.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let now = Utc::now();

    let store = Arc::new(InMemoryStore::default());
    seed_store(&store);
    let context = ApiContext::new(store);

    let admin = principal(&context, 1);
    let owner = principal(&context, 2);
    let student = principal(&context, 3);

    println!("== geo search: 10 km around Liberty roundabout ==");
    let query = SearchQuery {
        latitude: 31.51,
        longitude: 74.33,
        radius_km: 10.0,
        gender: None,
        min_price: None,
        max_price: Some(20000),
        facilities: BTreeSet::new(),
    };
    let results = context
        .search
        .search(Some(student.id), &query, now)
        .map_err(demo_err)?;
    println!("{}", serde_json::to_string_pretty(&results).expect("serializable results"));

    println!("\n== engagement: favorite, view, contact ==");
    context
        .engagement
        .add_favorite(&student, HostelId(1), now)
        .map_err(demo_err)?;
    for kind in [InteractionKind::View, InteractionKind::Whatsapp] {
        context
            .engagement
            .record_interaction(&student, HostelId(1), kind, true, now)
            .map_err(demo_err)?;
    }
    let summary = context
        .analytics
        .generate_summary(HostelId(1), SummaryPeriod::Weekly, today)
        .map_err(demo_err)?;
    println!("{}", serde_json::to_string_pretty(&summary).expect("serializable summary"));

    println!("\n== verification: submit, approve, invalidate ==");
    let request = context
        .verification
        .submit(
            &owner,
            VerificationTarget::Hostel(HostelId(1)),
            Evidence::Hostel {
                utility_bill: DocumentRef("media://lesco-bill-august".to_string()),
            },
            now,
        )
        .map_err(demo_err)?;
    let approved = context
        .verification
        .decide(&admin, &request.id, ReviewOutcome::Approved, None, now)
        .map_err(demo_err)?;
    println!(
        "approved: {}",
        serde_json::to_string_pretty(&approved.view()).expect("serializable view")
    );

    // Moving the pin is a verification-relevant edit; the badge must drop.
    context
        .catalog
        .update_hostel(
            &owner,
            HostelId(1),
            HostelDraft {
                name: "Gulberg Boys Hostel".to_string(),
                city: hostel_finder::catalog::City::Lahore,
                latitude: 31.53,
                longitude: 74.32,
                map_link: None,
                gender: hostel_finder::identity::Gender::Male,
                description: Some("Walking distance from the main campus".to_string()),
            },
        )
        .map_err(demo_err)?;

    let demoted = hostel_finder::moderation::VerificationRepository::fetch(
        context.store.as_ref(),
        &request.id,
    )
    .map_err(demo_err)?
    .expect("request persisted");
    println!(
        "after coordinate edit: {}",
        serde_json::to_string_pretty(&demoted.view()).expect("serializable view")
    );

    Ok(())
}

use crate::infra::wire;
use clap::Args;
use estatehub::admin::stats;
use estatehub::config::AppConfig;
use estatehub::error::AppError;
use estatehub::leads::{LeadForm, LeadStatus};
use estatehub::listings::{ListQuery, PropertyDraft};
use estatehub::media::Unconfigured;
use estatehub::notify::LogMailer;
use estatehub::onboarding::{OtpRepository, SignupForm};
use estatehub::storage::MemoryStore;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// City used for the sample listing and the search
    #[arg(long, default_value = "Pune")]
    pub(crate) city: String,
    /// Asking price of the sample listing, in rupees
    #[arg(long, default_value_t = 8_500_000)]
    pub(crate) price: u64,
    /// Skip the lead pipeline portion of the demo
    #[arg(long)]
    pub(crate) skip_leads: bool,
}

/// Runs the builder, listing and lead flows against a throwaway in-memory store.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        city,
        price,
        skip_leads,
    } = args;

    let config = AppConfig::load()?;
    let store = Arc::new(MemoryStore::new());
    let services = wire(
        store.clone(),
        Arc::new(LogMailer),
        Arc::new(Unconfigured("ImageKit")),
        Arc::new(Unconfigured("YouTube")),
        &config,
    );
    let onboarding = services.onboarding.as_ref().clone().with_password_cost(4);

    println!("EstateHub demo");
    println!("\nBuilder onboarding");
    let email = "demo.builder@example.com";
    if let Err(err) = onboarding.send_otp(email).await {
        println!("  Verification code not sent: {}", err);
        return Ok(());
    }
    let code = match store.latest(email, false).await {
        Ok(Some(record)) => record.code,
        Ok(None) => {
            println!("  No verification code stored");
            return Ok(());
        }
        Err(err) => {
            println!("  Store unavailable: {}", err);
            return Ok(());
        }
    };
    println!("- Code issued for {} (expires in 5 minutes)", email);

    if let Err(err) = onboarding.verify_otp(email, &code).await {
        println!("  Verification failed: {}", err);
        return Ok(());
    }
    println!("- Email verified");

    let form = SignupForm {
        email: email.to_string(),
        password: "demo-password".to_string(),
        full_name: "Demo Builder".to_string(),
        phone: "+91 90000 00000".to_string(),
        company_name: "Demo Constructions".to_string(),
        company_address: format!("MG Road, {city}"),
        gst_number: "27AAAAA0000A1Z5".to_string(),
        pan_number: "AAAAA0000A".to_string(),
        registration_certificate: None,
        gst_certificate: None,
    };
    let builder_id = match onboarding.signup(form).await {
        Ok(id) => id,
        Err(err) => {
            println!("  Signup rejected: {}", err);
            return Ok(());
        }
    };
    println!("- Registered builder {} (pending approval)", builder_id);

    match onboarding.approve(&builder_id.0, Some("Demo Admin")).await {
        Ok(outcome) => println!(
            "- Approved by {} | temporary password emailed: {}",
            outcome.builder.approved_by.as_deref().unwrap_or("Admin"),
            outcome.email_delivered
        ),
        Err(err) => {
            println!("  Approval failed: {}", err);
            return Ok(());
        }
    }

    println!("\nListing");
    let draft = PropertyDraft {
        property_title: format!("Demo Heights, {city}"),
        city: city.clone(),
        location: "MG Road".to_string(),
        price: Some(price),
        beds: Some(3),
        baths: Some(2),
        area: Some(1450),
        builder_name: "Demo Constructions".to_string(),
        amenities: vec!["Gym".to_string(), "Clubhouse".to_string()],
        ..PropertyDraft::default()
    };
    let property = match services.listings.create(draft, Some(builder_id.0.clone())).await {
        Ok(property) => property,
        Err(err) => {
            println!("  Listing rejected: {}", err);
            return Ok(());
        }
    };
    let view = property.view();
    println!(
        "- Listed {} at {}",
        property.title,
        view.price_label.as_deref().unwrap_or("price on request")
    );

    let query = ListQuery {
        city: Some(city.clone()),
        beds: Some(2),
        ..ListQuery::default()
    };
    match services.listings.list(&query).await {
        Ok(found) => println!("- Search for 2+ beds in {}: {} result(s)", city, found.len()),
        Err(err) => println!("  Search unavailable: {}", err),
    }

    if !skip_leads {
        println!("\nLead pipeline");
        let form = LeadForm {
            name: "Demo Buyer".to_string(),
            phone: "+91 98888 77777".to_string(),
            message: Some("Is a site visit possible this weekend?".to_string()),
            property_id: Some(property.id.0.clone()),
            property_title: Some(property.title.clone()),
            ..LeadForm::default()
        };
        match services.leads.capture(form).await {
            Ok(lead) => {
                println!("- Captured lead {} ({})", lead.id, lead.status.label());
                for status in [LeadStatus::Contacted, LeadStatus::SiteVisit] {
                    match services.leads.update_status(&lead.id.0, status).await {
                        Ok(updated) => println!("  moved to {}", updated.status.label()),
                        Err(err) => println!("  status change refused: {}", err),
                    }
                }
            }
            Err(err) => println!("  Lead rejected: {}", err),
        }

        match services.leads.export_csv().await {
            Ok(csv) => println!("- CSV export:\n{}", csv.trim_end()),
            Err(err) => println!("  Export unavailable: {}", err),
        }
    }

    println!("\nDashboard");
    match stats::collect(&onboarding, &services.leads, &services.listings).await {
        Ok(stats) => match serde_json::to_string_pretty(&stats) {
            Ok(json) => println!("{}", json),
            Err(err) => println!("  Stats unavailable: {}", err),
        },
        Err(err) => println!("  Stats unavailable: {}", err),
    }

    Ok(())
}

use serde::Serialize;

use super::auth::AdminError;
use crate::leads::{LeadService, LeadStatus};
use crate::listings::ListingService;
use crate::onboarding::{BuilderStatus, OnboardingService};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_properties: usize,
    pub active_leads: usize,
    pub deals_closed: usize,
    pub approved_builders: usize,
    pub pending_builders: usize,
}

pub async fn collect(
    onboarding: &OnboardingService,
    leads: &LeadService,
    listings: &ListingService,
) -> Result<DashboardStats, AdminError> {
    Ok(DashboardStats {
        total_properties: listings.count().await?,
        active_leads: leads.active_count().await?,
        deals_closed: leads.count(LeadStatus::Closed).await?,
        approved_builders: onboarding.count(BuilderStatus::Approved).await?,
        pending_builders: onboarding.count(BuilderStatus::Pending).await?,
    })
}

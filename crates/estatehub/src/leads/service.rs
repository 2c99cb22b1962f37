use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{non_blank, Enquiry, Lead, LeadForm, LeadId, LeadStatus};
use super::repository::LeadRepository;
use crate::contact::normalize_email;
use crate::http::HttpFailure;
use crate::notify::{templates, Delivery, MailError, Mailer};
use crate::storage::RepositoryError;

pub const RECENT_LEAD_LIMIT: usize = 100;

/// Enquiry capture, pipeline updates and forwarding to the sales inbox.
#[derive(Clone)]
pub struct LeadService {
    leads: Arc<dyn LeadRepository>,
    mailer: Arc<dyn Mailer>,
    enquiry_recipient: String,
}

impl LeadService {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        mailer: Arc<dyn Mailer>,
        enquiry_recipient: impl Into<String>,
    ) -> Self {
        Self {
            leads,
            mailer,
            enquiry_recipient: enquiry_recipient.into(),
        }
    }

    pub async fn capture(&self, form: LeadForm) -> Result<Lead, LeadError> {
        self.capture_at(form, Utc::now()).await
    }

    pub async fn capture_at(&self, form: LeadForm, now: DateTime<Utc>) -> Result<Lead, LeadError> {
        let name = form.name.trim();
        let phone = form.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(LeadError::MissingContact);
        }

        let lead = Lead {
            id: LeadId::generate(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: non_blank(form.email).map(|email| normalize_email(&email)),
            message: non_blank(form.message),
            property_id: form.property_id,
            property_title: non_blank(form.property_title),
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };

        let stored = self.leads.insert(lead).await?;
        tracing::info!(lead_id = %stored.id, property_id = ?stored.property_id, "lead captured");
        Ok(stored)
    }

    pub async fn recent(&self) -> Result<Vec<Lead>, LeadError> {
        Ok(self.leads.recent(RECENT_LEAD_LIMIT).await?)
    }

    pub async fn count(&self, status: LeadStatus) -> Result<usize, LeadError> {
        Ok(self.leads.count_by_status(status).await?)
    }

    /// Leads still in the pipeline, i.e. not closed or lost.
    pub async fn active_count(&self) -> Result<usize, LeadError> {
        let mut active = 0;
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::SiteVisit,
            LeadStatus::Negotiation,
        ] {
            active += self.leads.count_by_status(status).await?;
        }
        Ok(active)
    }

    pub async fn update_status(&self, id: &str, status: LeadStatus) -> Result<Lead, LeadError> {
        self.update_status_at(id, status, Utc::now()).await
    }

    pub async fn update_status_at(
        &self,
        id: &str,
        status: LeadStatus,
        now: DateTime<Utc>,
    ) -> Result<Lead, LeadError> {
        let mut lead = self
            .leads
            .fetch(&LeadId(id.trim().to_string()))
            .await?
            .ok_or(LeadError::NotFound)?;

        if lead.status.is_terminal() && lead.status != status {
            return Err(LeadError::Terminal {
                status: lead.status,
            });
        }

        let previous = lead.status;
        lead.status = status;
        lead.updated_at = now;
        self.leads.update(lead.clone()).await?;

        tracing::info!(lead_id = %lead.id, from = previous.label(), to = status.label(), "lead status updated");
        Ok(lead)
    }

    /// Emails an enquiry to the configured inbox. `Ok(Delivery::Skipped)` means no provider.
    pub async fn forward_enquiry(&self, enquiry: Enquiry) -> Result<Delivery, LeadError> {
        if enquiry.name.trim().is_empty() || enquiry.phone.trim().is_empty() {
            return Err(LeadError::MissingContact);
        }

        let message = templates::enquiry_email(&self.enquiry_recipient, &enquiry);
        let delivery = self.mailer.send(message).await?;
        if delivery == Delivery::Skipped {
            tracing::warn!("enquiry email not sent: delivery not configured");
        }
        Ok(delivery)
    }

    /// The recent leads as CSV with a header row.
    pub async fn export_csv(&self) -> Result<String, LeadError> {
        let leads = self.recent().await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        for lead in &leads {
            writer.serialize(LeadCsvRow::from(lead))?;
        }
        if leads.is_empty() {
            writer.write_record(LeadCsvRow::HEADER)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| LeadError::Export(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| LeadError::Export(err.to_string()))
    }
}

#[derive(Serialize)]
struct LeadCsvRow<'a> {
    id: &'a str,
    name: &'a str,
    phone: &'a str,
    email: &'a str,
    message: &'a str,
    property_id: &'a str,
    property_title: &'a str,
    status: &'static str,
    created_at: String,
}

impl LeadCsvRow<'_> {
    const HEADER: [&'static str; 9] = [
        "id",
        "name",
        "phone",
        "email",
        "message",
        "property_id",
        "property_title",
        "status",
        "created_at",
    ];
}

impl<'a> From<&'a Lead> for LeadCsvRow<'a> {
    fn from(lead: &'a Lead) -> Self {
        Self {
            id: &lead.id.0,
            name: &lead.name,
            phone: &lead.phone,
            email: lead.email.as_deref().unwrap_or_default(),
            message: lead.message.as_deref().unwrap_or_default(),
            property_id: lead.property_id.as_deref().unwrap_or_default(),
            property_title: lead.property_title.as_deref().unwrap_or_default(),
            status: lead.status.label(),
            created_at: lead.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("Name and phone are required")]
    MissingContact,
    #[error("Lead not found")]
    NotFound,
    #[error("Lead is already {} and cannot change status", .status.label())]
    Terminal { status: LeadStatus },
    #[error("lead export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl HttpFailure for LeadError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingContact | Self::Terminal { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Mail(MailError::QuotaExceeded { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Export(_) | Self::Csv(_) | Self::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Mail(_) => "Failed to send enquiry email".to_string(),
            Self::Export(_) | Self::Csv(_) => "Failed to export leads".to_string(),
            Self::Repository(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

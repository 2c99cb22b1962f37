//! Customer enquiries: capture, pipeline status and email forwarding.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Enquiry, Lead, LeadForm, LeadId, LeadStatus};
pub use repository::LeadRepository;
pub use router::{leads_router, LeadsState};
pub use service::{LeadError, LeadService, RECENT_LEAD_LIMIT};

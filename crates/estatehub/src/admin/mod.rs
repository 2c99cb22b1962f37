//! Admin dashboard: login, builder decisions, listing removal, lead pipeline and stats.

pub mod auth;
pub mod router;
pub mod stats;


pub use auth::{AdminAuthenticator, AdminError};
pub use router::{admin_router, AdminState};
pub use stats::DashboardStats;

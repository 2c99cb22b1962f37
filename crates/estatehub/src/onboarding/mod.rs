//! Builder registration: email verification codes, signup, login and admin decisions.
//!
//! Accounts move through `pending -> approved | rejected`. Approval issues a temporary
//! password that the builder is asked to change after the first login.

pub mod domain;
pub mod otp;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Builder, BuilderDocuments, BuilderId, BuilderOverview, BuilderStatus, BuilderSummary,
    BuilderView, CompanyDetails, SignupForm,
};
pub use otp::{OtpCheck, OtpId, OtpRecord, MAX_OTP_ATTEMPTS, OTP_TTL_MINUTES};
pub use repository::{BuilderRepository, OtpRepository};
pub use router::onboarding_router;
pub use service::{
    BuilderLogin, DecisionOutcome, OnboardingError, OnboardingService, DEFAULT_REJECTION_REASON,
};

pub mod admin;
pub mod auth;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod leads;
pub mod listings;
pub mod media;
pub mod notify;
pub mod onboarding;
pub mod storage;
pub mod telemetry;

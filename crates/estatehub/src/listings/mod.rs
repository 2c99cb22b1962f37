//! Property listings: creation, lookup, filtered search and admin removal.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    format_price, BudgetRange, ListingStatus, Possession, Property, PropertyDraft, PropertyFilter,
    PropertyId, PropertyType, PropertyView,
};
pub use repository::PropertyRepository;
pub use router::{listings_router, ListingsState};
pub use service::{
    Deletion, ListQuery, ListingError, ListingService, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};

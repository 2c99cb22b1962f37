use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::domain::{
    BudgetRange, ListingStatus, Property, PropertyDraft, PropertyFilter, PropertyId, PropertyType,
};
use super::repository::PropertyRepository;
use crate::http::{de, HttpFailure};
use crate::media::ImageHost;
use crate::storage::RepositoryError;

pub const DEFAULT_LIST_LIMIT: usize = 6;
pub const MAX_LIST_LIMIT: usize = 1000;

/// Query string accepted by the listing search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListQuery {
    #[serde(deserialize_with = "de::optional_number")]
    pub limit: Option<usize>,
    pub city: Option<String>,
    #[serde(deserialize_with = "de::optional_from_str")]
    pub property_type: Option<PropertyType>,
    #[serde(deserialize_with = "de::optional_number")]
    pub min_price: Option<u64>,
    #[serde(deserialize_with = "de::optional_number")]
    pub max_price: Option<u64>,
    #[serde(deserialize_with = "de::optional_from_str")]
    pub budget: Option<BudgetRange>,
    #[serde(deserialize_with = "de::optional_number")]
    pub beds: Option<u32>,
}

impl ListQuery {
    pub fn filter(&self) -> PropertyFilter {
        let filter = PropertyFilter {
            city: self
                .city
                .as_ref()
                .map(|city| city.trim().to_string())
                .filter(|city| !city.is_empty()),
            property_type: self.property_type,
            min_price: self.min_price,
            max_price: self.max_price,
            min_beds: self.beds,
        };
        match self.budget {
            Some(budget) => filter.with_budget(budget),
            None => filter,
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

/// Outcome of removing a listing. Image cleanup never blocks the deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub property_id: PropertyId,
    pub files_removed: usize,
    pub files_failed: usize,
}

#[derive(Clone)]
pub struct ListingService {
    properties: Arc<dyn PropertyRepository>,
    images: Arc<dyn ImageHost>,
}

impl ListingService {
    pub fn new(properties: Arc<dyn PropertyRepository>, images: Arc<dyn ImageHost>) -> Self {
        Self { properties, images }
    }

    pub async fn create(
        &self,
        draft: PropertyDraft,
        builder_id: Option<String>,
    ) -> Result<Property, ListingError> {
        self.create_at(draft, builder_id, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        draft: PropertyDraft,
        builder_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Property, ListingError> {
        let title = draft.property_title.trim();
        if title.is_empty() {
            return Err(ListingError::MissingTitle);
        }

        let property = Property {
            id: PropertyId::generate(),
            title: title.to_string(),
            property_type: draft.property_type,
            location: draft.location.trim().to_string(),
            city: draft.city.trim().to_string(),
            price: draft.price,
            beds: draft.beds,
            baths: draft.baths,
            area: draft.area,
            description: draft.description,
            amenities: draft.amenities,
            possession: draft.possession,
            builder_name: draft.builder_name.trim().to_string(),
            builder_phone: draft.builder_phone.trim().to_string(),
            builder_email: draft.builder_email.trim().to_ascii_lowercase(),
            builder_id,
            images: draft.images,
            image_file_ids: draft.image_file_ids,
            video_url: draft.video_url.filter(|url| !url.trim().is_empty()),
            floor_plan: draft.floor_plan.filter(|url| !url.trim().is_empty()),
            floor_plan_file_id: draft.floor_plan_file_id.filter(|id| !id.trim().is_empty()),
            status: ListingStatus::Active,
            created_at: now,
        };

        let stored = self.properties.insert(property).await?;
        tracing::info!(property_id = %stored.id, title = %stored.title, builder_id = ?stored.builder_id, "property listed");
        Ok(stored)
    }

    pub async fn get(&self, id: Option<&str>) -> Result<Property, ListingError> {
        let id = id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ListingError::MissingId)?;
        self.properties
            .fetch(&PropertyId(id.to_string()))
            .await?
            .ok_or(ListingError::NotFound)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Property>, ListingError> {
        let filter = query.filter();
        let limit = query.effective_limit();
        let properties = self.properties.list(&filter, limit).await?;
        tracing::debug!(count = properties.len(), limit, filtered = !filter.is_empty(), "properties listed");
        Ok(properties)
    }

    pub async fn count(&self) -> Result<usize, ListingError> {
        Ok(self.properties.count().await?)
    }

    /// Deletes the listing, then makes a best-effort pass over its hosted images.
    pub async fn delete(&self, id: &str) -> Result<Deletion, ListingError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ListingError::MissingDeleteId);
        }

        let property = self
            .properties
            .delete(&PropertyId(id.to_string()))
            .await?
            .ok_or(ListingError::NotFound)?;

        let mut deletion = Deletion {
            property_id: property.id.clone(),
            files_removed: 0,
            files_failed: 0,
        };
        for file_id in property.hosted_file_ids() {
            match self.images.delete(&file_id).await {
                Ok(()) => deletion.files_removed += 1,
                Err(err) => {
                    deletion.files_failed += 1;
                    tracing::warn!(property_id = %property.id, file_id = %file_id, error = %err, "hosted image cleanup failed");
                }
            }
        }

        tracing::info!(
            property_id = %property.id,
            files_removed = deletion.files_removed,
            files_failed = deletion.files_failed,
            "property deleted"
        );
        Ok(deletion)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Property title is required")]
    MissingTitle,
    #[error("Property ID required")]
    MissingId,
    #[error("Property ID is required")]
    MissingDeleteId,
    #[error("Property not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl HttpFailure for ListingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingTitle | Self::MissingId | Self::MissingDeleteId => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Repository(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RepositoryError, StoreHealth};
use crate::leads::{Lead, LeadId, LeadRepository, LeadStatus};
use crate::listings::{Property, PropertyFilter, PropertyId, PropertyRepository};
use crate::onboarding::{
    Builder, BuilderId, BuilderRepository, BuilderStatus, OtpId, OtpRecord, OtpRepository,
};

/// Process-local store backing every repository trait. Records are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    builders: Mutex<Vec<Builder>>,
    otps: Mutex<Vec<OtpRecord>>,
    leads: Mutex<Vec<Lead>>,
    properties: Mutex<Vec<Property>>,
}

fn lock<T>(mutex: &Mutex<Vec<T>>) -> Result<MutexGuard<'_, Vec<T>>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
}

/// Sorts newest first; ties keep the later insertion first.
fn newest_first<T: Clone>(records: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut sorted: Vec<T> = records.iter().rev().cloned().collect();
    sorted.sort_by_key(|record| std::cmp::Reverse(created_at(record)));
    sorted
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        lock(&self.builders).map(|_| ())
    }
}

#[async_trait]
impl BuilderRepository for MemoryStore {
    async fn insert(&self, builder: Builder) -> Result<Builder, RepositoryError> {
        let mut builders = lock(&self.builders)?;
        if builders
            .iter()
            .any(|existing| existing.email == builder.email || existing.id == builder.id)
        {
            return Err(RepositoryError::Conflict);
        }
        builders.push(builder.clone());
        Ok(builder)
    }

    async fn update(&self, builder: Builder) -> Result<(), RepositoryError> {
        let mut builders = lock(&self.builders)?;
        let slot = builders
            .iter_mut()
            .find(|existing| existing.id == builder.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = builder;
        Ok(())
    }

    async fn fetch(&self, id: &BuilderId) -> Result<Option<Builder>, RepositoryError> {
        let builders = lock(&self.builders)?;
        Ok(builders.iter().find(|builder| &builder.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError> {
        let builders = lock(&self.builders)?;
        Ok(builders.iter().find(|builder| builder.email == email).cloned())
    }

    async fn list_by_status(
        &self,
        status: Option<BuilderStatus>,
    ) -> Result<Vec<Builder>, RepositoryError> {
        let builders = lock(&self.builders)?;
        let matching: Vec<Builder> = builders
            .iter()
            .filter(|builder| status.map_or(true, |status| builder.status == status))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |builder| builder.created_at))
    }

    async fn count_by_status(&self, status: BuilderStatus) -> Result<usize, RepositoryError> {
        let builders = lock(&self.builders)?;
        Ok(builders.iter().filter(|builder| builder.status == status).count())
    }
}

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn insert(&self, record: OtpRecord) -> Result<(), RepositoryError> {
        lock(&self.otps)?.push(record);
        Ok(())
    }

    async fn latest(
        &self,
        email: &str,
        verified: bool,
    ) -> Result<Option<OtpRecord>, RepositoryError> {
        let otps = lock(&self.otps)?;
        let matching: Vec<OtpRecord> = otps
            .iter()
            .filter(|record| record.email == email && record.verified == verified)
            .cloned()
            .collect();
        Ok(newest_first(&matching, |record| record.created_at)
            .into_iter()
            .next())
    }

    async fn update(&self, record: OtpRecord) -> Result<(), RepositoryError> {
        let mut otps = lock(&self.otps)?;
        let slot = otps
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = record;
        Ok(())
    }

    async fn delete(&self, id: &OtpId) -> Result<(), RepositoryError> {
        lock(&self.otps)?.retain(|record| &record.id != id);
        Ok(())
    }

    async fn delete_for_email(&self, email: &str) -> Result<usize, RepositoryError> {
        let mut otps = lock(&self.otps)?;
        let before = otps.len();
        otps.retain(|record| record.email != email);
        Ok(before - otps.len())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut otps = lock(&self.otps)?;
        let before = otps.len();
        otps.retain(|record| !record.is_expired(now));
        Ok(before - otps.len())
    }
}

#[async_trait]
impl LeadRepository for MemoryStore {
    async fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        let mut leads = lock(&self.leads)?;
        if leads.iter().any(|existing| existing.id == lead.id) {
            return Err(RepositoryError::Conflict);
        }
        leads.push(lead.clone());
        Ok(lead)
    }

    async fn update(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut leads = lock(&self.leads)?;
        let slot = leads
            .iter_mut()
            .find(|existing| existing.id == lead.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = lead;
        Ok(())
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let leads = lock(&self.leads)?;
        Ok(leads.iter().find(|lead| &lead.id == id).cloned())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        let leads = lock(&self.leads)?;
        let mut recent = newest_first(leads.as_slice(), |lead| lead.created_at);
        recent.truncate(limit);
        Ok(recent)
    }

    async fn count_by_status(&self, status: LeadStatus) -> Result<usize, RepositoryError> {
        let leads = lock(&self.leads)?;
        Ok(leads.iter().filter(|lead| lead.status == status).count())
    }
}

#[async_trait]
impl PropertyRepository for MemoryStore {
    async fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut properties = lock(&self.properties)?;
        if properties.iter().any(|existing| existing.id == property.id) {
            return Err(RepositoryError::Conflict);
        }
        properties.push(property.clone());
        Ok(property)
    }

    async fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let properties = lock(&self.properties)?;
        Ok(properties.iter().find(|property| &property.id == id).cloned())
    }

    async fn delete(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let mut properties = lock(&self.properties)?;
        let position = properties.iter().position(|property| &property.id == id);
        Ok(position.map(|index| properties.remove(index)))
    }

    async fn list(
        &self,
        filter: &PropertyFilter,
        limit: usize,
    ) -> Result<Vec<Property>, RepositoryError> {
        let properties = lock(&self.properties)?;
        let matching: Vec<Property> = properties
            .iter()
            .filter(|property| filter.matches(property))
            .cloned()
            .collect();
        let mut listed = newest_first(&matching, |property| property.created_at);
        listed.truncate(limit);
        Ok(listed)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(lock(&self.properties)?.len())
    }
}

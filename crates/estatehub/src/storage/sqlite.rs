use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::{RepositoryError, StoreHealth};
use crate::leads::{Lead, LeadId, LeadRepository, LeadStatus};
use crate::listings::{Property, PropertyFilter, PropertyId, PropertyRepository};
use crate::onboarding::{
    Builder, BuilderId, BuilderRepository, BuilderStatus, OtpId, OtpRecord, OtpRepository,
};

/// SQLite-backed store. Each record is kept as a JSON document next to its lookup columns.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies pending migrations.
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(unavailable)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(unavailable)?;
        Self::migrated(pool).await
    }

    /// Private in-memory database on a single connection.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(unavailable)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(unavailable)?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        tracing::info!("database migrations applied");
        Ok(Self { pool })
    }
}

fn unavailable(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

/// Unique-constraint violations surface as `Conflict`.
fn write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        _ => unavailable(err),
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode<T: Serialize>(record: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(record).map_err(|err| RepositoryError::Corrupt(err.to_string()))
}

fn decode<T: DeserializeOwned>(row: &SqliteRow) -> Result<T, RepositoryError> {
    let doc: String = row.try_get("doc").map_err(unavailable)?;
    serde_json::from_str(&doc).map_err(|err| RepositoryError::Corrupt(err.to_string()))
}

fn decode_all<T: DeserializeOwned>(rows: &[SqliteRow]) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(decode).collect()
}

fn count_from(row: &SqliteRow) -> Result<usize, RepositoryError> {
    let count: i64 = row.try_get(0).map_err(unavailable)?;
    Ok(usize::try_from(count).unwrap_or_default())
}

fn affected(rows: u64) -> usize {
    usize::try_from(rows).unwrap_or(usize::MAX)
}

#[async_trait]
impl StoreHealth for SqliteStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl BuilderRepository for SqliteStore {
    async fn insert(&self, builder: Builder) -> Result<Builder, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO builders (id, email, status, created_at, doc)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&builder.id.0)
        .bind(&builder.email)
        .bind(builder.status.label())
        .bind(timestamp(builder.created_at))
        .bind(encode(&builder)?)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(builder)
    }

    async fn update(&self, builder: Builder) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE builders SET email = ?2, status = ?3, doc = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&builder.id.0)
        .bind(&builder.email)
        .bind(builder.status.label())
        .bind(encode(&builder)?)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn fetch(&self, id: &BuilderId) -> Result<Option<Builder>, RepositoryError> {
        let row = sqlx::query("SELECT doc FROM builders WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Builder>, RepositoryError> {
        let row = sqlx::query("SELECT doc FROM builders WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_by_status(
        &self,
        status: Option<BuilderStatus>,
    ) -> Result<Vec<Builder>, RepositoryError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT doc FROM builders
                    WHERE status = ?1
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(status.label())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT doc FROM builders ORDER BY created_at DESC, rowid DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(unavailable)?;
        decode_all(&rows)
    }

    async fn count_by_status(&self, status: BuilderStatus) -> Result<usize, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) FROM builders WHERE status = ?1")
            .bind(status.label())
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        count_from(&row)
    }
}

#[async_trait]
impl OtpRepository for SqliteStore {
    async fn insert(&self, record: OtpRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO otps (id, email, verified, expires_at, created_at, doc)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id.0)
        .bind(&record.email)
        .bind(record.verified)
        .bind(timestamp(record.expires_at))
        .bind(timestamp(record.created_at))
        .bind(encode(&record)?)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn latest(
        &self,
        email: &str,
        verified: bool,
    ) -> Result<Option<OtpRecord>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT doc FROM otps
            WHERE email = ?1 AND verified = ?2
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    async fn update(&self, record: OtpRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE otps SET verified = ?2, doc = ?3 WHERE id = ?1")
            .bind(&record.id.0)
            .bind(record.verified)
            .bind(encode(&record)?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &OtpId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM otps WHERE id = ?1")
            .bind(&id.0)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete_for_email(&self, email: &str) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM otps WHERE email = ?1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(affected(result.rows_affected()))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM otps WHERE expires_at < ?1")
            .bind(timestamp(now))
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(affected(result.rows_affected()))
    }
}

#[async_trait]
impl LeadRepository for SqliteStore {
    async fn insert(&self, lead: Lead) -> Result<Lead, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO leads (id, status, created_at, doc)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&lead.id.0)
        .bind(lead.status.label())
        .bind(timestamp(lead.created_at))
        .bind(encode(&lead)?)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(lead)
    }

    async fn update(&self, lead: Lead) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE leads SET status = ?2, doc = ?3 WHERE id = ?1")
            .bind(&lead.id.0)
            .bind(lead.status.label())
            .bind(encode(&lead)?)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query("SELECT doc FROM leads WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM leads
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;
        decode_all(&rows)
    }

    async fn count_by_status(&self, status: LeadStatus) -> Result<usize, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) FROM leads WHERE status = ?1")
            .bind(status.label())
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        count_from(&row)
    }
}

#[async_trait]
impl PropertyRepository for SqliteStore {
    async fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        sqlx::query("INSERT INTO properties (id, created_at, doc) VALUES (?1, ?2, ?3)")
            .bind(&property.id.0)
            .bind(timestamp(property.created_at))
            .bind(encode(&property)?)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;
        Ok(property)
    }

    async fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let row = sqlx::query("SELECT doc FROM properties WHERE id = ?1")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    async fn delete(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let row = sqlx::query("DELETE FROM properties WHERE id = ?1 RETURNING doc")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        row.as_ref().map(decode).transpose()
    }

    /// Filters are applied to the decoded documents, newest first.
    async fn list(
        &self,
        filter: &PropertyFilter,
        limit: usize,
    ) -> Result<Vec<Property>, RepositoryError> {
        let rows = sqlx::query("SELECT doc FROM properties ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        let mut listed = Vec::new();
        for row in &rows {
            let property: Property = decode(row)?;
            if filter.matches(&property) {
                listed.push(property);
                if listed.len() == limit {
                    break;
                }
            }
        }
        Ok(listed)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) FROM properties")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        count_from(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::{ListingStatus, PropertyType};
    use chrono::{Duration, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 10, minute, 0)
            .single()
            .expect("valid time")
    }

    fn property(title: &str, city: &str, price: u64, created_at: DateTime<Utc>) -> Property {
        Property {
            id: PropertyId::generate(),
            title: title.to_string(),
            property_type: Some(PropertyType::Apartment),
            location: "Baner".to_string(),
            city: city.to_string(),
            price: Some(price),
            beds: Some(2),
            baths: Some(2),
            area: Some(1100),
            description: String::new(),
            amenities: Vec::new(),
            possession: None,
            builder_name: "Acme".to_string(),
            builder_phone: String::new(),
            builder_email: String::new(),
            builder_id: None,
            images: Vec::new(),
            image_file_ids: vec!["img-1".to_string()],
            video_url: None,
            floor_plan: None,
            floor_plan_file_id: None,
            status: ListingStatus::Active,
            created_at,
        }
    }

    #[tokio::test]
    async fn ping_fails_once_closed() {
        let store = SqliteStore::in_memory().await.expect("store");
        assert!(store.ping().await.is_ok());
        store.close().await;
        assert!(matches!(
            store.ping().await,
            Err(RepositoryError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn otp_lifecycle_round_trips_through_sqlite() {
        let store = SqliteStore::in_memory().await.expect("store opens");
        let first = OtpRecord::issue("b@acme.in", at(0));
        let second = OtpRecord::issue("b@acme.in", at(1));
        OtpRepository::insert(&store, first.clone()).await.expect("insert");
        OtpRepository::insert(&store, second.clone()).await.expect("insert");

        let latest = store
            .latest("b@acme.in", false)
            .await
            .expect("query")
            .expect("record");
        assert_eq!(latest, second);

        let mut verified = latest;
        verified.verified = true;
        OtpRepository::update(&store, verified.clone()).await.expect("update");
        assert_eq!(
            store.latest("b@acme.in", true).await.expect("query"),
            Some(verified)
        );

        let purged = store
            .purge_expired(at(0) + Duration::minutes(5) + Duration::seconds(30))
            .await
            .expect("purge");
        assert_eq!(purged, 1);
        assert_eq!(store.delete_for_email("b@acme.in").await.expect("delete"), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_conflict() {
        let store = SqliteStore::in_memory().await.expect("store opens");
        let lead = Lead {
            id: LeadId::generate(),
            name: "Ravi".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            message: None,
            property_id: None,
            property_title: None,
            status: LeadStatus::New,
            created_at: at(0),
            updated_at: at(0),
        };
        LeadRepository::insert(&store, lead.clone()).await.expect("insert");
        let err = LeadRepository::insert(&store, lead)
            .await
            .expect_err("duplicate id");
        assert!(matches!(err, RepositoryError::Conflict));
    }

    #[tokio::test]
    async fn properties_list_newest_first_with_filters() {
        let store = SqliteStore::in_memory().await.expect("store opens");
        let old = property("Old Pune", "Pune", 4_500_000, at(0));
        let new = property("New Pune", "Pune", 9_000_000, at(2));
        let mumbai = property("Sea View", "Mumbai", 30_000_000, at(1));
        for listing in [old.clone(), new.clone(), mumbai] {
            PropertyRepository::insert(&store, listing).await.expect("insert");
        }

        let filter = PropertyFilter {
            city: Some("pune".to_string()),
            ..PropertyFilter::default()
        };
        let listed = store.list(&filter, 10).await.expect("list");
        assert_eq!(listed, vec![new.clone(), old.clone()]);
        assert_eq!(store.list(&filter, 1).await.expect("list"), vec![new]);

        let removed = PropertyRepository::delete(&store, &old.id)
            .await
            .expect("delete");
        assert_eq!(removed, Some(old.clone()));
        assert_eq!(
            PropertyRepository::delete(&store, &old.id)
                .await
                .expect("delete"),
            None
        );
        assert_eq!(PropertyRepository::count(&store).await.expect("count"), 2);
    }
}

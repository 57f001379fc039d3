//! PostgreSQL implementation of EntitlementStore.
//!
//! One table per record set (trials, subscribers, identity_links), all
//! writes as transactional upserts so webhook replays and concurrent
//! checks cannot tear a record.
//!
//! A row that fails to map back into its aggregate is treated as absent
//! and logged; entitlement checks degrade to "new user" rather than
//! erroring on bad data.

use crate::domain::entitlement::{
    IdentityLink, Provenance, Subscriber, SubscriberStatus, Trial, TrialKind, TrialStatus,
};
use crate::domain::foundation::{EmailAddress, SubscriptionId, Timestamp, UserId};
use crate::ports::{EntitlementStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// PostgreSQL implementation of the EntitlementStore port.
///
/// Uses sqlx with connection pooling; the subscription-id lookup is a
/// plain indexed column rather than a separate table.
pub struct PostgresEntitlementStore {
    pool: PgPool,
}

impl PostgresEntitlementStore {
    /// Creates a new PostgresEntitlementStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a trial.
#[derive(Debug, sqlx::FromRow)]
struct TrialRow {
    user_id: String,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    kind: String,
    org_code: Option<String>,
    status: String,
    messages_sent: i64,
}

impl TryFrom<TrialRow> for Trial {
    type Error = StoreError;

    fn try_from(row: TrialRow) -> Result<Self, Self::Error> {
        Ok(Trial {
            user_id: UserId::new(row.user_id)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?,
            started_at: Timestamp::from_datetime(row.started_at),
            ends_at: Timestamp::from_datetime(row.ends_at),
            kind: parse_kind(&row.kind, row.org_code)?,
            status: parse_trial_status(&row.status)?,
            messages_sent: row.messages_sent.max(0) as u64,
        })
    }
}

/// Database row representation of a subscriber.
#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    email: String,
    status: String,
    subscription_id: Option<String>,
    plan_id: Option<String>,
    linked_user_id: Option<String>,
    provenance: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = StoreError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let subscription_id = row
            .subscription_id
            .map(SubscriptionId::new)
            .transpose()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        let linked_user_id = row
            .linked_user_id
            .map(UserId::new)
            .transpose()
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        Ok(Subscriber {
            email: EmailAddress::parse(&row.email)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?,
            status: parse_subscriber_status(&row.status)?,
            subscription_id,
            plan_id: row.plan_id,
            linked_user_id,
            provenance: parse_provenance(&row.provenance)?,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

/// Database row representation of an identity link.
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    user_id: String,
    email: String,
    linked_at: DateTime<Utc>,
}

impl TryFrom<LinkRow> for IdentityLink {
    type Error = StoreError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        Ok(IdentityLink {
            user_id: UserId::new(row.user_id)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?,
            email: EmailAddress::parse(&row.email)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?,
            linked_at: Timestamp::from_datetime(row.linked_at),
        })
    }
}

fn parse_kind(s: &str, org_code: Option<String>) -> Result<TrialKind, StoreError> {
    match s {
        "standard" => Ok(TrialKind::Standard),
        "organization" => match org_code {
            Some(code) => Ok(TrialKind::Organization { code }),
            None => Err(StoreError::SerializationFailed(
                "organization trial without org_code".to_string(),
            )),
        },
        _ => Err(StoreError::SerializationFailed(format!(
            "Invalid trial kind value: {}",
            s
        ))),
    }
}

fn kind_to_columns(kind: &TrialKind) -> (&'static str, Option<&str>) {
    match kind {
        TrialKind::Standard => ("standard", None),
        TrialKind::Organization { code } => ("organization", Some(code.as_str())),
    }
}

fn parse_trial_status(s: &str) -> Result<TrialStatus, StoreError> {
    match s {
        "active" => Ok(TrialStatus::Active),
        "expired" => Ok(TrialStatus::Expired),
        _ => Err(StoreError::SerializationFailed(format!(
            "Invalid trial status value: {}",
            s
        ))),
    }
}

fn trial_status_to_string(status: &TrialStatus) -> &'static str {
    match status {
        TrialStatus::Active => "active",
        TrialStatus::Expired => "expired",
    }
}

fn parse_subscriber_status(s: &str) -> Result<SubscriberStatus, StoreError> {
    match s {
        "active" => Ok(SubscriberStatus::Active),
        "cancelled" => Ok(SubscriberStatus::Cancelled),
        "suspended" => Ok(SubscriberStatus::Suspended),
        _ => Err(StoreError::SerializationFailed(format!(
            "Invalid subscriber status value: {}",
            s
        ))),
    }
}

fn subscriber_status_to_string(status: &SubscriberStatus) -> &'static str {
    match status {
        SubscriberStatus::Active => "active",
        SubscriberStatus::Cancelled => "cancelled",
        SubscriberStatus::Suspended => "suspended",
    }
}

fn parse_provenance(s: &str) -> Result<Provenance, StoreError> {
    match s {
        "webhook" => Ok(Provenance::Webhook),
        "manual" => Ok(Provenance::Manual),
        "migrated" => Ok(Provenance::Migrated),
        _ => Err(StoreError::SerializationFailed(format!(
            "Invalid provenance value: {}",
            s
        ))),
    }
}

fn provenance_to_string(provenance: &Provenance) -> &'static str {
    match provenance {
        Provenance::Webhook => "webhook",
        Provenance::Manual => "manual",
        Provenance::Migrated => "migrated",
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Maps a mapping failure to "absent", logging the bad row.
fn salvage<T>(result: Result<T, StoreError>, key: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Skipping unreadable stored record");
            None
        }
    }
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    async fn get_trial(&self, user_id: &UserId) -> Result<Option<Trial>, StoreError> {
        let row: Option<TrialRow> = sqlx::query_as(
            r#"
            SELECT user_id, started_at, ends_at, kind, org_code, status, messages_sent
            FROM trials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.and_then(|r| salvage(Trial::try_from(r), user_id.as_str())))
    }

    async fn put_trial(&self, trial: Trial) -> Result<(), StoreError> {
        let (kind, org_code) = kind_to_columns(&trial.kind);

        sqlx::query(
            r#"
            INSERT INTO trials (user_id, started_at, ends_at, kind, org_code, status, messages_sent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id) DO UPDATE SET
                ends_at = EXCLUDED.ends_at,
                kind = EXCLUDED.kind,
                org_code = EXCLUDED.org_code,
                status = EXCLUDED.status,
                messages_sent = EXCLUDED.messages_sent
            "#,
        )
        .bind(trial.user_id.as_str())
        .bind(trial.started_at.as_datetime())
        .bind(trial.ends_at.as_datetime())
        .bind(kind)
        .bind(org_code)
        .bind(trial_status_to_string(&trial.status))
        .bind(trial.messages_sent as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_trials(&self) -> Result<Vec<Trial>, StoreError> {
        let rows: Vec<TrialRow> = sqlx::query_as(
            r#"
            SELECT user_id, started_at, ends_at, kind, org_code, status, messages_sent
            FROM trials
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let key = r.user_id.clone();
                salvage(Trial::try_from(r), &key)
            })
            .collect())
    }

    async fn get_subscriber(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT email, status, subscription_id, plan_id, linked_user_id, provenance, updated_at
            FROM subscribers
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.and_then(|r| salvage(Subscriber::try_from(r), email.as_str())))
    }

    async fn put_subscriber(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscribers (
                email, status, subscription_id, plan_id, linked_user_id, provenance, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                status = EXCLUDED.status,
                subscription_id = EXCLUDED.subscription_id,
                plan_id = EXCLUDED.plan_id,
                linked_user_id = EXCLUDED.linked_user_id,
                provenance = EXCLUDED.provenance,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(subscriber.email.as_str())
        .bind(subscriber_status_to_string(&subscriber.status))
        .bind(subscriber.subscription_id.as_ref().map(|id| id.as_str()))
        .bind(&subscriber.plan_id)
        .bind(subscriber.linked_user_id.as_ref().map(|id| id.as_str()))
        .bind(provenance_to_string(&subscriber.provenance))
        .bind(subscriber.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows: Vec<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT email, status, subscription_id, plan_id, linked_user_id, provenance, updated_at
            FROM subscribers
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|r| {
                let key = r.email.clone();
                salvage(Subscriber::try_from(r), &key)
            })
            .collect())
    }

    async fn get_subscriber_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT email, status, subscription_id, plan_id, linked_user_id, provenance, updated_at
            FROM subscribers
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.and_then(|r| salvage(Subscriber::try_from(r), subscription_id.as_str())))
    }

    async fn find_subscriber_linked_to(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscriber>, StoreError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r#"
            SELECT email, status, subscription_id, plan_id, linked_user_id, provenance, updated_at
            FROM subscribers
            WHERE linked_user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.and_then(|r| salvage(Subscriber::try_from(r), user_id.as_str())))
    }

    async fn get_link(&self, user_id: &UserId) -> Result<Option<IdentityLink>, StoreError> {
        let row: Option<LinkRow> = sqlx::query_as(
            r#"
            SELECT user_id, email, linked_at
            FROM identity_links
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.and_then(|r| salvage(IdentityLink::try_from(r), user_id.as_str())))
    }

    async fn put_link(&self, link: IdentityLink) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO identity_links (user_id, email, linked_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                email = EXCLUDED.email,
                linked_at = EXCLUDED.linked_at
            "#,
        )
        .bind(link.user_id.as_str())
        .bind(link.email.as_str())
        .bind(link.linked_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}

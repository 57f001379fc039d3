//! File-based Entitlement Store Adapter
//!
//! Stores each record set as one JSON document on disk: `trials.json`,
//! `subscribers.json`, `links.json`. Suited to low-volume single-process
//! deployments.
//!
//! # Durability
//!
//! Every write serializes the whole record set to a temp file and then
//! atomically renames it over the original, so a crash mid-write never
//! leaves a torn document readable. A single write mutex serializes
//! writers; two near-simultaneous updates to the same record cannot lose
//! one of the writes.
//!
//! # Corruption handling
//!
//! A record that fails to deserialize reads as absent and is logged as a
//! data-integrity warning. Entitlement checks then degrade to the
//! "new user" path instead of crashing.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::entitlement::{IdentityLink, Subscriber, Trial};
use crate::domain::foundation::{EmailAddress, SubscriptionId, UserId};
use crate::ports::{EntitlementStore, StoreError};

const TRIALS_FILE: &str = "trials.json";
const SUBSCRIBERS_FILE: &str = "subscribers.json";
const LINKS_FILE: &str = "links.json";

/// Flat-file JSON store for entitlement state.
#[derive(Debug, Clone)]
pub struct FileEntitlementStore {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileEntitlementStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write if it does not exist.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Loads a record set, salvaging well-formed entries from a document
    /// with some corrupted records.
    async fn load_set<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<HashMap<String, T>, StoreError> {
        let path = self.file_path(name);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let values: HashMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(
                    file = name,
                    error = %e,
                    "Entitlement record set is unreadable; treating as empty"
                );
                return Ok(HashMap::new());
            }
        };

        let mut records = HashMap::with_capacity(values.len());
        for (key, value) in values {
            match serde_json::from_value(value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => {
                    tracing::warn!(
                        file = name,
                        key = %key,
                        error = %e,
                        "Skipping malformed entitlement record"
                    );
                }
            }
        }
        Ok(records)
    }

    /// Serializes a record set and atomically replaces the on-disk file.
    async fn store_set<T: Serialize>(
        &self,
        name: &str,
        records: &HashMap<String, T>,
    ) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let path = self.file_path(name);
        let tmp_path = self.file_path(&format!("{}.tmp", name));

        fs::write(&tmp_path, json)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    /// Read-modify-write of one record set under the write mutex.
    async fn update_set<T, F>(&self, name: &str, apply: F) -> Result<(), StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut HashMap<String, T>),
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_set::<T>(name).await?;
        apply(&mut records);
        self.store_set(name, &records).await
    }
}

#[async_trait]
impl EntitlementStore for FileEntitlementStore {
    async fn get_trial(&self, user_id: &UserId) -> Result<Option<Trial>, StoreError> {
        let mut trials = self.load_set::<Trial>(TRIALS_FILE).await?;
        Ok(trials.remove(user_id.as_str()))
    }

    async fn put_trial(&self, trial: Trial) -> Result<(), StoreError> {
        let key = trial.user_id.as_str().to_string();
        self.update_set(TRIALS_FILE, move |records| {
            records.insert(key, trial);
        })
        .await
    }

    async fn list_trials(&self) -> Result<Vec<Trial>, StoreError> {
        let trials = self.load_set::<Trial>(TRIALS_FILE).await?;
        Ok(trials.into_values().collect())
    }

    async fn get_subscriber(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Subscriber>, StoreError> {
        let mut subscribers = self.load_set::<Subscriber>(SUBSCRIBERS_FILE).await?;
        Ok(subscribers.remove(email.as_str()))
    }

    async fn put_subscriber(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        let key = subscriber.email.as_str().to_string();
        self.update_set(SUBSCRIBERS_FILE, move |records| {
            records.insert(key, subscriber);
        })
        .await
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let subscribers = self.load_set::<Subscriber>(SUBSCRIBERS_FILE).await?;
        Ok(subscribers.into_values().collect())
    }

    async fn get_subscriber_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscriber>, StoreError> {
        // Small scan; the record set is one document already in memory.
        let subscribers = self.load_set::<Subscriber>(SUBSCRIBERS_FILE).await?;
        Ok(subscribers
            .into_values()
            .find(|s| s.subscription_id.as_ref() == Some(subscription_id)))
    }

    async fn find_subscriber_linked_to(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscriber>, StoreError> {
        let subscribers = self.load_set::<Subscriber>(SUBSCRIBERS_FILE).await?;
        Ok(subscribers
            .into_values()
            .find(|s| s.linked_user_id.as_ref() == Some(user_id)))
    }

    async fn get_link(&self, user_id: &UserId) -> Result<Option<IdentityLink>, StoreError> {
        let mut links = self.load_set::<IdentityLink>(LINKS_FILE).await?;
        Ok(links.remove(user_id.as_str()))
    }

    async fn put_link(&self, link: IdentityLink) -> Result<(), StoreError> {
        let key = link.user_id.as_str().to_string();
        self.update_set(LINKS_FILE, move |records| {
            records.insert(key, link);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{SubscriberStatus, TrialKind};
    use tempfile::TempDir;

    fn user() -> UserId {
        UserId::new("tg-42").unwrap()
    }

    fn email() -> EmailAddress {
        EmailAddress::parse("a@b.com").unwrap()
    }

    #[tokio::test]
    async fn missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileEntitlementStore::new(dir.path());

        assert!(store.get_trial(&user()).await.unwrap().is_none());
        assert!(store.list_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn trial_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let trial = Trial::grant(user(), TrialKind::Standard, 14);

        {
            let store = FileEntitlementStore::new(dir.path());
            store.put_trial(trial.clone()).await.unwrap();
        }

        let reopened = FileEntitlementStore::new(dir.path());
        assert_eq!(reopened.get_trial(&user()).await.unwrap(), Some(trial));
    }

    #[tokio::test]
    async fn write_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = FileEntitlementStore::new(dir.path());

        store
            .put_subscriber(Subscriber::from_webhook(email(), None, None))
            .await
            .unwrap();

        assert!(dir.path().join(SUBSCRIBERS_FILE).exists());
        assert!(!dir.path().join("subscribers.json.tmp").exists());
    }

    #[tokio::test]
    async fn unreadable_document_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TRIALS_FILE), b"{ not json").unwrap();

        let store = FileEntitlementStore::new(dir.path());
        assert!(store.get_trial(&user()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_but_others_survive() {
        let dir = TempDir::new().unwrap();
        let store = FileEntitlementStore::new(dir.path());
        store
            .put_trial(Trial::grant(user(), TrialKind::Standard, 14))
            .await
            .unwrap();

        // Corrupt one record by hand; the good one must still load.
        let path = dir.path().join(TRIALS_FILE);
        let mut doc: HashMap<String, serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        doc.insert("tg-broken".to_string(), serde_json::json!({"nope": true}));
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        assert!(store.get_trial(&user()).await.unwrap().is_some());
        assert!(store
            .get_trial(&UserId::new("tg-broken").unwrap())
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.list_trials().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscription_lookup_scans_records() {
        let dir = TempDir::new().unwrap();
        let store = FileEntitlementStore::new(dir.path());
        let sub_id = SubscriptionId::new("SUB1").unwrap();

        store
            .put_subscriber(Subscriber::from_webhook(email(), Some(sub_id.clone()), None))
            .await
            .unwrap();

        let found = store
            .get_subscriber_by_subscription(&sub_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.email, email());
    }

    #[tokio::test]
    async fn placeholder_and_link_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileEntitlementStore::new(dir.path());

        store
            .put_subscriber(Subscriber::placeholder(email(), SubscriberStatus::Cancelled))
            .await
            .unwrap();
        store.put_link(IdentityLink::new(user(), email())).await.unwrap();

        let link = store.get_link(&user()).await.unwrap().unwrap();
        assert_eq!(link.email, email());
        let sub = store.get_subscriber(&email()).await.unwrap().unwrap();
        assert_eq!(sub.status, SubscriberStatus::Cancelled);
    }
}

//! In-memory record store standing in for the school backend.
//!
//! Calls are async and take a configurable latency so the console exercises the same
//! in-flight paths it would against a remote service. Nothing is persisted.
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::screens::{ScreenKind, text};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("no {collection} record with id {id:?}")]
    NotFound { collection: ScreenKind, id: String },

    #[error("{field} {value:?} is already registered")]
    Duplicate { field: &'static str, value: String },

    #[error("record must be a JSON object")]
    NotAnObject,
}

/// Snapshot of every collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    pub users: Vec<JsonValue>,
    pub enrollments: Vec<JsonValue>,
    pub payments: Vec<JsonValue>,
    pub sessions: Vec<JsonValue>,
}

impl Directory {
    pub fn records(&self, kind: ScreenKind) -> &[JsonValue] {
        match kind {
            ScreenKind::Users => &self.users,
            ScreenKind::Enrollments => &self.enrollments,
            ScreenKind::Payments => &self.payments,
            ScreenKind::Sessions => &self.sessions,
        }
    }

    fn records_mut(&mut self, kind: ScreenKind) -> &mut Vec<JsonValue> {
        match kind {
            ScreenKind::Users => &mut self.users,
            ScreenKind::Enrollments => &mut self.enrollments,
            ScreenKind::Payments => &mut self.payments,
            ScreenKind::Sessions => &mut self.sessions,
        }
    }

    pub fn find(&self, kind: ScreenKind, id: &str) -> Option<&JsonValue> {
        self.records(kind).iter().find(|r| text(r, "id") == id)
    }
}

#[derive(Debug, Default)]
struct Inner {
    dir: Directory,
    next_id: HashMap<ScreenKind, u64>,
}

impl Inner {
    /// Create (no `id`) or replace (known `id`) a record.
    fn save(&mut self, kind: ScreenKind, mut record: JsonValue) -> Result<JsonValue, StoreError> {
        let Some(map) = record.as_object_mut() else {
            return Err(StoreError::NotAnObject);
        };
        let id = map
            .get("id")
            .and_then(JsonValue::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        if let Some(field) = kind.unique_field() {
            let value = map
                .get(field)
                .and_then(JsonValue::as_str)
                .unwrap_or("")
                .trim()
                .to_lowercase();
            let taken = !value.is_empty()
                && self.dir.records(kind).iter().any(|r| {
                    text(r, field).to_lowercase() == value
                        && Some(text(r, "id")) != id.as_deref()
                });
            if taken {
                return Err(StoreError::Duplicate { field, value });
            }
        }

        let records = self.dir.records_mut(kind);
        match id {
            Some(id) => {
                let Some(slot) = records.iter_mut().find(|r| text(r, "id") == id) else {
                    return Err(StoreError::NotFound {
                        collection: kind,
                        id,
                    });
                };
                *slot = record.clone();
                debug!(%kind, %id, "record updated");
            }
            None => {
                let n = self.next_id.entry(kind).or_insert(0);
                *n += 1;
                let id = format!("{}-{}", kind.id_prefix(), n);
                map.insert("id".into(), JsonValue::String(id.clone()));
                records.push(record.clone());
                debug!(%kind, %id, "record created");
            }
        }
        Ok(record)
    }
}

pub struct Store {
    inner: RwLock<Inner>,
    latency: Duration,
}

impl Store {
    pub fn new(latency: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            latency,
        }
    }

    /// Store pre-filled with a small school.
    pub fn with_demo_data(latency: Duration) -> Self {
        let mut inner = Inner::default();
        for (kind, record) in demo_records() {
            if let Err(e) = inner.save(kind, record) {
                tracing::warn!(%kind, error = %e, "demo record rejected");
            }
        }
        info!(
            users = inner.dir.users.len(),
            enrollments = inner.dir.enrollments.len(),
            "demo data loaded"
        );
        Self {
            inner: RwLock::new(inner),
            latency,
        }
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn snapshot(&self) -> Directory {
        self.delay().await;
        self.inner.read().await.dir.clone()
    }

    pub async fn list(&self, kind: ScreenKind) -> Vec<JsonValue> {
        self.delay().await;
        self.inner.read().await.dir.records(kind).to_vec()
    }

    pub async fn get(&self, kind: ScreenKind, id: &str) -> Result<JsonValue, StoreError> {
        self.delay().await;
        self.inner
            .read()
            .await
            .dir
            .find(kind, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection: kind,
                id: id.to_string(),
            })
    }

    pub async fn save(&self, kind: ScreenKind, record: JsonValue) -> Result<JsonValue, StoreError> {
        self.delay().await;
        self.inner.write().await.save(kind, record)
    }
}

fn demo_records() -> Vec<(ScreenKind, JsonValue)> {
    use ScreenKind::*;
    vec![
        (Users, json!({"name": "Marta Ruiz", "email": "marta@school.org", "phone": "555-0101", "role": "teacher", "instruments": ["piano", "voice"], "active": true})),
        (Users, json!({"name": "Jonas Weber", "email": "jonas@school.org", "phone": "555-0102", "role": "teacher", "instruments": ["violin", "cello"], "active": true})),
        (Users, json!({"name": "Ana Costa", "email": "ana@mail.org", "phone": "", "role": "student", "birthDate": "1998-04-12", "guardian": "", "active": true})),
        (Users, json!({"name": "Leo Park", "email": "leo@mail.org", "phone": "555-0144", "role": "student", "birthDate": "2014-06-30", "guardian": "Min Park", "active": true})),
        (Users, json!({"name": "Office", "email": "office@school.org", "phone": "", "role": "admin", "active": true})),
        (Enrollments, json!({"student": "u-3", "category": "keys", "course": "piano-beginner", "price": 80, "discount": 0, "total": 80, "startDate": "2026-09-01", "status": "active", "notes": ""})),
        (Enrollments, json!({"student": "u-4", "category": "strings", "course": "violin-kids", "price": 70, "discount": 10, "total": 63, "startDate": "2026-09-15", "status": "pending", "notes": "Trial month"})),
        (Payments, json!({"enrollment": "e-1", "amount": 80, "method": "card", "reference": "TX-1042", "paidOn": "2026-09-03", "status": "paid"})),
        (Payments, json!({"enrollment": "e-2", "amount": 63, "method": "cash", "paidOn": "2026-09-16", "status": "pending"})),
        (Sessions, json!({"course": "piano-beginner", "teacher": "u-1", "date": "2026-09-08", "time": "17:00", "duration": 45, "room": "Room 2", "attendance": ["u-3"], "notes": ""})),
        (Sessions, json!({"course": "violin-kids", "teacher": "u-2", "date": "2026-11-05", "time": "16:30", "duration": 60, "room": "Hall", "attendance": [], "notes": ""})),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> Store {
        Store::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn create_assigns_prefixed_ids() {
        let store = store();
        let a = store.save(ScreenKind::Users, json!({"name": "Ana"})).await.unwrap();
        let b = store.save(ScreenKind::Payments, json!({"amount": 5})).await.unwrap();
        assert_eq!(a["id"], "u-1");
        assert_eq!(b["id"], "p-1");
        assert_eq!(store.list(ScreenKind::Users).await.len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let store = store();
        let created = store.save(ScreenKind::Users, json!({"name": "Ana"})).await.unwrap();
        let mut edited = created.clone();
        edited["name"] = json!("Ana Costa");
        store.save(ScreenKind::Users, edited).await.unwrap();
        let fetched = store.get(ScreenKind::Users, "u-1").await.unwrap();
        assert_eq!(fetched["name"], "Ana Costa");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = store();
        store
            .save(ScreenKind::Users, json!({"email": "ana@mail.org"}))
            .await
            .unwrap();
        let err = store
            .save(ScreenKind::Users, json!({"email": "ANA@mail.org"}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                field: "email",
                value: "ana@mail.org".into()
            }
        );
    }

    #[tokio::test]
    async fn saving_own_email_again_is_fine() {
        let store = store();
        let created = store
            .save(ScreenKind::Users, json!({"email": "ana@mail.org"}))
            .await
            .unwrap();
        assert!(store.save(ScreenKind::Users, created).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let store = store();
        let err = store
            .save(ScreenKind::Sessions, json!({"id": "s-9"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: ScreenKind::Sessions, .. }));
        assert!(store.save(ScreenKind::Sessions, json!([1])).await.is_err());
    }

    #[tokio::test]
    async fn demo_data_links_up() {
        let store = Store::with_demo_data(Duration::ZERO);
        let dir = store.snapshot().await;
        assert_eq!(dir.users.len(), 5);
        assert_eq!(dir.find(ScreenKind::Users, "u-3").map(|u| text(u, "name")), Some("Ana Costa"));
        assert_eq!(dir.records(ScreenKind::Sessions).len(), 2);
    }
}

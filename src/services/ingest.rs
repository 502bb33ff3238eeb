//! Bulk entry ingest for field-collection clients.
//!
//! A batch is validated as a whole before anything is written. Valid entries are then
//! merged one at a time, keyed by `(matchNumber, teamNumber)`: the stored record is
//! replaced only when the incoming `submittedAt` is strictly newer. Re-submitting a
//! batch therefore converges to the same stored state.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::store::{DocumentStore, Fields, StoreError};

pub const ENTRIES: &str = "entries";

pub const REQUIRED_FIELDS: [&str; 8] = [
    "scouterName",
    "matchNumber",
    "teamNumber",
    "alliance",
    "startPosition",
    "endgame",
    "defense",
    "submittedAt",
];

/// Categorical fields and their closed value sets
pub const ENUM_FIELDS: [(&str, &[&str]); 4] = [
    ("alliance", &["red", "blue"]),
    ("startPosition", &["left", "center", "right"]),
    ("endgame", &["none", "park", "shallow", "deep"]),
    ("defense", &["none", "light", "heavy"]),
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("entries must be an array")]
    NotAnArray,

    #[error("entries must not be empty")]
    EmptyBatch,

    #[error("entry {index} is not an object")]
    NotAnObject { index: usize },

    #[error("entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("entry {index} has an invalid '{field}': {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Offending field, for per-field error reporting
    pub fn field(&self) -> Option<&'static str> {
        match self {
            IngestError::MissingField { field, .. } | IngestError::InvalidField { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// One validated candidate
#[derive(Debug, Clone)]
pub struct ScoutingEntry {
    pub match_number: u64,
    pub team_number: u64,
    pub submitted_at: f64,
    pub fields: Fields,
}

impl ScoutingEntry {
    fn natural_key(&self) -> Fields {
        let mut key = Fields::new();
        key.insert("matchNumber".to_string(), json!(self.match_number));
        key.insert("teamNumber".to_string(), json!(self.team_number));
        key
    }

    /// Stored form: the submitted fields plus the server arrival time.
    fn body(&self) -> Fields {
        let mut body = self.fields.clone();
        body.remove("id");
        body.insert("receivedAt".to_string(), json!(Utc::now()));
        body
    }
}

pub fn validate_entry(index: usize, value: &Value) -> Result<ScoutingEntry, IngestError> {
    let Value::Object(fields) = value else {
        return Err(IngestError::NotAnObject { index });
    };

    for field in REQUIRED_FIELDS {
        if !fields.contains_key(field) {
            return Err(IngestError::MissingField { index, field });
        }
    }

    for (field, allowed) in ENUM_FIELDS {
        let valid = fields[field]
            .as_str()
            .map_or(false, |v| allowed.contains(&v));
        if !valid {
            return Err(IngestError::InvalidField {
                index,
                field,
                reason: format!("expected one of {}", allowed.join(", ")),
            });
        }
    }

    let match_number = non_negative_int(index, "matchNumber", &fields["matchNumber"])?;
    let team_number = non_negative_int(index, "teamNumber", &fields["teamNumber"])?;
    let submitted_at = fields["submittedAt"].as_f64().ok_or(IngestError::InvalidField {
        index,
        field: "submittedAt",
        reason: "expected a numeric timestamp".to_string(),
    })?;

    Ok(ScoutingEntry {
        match_number,
        team_number,
        submitted_at,
        fields: fields.clone(),
    })
}

fn non_negative_int(index: usize, field: &'static str, value: &Value) -> Result<u64, IngestError> {
    value.as_u64().ok_or_else(|| IngestError::InvalidField {
        index,
        field,
        reason: "expected a non-negative integer".to_string(),
    })
}

/// All-or-nothing: the first invalid candidate rejects the batch.
pub fn validate_batch(entries: &Value) -> Result<Vec<ScoutingEntry>, IngestError> {
    let Value::Array(items) = entries else {
        return Err(IngestError::NotAnArray);
    };
    if items.is_empty() {
        return Err(IngestError::EmptyBatch);
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_entry(index, item))
        .collect()
}

/// What a batch did to the store
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestOutcome {
    /// Ids inserted or updated, in input order
    pub touched: Vec<Uuid>,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl IngestOutcome {
    /// Valid batch where every entry was stale
    pub fn is_nothing_new(&self) -> bool {
        self.touched.is_empty()
    }
}

pub struct BulkIngestor {
    store: Arc<dyn DocumentStore>,
}

impl BulkIngestor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, entries: &Value) -> Result<IngestOutcome, IngestError> {
        let batch = validate_batch(entries)?;
        let mut outcome = IngestOutcome::default();

        for entry in batch {
            self.merge(entry, &mut outcome).await?;
        }

        info!(
            "Bulk ingest: {} inserted, {} updated, {} skipped",
            outcome.inserted, outcome.updated, outcome.skipped
        );
        Ok(outcome)
    }

    async fn merge(&self, entry: ScoutingEntry, outcome: &mut IngestOutcome) -> Result<(), IngestError> {
        let key = entry.natural_key();
        let existing = match self.store.find_one(ENTRIES, &key).await? {
            Some(doc) => doc,
            None => {
                if let Some(id) = self.store.insert_unique(ENTRIES, &key, entry.body()).await? {
                    outcome.inserted += 1;
                    outcome.touched.push(id);
                    return Ok(());
                }
                // another batch stored this key between the lookup and the insert
                match self.store.find_one(ENTRIES, &key).await? {
                    Some(doc) => doc,
                    None => {
                        outcome.skipped += 1;
                        return Ok(());
                    }
                }
            }
        };

        let stored_at = existing
            .body
            .get("submittedAt")
            .and_then(Value::as_f64)
            .unwrap_or(f64::NEG_INFINITY);

        if entry.submitted_at > stored_at {
            // a concurrent delete between lookup and replace drops the update
            if self.store.replace(ENTRIES, existing.id, entry.body()).await? {
                outcome.updated += 1;
                outcome.touched.push(existing.id);
            } else {
                outcome.skipped += 1;
            }
        } else {
            debug!(
                "Skipping stale entry for match {} team {}",
                entry.match_number, entry.team_number
            );
            outcome.skipped += 1;
        }
        Ok(())
    }
}

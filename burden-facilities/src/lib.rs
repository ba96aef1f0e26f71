//! Read-only reference table of emergency departments: average wait and LWBS rate per facility.

use std::collections::HashMap;

use burden_core::BurdenError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

const ALBERTA_SNAPSHOT_JSON: &str = include_str!("../data/alberta_waittimes.json");

/// One emergency department in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacilityRecord {
    pub key: String,
    pub name: String,
    pub city: String,
    pub wait_minutes: f64,
    /// Fraction of visits that left without being seen.
    pub lwbs_rate: f64,
}

impl FacilityRecord {
    /// LWBS rate relative to `baseline_rate`: 1.0 at the baseline, proportional around it.
    pub fn leave_signal_weight(&self, baseline_rate: f64) -> f64 {
        self.lwbs_rate / baseline_rate
    }
}

/// Public listing entry, numbered by position in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySummary {
    pub id: String,
    pub name: String,
    pub city: String,
    pub average_wait_minutes: f64,
    pub last_updated: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceNames {
    pub wait_times: String,
    pub lwbs: String,
}

/// Where the snapshot came from and when it was captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotProvenance {
    pub source: SourceNames,
    pub source_url: String,
    pub lwbs_url: String,
    #[serde(default)]
    pub lwbs_period: Option<String>,
    pub snapshot_taken_at: DateTime<FixedOffset>,
}

/// Serialized form of a reference snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FacilitySnapshot {
    #[serde(flatten)]
    pub provenance: SnapshotProvenance,
    pub hospitals: Vec<FacilityRecord>,
}

/// Outcome of a facility lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FacilityLookup<'a> {
    Found(&'a FacilityRecord),
    NotFound,
}

impl<'a> FacilityLookup<'a> {
    pub fn record(self) -> Option<&'a FacilityRecord> {
        match self {
            FacilityLookup::Found(record) => Some(record),
            FacilityLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FacilityLookup::Found(_))
    }
}

/// Immutable store built from one snapshot.
#[derive(Debug, Clone)]
pub struct FacilityStore {
    snapshot: FacilitySnapshot,
    index: HashMap<String, usize>,
}

impl FacilityStore {
    /// The bundled Alberta Health Services / HQCA snapshot.
    pub fn alberta() -> Result<Self, BurdenError> {
        Self::from_json_str(ALBERTA_SNAPSHOT_JSON)
    }

    pub fn from_json_str(json: &str) -> Result<Self, BurdenError> {
        let snapshot: FacilitySnapshot =
            serde_json::from_str(json).map_err(|err| BurdenError::Snapshot(err.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: FacilitySnapshot) -> Result<Self, BurdenError> {
        let mut index = HashMap::with_capacity(snapshot.hospitals.len());

        for (position, hospital) in snapshot.hospitals.iter().enumerate() {
            if !(hospital.wait_minutes.is_finite() && hospital.wait_minutes >= 0.0) {
                return Err(BurdenError::Snapshot(format!(
                    "{}: wait minutes must be non-negative, got {}",
                    hospital.key, hospital.wait_minutes
                )));
            }
            if !(0.0..=1.0).contains(&hospital.lwbs_rate) {
                return Err(BurdenError::Snapshot(format!(
                    "{}: LWBS rate must be within [0, 1], got {}",
                    hospital.key, hospital.lwbs_rate
                )));
            }
            if index.insert(hospital.key.clone(), position).is_some() {
                return Err(BurdenError::Snapshot(format!(
                    "duplicate facility key {}",
                    hospital.key
                )));
            }
        }

        Ok(Self { snapshot, index })
    }

    pub fn lookup(&self, key: &str) -> FacilityLookup<'_> {
        match self.index.get(key) {
            Some(&position) => FacilityLookup::Found(&self.snapshot.hospitals[position]),
            None => FacilityLookup::NotFound,
        }
    }

    pub fn hospital_wait_time(&self, key: &str) -> Option<&FacilityRecord> {
        self.lookup(key).record()
    }

    /// LWBS rate relative to `baseline_rate`; 1.0 for unknown facilities.
    pub fn leave_signal_weight(&self, key: &str, baseline_rate: f64) -> f64 {
        match self.lookup(key) {
            FacilityLookup::Found(record) => record.leave_signal_weight(baseline_rate),
            FacilityLookup::NotFound => 1.0,
        }
    }

    pub fn facilities(&self) -> Vec<FacilitySummary> {
        let last_updated = self.snapshot.provenance.snapshot_taken_at;
        self.snapshot
            .hospitals
            .iter()
            .enumerate()
            .map(|(position, hospital)| FacilitySummary {
                id: (position + 1).to_string(),
                name: hospital.name.clone(),
                city: hospital.city.clone(),
                average_wait_minutes: hospital.wait_minutes,
                last_updated,
            })
            .collect()
    }

    pub fn current_wait_times(&self) -> Vec<FacilitySummary> {
        self.facilities()
    }

    pub fn snapshot(&self) -> &FacilitySnapshot {
        &self.snapshot
    }

    pub fn provenance(&self) -> &SnapshotProvenance {
        &self.snapshot.provenance
    }

    pub fn len(&self) -> usize {
        self.snapshot.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.hospitals.is_empty()
    }
}

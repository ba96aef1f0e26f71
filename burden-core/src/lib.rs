//! Core types for ER burden estimation: visit input, curve output, configuration and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tunable parameters of the burden model and of the waiting room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BurdenConfig {
    /// Spacing of curve points, in minutes.
    pub tick_minutes: u32,
    /// Hard upper bound of the curve, in minutes.
    pub horizon_minutes: u32,
    /// How far past the current wait the curve projects.
    pub lookahead_minutes: u32,
    /// Expected wait assumed when the facility is not in the reference store.
    pub default_expected_wait_minutes: f64,
    /// LWBS rate that maps to a leave-signal weight of 1.
    pub baseline_lwbs_rate: f64,
    /// Points added per unit of leave-signal weight when a patient says they may leave.
    pub leave_bonus: f64,
    pub red_threshold: f64,
    pub amber_threshold: f64,
    /// Burden removed by a staff intervention.
    pub intervention_relief: f64,
    /// Acuity assumed for registered patients that have not been triaged yet.
    pub default_ctas_level: u8,
}

impl Default for BurdenConfig {
    fn default() -> Self {
        Self {
            tick_minutes: 5,
            horizon_minutes: 180,
            lookahead_minutes: 60,
            default_expected_wait_minutes: 180.0,
            baseline_lwbs_rate: 0.05,
            leave_bonus: 15.0,
            red_threshold: 75.0,
            amber_threshold: 50.0,
            intervention_relief: 15.0,
            default_ctas_level: 3,
        }
    }
}

impl BurdenConfig {
    /// Reject parameter combinations the model cannot run with.
    pub fn validate(&self) -> Result<(), BurdenError> {
        if self.tick_minutes == 0 {
            return Err(BurdenError::InvalidConfig(
                "tick_minutes must be at least 1".to_string(),
            ));
        }
        if self.horizon_minutes / self.tick_minutes >= MAX_CURVE_POINTS {
            return Err(BurdenError::InvalidConfig(format!(
                "horizon_minutes / tick_minutes must stay below {MAX_CURVE_POINTS}, got {} / {}",
                self.horizon_minutes, self.tick_minutes
            )));
        }
        for (name, value) in [
            ("leave_bonus", self.leave_bonus),
            ("red_threshold", self.red_threshold),
            ("amber_threshold", self.amber_threshold),
            ("intervention_relief", self.intervention_relief),
        ] {
            if !value.is_finite() {
                return Err(BurdenError::InvalidConfig(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        if !(self.default_expected_wait_minutes.is_finite()
            && self.default_expected_wait_minutes > 0.0)
        {
            return Err(BurdenError::InvalidConfig(format!(
                "default_expected_wait_minutes must be positive, got {}",
                self.default_expected_wait_minutes
            )));
        }
        if !(self.baseline_lwbs_rate.is_finite() && self.baseline_lwbs_rate > 0.0) {
            return Err(BurdenError::InvalidConfig(format!(
                "baseline_lwbs_rate must be positive, got {}",
                self.baseline_lwbs_rate
            )));
        }
        if self.amber_threshold > self.red_threshold {
            return Err(BurdenError::InvalidConfig(format!(
                "amber_threshold ({}) is above red_threshold ({})",
                self.amber_threshold, self.red_threshold
            )));
        }
        if !CTAS_LEVELS.contains(&self.default_ctas_level) {
            return Err(BurdenError::InvalidConfig(format!(
                "default_ctas_level must be within 1-5, got {}",
                self.default_ctas_level
            )));
        }
        Ok(())
    }
}

/// Upper bound on the number of points in one curve.
pub const MAX_CURVE_POINTS: u32 = 10_000;

/// Confidence reported with every result. Fixed, not estimated.
pub const CONFIDENCE_INTERVAL: f64 = 0.95;

/// Valid Canadian Triage and Acuity Scale levels.
pub const CTAS_LEVELS: std::ops::RangeInclusive<u8> = 1..=5;

/// Dashboard alert shown to ER staff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    #[serde(alias = "green")]
    Green,
    #[serde(alias = "amber")]
    Amber,
    #[serde(alias = "red")]
    Red,
}

impl AlertLevel {
    /// A stated intention to leave always escalates to red.
    pub fn classify(burden: f64, planning_to_leave: bool, config: &BurdenConfig) -> Self {
        if burden > config.red_threshold || planning_to_leave {
            AlertLevel::Red
        } else if burden > config.amber_threshold {
            AlertLevel::Amber
        } else {
            AlertLevel::Green
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "GREEN",
            AlertLevel::Amber => "AMBER",
            AlertLevel::Red => "RED",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer to a patient check-in prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    /// Only an explicit `false` counts as a signal to leave.
    #[serde(default)]
    pub intends_to_stay: Option<bool>,
}

/// Input of a single burden computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisitDescriptor {
    pub facility_id: String,
    pub wait_time_minutes: f64,
    /// CTAS level, 1 = resuscitation, 5 = non-urgent.
    pub estimated_ctas_level: u8,
    pub vulnerability_multiplier: f64,
    #[serde(default)]
    pub check_in_responses: Vec<CheckInResponse>,
}

impl VisitDescriptor {
    /// Checks the numeric fields before they reach the hazard formulas.
    pub fn validate(&self) -> Result<(), BurdenError> {
        if !CTAS_LEVELS.contains(&self.estimated_ctas_level) {
            return Err(BurdenError::CtasOutOfRange(self.estimated_ctas_level));
        }
        if !(self.vulnerability_multiplier.is_finite() && self.vulnerability_multiplier > 0.0) {
            return Err(BurdenError::InvalidMultiplier(self.vulnerability_multiplier));
        }
        if !(self.wait_time_minutes.is_finite() && self.wait_time_minutes >= 0.0) {
            return Err(BurdenError::InvalidWaitTime(self.wait_time_minutes));
        }
        Ok(())
    }

    pub fn planning_to_leave(&self) -> bool {
        self.check_in_responses
            .iter()
            .any(|response| response.intends_to_stay == Some(false))
    }
}

/// Risk estimates at one point of the waiting curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BurdenCurvePoint {
    pub time_minutes: f64,
    pub distress_probability: f64,
    pub lwbs_probability: f64,
    pub return_visit_risk: f64,
}

/// Curve point with the vulnerability multiplier divided out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BaselineCurvePoint {
    pub time_minutes: f64,
    pub distress_probability: f64,
    pub lwbs_probability: f64,
}

/// Output of a burden computation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BurdenResult {
    pub burden_curve: Vec<BurdenCurvePoint>,
    pub equity_gap_score: f64,
    /// Clamped to 100 before the leave bonus, unbounded after it.
    pub burden: f64,
    pub alert_status: AlertLevel,
    pub baseline_curve: Vec<BaselineCurvePoint>,
    pub confidence_interval: f64,
}

impl BurdenResult {
    pub fn final_point(&self) -> Option<&BurdenCurvePoint> {
        self.burden_curve.last()
    }
}

/// Accessibility and social factors captured at registration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityFlags {
    pub mobility: bool,
    pub language: bool,
    pub sensory: bool,
    pub cognitive: bool,
    pub chronic_pain: bool,
    pub alone: bool,
}

/// Periodic self-report from a waiting patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientCheckIn {
    /// 1 (none) to 5 (severe).
    pub discomfort: u8,
    pub needs_help: bool,
    pub planning_to_leave: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl PatientCheckIn {
    pub fn as_response(&self) -> CheckInResponse {
        CheckInResponse {
            intends_to_stay: Some(!self.planning_to_leave),
        }
    }
}

/// Patient registered in the waiting room, with their last computed burden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredPatient {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub wait_start: DateTime<Utc>,
    /// 0 (no added vulnerability) to 1.
    pub vulnerability_score: f64,
    #[serde(default)]
    pub flags: AccessibilityFlags,
    #[serde(default)]
    pub check_ins: Vec<PatientCheckIn>,
    pub assigned_hospital_key: String,
    #[serde(default)]
    pub estimated_ctas_level: Option<u8>,
    #[serde(default)]
    pub discomfort_level: Option<u8>,
    #[serde(default)]
    pub burden_index: Option<f64>,
    #[serde(default)]
    pub alert_level: Option<AlertLevel>,
}

impl RegisteredPatient {
    /// Maps the 0-1 vulnerability score onto the model's multiplier (1.0 to 2.2).
    pub fn vulnerability_multiplier(&self) -> f64 {
        1.0 + self.vulnerability_score * 1.2
    }

    pub fn planning_to_leave(&self) -> bool {
        self.check_ins.iter().any(|check_in| check_in.planning_to_leave)
    }

    /// Builds the visit descriptor for a burden computation at `now`.
    pub fn visit_at(&self, now: DateTime<Utc>, config: &BurdenConfig) -> VisitDescriptor {
        let waited = (now - self.wait_start).num_milliseconds().max(0) as f64 / 60_000.0;
        VisitDescriptor {
            facility_id: self.assigned_hospital_key.clone(),
            wait_time_minutes: waited,
            estimated_ctas_level: self
                .estimated_ctas_level
                .unwrap_or(config.default_ctas_level),
            vulnerability_multiplier: self.vulnerability_multiplier(),
            check_in_responses: self.check_ins.iter().map(PatientCheckIn::as_response).collect(),
        }
    }
}

/// Errors raised by the burden crates.
#[derive(Debug, thiserror::Error)]
pub enum BurdenError {
    #[error("CTAS level {0} is outside 1-5")]
    CtasOutOfRange(u8),
    #[error("Vulnerability multiplier must be a positive number, got {0}")]
    InvalidMultiplier(f64),
    #[error("Wait time must be a non-negative number of minutes, got {0}")]
    InvalidWaitTime(f64),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Could not read input: {0}")]
    Parse(String),
    #[error("Invalid facility snapshot: {0}")]
    Snapshot(String),
    #[error("No patient registered with id {0}")]
    UnknownPatient(String),
    #[error("Patient {0} is already registered")]
    DuplicatePatient(String),
}

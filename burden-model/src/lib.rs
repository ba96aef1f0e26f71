//! Burden curve estimation for patients waiting in an emergency department.
//!
//! [`compute_burden`] projects distress, LWBS and return-visit probabilities over the
//! wait in fixed ticks, then reduces the final point to a 0-100 burden score and a
//! staff alert level.

pub mod waiting_room;

use burden_core::{
    AlertLevel, BaselineCurvePoint, BurdenConfig, BurdenCurvePoint, BurdenError, BurdenResult,
    VisitDescriptor, CONFIDENCE_INTERVAL,
};
use burden_facilities::{FacilityLookup, FacilityStore};
use serde::Deserialize;
use serde_json::Value;

pub use waiting_room::WaitingRoom;

const MAX_WAITING_IMPACT: f64 = 60.0;
const MAX_PROBABILITY: f64 = 0.95;
const MAX_RETURN_VISIT_RISK: f64 = 0.8;
const MAX_BURDEN: f64 = 100.0;

const DISTRESS_WEIGHT: f64 = 30.0;
const LWBS_WEIGHT: f64 = 40.0;
const RETURN_VISIT_WEIGHT: f64 = 20.0;

/// Parse a visit descriptor from JSON and compute its burden.
pub fn compute_burden_str(
    visit_json: &str,
    store: &FacilityStore,
    config: &BurdenConfig,
) -> Result<BurdenResult, BurdenError> {
    let visit: VisitDescriptor =
        serde_json::from_str(visit_json).map_err(|err| BurdenError::Parse(err.to_string()))?;
    compute_burden(&visit, store, config)
}

/// Same as [`compute_burden_str`] for an already parsed `serde_json::Value`.
pub fn compute_burden_value(
    visit: &Value,
    store: &FacilityStore,
    config: &BurdenConfig,
) -> Result<BurdenResult, BurdenError> {
    let visit =
        VisitDescriptor::deserialize(visit).map_err(|err| BurdenError::Parse(err.to_string()))?;
    compute_burden(&visit, store, config)
}

/// Compute the burden curve, score and alert for one visit.
///
/// An unknown facility falls back to `config.default_expected_wait_minutes` and a
/// leave-signal weight of 1 instead of failing.
pub fn compute_burden(
    visit: &VisitDescriptor,
    store: &FacilityStore,
    config: &BurdenConfig,
) -> Result<BurdenResult, BurdenError> {
    config.validate()?;
    visit.validate()?;

    let (expected_wait, leave_signal_weight) = match store.lookup(&visit.facility_id) {
        FacilityLookup::Found(record) => (
            record.wait_minutes,
            record.leave_signal_weight(config.baseline_lwbs_rate),
        ),
        FacilityLookup::NotFound => {
            tracing::warn!(
                facility = %visit.facility_id,
                default_wait = config.default_expected_wait_minutes,
                "facility not in reference store, using default expectations"
            );
            (config.default_expected_wait_minutes, 1.0)
        }
    };

    let planning_to_leave = visit.planning_to_leave();
    let multiplier = visit.vulnerability_multiplier;

    let points: Vec<BurdenCurvePoint> = tick_times(visit.wait_time_minutes, config)
        .map(|t| {
            curve_point(
                t,
                expected_wait,
                visit.estimated_ctas_level,
                multiplier,
                leave_signal_weight,
            )
        })
        .collect();

    let mut burden = burden_score(points.last(), multiplier);
    if planning_to_leave {
        // No clamp after the bonus; the score may exceed 100 here.
        burden += config.leave_bonus * leave_signal_weight;
    }

    let equity_gap_score = equity_gap(points.last(), multiplier);
    let alert_status = AlertLevel::classify(burden, planning_to_leave, config);

    let baseline_curve = points
        .iter()
        .map(|point| BaselineCurvePoint {
            time_minutes: point.time_minutes,
            distress_probability: point.distress_probability / multiplier,
            lwbs_probability: point.lwbs_probability / multiplier,
        })
        .collect();

    tracing::debug!(
        facility = %visit.facility_id,
        points = points.len(),
        burden,
        alert = %alert_status,
        "computed burden curve"
    );

    Ok(BurdenResult {
        burden_curve: points,
        equity_gap_score,
        burden,
        alert_status,
        baseline_curve,
        confidence_interval: CONFIDENCE_INTERVAL,
    })
}

/// Tick times from 0 to `min(horizon, wait + lookahead)`, both ends inclusive.
fn tick_times(wait_minutes: f64, config: &BurdenConfig) -> impl Iterator<Item = f64> {
    let tick = f64::from(config.tick_minutes);
    let max_time = f64::from(config.horizon_minutes)
        .min(wait_minutes + f64::from(config.lookahead_minutes));
    let last_tick = (max_time / tick).floor() as u32;
    (0..=last_tick).map(move |index| f64::from(index) * tick)
}

fn curve_point(
    t: f64,
    expected_wait: f64,
    ctas_level: u8,
    multiplier: f64,
    leave_signal_weight: f64,
) -> BurdenCurvePoint {
    let waiting_impact = waiting_impact(t, expected_wait);
    let risk = baseline_hazard(t, ctas_level) * multiplier * (1.0 + waiting_impact / 100.0);
    let lwbs_risk = risk * leave_signal_weight;

    BurdenCurvePoint {
        time_minutes: t,
        distress_probability: distress_curve(t, risk).min(MAX_PROBABILITY),
        lwbs_probability: lwbs_curve(t, lwbs_risk).min(MAX_PROBABILITY),
        return_visit_risk: return_visit_curve(t, risk).min(MAX_RETURN_VISIT_RISK),
    }
}

fn waiting_impact(t: f64, expected_wait: f64) -> f64 {
    // A zero-minute facility wait means any elapsed time saturates the impact.
    if expected_wait <= 0.0 {
        return if t > 0.0 { MAX_WAITING_IMPACT } else { 0.0 };
    }
    (t / expected_wait * 50.0).min(MAX_WAITING_IMPACT)
}

/// Exponential hazard; CTAS 1 scales by 5, CTAS 5 by 1.
fn baseline_hazard(t: f64, ctas_level: u8) -> f64 {
    let urgency_factor = f64::from(6 - ctas_level);
    0.001 * (0.02 * t).exp() * urgency_factor
}

fn distress_curve(t: f64, risk: f64) -> f64 {
    1.0 - (-risk * t * 0.01).exp()
}

fn lwbs_curve(t: f64, risk: f64) -> f64 {
    1.0 - (-risk * t * 0.008).exp()
}

fn return_visit_curve(t: f64, risk: f64) -> f64 {
    (1.0 - (-risk * 0.5).exp()) * (t / 120.0)
}

fn burden_score(last: Option<&BurdenCurvePoint>, multiplier: f64) -> f64 {
    let Some(point) = last else {
        return 0.0;
    };
    let base = point.distress_probability * DISTRESS_WEIGHT
        + point.lwbs_probability * LWBS_WEIGHT
        + point.return_visit_risk * RETURN_VISIT_WEIGHT;
    (base * multiplier).min(MAX_BURDEN)
}

/// Share of the final LWBS probability attributable to vulnerability.
fn equity_gap(last: Option<&BurdenCurvePoint>, multiplier: f64) -> f64 {
    match last {
        Some(point) => point.lwbs_probability - point.lwbs_probability / multiplier,
        None => 0.0,
    }
}

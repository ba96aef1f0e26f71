//! Framework-neutral WASM <-> JavaScript bridge for the burden estimator.

use std::sync::OnceLock;

use burden_core::{BurdenConfig, BurdenError, VisitDescriptor};
use burden_facilities::FacilityStore;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

static STORE: OnceLock<Result<FacilityStore, String>> = OnceLock::new();

#[derive(Deserialize, Default)]
struct JsBurdenConfig {
    #[serde(default)]
    tick_minutes: Option<u32>,
    #[serde(default)]
    horizon_minutes: Option<u32>,
    #[serde(default)]
    lookahead_minutes: Option<u32>,
    #[serde(default)]
    red_threshold: Option<f64>,
    #[serde(default)]
    amber_threshold: Option<f64>,
    #[serde(default)]
    leave_bonus: Option<f64>,
}

impl From<JsBurdenConfig> for BurdenConfig {
    fn from(cfg: JsBurdenConfig) -> Self {
        let mut base = BurdenConfig::default();
        if let Some(tick) = cfg.tick_minutes {
            base.tick_minutes = tick;
        }
        if let Some(horizon) = cfg.horizon_minutes {
            base.horizon_minutes = horizon;
        }
        if let Some(lookahead) = cfg.lookahead_minutes {
            base.lookahead_minutes = lookahead;
        }
        if let Some(red) = cfg.red_threshold {
            base.red_threshold = red;
        }
        if let Some(amber) = cfg.amber_threshold {
            base.amber_threshold = amber;
        }
        if let Some(bonus) = cfg.leave_bonus {
            base.leave_bonus = bonus;
        }
        base
    }
}

fn store() -> Result<&'static FacilityStore, JsValue> {
    STORE
        .get_or_init(|| FacilityStore::alberta().map_err(|err| format_burden_error(&err)))
        .as_ref()
        .map_err(|message| JsValue::from_str(message))
}

#[wasm_bindgen]
pub fn compute_burden(visit: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let visit = from_value::<VisitDescriptor>(visit)
        .map_err(|err| JsValue::from_str(&format!("Could not read visit: {err}")))?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsBurdenConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            BurdenConfig::from(cfg)
        }
        None => BurdenConfig::default(),
    };

    let result = burden_model::compute_burden(&visit, store()?, &cfg)
        .map_err(|err| JsValue::from_str(&format_burden_error(&err)))?;

    to_value(&result)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize result: {err}")))
}

#[wasm_bindgen]
pub fn list_facilities() -> Result<JsValue, JsValue> {
    to_value(&store()?.facilities())
        .map_err(|err| JsValue::from_str(&format!("Could not serialize facilities: {err}")))
}

#[wasm_bindgen]
pub fn snapshot_provenance() -> Result<JsValue, JsValue> {
    to_value(store()?.provenance())
        .map_err(|err| JsValue::from_str(&format!("Could not serialize provenance: {err}")))
}

fn format_burden_error(err: &BurdenError) -> String {
    format!("Burden error: {err}")
}

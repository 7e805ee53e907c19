use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::error::{PredictError, Result};
use crate::model::{self, LapTimePredictor, Noise};
use crate::types::{Field, PredictionInput};

// ---------- Response types ----------

#[derive(Serialize, Debug)]
struct Out {
    predicted_lap_time: f64,
    confidence: f64,
    factors: Vec<String>,
    ts_ms: i64,
}

#[derive(Serialize, Debug)]
struct FeatureInfo {
    name: &'static str,
    min: f64,
    max: f64,
    default: f64,
    unit: &'static str,
    decimals: usize,
    weight: f64,
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Mutex<LapTimePredictor<Box<dyn Noise + Send>>>>,
    log_predictions: bool,
}

impl AppState {
    pub fn new<N>(predictor: LapTimePredictor<N>, log_predictions: bool) -> Self
    where
        N: Noise + Send + 'static,
    {
        Self {
            predictor: Arc::new(Mutex::new(predictor.boxed())),
            log_predictions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .route("/model-info", get(model_info))
        .with_state(state)
}

// ---------- Request parsing ----------

/// Pulls the seven fields out of a flat JSON object. Numbers and numeric
/// strings are accepted; extra keys are ignored.
pub fn parse_input(body: &Map<String, Value>) -> Result<PredictionInput> {
    let missing: Vec<&'static str> = Field::ALL
        .iter()
        .map(|f| f.name())
        .filter(|name| !body.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(PredictError::MissingFields(missing));
    }

    let mut input = PredictionInput::default();
    for field in Field::ALL {
        let value = match &body[field.name()] {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or(PredictError::NotNumeric { field: field.name() })?;
        input.set(field, value);
    }
    Ok(input)
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Largest 3 dp value below the confidence upper bound.
const MAX_CONFIDENCE_OUT: f64 = 0.949;

/// Rounded for the response, but never up to the excluded upper bound.
fn confidence_out(x: f64) -> f64 {
    round3(x).min(MAX_CONFIDENCE_OUT)
}

fn bad_request(message: String) -> (StatusCode, Json<Value>) {
    tracing::warn!("rejected request: {}", message);
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

// ---------- Handlers ----------

async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<Out>, (StatusCode, Json<Value>)> {
    let Json(payload) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;

    // A non-object body carries none of the keys.
    let empty = Map::new();
    let body = payload.as_object().unwrap_or(&empty);
    let input = parse_input(body).map_err(|e| bad_request(e.to_string()))?;

    let result = state
        .predictor
        .lock()
        .predict(&input)
        .map_err(|e| bad_request(e.to_string()))?;

    if state.log_predictions {
        let sample: Vec<String> = Field::ALL
            .iter()
            .map(|f| {
                let v = input.get(*f);
                format!("{}={} ({:.0}%)", f.name(), f.format(v), f.fill_percent(v))
            })
            .collect();
        tracing::info!(
            "predict in=[{}] lap_time={:.3} confidence={:.3} factors={:?}",
            sample.join(", "),
            result.lap_time,
            result.confidence,
            result.factors
        );
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default();
    Ok(Json(Out {
        predicted_lap_time: round3(result.lap_time),
        confidence: confidence_out(result.confidence),
        factors: result.factors,
        ts_ms: now_ms,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn model_info() -> Json<Value> {
    let features: Vec<FeatureInfo> = Field::ALL
        .into_iter()
        .map(|f| {
            let (min, max) = f.range();
            FeatureInfo {
                name: f.name(),
                min,
                max,
                default: f.default_value(),
                unit: f.unit(),
                decimals: f.decimals(),
                weight: model::weight(f),
            }
        })
        .collect();
    Json(json!({ "features": features }))
}

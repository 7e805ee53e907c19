//! Lap-time predictor for race-condition parameters.
//!
//! [`model::LapTimePredictor`] applies a fixed formula plus injectable noise
//! to a [`types::PredictionInput`]; [`server`] puts it behind a small JSON API.

pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod types;

pub use error::PredictError;
pub use model::{FixedNoise, LapTimePredictor, Noise, RngNoise};
pub use types::{Field, PredictionInput, PredictionResult};

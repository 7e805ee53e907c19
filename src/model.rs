use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{PredictError, Result};
use crate::types::{Field, PredictionInput, PredictionResult};

pub const MIN_LAP_TIME: f64 = 92.5;
pub const MAX_LAP_TIME: f64 = 97.5;
pub const JITTER_SPAN: f64 = 0.15;
pub const MIN_CONFIDENCE: f64 = 0.85;
pub const MAX_CONFIDENCE: f64 = 0.95;

pub const RAIN_NOTE: &str = "High rain probability increasing lap time";
pub const TEAM_NOTE: &str = "Strong team performance advantage";
pub const HEAT_NOTE: &str = "High temperature affecting tire performance";
pub const PACE_NOTE: &str = "Excellent clean air pace";

/// Source of the two random terms in a prediction.
pub trait Noise {
    /// Added to the lap time before clamping; expected in [-0.15, 0.15).
    fn jitter(&mut self) -> f64;
    /// Expected in [0.85, 0.95).
    fn confidence(&mut self) -> f64;
}

impl<N: Noise + ?Sized> Noise for Box<N> {
    fn jitter(&mut self) -> f64 {
        (**self).jitter()
    }

    fn confidence(&mut self) -> f64 {
        (**self).confidence()
    }
}

/// Draws both terms uniformly from an rng.
pub struct RngNoise<R> {
    rng: R,
}

impl<R: Rng> RngNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Noise for RngNoise<R> {
    fn jitter(&mut self) -> f64 {
        self.rng.random_range(-JITTER_SPAN..JITTER_SPAN)
    }

    fn confidence(&mut self) -> f64 {
        self.rng.random_range(MIN_CONFIDENCE..MAX_CONFIDENCE)
    }
}

/// Constant noise, for deterministic callers.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise {
    pub jitter: f64,
    pub confidence: f64,
}

impl Noise for FixedNoise {
    fn jitter(&mut self) -> f64 {
        self.jitter
    }

    fn confidence(&mut self) -> f64 {
        self.confidence
    }
}

pub struct LapTimePredictor<N = RngNoise<StdRng>> {
    noise: N,
}

impl LapTimePredictor {
    pub fn seeded(seed: u64) -> Self {
        Self::new(RngNoise::new(StdRng::seed_from_u64(seed)))
    }

    pub fn from_entropy() -> Self {
        Self::new(RngNoise::new(StdRng::from_os_rng()))
    }
}

impl<N: Noise> LapTimePredictor<N> {
    pub fn new(noise: N) -> Self {
        Self { noise }
    }

    /// Erases the noise type so differently-seeded predictors share one type.
    pub fn boxed(self) -> LapTimePredictor<Box<dyn Noise + Send>>
    where
        N: Send + 'static,
    {
        let noise: Box<dyn Noise + Send> = Box::new(self.noise);
        LapTimePredictor::new(noise)
    }

    /// Validates `input`, then applies the formula plus noise.
    pub fn predict(&mut self, input: &PredictionInput) -> Result<PredictionResult> {
        validate(input)?;

        let raw = baseline_lap_time(input) + self.noise.jitter();
        let lap_time = raw.clamp(MIN_LAP_TIME, MAX_LAP_TIME);
        let confidence = self.noise.confidence();
        let factors = influencing_factors(input);

        tracing::debug!(raw, lap_time, confidence, n_factors = factors.len(), "predicted");

        Ok(PredictionResult {
            lap_time,
            confidence,
            factors,
        })
    }
}

/// Rejects non-finite or out-of-range fields.
pub fn validate(input: &PredictionInput) -> Result<()> {
    for field in Field::ALL {
        let value = input.get(field);
        if !value.is_finite() {
            return Err(PredictError::InvalidInput {
                field: field.name(),
                reason: "must be a finite number".to_string(),
            });
        }
        if !field.contains(value) {
            let (min, max) = field.range();
            return Err(PredictError::InvalidInput {
                field: field.name(),
                reason: format!("{} outside {}..={}", value, min, max),
            });
        }
    }
    Ok(())
}

/// The deterministic part of the formula: no jitter, no clamp.
pub fn baseline_lap_time(input: &PredictionInput) -> f64 {
    let mut t = input.qualifying_time * 1.35;
    t += (input.rain_probability / 100.0) * 2.5;
    t += (input.temperature - 25.0) * 0.02;
    t -= (input.team_performance - 0.5) * 1.5;
    t += (input.clean_air_pace - 94.0) * 0.3;
    t += input.position_change * 0.1;
    t += (input.sector_time - 95.0) * 0.2;
    t
}

/// Seconds of lap time per unit of each field.
pub fn weight(field: Field) -> f64 {
    match field {
        Field::QualifyingTime => 1.35,
        Field::RainProbability => 0.025,
        Field::Temperature => 0.02,
        Field::TeamPerformance => -1.5,
        Field::CleanAirPace => 0.3,
        Field::PositionChange => 0.1,
        Field::SectorTime => 0.2,
    }
}

pub fn influencing_factors(input: &PredictionInput) -> Vec<String> {
    let checks = [
        (input.rain_probability > 30.0, RAIN_NOTE),
        (input.team_performance > 0.8, TEAM_NOTE),
        (input.temperature > 30.0, HEAT_NOTE),
        (input.clean_air_pace < 92.0, PACE_NOTE),
    ];
    checks
        .into_iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, note)| note.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(jitter: f64) -> LapTimePredictor<FixedNoise> {
        LapTimePredictor::new(FixedNoise {
            jitter,
            confidence: 0.9,
        })
    }

    #[test]
    fn test_defaults_without_jitter() {
        let r = fixed(0.0).predict(&PredictionInput::default()).unwrap();
        assert!((r.lap_time - 95.375).abs() < 1e-9, "got {}", r.lap_time);
        assert_eq!(r.confidence, 0.9);
        assert!(r.factors.is_empty());
    }

    #[test]
    fn test_jitter_is_added_before_clamp() {
        let r = fixed(0.1).predict(&PredictionInput::default()).unwrap();
        assert!((r.lap_time - 95.475).abs() < 1e-9);
    }

    #[test]
    fn test_output_clamped_both_ends() {
        let slow = PredictionInput {
            qualifying_time: 73.0,
            rain_probability: 100.0,
            temperature: 40.0,
            team_performance: 0.0,
            clean_air_pace: 100.0,
            position_change: 3.0,
            sector_time: 100.0,
        };
        assert_eq!(fixed(0.0).predict(&slow).unwrap().lap_time, MAX_LAP_TIME);

        let fast = PredictionInput {
            qualifying_time: 69.0,
            rain_probability: 0.0,
            temperature: 15.0,
            team_performance: 1.0,
            clean_air_pace: 90.0,
            position_change: -3.0,
            sector_time: 90.0,
        };
        assert_eq!(fixed(0.0).predict(&fast).unwrap().lap_time, MIN_LAP_TIME);
    }

    #[test]
    fn test_rain_shift_is_linear() {
        let dry = PredictionInput::default().with(Field::RainProbability, 0.0);
        let base = baseline_lap_time(&dry);
        for rain in [10.0, 25.0, 50.0, 75.0, 100.0] {
            let wet = dry.with(Field::RainProbability, rain);
            let delta = baseline_lap_time(&wet) - base;
            assert!((delta - 2.5 * rain / 100.0).abs() < 1e-9, "rain {}: {}", rain, delta);
        }
    }

    #[test]
    fn test_factor_thresholds_are_strict() {
        let d = PredictionInput::default();
        assert!(influencing_factors(&d.with(Field::RainProbability, 31.0))
            .contains(&RAIN_NOTE.to_string()));
        assert!(influencing_factors(&d.with(Field::RainProbability, 30.0)).is_empty());
        assert_eq!(influencing_factors(&d.with(Field::TeamPerformance, 0.81)), vec![TEAM_NOTE]);
        assert!(influencing_factors(&d.with(Field::TeamPerformance, 0.80)).is_empty());
        assert!(influencing_factors(&d.with(Field::Temperature, 30.0)).is_empty());
        assert_eq!(influencing_factors(&d.with(Field::Temperature, 31.0)), vec![HEAT_NOTE]);
        assert!(influencing_factors(&d.with(Field::CleanAirPace, 92.0)).is_empty());
        assert_eq!(influencing_factors(&d.with(Field::CleanAirPace, 91.9)), vec![PACE_NOTE]);
    }

    #[test]
    fn test_all_factors_in_fixed_order() {
        let input = PredictionInput {
            rain_probability: 80.0,
            team_performance: 0.95,
            temperature: 35.0,
            clean_air_pace: 91.0,
            ..PredictionInput::default()
        };
        assert_eq!(
            influencing_factors(&input),
            vec![RAIN_NOTE, TEAM_NOTE, HEAT_NOTE, PACE_NOTE]
        );
    }

    #[test]
    fn test_rejects_out_of_range_and_nan() {
        let mut p = fixed(0.0);
        let err = p
            .predict(&PredictionInput::default().with(Field::Temperature, 41.0))
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput { field: "temperature", .. }));

        let err = p
            .predict(&PredictionInput::default().with(Field::SectorTime, f64::NAN))
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidInput { field: "sector_time", .. }));

        // range ends are inclusive
        assert!(p
            .predict(&PredictionInput::default().with(Field::PositionChange, -3.0))
            .is_ok());
    }

    #[test]
    fn test_seeded_predictor_stays_in_bounds() {
        let mut p = LapTimePredictor::seeded(37);
        for i in 0..500 {
            let input = PredictionInput::default()
                .with(Field::RainProbability, (i % 101) as f64)
                .with(Field::TeamPerformance, (i % 11) as f64 / 10.0);
            let r = p.predict(&input).unwrap();
            assert!((MIN_LAP_TIME..=MAX_LAP_TIME).contains(&r.lap_time));
            assert!(r.confidence >= MIN_CONFIDENCE && r.confidence < MAX_CONFIDENCE);
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let input = PredictionInput::default();
        let a = LapTimePredictor::seeded(7).predict(&input).unwrap();
        let b = LapTimePredictor::seeded(7).predict(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_jitter_envelope() {
        let mut noise = RngNoise::new(StdRng::seed_from_u64(1));
        for _ in 0..1000 {
            let j = noise.jitter();
            assert!((-JITTER_SPAN..JITTER_SPAN).contains(&j));
        }
    }

    #[test]
    fn test_weights_match_formula() {
        let d = PredictionInput::default();
        let base = baseline_lap_time(&d);
        for f in Field::ALL {
            let bumped = d.with(f, d.get(f) + 0.5);
            let slope = (baseline_lap_time(&bumped) - base) / 0.5;
            assert!((slope - weight(f)).abs() < 1e-9, "{}: {}", f.name(), slope);
        }
    }
}

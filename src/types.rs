use serde::{Deserialize, Serialize};

/// One of the seven race-condition parameters fed to the predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    QualifyingTime,
    RainProbability,
    Temperature,
    TeamPerformance,
    CleanAirPace,
    PositionChange,
    SectorTime,
}

impl Field {
    /// Canonical feature order.
    pub const ALL: [Field; 7] = [
        Field::QualifyingTime,
        Field::RainProbability,
        Field::Temperature,
        Field::TeamPerformance,
        Field::CleanAirPace,
        Field::PositionChange,
        Field::SectorTime,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::QualifyingTime => "qualifying_time",
            Field::RainProbability => "rain_probability",
            Field::Temperature => "temperature",
            Field::TeamPerformance => "team_performance",
            Field::CleanAirPace => "clean_air_pace",
            Field::PositionChange => "position_change",
            Field::SectorTime => "sector_time",
        }
    }

    /// Inclusive (min, max).
    pub fn range(self) -> (f64, f64) {
        match self {
            Field::QualifyingTime => (69.0, 73.0),
            Field::RainProbability => (0.0, 100.0),
            Field::Temperature => (15.0, 40.0),
            Field::TeamPerformance => (0.0, 1.0),
            Field::CleanAirPace => (90.0, 100.0),
            Field::PositionChange => (-3.0, 3.0),
            Field::SectorTime => (90.0, 100.0),
        }
    }

    pub fn default_value(self) -> f64 {
        match self {
            Field::QualifyingTime => 70.5,
            Field::RainProbability => 20.0,
            Field::Temperature => 25.0,
            Field::TeamPerformance => 0.70,
            Field::CleanAirPace => 94.0,
            Field::PositionChange => 0.0,
            Field::SectorTime => 95.0,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::QualifyingTime | Field::CleanAirPace | Field::SectorTime => "s",
            Field::RainProbability => "%",
            Field::Temperature => "°C",
            Field::TeamPerformance | Field::PositionChange => "",
        }
    }

    /// Decimal places used when a value of this field is displayed.
    pub fn decimals(self) -> usize {
        match self {
            Field::RainProbability | Field::Temperature => 0,
            Field::TeamPerformance => 2,
            _ => 1,
        }
    }

    /// Render a value the way the slider readout shows it, e.g. `70.5s`.
    pub fn format(self, value: f64) -> String {
        format!("{:.*}{}", self.decimals(), value, self.unit())
    }

    /// Where `value` sits inside the field's range, as 0..=100.
    pub fn fill_percent(self, value: f64) -> f64 {
        let (min, max) = self.range();
        ((value - min) / (max - min) * 100.0).clamp(0.0, 100.0)
    }

    pub fn contains(self, value: f64) -> bool {
        let (min, max) = self.range();
        value >= min && value <= max
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub qualifying_time: f64,  // s
    pub rain_probability: f64, // percent, 0-100
    pub temperature: f64,      // °C
    pub team_performance: f64, // normalised team score
    pub clean_air_pace: f64,   // s
    pub position_change: f64,  // average places gained/lost
    pub sector_time: f64,      // s, summed sectors
}

impl PredictionInput {
    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::QualifyingTime => self.qualifying_time,
            Field::RainProbability => self.rain_probability,
            Field::Temperature => self.temperature,
            Field::TeamPerformance => self.team_performance,
            Field::CleanAirPace => self.clean_air_pace,
            Field::PositionChange => self.position_change,
            Field::SectorTime => self.sector_time,
        }
    }

    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::QualifyingTime => &mut self.qualifying_time,
            Field::RainProbability => &mut self.rain_probability,
            Field::Temperature => &mut self.temperature,
            Field::TeamPerformance => &mut self.team_performance,
            Field::CleanAirPace => &mut self.clean_air_pace,
            Field::PositionChange => &mut self.position_change,
            Field::SectorTime => &mut self.sector_time,
        };
        *slot = value;
    }

    /// Builder-style `set`.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, value);
        self
    }
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            qualifying_time: Field::QualifyingTime.default_value(),
            rain_probability: Field::RainProbability.default_value(),
            temperature: Field::Temperature.default_value(),
            team_performance: Field::TeamPerformance.default_value(),
            clean_air_pace: Field::CleanAirPace.default_value(),
            position_change: Field::PositionChange.default_value(),
            sector_time: Field::SectorTime.default_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted lap time in seconds, always inside [92.5, 97.5].
    pub lap_time: f64,
    /// In [0.85, 0.95).
    pub confidence: f64,
    pub factors: Vec<String>,
}

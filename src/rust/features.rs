use std::fmt;
use std::ops::RangeInclusive;

use ndarray::Array1;

use crate::classifier::PipelineError;

/// One of the seven soil and climate readings, in the column order the
/// scaler and classifier were fitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Nitrogen,
    Phosphorous,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    pub const COUNT: usize = 7;

    /// Canonical training order.
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorous,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Column name used at training time
    pub fn name(self) -> &'static str {
        match self {
            Self::Nitrogen => "N",
            Self::Phosphorous => "P",
            Self::Potassium => "K",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Ph => "ph",
            Self::Rainfall => "rainfall",
        }
    }

    /// Looks a feature up by its column name. Matching ignores ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.name().eq_ignore_ascii_case(name))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Range accepted by the input form
    pub fn range(self) -> RangeInclusive<f64> {
        match self {
            Self::Nitrogen | Self::Phosphorous | Self::Potassium | Self::Humidity => 0.0..=100.0,
            Self::Temperature => -10.0..=50.0,
            Self::Ph => 0.0..=14.0,
            Self::Rainfall => 0.0..=500.0,
        }
    }

    /// Value the input form starts with
    pub fn default_value(self) -> f64 {
        match self {
            Self::Nitrogen | Self::Phosphorous | Self::Potassium => 50.0,
            Self::Temperature => 25.0,
            Self::Humidity => 80.0,
            Self::Ph => 6.5,
            Self::Rainfall => 100.0,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Rainfall => "mm",
            _ => "",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw readings for a single recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub n: f64,
    pub p: f64,
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        let mut vector = Self::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        for feature in Feature::ALL {
            vector.set(feature, feature.default_value());
        }
        vector
    }
}

impl FeatureVector {
    pub fn new(n: f64, p: f64, k: f64, temperature: f64, humidity: f64, ph: f64, rainfall: f64) -> Self {
        Self { n, p, k, temperature, humidity, ph, rainfall }
    }

    /// Builds a vector from exactly seven values in training order.
    pub fn from_slice(values: &[f64]) -> Result<Self, PipelineError> {
        match values {
            &[n, p, k, temperature, humidity, ph, rainfall] => {
                Ok(Self::new(n, p, k, temperature, humidity, ph, rainfall))
            }
            _ => Err(PipelineError::ShapeMismatch(format!(
                "expected {} readings, got {}",
                Feature::COUNT,
                values.len()
            ))),
        }
    }

    /// Builds a vector from named readings.
    ///
    /// Every feature must be given exactly once. A missing field is an error,
    /// never replaced by a default.
    ///
    /// # Example
    /// ```
    /// use crop_advisor::FeatureVector;
    ///
    /// let readings = FeatureVector::from_pairs([
    ///     ("N", 90.0), ("P", 42.0), ("K", 43.0),
    ///     ("temperature", 20.9), ("humidity", 82.0),
    ///     ("ph", 6.5), ("rainfall", 202.9),
    /// ]).unwrap();
    /// assert_eq!(readings.k, 43.0);
    ///
    /// assert!(FeatureVector::from_pairs([("N", 90.0)]).is_err());
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut slots: [Option<f64>; Feature::COUNT] = [None; Feature::COUNT];
        for (name, value) in pairs {
            let name = name.as_ref();
            let feature = Feature::from_name(name)
                .ok_or_else(|| PipelineError::ShapeMismatch(format!("unknown feature '{}'", name)))?;
            if slots[feature.index()].replace(value).is_some() {
                return Err(PipelineError::ShapeMismatch(format!("feature '{}' given more than once", feature)));
            }
        }

        let missing: Vec<&str> = Feature::ALL
            .iter()
            .filter(|feature| slots[feature.index()].is_none())
            .map(|feature| feature.name())
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::ShapeMismatch(format!("missing features: {}", missing.join(", "))));
        }

        let values: Vec<f64> = slots.iter().flatten().copied().collect();
        Self::from_slice(&values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Nitrogen => self.n,
            Feature::Phosphorous => self.p,
            Feature::Potassium => self.k,
            Feature::Temperature => self.temperature,
            Feature::Humidity => self.humidity,
            Feature::Ph => self.ph,
            Feature::Rainfall => self.rainfall,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        let slot = match feature {
            Feature::Nitrogen => &mut self.n,
            Feature::Phosphorous => &mut self.p,
            Feature::Potassium => &mut self.k,
            Feature::Temperature => &mut self.temperature,
            Feature::Humidity => &mut self.humidity,
            Feature::Ph => &mut self.ph,
            Feature::Rainfall => &mut self.rainfall,
        };
        *slot = value;
    }

    pub fn values(&self) -> [f64; Feature::COUNT] {
        Feature::ALL.map(|feature| self.get(feature))
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.values().to_vec())
    }

    /// Features whose value lies outside the form range. NaN counts as out of range.
    pub fn out_of_range(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|&feature| !feature.range().contains(&self.get(feature)))
            .collect()
    }

    /// Returns a copy with every reading clamped to its form range.
    /// NaN is left as is.
    pub fn clamped(&self) -> Self {
        let mut clamped = *self;
        for feature in Feature::ALL {
            let range = feature.range();
            clamped.set(feature, self.get(feature).clamp(*range.start(), *range.end()));
        }
        clamped
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Feature::ALL
            .iter()
            .map(|&feature| format!("{}: {}{}", feature, self.get(feature), feature.unit()))
            .collect();
        f.write_str(&parts.join(" | "))
    }
}

// src/geopoint.rs

use crate::error::AggregateError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A geographical point captured by a form, with optional altitude and accuracy.
///
/// No range checking is done here: whatever the device reported is kept.
/// Equality is component-wise on the bit pattern of each double, so two
/// absent components compare equal and `NaN` equals itself.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    accuracy: Option<f64>,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude only.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
        }
    }

    /// Creates a point with every component supplied individually.
    pub fn with_components(
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        accuracy: Option<f64>,
    ) -> Self {
        GeoPoint {
            latitude,
            longitude,
            altitude,
            accuracy,
        }
    }

    /// Parses the `"lat lon [alt [acc]]"` form a device submits.
    ///
    /// Tokens are separated by runs of whitespace. Exactly two, three or four
    /// tokens are accepted and every one must be a finite decimal number.
    pub fn parse(text: &str) -> Result<Self, AggregateError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if !(2..=4).contains(&tokens.len()) {
            return Err(AggregateError::Decode(format!(
                "GPS coordinates need 2 to 4 components, got {} in {:?}",
                tokens.len(),
                text
            )));
        }

        let mut components = Vec::with_capacity(tokens.len());
        for token in &tokens {
            components.push(parse_component(token, text)?);
        }

        Ok(GeoPoint {
            latitude: components[0],
            longitude: components[1],
            altitude: components.get(2).copied(),
            accuracy: components.get(3).copied(),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// The present components in submission order: latitude, longitude,
    /// then altitude and accuracy when each exists on its own.
    pub fn components(&self) -> Vec<f64> {
        let mut out = vec![self.latitude, self.longitude];
        out.extend(self.altitude);
        out.extend(self.accuracy);
        out
    }

    /// KML axis order: `lon,lat[,alt]`.
    pub fn kml_coordinates(&self) -> String {
        match self.altitude {
            Some(alt) => format!(
                "{},{},{}",
                format_decimal(self.longitude),
                format_decimal(self.latitude),
                format_decimal(alt)
            ),
            None => format!(
                "{},{}",
                format_decimal(self.longitude),
                format_decimal(self.latitude)
            ),
        }
    }
}

fn parse_component(token: &str, text: &str) -> Result<f64, AggregateError> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AggregateError::Decode(format!(
            "GPS coordinate component {:?} is not a decimal number in {:?}",
            token, text
        ))),
    }
}

/// Renders a double the way exported coordinates have always been shown.
///
/// Magnitudes in `[1e-3, 1e7)` and zero use plain notation with at least one
/// fractional digit (`0.0`, `1200.5`). Everything else uses scientific notation
/// with a fractional mantissa and an upper-case `E` (`1.0E-7`, `1.2345678E7`).
/// Digits are always the shortest that round-trip.
pub fn format_decimal(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) || !value.is_finite() {
        let plain = format!("{}", value);
        return if plain.contains('.') || !value.is_finite() {
            plain
        } else {
            format!("{}.0", plain)
        };
    }
    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{}E{}", mantissa, exponent),
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => scientific,
    }
}

fn same_bits(a: Option<f64>, b: Option<f64>) -> bool {
    a.map(f64::to_bits) == b.map(f64::to_bits)
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude.to_bits() == other.latitude.to_bits()
            && self.longitude.to_bits() == other.longitude.to_bits()
            && same_bits(self.altitude, other.altitude)
            && same_bits(self.accuracy, other.accuracy)
    }
}

impl Eq for GeoPoint {}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
        self.altitude.map(f64::to_bits).hash(state);
        self.accuracy.map(f64::to_bits).hash(state);
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.components().into_iter().map(format_decimal).collect();
        f.write_str(&rendered.join(" "))
    }
}

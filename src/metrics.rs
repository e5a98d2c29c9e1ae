//! ==============================================================================
//! metrics.rs - derived display values
//! ==============================================================================
//!
//! purpose:
//!     pure functions that turn readings into presentation values:
//!     unit conversion, qualitative bands, percent change between adjacent
//!     chart points, and min/max normalization for bar heights.
//!
//! relationships:
//!     - used by: dashboard.rs (cards, chart panels)
//!     - used by: refresh.rs (console summary line per poll)
//!
//! ==============================================================================

use serde::Serialize;

use crate::domain::Reading;

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

// ==============================================================================
// humidity
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HumidityBand {
    Low,
    Comfortable,
    High,
}

impl HumidityBand {
    pub fn label(self) -> &'static str {
        match self {
            HumidityBand::Low => "Low",
            HumidityBand::Comfortable => "Comfortable",
            HumidityBand::High => "High",
        }
    }
}

/// exactly 30% and 60% are still comfortable
pub fn humidity_band(humidity: f64) -> HumidityBand {
    if humidity > 60.0 {
        HumidityBand::High
    } else if humidity < 30.0 {
        HumidityBand::Low
    } else {
        HumidityBand::Comfortable
    }
}

// ==============================================================================
// air quality
// ==============================================================================

/// US EPA style AQI categories, upper bounds inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AqiBand {
    Good,
    Moderate,
    UnhealthyForSensitive,
    Unhealthy,
    Hazardous,
}

impl AqiBand {
    pub fn label(self) -> &'static str {
        match self {
            AqiBand::Good => "Good",
            AqiBand::Moderate => "Moderate",
            AqiBand::UnhealthyForSensitive => "Unhealthy for Sensitive",
            AqiBand::Unhealthy => "Unhealthy",
            AqiBand::Hazardous => "Hazardous",
        }
    }

    /// style tag for the card background
    pub fn gradient(self) -> &'static str {
        match self {
            AqiBand::Good => "from-green-400 to-emerald-500",
            AqiBand::Moderate => "from-yellow-400 to-amber-500",
            AqiBand::UnhealthyForSensitive => "from-orange-400 to-orange-600",
            AqiBand::Unhealthy => "from-red-400 to-red-600",
            AqiBand::Hazardous => "from-purple-400 to-purple-700",
        }
    }
}

pub fn aqi_band(aqi: f64) -> AqiBand {
    if aqi <= 50.0 {
        AqiBand::Good
    } else if aqi <= 100.0 {
        AqiBand::Moderate
    } else if aqi <= 150.0 {
        AqiBand::UnhealthyForSensitive
    } else if aqi <= 200.0 {
        AqiBand::Unhealthy
    } else {
        AqiBand::Hazardous
    }
}

// ==============================================================================
// change between chart points
// ==============================================================================

/// percent change from `previous` to `latest`.
///
/// returns 0 when there is no previous point. a previous value of exactly 0
/// yields a non-finite result; `format_change` renders that as "n/a".
pub fn percent_change(previous: Option<f64>, latest: f64) -> f64 {
    match previous {
        Some(previous) => (latest - previous) / previous * 100.0,
        None => 0.0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Trend::Up
        } else if change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

pub fn format_change(change: f64) -> String {
    if !change.is_finite() {
        return "n/a".to_string();
    }
    let sign = if change > 0.0 { "+" } else { "" };
    format!("{sign}{change:.1}%")
}

// ==============================================================================
// bar heights
// ==============================================================================

/// map values to bar heights in [0, 100].
///
/// the domain always includes 0 as floor and 1 as ceiling. a zero or
/// non-finite span maps every bar to 0 instead of propagating NaN.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(1.0_f64, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|&v| {
            let height = (v - min) / span * 100.0;
            if span > 0.0 && height.is_finite() {
                height
            } else {
                0.0
            }
        })
        .collect()
}

// ==============================================================================
// charted metrics
// ==============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Temperature,
    Humidity,
    Aqi,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::Aqi];

    pub fn value(self, reading: &Reading) -> f64 {
        match self {
            Metric::Temperature => reading.temperature,
            Metric::Humidity => reading.humidity,
            Metric::Aqi => reading.aqi,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::Aqi => "Air Quality",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::Aqi => "",
        }
    }

    pub fn gradient(self) -> &'static str {
        match self {
            Metric::Temperature => "from-orange-400 to-red-500",
            Metric::Humidity => "from-blue-400 to-cyan-500",
            Metric::Aqi => "from-green-400 to-emerald-500",
        }
    }

    /// value with one decimal and unit, as shown in tooltips
    pub fn format(self, value: f64) -> String {
        format!("{:.1}{}", value, self.unit())
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fahrenheit() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn test_humidity_band_boundaries() {
        assert_eq!(humidity_band(29.9), HumidityBand::Low);
        assert_eq!(humidity_band(30.0), HumidityBand::Comfortable);
        assert_eq!(humidity_band(60.0), HumidityBand::Comfortable);
        assert_eq!(humidity_band(60.1), HumidityBand::High);
        assert_eq!(humidity_band(60.1).label(), "High");
    }

    #[test]
    fn test_aqi_band_boundaries() {
        let cases = [
            (0.0, "Good"),
            (50.0, "Good"),
            (51.0, "Moderate"),
            (100.0, "Moderate"),
            (101.0, "Unhealthy for Sensitive"),
            (150.0, "Unhealthy for Sensitive"),
            (151.0, "Unhealthy"),
            (200.0, "Unhealthy"),
            (201.0, "Hazardous"),
        ];
        for (aqi, label) in cases {
            assert_eq!(aqi_band(aqi).label(), label, "aqi {aqi}");
        }
        assert_eq!(aqi_band(42.0).gradient(), "from-green-400 to-emerald-500");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(None, 75.0), 0.0);
        assert_relative_eq!(percent_change(Some(50.0), 75.0), 50.0);
        assert_relative_eq!(percent_change(Some(80.0), 60.0), -25.0);
        // previous of zero is left non-finite
        assert!(!percent_change(Some(0.0), 5.0).is_finite());
        assert!(!percent_change(Some(0.0), 0.0).is_finite());
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(50.0), "+50.0%");
        assert_eq!(format_change(-3.21), "-3.2%");
        assert_eq!(format_change(0.0), "0.0%");
        assert_eq!(format_change(f64::INFINITY), "n/a");
        assert_eq!(format_change(f64::NAN), "n/a");
        assert_eq!(Trend::of(0.4), Trend::Up);
        assert_eq!(Trend::of(-0.4), Trend::Down);
        assert_eq!(Trend::of(f64::NAN), Trend::Flat);
    }

    #[test]
    fn test_normalize_forces_zero_floor() {
        let heights = normalize(&[10.0, 20.0, 30.0]);
        assert_eq!(heights.len(), 3);
        assert_relative_eq!(heights[0], 33.333, epsilon = 0.01);
        assert_relative_eq!(heights[1], 66.667, epsilon = 0.01);
        assert_relative_eq!(heights[2], 100.0);
    }

    #[test]
    fn test_normalize_forces_unit_ceiling() {
        let heights = normalize(&[0.25, 0.5]);
        assert_relative_eq!(heights[0], 25.0);
        assert_relative_eq!(heights[1], 50.0);
    }

    #[test]
    fn test_normalize_negative_values() {
        let heights = normalize(&[-10.0, 0.0, 10.0]);
        assert_relative_eq!(heights[0], 0.0);
        assert_relative_eq!(heights[1], 50.0);
        assert_relative_eq!(heights[2], 100.0);
    }

    #[test]
    fn test_normalize_empty_and_degenerate() {
        assert!(normalize(&[]).is_empty());
        assert_eq!(normalize(&[f64::NAN, 5.0]), vec![0.0, 100.0]);
    }

    #[test]
    fn test_metric_format() {
        assert_eq!(Metric::Temperature.format(21.44), "21.4°C");
        assert_eq!(Metric::Humidity.format(45.0), "45.0%");
        assert_eq!(Metric::Aqi.format(42.0), "42.0");
    }
}

#![no_std]
#![allow(async_fn_in_trait)]

use core::fmt::Write;

use heapless::String;

pub mod config;
pub mod error;
pub mod lcd;
pub mod page;
pub mod sensor;
pub mod service;
pub mod wifi;

/// Placeholder shown wherever a measurement could not be acquired.
pub const UNAVAILABLE: &str = "n/a";

const VALUE_CAP: usize = 16;

/// The three current environmental measurements, pre-formatted for the
/// display and the web page. Every field always holds either a value or
/// the unavailable placeholder, never nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadingSet {
    pub temperature: String<VALUE_CAP>,
    pub pressure: String<VALUE_CAP>,
    pub humidity: String<VALUE_CAP>,
}

impl ReadingSet {
    pub fn unavailable() -> Self {
        Self {
            temperature: placeholder(),
            pressure: placeholder(),
            humidity: placeholder(),
        }
    }

    /// Temperature in degrees Celsius, pressure in hPa, relative humidity
    /// in percent.
    pub fn from_measurements(temperature: f32, pressure: f32, humidity: f32) -> Self {
        Self {
            temperature: formatted(temperature, "C"),
            pressure: formatted(pressure, "hPa"),
            humidity: formatted(humidity, "%"),
        }
    }
}

impl Default for ReadingSet {
    fn default() -> Self {
        Self::unavailable()
    }
}

fn placeholder() -> String<VALUE_CAP> {
    let mut value = String::new();
    let _ = value.push_str(UNAVAILABLE);
    value
}

fn formatted(value: f32, unit: &str) -> String<VALUE_CAP> {
    let mut out = String::new();
    if write!(&mut out, "{value:.1}{unit}").is_err() {
        // A value too wide for the cell is as good as no value.
        out.clear();
        let _ = out.push_str(UNAVAILABLE);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_all_placeholders() {
        let readings = ReadingSet::default();
        assert_eq!(readings.temperature.as_str(), UNAVAILABLE);
        assert_eq!(readings.pressure.as_str(), UNAVAILABLE);
        assert_eq!(readings.humidity.as_str(), UNAVAILABLE);
    }

    #[test]
    fn formats_measurements_with_units() {
        let readings = ReadingSet::from_measurements(21.44, 998.06, 35.2);
        assert_eq!(readings.temperature.as_str(), "21.4C");
        assert_eq!(readings.pressure.as_str(), "998.1hPa");
        assert_eq!(readings.humidity.as_str(), "35.2%");
    }

    #[test]
    fn oversized_value_falls_back_to_placeholder() {
        let readings = ReadingSet::from_measurements(3.0e38, 1000.0, 40.0);
        assert_eq!(readings.temperature.as_str(), UNAVAILABLE);
        assert_eq!(readings.pressure.as_str(), "1000.0hPa");
    }
}

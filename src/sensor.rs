use bme280::i2c::BME280;
use defmt::debug;
use embassy_time::Delay;
use embedded_hal::i2c::{ErrorType, I2c};

use crate::error::StationError;
use crate::ReadingSet;

/// Owns the BME280 transaction. One sensor read per `refresh` call, no
/// internal retry; the service loop sets the cadence.
pub struct SensorReader<I2C> {
    bme: BME280<I2C>,
    delay: Delay,
    initialized: bool,
}

impl<I2C> SensorReader<I2C>
where
    I2C: I2c + ErrorType,
{
    pub fn new(i2c: I2C) -> Self {
        Self {
            bme: BME280::new_primary(i2c),
            delay: Delay,
            initialized: false,
        }
    }

    /// Never fails: a broken bus or a malformed response yields the
    /// placeholder set instead.
    pub fn refresh(&mut self) -> ReadingSet {
        match self.sample() {
            Ok(readings) => readings,
            Err(e) => {
                debug!("sensor read failed: {}", e);
                ReadingSet::unavailable()
            }
        }
    }

    fn sample(&mut self) -> Result<ReadingSet, StationError> {
        if !self.initialized {
            self.bme
                .init(&mut self.delay)
                .map_err(|_| StationError::SensorUnavailable)?;
            self.initialized = true;
        }
        match self.bme.measure(&mut self.delay) {
            Ok(measurements) => Ok(ReadingSet::from_measurements(
                measurements.temperature,
                measurements.pressure / 100.0,
                measurements.humidity,
            )),
            Err(_) => {
                // Re-init on the next refresh, so a re-seated sensor
                // recovers without a reboot.
                self.initialized = false;
                Err(StationError::SensorUnavailable)
            }
        }
    }
}

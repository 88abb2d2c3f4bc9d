#![no_std]

//! # MS5607 Barometric Pressure Sensor Driver
//!
//! A type-safe, `no_std` driver for the TE Connectivity MS5607-02BA03
//! barometric pressure and temperature sensor over I2C.
//! This driver uses the typestate pattern to ensure the sensor has been reset
//! and its factory calibration loaded before measurements are taken.
//!
//! ## Features
//! - **Fixed-Point Compensation**: The datasheet's second-order temperature
//!   correction, reproduced bit-exactly in integer arithmetic.
//! - **Typestate Pattern**: Prevents measuring before initialization.
//! - **Altitude Estimation**: Averaged pressure reads fed through the
//!   standard-atmosphere barometric formula.
//!
//! ## Units
//! - **Pressure**: hundredths of a millibar -> 110002 = 1100.02 mbar
//! - **Temperature**: Centigrade (C * 100) -> 2000 = 20.00 °C
//! - **Altitude**: meters (`f32`)

#[cfg(test)]
#[macro_use]
extern crate std;

mod calc;
mod settings;

pub use calc::{compensate, convert_altitude, STANDARD_SEA_LEVEL_PRESSURE};
pub use settings::{AltitudeBuilder, AltitudeConfig, Channel, OversamplingRate};

use core::marker::PhantomData;
use embedded_hal::{self, delay::DelayNs, i2c};

/// The I2C address when the CSB (chip select) pin is pulled high, as it is on
/// the common breakout boards. With CSB low the device answers at 0x77.
pub const DEFAULT_ADDRESS: u8 = 0x76;

/// Command bytes understood by the MS5607, per the datasheet command set.
pub(crate) mod commands {
    /// Reset the device. Must be sent once at startup, before PROM reads.
    pub const RESET: u8 = 0x1E;
    /// Read calibration coefficient C1. C2..C6 follow at +2 increments
    /// (0xA4, 0xA6, 0xA8, 0xAA, 0xAC), each a 2-byte big-endian read.
    pub const PROM_READ_C1: u8 = 0xA2;
    /// Base for pressure (D1) conversion commands; OR in the oversampling bits.
    pub const CONVERT_PRESSURE: u8 = 0x40;
    /// Base for temperature (D2) conversion commands; OR in the oversampling bits.
    pub const CONVERT_TEMPERATURE: u8 = 0x50;
    /// Read the 24-bit ADC result of the most recent conversion.
    pub const ADC_READ: u8 = 0x00;
}

// --- Typestates ---

/// Sensor has been created but not yet reset or calibrated.
pub struct Uninitialized;
/// Sensor is reset, calibration is loaded, and measurements may be taken.
#[derive(Debug)]
pub struct Ready;

/// Error types for the MS5607 driver.
pub mod error {
    /// Errors that can occur during communication or configuration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Ms5607Error<E> {
        /// I2C bus error during a measurement transaction.
        I2c(E),
        /// I2C bus error during reset or calibration PROM load. The driver
        /// never reaches the `Ready` state when this is returned.
        Init(E),
        /// Requested oversampling rate is not one of 256/512/1024/2048/4096.
        UnsupportedOsr(u16),
        /// An altitude estimate was requested over zero samples.
        InvalidSampleCount,
    }

    /// Result type alias for MS5607 operations.
    pub type Result<T, E> = core::result::Result<T, Ms5607Error<E>>;
}

use error::Ms5607Error;

/// Factory calibration coefficients read from the sensor PROM.
///
/// Written once at the factory, read once by [`Ms5607::init`], and never
/// mutated afterwards; the compensation math borrows them immutably.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationCoefficients {
    /// C1 - Pressure sensitivity (SENS_T1).
    pub pressure_sensitivity: u16,
    /// C2 - Pressure offset (OFF_T1).
    pub pressure_offset: u16,
    /// C3 - Temperature coefficient of pressure sensitivity (TCS).
    pub temp_coeff_of_pressure_sensitivity: u16,
    /// C4 - Temperature coefficient of pressure offset (TCO).
    pub temp_coeff_of_pressure_offset: u16,
    /// C5 - Reference temperature (T_REF).
    pub reference_temperature: u16,
    /// C6 - Temperature coefficient of the temperature (TEMPSENS).
    pub temp_coeff_of_temperature: u16,
}

/// Represents pressure in hundredths of a millibar.
///
/// # Example
/// A value of `110002` represents **1100.02 mbar**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub i32);

impl Pressure {
    /// Splits the fixed-point value into integral (mbar) and fractional parts.
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }

    /// The pressure in millibars.
    pub fn to_mbar(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2000` represents **20.00 °C**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i32);

impl Temperature {
    /// Splits the fixed-point value into integral (degrees) and fractional parts.
    pub fn split(&self) -> (i32, i32) {
        (self.0 / 100, self.0 % 100)
    }

    /// The temperature in degrees Celsius.
    pub fn to_celsius(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

/// Compensated measurement result in physical units.
///
/// The device resolves 0.01 mbar / 0.01 °C; both fields keep that full
/// resolution. Inputs outside the rated envelope (10..1200 mbar, -40..85 °C)
/// are not rejected, only potentially inaccurate.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature-compensated pressure.
    pub pressure: Pressure,
    /// Temperature data.
    pub temperature: Temperature,
}

/// The main MS5607 driver structure.
///
/// Use [`Ms5607::new`] to start. The `STATE` generic uses the typestate
/// pattern to track initialization status at compile time.
///
/// The device holds exactly one in-flight conversion at a time, so the bus is
/// treated as exclusively owned: every bus-touching method takes `&mut self`
/// and runs the full command/wait/read sequence without yielding. Sharing one
/// driver across threads requires the caller to serialize whole operations
/// externally.
#[derive(Debug)]
pub struct Ms5607<I2C, STATE> {
    i2c: I2C,
    address: u8,
    coeffs: CalibrationCoefficients,
    _state: PhantomData<STATE>,
}

impl<I2C, E> Ms5607<I2C, Uninitialized>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus object.
    /// * `address` - The I2C address of the sensor ([`DEFAULT_ADDRESS`] or `0x77`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        Ms5607 {
            i2c,
            address,
            coeffs: CalibrationCoefficients::default(),
            _state: PhantomData,
        }
    }

    /// Initializes the sensor: performs a reset and loads the factory
    /// calibration coefficients from PROM.
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    /// The reset is followed by a 5 ms settle; PROM reads issued earlier than
    /// ~2 ms after the reset command fail, so the margin is deliberate.
    ///
    /// # Errors
    /// Returns [`Ms5607Error::Init`] if the I2C communication fails during
    /// reset or calibration reading; no `Ready` driver exists in that case.
    pub fn init(mut self, delay: &mut impl DelayNs) -> error::Result<Ms5607<I2C, Ready>, E> {
        self.i2c
            .write(self.address, &[commands::RESET])
            .map_err(Ms5607Error::Init)?;

        delay.delay_ms(5);

        let coeffs = self.read_calibration_coefficients()?;

        Ok(Ms5607 {
            i2c: self.i2c,
            address: self.address,
            coeffs,
            _state: PhantomData,
        })
    }

    /// Reads one 16-bit big-endian PROM word.
    fn read_prom_word(&mut self, command: u8) -> error::Result<u16, E> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[command], &mut buffer)
            .map_err(Ms5607Error::Init)?;
        Ok(u16::from_be_bytes(buffer))
    }

    /// Reads the six calibration coefficients in fixed C1..C6 order.
    fn read_calibration_coefficients(&mut self) -> error::Result<CalibrationCoefficients, E> {
        let mut words = [0u16; 6];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.read_prom_word(commands::PROM_READ_C1 + 2 * index as u8)?;
        }

        Ok(CalibrationCoefficients {
            pressure_sensitivity: words[0],
            pressure_offset: words[1],
            temp_coeff_of_pressure_sensitivity: words[2],
            temp_coeff_of_pressure_offset: words[3],
            reference_temperature: words[4],
            temp_coeff_of_temperature: words[5],
        })
    }
}

impl<I2C, E> Ms5607<I2C, Ready>
where
    I2C: i2c::I2c<Error = E>,
{
    /// The calibration coefficients loaded during [`Ms5607::init`].
    pub fn coefficients(&self) -> &CalibrationCoefficients {
        &self.coeffs
    }

    /// Releases the I2C handle, consuming the driver.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Starts a pressure (D1) conversion and returns the raw 24-bit ADC value.
    ///
    /// The raw reading should be converted with [`Ms5607::compensate`].
    pub fn read_raw_pressure(
        &mut self,
        delay: &mut impl DelayNs,
        osr: OversamplingRate,
    ) -> error::Result<u32, E> {
        self.start_conversion_and_read_adc(delay, Channel::Pressure, osr)
    }

    /// Starts a temperature (D2) conversion and returns the raw 24-bit ADC value.
    ///
    /// The raw reading should be converted with [`Ms5607::compensate`].
    pub fn read_raw_temperature(
        &mut self,
        delay: &mut impl DelayNs,
        osr: OversamplingRate,
    ) -> error::Result<u32, E> {
        self.start_conversion_and_read_adc(delay, Channel::Temperature, osr)
    }

    /// Reads the current pressure and temperature at the given oversampling
    /// rates, compensated into physical units.
    pub fn read(
        &mut self,
        delay: &mut impl DelayNs,
        pressure_osr: OversamplingRate,
        temperature_osr: OversamplingRate,
    ) -> error::Result<Measurement, E> {
        let raw_pressure = self.read_raw_pressure(delay, pressure_osr)?;
        let raw_temperature = self.read_raw_temperature(delay, temperature_osr)?;

        Ok(self.compensate(raw_pressure, raw_temperature))
    }

    /// Converts a raw pressure/temperature pair to physical units using the
    /// stored calibration coefficients.
    ///
    /// Usable on its own for mixed-rate strategies, e.g. one slow accurate
    /// temperature conversion amortized over many fast pressure reads.
    pub fn compensate(&self, raw_pressure: u32, raw_temperature: u32) -> Measurement {
        calc::compensate(&self.coeffs, raw_pressure, raw_temperature)
    }

    /// Estimates altitude in meters above the configured sea-level reference.
    ///
    /// Performs `config.samples` full read cycles with a 1 ms breather before
    /// each so the bus is not hammered back to back, averages the pressures,
    /// and applies the barometric formula. With the default reference of
    /// 1013.25 mbar this yields pressure altitude; supply a locally reported
    /// sea-level pressure (e.g. from METAR data) for true altitude.
    ///
    /// # Errors
    /// A bus error in any cycle aborts the whole estimate; partial averages
    /// are never returned. Zero samples is rejected as
    /// [`Ms5607Error::InvalidSampleCount`] before any bus access.
    pub fn read_altitude(
        &mut self,
        delay: &mut impl DelayNs,
        config: &AltitudeConfig,
    ) -> error::Result<f32, E> {
        if config.samples == 0 {
            return Err(Ms5607Error::InvalidSampleCount);
        }

        let mut accumulated: i64 = 0;
        for _ in 0..config.samples {
            delay.delay_ms(1);
            let measurement = self.read(delay, config.pressure_osr, config.temperature_osr)?;
            accumulated += i64::from(measurement.pressure.0);
        }

        let mean_mbar = accumulated as f32 / (config.samples as f32 * 100.0);
        Ok(calc::convert_altitude(mean_mbar, config.sea_level_pressure))
    }

    /// Writes the conversion command for (channel, osr), blocks for the
    /// conversion time, then reads the ADC result.
    fn start_conversion_and_read_adc(
        &mut self,
        delay: &mut impl DelayNs,
        channel: Channel,
        osr: OversamplingRate,
    ) -> error::Result<u32, E> {
        self.i2c
            .write(self.address, &[channel.command(osr)])
            .map_err(Ms5607Error::I2c)?;

        // Reading before the conversion completes silently returns zero, with
        // no error signal from the device. This wait is the only protection.
        delay.delay_us(osr.conversion_time_us());

        let mut buffer = [0u8; 4];
        self.i2c
            .write_read(self.address, &[commands::ADC_READ], &mut buffer[1..])
            .map_err(Ms5607Error::I2c)?;

        Ok(u32::from_be_bytes(buffer))
    }
}

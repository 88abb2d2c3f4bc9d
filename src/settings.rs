use crate::calc::STANDARD_SEA_LEVEL_PRESSURE;
use crate::commands;
use crate::error::{self, Ms5607Error};

/// Oversampling rates supported by the MS5607 ADC.
///
/// Higher rates reduce noise but require a longer conversion time per sample.
/// The discriminants are the offsets the device adds to the conversion
/// command bases, so `base | rate` forms the command byte directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OversamplingRate {
    /// 256x oversampling. Fastest, noisiest.
    Osr256 = 0x0,
    /// 512x oversampling.
    Osr512 = 0x2,
    /// 1024x oversampling.
    Osr1024 = 0x4,
    /// 2048x oversampling.
    Osr2048 = 0x6,
    /// 4096x oversampling. Most accurate, slowest (default).
    #[default]
    Osr4096 = 0x8,
}

impl OversamplingRate {
    /// All supported rates, lowest to highest.
    pub const ALL: [OversamplingRate; 5] = [
        OversamplingRate::Osr256,
        OversamplingRate::Osr512,
        OversamplingRate::Osr1024,
        OversamplingRate::Osr2048,
        OversamplingRate::Osr4096,
    ];

    /// Creates an instance from a plain rate value.
    ///
    /// # Errors
    /// Returns [`Ms5607Error::UnsupportedOsr`] for anything outside
    /// 256/512/1024/2048/4096. Rates are never clamped to a neighbor.
    pub fn from_rate<E>(rate: u16) -> error::Result<Self, E> {
        match rate {
            256 => Ok(OversamplingRate::Osr256),
            512 => Ok(OversamplingRate::Osr512),
            1024 => Ok(OversamplingRate::Osr1024),
            2048 => Ok(OversamplingRate::Osr2048),
            4096 => Ok(OversamplingRate::Osr4096),
            other => Err(Ms5607Error::UnsupportedOsr(other)),
        }
    }

    /// The numeric oversampling rate.
    pub fn rate(self) -> u16 {
        match self {
            OversamplingRate::Osr256 => 256,
            OversamplingRate::Osr512 => 512,
            OversamplingRate::Osr1024 => 1024,
            OversamplingRate::Osr2048 => 2048,
            OversamplingRate::Osr4096 => 4096,
        }
    }

    /// Minimum time to wait between issuing a conversion command and reading
    /// the ADC result, in microseconds.
    ///
    /// These are the maximum conversion times from the datasheet's ADC table,
    /// not the typical ones. Reading earlier makes the device return zero
    /// without any error signal, so these values must never be shortened;
    /// rounding up for extra margin is fine.
    pub fn conversion_time_us(self) -> u32 {
        match self {
            OversamplingRate::Osr256 => 600,
            OversamplingRate::Osr512 => 1170,
            OversamplingRate::Osr1024 => 2280,
            OversamplingRate::Osr2048 => 4540,
            OversamplingRate::Osr4096 => 9040,
        }
    }
}

/// The two ADC channels of the MS5607.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Pressure (the datasheet's D1).
    Pressure,
    /// Temperature (the datasheet's D2).
    Temperature,
}

impl Channel {
    /// The conversion command byte for this channel at the given rate.
    pub fn command(self, osr: OversamplingRate) -> u8 {
        let base = match self {
            Channel::Pressure => commands::CONVERT_PRESSURE,
            Channel::Temperature => commands::CONVERT_TEMPERATURE,
        };
        base | osr as u8
    }
}

/// Configuration for an averaged altitude estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltitudeConfig {
    /// Sea-level reference pressure in millibars. The standard-atmosphere
    /// value yields pressure altitude; a locally reported value (e.g. the
    /// altimeter setting from METAR data) yields true altitude.
    pub sea_level_pressure: f32,
    /// Number of full pressure/temperature cycles to average. Tens of samples
    /// smooth sensor noise well; one is the supported minimum.
    pub samples: u32,
    /// Oversampling rate for the pressure conversions.
    pub pressure_osr: OversamplingRate,
    /// Oversampling rate for the temperature conversions.
    pub temperature_osr: OversamplingRate,
}

impl Default for AltitudeConfig {
    fn default() -> Self {
        AltitudeConfig {
            sea_level_pressure: STANDARD_SEA_LEVEL_PRESSURE,
            samples: 48,
            pressure_osr: OversamplingRate::Osr4096,
            temperature_osr: OversamplingRate::Osr4096,
        }
    }
}

/// Convenience builder for an [`AltitudeConfig`].
#[derive(Default)]
pub struct AltitudeBuilder {
    config: AltitudeConfig,
}

impl AltitudeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sea-level reference pressure in millibars.
    pub fn sea_level_pressure(mut self, mbar: f32) -> Self {
        self.config.sea_level_pressure = mbar;
        self
    }

    /// Sets the number of samples to average.
    pub fn samples(mut self, samples: u32) -> Self {
        self.config.samples = samples;
        self
    }

    /// Sets the oversampling rate for the pressure conversions.
    pub fn pressure_osr(mut self, osr: OversamplingRate) -> Self {
        self.config.pressure_osr = osr;
        self
    }

    /// Sets the oversampling rate for the temperature conversions.
    pub fn temperature_osr(mut self, osr: OversamplingRate) -> Self {
        self.config.temperature_osr = osr;
        self
    }

    /// Finalizes the builder and returns the `AltitudeConfig`.
    pub fn build(self) -> AltitudeConfig {
        self.config
    }
}

//! Raw-to-physical conversion math for the MS5607.
//!
//! Pure functions over the factory calibration coefficients; no bus access.
//! The arithmetic reproduces the datasheet's fixed-point scheme bit for bit:
//! all intermediates are `i64` and every division by a power of two is an
//! arithmetic right shift, which floors toward negative infinity exactly as
//! the reference calculation requires. Rounding division gives measurably
//! different results.

use crate::{CalibrationCoefficients, Measurement, Pressure, Temperature};

/// Sea-level pressure of the ICAO standard atmosphere, in millibars.
///
/// Altitude computed against this reference is "pressure altitude";
/// substituting a locally reported sea-level pressure gives true altitude.
pub const STANDARD_SEA_LEVEL_PRESSURE: f32 = 1013.25;

/// Converts a raw pressure/temperature pair into physical units.
///
/// Implements the first- and second-order compensation from the datasheet:
///
/// ```text
/// dT   = D2 - C5 * 2^8
/// TEMP = 2000 + dT * C6 / 2^23
/// OFF  = C2 * 2^17 + C4 * dT / 2^6
/// SENS = C1 * 2^16 + C3 * dT / 2^7
/// P    = (D1 * SENS / 2^21 - OFF) / 2^15
/// ```
///
/// with the low-temperature corrections of `second_order_correction`
/// subtracted from TEMP, OFF and SENS before P is formed.
pub fn compensate(
    coeffs: &CalibrationCoefficients,
    raw_pressure: u32,
    raw_temperature: u32,
) -> Measurement {
    // Difference between the raw temperature and the reference temperature.
    let d_t = raw_temperature as i64 - ((coeffs.reference_temperature as i64) << 8);

    // First-order temperature in hundredths of a degree Celsius.
    let temp = 2000 + ((d_t * coeffs.temp_coeff_of_temperature as i64) >> 23);

    // Pressure offset and sensitivity at the actual temperature.
    let off = ((coeffs.pressure_offset as i64) << 17)
        + ((coeffs.temp_coeff_of_pressure_offset as i64 * d_t) >> 6);
    let sens = ((coeffs.pressure_sensitivity as i64) << 16)
        + ((coeffs.temp_coeff_of_pressure_sensitivity as i64 * d_t) >> 7);

    // The correction branches are taken on the first-order TEMP, before T2 is
    // subtracted; deciding on the corrected value shifts results near the
    // 20.00 °C and -15.00 °C thresholds.
    let (t2, off2, sens2) = second_order_correction(d_t, temp);

    let temp = temp - t2;
    let off = off - off2;
    let sens = sens - sens2;

    // Temperature-compensated pressure in hundredths of a millibar.
    let pressure = (((raw_pressure as i64 * sens) >> 21) - off) >> 15;

    Measurement {
        pressure: Pressure(pressure as i32),
        temperature: Temperature(temp as i32),
    }
}

/// Second-order correction terms (T2, OFF2, SENS2) for low temperatures.
///
/// Below 20.00 °C the linear model drifts and the datasheet prescribes
/// quadratic corrections; below -15.00 °C an additional additive term kicks
/// in. At or above 20.00 °C all terms are zero.
fn second_order_correction(d_t: i64, temp: i64) -> (i64, i64, i64) {
    if temp >= 2000 {
        return (0, 0, 0);
    }

    let t2 = (d_t * d_t) >> 31;
    let from_20 = (temp - 2000) * (temp - 2000);
    let mut off2 = (61 * from_20) >> 4;
    let mut sens2 = 2 * from_20;

    if temp < -1500 {
        let from_minus_15 = (temp + 1500) * (temp + 1500);
        off2 += 15 * from_minus_15;
        sens2 += 8 * from_minus_15;
    }

    (t2, off2, sens2)
}

/// Computes altitude in meters from a local pressure reading.
///
/// Barometric formula for the troposphere (below sea level up to 11 km):
///
/// ```text
/// altitude = 44330.76923 * (1 - (P / P0)^0.190264)
/// ```
///
/// `local_pressure` and `sea_level_pressure` must share the same unit;
/// the driver uses millibars throughout.
pub fn convert_altitude(local_pressure: f32, sea_level_pressure: f32) -> f32 {
    44330.76923 * (1.0 - libm::powf(local_pressure / sea_level_pressure, 0.190264))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Coefficients from the sample conversion in the MS5607 datasheet.
    fn datasheet_coefficients() -> CalibrationCoefficients {
        CalibrationCoefficients {
            pressure_sensitivity: 46372,
            pressure_offset: 43981,
            temp_coeff_of_pressure_sensitivity: 29059,
            temp_coeff_of_pressure_offset: 27842,
            reference_temperature: 31553,
            temp_coeff_of_temperature: 28165,
        }
    }

    #[test]
    fn datasheet_sample_conversion() {
        let measurement = compensate(&datasheet_coefficients(), 6465444, 8077636);

        assert_eq!(measurement.pressure, Pressure(110002));
        assert_eq!(measurement.temperature, Temperature(2000));
        assert!((measurement.pressure.to_mbar() - 1100.02).abs() < 0.01);
        assert!((measurement.temperature.to_celsius() - 20.00).abs() < 0.01);
    }

    #[test]
    fn floating_point_division_does_not_reproduce_the_sample() {
        // Guard against "simplifying" the fixed-point pipeline to floats: the
        // same formula in f64 with rounding division lands on 110003, not the
        // 110002 the datasheet specifies.
        let coeffs = datasheet_coefficients();
        let d_t = 8077636f64 - (coeffs.reference_temperature as f64) * 256.0;
        let off = (coeffs.pressure_offset as f64) * 131072.0
            + (coeffs.temp_coeff_of_pressure_offset as f64 * d_t) / 64.0;
        let sens = (coeffs.pressure_sensitivity as f64) * 65536.0
            + (coeffs.temp_coeff_of_pressure_sensitivity as f64 * d_t) / 128.0;
        let float_pressure = (6465444f64 * sens / 2097152.0 - off) / 32768.0;

        let naive = libm::round(float_pressure) as i32;
        assert_ne!(naive, 110002);

        let exact = compensate(&coeffs, 6465444, 8077636);
        assert_eq!(exact.pressure, Pressure(110002));
    }

    #[test]
    fn no_correction_at_or_above_20_degrees() {
        assert_eq!(second_order_correction(123456, 2000), (0, 0, 0));
        assert_eq!(second_order_correction(123456, 4500), (0, 0, 0));
    }

    #[test]
    fn low_temperature_correction_activates_just_below_20_degrees() {
        // TEMP = 19.99 °C, dT = -256: T2 = 65536 / 2^31 = 0,
        // OFF2 = 61 * 1 / 16 = 3, SENS2 = 2 * 1 = 2.
        assert_eq!(second_order_correction(-256, 1999), (0, 3, 2));
    }

    #[test]
    fn very_low_temperature_correction_activates_just_below_minus_15_degrees() {
        let d_t = -8_000_000;

        // At exactly -15.00 °C only the low-temperature terms apply.
        let at_threshold = second_order_correction(d_t, -1500);
        assert_eq!(at_threshold, (29802, 46_703_125, 24_500_000));

        // One hundredth below, the additive terms join in; both quadratics
        // move because (TEMP - 2000)^2 changes alongside (TEMP + 1500)^2.
        let below_threshold = second_order_correction(d_t, -1501);
        assert_eq!(below_threshold, (29802, 46_729_831, 24_514_010));
    }

    #[test]
    fn branch_decision_uses_first_order_temperature() {
        // D2 = 8000000 gives a first-order TEMP of 1739 (< 2000), so the
        // correction applies: T2 = 2, OFF/SENS shrink, pressure drops from
        // the uncorrected 109375 to 109370.
        let measurement = compensate(&datasheet_coefficients(), 6465444, 8000000);
        assert_eq!(measurement.temperature, Temperature(1737));
        assert_eq!(measurement.pressure, Pressure(109370));
    }

    #[test]
    fn altitude_at_reference_pressure_is_zero() {
        let altitude = convert_altitude(STANDARD_SEA_LEVEL_PRESSURE, STANDARD_SEA_LEVEL_PRESSURE);
        assert!(altitude.abs() < 0.01);
    }

    #[test]
    fn altitude_at_898_746_mbar_is_one_kilometer() {
        let altitude = convert_altitude(898.746, STANDARD_SEA_LEVEL_PRESSURE);
        assert!((altitude - 1000.0).abs() < 0.1);
    }

    #[test]
    fn altitude_against_local_reference_differs_from_pressure_altitude() {
        let pressure_altitude = convert_altitude(1000.0, STANDARD_SEA_LEVEL_PRESSURE);
        let true_altitude = convert_altitude(1000.0, 1023.4);
        assert!(true_altitude > pressure_altitude);
    }
}

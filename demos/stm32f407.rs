//! Demo: barometric altimetry with the MS5607 on an STM32F407.
//!
//! This demo demonstrates:
//! 1. **Initialization**: Setting up I2C and the MS5607 driver (reset +
//!    calibration PROM load).
//! 2. **Simple Reads**: Pressure/temperature in one call.
//! 3. **Altitude**: Averaged altitude against a METAR-reported sea-level
//!    pressure.
//! 4. **Mixed-Rate Sampling**: One slow accurate temperature conversion
//!    reused across several fast pressure reads via `compensate`.
//!
//! Not wired into the crate's build; build it in a firmware project with
//! `stm32f4xx-hal`, `cortex-m-rt`, `defmt-rtt` and `panic-probe` available.

#![no_main]
#![no_std]
#![deny(unsafe_code)]

// The driver is independent of logging frameworks; defmt is used here only.
use defmt_rtt as _;
use ms5607_driver::*;
use panic_probe as _;
use stm32f4xx_hal::{self as hal, prelude::*};

#[cortex_m_rt::entry]
fn main() -> ! {
    // --- 1. Hardware Setup ---
    let dp = hal::pac::Peripherals::take().unwrap();
    let clock_cfg = hal::rcc::Config::default().sysclk(168.MHz());
    let mut rcc = dp.RCC.freeze(clock_cfg);

    // I2C1 on PB6 (SCL) / PB7 (SDA)
    let gpiob = dp.GPIOB.split(&mut rcc);
    let scl = gpiob.pb6.into_open_drain_output();
    let sda = gpiob.pb7.into_open_drain_output();

    let i2c = hal::i2c::I2c1::new(
        dp.I2C1,
        (scl, sda),
        hal::i2c::Mode::Standard {
            frequency: 100.kHz().into(),
        },
        &mut rcc,
    );

    // Delay provider (TIM6) used by the driver for settle timing
    let mut delay = dp.TIM6.delay_us(&mut rcc);

    // --- 2. Driver Initialization ---
    let ms5607 = Ms5607::new(i2c, DEFAULT_ADDRESS);
    let mut ms5607 = ms5607
        .init(&mut delay)
        .expect("Failed to initialize MS5607");

    // --- 3. Altitude configuration ---
    // The altimeter setting from your local airport's METAR data gives true
    // altitude instead of pressure altitude.
    let altitude_config = AltitudeBuilder::new()
        .sea_level_pressure(1023.4)
        .samples(10)
        .pressure_osr(OversamplingRate::Osr4096)
        .temperature_osr(OversamplingRate::Osr256)
        .build();

    loop {
        let measurement = ms5607
            .read(
                &mut delay,
                OversamplingRate::Osr512,
                OversamplingRate::Osr512,
            )
            .unwrap();
        let (mbar, mbar_frac) = measurement.pressure.split();
        let (celsius, celsius_frac) = measurement.temperature.split();
        defmt::info!(
            "pressure={}.{:02} mbar, temperature={}.{:02} C",
            mbar,
            mbar_frac,
            celsius,
            celsius_frac
        );

        let altitude = ms5607.read_altitude(&mut delay, &altitude_config).unwrap();
        defmt::info!("altitude={} m", altitude);

        // --- 4. Mixed-rate sampling ---
        // One accurate temperature read amortized over quick pressure reads.
        let raw_temperature = ms5607
            .read_raw_temperature(&mut delay, OversamplingRate::Osr4096)
            .unwrap();
        for _ in 0..5 {
            let raw_pressure = ms5607
                .read_raw_pressure(&mut delay, OversamplingRate::Osr256)
                .unwrap();
            let fast = ms5607.compensate(raw_pressure, raw_temperature);
            defmt::info!("fast pressure={} (0.01 mbar)", fast.pressure.0);
        }

        delay.delay_ms(1000);
    }
}

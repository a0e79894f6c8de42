//! Common test utilities and shared fixtures

// Shared across several test files; not every helper is used in each one
#![allow(dead_code, unused_imports)]

pub use arcticfox_lib::configuration::{
    Configuration, CurvePoint, DeviceClock, Material, PercentVoltage, PreheatType, SmartMode, TfrPoint,
};
pub use arcticfox_lib::flags::LineContent;
pub use bytes::Bytes;

use arcticfox_lib::transport::mock::MockTransport;
use arcticfox_lib::{ArcticFox, DriverConfig, ProtocolRevision};

/// Decode hex string to bytes for testing
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    let compact: String = hex_data.split_whitespace().collect();
    Bytes::from(hex::decode(compact).expect("Failed to decode hex"))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One monitoring frame: firing, celsius, one cell at 4.12 V, 40.5 W set,
/// 3.5 V / 10 A out, 0.215 ohm coil (0.210 measured), board at 30 degrees.
pub fn monitoring_frame() -> Bytes {
    let mut frame = vec![0u8; 64];
    frame[0..4].copy_from_slice(&0x1234u32.to_le_bytes());
    frame[4] = 1;
    frame[6] = 1;
    frame[7] = 137;
    frame[11..13].copy_from_slice(&405u16.to_le_bytes());
    frame[13..15].copy_from_slice(&200u16.to_le_bytes());
    frame[15..17].copy_from_slice(&180u16.to_le_bytes());
    frame[17..19].copy_from_slice(&350u16.to_le_bytes());
    frame[19..21].copy_from_slice(&1000u16.to_le_bytes());
    frame[21..23].copy_from_slice(&215u16.to_le_bytes());
    frame[23..25].copy_from_slice(&210u16.to_le_bytes());
    frame[25] = 30;
    Bytes::from(frame)
}

/// A configuration with distinctive values in every section, all exactly
/// representable at their wire scale.
pub fn sample_configuration() -> Configuration {
    let mut config = Configuration::default();

    config.device.settings_version = 6;
    config.device.product_id = "E052".to_string();
    config.device.hardware_version = 101;
    config.device.max_device_power = 75.0;
    config.device.number_of_batteries = 1;
    config.device.display_size = 1;
    config.device.firmware_version = 170_101;
    config.device.firmware_build = 161_011;

    for (i, profile) in config.profiles.iter_mut().enumerate() {
        profile.name = format!("P{}", i + 1);
        profile.is_enabled = true;
        profile.power = 20.0 + i as f64 * 2.5;
        profile.resistance = 0.215;
        profile.temperature = 200;
    }
    let tc = &mut config.profiles[1];
    tc.material = Material::StainlessSteel;
    tc.is_temperature_dominant = true;
    tc.is_celsius = true;
    tc.is_resistance_locked = true;
    tc.preheat_type = PreheatType::Curve;
    tc.selected_curve = 2;
    tc.preheat_time = 0.12;
    tc.preheat_delay = 5;
    tc.preheat_power = 300;
    tc.tcr = 120;
    tc.pi_regulator.is_enabled = true;
    tc.pi_regulator.range = 10;
    tc.pi_regulator.p_value = 1500;
    tc.pi_regulator.i_value = 250;

    config.general.selected_profile = 1;
    config.general.smart_mode = SmartMode::Lazy;
    config.general.smart_range = 15;

    config.ui.clicks_vw = [1, 2, 3];
    config.ui.shortcuts_tc[2].in_menu = 9;
    config.ui.skins.classic_vw[0] = LineContent::new(5, true);
    config.ui.skins.small_tc[1] = LineContent::new(0x7F, false);
    config.ui.brightness = 128;
    config.ui.is_stealth_mode = true;
    config.ui.clock_type = 2;
    config.ui.five_clicks = 4;
    config.ui.puffs_count = 12_345;
    config.ui.puffs_time = 67_890;
    config.ui.clock = DeviceClock {
        year: 2017,
        month: 3,
        day: 14,
        hour: 15,
        minute: 9,
        second: 26,
    };

    let advanced = &mut config.advanced;
    advanced.shunt_correction = 100;
    advanced.battery_model = 3;
    advanced.custom_batteries[0].name = "LG1".to_string();
    advanced.custom_batteries[0].points[0] = PercentVoltage {
        percent: 100,
        voltage: 4.2,
    };
    advanced.custom_batteries[0].cutoff = 2.75;
    advanced.rtc_mode = 1;
    advanced.is_usb_charge = true;
    advanced.tfr_tables[0].name = "SS".to_string();
    advanced.tfr_tables[0].points[1] = TfrPoint {
        temperature: 100,
        factor: 1.1234,
    };
    advanced.puff_cutoff = 100;
    advanced.power_curves[2].name = "CURVE3".to_string();
    advanced.power_curves[2].points[0] = CurvePoint {
        time: 0.5,
        percent: 150,
    };
    advanced.battery_voltage_offsets = [-0.05, 0.0, 0.12, 0.0];
    advanced.check_tcr = true;
    advanced.deep_sleep_delay = 60;
    advanced.power_limit = 60.5;
    advanced.internal_resistance = 0.015;

    config
}

/// The sample configuration split into HID-report-sized chunks.
pub fn configuration_chunks(config: &Configuration) -> Vec<Bytes> {
    let blob = config.encode().expect("Failed to encode configuration");
    blob.chunks(64).map(Bytes::copy_from_slice).collect()
}

/// A driver over `mock` with the default timings.
pub fn driver(mock: &MockTransport) -> ArcticFox<MockTransport> {
    driver_with(mock, ProtocolRevision::Current)
}

pub fn driver_with(mock: &MockTransport, revision: ProtocolRevision) -> ArcticFox<MockTransport> {
    let config = DriverConfig {
        revision,
        ..DriverConfig::default()
    };
    ArcticFox::new(mock.clone(), config)
}

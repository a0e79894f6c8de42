mod common;

use arcticfox_lib::configuration::offsets;
use arcticfox_lib::constants::CONFIGURATION_LENGTH;
use arcticfox_lib::error::FoxError;
use arcticfox_lib::monitoring::MonitoringData;
use arcticfox_lib::version::{ProtocolRevision, VersionGate};
use common::*;

fn current_gate() -> VersionGate {
    ProtocolRevision::Current.gate()
}

#[test]
fn test_round_trip_preserves_every_section() {
    let config = sample_configuration();
    let blob = config.encode().expect("Failed to encode");
    assert_eq!(blob.len(), CONFIGURATION_LENGTH);

    let decoded = Configuration::decode(&blob, &current_gate()).expect("Failed to decode");
    assert_eq!(decoded, config);
    assert_eq!(decoded.encode().unwrap(), blob);
}

#[test]
fn test_section_bytes_land_at_fixed_offsets() {
    let blob = sample_configuration().encode().unwrap();

    assert_eq!(blob[offsets::DEVICE_INFO], 6);
    assert_eq!(&blob[1..5], b"E052");
    assert_eq!(&blob[9..11], &750u16.to_le_bytes());

    // second profile: "P2", then flags SS | temperature dominant | celsius | locked | enabled
    let p2 = offsets::PROFILES + 29;
    assert_eq!(&blob[p2..p2 + 8], b"P2\0\0\0\0\0\0");
    assert_eq!(blob[p2 + 8], 0xF3);
    assert_eq!(blob[p2 + 9], 2);
    assert_eq!(blob[p2 + 11], 12);
    assert_eq!(&blob[p2 + 15..p2 + 17], &225u16.to_le_bytes());
    assert_eq!(&blob[p2 + 19..p2 + 21], &215u16.to_le_bytes());

    assert_eq!(&blob[offsets::GENERAL..offsets::UI], &[1, 2, 15]);

    assert_eq!(&blob[offsets::UI..offsets::UI + 3], &[1, 2, 3]);
    assert_eq!(blob[offsets::UI + 30], 0x85);
    assert_eq!(blob[offsets::UI + 53], 0x7F);
    assert_eq!(&blob[offsets::UI + 88..offsets::UI + 90], &2017u16.to_le_bytes());

    assert_eq!(blob[offsets::ADVANCED], 100);
    assert_eq!(&blob[offsets::ADVANCED + 2..offsets::ADVANCED + 6], b"LG1\0");
    let offsets_at = offsets::END - 11;
    assert_eq!(blob[offsets_at], (-5i8) as u8);
    assert_eq!(blob[offsets_at + 2], 12);

    assert!(blob[offsets::END..].iter().all(|&b| b == 0));
}

#[test]
fn test_skin_line_puff_flag_bit() {
    let line = LineContent::from_byte(0x85);
    assert_eq!(line.value, 5);
    assert!(line.puffs_display);
    assert_eq!(LineContent::new(5, true).to_byte().unwrap(), 0x85);
}

#[test]
fn test_nonzero_bool_bytes_decode_true() {
    let mut blob = sample_configuration().encode().unwrap().to_vec();
    // is_flipped
    blob[offsets::UI + 60] = 0x7E;
    let decoded = Configuration::decode(&blob, &current_gate()).unwrap();
    assert!(decoded.ui.is_flipped);
    assert_eq!(decoded.encode().unwrap()[offsets::UI + 60], 1);
}

#[test]
fn test_high_bytes_in_names_round_trip() {
    let mut blob = sample_configuration().encode().unwrap().to_vec();
    let name_at = offsets::PROFILES;
    blob[name_at + 2] = 0xB0;
    blob[name_at + 3] = 0xFF;
    // erased custom battery name
    blob[offsets::ADVANCED + 2 + 50..offsets::ADVANCED + 2 + 54].fill(0xFF);

    let decoded = Configuration::decode_ungated(&blob).expect("Failed to decode");
    assert_eq!(decoded.profiles[0].name, "P1\u{B0}\u{FF}");
    assert_eq!(decoded.advanced.custom_batteries[1].name, "\u{FF}".repeat(4));
    assert_eq!(decoded.encode().expect("Failed to encode").as_ref(), blob.as_slice());
}

#[test]
fn test_trailing_bytes_are_ignored() {
    let mut blob = sample_configuration().encode().unwrap().to_vec();
    blob.extend_from_slice(&[0xFF; 64]);
    assert_eq!(
        Configuration::decode(&blob, &current_gate()).unwrap(),
        sample_configuration()
    );
}

#[test]
fn test_gate_outdated_tool() {
    let mut config = sample_configuration();
    config.device.settings_version = 7;
    let blob = config.encode().unwrap();
    assert_eq!(
        Configuration::decode(&blob, &current_gate()),
        Err(FoxError::OutdatedTool {
            settings_version: 7,
            supported: 6
        })
    );
}

#[test]
fn test_gate_outdated_firmware() {
    let mut config = sample_configuration();
    config.device.firmware_build = 161_010;
    let blob = config.encode().unwrap();
    assert!(matches!(
        Configuration::decode(&blob, &current_gate()),
        Err(FoxError::OutdatedFirmware { build: 161_010, .. })
    ));

    let mut config = sample_configuration();
    config.device.settings_version = 5;
    let blob = config.encode().unwrap();
    assert!(matches!(
        Configuration::decode(&blob, &current_gate()),
        Err(FoxError::OutdatedFirmware { settings_version: 5, .. })
    ));
}

#[test]
fn test_gate_accepts_exact_minimum() {
    let blob = sample_configuration().encode().unwrap();
    assert!(Configuration::decode(&blob, &current_gate()).is_ok());
}

#[test]
fn test_legacy_revision_thresholds() {
    let mut config = sample_configuration();
    config.device.settings_version = 5;
    config.device.firmware_build = 160_410;
    let blob = config.encode().unwrap();
    assert!(Configuration::decode(&blob, &ProtocolRevision::Legacy.gate()).is_ok());
    assert!(Configuration::decode(&blob, &current_gate()).is_err());
    assert!(Configuration::decode_ungated(&blob).is_ok());
}

#[test]
fn test_encode_rejects_unencodable_values() {
    let mut config = sample_configuration();
    config.profiles[0].name = "TOO-LONG-NAME".to_string();
    assert!(matches!(config.encode(), Err(FoxError::InvalidArgument(_))));

    let mut config = sample_configuration();
    config.profiles[0].power = 7000.0;
    assert!(matches!(config.encode(), Err(FoxError::InvalidArgument(_))));

    let mut config = sample_configuration();
    config.ui.skins.foxy_tc[0] = LineContent::new(0x80, false);
    assert!(matches!(config.encode(), Err(FoxError::InvalidArgument(_))));
}

#[test]
fn test_clock_converts_to_datetime() {
    let clock = sample_configuration().ui.clock;
    let when = clock.to_naive().expect("valid date");
    assert_eq!(when.to_string(), "2017-03-14 15:09:26");
}

#[test]
fn test_selected_profile() {
    let config = sample_configuration();
    assert_eq!(config.selected_profile().map(|p| p.name.as_str()), Some("P2"));
}

#[test]
fn test_json_output_round_trips() {
    let config = sample_configuration();
    let json = serde_json::to_string(&config).unwrap();
    let back: Configuration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_monitoring_sample_values() {
    let data = MonitoringData::from_bytes(&monitoring_frame()).unwrap();
    assert_eq!(data.timestamp, 0x1234);
    assert!(data.is_firing);
    assert!(!data.is_charging);
    assert!(data.is_celsius);
    assert_eq!(data.battery_voltages, [4.12, 0.0, 0.0, 0.0]);
    assert_eq!(data.battery_count(), 1);
    assert_eq!(data.power_set, 40.5);
    assert_eq!(data.temperature_set, 200);
    assert_eq!(data.output_voltage, 3.5);
    assert_eq!(data.output_current, 10.0);
    assert_eq!(data.output_power, 35.0);
    assert_eq!(data.resistance, 0.215);
    assert_eq!(data.real_resistance, 0.21);
    assert_eq!(data.board_temperature, 30);
}

#[test]
fn test_monitoring_rejects_short_frame() {
    assert!(matches!(
        MonitoringData::from_bytes(&[0u8; 63]),
        Err(FoxError::MalformedResponse(_))
    ));
}

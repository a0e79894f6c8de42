mod common;

use arcticfox_lib::command::{CommandFrame, Opcode, build_command, checksum_suffix};
use arcticfox_lib::error::FoxError;
use common::hex_to_bytes;

#[test]
fn test_read_configuration_frame() {
    let frame = build_command(Opcode::ReadConfiguration, 0, 1088);
    assert_eq!(frame, hex_to_bytes("60 0e 00000000 40040000 48494443 ca01"));
}

#[test]
fn test_known_frames() {
    let cases = [
        (Opcode::Restart, 0, 0, "b4 0e 00000000 00000000 48494443 da01"),
        (Opcode::ReadMonitoringData, 0, 64, "66 0e 00000000 40000000 48494443 cc01"),
        (Opcode::Puff, 3, 0, "44 0e 03000000 00000000 48494443 6d01"),
        (Opcode::Screenshot, 0, 0x400, "c1 0e 00000000 00040000 48494443 eb01"),
        (Opcode::SetDateTime, 0, 0, "64 0e 00000000 00000000 48494443 8a01"),
        (Opcode::WriteData, 102_400, 1024, "c3 0e 00900100 00040000 48494443 7e02"),
        (
            Opcode::ReadDataflash,
            0xFFFF_FFFF,
            0xFFFF_FFFF,
            "35 0e ffffffff ffffffff 48494443 5309",
        ),
    ];
    for (opcode, arg1, arg2, expected) in cases {
        assert_eq!(
            build_command(opcode, arg1, arg2),
            hex_to_bytes(expected),
            "frame for {opcode}"
        );
    }
}

#[test]
fn test_suffix_is_running_sum() {
    let frame = build_command(Opcode::WriteConfiguration, 7, 1088);
    let sum: u32 = frame[..14].iter().map(|&b| u32::from(b)).sum();
    let suffix = &frame[14..];
    let rebuilt = suffix
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));
    assert_eq!(rebuilt, sum);
    assert_eq!(suffix, checksum_suffix(&frame[..14]).as_slice());
}

#[test]
fn test_parse_recovers_arguments() {
    let opcodes = [
        Opcode::ReadDataflash,
        Opcode::WriteDataflash,
        Opcode::ResetDataflash,
        Opcode::WriteData,
        Opcode::Restart,
        Opcode::Screenshot,
        Opcode::ReadMonitoringData,
        Opcode::Puff,
        Opcode::ReadConfiguration,
        Opcode::WriteConfiguration,
        Opcode::SetDateTime,
        Opcode::SetLogo,
    ];
    let args = [(0, 0), (1, 1088), (102_400, 1024), (0xDEAD_BEEF, 0x0123_4567), (u32::MAX, u32::MAX)];
    for opcode in opcodes {
        for (arg1, arg2) in args {
            let bytes = build_command(opcode, arg1, arg2);
            let parsed = CommandFrame::try_from(bytes.as_ref()).expect("Failed to parse frame");
            assert_eq!(parsed, CommandFrame::new(opcode, arg1, arg2));
        }
    }
}

#[test]
fn test_parse_accepts_report_padding() {
    let mut report = build_command(Opcode::Restart, 0, 0).to_vec();
    report.resize(64, 0);
    let parsed = CommandFrame::try_from(report.as_slice()).unwrap();
    assert_eq!(parsed.opcode, Opcode::Restart);
}

#[test]
fn test_parse_rejects_corruption() {
    let good = build_command(Opcode::Puff, 3, 0).to_vec();

    let mut bad_checksum = good.clone();
    bad_checksum[14] ^= 0x01;
    assert!(matches!(
        CommandFrame::try_from(bad_checksum.as_slice()),
        Err(FoxError::InvalidFrame(_))
    ));

    let mut bad_marker = good.clone();
    bad_marker[10] = b'X';
    assert!(matches!(
        CommandFrame::try_from(bad_marker.as_slice()),
        Err(FoxError::InvalidFrame(_))
    ));

    let mut bad_tag = good.clone();
    bad_tag[1] = 15;
    assert!(CommandFrame::try_from(bad_tag.as_slice()).is_err());

    assert!(CommandFrame::try_from(&good[..10]).is_err());
    assert!(CommandFrame::try_from(&good[..15]).is_err());
}

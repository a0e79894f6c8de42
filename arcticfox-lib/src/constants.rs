// Protocol constants for ArcticFox devices

/// USB vendor id of the Nuvoton HID bridge used by ArcticFox-capable mods
pub const VENDOR_ID: u16 = 0x0416;

/// USB product id of the HID interface
pub const PRODUCT_ID: u16 = 0x5020;

/// Second byte of every command frame
pub const PROTOCOL_TAG: u8 = 14;

/// ASCII marker closing the fixed part of a command frame
pub const COMMAND_MARKER: [u8; 4] = *b"HIDC";

/// Fixed part of a command frame: opcode, tag, two u32 arguments, marker (14 bytes)
pub const COMMAND_HEADER_SIZE: usize = 14;

/// Size of the HID reports exchanged with the device (64 bytes)
pub const HID_REPORT_SIZE: usize = 64;

/// Size of the configuration record (1088 bytes)
pub const CONFIGURATION_LENGTH: usize = 1088;

/// Size of one monitoring frame (64 bytes)
pub const MONITORING_DATA_LENGTH: usize = 64;

/// Size of a screenshot response (1024 bytes, 1 bit per pixel)
pub const SCREENSHOT_LENGTH: usize = 0x400;

/// Size of the dataflash region (2048 bytes)
pub const DATAFLASH_LENGTH: usize = 2048;

/// Offset of the boot logo inside the firmware image
pub const LOGO_OFFSET: u32 = 102_400;

/// Size of the boot logo (1024 bytes)
pub const LOGO_LENGTH: usize = 1024;

/// Number of user profiles stored in the configuration
pub const PROFILE_COUNT: usize = 8;

/// Number of user-defined battery discharge tables
pub const CUSTOM_BATTERY_COUNT: usize = 3;

/// Number of temperature-factor-of-resistance tables
pub const TFR_TABLE_COUNT: usize = 8;

/// Number of power curves
pub const POWER_CURVE_COUNT: usize = 8;

/// Default delay between reconnect attempts
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Default deadline for a response (re-armed on every inbound chunk)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

/// Default interrupt IN endpoint of the HID interface
pub const DEFAULT_ENDPOINT_IN: u8 = 0x81;

/// Default interrupt OUT endpoint of the HID interface
pub const DEFAULT_ENDPOINT_OUT: u8 = 0x02;

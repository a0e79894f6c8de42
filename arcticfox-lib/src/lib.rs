pub mod command;
pub mod config;
pub mod configuration;
pub mod constants;
pub mod demux;
pub mod device;
pub mod error;
pub mod flags;
pub mod monitoring;
pub mod response;
pub mod transport;
pub mod version;


// Re-export the driver and the types most callers need
pub use command::{CommandFrame, Opcode, build_command};
pub use config::DriverConfig;
pub use configuration::Configuration;
pub use device::{ArcticFox, ConnectionState, LinkEvent};
pub use error::FoxError;
pub use monitoring::MonitoringData;
pub use version::{ProtocolRevision, VersionGate};

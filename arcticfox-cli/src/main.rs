use anyhow::{Context, Result};
use arcticfox_lib::configuration::Configuration;
use arcticfox_lib::{ArcticFox, DriverConfig, ProtocolRevision};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Talk to ArcticFox-firmware devices over USB HID")]
struct Cli {
    /// Driver settings as JSON (vendor/product id, endpoints, timings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Firmware protocol revision
    #[arg(long, global = true)]
    revision: Option<Revision>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Revision {
    Legacy,
    Current,
}

impl From<Revision> for ProtocolRevision {
    fn from(revision: Revision) -> Self {
        match revision {
            Revision::Legacy => ProtocolRevision::Legacy,
            Revision::Current => ProtocolRevision::Current,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll live telemetry
    Monitor {
        /// Number of samples to read
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Delay between samples in milliseconds
        #[arg(short, long, default_value = "500")]
        interval: u64,

        /// Print samples as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the configuration record as JSON
    ReadConfig {
        /// Write the JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a configuration record previously saved with read-config
    WriteConfig { path: PathBuf },
    /// Capture the screen buffer
    Screenshot {
        /// Write the raw image to a file instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Dump the dataflash block
    Dataflash {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restart the device
    Restart,
    /// Fire the coil for a number of seconds
    Puff { seconds: u32 },
    /// Set the device clock (defaults to local time)
    SetTime {
        /// Time as "YYYY-MM-DD HH:MM:SS"
        time: Option<String>,
    },
    /// Clear the dataflash block
    ResetDataflash,
    /// Replace the boot logo with a raw 1024-byte image
    Logo { path: PathBuf },
}

fn driver_config(cli: &Cli) -> Result<DriverConfig> {
    let mut config = match &cli.config {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("Failed to load driver settings from {}", path.display()))?,
        None => DriverConfig::default(),
    };
    if let Some(timeout) = cli.timeout {
        config.request_timeout_ms = timeout;
    }
    if let Some(revision) = cli.revision {
        config.revision = revision.into();
    }
    config.validate().context("Invalid driver settings")?;
    Ok(config)
}

fn parse_time(time: Option<&str>) -> Result<NaiveDateTime> {
    match time {
        Some(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
            .with_context(|| format!("Invalid time {text:?}")),
        None => Ok(Local::now().naive_local()),
    }
}

fn emit(bytes: &[u8], output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            for line in bytes.chunks(32) {
                println!("{}", hex::encode(line));
            }
        }
    }
    Ok(())
}

async fn run(device: &ArcticFox, command: Command) -> Result<()> {
    match command {
        Command::Monitor { count, interval, json } => {
            for i in 0..count {
                if i > 0 {
                    tokio::time::sleep(Duration::from_millis(interval)).await;
                }
                let sample = device
                    .read_monitoring_data()
                    .await
                    .context("Failed to read monitoring data")?;
                if json {
                    println!("{}", serde_json::to_string(&sample)?);
                } else {
                    println!("{sample}");
                }
            }
        }
        Command::ReadConfig { output } => {
            let config = device
                .read_configuration()
                .await
                .context("Failed to read configuration")?;
            let json = serde_json::to_string_pretty(&config)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::WriteConfig { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Configuration =
                serde_json::from_str(&text).context("Configuration file is not valid JSON")?;
            device
                .write_configuration(&config)
                .await
                .context("Failed to write configuration")?;
            info!("Configuration written");
        }
        Command::Screenshot { output } => {
            let image = device.screenshot().await.context("Failed to capture screen")?;
            emit(&image, output.as_ref())?;
        }
        Command::Dataflash { output } => {
            let block = device.read_dataflash().await.context("Failed to read dataflash")?;
            emit(&block, output.as_ref())?;
        }
        Command::Restart => device.restart().await.context("Failed to restart")?,
        Command::Puff { seconds } => device.make_puff(seconds).await.context("Failed to puff")?,
        Command::SetTime { time } => {
            let when = parse_time(time.as_deref())?;
            device.set_date_time(when).await.context("Failed to set clock")?;
            info!("Clock set to {when}");
        }
        Command::ResetDataflash => device
            .reset_dataflash()
            .await
            .context("Failed to reset dataflash")?,
        Command::Logo { path } => {
            let image = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            device.write_logo(&image).await.context("Failed to write logo")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(cli.verbose.tracing_level_filter().into())
                .from_env_lossy(),
        )
        .init();

    let config = driver_config(&cli)?;
    let device = ArcticFox::usb(config);
    device.connect().await.context("Failed to connect to device")?;
    info!("Connected");

    let result = run(&device, cli.command).await;
    device.disconnect().await;
    result
}

use akm_config::EngineConfig;
use akm_fusion::{AkmDriver, FusionError, RegisterMap};
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "akm-replay")]
#[command(about = "Replay a recorded accelerometer/magnetometer stream through the fusion engine")]
struct Cli {
    /// Recorded samples, CSV with header `kind,x,y,z,a,b`.
    input: PathBuf,

    /// Engine config file. Defaults to the per-user config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write one orientation row per ingested sample to this CSV file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Device node reported to the session.
    #[arg(long, default_value = "/dev/akm8975")]
    device: PathBuf,

    /// Log the fused state every N samples.
    #[arg(long, default_value_t = 100)]
    every: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecordKind {
    /// `a` = sensitivity.
    Acc,
    /// `a` = status, `b` = period.
    Mag,
    /// `x` = form factor id.
    Form,
    Recalibrate,
}

#[derive(Debug, Deserialize)]
struct Record {
    kind: RecordKind,
    x: i32,
    y: i32,
    z: i32,
    a: i32,
    b: i32,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    sample: u64,
    azimuth: f32,
    pitch: f32,
    roll: f32,
    mag_x: f32,
    mag_y: f32,
    mag_z: f32,
    goodness: u32,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    samples: u64,
    rejected: u64,
    goodness: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "akm_replay=info,akm_fusion=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_engine_config(&cli);
    info!(
        accel_range = config.accel_range,
        form_factors = config.layout.form_factor_count,
        "Config loaded"
    );

    let mut driver = AkmDriver::new();
    driver.init(
        i32::try_from(config.layout.form_factor_count).unwrap_or(i32::MAX),
        RegisterMap::default(),
        config.layout.mag_layout,
        config,
    );
    driver.start(&cli.device)?;

    let reader = csv::Reader::from_path(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let summary = match &cli.output {
        Some(path) => {
            let writer = csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            replay(reader, &mut driver, Some(writer), cli.every)?
        }
        None => replay::<_, io::Sink>(reader, &mut driver, None, cli.every)?,
    };

    driver.stop()?;
    driver.release();
    info!(
        samples = summary.samples,
        rejected = summary.rejected,
        goodness = summary.goodness,
        "Replay finished"
    );
    Ok(())
}

fn load_engine_config(cli: &Cli) -> EngineConfig {
    let loaded = match &cli.config {
        Some(path) => akm_config::load_config_from(path),
        None => akm_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        EngineConfig::default()
    })
}

/// Feed every record to the driver, optionally writing the fused state
/// after each ingestion.
fn replay<R: io::Read, W: io::Write>(
    mut reader: csv::Reader<R>,
    driver: &mut AkmDriver,
    mut writer: Option<csv::Writer<W>>,
    every: u64,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (line, record) in reader.deserialize::<Record>().enumerate() {
        let record = record.with_context(|| format!("Malformed record {}", line + 1))?;
        let outcome = match record.kind {
            RecordKind::Acc => driver.save_acc(record.x, record.y, record.z, record.a),
            RecordKind::Mag => driver.save_mag(record.x, record.y, record.z, record.a, record.b),
            RecordKind::Form => {
                driver.change_form_factor(record.x)?;
                continue;
            }
            RecordKind::Recalibrate => {
                driver.force_recalibration();
                continue;
            }
        };

        match outcome {
            Ok(()) => summary.samples += 1,
            Err(e @ FusionError::InvalidSensitivity(_)) => {
                warn!(line = line + 1, %e, "Sample rejected");
                summary.rejected += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        let orientation = driver.orientation_values()?;
        let field = driver.magnetic_values()?;
        let goodness = driver.calibration_goodness();

        if every > 0 && summary.samples % every == 0 {
            info!(
                sample = summary.samples,
                azimuth = orientation.azimuth,
                pitch = orientation.pitch,
                roll = orientation.roll,
                goodness,
                "Fused state"
            );
        }

        if let Some(writer) = writer.as_mut() {
            writer.serialize(OutputRow {
                sample: summary.samples,
                azimuth: orientation.azimuth,
                pitch: orientation.pitch,
                roll: orientation.roll,
                mag_x: field.x,
                mag_y: field.y,
                mag_z: field.z,
                goodness,
            })?;
        }
    }

    if let Some(mut writer) = writer {
        writer.flush()?;
    }
    summary.goodness = driver.calibration_goodness();
    Ok(summary)
}

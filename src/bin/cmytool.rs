use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::{Level, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

use cmy_code::config::debug_enabled;
use cmy_code::encoder::split_channels;
use cmy_code::layout::SizePlan;
use cmy_code::tools::{capacity_table, load_rgba, save_png};
use cmy_code::{
    Channel, DecodeOptions, Decoded, Decoder, GridSize, LocalizeMode, PacketIntegrity,
    RobustnessReport, render,
};

/// Longest text the encoder accepts, in characters
const MAX_TEXT_CHARS: usize = 1000;

/// CMY color code tools
#[derive(Parser)]
#[command(name = "cmytool", version, about = "Encode, decode and inspect CMY codes")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render text to a PNG
    Encode {
        /// Text to encode (1 to 1000 characters)
        text: String,
        /// Output PNG path
        #[arg(short, long, default_value = "cmy-code.png")]
        output: PathBuf,
        /// Grid size in modules (21, 25, .., 77); picked automatically if unset
        #[arg(long)]
        size: Option<usize>,
        /// Pixels per module
        #[arg(long, default_value = "10")]
        scale: u32,
    },
    /// Decode a code image
    Decode {
        image: PathBuf,
        /// Channel threshold; defaults to CMY_DEFAULT_THRESHOLD or 128
        #[arg(short, long)]
        threshold: Option<u8>,
        /// Assume 10 px modules instead of inferring the scale
        #[arg(long)]
        manual_scale: bool,
        /// Finder search policy
        #[arg(long, value_enum, default_value = "auto")]
        localize: LocalizeArg,
    },
    /// Decode at five thresholds and check that they agree
    Robustness {
        image: PathBuf,
        /// Run the thresholds one after another
        #[arg(long)]
        serial: bool,
    },
    /// Print the capacity table, or the channel plans for a text
    Inspect {
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LocalizeArg {
    Auto,
    Always,
    Never,
}

impl From<LocalizeArg> for LocalizeMode {
    fn from(arg: LocalizeArg) -> Self {
        match arg {
            LocalizeArg::Auto => LocalizeMode::Auto,
            LocalizeArg::Always => LocalizeMode::Always,
            LocalizeArg::Never => LocalizeMode::Never,
        }
    }
}

#[derive(Serialize)]
struct EncodeOutput {
    file: String,
    size: usize,
    scale: u32,
    width: u32,
    height: u32,
    available_bytes: usize,
    recovery_bytes: usize,
    protection_ratio: f32,
    channels: Vec<EncodedChannel>,
}

#[derive(Serialize)]
struct EncodedChannel {
    channel: &'static str,
    payload_bytes: usize,
    recovery_bytes: usize,
    truncated: bool,
}

#[derive(Serialize)]
struct DecodeOutput {
    file: String,
    text: String,
    scale: u32,
    size: usize,
    bytes_decoded: usize,
    was_localized: bool,
    channels: Vec<ChannelOutput>,
}

#[derive(Serialize)]
struct ChannelOutput {
    channel: &'static str,
    text: String,
    integrity: String,
}

#[derive(Serialize)]
struct RobustnessOutput {
    file: String,
    consistent: bool,
    best: Option<String>,
    successes: usize,
    runs: Vec<RunOutput>,
}

#[derive(Serialize)]
struct RunOutput {
    threshold: u8,
    sensitivity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct InspectRow {
    size: usize,
    capacity: usize,
    max_payload: usize,
}

#[derive(Serialize)]
struct PlanOutput {
    channel: &'static str,
    payload_bytes: usize,
    size: usize,
    available_bytes: usize,
    recovery_bytes: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose)?;

    match cli.command {
        Command::Encode {
            ref text,
            ref output,
            size,
            scale,
        } => encode_cmd(&cli, text, output, size, scale),
        Command::Decode {
            ref image,
            threshold,
            manual_scale,
            localize,
        } => {
            let mut options = DecodeOptions {
                auto_scale: !manual_scale,
                localize: localize.into(),
                ..DecodeOptions::default()
            };
            if let Some(threshold) = threshold {
                options.threshold = threshold;
            }
            decode_cmd(&cli, image, options)
        }
        Command::Robustness { ref image, serial } => {
            let options = DecodeOptions {
                parallel: !serial,
                ..DecodeOptions::default()
            };
            robustness_cmd(&cli, image, options)
        }
        Command::Inspect { ref text } => inspect_cmd(&cli, text.as_deref()),
    }
}

fn setup_logger(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 if debug_enabled() => Level::Debug,
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    simple_logger::init_with_level(level).context("failed to initialize logger")?;
    info!("log level: {}", level);
    Ok(())
}

fn print_json<T: Serialize>(cli: &Cli, value: &T) -> Result<()> {
    let json = if cli.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

fn validate_text(text: &str) -> Result<()> {
    let chars = text.chars().count();
    if chars == 0 {
        bail!("text is empty");
    }
    if chars > MAX_TEXT_CHARS {
        bail!("text is {chars} characters, the limit is {MAX_TEXT_CHARS}");
    }
    Ok(())
}

fn encode_cmd(cli: &Cli, text: &str, output: &Path, size: Option<usize>, scale: u32) -> Result<()> {
    validate_text(text)?;
    let target = size.map(GridSize::new).transpose()?;
    let code = render(text, target, scale)?;
    save_png(&code.image, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let (width, height) = code.image.dimensions();
    let out = EncodeOutput {
        file: output.display().to_string(),
        size: code.size.get(),
        scale: code.scale,
        width,
        height,
        available_bytes: code.available_bytes,
        recovery_bytes: code.recovery_bytes,
        protection_ratio: code.protection_ratio(),
        channels: code
            .channels
            .iter()
            .map(|c| EncodedChannel {
                channel: c.channel.name(),
                payload_bytes: c.payload_bytes,
                recovery_bytes: c.plan.recovery_bytes,
                truncated: c.truncated,
            })
            .collect(),
    };

    if cli.json {
        return print_json(cli, &out);
    }
    println!("Wrote {} ({}x{} px)", out.file, width, height);
    println!("Grid: {} at {} px/module", code.size, code.scale);
    println!("Bytes per channel: {}", out.available_bytes);
    println!(
        "Recovery bytes: {} ({:.0}% protection)",
        out.recovery_bytes,
        out.protection_ratio * 100.0
    );
    for channel in &out.channels {
        println!(
            "  {:<8} {:>4} bytes, {} recovery{}",
            channel.channel,
            channel.payload_bytes,
            channel.recovery_bytes,
            if channel.truncated { ", truncated" } else { "" }
        );
    }
    Ok(())
}

fn load(image: &Path) -> Result<image::RgbaImage> {
    load_rgba(image).with_context(|| format!("failed to open image: {}", image.display()))
}

fn integrity_label(integrity: &PacketIntegrity) -> String {
    match integrity {
        PacketIntegrity::Verified => "verified".to_string(),
        PacketIntegrity::ChecksumMismatch { stored, computed } => {
            format!("checksum mismatch (stored {stored:08x}, computed {computed:08x})")
        }
        PacketIntegrity::MarkerMissing => "marker missing".to_string(),
        PacketIntegrity::Heuristic => "heuristic".to_string(),
        PacketIntegrity::Empty => "empty".to_string(),
    }
}

fn decode_output(file: &Path, decoded: Decoded) -> DecodeOutput {
    DecodeOutput {
        file: file.display().to_string(),
        scale: decoded.scale,
        size: decoded.size.get(),
        bytes_decoded: decoded.bytes_decoded,
        was_localized: decoded.was_localized,
        channels: decoded
            .channels
            .iter()
            .map(|c| ChannelOutput {
                channel: c.channel.name(),
                text: c.text.clone(),
                integrity: integrity_label(&c.integrity),
            })
            .collect(),
        text: decoded.text,
    }
}

fn decode_cmd(cli: &Cli, image: &Path, options: DecodeOptions) -> Result<()> {
    let raster = load(image)?;
    let decoded = Decoder::with_options(options)
        .decode(&raster)
        .with_context(|| format!("failed to decode {}", image.display()))?;
    let out = decode_output(image, decoded);

    if cli.json {
        return print_json(cli, &out);
    }
    println!("{}", out.text);
    println!(
        "Grid: {}x{} at {} px/module, {} bytes{}",
        out.size,
        out.size,
        out.scale,
        out.bytes_decoded,
        if out.was_localized { ", localized" } else { "" }
    );
    for channel in &out.channels {
        println!("  {:<8} {:<10} {:?}", channel.channel, channel.integrity, channel.text);
    }
    Ok(())
}

fn robustness_output(file: &Path, report: RobustnessReport) -> RobustnessOutput {
    RobustnessOutput {
        file: file.display().to_string(),
        consistent: report.consistent,
        successes: report.success_count(),
        runs: report
            .runs
            .into_iter()
            .map(|run| {
                let (text, error) = match run.outcome {
                    Ok(decoded) => (Some(decoded.text), None),
                    Err(err) => (None, Some(err.to_string())),
                };
                RunOutput {
                    threshold: run.threshold,
                    sensitivity: run.sensitivity.to_string(),
                    text,
                    error,
                }
            })
            .collect(),
        best: report.best,
    }
}

fn robustness_cmd(cli: &Cli, image: &Path, options: DecodeOptions) -> Result<()> {
    let raster = load(image)?;
    let report = Decoder::with_options(options).test_robustness(&raster);
    let out = robustness_output(image, report);

    if cli.json {
        return print_json(cli, &out);
    }
    for run in &out.runs {
        let result = match (&run.text, &run.error) {
            (Some(text), _) => format!("{text:?}"),
            (None, Some(error)) => format!("failed: {error}"),
            (None, None) => String::new(),
        };
        println!("  {:>3} ({:<9}) {}", run.threshold, run.sensitivity, result);
    }
    println!(
        "{} of {} thresholds decoded, {}",
        out.successes,
        out.runs.len(),
        if out.consistent { "consistent" } else { "inconsistent" }
    );
    if let Some(best) = &out.best {
        println!("Best: {best}");
    }
    Ok(())
}

fn inspect_cmd(cli: &Cli, text: Option<&str>) -> Result<()> {
    let Some(text) = text else {
        let rows: Vec<InspectRow> = capacity_table()
            .into_iter()
            .map(|row| InspectRow {
                size: row.size.get(),
                capacity: row.capacity,
                max_payload: row.max_payload,
            })
            .collect();
        if cli.json {
            return print_json(cli, &rows);
        }
        println!("{:>7} {:>9} {:>12}", "grid", "capacity", "max payload");
        for row in &rows {
            println!(
                "{:>7} {:>9} {:>12}",
                format!("{0}x{0}", row.size),
                row.capacity,
                row.max_payload
            );
        }
        return Ok(());
    };

    validate_text(text)?;
    let plans: Vec<PlanOutput> = split_channels(text)
        .iter()
        .zip(Channel::ORDER.map(Channel::name))
        .map(|(part, channel)| {
            let plan = SizePlan::for_payload(part.len());
            PlanOutput {
                channel,
                payload_bytes: part.len(),
                size: plan.size.get(),
                available_bytes: plan.available_bytes,
                recovery_bytes: plan.recovery_bytes,
            }
        })
        .collect();

    if cli.json {
        return print_json(cli, &plans);
    }
    for plan in &plans {
        println!(
            "  {:<8} {:>4} bytes -> {}x{}, {} available, {} recovery",
            plan.channel,
            plan.payload_bytes,
            plan.size,
            plan.size,
            plan.available_bytes,
            plan.recovery_bytes
        );
    }
    Ok(())
}

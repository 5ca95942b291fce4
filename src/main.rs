use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{info, warn};

use tiscap::capture::{CaptureConfig, CaptureOutput, CapturePipeline};
use tiscap::cli::{Args, CaptureArgs, Command};
use tiscap::grabber::{Grabber, GrabberLibrary};
use tiscap::logger;
use tiscap::output::TiffOutputConfig;

fn open_device(lib: &Arc<GrabberLibrary>, unique_name: &str) -> Result<Grabber> {
    let mut grabber = Grabber::new(lib.clone())?;
    grabber
        .open(unique_name)
        .with_context(|| format!("Failed to open device {unique_name:?}"))?;
    Ok(grabber)
}

fn list_devices(lib: &GrabberLibrary) -> Result<()> {
    let devices = lib.devices().context("Failed to enumerate devices")?;
    if devices.is_empty() {
        warn!("No devices found");
    }
    for device in devices {
        println!("{}\t{}\t{}", device.index, device.name, device.unique_name);
    }
    Ok(())
}

fn list_formats(lib: &Arc<GrabberLibrary>, unique_name: &str) -> Result<()> {
    let grabber = open_device(lib, unique_name)?;
    println!("Video formats:");
    for format in grabber.video_formats()? {
        println!("  {format}");
    }
    println!("Input channels:");
    for channel in grabber.input_channels()? {
        println!("  {channel}");
    }
    println!("Video norms:");
    for norm in grabber.video_norms()? {
        println!("  {norm}");
    }
    Ok(())
}

fn capture(lib: Arc<GrabberLibrary>, args: CaptureArgs) -> Result<()> {
    let grabber = match (&args.state, &args.device) {
        (Some(state), device) => Grabber::open_with_state(lib, state, device.as_deref())
            .with_context(|| format!("Failed to open device from {}", state.display()))?,
        (None, Some(device)) => open_device(&lib, device)?,
        (None, None) => bail!("Either --device or --state is required"),
    };

    if let Some(format) = &args.format {
        grabber
            .set_video_format(format)
            .with_context(|| format!("Failed to set video format {format:?}"))?;
    }
    if let Some(sink) = args.sink {
        grabber.set_sink_format(sink.into())?;
    }
    let (width, height) = grabber.video_format_size();
    info!("Video format {}x{}, sink {:?}", width, height, grabber.sink_format());

    let snap_timeout = u64::try_from(args.timeout_ms).ok().map(Duration::from_millis);
    let config = CaptureConfig::builder()
        .exposure(args.exposure)
        .gain(args.gain)
        .average(args.average)
        .hdr(args.hdr)
        .settle_frames(args.settle_frames)
        .snap_timeout(snap_timeout)
        .build()?;
    let output = TiffOutputConfig::builder()
        .compression(args.compression.into())
        .build();

    let mut pipeline = CapturePipeline::new(grabber, config).with_output_config(output);
    let (result, timings) = pipeline
        .capture_to_file_with_timings(&args.output)
        .with_context(|| format!("Capture to {} failed", args.output.display()))?;
    timings.log_summary();
    match result {
        CaptureOutput::Frame(frame) => info!(
            "Wrote {}x{} frame ({} channels) to {}",
            frame.width,
            frame.height,
            frame.channels,
            args.output.display()
        ),
        CaptureOutput::Hdr(hdr) => info!(
            "Wrote {}x{} HDR image to {}",
            hdr.width,
            hdr.height,
            args.output.display()
        ),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    let path = args.library.clone().unwrap_or_else(GrabberLibrary::default_path);
    info!("Loading {}", path.display());
    let lib = GrabberLibrary::open(&path, args.license_key.as_deref())
        .with_context(|| format!("Failed to initialize {}", path.display()))?;

    match args.command {
        Command::Devices => list_devices(&lib),
        Command::Formats { device } => list_formats(&lib, &device),
        Command::Capture(capture_args) => capture(lib, capture_args),
    }
}

use std::fs::File;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use tracing::{info, info_span, instrument, warn};

use crate::capture::average::average_frames;
use crate::capture::camera::{Camera, set_properties};
use crate::capture::exposure::ExposureTable;
use crate::capture::timing::{PipelineTimings, Timer};
use crate::capture::types::{CaptureConfig, CaptureOutput, Frame};
use crate::common::error::{CaptureError, Result};
use crate::grabber::Grabber;
use crate::hdr::MergeDebevec;
use crate::output::{ImageWriter, StandardTiffWriter, TiffOutputConfig};

/// Keeps the camera streaming and stops it when dropped.
struct LiveStream<'a, C: Camera> {
    camera: &'a mut C,
    stopped: bool,
}

impl<'a, C: Camera> LiveStream<'a, C> {
    fn start(camera: &'a mut C) -> Result<Self> {
        camera.start_stream()?;
        Ok(Self {
            camera,
            stopped: false,
        })
    }

    fn stop(mut self) -> Result<()> {
        self.stopped = true;
        self.camera.stop_stream()
    }
}

impl<C: Camera> Deref for LiveStream<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.camera
    }
}

impl<C: Camera> DerefMut for LiveStream<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.camera
    }
}

impl<C: Camera> Drop for LiveStream<'_, C> {
    fn drop(&mut self) {
        if !self.stopped {
            if let Err(e) = self.camera.stop_stream() {
                warn!("Failed to stop live stream: {}", e);
            }
        }
    }
}

fn settle<C: Camera>(camera: &mut C, config: &CaptureConfig) -> Result<()> {
    for _ in 0..config.settle_frames {
        camera.snap_frame(config.snap_timeout)?;
    }
    Ok(())
}

/// Sets exposure/gain, snaps and averages, optionally brackets and merges.
pub struct CapturePipeline<C: Camera, W: ImageWriter> {
    camera: C,
    writer: W,
    config: CaptureConfig,
    output: TiffOutputConfig,
}

impl CapturePipeline<Grabber, StandardTiffWriter> {
    pub fn new(grabber: Grabber, config: CaptureConfig) -> Self {
        Self {
            camera: grabber,
            writer: StandardTiffWriter,
            config,
            output: TiffOutputConfig::default(),
        }
    }
}

impl<C: Camera, W: ImageWriter> CapturePipeline<C, W> {
    pub fn with_custom(camera: C, writer: W, config: CaptureConfig) -> Self {
        Self {
            camera,
            writer,
            config,
            output: TiffOutputConfig::default(),
        }
    }

    pub fn with_output_config(mut self, output: TiffOutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn capture(&mut self) -> Result<CaptureOutput> {
        let (output, timings) = self.capture_with_timings()?;
        info!(
            "Capture complete in {:.3}ms",
            timings.total_duration().as_secs_f64() * 1000.0
        );
        Ok(output)
    }

    #[instrument(skip_all, fields(average = self.config.average, hdr = self.config.hdr))]
    pub fn capture_with_timings(&mut self) -> Result<(CaptureOutput, PipelineTimings)> {
        let mut timings = PipelineTimings::new();
        let config = &self.config;

        let timer = Timer::start("start_live");
        let mut live = LiveStream::start(&mut self.camera)?;
        timings.record(timer);

        let timer = Timer::start("set_properties");
        set_properties(&mut *live, config.exposure, config.gain)?;
        timings.record(timer);

        let output = if config.hdr {
            let (frames, table) = capture_bracket(&mut *live, config, &mut timings)?;

            let timer = Timer::start("stop_live");
            live.stop()?;
            timings.record(timer);

            let timer = Timer::start("merge");
            let hdr = MergeDebevec::new().process(&frames, table.times())?;
            timings.record(timer);
            CaptureOutput::Hdr(hdr)
        } else {
            settle(&mut *live, config)?;
            let timer = Timer::start("average");
            let frame = average_frames(&mut *live, config.average, config.snap_timeout, config.flip_vertical)?;
            timings.record(timer);

            let timer = Timer::start("stop_live");
            live.stop()?;
            timings.record(timer);
            CaptureOutput::Frame(frame)
        };

        Ok((output, timings))
    }

    /// Encodes a capture result with the pipeline's writer.
    pub fn write(&self, output: &CaptureOutput, sink: &mut dyn Write) -> Result<()> {
        match output {
            CaptureOutput::Frame(frame) => self.writer.write_frame(frame, sink, &self.output),
            CaptureOutput::Hdr(image) => self.writer.write_hdr(image, sink, &self.output),
        }
    }

    pub fn capture_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<CaptureOutput> {
        let (output, timings) = self.capture_to_file_with_timings(path)?;
        info!(
            "Capture complete in {:.3}ms",
            timings.total_duration().as_secs_f64() * 1000.0
        );
        Ok(output)
    }

    /// Captures and writes the result to `path`. The timings include the
    /// `write_output` step.
    pub fn capture_to_file_with_timings<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<(CaptureOutput, PipelineTimings)> {
        let path = path.as_ref();
        info!("Capturing to {}", path.display());

        let (output, mut timings) = self.capture_with_timings()?;

        let timer = Timer::start("write_output");
        let mut file = File::create(path)
            .map_err(|e| CaptureError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
        self.write(&output, &mut file)?;
        file.flush()?;
        timings.record(timer);

        Ok((output, timings))
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CaptureConfig) {
        self.config = config;
    }

    pub fn into_camera(self) -> C {
        self.camera
    }
}

/// Captures one averaged frame per entry of the exposure table, then restores
/// the reference exposure and any auto modes the bracket switched off.
fn capture_bracket<C: Camera>(
    camera: &mut C,
    config: &CaptureConfig,
    timings: &mut PipelineTimings,
) -> Result<(Vec<Frame>, ExposureTable)> {
    let exposure = camera.exposure()?;
    let gain = camera.gain()?;
    let auto_exposure = camera.auto_exposure()?;
    let auto_gain = camera.auto_gain()?;
    let table = ExposureTable::around(exposure)?;
    info!(reference = exposure, gain, "Bracketing exposures {:?}", table.times());

    let mut bracket = || -> Result<Vec<Frame>> {
        let mut frames = Vec::with_capacity(table.times().len());
        for &time in table.times() {
            let _span = info_span!("exposure", seconds = time).entered();
            set_properties(camera, time, gain)?;
            settle(camera, config)?;
            let timer = Timer::start("average");
            frames.push(average_frames(camera, config.average, config.snap_timeout, config.flip_vertical)?);
            timings.record(timer);
        }
        Ok(frames)
    };
    let frames = bracket();
    let restored = restore_settings(camera, table.reference(), auto_exposure, auto_gain);
    let frames = frames?;
    restored?;
    Ok((frames, table))
}

fn restore_settings<C: Camera>(camera: &mut C, exposure: f32, auto_exposure: bool, auto_gain: bool) -> Result<()> {
    camera.set_exposure(exposure)?;
    if auto_exposure {
        camera.set_auto_exposure(true)?;
    }
    if auto_gain {
        camera.set_auto_gain(true)?;
    }
    Ok(())
}

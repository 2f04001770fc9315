use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::Level;
use serde::Serialize;

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;
use crate::timestamp::time_str;
use iec61937::process::encapsulate::{Encapsulator, Status};
use iec61937::process::extract::{Extractor, StreamInfo};
use iec61937::process::{ByteOrder, Codec};
use iec61937::structs::frame::Frame;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let codec = Codec::from(args.codec);
    log::info!("Analyzing {codec} stream: {}", args.input.display());

    let summary = analyze_stream(&args.input, codec, cli, multi)?;

    if args.yaml {
        print!("{}", serde_yaml_ng::to_string(&summary)?);
    } else if summary.frames == 0 {
        println!("No {codec} frames found in the input.");
    } else {
        display_summary(&summary);
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct StreamSummary {
    codec: String,
    sample_rate: Option<u32>,
    channels: Option<u8>,
    frames: usize,
    samples: u64,
    duration: String,
    size_bytes: usize,
    average_bitrate_kbps: Option<f64>,
    skipped_regions: usize,
    spdif: SpdifSummary,
}

#[derive(Debug, Serialize)]
struct SpdifSummary {
    sample_rate: Option<u32>,
    channels: Option<u16>,
    burst_size: Option<usize>,
    bursts: usize,
    frames_dropped: usize,
}

fn analyze_stream(
    input_path: &std::path::Path,
    codec: Codec,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<StreamSummary> {
    let mut input_reader = InputReader::new(input_path)?;
    let mut extractor = Extractor::new(codec);

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };
    extractor.set_fail_level(fail_level);

    let mut context = AnalysisContext::new(codec);

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Analyzing frames...");
        context.pb = Some(pb);
    }

    input_reader.process_chunks(64 * 1024, |chunk| {
        context.total_bytes += chunk.len();
        extractor.push_bytes(chunk);

        for frame_result in extractor.by_ref() {
            context.process_frame(frame_result?, cli)?;
        }

        Ok(true)
    })?;
    extractor.finish()?;

    Ok(context.into_summary(&extractor))
}

struct AnalysisContext {
    encapsulator: Encapsulator,
    samples: u64,
    burst_size: Option<usize>,
    bursts: usize,
    frames_dropped: usize,
    total_bytes: usize,
    pb: Option<ProgressBar>,
}

impl AnalysisContext {
    fn new(codec: Codec) -> Self {
        Self {
            encapsulator: Encapsulator::new(codec, ByteOrder::Little),
            samples: 0,
            burst_size: None,
            bursts: 0,
            frames_dropped: 0,
            total_bytes: 0,
            pb: None,
        }
    }

    fn process_frame(&mut self, frame: Frame, cli: &Cli) -> Result<()> {
        self.samples += frame.samples as u64;
        let frame_index = self.encapsulator.frames_processed();

        match self.encapsulator.push(frame) {
            Ok(Status::Complete(packet)) => {
                self.bursts += 1;
                self.burst_size.get_or_insert(packet.data.len());
            }
            Ok(Status::NeedMoreData) => {}
            Err(e) => {
                if cli.strict {
                    return Err(e.into());
                }
                self.frames_dropped += 1;
                log::warn!("Frame {frame_index} cannot be wrapped: {e}");
            }
        }

        let frames = self.encapsulator.frames_processed();
        if frames.is_multiple_of(100) {
            if let Some(ref pb) = self.pb {
                pb.set_message(format!("Analyzing frames...       {frames}"));
                pb.tick();
            }
        }

        Ok(())
    }

    fn into_summary(self, extractor: &Extractor) -> StreamSummary {
        if let Some(ref pb) = self.pb {
            pb.finish_and_clear();
        }

        let codec = extractor.codec();
        let stream = extractor.stream_info();
        let sample_rate = stream.map(|info: StreamInfo| info.sample_rate);
        let spdif_layout = sample_rate.map(|rate| codec.spdif_layout(rate));

        let duration_secs = sample_rate
            .filter(|&rate| rate > 0)
            .map(|rate| self.samples as f64 / rate as f64);
        let average_bitrate_kbps = duration_secs
            .filter(|&secs| secs > 0.0)
            .map(|secs| (self.total_bytes as f64 * 8.0 / (secs * 1000.0) * 10.0).round() / 10.0);

        StreamSummary {
            codec: codec.to_string(),
            sample_rate,
            channels: stream.and_then(|info| info.channels),
            frames: extractor.frames_processed(),
            samples: self.samples,
            duration: time_str(self.samples, sample_rate.unwrap_or(0)),
            size_bytes: self.total_bytes,
            average_bitrate_kbps,
            skipped_regions: extractor.error_count(),
            spdif: SpdifSummary {
                sample_rate: spdif_layout.map(|(rate, _)| rate),
                channels: spdif_layout.map(|(_, channels)| channels),
                burst_size: self.burst_size,
                bursts: self.bursts,
                frames_dropped: self.frames_dropped,
            },
        }
    }
}

fn display_summary(summary: &StreamSummary) {
    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| "unknown".to_string());

    println!();
    println!("{} Stream Information", summary.codec);
    println!("=========================");
    println!();

    println!("Stream Information");
    println!(
        "  Sampling rate             {}",
        or_unknown(summary.sample_rate.map(|rate| format!("{rate} Hz")))
    );
    println!(
        "  Channels                  {}",
        or_unknown(summary.channels.map(|channels| channels.to_string()))
    );
    println!("  Frames                    {}", summary.frames);
    println!("  Duration                  {}", summary.duration);
    let size_mb = summary.size_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        summary.size_bytes
    );
    if let Some(rate) = summary.average_bitrate_kbps {
        println!("  Average data rate         {rate:.1} kbps");
    }
    if summary.skipped_regions > 0 {
        println!("  Skipped regions           {}", summary.skipped_regions);
    }
    println!();

    let spdif = &summary.spdif;
    println!("IEC 61937 Output");
    println!(
        "  Link rate                 {}",
        or_unknown(spdif.sample_rate.map(|rate| format!("{rate} Hz")))
    );
    println!(
        "  Link channels             {}",
        or_unknown(spdif.channels.map(|channels| channels.to_string()))
    );
    println!(
        "  Burst size                {}",
        or_unknown(spdif.burst_size.map(|size| format!("{size} bytes")))
    );
    println!("  Bursts                    {}", spdif.bursts);
    if spdif.frames_dropped > 0 {
        println!("  Frames not wrappable      {}", spdif.frames_dropped);
    }
    println!();
}

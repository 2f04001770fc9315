use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{Level, info, warn};

use super::command::{Cli, OutputFormat, WrapArgs};
use crate::input::InputReader;
use crate::timestamp::time_str;
use crate::wav::WAVWriter;
use iec61937::process::encapsulate::{Encapsulator, Status};
use iec61937::process::extract::{Extractor, StreamInfo};
use iec61937::process::{ByteOrder, Codec};
use iec61937::structs::frame::{Frame, Packet};

pub(crate) fn create_path_with_extension(base_path: &Path, expected_ext: &str) -> PathBuf {
    match base_path.extension() {
        Some(existing_ext) if existing_ext == expected_ext => base_path.to_path_buf(),
        Some(_) => {
            let mut name = base_path.file_name().unwrap_or_default().to_os_string();
            name.push(".");
            name.push(expected_ext);
            base_path.with_file_name(name)
        }
        None => base_path.with_extension(expected_ext),
    }
}

enum BurstSink {
    Raw(BufWriter<File>),
    Wav(WAVWriter<File>),
}

impl BurstSink {
    fn open(
        file: File,
        format: OutputFormat,
        codec: Codec,
        stream: Option<StreamInfo>,
    ) -> Result<Self> {
        match format {
            OutputFormat::Raw => Ok(Self::Raw(BufWriter::new(file))),
            OutputFormat::Wav => {
                let stream_rate = stream
                    .map(|info| info.sample_rate)
                    .ok_or_else(|| anyhow!("Stream sample rate unknown, cannot write WAV header"))?;
                let (rate, channels) = codec.spdif_layout(stream_rate);
                info!("WAV output: {rate} Hz, {channels} channels, 16-bit");

                let mut writer = WAVWriter::new(file, rate, channels);
                writer.write_header()?;
                Ok(Self::Wav(writer))
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Raw(writer) => writer.write_all(data)?,
            Self::Wav(writer) => writer.write_data(data)?,
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Self::Raw(mut writer) => writer.flush()?,
            Self::Wav(mut writer) => writer.finish()?,
        }
        Ok(())
    }
}

pub fn cmd_wrap(args: &WrapArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let codec = Codec::from(args.codec);
    let mut order = ByteOrder::from(args.byte_order);
    if args.format == OutputFormat::Wav && order != ByteOrder::Little {
        warn!("WAV data is little-endian, ignoring --byte-order be");
        order = ByteOrder::Little;
    }

    let output_path = create_path_with_extension(&args.output_path, args.format.extension());

    let mut input_reader = InputReader::new(&args.input)?;
    if input_reader.is_pipe() {
        info!("Reading {codec} stream from stdin");
    } else {
        info!("Reading {codec} stream: {}", args.input.display());
    }

    let fail_level = if cli.strict {
        Level::Warn
    } else {
        Level::Error
    };

    let mut extractor = Extractor::new(codec);
    extractor.set_fail_level(fail_level);

    let mut context = WrapContext {
        encapsulator: Encapsulator::new(codec, order),
        format: args.format,
        strict: cli.strict,
        file: Some(File::create(&output_path)?),
        sink: None,
        pb: None,
        bytes_written: 0,
        spdif_samples: 0,
        frames_dropped: 0,
    };

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Wrapping frames...");
        context.pb = Some(pb);
    }

    input_reader.process_chunks(64 * 1024, |chunk| {
        extractor.push_bytes(chunk);

        let frames = extractor.by_ref().collect::<Result<Vec<_>, _>>()?;
        let stream = extractor.stream_info();
        for frame in frames {
            context.push(frame, stream)?;
        }

        Ok(true)
    })?;
    extractor.finish()?;

    context.finish(&output_path, extractor.stream_info())
}

struct WrapContext {
    encapsulator: Encapsulator,
    format: OutputFormat,
    strict: bool,
    file: Option<File>,
    sink: Option<BurstSink>,
    pb: Option<ProgressBar>,
    bytes_written: u64,
    spdif_samples: u64,
    frames_dropped: usize,
}

impl WrapContext {
    fn push(&mut self, frame: Frame, stream: Option<StreamInfo>) -> Result<()> {
        let frame_index = self.encapsulator.frames_processed();

        match self.encapsulator.push(frame) {
            Ok(Status::Complete(packet)) => self.write_packet(&packet, stream)?,
            Ok(Status::NeedMoreData) => {}
            Err(e) if self.strict || e.is_contract_violation() => {
                return Err(anyhow!(e).context(format!("Frame {frame_index}")));
            }
            Err(e) => {
                self.frames_dropped += 1;
                warn!("Frame {frame_index} dropped: {e}");
            }
        }

        Ok(())
    }

    fn write_packet(&mut self, packet: &Packet, stream: Option<StreamInfo>) -> Result<()> {
        if self.sink.is_none() {
            let file = self
                .file
                .take()
                .ok_or_else(|| anyhow!("Output file already consumed"))?;
            self.sink = Some(BurstSink::open(
                file,
                self.format,
                self.encapsulator.codec(),
                stream,
            )?);
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.write(&packet.data)?;
        }

        self.bytes_written += packet.data.len() as u64;
        self.spdif_samples += packet.samples as u64;

        let packets = self.encapsulator.packets_emitted();
        if packets.is_multiple_of(100) {
            if let Some(ref pb) = self.pb {
                pb.set_message(format!("Wrapping frames...        {packets} bursts"));
                pb.tick();
            }
        }

        Ok(())
    }

    fn finish(mut self, output_path: &Path, stream: Option<StreamInfo>) -> Result<()> {
        if let Some(ref pb) = self.pb {
            pb.finish_and_clear();
        }

        if self.encapsulator.is_building() {
            warn!("Discarding incomplete final burst");
            self.encapsulator.flush();
        }

        let Some(sink) = self.sink.take() else {
            bail!("No complete bursts could be built from the input");
        };
        sink.finish()?;

        let codec = self.encapsulator.codec();
        let link_rate = stream.map_or(0, |info| codec.spdif_layout(info.sample_rate).0);

        info!("Output written to {}", output_path.display());
        info!(
            "{} frames in {} bursts, {} bytes, duration {}",
            self.encapsulator.frames_processed(),
            self.encapsulator.packets_emitted(),
            self.bytes_written,
            time_str(self.spdif_samples, link_rate)
        );
        if self.frames_dropped > 0 {
            warn!("{} frames were dropped", self.frames_dropped);
        }

        Ok(())
    }
}

//! Chain negotiation command.
//!
//! Builds a chain from command-line options or a preset, negotiates it,
//! prints the resulting chain and optionally pumps a test tone through it.

use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use cadena_config::build_chain;
use cadena_core::{AudioFormat, AudioFrame, ChainEvent, FilterChain, OutputStatus};
use cadena_registry::FilterCatalog;
use clap::Args;
use serde::Serialize;

use super::common::{ChainArgs, describe_event};

const TONE_HZ: f32 = 440.0;

#[derive(Args)]
pub struct NegotiateArgs {
    #[command(flatten)]
    chain: ChainArgs,

    /// Number of test frames to pump through the chain
    #[arg(long, default_value_t = 0)]
    frames: usize,

    /// Samples per channel in each test frame
    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    frame_size: u32,

    /// Print machine-readable JSON instead of the chain dump
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct NodeReport {
    name: String,
    label: Option<String>,
    auto: bool,
    output: String,
}

#[derive(Serialize, Default)]
struct PumpReport {
    frames_in: usize,
    samples_in: u64,
    frames_out: usize,
    samples_out: u64,
    seconds_out: f64,
    peak: f32,
}

#[derive(Serialize)]
struct Report {
    input: String,
    output: String,
    delay: f64,
    filters: Vec<NodeReport>,
    events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pump: Option<PumpReport>,
}

pub fn run(args: NegotiateArgs) -> anyhow::Result<()> {
    let catalog = FilterCatalog::new();
    let registry = catalog.registry();

    let preset = args.chain.to_preset("command line", &registry)?;
    let input = preset.input_format()?.ok_or_else(|| {
        anyhow::anyhow!("No input format: pass --input or a preset that names one")
    })?;

    let mut chain = build_chain(&preset, registry)?;
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    chain.set_event_handler(move |event: &ChainEvent| {
        if let Ok(mut list) = sink.lock() {
            list.push(describe_event(event));
        }
    });
    chain.set_input_format(input);
    chain.init().context("Negotiation failed")?;

    let pump = if args.frames > 0 {
        Some(pump_tone(&mut chain, input, args.frames, args.frame_size as usize)?)
    } else {
        None
    };

    let events = events.lock().map(|l| l.clone()).unwrap_or_default();
    if args.json {
        let report = Report {
            input: chain.input_format().spec_string(),
            output: chain.output_format().spec_string(),
            delay: chain.calc_delay(),
            filters: chain
                .filters()
                .into_iter()
                .map(|id| NodeReport {
                    name: chain.name(id).unwrap_or("?").to_string(),
                    label: chain.label(id).map(String::from),
                    auto: chain.is_auto_inserted(id),
                    output: chain
                        .node_output(id)
                        .map(|f| f.spec_string())
                        .unwrap_or_default(),
                })
                .collect(),
            events,
            pump,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{chain}");
    for event in &events {
        println!("note: {event}");
    }
    println!("delay: {:.3} ms", chain.calc_delay() * 1000.0);
    if let Some(p) = pump {
        println!(
            "pumped {} frames ({} samples) in, {} frames ({} samples, {:.3} s) out, peak {:.3}",
            p.frames_in, p.samples_in, p.frames_out, p.samples_out, p.seconds_out, p.peak
        );
    }
    Ok(())
}

/// A sine tone on every channel, or silence for passthrough formats.
fn tone_frame(format: AudioFormat, start: u64, samples: usize) -> anyhow::Result<AudioFrame> {
    if format.is_passthrough() {
        return Ok(AudioFrame::silence(format, samples)?);
    }
    let channels = format.channels.len();
    let step = TAU * TONE_HZ / format.rate as f32;
    let mut data = Vec::with_capacity(samples * channels);
    for i in 0..samples {
        let phase = ((start + i as u64) as f32 * step) % TAU;
        let s = 0.5 * phase.sin();
        data.extend(std::iter::repeat_n(s, channels));
    }
    Ok(AudioFrame::from_f32(format, &data)?)
}

fn drain(chain: &mut FilterChain, eof: bool, report: &mut PumpReport) -> anyhow::Result<()> {
    while chain.output_frame(eof)? == OutputStatus::Available {
        let Some(frame) = chain.read_output_frame() else {
            break;
        };
        report.frames_out += 1;
        report.samples_out += frame.samples() as u64;
        report.seconds_out += frame.duration();
        if !frame.format().is_passthrough() {
            let peak = frame.to_f32()?.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            report.peak = report.peak.max(peak);
        }
    }
    Ok(())
}

fn pump_tone(
    chain: &mut FilterChain,
    input: AudioFormat,
    frames: usize,
    frame_size: usize,
) -> anyhow::Result<PumpReport> {
    let mut report = PumpReport::default();
    let mut position = 0u64;
    for _ in 0..frames {
        let frame = tone_frame(input, position, frame_size)?;
        position += frame_size as u64;
        report.frames_in += 1;
        report.samples_in += frame_size as u64;
        chain.filter_frame(frame)?;
        drain(chain, false, &mut report)?;
    }
    drain(chain, true, &mut report)?;
    tracing::debug!(
        "negotiate_pump: {} samples in, {} samples out",
        report.samples_in,
        report.samples_out
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::{ChannelMap, SampleFormat};

    #[test]
    fn tone_is_the_same_on_every_channel() {
        let format = AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000);
        let frame = tone_frame(format, 0, 64).unwrap();
        let samples = frame.to_f32().unwrap();
        assert_eq!(samples.len(), 128);
        for pair in samples.chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
            assert!(pair[0].abs() <= 0.5);
        }
        assert_eq!(samples[0], 0.0);
    }

    #[test]
    fn passthrough_tone_is_silence() {
        let format = AudioFormat::new(SampleFormat::SpdifAc3, ChannelMap::STEREO, 48000);
        let frame = tone_frame(format, 0, 32).unwrap();
        assert_eq!(frame.samples(), 32);
    }
}

use std::time::Instant;

use clap::{Parser, ValueEnum};
use hound::{WavReader, WavWriter};
use simd_iir::{Cascade, Coefficients, Filter, InitialConditions, Strategy, is_supported_width};

mod logger;
use logger::ColorLogger;

#[derive(Parser, Debug)]
#[command(name = "iirfilter")]
#[command(about = "Run signals through a cascade of second-order IIR sections", long_about = None)]
struct Cli {
    /// SIMD lane count.
    #[arg(long, default_value_t = 8, value_parser = parse_width)]
    width: usize,
    #[arg(long, value_enum, default_value_t = StrategyArg::MultiBlock)]
    strategy: StrategyArg,
    /// One section as `b1,b2,a1,a2`. Repeat for a cascade, first section first.
    #[arg(
        long = "stage",
        value_name = "B1,B2,A1,A2",
        value_parser = parse_stage,
        allow_hyphen_values = true
    )]
    stages: Vec<[f32; 4]>,
    /// Length of the impulse filtered when no input file is given.
    #[arg(long, value_name = "SAMPLES", default_value_t = 1_000_000)]
    samples: usize,
    #[arg(long, requires = "output")]
    input: Option<String>,
    #[arg(long, requires = "input")]
    output: Option<String>,
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Scalar,
    Block,
    Mixed,
    MultiBlock,
}

impl From<StrategyArg> for Strategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Scalar => Strategy::Scalar,
            StrategyArg::Block => Strategy::Block,
            StrategyArg::Mixed => Strategy::Mixed,
            StrategyArg::MultiBlock => Strategy::MultiBlock,
        }
    }
}

/// Section used when no `--stage` is given.
const DEFAULT_STAGE: [f32; 4] = [0.1, -0.5, 0.2, 0.3];

fn parse_width(value: &str) -> Result<usize, String> {
    let width: usize = value
        .parse()
        .map_err(|_| format!("Invalid width: {value}"))?;
    if !is_supported_width(width) {
        return Err(format!("Invalid width: {width}. Must be 4, 8, or 16"));
    }
    Ok(width)
}

fn parse_stage(value: &str) -> Result<[f32; 4], String> {
    let parts: Vec<f32> = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|error| format!("Invalid stage '{value}': {error}"))?;

    <[f32; 4]>::try_from(parts.as_slice())
        .map_err(|_| format!("Invalid stage '{value}': expected 4 values b1,b2,a1,a2"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = ColorLogger::new(cli.quiet, cli.verbose).init() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }

    match cli.width {
        4 => run::<4>(&cli),
        8 => run::<8>(&cli),
        16 => run::<16>(&cli),
        width => {
            log::error!("Unsupported width: {width}");
            std::process::exit(1);
        }
    }
}

fn build_filter<const W: usize>(cli: &Cli) -> Filter<f32, W> {
    let stages = if cli.stages.is_empty() {
        vec![DEFAULT_STAGE]
    } else {
        cli.stages.clone()
    };

    let sections: Vec<_> = stages
        .iter()
        .map(|&[b1, b2, a1, a2]| {
            (
                Coefficients::new(b1, b2, a1, a2),
                InitialConditions::default(),
            )
        })
        .collect();

    let cascade = match Cascade::<f32, W>::from_sections(&sections) {
        Ok(cascade) => cascade,
        Err(error) => {
            log::error!("Failed to build cascade: {error}");
            std::process::exit(1);
        }
    };

    for (index, [b1, b2, a1, a2]) in stages.iter().enumerate() {
        log::info!("Stage {index}: b1={b1}, b2={b2}, a1={a1}, a2={a2}");
    }

    Filter::new(cascade, cli.strategy.into())
}

fn run<const W: usize>(cli: &Cli) {
    let filter = build_filter::<W>(cli);
    log::info!(
        "Width {W}, strategy {:?}, {} samples per step",
        filter.strategy(),
        filter.granularity()
    );

    match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => filter_wav(filter, input, output),
        _ => filter_impulse(filter, cli.samples),
    }
}

/// Filters a unit impulse and reports the elapsed time.
fn filter_impulse<const W: usize>(mut filter: Filter<f32, W>, samples: usize) {
    let mut signal = vec![0.0f32; samples];
    if let Some(first) = signal.first_mut() {
        *first = 1.0;
    }

    let start = Instant::now();
    let processed = filter.process_in_place(&mut signal);
    let elapsed = start.elapsed();

    if processed < samples {
        log::warn!(
            "{} trailing samples left unfiltered (not a multiple of {})",
            samples - processed,
            filter.granularity()
        );
    }

    let size_mib = (processed * size_of::<f32>()) as f64 / (1024.0 * 1024.0);
    println!(
        "Filtered {processed} samples in {} ns ({:.2} MiB/s)",
        elapsed.as_nanos(),
        size_mib / elapsed.as_secs_f64()
    );

    for (n, value) in signal.iter().take(8).enumerate() {
        log::debug!("y[{n}] = {value}");
    }
}

/// Filters every channel of a WAV file with its own copy of `filter`.
fn filter_wav<const W: usize>(filter: Filter<f32, W>, input_path: &str, output_path: &str) {
    let mut reader = match WavReader::open(input_path) {
        Ok(reader) => reader,
        Err(error) => {
            log::error!("Failed to open {input_path}: {error}");
            std::process::exit(1);
        }
    };
    let spec = reader.spec();
    let channels = spec.channels as usize;

    log::info!(
        "Input: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let samples: Result<Vec<f32>, _> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let max_value = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect()
        }
    };
    let samples = match samples {
        Ok(samples) => samples,
        Err(error) => {
            log::error!("Failed to read {input_path}: {error}");
            std::process::exit(1);
        }
    };

    let frames = samples.len() / channels;
    let granularity = filter.granularity();
    let padded = frames.div_ceil(granularity) * granularity;

    let start = Instant::now();
    let mut planar: Vec<Vec<f32>> = (0..channels)
        .map(|channel| {
            let mut data = vec![0.0f32; padded];
            for (frame, value) in data.iter_mut().take(frames).enumerate() {
                *value = samples[frame * channels + channel];
            }
            data
        })
        .collect();

    for data in planar.iter_mut() {
        let mut channel_filter = filter.clone();
        channel_filter.process_in_place(data);
    }
    let elapsed = start.elapsed();

    println!(
        "Filtering {frames} frames took {:.3} ms",
        elapsed.as_secs_f64() * 1000.0
    );

    let output_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let result = WavWriter::create(output_path, output_spec).and_then(|mut writer| {
        for frame in 0..frames {
            for data in &planar {
                writer.write_sample(data[frame])?;
            }
        }
        writer.finalize()
    });

    match result {
        Ok(()) => println!("Done! Written to {output_path}"),
        Err(error) => {
            log::error!("Failed to write {output_path}: {error}");
            std::process::exit(1);
        }
    }
}

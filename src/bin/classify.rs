//! Classify a feature table with a persisted forest, printing one label per
//! line on standard output.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use canopy::data::tables::read_points;
use canopy::io::read_model_header;
use canopy::{EnsembleClassifier, Feature, ForestFileReader, PointsView, ScalarKind};

const USAGE: &str = "\
Usage:

   classify [options] <model file> <data input file>

 Options:

   -t <thread count> : Number of threads (default: 1).
   -p <preload count>: Number of trees to preload (default: 1).";

struct Options {
    model_file: PathBuf,
    data_file: PathBuf,
    thread_count: usize,
    preload: usize,
}

fn parse_flag_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, String> {
    args.next()
        .ok_or_else(|| format!("Missing parameter to {flag} option."))?
        .parse()
        .map_err(|_| format!("Invalid parameter to {flag} option."))
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut thread_count = 1usize;
    let mut preload = 1usize;
    let mut positional = Vec::new();

    while let Some(token) = args.next() {
        match token.as_str() {
            "-t" => thread_count = parse_flag_value(&mut args, "-t")?,
            "-p" => preload = parse_flag_value(&mut args, "-p")?,
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ => positional.push(token),
        }
    }

    let [model_file, data_file]: [String; 2] =
        positional.try_into().map_err(|_| USAGE.to_string())?;

    Ok(Options {
        model_file: model_file.into(),
        data_file: data_file.into(),
        thread_count,
        preload,
    })
}

fn classify_as<F: Feature>(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let (data, feature_count) = read_points::<F>(&options.data_file)?;
    let points = PointsView::new(&data, feature_count)?;

    let mut stream = ForestFileReader::<F>::open(&options.model_file, options.preload)?;
    // The calling thread counts as one of the requested threads.
    let workers = options.thread_count.saturating_sub(1);
    let mut ensemble = EnsembleClassifier::new(&mut stream, workers);
    let labels = ensemble.classify(points)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for label in labels {
        writeln!(out, "{label}")?;
    }
    Ok(())
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_model_header(&options.model_file)?;
    match header.scalar {
        ScalarKind::F32 => classify_as::<f32>(options),
        ScalarKind::F64 => classify_as::<f64>(options),
    }
}

fn main() -> ExitCode {
    let options = match parse_options(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(error) = run(&options) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

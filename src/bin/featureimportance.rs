//! Estimate per-feature importance of a persisted forest by permutation.

use std::path::PathBuf;
use std::process::ExitCode;

use canopy::data::tables::{read_labels, read_points};
use canopy::io::read_model_header;
use canopy::{
    feature_importances, EnsembleClassifier, Feature, ForestFileReader, PointsView, ScalarKind,
};

const USAGE: &str = "\
Usage:

   featureimportance [options] <model file> <data input file> <label input file>

 Options:

   -t <thread count> : Number of threads (default: 1).
   -p <preload count>: Number of trees to preload (default: 1).
   -r <repeats>      : Number of repeats used to determine feature importance
                       (default: 5).";

/// Shuffle seed for the permutation loop; fixed so repeated runs agree.
const SHUFFLE_SEED: u64 = 42;

struct Options {
    model_file: PathBuf,
    data_file: PathBuf,
    label_file: PathBuf,
    thread_count: usize,
    preload: usize,
    repeats: usize,
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
    let mut repeats = 5usize;
    let mut positional = Vec::new();

    while let Some(token) = args.next() {
        match token.as_str() {
            "-t" => thread_count = parse_flag_value(&mut args, "-t")?,
            "-p" => preload = parse_flag_value(&mut args, "-p")?,
            "-r" => {
                repeats = parse_flag_value(&mut args, "-r")?;
                if repeats < 1 {
                    return Err("Repeat count must be positive.".to_string());
                }
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ => positional.push(token),
        }
    }

    let [model_file, data_file, label_file]: [String; 3] =
        positional.try_into().map_err(|_| USAGE.to_string())?;

    Ok(Options {
        model_file: model_file.into(),
        data_file: data_file.into(),
        label_file: label_file.into(),
        thread_count,
        preload,
        repeats,
    })
}

fn importance_as<F: Feature>(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let (data, feature_count) = read_points::<F>(&options.data_file)?;
    let labels = read_labels(&options.label_file)?;
    let points = PointsView::new(&data, feature_count)?;

    let mut stream = ForestFileReader::<F>::open(&options.model_file, options.preload)?;
    let workers = options.thread_count.saturating_sub(1);
    let mut ensemble = EnsembleClassifier::new(&mut stream, workers);

    let importances =
        feature_importances(&mut ensemble, points, &labels, options.repeats, SHUFFLE_SEED)?;
    for (feature, importance) in importances.iter().enumerate() {
        println!("feature {feature}: {importance:.6}");
    }
    Ok(())
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let header = read_model_header(&options.model_file)?;
    match header.scalar {
        ScalarKind::F32 => importance_as::<f32>(options),
        ScalarKind::F64 => importance_as::<f64>(options),
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

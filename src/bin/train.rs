//! Train a random forest on a feature table and a label table.

use std::path::PathBuf;
use std::process::ExitCode;

use canopy::data::tables::{read_labels, read_points};
use canopy::{
    ClassifierOutputStream, ForestFileWriter, ForestTrainer, ForestTrainerParams,
    LabelFrequencyTable, PointsView,
};

const USAGE: &str = "\
Usage:

   train [options] <data input file> <label input file> <model output file>

 Options:

   -t <thread count>: Number of threads (default: 1).
   -d <max depth>   : Maximum tree depth (default: unlimited).
   -p <min purity>  : Minimum Gini purity of grown leaves (default: 1).
   -c <tree count>  : Number of trees (default: 150).
   -s <random seed> : Random seed (default: 42).
   -f <count>       : Number of (randomly selected) features to consider per
                      split (default: floor(sqrt(feature count))).
   -g               : Generates Graphviz/Dotty files of all trees.";

struct Options {
    data_file: PathBuf,
    label_file: PathBuf,
    model_file: PathBuf,
    thread_count: usize,
    max_depth: u32,
    min_purity: f64,
    tree_count: u32,
    seed: u64,
    features_to_consider: usize,
    write_graphviz: bool,
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
    let mut thread_count = 1;
    let mut max_depth = u32::MAX;
    let mut min_purity = 1.0;
    let mut tree_count = 150;
    let mut seed = 42;
    let mut features_to_consider = 0;
    let mut write_graphviz = false;
    let mut positional = Vec::new();

    while let Some(token) = args.next() {
        match token.as_str() {
            "-t" => thread_count = parse_flag_value(&mut args, "-t")?,
            "-d" => max_depth = parse_flag_value(&mut args, "-d")?,
            "-p" => min_purity = parse_flag_value(&mut args, "-p")?,
            "-c" => tree_count = parse_flag_value(&mut args, "-c")?,
            "-s" => seed = parse_flag_value(&mut args, "-s")?,
            "-f" => features_to_consider = parse_flag_value(&mut args, "-f")?,
            "-g" => write_graphviz = true,
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ => positional.push(token),
        }
    }

    let [data_file, label_file, model_file]: [String; 3] = positional
        .try_into()
        .map_err(|_| USAGE.to_string())?;

    Ok(Options {
        data_file: data_file.into(),
        label_file: label_file.into(),
        model_file: model_file.into(),
        thread_count,
        max_depth,
        min_purity,
        tree_count,
        seed,
        features_to_consider,
        write_graphviz,
    })
}

fn run(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let (data, feature_count) = read_points::<f64>(&options.data_file)?;
    let labels = read_labels(&options.label_file)?;
    let points = PointsView::new(&data, feature_count)?;
    let class_count = LabelFrequencyTable::from_labels(&labels).class_count() as u32;

    let trainer = ForestTrainer::new(ForestTrainerParams {
        tree_count: options.tree_count,
        features_to_consider: options.features_to_consider,
        max_depth: options.max_depth,
        impurity_threshold: (1.0 - options.min_purity).clamp(0.0, 1.0),
        thread_count: options.thread_count,
        seed: options.seed,
        graphviz_dir: options.write_graphviz.then(|| PathBuf::from(".")),
        ..Default::default()
    });

    let mut writer =
        ForestFileWriter::<f64>::create(&options.model_file, class_count, feature_count as u32)?;
    trainer.train(points, &labels, &mut writer)?;
    writer.close()?;
    Ok(())
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
        // Leave no partial model behind.
        let _ = std::fs::remove_file(&options.model_file);
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

//! riskprep: credit-risk preprocessing CLI
//!
//! Loads a loan-level dataset, splits it into train and test, bins and
//! encodes every predictor with the train-fitted bins, prunes correlated
//! predictors and writes both partitions.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use riskprep::cli::{confirm_write_outputs, Cli};
use riskprep::pipeline::{
    load_dataset, output_paths, report_path, run_pipeline, save_dataset, PreparedData,
    PreprocessingStrategy,
};
use riskprep::report::{BinningReport, PipelineSummary};
use riskprep::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count,
    print_info, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.pipeline_config().context("Invalid configuration")?;
    let classifier = cli.column_classifier()?;
    let output_dir = cli.output_dir();
    let target = config.target_label_column.clone();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&cli.input, &output_dir, &config);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading dataset...");
    let mut df = load_dataset(&cli.input, cli.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");

    if !cli.drop_columns.is_empty() {
        let present: Vec<String> = cli
            .drop_columns
            .iter()
            .filter(|c| df.column(c.as_str()).is_ok())
            .cloned()
            .collect();
        if present.contains(&target) {
            anyhow::bail!("Cannot drop the target column '{}'", target);
        }
        df = df.drop_many(&present);
        print_count("column(s) dropped on request", present.len(), None);
    }

    let column_names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    if !column_names.contains(&target) {
        anyhow::bail!(
            "Target column '{}' not found in dataset. Available columns: {:?}",
            target,
            column_names
        );
    }
    println!("      Rows: {}", df.height());
    println!("      Predictors: {}", df.width() - 1);

    let mut summary = PipelineSummary::new(df.height(), df.width() - 1);
    let load_elapsed = step_start.elapsed();
    summary.set_load_time(load_elapsed);
    print_step_time(load_elapsed);

    // Steps 2-5: split, binning, transform, pruning
    let spinner = create_spinner("Running pipeline...");
    let result = run_pipeline(&df, &config, classifier.as_ref());
    spinner.finish_and_clear();
    let mut prepared =
        result.with_context(|| format!("Preprocessing failed for {}", cli.input.display()))?;
    report_stages(&prepared);
    summary.record(&prepared);

    // Step 6: Save
    print_step_header(6, "Save Results");
    let (train_path, test_path) = output_paths(&cli.input, Some(&output_dir))?;
    let report_file = report_path(&cli.input, Some(&output_dir));

    let mut targets = vec![train_path.as_path(), test_path.as_path()];
    if cli.report {
        targets.push(report_file.as_path());
    }
    if !cli.no_confirm && !confirm_write_outputs(&targets)? {
        println!("Cancelled by user.");
        return Ok(());
    }

    let step_start = Instant::now();
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let spinner = create_spinner("Writing output files...");
    save_dataset(&mut prepared.train, &train_path)?;
    save_dataset(&mut prepared.test, &test_path)?;
    finish_with_success(&spinner, "Partitions written");
    print_success(&format!("Train: {}", train_path.display()));
    print_success(&format!("Test:  {}", test_path.display()));

    if cli.report {
        let input_name = cli.input.display().to_string();
        BinningReport::build(&input_name, &config, &prepared.binning, prepared.filter.as_ref())
            .write(&report_file)?;
        print_success(&format!("Report: {}", report_file.display()));
    }
    let save_elapsed = step_start.elapsed();
    summary.set_save_time(save_elapsed);
    print_step_time(save_elapsed);

    summary.display();
    print_completion();

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "riskprep=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print the outcome of each pipeline stage
fn report_stages(prepared: &PreparedData) {
    let timings = prepared.timings;

    print_step_header(2, "Train/Test Split");
    println!(
        "      Train: {}  Test: {}",
        style(prepared.train_rows).yellow().bold(),
        style(prepared.test_rows).yellow().bold()
    );
    print_step_time(timings.split);

    print_step_header(3, "Binning & Selection");
    let binning = &prepared.binning;
    let retained = binning.retained().count();
    print_count("predictor(s) binned", binning.features().len(), None);
    if !binning.rejected().is_empty() {
        print_count("predictor(s) rejected as unbinnable", binning.rejected().len(), None);
    }
    print_count(
        "predictor(s) below selection thresholds",
        binning.features().len() - retained,
        None,
    );
    for fb in binning.report().iter().take(10) {
        println!(
            "        {} {:<32} IV {:.4}  Gini {:.4}  bins {}",
            style("•").dim(),
            fb.feature_name,
            fb.iv,
            fb.gini,
            fb.n_bins()
        );
    }
    print_success(&format!("{} predictor(s) retained", retained));
    print_step_time(timings.binning);

    print_step_header(4, "Transform");
    match prepared.strategy {
        PreprocessingStrategy::Raw => {
            print_info("Raw values kept; incomplete rows dropped per partition");
            if prepared.train.height() != prepared.train_rows || prepared.test.height() != prepared.test_rows {
                println!(
                    "      Complete rows: train {} / test {}",
                    prepared.train.height(),
                    prepared.test.height()
                );
            }
        }
        strategy => print_success(&format!("Encoded with the {} strategy", strategy)),
    }
    print_step_time(timings.transform);

    print_step_header(5, "Correlation Pruning");
    match &prepared.filter {
        None => print_info("No numeric predictor to prune"),
        Some(filter) if filter.dropped().is_empty() => print_info("No highly correlated predictor pairs found"),
        Some(filter) => {
            print_count("correlated predictor(s) dropped", filter.dropped().len(), None);
            for d in filter.dropped() {
                println!(
                    "        {} {} (r = {:.3} with {})",
                    style("•").dim(),
                    d.name,
                    d.correlation,
                    d.kept
                );
            }
        }
    }
    print_step_time(timings.pruning);
}

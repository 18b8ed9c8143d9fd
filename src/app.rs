//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads market data (CSV pair or generated demo)
//! - fits the rent model and runs projections / deal analysis
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DealArgs, ProjectArgs, RentArgs};
use crate::error::{AppError, EngineError};
use crate::io::ingest::RowError;

pub mod pipeline;

/// Entry point for the `roi` binary.
pub fn run() -> Result<(), AppError> {
    // We want `roi --demo` to behave like `roi project --demo`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Project(args) => handle_project(args),
        Command::Rent(args) => handle_rent(args),
        Command::Deal(args) => handle_deal(args),
    }
}

fn handle_project(args: ProjectArgs) -> Result<(), AppError> {
    let assumptions = args.assumptions.to_assumptions();
    let run = pipeline::load_market(&args.data)?;

    let projection = crate::project::project_all(&run.dataset, &assumptions)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.dataset, &run.model, &assumptions)
    );
    report_problems(&run.row_errors, &projection.failures);

    let ranked = crate::report::rank_projections(&projection.rows, args.rank, args.top);
    println!(
        "{}",
        crate::report::format_projection_rankings(&ranked, args.rank)
    );

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, run.dataset.asof, &projection.rows)?;
    }
    if let Some(path) = &args.export_model {
        crate::io::export::write_model_json(path, &run.model, run.dataset.asof, run.dataset.granularity)?;
    }

    Ok(())
}

fn handle_rent(args: RentArgs) -> Result<(), AppError> {
    let run = pipeline::load_market(&args.data)?;

    println!(
        "{}",
        crate::report::format_model_summary(&run.dataset, &run.model)
    );
    report_problems(&run.row_errors, &[]);

    if let Some(zip) = &args.zip {
        let Some(segment) = run.dataset.segment(zip) else {
            return Err(AppError::new(2, format!("zip {zip} is not in the dataset")));
        };
        println!(
            "{}",
            crate::report::format_segment_detail(segment, &run.model, run.dataset.granularity)
        );
    }
    if let Some(price) = args.price {
        let predicted = run.model.predict(price)?;
        println!("{}", crate::report::format_price_estimate(price, predicted));
    }

    let residuals = crate::report::compute_rent_residuals(&run.dataset, &run.model)?;
    let rankings = crate::report::rank_rent_gaps(&residuals, args.top);
    println!("{}", crate::report::format_rent_rankings(&rankings));

    if let Some(path) = &args.export_model {
        crate::io::export::write_model_json(path, &run.model, run.dataset.asof, run.dataset.granularity)?;
    }

    Ok(())
}

fn handle_deal(args: DealArgs) -> Result<(), AppError> {
    let assumptions = args.assumptions.to_assumptions();
    let run = pipeline::load_market(&args.data)?;

    let deal = crate::project::evaluate_deal(
        &run.model,
        &run.dataset,
        args.price,
        args.zip.as_deref(),
        &assumptions,
        args.rent_override,
    )?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.dataset, &run.model, &assumptions)
    );
    println!("{}", crate::report::format_deal(&deal, &assumptions));

    Ok(())
}

/// Surface non-fatal problems on stderr so stdout stays pipeable.
fn report_problems(row_errors: &[RowError], failures: &[EngineError]) {
    for e in row_errors.iter().take(5) {
        eprintln!("warning: line {}: {}", e.line, e.message);
    }
    if row_errors.len() > 5 {
        eprintln!("warning: {} more ingest problems not shown", row_errors.len() - 5);
    }
    for f in failures {
        eprintln!("warning: {f}");
    }
}

/// Rewrite argv so `roi` defaults to `roi project`.
///
/// Rules:
/// - `roi`                      -> `roi project`
/// - `roi --demo ...`           -> `roi project --demo ...`
/// - `roi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("project".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "project" | "rent" | "deal");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "project flags".
    if arg1.starts_with('-') {
        argv.insert(1, "project".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

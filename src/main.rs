//! gridcalc - load a sheet, apply edits, sort, explain and export from the command line

mod cli;
mod config;
mod error;

use anyhow::{Context, bail};
use gridcalc_core::seed::budget_sheet;
use gridcalc_core::storage::{read_csv, to_csv_string, write_csv};
use gridcalc_core::{Document, Edit, Sheet};
use gridcalc_engine::engine::{CellRef, format_display};
use tracing::Level;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match cli::parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            cli::print_usage();
            std::process::exit(2);
        }
    };
    if args.help {
        cli::print_usage();
        return;
    }

    init_logging(args.verbosity);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &cli::Args) -> anyhow::Result<()> {
    let (config, warnings) = config::load_config(args.config.as_deref());
    for warning in warnings {
        tracing::warn!("{}", warning);
    }

    let sheet = load_sheet(args, &config)?;
    let mut doc = Document::with_policy(sheet, config.eval);

    for (address, input) in &args.edits {
        let recalc = doc
            .apply_edit(Edit::from_input(address, input))
            .with_context(|| format!("Failed to set {}", address))?;
        if recalc.rejected_cycle {
            tracing::warn!(cell = %recalc.cell, "stored as #CIRCULAR!");
        }
        tracing::info!(
            cell = %recalc.cell,
            recalculated = recalc.results.len(),
            "cell updated"
        );
    }

    if let Some(request) = &args.sort {
        match request.resolve(doc.sheet()) {
            Some(options) => doc.sort_range(&options).context("Sort failed")?,
            None => tracing::info!("nothing to sort"),
        }
    }

    for formula in &args.commands {
        println!("{}", format_display(&doc.evaluate_formula(formula, false)));
    }

    for address in &args.get {
        let cell_ref = parse_address(address)?;
        println!("{}", doc.display(&cell_ref));
    }

    for address in &args.explain {
        let cell_ref = parse_address(address)?;
        print_explain(&doc, &cell_ref);
    }

    if let Some(path) = &args.output {
        write_csv(path, &doc).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "exported");
    } else if args.prints_sheet() {
        println!("{}", to_csv_string(&doc));
    }

    Ok(())
}

fn load_sheet(args: &cli::Args, config: &config::Config) -> anyhow::Result<Sheet> {
    let (rows, cols) = (config.sheet.rows, config.sheet.cols);
    if args.demo {
        return Ok(budget_sheet());
    }
    match &args.file {
        Some(path) => {
            read_csv(path, rows, cols).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => Ok(Sheet::new("sheet-1", "Sheet 1", rows, cols)),
    }
}

fn parse_address(address: &str) -> anyhow::Result<CellRef> {
    match CellRef::from_str(address) {
        Some(cell_ref) => Ok(cell_ref),
        None => bail!("Invalid cell address: {}", address),
    }
}

fn print_explain(doc: &Document, cell_ref: &CellRef) {
    let result = doc.evaluate_cell(cell_ref, true);
    let source = doc
        .sheet()
        .get(cell_ref)
        .map(|cell| cell.to_input_string())
        .unwrap_or_default();

    println!("{}: {}", cell_ref, source);
    for step in result.explain.as_deref().unwrap_or_default() {
        println!("  {} = {}", step.expression, step.result);
    }
    match result.error() {
        Some(err) => println!("  => {} ({})", format_display(&result), err.message),
        None => println!("  => {}", format_display(&result)),
    }
}

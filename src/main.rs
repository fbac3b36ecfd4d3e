use clap::Parser;
use colored::*;
use std::process;
use swarm_merge::cli::{CheckArgs, Cli, ColorChoice, Commands, MergeArgs};
use swarm_merge::emitter::EmitterOptions;
use swarm_merge::{merge, run, write_output, MergeOptions, MergeReport};

fn main() {
    let cli = Cli::parse();

    // Set up color output
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }

    let result = match cli.command {
        Commands::Merge(args) => run_merge(args, cli.verbose, cli.quiet),
        Commands::Check(args) => run_check(args, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        process::exit(1);
    }
}

fn run_merge(args: MergeArgs, verbose: u8, quiet: bool) -> Result<(), String> {
    let options = MergeOptions {
        swarm_config: args.swarm_config,
        mode: args.mode.into(),
        emitter: EmitterOptions::default(),
    };

    if args.dry_run || args.no_reload {
        let report = merge(&options).map_err(|e| e.to_string())?;
        if !quiet {
            print_duplicates(&report, verbose);
        }

        if args.dry_run {
            if !quiet {
                println!("{}", "Dry run - would write:".yellow());
            }
            print!("{}", report.rendered);
            return Ok(());
        }

        write_output(&args.output, &report.rendered).map_err(|e| e.to_string())?;
        if !quiet {
            print_success(&report, &args.output);
        }
        return Ok(());
    }

    let (report, status) =
        run(&options, &args.output, &args.reload_cmd).map_err(|e| e.to_string())?;

    if !quiet {
        print_duplicates(&report, verbose);
        print_success(&report, &args.output);
    }

    if !status.success() {
        eprintln!(
            "{}: reload command `{}` exited with {}",
            "warning".yellow(),
            args.reload_cmd,
            status
        );
    }

    Ok(())
}

fn print_success(report: &MergeReport, output: &std::path::Path) {
    println!(
        "{} Merged {} fragments into {}",
        "Success:".green().bold(),
        report.sources.len(),
        output.display()
    );
}

fn run_check(args: CheckArgs, verbose: u8) -> Result<(), String> {
    let options = MergeOptions {
        swarm_config: args.swarm_config.clone(),
        mode: args.mode.into(),
        emitter: EmitterOptions::default(),
    };

    let report = merge(&options).map_err(|e| e.to_string())?;

    if args.json {
        let output = serde_json::json!({
            "swarm_config": args.swarm_config.display().to_string(),
            "fragments": report
                .sources
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
            "statements": report.merged.statements.len(),
            "duplicates": report.merged.duplicates,
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
        return Ok(());
    }

    println!("{}: {}", "Checking".cyan().bold(), args.swarm_config.display());
    println!();
    print_duplicates(&report, verbose.max(1));

    println!("{}", "Summary:".bold());
    println!("  Fragments: {}", report.sources.len());
    println!("  Statements kept: {}", report.merged.statements.len());
    println!("  Duplicates dropped: {}", report.merged.duplicates.len());

    Ok(())
}

fn print_duplicates(report: &MergeReport, verbose: u8) {
    if report.merged.duplicates.is_empty() {
        return;
    }

    if verbose == 0 {
        println!(
            "{}: dropped {} duplicate statements",
            "note".blue(),
            report.merged.duplicates.len()
        );
        return;
    }

    for duplicate in &report.merged.duplicates {
        println!(
            "{}: dropped {} ({})",
            "note".blue(),
            duplicate.directive.bold(),
            duplicate.kind
        );
        println!(
            "  --> {}:{}",
            duplicate.location.file.display(),
            duplicate.location.line
        );
    }
    println!();
}

//! CLI tool for applying find/replace rules to PowerPoint files.

use anyhow::{bail, Context, Result};
use clap::Parser;
use deck_core::ReplacementRule;
use deck_pptx::{parse_rules_payload, process_with_rules};
use std::fs;
use std::path::{Path, PathBuf};

/// Replace text across the slides, tables and speaker notes of .pptx files.
#[derive(Parser, Debug)]
#[command(name = "deck-edit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// JSON file holding a list of rules
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Text to find (applied after any rules file)
    #[arg(short, long, requires = "replace")]
    find: Option<String>,

    /// Replacement for --find
    #[arg(long, requires = "find")]
    replace: Option<String>,

    /// Treat --find as a regular expression
    #[arg(long, requires = "find")]
    regex: bool,

    /// Match --find regardless of case
    #[arg(short, long, requires = "find")]
    ignore_case: bool,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let rules = load_rules(&args)?;
    if rules.is_empty() {
        bail!("No rules given; pass --rules <file> or --find/--replace");
    }

    let mut failures = 0;
    for input_path in &args.input {
        match process_file(input_path, args.output.as_ref(), &rules) {
            Ok(output_path) => {
                if args.verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} file(s) failed", failures, args.input.len());
    }

    Ok(())
}

/// Collect rules from the rules file and the inline flags, in that order.
fn load_rules(args: &Args) -> Result<Vec<ReplacementRule>> {
    let mut rules = match &args.rules {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read rules from {}", path.display()))?;
            parse_rules_payload(&json).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?
        }
        None => Vec::new(),
    };

    if let (Some(find), Some(replace)) = (&args.find, &args.replace) {
        let rule = ReplacementRule::new(find.as_str(), replace.as_str())
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .with_regex(args.regex)
            .with_ignore_case(args.ignore_case);
        rules.push(rule);
    }

    Ok(rules)
}

/// Process a single PowerPoint file, returning where the result was written.
fn process_file(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    rules: &[ReplacementRule],
) -> Result<PathBuf> {
    let data =
        fs::read(input_path).with_context(|| format!("Failed to open {}", input_path.display()))?;

    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let result =
        process_with_rules(filename, &data, rules).map_err(|e| anyhow::anyhow!("{}", e))?;

    let output_path = get_output_path(input_path, output_dir, &result.filename)?;
    fs::write(&output_path, &result.bytes)
        .with_context(|| format!("Failed to write to {}", output_path.display()))?;

    Ok(output_path)
}

/// Determine the output path for a processed file.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    output_filename: &str,
) -> Result<PathBuf> {
    let output_path = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

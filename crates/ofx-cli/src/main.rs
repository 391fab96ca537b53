use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use ofx_deck::ParsedDeck;
use ofx_model::{ModelSummary, load_model};
use ofx_synth::{ErrorCategory, SynthesisConfig, SynthesisReport, Synthesizer};
use serde::Serialize;
use tracing::{debug, info, warn};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "ofx-cli")]
#[command(about = "Synthesize OOFEM input decks from structural models")]
struct Args {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the solver deck for a model file
    Synth {
        /// Model JSON file
        model: PathBuf,

        /// Deck to write
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Synthesis configuration JSON
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Re-read a deck and report records referencing missing ids
    Check {
        deck: PathBuf,
    },
    /// Print model statistics and a dry synthesis report as JSON
    Summary {
        model: PathBuf,

        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct SummaryOutput {
    generated_at: String,
    model: ModelSummary,
    synthesis: Option<SynthesisReport>,
    synthesis_error: Option<SynthesisFailure>,
}

#[derive(Debug, Serialize)]
struct SynthesisFailure {
    category: ErrorCategory,
    message: String,
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn synthesizer(config: Option<&Path>) -> CliResult<Synthesizer> {
    let config = match config {
        Some(path) => {
            debug!(path = %path.display(), "loading synthesis config");
            SynthesisConfig::from_json_file(path)?
        }
        None => SynthesisConfig::default(),
    };
    Ok(Synthesizer::new(config))
}

fn synth(model: &Path, output: &Path, config: Option<&Path>) -> CliResult<ExitCode> {
    let synthesizer = synthesizer(config)?;
    let model = load_model(model)?;
    let synthesis = match synthesizer.synthesize(&model) {
        Ok(synthesis) => synthesis,
        Err(err) => {
            eprintln!("synthesis failed [{:?}]: {err}", err.category());
            return Ok(ExitCode::from(1));
        }
    };
    synthesis.write(output)?;

    let report = &synthesis.report;
    info!(path = %output.display(), "wrote deck");
    println!(
        "{}: {} nodes, {} elements, {} sets ({} split, {} hinges)",
        output.display(),
        report.nodes,
        report.elements,
        report.sets,
        report.split_elements,
        report.hinges
    );
    if report.empty_sets > 0 {
        warn!(count = report.empty_sets, "deck contains empty sets");
    }
    Ok(ExitCode::SUCCESS)
}

fn check(deck: &Path) -> CliResult<ExitCode> {
    let parsed = ParsedDeck::parse_file(deck)?;
    let issues = parsed.verify();
    if issues.is_empty() {
        println!(
            "{}: ok ({} nodes, {} elements, {} sets)",
            deck.display(),
            parsed.nodes.len(),
            parsed.elements.len(),
            parsed.sets.len()
        );
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        println!("{issue}");
    }
    eprintln!("{}: {} issue(s)", deck.display(), issues.len());
    Ok(ExitCode::from(1))
}

fn summary_output(model: &Path, config: Option<&Path>) -> CliResult<SummaryOutput> {
    let synthesizer = synthesizer(config)?;
    let model = load_model(model)?;
    let (synthesis, synthesis_error) = match synthesizer.synthesize(&model) {
        Ok(synthesis) => (Some(synthesis.report), None),
        Err(err) => (
            None,
            Some(SynthesisFailure {
                category: err.category(),
                message: err.to_string(),
            }),
        ),
    };
    Ok(SummaryOutput {
        generated_at: Utc::now().to_rfc3339(),
        model: ModelSummary::from_model(&model),
        synthesis,
        synthesis_error,
    })
}

fn summary(model: &Path, config: Option<&Path>) -> CliResult<ExitCode> {
    let output = summary_output(model, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn run(command: &Command) -> CliResult<ExitCode> {
    match command {
        Command::Synth {
            model,
            output,
            config,
        } => synth(model, output, config.as_deref()),
        Command::Check { deck } => check(deck),
        Command::Summary { model, config } => summary(model, config.as_deref()),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match run(&args.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../tests/fixtures/models")
            .join(name)
    }

    #[test]
    fn parses_synth_arguments() {
        let args = Args::try_parse_from([
            "ofx-cli", "synth", "frame.json", "-o", "frame.in", "--config", "oofem.json", "-v",
        ])
        .expect("valid arguments");
        assert!(args.verbose);
        let Command::Synth {
            model,
            output,
            config,
        } = args.command
        else {
            panic!("expected synth command");
        };
        assert_eq!(model, PathBuf::from("frame.json"));
        assert_eq!(output, PathBuf::from("frame.in"));
        assert_eq!(config, Some(PathBuf::from("oofem.json")));
    }

    #[test]
    fn synth_requires_output() {
        assert!(Args::try_parse_from(["ofx-cli", "synth", "frame.json"]).is_err());
    }

    #[test]
    fn synthesized_deck_passes_check() {
        let dir = TempDir::new().expect("temp dir");
        let deck = dir.path().join("frame.in");

        let code = synth(&fixture("portal_frame.json"), &deck, None).expect("synth runs");
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(deck.exists());
        assert_eq!(check(&deck).expect("check runs"), ExitCode::SUCCESS);
    }

    #[test]
    fn check_flags_dangling_references() {
        let dir = TempDir::new().expect("temp dir");
        let deck = dir.path().join("broken.in");
        std::fs::write(
            &deck,
            "broken.out\nbroken deck\nLinearStatic nsteps 1 nmodules 0\n\
             domain 3dShell\nOutputManager\n\
             ndofman 1 nelem 1 ncrosssect 0 nmat 0 nbc 0 nic 0 nltf 0 nset 0\n\
             node 1 coords 3 0 0 0\nBeam3d 1 nodes 2 1 2\n",
        )
        .expect("write deck");

        assert_eq!(check(&deck).expect("check runs"), ExitCode::from(1));
    }

    #[test]
    fn summary_reports_model_and_synthesis() {
        let output = summary_output(&fixture("portal_frame.json"), None).expect("summary");
        let json = serde_json::to_value(&output).expect("serializes");
        assert!(json.get("generated_at").is_some_and(|v| v.is_string()));
        assert!(json["synthesis_error"].is_null());

        assert_eq!(output.model.mesh_count, 1);
        let report = output.synthesis.expect("synthesis report");
        assert_eq!(report.hinges, 1);
        assert_eq!(report.split_elements, 1);
    }

    #[test]
    fn summary_keeps_model_statistics_when_synthesis_fails() {
        let dir = TempDir::new().expect("temp dir");
        let model = dir.path().join("empty.json");
        std::fs::write(&model, r#"{"metadata": {"project": "Depot", "task": "hall"}}"#)
            .expect("write model");

        let output = summary_output(&model, None).expect("summary");
        assert!(output.synthesis.is_none());
        let failure = output.synthesis_error.expect("failure");
        assert_eq!(failure.category, ErrorCategory::NotFound);
    }
}

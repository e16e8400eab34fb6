//! Feature codegen CLI
//!
//! Generates static evaluator artifacts from a JSON feature specification, prints the
//! intermediate representation, and checks compiled evaluators against interpreted ones.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lattice_feature_codegen::FeatureKind;
use lattice_feature_codegen::codegen::{FeatureCodegenConfig, StaticFeatureCodegen};
use lattice_feature_codegen::combiner::{
    CombinerConfig, CompiledNgramApply, CompiledPartialNgramApply, EquivalenceChecker,
    FeatureCombiner,
};
use lattice_feature_codegen::diagnostics::{Diagnostic, DiagnosticSink, LogSink};
use lattice_feature_codegen::features::{FeatureHolder, FeatureSpec};

#[derive(Parser)]
#[command(name = "feature-codegen")]
#[command(about = "Compile lattice n-gram feature definitions into specialized evaluators")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the declaration and definition artifacts
    Generate {
        /// JSON feature specification
        #[arg(short, long)]
        spec: PathBuf,
        /// Existing directory receiving both artifacts
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Base name of the artifacts
        #[arg(short, long)]
        filename: String,
        /// Name of the generated factory struct
        #[arg(short, long)]
        class_name: String,
        /// Keep the hash prefix of every feature unfolded
        #[arg(long)]
        no_constant_folding: bool,
        /// Index the context slices at every use instead of binding them once
        #[arg(long)]
        no_hoist: bool,
    },
    /// Print the intermediate representation of both feature kinds
    Inspect {
        /// JSON feature specification
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Compare runtime-compiled evaluators with the interpreted ones
    Verify {
        /// JSON feature specification
        #[arg(short, long)]
        spec: PathBuf,
        /// Number of generated contexts
        #[arg(long, default_value_t = 10_000)]
        samples: usize,
    },
}

fn main() {
    human_panic::setup_panic!();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Generate {
            spec,
            out_dir,
            filename,
            class_name,
            no_constant_folding,
            no_hoist,
        } => {
            let combiner = CombinerConfig {
                constant_folding: !no_constant_folding,
                hoist_loads: !no_hoist,
            };
            let config = FeatureCodegenConfig::new(out_dir, filename, class_name);
            handle_generate(&spec, config, combiner)
        }
        Commands::Inspect { spec } => handle_inspect(&spec),
        Commands::Verify { spec, samples } => handle_verify(&spec, samples),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn load_holder(path: &Path) -> anyhow::Result<FeatureHolder> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading feature specification {}", path.display()))?;
    let spec = FeatureSpec::from_json(&json)?;
    Ok(spec.into_holder())
}

fn handle_generate(
    spec: &Path,
    config: FeatureCodegenConfig,
    combiner: CombinerConfig,
) -> anyhow::Result<()> {
    let holder = load_holder(spec)?;
    let codegen = StaticFeatureCodegen::with_combiner(config, combiner)?;
    let report = codegen.generate_and_write(&holder, &mut LogSink)?;

    for kind in FeatureKind::ALL {
        let status = if report.compiled(kind) {
            "compiled"
        } else {
            "dynamic fallback"
        };
        println!("{kind}: {status}");
    }
    println!("{}", report.declaration.display());
    println!("{}", report.definition.display());
    Ok(())
}

fn handle_inspect(spec: &Path) -> anyhow::Result<()> {
    let holder = load_holder(spec)?;
    let combiner = FeatureCombiner::new();

    for kind in FeatureKind::ALL {
        match combiner.combine(&holder, kind) {
            Ok(program) => println!("{program}"),
            Err(e) => println!("// {kind}: {e}"),
        }
    }
    Ok(())
}

fn handle_verify(spec: &Path, samples: usize) -> anyhow::Result<()> {
    let holder = load_holder(spec)?;
    let combiner = FeatureCombiner::new();
    let checker = EquivalenceChecker::new(holder.context_width(), samples);
    let mut sink = LogSink;

    if let Some(dynamic) = holder.ngram_dynamic() {
        match combiner.combine(&holder, FeatureKind::Ngram) {
            Ok(program) => {
                let compiled = CompiledNgramApply::compile(&program);
                checker.check_ngram(dynamic, &compiled)?;
                println!("ngram: {samples} contexts match");
            }
            Err(e) => sink.report(Diagnostic::compilation_failed(FeatureKind::Ngram, &e)),
        }
    }
    if let Some(dynamic) = holder.partial_ngram_dynamic() {
        match combiner.combine(&holder, FeatureKind::PartialNgram) {
            Ok(program) => {
                let compiled = CompiledPartialNgramApply::compile(&program);
                checker.check_partial_ngram(dynamic, &compiled)?;
                println!("partial ngram: {samples} contexts match");
            }
            Err(e) => sink.report(Diagnostic::compilation_failed(FeatureKind::PartialNgram, &e)),
        }
    }
    Ok(())
}

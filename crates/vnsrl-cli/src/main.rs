//! VNSRL CLI - Command-line interface
//!
//! Usage:
//!   vnsrl label --verbnet <catalogue.json> --corpus <corpus.json> [options]
//!   vnsrl frames --verbnet <catalogue.json> <lemma> [--passivize] [--relatives]
//!
//! Author: hephaex@gmail.com

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use vnsrl_core::{FrameInstance, LabelerConfig, LoggingConfig, MatchingAlgorithm, ProbabilityLevel};
use vnsrl_labeler::Labeler;
use vnsrl_verbnet::{VerbnetCatalogue, WordClassLexicon};

#[derive(Parser)]
#[command(name = "vnsrl")]
#[command(about = "VerbNet semantic role labeler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Label a corpus of frame instances
    Label {
        /// VerbNet catalogue (JSON)
        #[arg(long)]
        verbnet: PathBuf,

        /// Corpus of frame instances (JSON array)
        #[arg(long)]
        corpus: PathBuf,

        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Semantic lexicon for restriction filtering (JSON)
        #[arg(long)]
        lexicon: Option<PathBuf>,

        /// Matching algorithm: baseline, sync_predicates or stop_on_fail
        #[arg(long)]
        algorithm: Option<MatchingAlgorithm>,

        /// Probability model level: default, slot_class, slot or predicate_slot
        #[arg(long)]
        model: Option<ProbabilityLevel>,

        /// Also match passive variants of every frame
        #[arg(long)]
        passivize: bool,

        /// Also match relative-clause variants of every frame
        #[arg(long)]
        relatives: bool,

        /// Prune ties with restriction co-occurrence statistics
        #[arg(long)]
        semantic_restrictions: bool,

        /// Prune ties with the semantic lexicon
        #[arg(long)]
        wordnet_restrictions: bool,

        /// Run the bootstrap loop
        #[arg(long)]
        bootstrap: bool,
    },
    /// Show the frames licensed for a predicate
    Frames {
        /// VerbNet catalogue (JSON)
        #[arg(long)]
        verbnet: PathBuf,

        /// Predicate lemma
        lemma: String,

        /// Include passive variants
        #[arg(long)]
        passivize: bool,

        /// Include relative-clause variants
        #[arg(long)]
        relatives: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Label {
            verbnet,
            corpus,
            config,
            lexicon,
            algorithm,
            model,
            passivize,
            relatives,
            semantic_restrictions,
            wordnet_restrictions,
            bootstrap,
        } => {
            let mut config = match config {
                Some(path) => LabelerConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => LabelerConfig::default(),
            }
            .with_env_override()?;

            if let Some(algorithm) = algorithm {
                config.matching.algorithm = algorithm;
            }
            if model.is_some() {
                config.model.level = model;
            }
            config.matching.passivize |= passivize;
            config.matching.relatives |= relatives;
            config.matching.semantic_restrictions |= semantic_restrictions;
            config.matching.wordnet_restrictions |= wordnet_restrictions;
            config.bootstrap.enabled |= bootstrap;
            config.validate()?;

            init_tracing(&config.logging);
            label(config, &verbnet, &corpus, lexicon.as_deref())
        }
        Commands::Frames {
            verbnet,
            lemma,
            passivize,
            relatives,
        } => {
            init_tracing(&LoggingConfig::default());
            let catalogue = load_catalogue(&verbnet)?;
            let frames = catalogue.candidate_frames(&lemma, passivize, relatives)?;

            let mut stdout = std::io::stdout().lock();
            for frame in frames {
                writeln!(stdout, "{frame}")?;
            }
            Ok(())
        }
    }
}

/// Install the fmt subscriber on stderr; RUST_LOG wins over the config
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_catalogue(path: &Path) -> anyhow::Result<VerbnetCatalogue> {
    let catalogue = VerbnetCatalogue::from_path(path)
        .with_context(|| format!("loading VerbNet catalogue {}", path.display()))?;
    tracing::info!(
        lemmas = catalogue.len(),
        frames = catalogue.frame_count(),
        "Loaded VerbNet catalogue"
    );
    Ok(catalogue)
}

fn label(
    config: LabelerConfig,
    verbnet: &Path,
    corpus: &Path,
    lexicon: Option<&Path>,
) -> anyhow::Result<()> {
    let catalogue = load_catalogue(verbnet)?;

    let json = std::fs::read_to_string(corpus)
        .with_context(|| format!("reading corpus {}", corpus.display()))?;
    let instances: Vec<FrameInstance> = serde_json::from_str(&json)
        .with_context(|| format!("parsing corpus {}", corpus.display()))?;

    let lexicon = match lexicon {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading lexicon {}", path.display()))?;
            Some(WordClassLexicon::from_json_str(&json)?)
        }
        None => None,
    };

    let mut labeler = Labeler::new(config, &catalogue);
    if let Some(lexicon) = &lexicon {
        labeler = labeler.with_lexicon(lexicon);
    }
    let run = labeler.label(&instances)?;

    let mut stdout = std::io::stdout().lock();
    for output in &run.outputs {
        serde_json::to_writer(&mut stdout, output)?;
        writeln!(stdout)?;
    }

    if let Some(report) = &run.bootstrap {
        eprintln!(
            "bootstrap: {} passes, {} resolved, {} ambiguous left",
            report.iterations.len(),
            report.total_resolved(),
            report.final_ambiguous()
        );
    }
    eprintln!(
        "labeled {} occurrences ({} resolved slots, {} ambiguous); {}",
        run.outputs.len(),
        run.resolved_slots(),
        run.ambiguous_slots(),
        run.diagnostics.summary()
    );
    Ok(())
}

//! pathrank — rank the pathway neighbours of a gene.
//! Entry point for the command-line binary.

mod commands;
mod config;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::OutputFormat;
use pathrank_common::RelationAggregation;
use pathrank_ranker::weights;

#[derive(Parser)]
#[command(name = "pathrank", version, about = "Rank genes by pathway proximity to a reference gene")]
struct Cli {
    /// Run configuration (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PATHRANK_CONFIG")]
    config: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank candidate genes around a reference gene
    Rank {
        /// Reference gene symbol (defaults to target.gene from the config)
        gene: Option<String>,
        /// Use this gene id instead of resolving the symbol
        #[arg(long)]
        gene_id: Option<String>,
        #[arg(long)]
        organism: Option<String>,
        /// Number of ranked genes to keep
        #[arg(long)]
        top_n: Option<usize>,
        /// Maximum pathway documents to analyse
        #[arg(long)]
        documents: Option<usize>,
        /// Size of the candidate pool
        #[arg(long)]
        candidates: Option<usize>,
        #[arg(long, value_enum)]
        aggregation: Option<Aggregation>,
        /// Write the ranking to this CSV file
        #[arg(long, conflicts_with = "no_csv")]
        csv: Option<String>,
        #[arg(long)]
        no_csv: bool,
        /// Skip the co-expression signal
        #[arg(long)]
        no_coexpression: bool,
        /// Rescale score weights to sum to one
        #[arg(long)]
        normalise_weights: bool,
    },
    /// List the pathways a gene belongs to
    Pathways { gene: String },
    /// Show the KEGG record of a gene
    Info { gene: String },
    /// Rank KEGG diseases by pathway overlap with a disease
    SimilarDiseases {
        /// Disease code (H00003) or a name to search for
        disease: String,
        /// Catalogue entries to compare
        #[arg(long)]
        max_checked: Option<usize>,
        /// Matches to show
        #[arg(long)]
        top: Option<usize>,
    },
    /// Inspect a local KGML file
    Parse {
        file: String,
        #[arg(long, default_value = "hsa")]
        organism: String,
        /// Report interactions of this gene id
        #[arg(long)]
        reference: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Aggregation {
    First,
    Max,
    Sum,
    Mean,
}

impl From<Aggregation> for RelationAggregation {
    fn from(a: Aggregation) -> Self {
        match a {
            Aggregation::First => RelationAggregation::First,
            Aggregation::Max => RelationAggregation::Max,
            Aggregation::Sum => RelationAggregation::Sum,
            Aggregation::Mean => RelationAggregation::Mean,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr so tables and JSON on stdout stay parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pathrank=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rank {
            gene,
            gene_id,
            organism,
            top_n,
            documents,
            candidates,
            aggregation,
            csv,
            no_csv,
            no_coexpression,
            normalise_weights,
        } => {
            let mut config = config::load(cli.config.as_deref())?;
            config::RankOverrides {
                gene,
                gene_id,
                organism,
                top_n,
                documents,
                candidates,
                aggregation: aggregation.map(Into::into),
                csv,
                no_csv,
            }
            .apply(&mut config);
            if normalise_weights {
                config.scoring.weights = weights::normalised(&config.scoring.weights);
            }
            info!(gene = %config.target.gene, organism = %config.target.organism, "Starting ranking run");
            commands::rank::run(&config, !no_coexpression, cli.format).await
        }
        Commands::Pathways { gene } => {
            let config = config::load(cli.config.as_deref())?;
            commands::pathways::run(&config, &gene, cli.format).await
        }
        Commands::Info { gene } => {
            let config = config::load(cli.config.as_deref())?;
            commands::info::run(&config, &gene, cli.format).await
        }
        Commands::SimilarDiseases { disease, max_checked, top } => {
            let mut config = config::load(cli.config.as_deref())?;
            if let Some(n) = max_checked {
                config.disease_search.max_checked = n;
            }
            if let Some(n) = top {
                config.disease_search.max_results = n;
            }
            config.validate()?;
            commands::diseases::run(&config, &disease, cli.format).await
        }
        Commands::Parse { file, organism, reference } => {
            commands::parse::run(&file, &organism, reference.as_deref(), cli.format)
        }
    }
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;
use std::path::PathBuf;

mod besthit;
mod blast;
mod classify;
mod colour;
mod commands;
mod error;
mod fasta;
mod files;
mod genbank;
mod interpro;
mod merge;
mod table;

use besthit::{Thresholds, MIN_EVALUE, NEXT_BEST_EVALUE};
use classify::{Placeholders, DEFAULT_PLACEHOLDERS};
use colour::ColourScheme;
use commands::dpo_filter::DEFAULT_THRESHOLD;

#[derive(Parser)]
#[command(author, version, about = "Post-processing for phage genome annotations")]
struct Cli {
    /// Log per-record details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ThresholdArgs {
    /// InterProScan hits above this e-value are ignored
    #[arg(long, default_value_t = MIN_EVALUE)]
    max_evalue: f64,
    /// A more specific runner-up replaces the best hit only at or below this e-value
    #[arg(long, default_value_t = NEXT_BEST_EVALUE)]
    promotion_evalue: f64,
    /// Promote a more specific runner-up whatever its e-value
    #[arg(long)]
    no_promotion_limit: bool,
}

impl ThresholdArgs {
    fn thresholds(&self) -> Thresholds {
        Thresholds {
            max_evalue: self.max_evalue,
            promotion_evalue: (!self.no_promotion_limit).then_some(self.promotion_evalue),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge best InterProScan hits into SPHAE GenBank annotations
    Combine {
        /// Folder with one InterProScan output directory per genome
        #[arg(long)]
        interpro_folder: PathBuf,
        /// Prefix naming the combined output folder
        #[arg(long)]
        prefix: String,
        /// SPHAE final-annotate folder with one directory per genome
        #[arg(long)]
        sphae_folder: PathBuf,
        #[arg(long)]
        output_folder: PathBuf,
        #[command(flatten)]
        thresholds: ThresholdArgs,
        /// Products counted as unannotated (repeatable)
        #[arg(long = "placeholder", default_values = DEFAULT_PLACEHOLDERS)]
        placeholders: Vec<String>,
    },
    /// Add /note and /colour qualifiers from /function
    Colour {
        #[arg(long)]
        input_folder: PathBuf,
        /// Only GenBank files starting with this prefix
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        output_folder: PathBuf,
    },
    /// Write CDS sequences of GenBank files as FASTA
    Extract {
        #[arg(long)]
        genomes_folder: PathBuf,
        /// Only GenBank files starting with this prefix
        #[arg(long)]
        prefix: String,
        #[arg(long)]
        output_folder: PathBuf,
        /// Write /translation protein sequences instead of nucleotides
        #[arg(long)]
        protein: bool,
    },
    /// Convert PhageDPO HTML reports to TSV
    DpoHtml {
        #[arg(long)]
        phage_dpo_results: PathBuf,
        #[arg(long)]
        output_folder: PathBuf,
    },
    /// Keep PhageDPO predictions above a score
    DpoFilter {
        #[arg(long)]
        phage_dpo_tsv: PathBuf,
        #[arg(long)]
        output_folder: PathBuf,
        /// Minimum prediction percentage, exclusive
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
    /// Concatenate per-genome summaries into allsummaries.txt
    Summaries {
        #[arg(long)]
        input_folder: PathBuf,
        #[arg(long)]
        prefix: String,
    },
    /// Report the CDS touched by tBLASTx hits between two genomes
    Retrieve {
        /// tBLASTx hits in outfmt 6
        #[arg(long)]
        input_tsv: PathBuf,
        #[arg(long)]
        gbk1: PathBuf,
        #[arg(long)]
        gbk2: PathBuf,
        #[arg(long)]
        output_folder: PathBuf,
    },
}

fn dispatch(command: &Commands) -> Result<()> {
    match command {
        Commands::Combine {
            interpro_folder,
            prefix,
            sphae_folder,
            output_folder,
            thresholds,
            placeholders,
        } => {
            let placeholders = Placeholders::new(placeholders);
            commands::combine::run(&commands::combine::CombineConfig {
                interpro_folder,
                prefix,
                sphae_folder,
                output_folder,
                thresholds: thresholds.thresholds(),
                placeholders: &placeholders,
            })
        }
        Commands::Colour {
            input_folder,
            prefix,
            output_folder,
        } => {
            let scheme = ColourScheme::default();
            commands::colour::run(&commands::colour::ColourConfig {
                input_folder,
                prefix,
                output_folder,
                scheme: &scheme,
            })
        }
        Commands::Extract {
            genomes_folder,
            prefix,
            output_folder,
            protein,
        } => {
            let placeholders = Placeholders::default();
            commands::extract::run(&commands::extract::ExtractConfig {
                genomes_folder,
                prefix,
                output_folder,
                protein: *protein,
                placeholders: &placeholders,
            })
        }
        Commands::DpoHtml {
            phage_dpo_results,
            output_folder,
        } => commands::dpo_html::run(&commands::dpo_html::DpoHtmlConfig {
            results_folder: phage_dpo_results,
            output_folder,
        }),
        Commands::DpoFilter {
            phage_dpo_tsv,
            output_folder,
            threshold,
        } => commands::dpo_filter::run(&commands::dpo_filter::DpoFilterConfig {
            tsv_folder: phage_dpo_tsv,
            output_folder,
            threshold: *threshold,
        }),
        Commands::Summaries {
            input_folder,
            prefix,
        } => commands::summaries::run(&commands::summaries::SummariesConfig {
            input_folder,
            prefix,
        }),
        Commands::Retrieve {
            input_tsv,
            gbk1,
            gbk2,
            output_folder,
        } => commands::retrieve::run(&commands::retrieve::RetrieveConfig {
            input_tsv,
            gbk1,
            gbk2,
            output_folder,
        }),
    }
}

fn main() {
    let start = std::time::Instant::now();
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::Debug
    } else if cli.quiet {
        Level::Warn
    } else {
        Level::Info
    };
    if let Err(e) = init_with_level(level) {
        eprintln!("could not start logging: {}", e);
    }

    if let Err(e) = dispatch(&cli.command) {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Elapsed time: {:?}", start.elapsed());
}

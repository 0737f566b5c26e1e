use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use pepac::output;
use pepac::{
    DecoyConfig, DecoyPosition, IndexerConfig, MatchConfig, MissingDecoyAction, PeptideIndexer,
};
use std::io::{self, IsTerminal, Write};
use termcolor::{ColorChoice, StandardStream};

#[derive(Parser)]
#[command(name = "pepac")]
#[command(about = "Find peptides in protein sequences, tolerating ambiguous residues and mismatches")]
struct Cli {
    /// Peptide to search for (repeatable)
    #[arg(short = 'n', long = "needle", value_name = "SEQ", required = true)]
    needles: Vec<String>,

    /// Protein sequences to search, optionally as ACCESSION=SEQ
    #[arg(value_name = "HAYSTACK", required = true)]
    haystacks: Vec<String>,

    /// Ambiguous residues (B, J, Z, X, $) a hit may resolve
    #[arg(long, default_value_t = 0)]
    max_ambiguous: u8,

    /// Residues a hit may differ in
    #[arg(long, default_value_t = 0)]
    max_mismatches: u8,

    /// Treat I and L as the same residue
    #[arg(long)]
    il_equivalent: bool,

    /// Read selenocysteine (U) as X
    #[arg(long)]
    substitute_u: bool,

    /// Do not fail when a needle is found nowhere
    #[arg(long)]
    allow_unmatched: bool,

    /// Accession tag marking decoy proteins
    #[arg(long, default_value = "DECOY_")]
    decoy_string: String,

    /// Where the decoy tag sits in the accession
    #[arg(long, value_enum, default_value_t = DecoyWhere::Prefix)]
    decoy_position: DecoyWhere,

    /// What to do when no needle matches a decoy protein
    #[arg(long, value_enum, default_value_t = OnMissingDecoy::Error)]
    missing_decoy: OnMissingDecoy,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Print automaton statistics
    #[arg(long)]
    stats: bool,

    /// Log progress at info level (-vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// When to use colors
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto)]
    color: ColorWhen,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, ValueEnum)]
enum DecoyWhere {
    Prefix,
    Suffix,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnMissingDecoy {
    Error,
    Warn,
}

impl ColorWhen {
    fn choice(self) -> ColorChoice {
        match self {
            ColorWhen::Auto if io::stdout().is_terminal() => ColorChoice::Auto,
            ColorWhen::Auto | ColorWhen::Never => ColorChoice::Never,
            ColorWhen::Always => ColorChoice::Always,
        }
    }
}

impl Cli {
    fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            matching: MatchConfig::new(self.max_ambiguous, self.max_mismatches),
            il_equivalent: self.il_equivalent,
            substitute_u: self.substitute_u,
            allow_unmatched: self.allow_unmatched,
            decoy: DecoyConfig {
                decoy_string: self.decoy_string.clone(),
                position: match self.decoy_position {
                    DecoyWhere::Prefix => DecoyPosition::Prefix,
                    DecoyWhere::Suffix => DecoyPosition::Suffix,
                },
                missing_action: match self.missing_decoy {
                    OnMissingDecoy::Error => MissingDecoyAction::Error,
                    OnMissingDecoy::Warn => MissingDecoyAction::Warn,
                },
            },
        }
    }

    /// Split `ACCESSION=SEQ` haystacks; either all carry an accession or none
    fn split_accessions(&self) -> Result<(Vec<&str>, Vec<&str>)> {
        let split: Vec<Option<(&str, &str)>> =
            self.haystacks.iter().map(|h| h.split_once('=')).collect();
        if split.iter().all(Option::is_none) {
            return Ok((Vec::new(), self.haystacks.iter().map(String::as_str).collect()));
        }
        split
            .into_iter()
            .zip(&self.haystacks)
            .map(|(pair, raw)| pair.with_context(|| format!("haystack {raw:?} has no accession")))
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().unzip())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still takes precedence
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let (accessions, haystacks) = cli.split_accessions()?;
    if haystacks.iter().all(|h| h.trim().is_empty()) {
        bail!("all haystacks are empty");
    }

    let indexer = PeptideIndexer::new(cli.indexer_config());
    let result = if accessions.is_empty() {
        indexer.index(&cli.needles, &haystacks)
    } else {
        indexer.index_with_accessions(&cli.needles, &accessions, &haystacks)
    }
    .context("Failed to index needles")?;

    if cli.json {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        serde_json::to_writer_pretty(&mut lock, &result).context("Failed to write JSON")?;
        writeln!(lock)?;
        return Ok(());
    }

    let mut stdout = StandardStream::stdout(cli.color.choice());
    if cli.stats {
        output::print_stats(&mut stdout, &result.stats)?;
    }
    output::print_matches(&mut stdout, &result, &haystacks)?;
    if cli.stats {
        output::print_summary(&mut stdout, &result)?;
    }

    Ok(())
}


use clap::Parser;
use maxpars::bnb::MaximumParsimonyBnb;
use maxpars::distance::JukesCantor;
use maxpars::fitch;
use maxpars::io::{read_phylip, write_results};
use maxpars::upgma::Upgma;
use std::path::PathBuf;
use std::time::Instant;

/// Branch-and-bound maximum-parsimony search over DNA alignments.
#[derive(Parser, Debug)]
#[command(name = "maxpars", version, about = "Maximum-parsimony tree search over an interleaved PHYLIP alignment")]
struct Args {
    /// Path to an interleaved PHYLIP alignment
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output path for the results (signatures + score); `.gz` compresses
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Maximum number of tied-optimal signatures to retain
    #[arg(short = 'c', long = "capacity", default_value_t = 1000)]
    capacity: usize,

    /// Skip uninformative-site excision
    #[arg(long = "no-excise", default_value_t = false)]
    no_excise: bool,

    /// Skip seeding the search bound from a UPGMA tree
    #[arg(long = "no-upgma-bound", default_value_t = false)]
    no_upgma_bound: bool,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let t0 = Instant::now();
    let mut list = match read_phylip(&args.input) {
        Ok(list) => list,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    let read_s = t0.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("Reading alignment {read_s:.3}s"));
    log_if(
        !args.quiet,
        format!("Read in {} species, {} sites", list.len(), list.sequence_length()),
    );

    let t1 = Instant::now();
    let uninformative_changes = if args.no_excise {
        0
    } else {
        let n_informative = list.n_informative_sites();
        let changes = list.excise_uninformative_sites();
        log_if(
            !args.quiet,
            format!(
                "Excised uninformative sites: {n_informative} informative sites remain, {changes} changes recovered"
            ),
        );
        changes
    };
    let excise_s = t1.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("Excision {excise_s:.3}s"));

    let t2 = Instant::now();
    let initial_bound = if args.no_upgma_bound {
        None
    } else {
        match Upgma::build(&list, &JukesCantor) {
            Ok(mut tree) => match fitch::compute_score(&mut tree) {
                Ok(score) => Some(score + uninformative_changes as i64),
                Err(e) => {
                    eprintln!("Failed to score UPGMA seed tree: {e}");
                    None
                }
            },
            Err(e) => {
                eprintln!("Failed to build UPGMA seed tree: {e}");
                None
            }
        }
    };
    let upgma_s = t2.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("UPGMA seeding {upgma_s:.3}s"));

    let t3 = Instant::now();
    let bnb = match MaximumParsimonyBnb::new(&list, initial_bound, args.capacity) {
        Ok(bnb) => bnb,
        Err(e) => {
            eprintln!("Failed to construct search driver: {e}");
            std::process::exit(3);
        }
    };
    let results = match bnb.run() {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Search failed: {e}");
            std::process::exit(4);
        }
    };
    let search_s = t3.elapsed().as_secs_f64();
    let excised_score = results.score().unwrap_or(0);
    let true_score = excised_score + uninformative_changes as i64;
    log_if(
        !args.quiet,
        format!(
            "Search {search_s:.3}s: {} signatures at score {true_score}",
            results.signatures().len()
        ),
    );

    let t4 = Instant::now();
    if let Err(e) = write_results(&args.output, true_score, results.signatures()) {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        std::process::exit(5);
    }
    let write_s = t4.elapsed().as_secs_f64();
    log_if(!args.quiet, format!("Writing output {write_s:.3}s"));
}

fn log_if(show: bool, msg: String) {
    if show {
        println!("{}", msg);
    }
}

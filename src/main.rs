use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use homcore::engine::{Cap, MaxDepth};
use homcore::error::HomError;
use homcore::fs::{load_graph, load_partial_map};
use homcore::heuristic::Priority;
use homcore::{find_core, find_retracts};

/// Graph-homomorphism search over adjacency-list JSON graphs.
#[derive(Parser, Debug)]
#[command(name = "homcore")]
#[command(about = "Searches for graph homomorphisms and derived structural objects", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Maximum number of results to report; omit for no limit.
    #[arg(long, global = true)]
    cap: Option<usize>,

    /// Print only the count of results, not the maps themselves.
    #[arg(long, global = true)]
    count_only: bool,

    /// Maximum number of further assignments beyond any supplied partial
    /// map; omit to search until every vertex is assigned.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Branching priority passed to `order-max-adjacent`-style callers;
    /// unused by the search subcommands themselves but validated up front
    /// so a typo fails fast.
    #[arg(long, global = true)]
    priority: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find homomorphisms G -> H.
    FindHomomorphisms {
        source: PathBuf,
        target: PathBuf,
        /// JSON file mapping source labels to target labels, fixing a
        /// starting partial assignment.
        #[arg(long)]
        partial_map: Option<PathBuf>,
        /// Quotient the enumeration by the first k first-occurrence target
        /// values (§4.6).
        #[arg(long, default_value_t = 0)]
        sym_prefix: usize,
    },
    /// Find retracts of G (homomorphisms G -> G fixed on their image).
    FindRetracts {
        source: PathBuf,
        #[arg(long)]
        partial_map: Option<PathBuf>,
    },
    /// Compute the core of G.
    FindCore {
        source: PathBuf,
        /// Restrict the first shrinking step to a single vertex, valid only
        /// when G is vertex-transitive.
        #[arg(long)]
        vertex_transitive: bool,
    },
    /// Verify that a map is a homomorphism G -> H.
    Verify {
        source: PathBuf,
        target: PathBuf,
        map: PathBuf,
    },
}

fn main() -> Result<(), HomError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if let Some(name) = &args.priority {
        Priority::parse(name)?;
    }

    let cap = match args.cap {
        Some(n) => Cap::Limited(n),
        None => Cap::Unlimited,
    };
    let max_depth = match args.max_depth {
        Some(d) => MaxDepth::Bounded(d),
        None => MaxDepth::Unbounded,
    };

    match args.command {
        Command::FindHomomorphisms {
            source,
            target,
            partial_map,
            sym_prefix,
        } => {
            println!("Loading source graph from {}...", source.display());
            let g = load_graph(&source)?;
            println!("Loading target graph from {}...", target.display());
            let h = load_graph(&target)?;
            let partmap = match partial_map {
                Some(path) => load_partial_map(&path)?,
                None => Vec::new(),
            };

            println!("Searching for homomorphisms...");
            let results = {
                let pairs = g.translate_partial_map(&h, &partmap)?;
                let f0 = homcore::partial::PartialMap::from_pairs(g.graph().order(), &pairs);
                let opts = homcore::engine::SearchOptions {
                    cap,
                    max_depth,
                    only_count: args.count_only,
                    sym_prefix,
                    retract: false,
                    order: Vec::new(),
                };
                let (results, _stats) = homcore::engine::search(g.graph(), h.graph(), &f0, &opts, None);
                results
            };
            report(&results, |map| g.translate_map_to_labels(&h, &plain(map)));
        }
        Command::FindRetracts { source, partial_map } => {
            println!("Loading graph from {}...", source.display());
            let g = load_graph(&source)?;
            let partmap = match partial_map {
                Some(path) => load_partial_map(&path)?,
                None => Vec::new(),
            };
            println!("Searching for retracts...");
            let results = find_retracts(&g, cap, args.count_only, max_depth, &partmap)?;
            report(&results, |map| g.translate_map_to_labels(&g, &plain(map)));
        }
        Command::FindCore {
            source,
            vertex_transitive,
        } => {
            println!("Loading graph from {}...", source.display());
            let g = load_graph(&source)?;
            println!("Computing core...");
            let core = find_core(g.graph(), vertex_transitive);
            println!(
                "Core has {} vertices and {} edges.",
                core.order(),
                core.size()
            );
        }
        Command::Verify { source, target, map } => {
            let g = load_graph(&source)?;
            let h = load_graph(&target)?;
            let pairs = load_partial_map(&map)?;
            let mut indices = vec![0usize; g.graph().order()];
            for (s, t) in pairs {
                let si = g.index_of(&s).ok_or_else(|| {
                    HomError::MalformedGraph(format!("map references unknown source vertex {s}"))
                })?;
                let ti = h.index_of(&t).ok_or_else(|| {
                    HomError::MalformedGraph(format!("map references unknown target vertex {t}"))
                })?;
                indices[si] = ti;
            }
            let ok = homcore::verify::is_hom(g.graph(), h.graph(), &indices);
            println!("{}", if ok { "valid homomorphism" } else { "NOT a homomorphism" });
        }
    }

    Ok(())
}

fn plain(map: &[Option<usize>]) -> Vec<usize> {
    map.iter()
        .map(|m| m.expect("CLI reporting only ever prints total maps"))
        .collect()
}

fn report<L: Clone + std::fmt::Debug, M: Clone + std::fmt::Debug>(
    results: &homcore::engine::Results,
    to_labels: impl Fn(&[Option<usize>]) -> Vec<(L, M)>,
) {
    match results {
        homcore::engine::Results::Count(n) => println!("{n} result(s) found."),
        homcore::engine::Results::Maps(maps) => {
            println!("{} result(s) found.", maps.len());
            for map in maps {
                println!("{:?}", to_labels(map));
            }
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use friendgraph::graph::{
    adjacency_matrix, count_unique_edges, find_friend_chain, find_friend_chains, load_graph,
    summarize,
};
use friendgraph::{Config, FriendGraph, UserId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "friendgraph")]
#[command(about = "Analyze a crawled VK friendship graph")]
struct Args {
    /// Graph JSON to read (defaults to graph.path from config.toml, else graph.json)
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Unique edge count, plus one friend chain.
    ///
    /// Chain endpoints come from --start/--end, falling back to report.start and
    /// report.end in config.toml; the chain is skipped when neither supplies both.
    Report {
        #[arg(long)]
        start: Option<UserId>,
        #[arg(long)]
        end: Option<UserId>,
    },
    /// User, placeholder and edge counts
    Stats,
    /// Number of unique (undirected) friendships
    Edges,
    /// Shortest friend chains for pairs of ids: chain <start> <end> [<start> <end>...]
    Chain {
        #[arg(required = true, num_args = 2..)]
        ids: Vec<UserId>,
    },
    /// Print the 0/1 adjacency matrix with its id ordering
    Matrix,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Analysis works without a config file
    let config = Config::load_or_default()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.log_level)
    ).init();

    let graph_path = args
        .graph
        .unwrap_or_else(|| config.graph_path().to_path_buf());

    let graph = load_graph(&graph_path)
        .with_context(|| format!("Cannot use graph file {}", graph_path.display()))?;
    log::info!("Loaded {} users from {}", graph.len(), graph_path.display());

    match args.command.unwrap_or(Command::Report { start: None, end: None }) {
        Command::Report { start, end } => run_report(&graph, config.report.endpoints(start, end)),
        Command::Stats => run_stats(&graph),
        Command::Edges => println!("{}", count_unique_edges(&graph)),
        Command::Chain { ids } => run_chains(&graph, &ids)?,
        Command::Matrix => run_matrix(&graph),
    }

    Ok(())
}

fn run_report(graph: &FriendGraph, endpoints: Option<(UserId, UserId)>) {
    println!("Unique friendships: {}", count_unique_edges(graph));

    if let Some((start, end)) = endpoints {
        println!("Friend chain:");
        match find_friend_chain(graph, start, end) {
            Ok(chain) => println!("{}", chain),
            Err(e) => println!("not found ({})", e),
        }
    } else {
        log::info!("No chain endpoints; pass --start/--end or set [report] in config.toml");
    }
}

fn run_stats(graph: &FriendGraph) {
    let summary = summarize(graph);
    println!("Users:          {}", summary.users);
    println!("  expanded:     {}", summary.expanded);
    println!("  placeholders: {}", summary.placeholders);
    println!("Directed edges: {}", summary.directed_edges);
    println!("Unique edges:   {}", summary.unique_edges);
}

fn run_chains(graph: &FriendGraph, ids: &[UserId]) -> Result<()> {
    if ids.len() % 2 != 0 {
        anyhow::bail!("chain expects pairs of ids, got {} values", ids.len());
    }

    let queries: Vec<(UserId, UserId)> = ids.chunks(2).map(|p| (p[0], p[1])).collect();
    for (&(start, end), result) in queries.iter().zip(find_friend_chains(graph, &queries)) {
        match result {
            Ok(chain) => println!("{} -> {}: {} ({} hops)", start, end, chain, chain.hops()),
            Err(e) => println!("{} -> {}: not found ({})", start, end, e),
        }
    }
    Ok(())
}

fn run_matrix(graph: &FriendGraph) {
    let matrix = adjacency_matrix(graph);
    let header: Vec<String> = matrix.ids().iter().map(|id| id.to_string()).collect();
    println!("ids\t{}", header.join("\t"));
    for (id, row) in matrix.ids().iter().zip(matrix.rows()) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        println!("{}\t{}", id, cells.join("\t"));
    }
}

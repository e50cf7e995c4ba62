// tune-radar: search the Spotify catalogue and chart audio features
//
// Subcommands:
//   search       Rank artists and albums for a query
//   interactive  Debounced live search over stdin; `:N` selects result N
//   chart        Render one or two collections as an SVG radar chart
//   features     Export one collection's feature vectors as JSON

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tune_radar::api::{ClientConfig, SpotifyClient};
use tune_radar::catalog::{self, SearchOptions, Selection, DEFAULT_SEARCH_LIMIT};
use tune_radar::error::ApiResult;
use tune_radar::models::{CandidateKind, Collection};
use tune_radar::progress::{create_progress_bar, create_spinner, format_duration, set_log_only};
use tune_radar::radar::{average_values, render_chart, Curve, RadarGeometry, Side, FEATURES};
use tune_radar::safety::validate_output_path;
use tune_radar::scoring::RankedCandidate;
use tune_radar::session::{Completion, Dispatch, SearchSession, SearchState};

#[derive(Parser, Debug)]
#[command(name = "tune-radar")]
#[command(about = "Search the Spotify catalogue and compare audio features on a radar chart.")]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,

    /// Hide progress bars (tail-friendly log output)
    #[arg(long, global = true)]
    log_only: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Parser, Debug, Clone)]
struct ApiArgs {
    /// Spotify application client id
    #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true, global = true)]
    client_id: Option<String>,

    /// Spotify application client secret
    #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true, global = true)]
    client_secret: Option<String>,

    /// Market code forwarded to search (e.g. US)
    #[arg(long, global = true)]
    market: Option<String>,

    /// Results requested per entity type (API caps this at 50)
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT, global = true)]
    limit: u32,

    /// Override the Web API base URL (e.g. a local proxy)
    #[arg(long, global = true)]
    api_base: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank artists and albums for a query
    Search(SearchArgs),

    /// Live search over stdin lines, debounced
    Interactive,

    /// Render collections as an SVG radar chart
    Chart(ChartArgs),

    /// Export a collection's feature vectors as JSON
    Features(FeaturesArgs),
}

#[derive(Parser, Debug)]
struct SearchArgs {
    /// Free-text query
    #[arg(required = true)]
    query: Vec<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ChartArgs {
    /// Left collection (artist:ID or album:ID)
    #[arg(long)]
    left: Selection,

    /// Optional right collection to compare against
    #[arg(long)]
    right: Option<Selection>,

    /// Output SVG file
    #[arg(short, long)]
    output: PathBuf,

    /// Chart radius in pixels
    #[arg(long, default_value_t = 200.0)]
    radius: f64,

    /// Segment style between axis points
    #[arg(long, value_enum, default_value_t = Curve::Linear)]
    curve: Curve,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,
}

#[derive(Parser, Debug)]
struct FeaturesArgs {
    /// Collection to export (artist:ID or album:ID)
    selection: Selection,

    /// Output JSON file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tune_radar=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    set_log_only(cli.log_only);
    init_tracing();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli.api)?;
    let opts = SearchOptions {
        market: cli.api.market.clone(),
        limit: cli.api.limit,
    };

    match cli.cmd {
        Command::Search(args) => cmd_search(&client, &opts, args).await,
        Command::Interactive => cmd_interactive(&client, &opts).await,
        Command::Chart(args) => cmd_chart(&client, args).await,
        Command::Features(args) => cmd_features(&client, args).await,
    }
}

fn build_client(args: &ApiArgs) -> Result<SpotifyClient> {
    let mut config = ClientConfig::new(
        args.client_id.clone().unwrap_or_default(),
        args.client_secret.clone().unwrap_or_default(),
    );
    if let Some(ref base) = args.api_base {
        config = config.with_api_base(base.clone());
    }
    SpotifyClient::new(config)
        .context("Failed to set up API client (set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET)")
}

// ============================================================================
// Output Helpers
// ============================================================================

fn print_results(results: &[RankedCandidate]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }
    for (i, ranked) in results.iter().enumerate() {
        let c = &ranked.candidate;
        let detail = match c.kind() {
            CandidateKind::Artist { followers } => followers
                .map(|f| format!("{} followers", f))
                .unwrap_or_default(),
            CandidateKind::Album { artists } => artists.join(", "),
        };
        println!(
            "{:>3}. [{:<6}] {} | {} (score {:.0}, {:?})",
            i + 1,
            c.entity_kind().as_str(),
            c.name,
            detail,
            ranked.score,
            ranked.branch
        );
    }
}

/// Mean raw value per feature, formatted in its natural unit.
fn print_collection_summary(collection: &Collection) {
    println!("\n{:=<60}", "");
    println!("{} ({} tracks)", collection.label, collection.len());
    if collection.is_empty() {
        println!("  No tracks with audio features.");
    } else {
        let n = collection.len() as f64;
        for feature in FEATURES {
            let mean = collection.tracks().iter().map(|t| feature.raw(t)).sum::<f64>() / n;
            println!("  {:<18} {}", feature.label(), feature.format(mean));
        }
    }
    println!("{:=<60}", "");
}

async fn retrieve(client: &SpotifyClient, selection: &Selection) -> Result<Collection> {
    let start = Instant::now();
    let pb = create_progress_bar(&format!("Retrieving {}", selection));
    let result = catalog::fetch_collection(client, selection, &pb).await;
    pb.finish_and_clear();

    let collection = result.with_context(|| format!("Failed to retrieve {}", selection))?;
    info!(
        %selection,
        tracks = collection.len(),
        elapsed = %format_duration(start.elapsed()),
        "retrieval complete"
    );
    Ok(collection)
}

// ============================================================================
// Subcommands
// ============================================================================

async fn cmd_search(client: &SpotifyClient, opts: &SearchOptions, args: SearchArgs) -> Result<()> {
    let query = args.query.join(" ");
    let pb = create_spinner(&format!("Searching for '{}'", query));
    let results = catalog::search(client, &query, opts).await;
    pb.finish_and_clear();

    let results = results.with_context(|| format!("Search for '{}' failed", query))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }
    Ok(())
}

async fn run_search(
    client: &SpotifyClient,
    opts: &SearchOptions,
    dispatch: Dispatch,
) -> (Dispatch, ApiResult<Vec<RankedCandidate>>) {
    let outcome = catalog::search(client, &dispatch.query, opts).await;
    (dispatch, outcome)
}

async fn cmd_interactive(client: &SpotifyClient, opts: &SearchOptions) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = SearchSession::default();
    let mut in_flight = FuturesUnordered::new();
    let mut stdin_open = true;

    eprintln!(
        "Type to search. ':N' selects result N, ':r' retries, ':refresh' renews the token, \
         ':q' quits."
    );

    loop {
        let deadline = session.deadline();
        let wake_at = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(tokio::time::Instant::now);

        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    stdin_open = false;
                    continue;
                };
                let line = line.trim_end();
                match line {
                    ":q" => break,
                    ":r" => match session.state() {
                        SearchState::Failed { query, .. } => {
                            let query = query.clone();
                            session.input(&query, Instant::now());
                        }
                        _ => eprintln!("Nothing to retry."),
                    },
                    ":refresh" => match client.refresh().await {
                        Ok(_) => eprintln!("Token renewed."),
                        Err(e) => eprintln!("Token refresh failed: {}", e),
                    },
                    cmd if cmd.starts_with(':') => {
                        let Some(picked) = cmd[1..]
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|i| session.results().get(i))
                            .map(|r| r.candidate.clone())
                        else {
                            eprintln!("No such result: {}", cmd);
                            continue;
                        };
                        session.select(&picked);
                        let selection = Selection::new(picked.entity_kind(), picked.id.clone());
                        println!("Selected {} ({})", picked.name, selection);

                        match retrieve(client, &selection).await {
                            Ok(collection) => print_collection_summary(&collection),
                            Err(e) => eprintln!("{:#}", e),
                        }
                    }
                    text => session.input(text, Instant::now()),
                }
            }

            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                if let Some(dispatch) = session.poll(Instant::now()) {
                    debug!(
                        generation = dispatch.generation,
                        query = %dispatch.query,
                        "dispatching search"
                    );
                    in_flight.push(run_search(client, opts, dispatch));
                }
            }

            Some((dispatch, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                match session.complete(&dispatch, outcome) {
                    Completion::Applied => {
                        println!("\nResults for '{}':", dispatch.query);
                        print_results(session.results());
                    }
                    Completion::Failed => {
                        if let SearchState::Failed { query, message } = session.state() {
                            eprintln!("Search for '{}' failed: {} (':r' to retry)", query, message);
                        }
                    }
                    Completion::Stale => {
                        debug!(
                            generation = dispatch.generation,
                            query = %dispatch.query,
                            "discarding stale results"
                        );
                    }
                }
            }

            else => break,
        }
    }

    Ok(())
}

async fn cmd_chart(client: &SpotifyClient, args: ChartArgs) -> Result<()> {
    if !(args.radius.is_finite() && args.radius > 0.0) {
        bail!("--radius must be a positive number, got {}", args.radius);
    }
    validate_output_path(&args.output, "svg", args.force)?;

    let left = retrieve(client, &args.left).await?;
    let right = match args.right {
        Some(ref selection) => Some(retrieve(client, selection).await?),
        None => None,
    };

    let mut sides = vec![(Side::Left, &left)];
    if let Some(ref right) = right {
        sides.push((Side::Right, right));
    }
    if sides.iter().all(|(_, c)| c.is_empty()) {
        warn!("no tracks with audio features; chart will only show the grid");
    }

    let svg = render_chart(&sides, &RadarGeometry::new(args.radius), args.curve);
    std::fs::write(&args.output, svg)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    for (_, collection) in &sides {
        print_collection_summary(collection);
    }
    println!("Wrote chart to {}", args.output.display());
    Ok(())
}

async fn cmd_features(client: &SpotifyClient, args: FeaturesArgs) -> Result<()> {
    if let Some(ref output) = args.output {
        validate_output_path(output, "json", args.force)?;
    }

    let collection = retrieve(client, &args.selection).await?;
    let average = average_values(collection.tracks()).map(|values| {
        FEATURES
            .iter()
            .zip(values)
            .map(|(f, v)| (f.name().to_string(), serde_json::Value::from(v)))
            .collect::<serde_json::Map<_, _>>()
    });
    let doc = serde_json::json!({
        "selection": args.selection.to_string(),
        "label": collection.label,
        "tracks": collection.tracks(),
        "average_normalized": average,
    });
    let text = serde_json::to_string_pretty(&doc)?;

    match args.output {
        Some(ref output) => {
            std::fs::write(output, text)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Wrote {} tracks to {}",
                collection.len(),
                output.display()
            );
        }
        None => println!("{}", text),
    }
    Ok(())
}

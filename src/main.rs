use clap::{Parser, Subcommand};
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tv_catalog::{
    ATTRIBUTION, ActiveView, BackPolicy, CachedCatalog, CatalogError, ClientConfig, EpisodeId,
    Listing, LoadTarget, NullRenderer, Orchestrator, Renderer, ShowId, Snapshot, TvMazeClient,
};

/// Longest summary excerpt printed per grid entry
const SUMMARY_EXCERPT_CHARS: usize = 160;

/// Browse the TVMaze catalog from the terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// API root of the catalog [default: the public TVMaze API]
    #[arg(long, env = "TV_CATALOG_BASE_URL")]
    base_url: Option<String>,

    /// Forget the show search when leaving an episode list
    #[arg(long)]
    clear_search_on_back: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all shows, optionally filtered
    Shows {
        /// Match against name, genres and summary
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List the episodes of a show
    Episodes {
        show_id: ShowId,
        /// Match against episode name and summary
        #[arg(short, long)]
        search: Option<String>,
        /// Show a single episode
        #[arg(short, long, conflicts_with = "search")]
        episode: Option<EpisodeId>,
    },
    /// Interactive session reading commands from stdin
    Browse,
}

/// A line entered in an interactive session
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    Open(ShowId),
    Episode(EpisodeId),
    AllEpisodes,
    Back,
    Help,
    Quit,
    Invalid(String),
}

const BROWSE_HELP: &str = "\
Commands:
  /TERM     search the current list (`/` alone clears the search)
  open ID   show the episodes of a show
  ep ID     show a single episode
  all       show every episode again
  back      return to the show list
  quit      leave";

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return Input::Search(term.to_string());
    }

    let (command, argument) = match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    match (command, argument) {
        ("open", id) => id
            .parse()
            .map(Input::Open)
            .unwrap_or_else(|_| Input::Invalid(format!("not a show id: '{}'", id))),
        ("ep", id) => id
            .parse()
            .map(Input::Episode)
            .unwrap_or_else(|_| Input::Invalid(format!("not an episode id: '{}'", id))),
        ("all", "") => Input::AllEpisodes,
        ("back", "") => Input::Back,
        ("help", "") | ("?", "") => Input::Help,
        ("quit", "") | ("exit", "") => Input::Quit,
        _ => Input::Invalid(format!("unknown command: '{}'", line)),
    }
}

/// Prints snapshots as a plain-text grid
#[derive(Debug, Default)]
struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&mut self, snapshot: &Snapshot<'_>) {
        if let Some(target) = snapshot.loading {
            match target {
                LoadTarget::Shows => println!("Loading shows..."),
                LoadTarget::Episodes(show_id) => println!("Loading episodes of show {}...", show_id),
            }
            return;
        }

        if let Some(error) = snapshot.error {
            println!("Error: {} (repeat the command to retry)", error);
        }

        match snapshot.listing {
            Listing::Shows(shows) => {
                println!("\n=== Shows ===");
                if !snapshot.show_search.is_empty() {
                    println!("Search: {}", snapshot.show_search);
                }
                for show in shows {
                    println!(
                        "[{:>6}] {}  |  {}  |  {}  |  Rating {}  |  {}",
                        show.id,
                        show.name,
                        show.genre_list(),
                        show.status_or_placeholder(),
                        show.rating_display(),
                        show.runtime_display()
                    );
                    println!("         {}", excerpt(&show.summary_text()));
                }
                println!(
                    "\nDisplaying {}/{} shows",
                    snapshot.counts.visible, snapshot.counts.total
                );
            }
            Listing::Episodes(episodes) => {
                let title = snapshot.current_show.map(|s| s.name.as_str()).unwrap_or_default();
                println!("\n=== {} ===", title);
                if !snapshot.episode_search.is_empty() {
                    println!("Search: {}", snapshot.episode_search);
                }
                for episode in episodes {
                    println!("[{:>7}] {}", episode.id, episode.label());
                    if let Some(url) = episode.image_url() {
                        println!("          {}", url);
                    }
                    println!("          {}", excerpt(&episode.summary_text()));
                }
                println!(
                    "\nDisplaying {}/{} episodes",
                    snapshot.counts.visible, snapshot.counts.total
                );
            }
        }

        println!("{}", ATTRIBUTION);
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= SUMMARY_EXCERPT_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(SUMMARY_EXCERPT_CHARS).collect();
    short.push_str("...");
    short
}

fn client_config(cli: &Cli) -> ClientConfig {
    match &cli.base_url {
        Some(base_url) => ClientConfig::default().with_base_url(base_url.as_str()),
        None => ClientConfig::default(),
    }
}

fn catalog(cli: &Cli) -> CachedCatalog<TvMazeClient> {
    CachedCatalog::new(TvMazeClient::with_config(client_config(cli)))
}

fn back_policy(cli: &Cli) -> BackPolicy {
    if cli.clear_search_on_back {
        BackPolicy::ClearSearch
    } else {
        BackPolicy::RestoreSearch
    }
}

async fn run_shows(cli: &Cli, search: Option<&str>) -> Result<(), CatalogError> {
    let mut browser = Orchestrator::new(catalog(cli), NullRenderer);
    browser.load_shows().await?;
    if let Some(term) = search {
        browser.search_shows(term);
    }

    TerminalRenderer.render(&browser.snapshot());
    Ok(())
}

async fn run_episodes(
    cli: &Cli,
    show_id: ShowId,
    search: Option<&str>,
    episode: Option<EpisodeId>,
) -> Result<(), CatalogError> {
    let mut browser = Orchestrator::new(catalog(cli), NullRenderer);
    browser.select_show(show_id).await?;
    if let Some(term) = search {
        browser.search_episodes(term);
    }
    if let Some(episode_id) = episode {
        if !browser.select_episode(episode_id) {
            eprintln!("Show {} has no episode {}", show_id, episode_id);
            process::exit(1);
        }
    }

    TerminalRenderer.render(&browser.snapshot());
    Ok(())
}

async fn run_browse(cli: &Cli) -> std::io::Result<()> {
    let mut browser =
        Orchestrator::new(catalog(cli), TerminalRenderer).with_back_policy(back_policy(cli));

    // Failures are already rendered; every command can simply be repeated.
    let _ = browser.load_shows().await;
    println!("{}", BROWSE_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Search(term) => {
                match browser.snapshot().active_view {
                    ActiveView::ShowList => browser.search_shows(&term),
                    ActiveView::EpisodeList => browser.search_episodes(&term),
                };
            }
            Input::Open(show_id) => {
                // The initial load may have failed
                if browser.state().all_shows().is_empty() {
                    let _ = browser.load_shows().await;
                }
                let _ = browser.select_show(show_id).await;
            }
            Input::Episode(episode_id) => {
                if !browser.select_episode(episode_id) {
                    println!("No episode {} in the current list", episode_id);
                }
            }
            Input::AllEpisodes => {
                browser.clear_episode_selection();
            }
            Input::Back => {
                if !browser.back() {
                    println!("Already on the show list");
                }
            }
            Input::Help => println!("{}", BROWSE_HELP),
            Input::Quit => break,
            Input::Invalid(message) => println!("{}\n{}", message, BROWSE_HELP),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Shows { search } => run_shows(&cli, search.as_deref()).await,
        Command::Episodes {
            show_id,
            search,
            episode,
        } => run_episodes(&cli, *show_id, search.as_deref(), *episode).await,
        Command::Browse => match run_browse(&cli).await {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

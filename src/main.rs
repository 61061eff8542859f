use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use read_sphere::config::{find_config_file, load_config, load_from_env, Config, LoggingConfig};
use read_sphere::grid::ViewportState;
use read_sphere::library::Library;
use read_sphere::models::{Book, BookSearchParams};
use read_sphere::pagination::InfiniteBooks;
use read_sphere::print_status;
use read_sphere::sources::{BookSource, CoverSize, OpenLibrarySource, QUICK_FILTERS};
use read_sphere::ui::{self, pages, BookCard, OwoColorize, Route, Spinner};
use read_sphere::utils::QueryCache;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Read Sphere - Browse the OpenLibrary catalog from your terminal
#[derive(Parser, Debug)]
#[command(name = "read-sphere")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search and browse millions of books from OpenLibrary", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a page by path: "/" (home), "/library", anything else is a 404
    Open {
        /// Route path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Browse the library interactively
    #[command(alias = "lib")]
    Library {
        /// Initial search query (overrides the configuration)
        #[arg(long, short)]
        query: Option<String>,

        /// Viewport width in pixels (defaults to the terminal width)
        #[arg(long)]
        width: Option<u32>,

        /// Viewport height in pixels (defaults to the terminal height)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Search for books once and print the results
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Fetch this single page instead of accumulating from page 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Results per page (overrides the configuration)
        #[arg(long, short)]
        limit: Option<u32>,

        /// Number of pages to accumulate
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Print the cover image URL for a cover id
    Cover {
        /// OpenLibrary cover id
        id: i64,

        /// Cover size: S, M or L
        #[arg(long, short, default_value = "L")]
        size: CoverSize,
    },

    /// List the quick filters
    Filters,

    /// Print the effective configuration
    Config,
}

/// A command typed into the interactive library
#[derive(Debug, Clone, PartialEq, Eq)]
enum LibraryCommand {
    Search(String),
    Filter(String),
    Down,
    Up,
    Width(u32),
    Retry,
    Help,
    Quit,
    Unknown(String),
}

impl LibraryCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(rest) = line.strip_prefix(':') else {
            return LibraryCommand::Search(line.to_string());
        };

        let (name, arg) = match rest.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "f" | "filter" => LibraryCommand::Filter(arg.to_string()),
            "j" | "down" => LibraryCommand::Down,
            "k" | "up" => LibraryCommand::Up,
            "w" | "width" => match arg.parse() {
                Ok(px) => LibraryCommand::Width(px),
                Err(_) => LibraryCommand::Unknown(line.to_string()),
            },
            "r" | "retry" => LibraryCommand::Retry,
            "h" | "help" => LibraryCommand::Help,
            "q" | "quit" => LibraryCommand::Quit,
            _ => LibraryCommand::Unknown(line.to_string()),
        }
    }
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Read Sphere - Environment Variables");
    println!();
    println!("API Settings:");
    println!("  READ_SPHERE_API__BASE_URL          OpenLibrary base URL (default: https://openlibrary.org)");
    println!("  READ_SPHERE_API__COVERS_URL        Cover image base URL (default: https://covers.openlibrary.org)");
    println!("  READ_SPHERE_API__PAGE_SIZE         Results per page (default: 20)");
    println!("  READ_SPHERE_API__TIMEOUT_SECONDS   Request timeout (default: 30)");
    println!("  READ_SPHERE_API__USER_AGENT        Custom User-Agent header");
    println!();
    println!("Cache Settings:");
    println!("  READ_SPHERE_CACHE__STALE_TIME_SECONDS  How long pages stay fresh (default: 300 = 5 min)");
    println!("  READ_SPHERE_CACHE__GC_TIME_SECONDS     How long inactive queries are kept (default: 600 = 10 min)");
    println!();
    println!("Search Settings:");
    println!("  READ_SPHERE_SEARCH__DEBOUNCE_MS     Input debounce window (default: 400)");
    println!("  READ_SPHERE_SEARCH__INITIAL_QUERY   Query the library opens with (default: science)");
    println!();
    println!("Grid Settings:");
    println!("  READ_SPHERE_GRID__OVERSCAN                 Rows rendered beyond the viewport (default: 3)");
    println!("  READ_SPHERE_GRID__DEFAULT_VIEWPORT_HEIGHT  Viewport height without a terminal (default: 900)");
    println!();
    println!("Logging:");
    println!("  READ_SPHERE_LOGGING__LEVEL   Log level (default: info)");
    println!("  READ_SPHERE_LOGGING__FORMAT  Set to \"json\" for JSON logs");
    println!("  RUST_LOG                     Rust logging filter (overrides the above)");
    println!();
    println!("Example:");
    println!("  export READ_SPHERE_API__PAGE_SIZE=\"40\"");
    println!("  export READ_SPHERE_SEARCH__INITIAL_QUERY=\"history\"");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    let config = load_settings(&cli)?;
    init_logging(&cli, &config.logging);

    match cli.command {
        Some(Commands::Open { path }) => match Route::parse(&path) {
            Route::Home => println!("{}", pages::render_home()),
            Route::Library => run_library(&config, None, None, None).await?,
            Route::NotFound(path) => println!("{}", pages::render_not_found(&path)),
        },

        Some(Commands::Library {
            query,
            width,
            height,
        }) => run_library(&config, query, width, height).await?,

        Some(Commands::Search {
            query,
            page,
            limit,
            pages,
        }) => {
            let source = OpenLibrarySource::from_config(&config.api)?;
            let limit = limit.unwrap_or(config.api.page_size);
            let show_spinner = !cli.quiet && ui::is_terminal();
            let spinner =
                show_spinner.then(|| Spinner::new(&format!("Searching \"{}\"...", query)));

            let result = if page > 1 {
                let params = BookSearchParams::new(query.as_str()).page(page).limit(limit);
                source.search(&params).await.map(|p| (p.docs, p.num_found))
            } else {
                let cache = QueryCache::from_config(&config.cache);
                let mut books = InfiniteBooks::new(Arc::new(source), cache).with_page_size(limit);
                books.set_query(&query, Instant::now());
                let loaded = books.load_pages(pages.max(1)).await.map(|_| ());
                loaded.map(|()| (books.books().to_vec(), books.total_found()))
            };

            match result {
                Ok((books, total)) => {
                    if let Some(spinner) = &spinner {
                        spinner.clear();
                    }
                    if !cli.quiet && cli.output != OutputFormat::Json {
                        eprintln!("{}", pages::status_line(false, total, &query));
                    }
                    output_books(&books, cli.output)?;
                }
                Err(e) => {
                    if let Some(spinner) = &spinner {
                        spinner.finish_with_error(&e.to_string());
                    }
                    return Err(e).context("Search failed");
                }
            }
        }

        Some(Commands::Cover { id, size }) => {
            let source = OpenLibrarySource::from_config(&config.api)?;
            match source.cover_url(Some(id), size) {
                Some(url) => println!("{}", url),
                None => {
                    print_status!(ui::Status::Warning, format!("No cover for id {}", id));
                }
            }
        }

        Some(Commands::Filters) => {
            if resolve_format(cli.output) == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&QUICK_FILTERS)?);
            } else {
                for filter in QUICK_FILTERS {
                    println!("{}", filter);
                }
            }
        }

        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
        }

        None => {
            // No command provided - show the landing page
            println!("{}", pages::render_home());
            println!("Use --help for usage information.");
        }
    }

    Ok(())
}

/// Load configuration from the given file, a default location, or the
/// environment alone
fn load_settings(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else {
        load_from_env()?
    };

    if let Some(timeout) = cli.timeout {
        config.api.timeout_seconds = timeout;
    }
    Ok(config)
}

/// Initialize tracing based on verbosity. Logs go to stderr so they never
/// interleave with rendered screens.
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let log_level = match cli.verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("read_sphere={}", env_filter)),
    );

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format.as_deref() == Some("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Run the interactive library until `:q` or end of input
async fn run_library(
    config: &Config,
    query: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(query) = query {
        config.search.initial_query = query;
    }

    let source: Arc<dyn BookSource> = Arc::new(OpenLibrarySource::from_config(&config.api)?);
    tracing::info!(source = source.name(), "Opening library");

    let (term_width, term_height) = ui::terminal_viewport();
    let viewport_width = width.or(term_width);
    let viewport_height = height
        .or(term_height)
        .unwrap_or(config.grid.default_viewport_height);
    let mut cells = cells_for(viewport_width);

    let mut library = Library::new(
        source,
        &config,
        ViewportState::new(viewport_width, viewport_height),
        Instant::now(),
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    redraw(&library, cells);
    loop {
        let deadline = library.debounce_deadline();

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let now = Instant::now();
                match LibraryCommand::parse(&line) {
                    LibraryCommand::Search(text) => library.type_input(&text, now),
                    LibraryCommand::Filter(name) => {
                        match QUICK_FILTERS.iter().find(|f| f.eq_ignore_ascii_case(&name)) {
                            Some(filter) => library.apply_quick_filter(filter, now),
                            None => {
                                print_status!(ui::Status::Warning, format!("Unknown filter: {}", name));
                                continue;
                            }
                        }
                    }
                    LibraryCommand::Down => library.scroll_page(true),
                    LibraryCommand::Up => library.scroll_page(false),
                    LibraryCommand::Width(px) => {
                        cells = cells_for(Some(px));
                        library.resize(Some(px), library.viewport().state().height);
                    }
                    LibraryCommand::Retry => library.retry(now),
                    LibraryCommand::Help => {
                        print_library_help();
                        continue;
                    }
                    LibraryCommand::Quit => break,
                    LibraryCommand::Unknown(text) => {
                        print_status!(ui::Status::Warning, format!("Unknown command: {} (:h for help)", text));
                        continue;
                    }
                }
                library.tick(now);
            }
            Some(outcome) = library.next_outcome() => {
                library.handle_outcome(outcome, Instant::now());
                library.tick(Instant::now());
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                library.tick(Instant::now());
            }
        }

        redraw(&library, cells);
    }

    Ok(())
}

/// Terminal cells available for the grid at a pixel width
fn cells_for(width: Option<u32>) -> usize {
    match width {
        Some(px) => (px / ui::CELL_WIDTH_PX) as usize,
        None => ui::terminal_width(),
    }
}

fn redraw(library: &Library, cells: usize) {
    if std::io::stdout().is_terminal() {
        print!("\x1B[2J\x1B[H");
    }
    println!("{}", library.render(cells));
    println!(
        "{}",
        ":f <filter>  :j/:k scroll  :w <px> width  :r retry  :h help  :q quit".dimmed()
    );
}

fn print_library_help() {
    ui::print_section("Library commands");
    println!("  <text>        search for <text>");
    println!("  :f <filter>   apply a quick filter ({})", QUICK_FILTERS.join(", "));
    println!("  :j / :k       scroll one screen down / up");
    println!("  :w <px>       set the viewport width in pixels");
    println!("  :r            retry after an error");
    println!("  :q            quit");
}

/// Resolve `Auto` to a concrete format for the current stdout
fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn output_books(books: &[Book], format: OutputFormat) -> Result<()> {
    match resolve_format(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(books)?);
        }
        OutputFormat::Plain => {
            let width = ui::terminal_width().saturating_sub(2).max(20);
            let styled = ui::is_terminal();
            for book in books {
                let card = BookCard::from_book(book);
                let lines = if styled {
                    card.render_styled(width)
                } else {
                    card.render_lines(width)
                };
                for line in lines {
                    println!("  {}", line);
                }
                println!("  {}", book.url());
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Year", "Subjects"]);

            for book in books {
                let card = BookCard::from_book(book);
                table.add_row(vec![
                    Cell::new(ui::truncate_with_ellipsis(&card.title, 50))
                        .add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&card.authors, 30)),
                    Cell::new(card.year.map(|y| y.to_string()).unwrap_or_default()),
                    Cell::new(ui::truncate_with_ellipsis(&card.subjects.join(", "), 40)),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

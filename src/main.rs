use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use election_insights::config::{Config, ConfigOverrides};
use election_insights::dashboard::{render_dashboard, ApiClient, Selection};
use election_insights::loader::{load_database, LoadSummary};
use election_insights::output::csv::{
    margins_to_csv, search_to_csv, seat_share_to_csv, turnout_to_csv,
};
use election_insights::output::json::render_json;
use election_insights::output::table::{
    render_close_margins_table, render_education_table, render_filter_options,
    render_gender_table, render_margin_table, render_search_table, render_seat_share_table,
    render_table_counts, render_turnout_table, render_vote_share_table,
    render_vote_share_trend_table,
};
use election_insights::query::filters::validate_search;
use election_insights::query::{
    QueryFilters, DEFAULT_CLOSE_MARGIN_LIMIT, DEFAULT_SEARCH_LIMIT, DEFAULT_TOP_VOTE_SHARE_LIMIT,
};
use election_insights::server::run_server;
use election_insights::store::ElectionStore;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "election-insights",
    about = "Indian general election results: loader, analytics API and dashboard"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    year: Option<i64>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long = "party")]
    parties: Vec<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    constituency: Option<String>,
}

impl From<FilterArgs> for QueryFilters {
    fn from(value: FilterArgs) -> Self {
        Self {
            year: value.year,
            state: value.state,
            parties: value.parties,
            gender: value.gender,
            constituency: value.constituency,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportKind {
    Tables,
    Filters,
    SeatShare,
    Turnout,
    Gender,
    VoteShare,
    Margins,
    Search,
    HighestTurnout,
    SeatChange,
    WomenParticipation,
    CloseMargins,
    VoteShareTrend,
    EducationWinRate,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild the database from the election CSV.
    Load {
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Serve the analytics API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Render the dashboard from a running API.
    Dashboard {
        #[arg(long = "api-url")]
        api_url: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        search: Option<String>,
    },
    /// Run one query against the local database.
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(overrides_for(&cli.command));

    match cli.command {
        Commands::Load { .. } => {
            let summary = load_database(
                &config.resolved_csv_path(),
                &config.resolved_db_path(),
                config.year_range(),
            )?;
            print_load_summary(&summary, cli.output)?;
        }
        Commands::Serve { host, port, .. } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let bind = format!("{host}:{port}");
            let addr: SocketAddr = bind
                .parse()
                .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
            run_server(config, addr).await?;
        }
        Commands::Dashboard {
            filters, search, ..
        } => {
            let client = ApiClient::from_config(&config.dashboard)?;
            let mut selection = Selection::new(filters.into());
            selection.search = search;
            println!("{}", render_dashboard(&client, &selection).await);
        }
        Commands::Report {
            kind,
            filters,
            limit,
            query,
            ..
        } => {
            let store = ElectionStore::open_read_only(&config.resolved_db_path())?;
            run_report(
                &store,
                &config,
                kind,
                filters.into(),
                limit,
                query.as_deref(),
                cli.output,
            )?;
        }
        Commands::Config { init, show } => {
            handle_config_command(init, show, &config, &config_path)?;
        }
    }

    Ok(())
}

fn overrides_for(command: &Commands) -> ConfigOverrides {
    match command {
        Commands::Load { csv, db } => ConfigOverrides {
            db_path: db.clone(),
            csv_path: csv.clone(),
            api_url: None,
        },
        Commands::Serve { db, .. } | Commands::Report { db, .. } => ConfigOverrides {
            db_path: db.clone(),
            ..ConfigOverrides::default()
        },
        Commands::Dashboard { api_url, .. } => ConfigOverrides {
            api_url: api_url.clone(),
            ..ConfigOverrides::default()
        },
        Commands::Config { .. } => ConfigOverrides::default(),
    }
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn run_report(
    store: &ElectionStore,
    config: &Config,
    kind: ReportKind,
    filters: QueryFilters,
    limit: Option<usize>,
    query: Option<&str>,
    output: OutputFormat,
) -> Result<()> {
    match kind {
        ReportKind::Tables => {
            let counts = store.table_counts()?;
            print_rows(&counts, output, render_table_counts, None)?;
        }
        ReportKind::Filters => {
            let options = store.filter_options()?;
            match output {
                OutputFormat::Table => println!("{}", render_filter_options(&options)),
                _ => print_json_fallback(&options, output)?,
            }
        }
        ReportKind::SeatShare => {
            let rows = store.party_seat_share(&filters)?;
            print_rows(&rows, output, render_seat_share_table, Some(seat_share_to_csv))?;
        }
        ReportKind::Turnout => {
            let rows = store.state_turnout(&filters)?;
            print_rows(&rows, output, render_turnout_table, Some(turnout_to_csv))?;
        }
        ReportKind::Gender => {
            let rows = store.gender_representation(filters.year)?;
            print_rows(&rows, output, render_gender_table, None)?;
        }
        ReportKind::VoteShare => {
            let year = match filters.year {
                Some(year) => year,
                None => store
                    .filter_options()?
                    .years
                    .into_iter()
                    .max()
                    .ok_or_else(|| anyhow!("no election years loaded"))?,
            };
            let rows =
                store.top_vote_share(year, limit.unwrap_or(DEFAULT_TOP_VOTE_SHARE_LIMIT))?;
            print_rows(&rows, output, render_vote_share_table, None)?;
        }
        ReportKind::Margins => {
            let rows = store.margin_distribution(&filters)?;
            print_rows(&rows, output, render_margin_table, Some(margins_to_csv))?;
        }
        ReportKind::Search => {
            let query = validate_search(query, config.server.search_min_chars)?;
            let rows = store.search_candidates(
                &query,
                &filters,
                limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
            )?;
            print_rows(&rows, output, render_search_table, Some(search_to_csv))?;
        }
        ReportKind::HighestTurnout => print_answer(store.highest_turnout()?, output, |a| {
            format!(
                "{} had the highest turnout in {}: {:.2}%",
                a.state_name, a.year, a.turnout_pct
            )
        })?,
        ReportKind::SeatChange => print_answer(store.biggest_seat_change()?, output, |a| {
            format!(
                "{} changed by {:+} seats in {}",
                a.party, a.seat_change, a.year
            )
        })?,
        ReportKind::WomenParticipation => {
            print_answer(store.women_participation()?, output, |a| {
                format!("{:.2}% of candidates were women", a.percentage)
            })?
        }
        ReportKind::CloseMargins => {
            let rows = store.closest_margins(limit.unwrap_or(DEFAULT_CLOSE_MARGIN_LIMIT))?;
            print_rows(&rows, output, render_close_margins_table, None)?;
        }
        ReportKind::VoteShareTrend => {
            let rows = store.vote_share_trend()?;
            print_rows(&rows, output, render_vote_share_trend_table, None)?;
        }
        ReportKind::EducationWinRate => {
            let rows = store.education_win_rate()?;
            print_rows(&rows, output, render_education_table, None)?;
        }
    }
    Ok(())
}

fn print_load_summary(summary: &LoadSummary, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", render_json(summary)?),
        _ => {
            println!("Database created at {}", summary.db_path.display());
            println!(
                "{} rows read, {} kept, {} missing keys, {} out of range, {} margins derived",
                summary.rows_read,
                summary.rows_kept,
                summary.rows_missing_keys,
                summary.rows_out_of_range,
                summary.margins_derived
            );
        }
    }
    Ok(())
}

fn print_rows<T: Serialize>(
    rows: &[T],
    output: OutputFormat,
    table: fn(&[T]) -> String,
    csv: Option<fn(&[T]) -> Result<String>>,
) -> Result<()> {
    match output {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No rows match the given filters.");
            } else {
                println!("{}", table(rows));
            }
        }
        OutputFormat::Json => println!("{}", render_json(rows)?),
        OutputFormat::Csv => match csv {
            Some(to_csv) => print!("{}", to_csv(rows)?),
            None => print_json_fallback(rows, output)?,
        },
    }
    Ok(())
}

fn print_answer<T: Serialize>(
    answer: Option<T>,
    output: OutputFormat,
    describe: impl Fn(&T) -> String,
) -> Result<()> {
    let Some(answer) = answer else {
        println!("No data available.");
        return Ok(());
    };
    match output {
        OutputFormat::Table => println!("{}", describe(&answer)),
        _ => print_json_fallback(&answer, output)?,
    }
    Ok(())
}

fn print_json_fallback<T: Serialize + ?Sized>(value: &T, output: OutputFormat) -> Result<()> {
    if matches!(output, OutputFormat::Csv) {
        warn!("CSV output not available for this report, using JSON");
    }
    println!("{}", render_json(value)?);
    Ok(())
}

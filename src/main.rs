use chrono::Local;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use engagedash::config::Config;
use engagedash::dashboard::{self, DashboardData, Snapshot};
use engagedash::dataset::{Dataset, Source};
use engagedash::filters::{parse_filter_args, FilterState};
use engagedash::serve::ServerContext;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "engagedash")]
#[command(author, version, about = "Student engagement analytics: clean the raw export, score engagement, explore it")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Raw data file (overrides config and ENGAGEDASH_RAW_PATH)
    #[arg(long, global = true, value_name = "FILE")]
    raw: Option<PathBuf>,

    /// Directory for the processed cache (overrides config and ENGAGEDASH_PROCESSED_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    processed_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, clean and cache the dataset
    Prepare,

    /// Print KPIs and group-bys for a filter selection
    Summary {
        /// Restrict a field, e.g. topic=Math (repeat to select several values)
        #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,

        /// Print the full dashboard as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal dashboard
    Tui,

    /// Serve the web dashboard
    Serve {
        /// Port to listen on (default from config, 3001)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write a standalone HTML dashboard
    Report {
        /// Output file (default: engagedash_report_<timestamp>.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Restrict a field, e.g. class=H
        #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
        filters: Vec<String>,
    },

    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let args = Args::parse();

    let mut config = Config::load();
    if let Some(raw) = args.raw.clone() {
        config.data.raw_path = raw;
    }
    if let Some(dir) = args.processed_dir.clone() {
        config.data.processed_dir = dir;
    }

    let log_file = matches!(args.command, Command::Tui).then(|| config.data.processed_dir.join("engagedash.log"));
    init_logging(args.verbose, log_file.as_deref());

    let result = match args.command {
        Command::Prepare => prepare(&config),
        Command::Summary { filters, json } => summary(&config, &filters, json),
        Command::Tui => engagedash::tui::run(config),
        Command::Serve { port } => serve(config, port),
        Command::Report { output, filters } => report(&config, output, &filters),
        Command::Completion { shell } => {
            clap_complete::generate(shell, &mut Args::command(), "engagedash", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Log to stderr, or to a file while the TUI owns the screen
fn init_logging(verbose: u8, log_file: Option<&Path>) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = log_file.and_then(|path| {
        std::fs::create_dir_all(path.parent()?).ok()?;
        File::create(path).ok()
    });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
}

fn prepare(config: &Config) -> anyhow::Result<()> {
    let dataset = Dataset::load(config)?;
    let origin = match dataset.source() {
        Source::Cache => "reused cache",
        Source::Derived => "derived from raw data",
    };
    eprintln!(
        "{} {} rows ({}) -> {}",
        "Prepared".green().bold(),
        dataset.table().len(),
        origin,
        config.processed_path().display()
    );
    Ok(())
}

/// Prepare the dataset and apply `FIELD=VALUE` arguments to a fresh filter state
fn load_with_filters(config: &Config, args: &[String]) -> anyhow::Result<(Dataset, FilterState)> {
    let pairs = parse_filter_args(args)?;
    let dataset = Dataset::load(config)?;
    let mut filters = FilterState::from_table(dataset.table());
    filters.restrict(&pairs)?;
    Ok((dataset, filters))
}

fn summary(config: &Config, filter_args: &[String], json: bool) -> anyhow::Result<()> {
    let (dataset, filters) = load_with_filters(config, filter_args)?;
    let snapshot = dashboard::build(dataset.table(), &filters, &config.dashboard);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    match &snapshot {
        Snapshot::NoMatches { message } => eprintln!("{} {}", "warning:".yellow().bold(), message),
        Snapshot::Ready(data) => print_summary(data, dataset.table().len()),
    }
    Ok(())
}

fn print_summary(data: &DashboardData, total: usize) {
    let k = &data.kpis;
    let opt = |v: Option<f64>, places: usize| v.map_or("n/a".to_string(), |v| format!("{:.*}", places, v));

    println!("{}", "Student Engagement Summary".bold());
    println!("{}", "─".repeat(60));
    println!("  Students:              {} of {}", k.students, total);
    println!("  Mean engagement:       {}", opt(k.mean_engagement, 2));
    println!("  Median engagement:     {}", opt(k.median_engagement, 2));
    println!("  Engagement vs class r: {}", opt(k.engagement_class_corr, 3));
    println!(
        "  Absent 7+ days:        {}",
        k.absence_above_7_share.map_or("n/a".to_string(), |s| format!("{:.1}%", s * 100.0))
    );
    println!("  Most common topic:     {}", k.most_common_topic.as_deref().unwrap_or("n/a"));
    println!("  Most common class:     {}", k.most_common_class.as_deref().unwrap_or("n/a"));

    if !data.by_class.is_empty() {
        println!("\n{}", "By performance class".bold());
        println!(
            "  {:<8} {:>8} {:>11} {:>8} {:>10} {:>14} {:>11}",
            "Class", "Students", "Engagement", "Hands", "Resources", "Announcements", "Discussion"
        );
        for c in &data.by_class {
            println!(
                "  {:<8} {:>8} {:>11} {:>8} {:>10} {:>14} {:>11}",
                c.class.name(),
                c.students,
                opt(c.engagement_score, 2),
                opt(c.raised_hands, 1),
                opt(c.visited_resources, 1),
                opt(c.announcements_view, 1),
                opt(c.discussion, 1)
            );
        }
    }

    if !data.by_topic.is_empty() {
        println!("\n{}", "Top topics by mean engagement".bold());
        for t in &data.by_topic {
            println!("  {:<16} {:>8} {:>4} students", t.topic, opt(t.mean_engagement, 2), t.students);
        }
    }
}

fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let dataset = Dataset::load(&config)?;
    let port = port.unwrap_or(config.server.port);
    let ctx = ServerContext::new(dataset.shared(), config.dashboard.clone(), config.data.raw_path.clone());
    engagedash::serve::start(port, ctx)?;
    Ok(())
}

fn report(config: &Config, output: Option<PathBuf>, filter_args: &[String]) -> anyhow::Result<()> {
    let (dataset, filters) = load_with_filters(config, filter_args)?;
    let snapshot = dashboard::build(dataset.table(), &filters, &config.dashboard);
    if let Snapshot::NoMatches { message } = &snapshot {
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    let output = output.unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("engagedash_report_{}.html", timestamp))
    });
    let payload = engagedash::report::Payload::new(&config.data.raw_path, &filters, &snapshot);
    engagedash::report::generate(&output, &payload)?;

    eprintln!("{} {}", "Report saved:".green().bold(), output.display());
    Ok(())
}

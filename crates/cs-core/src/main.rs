//! CrowdSense Core - venue occupancy estimation and anti-fraud
//!
//! The main entry point for cs-core, handling:
//! - Venue registration and listing
//! - Report submission through the cooldown/fraud/strike pipeline
//! - Displayed-value queries
//! - Reporter standing and retention maintenance
//! - Policy inspection and JSON schemas for agent output

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use cs_common::{Error, OutputFormat, ReporterId, Result, VenueId, SCHEMA_VERSION};
use cs_core::config::load_policy;
use cs_core::exit_codes::ExitCode;
use cs_core::log_event;
use cs_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use cs_core::output::{render, render_error, to_pretty, Render};
use cs_core::schema::{
    available_schemas, format_schema, generate_all_schemas, generate_schema, SchemaFormat,
};
use cs_core::store::{JsonFileStore, ReportStore};
use cs_core::tracker::Tracker;
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::field::display;

/// CrowdSense Core - crowd-sourced venue occupancy and line-wait estimates
#[derive(Parser)]
#[command(name = "cs-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to the report store file
    #[arg(long, global = true, env = "CROWDSENSE_STORE")]
    store: Option<PathBuf>,

    /// Path to policy.json (otherwise CROWDSENSE_POLICY, config dirs, defaults)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, list and (de)activate venues
    Venue(VenueArgs),

    /// Submit an occupancy/line-wait report
    Submit(SubmitArgs),

    /// Show a venue's current displayed values
    Show(ShowArgs),

    /// Inspect or reset a reporter's strikes
    Reporter(ReporterArgs),

    /// Delete reports older than the retention horizon
    Sweep(SweepArgs),

    /// Validate policy and store
    Check,

    /// Configuration management
    Config(ConfigArgs),

    /// Print JSON schemas for output types
    Schema(SchemaArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct VenueArgs {
    #[command(subcommand)]
    command: VenueCommands,
}

#[derive(Subcommand, Debug)]
enum VenueCommands {
    /// Register a new venue
    Add {
        /// Venue name
        name: String,
    },
    /// List venues with freshly computed values
    List {
        /// Include inactive venues
        #[arg(long)]
        all: bool,

        /// Evaluate at this RFC 3339 time instead of now
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<DateTime<Utc>>,
    },
    /// Show a venue in listings again
    Activate {
        venue: u64,
    },
    /// Hide a venue from listings
    Deactivate {
        venue: u64,
    },
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Venue id
    #[arg(long)]
    venue: u64,

    /// Reporter identity
    #[arg(long)]
    reporter: String,

    /// Occupancy level (1-10)
    #[arg(long, allow_negative_numbers = true)]
    occupancy: i64,

    /// Line-wait level (1-10)
    #[arg(long, allow_negative_numbers = true)]
    line: i64,

    /// Submission time as RFC 3339 (default: now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Venue id
    venue: u64,

    /// Evaluate at this RFC 3339 time instead of now
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct ReporterArgs {
    #[command(subcommand)]
    command: ReporterCommands,
}

#[derive(Subcommand, Debug)]
enum ReporterCommands {
    /// Show strikes and standing
    Status { reporter: String },
    /// Reset strikes to zero (flags already set remain)
    Reset { reporter: String },
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Override the policy retention horizon
    #[arg(long)]
    older_than_hours: Option<u32>,

    /// Sweep relative to this RFC 3339 time instead of now
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective policy and where it came from
    Show,
    /// Print the full effective policy as JSON
    Dump,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type name to print
    name: Option<String>,

    /// List available schema types
    #[arg(long)]
    list: bool,

    /// Print every schema
    #[arg(long)]
    all: bool,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    // JSON on stdout pairs with JSONL on stderr
    let log_format = match cli.global.format {
        OutputFormat::Json => Some(LogFormat::Jsonl),
        _ => None,
    };
    init_logging(&LogConfig::from_env(log_level, log_format));

    let run_id = generate_run_id();
    let span = tracing::info_span!("run", run_id = %run_id);
    let _guard = span.enter();

    let ctx = Ctx {
        global: &cli.global,
        run_id: &run_id,
    };

    let exit_code = match &cli.command {
        Commands::Venue(args) => run_venue(&ctx, args),
        Commands::Submit(args) => run_submit(&ctx, args),
        Commands::Show(args) => run_show(&ctx, args),
        Commands::Reporter(args) => run_reporter(&ctx, args),
        Commands::Sweep(args) => run_sweep(&ctx, args),
        Commands::Check => run_check(&ctx),
        Commands::Config(args) => run_config(&ctx, args),
        Commands::Schema(args) => run_schema(args),
        Commands::Version => {
            print_version(ctx.global);
            ExitCode::Clean
        }
    };

    log_event!(
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Init,
        "run finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared plumbing
// ============================================================================

struct Ctx<'a> {
    global: &'a GlobalOpts,
    run_id: &'a str,
}

impl Ctx<'_> {
    fn emit<T: Serialize + Render>(&self, command: &str, value: &T) {
        println!("{}", render(self.global.format, command, self.run_id, value));
    }

    fn fail(&self, command: &str, err: &Error) -> ExitCode {
        let use_color = !self.global.no_color && std::io::stderr().is_terminal();
        eprintln!("{}", render_error(self.global.format, command, err, use_color));
        ExitCode::from_error(err)
    }

    /// Run a fallible command body, emitting its value or its error.
    fn finish<T: Serialize + Render>(&self, command: &str, result: Result<T>) -> ExitCode {
        match result {
            Ok(value) => {
                self.emit(command, &value);
                ExitCode::Clean
            }
            Err(err) => self.fail(command, &err),
        }
    }

    fn store_path(&self) -> Result<PathBuf> {
        match &self.global.store {
            Some(path) => Ok(path.clone()),
            None => default_store_path(),
        }
    }

    fn open_tracker(&self) -> Result<Tracker<JsonFileStore>> {
        let loaded = load_policy(self.global.policy.as_deref())?;
        let store = JsonFileStore::open(self.store_path()?)?;
        log_event!(
            DEBUG,
            event_names::RUN_STARTED,
            Stage::Init,
            "store opened",
            path = display(store.path().display())
        );
        Tracker::new(store, loaded.policy)
    }
}

fn default_store_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join("crowdsense").join("store.json"))
        .ok_or_else(|| Error::Config("no data directory; pass --store or set CROWDSENSE_STORE".into()))
}

fn parse_reporter(raw: &str) -> Result<ReporterId> {
    ReporterId::parse(raw)
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_venue(ctx: &Ctx, args: &VenueArgs) -> ExitCode {
    match &args.command {
        VenueCommands::Add { name } => ctx.finish(
            "venue add",
            ctx.open_tracker().and_then(|mut t| t.register_venue(name)),
        ),
        VenueCommands::List { all, at } => {
            let now = at.unwrap_or_else(Utc::now);
            ctx.finish(
                "venue list",
                ctx.open_tracker().and_then(|mut t| t.list_venues(now, *all)),
            )
        }
        VenueCommands::Activate { venue } => ctx.finish(
            "venue activate",
            ctx.open_tracker()
                .and_then(|mut t| t.set_venue_active(VenueId(*venue), true)),
        ),
        VenueCommands::Deactivate { venue } => ctx.finish(
            "venue deactivate",
            ctx.open_tracker()
                .and_then(|mut t| t.set_venue_active(VenueId(*venue), false)),
        ),
    }
}

fn run_submit(ctx: &Ctx, args: &SubmitArgs) -> ExitCode {
    let now = args.at.unwrap_or_else(Utc::now);
    let result = parse_reporter(&args.reporter).and_then(|reporter| {
        let mut tracker = ctx.open_tracker()?;
        tracker.submit_report(
            VenueId(args.venue),
            &reporter,
            args.occupancy,
            args.line,
            now,
        )
    });

    match result {
        Ok(outcome) => {
            ctx.emit("submit", &outcome);
            if !outcome.accepted {
                ExitCode::CooldownRejected
            } else if outcome.flagged {
                ExitCode::Flagged
            } else {
                ExitCode::Clean
            }
        }
        Err(err) => ctx.fail("submit", &err),
    }
}

fn run_show(ctx: &Ctx, args: &ShowArgs) -> ExitCode {
    let now = args.at.unwrap_or_else(Utc::now);
    ctx.finish(
        "show",
        ctx.open_tracker()
            .and_then(|mut t| t.refresh_estimate(VenueId(args.venue), now)),
    )
}

fn run_reporter(ctx: &Ctx, args: &ReporterArgs) -> ExitCode {
    match &args.command {
        ReporterCommands::Status { reporter } => ctx.finish(
            "reporter status",
            parse_reporter(reporter).and_then(|r| ctx.open_tracker()?.reporter_standing(&r)),
        ),
        ReporterCommands::Reset { reporter } => ctx.finish(
            "reporter reset",
            parse_reporter(reporter).and_then(|r| ctx.open_tracker()?.reset_strikes(&r)),
        ),
    }
}

fn run_sweep(ctx: &Ctx, args: &SweepArgs) -> ExitCode {
    let now = args.at.unwrap_or_else(Utc::now);
    let older_than = args
        .older_than_hours
        .map(|h| Duration::hours(i64::from(h)));
    ctx.finish(
        "sweep",
        ctx.open_tracker()
            .and_then(|mut t| t.sweep_reports(now, older_than)),
    )
}

/// Result of `cs-core check`.
#[derive(Debug, Serialize)]
struct CheckReport {
    status: &'static str,
    policy_source: String,
    policy_path: Option<String>,
    store_path: String,
    store_exists: bool,
    venues: usize,
    reports: usize,
}

impl Render for CheckReport {
    fn markdown(&self) -> String {
        format!(
            "# Check\n\nStatus: {}\nPolicy: {}\nStore: {}{}\nVenues: {}\nReports: {}\n",
            self.status,
            self.policy_path.as_deref().unwrap_or("built-in defaults"),
            self.store_path,
            if self.store_exists { "" } else { " (not created yet)" },
            self.venues,
            self.reports
        )
    }

    fn summary(&self) -> String {
        format!(
            "check: {} ({} venues, {} reports)",
            self.status, self.venues, self.reports
        )
    }
}

fn check_report(ctx: &Ctx) -> Result<CheckReport> {
    let loaded = load_policy(ctx.global.policy.as_deref())?;
    let path = ctx.store_path()?;
    let store_exists = path.exists();
    let store = JsonFileStore::open(&path)?;
    Ok(CheckReport {
        status: "ok",
        policy_source: loaded.paths.policy_source.to_string(),
        policy_path: loaded.snapshot.policy_path.clone(),
        store_path: path.display().to_string(),
        store_exists,
        venues: store.venues()?.len(),
        reports: store.state().report_count(),
    })
}

fn run_check(ctx: &Ctx) -> ExitCode {
    ctx.finish("check", check_report(ctx))
}

fn run_config(ctx: &Ctx, args: &ConfigArgs) -> ExitCode {
    let loaded = match load_policy(ctx.global.policy.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => return ctx.fail("config", &err),
    };
    match args.command {
        ConfigCommands::Show => ctx.finish("config show", Ok(loaded.snapshot)),
        ConfigCommands::Dump => match serde_json::to_value(&loaded.policy) {
            Ok(value) => {
                println!("{}", to_pretty(&value));
                ExitCode::Clean
            }
            Err(err) => ctx.fail("config dump", &Error::Json(err)),
        },
    }
}

fn run_schema(args: &SchemaArgs) -> ExitCode {
    let format = if args.compact {
        SchemaFormat::JsonCompact
    } else {
        SchemaFormat::Json
    };

    if args.list {
        for (name, description) in available_schemas() {
            println!("{:<20} {}", name, description);
        }
        return ExitCode::Clean;
    }

    if args.all {
        let all = generate_all_schemas();
        match serde_json::to_value(&all) {
            Ok(value) => {
                println!("{}", format_schema(&value, format));
                return ExitCode::Clean;
            }
            Err(err) => {
                eprintln!("schema serialization failed: {}", err);
                return ExitCode::InternalError;
            }
        }
    }

    let Some(name) = args.name.as_deref() else {
        eprintln!("specify a type name, --list or --all");
        return ExitCode::ArgsError;
    };

    match generate_schema(name) {
        Some(schema) => {
            println!("{}", format_schema(&schema, format));
            ExitCode::Clean
        }
        None => {
            eprintln!(
                "unknown schema type '{}'; run 'cs-core schema --list'",
                name
            );
            ExitCode::ArgsError
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "cs_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{}", to_pretty(&version_info)),
        _ => {
            println!("cs-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

//! quote-queue - Inspect the share queue and manage quotes and pages
//!
//! Operator tool for everything the scheduler reads: page configurations,
//! page credentials, the quote pool, the share queue and the auto-post log.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use libquotecast::clock::{format_local_timestamp, to_local};
use libquotecast::logging::LoggingConfig;
use libquotecast::platforms::facebook::FacebookPublisher;
use libquotecast::schedule::{format_minutes, parse_minutes};
use libquotecast::types::{MinuteSet, WorkingHours};
use libquotecast::{
    AutoPostLogEntry, Config, Database, ImageSource, PageConfig, PostMode, QuotecastError, Result,
    ShareMode, ShareQueueItem, ShareStatus,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quote-queue")]
#[command(version)]
#[command(about = "Inspect the share queue and manage quotes and pages")]
#[command(long_about = "\
quote-queue - Inspect the share queue and manage quotes and pages

DESCRIPTION:
    quote-queue manages the data the quote-send scheduler works from.
    Use it to configure pages, store page tokens, import quotes, and
    check on pending shares and recent auto-post attempts.

COMMANDS:
    shares      List pending shares and the current local time
    logs        Show recent auto-post attempts
    import      Import quotes, one per line
    token       Store a page access token
    page        Create or update a page configuration

USAGE EXAMPLES:
    # Check what is waiting to be shared
    quote-queue shares

    # Last 50 attempts for one page, as JSON
    quote-queue logs --page 1234567890 --limit 50 --format json

    # Import quotes from a file (or stdin with -)
    quote-queue import quotes.txt

    # Exchange a user token for the page token and store it
    quote-queue token 1234567890 --user-token EAAB...

    # Post every 15 minutes between 06:00 and 22:00, alternating forms
    quote-queue page 1234567890 --enable --schedule 00,15,30,45 \\
        --working-hours 6-22 --mode alternate

    # Relay image posts to a second page at minute 10 of each hour
    quote-queue page 1234567890 --share-target 9876543210 \\
        --share-mode image-only --share-schedule 10

CONFIGURATION:
    Configuration file: ~/.config/quotecast/config.toml
    Database location: ~/.local/share/quotecast/quotecast.db

    Override with environment variables:
        QUOTECAST_CONFIG    - Path to config file
        QUOTECAST_DB_PATH   - Path to database file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Configuration or authentication error
    3 - Invalid input (bad format, schedule, page ID, etc.)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    #[arg(help = "Enable verbose logging to stderr (useful for debugging)")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List pending shares
    Shares {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Include shared and failed items
        #[arg(long)]
        all: bool,
    },

    /// Show recent auto-post attempts, newest first
    Logs {
        /// Only show attempts for this page
        #[arg(short, long)]
        page: Option<String>,

        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Import quotes, one per non-empty line
    Import {
        /// File to read, or - for stdin
        file: Option<PathBuf>,
    },

    /// Store the access token a page posts with
    Token {
        /// Page ID
        page_id: String,

        /// User token to exchange for the page token via the Graph API
        #[arg(long, required_unless_present = "page_token", conflicts_with = "page_token")]
        user_token: Option<String>,

        /// Page token to store as-is
        #[arg(long)]
        page_token: Option<String>,
    },

    /// Create or update a page configuration
    Page(PageArgs),
}

#[derive(Args, Debug, Default)]
struct PageArgs {
    /// Page ID
    page_id: String,

    /// Display name, used in image prompts
    #[arg(long)]
    name: Option<String>,

    /// Let the scheduler post to this page
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Stop posting to this page
    #[arg(long)]
    disable: bool,

    /// Minutes of the hour to post at, e.g. 00,15,30,45
    #[arg(long, value_parser = parse_schedule)]
    schedule: Option<MinuteSet>,

    /// Local hours to post in, as START-END (end exclusive), e.g. 6-22
    #[arg(long, value_parser = parse_working_hours)]
    working_hours: Option<WorkingHours>,

    /// Post form: text, image or alternate
    #[arg(long)]
    mode: Option<PostMode>,

    /// Image source: generated or templated-background
    #[arg(long)]
    image_source: Option<ImageSource>,

    /// Background image URL for templated images
    #[arg(long)]
    background_url: Option<String>,

    /// Font for templated images
    #[arg(long)]
    font: Option<String>,

    /// Image generation model
    #[arg(long)]
    model: Option<String>,

    /// Image resolution, e.g. 2K
    #[arg(long)]
    resolution: Option<String>,

    /// Image aspect ratio, e.g. 4:5
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// Image prompt with {{QUOTE}} and {{PAGE_NAME}} placeholders
    #[arg(long)]
    prompt: Option<String>,

    /// Background presets for text posts, rotated in order
    #[arg(long, value_delimiter = ',', conflicts_with = "no_presets")]
    presets: Option<Vec<String>>,

    /// Post text without background presets
    #[arg(long)]
    no_presets: bool,

    /// Page that receives shares of this page's posts
    #[arg(long)]
    share_target: Option<String>,

    /// Which posts to share: both, text-only or image-only
    #[arg(long)]
    share_mode: Option<ShareMode>,

    /// Minutes of the hour to relay shares at
    #[arg(long, value_parser = parse_schedule)]
    share_schedule: Option<MinuteSet>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("error", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database.path).await?;

    match cli.command {
        Commands::Shares { format, all } => cmd_shares(&db, &format, all).await,
        Commands::Logs {
            page,
            limit,
            format,
        } => cmd_logs(&db, page.as_deref(), limit, &format).await,
        Commands::Import { file } => cmd_import(&db, file).await,
        Commands::Token {
            page_id,
            user_token,
            page_token,
        } => cmd_token(&db, &config, &page_id, user_token, page_token).await,
        Commands::Page(args) => cmd_page(&db, args).await,
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(QuotecastError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn validate_page_id(page_id: &str) -> Result<()> {
    if page_id.trim().is_empty() {
        return Err(QuotecastError::InvalidInput(
            "Page ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| QuotecastError::InvalidInput(format!("failed to encode output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// List share queue items
async fn cmd_shares(db: &Database, format: &str, all: bool) -> Result<()> {
    validate_format(format)?;

    let status = if all { None } else { Some(ShareStatus::Pending) };
    let items = db.list_shares(status).await?;
    let local_time = to_local(Utc::now());

    if format == "json" {
        print_json(&serde_json::json!({
            "local_time": local_time.to_string(),
            "shares": items,
        }))
    } else {
        println!("Local time: {}", local_time);
        output_shares_text(&items);
        Ok(())
    }
}

fn output_shares_text(items: &[ShareQueueItem]) {
    let now = Utc::now().timestamp();

    for item in items {
        let detail = match item.status {
            ShareStatus::Pending => format!("waiting {}", format_age(now - item.created_at)),
            ShareStatus::Shared => item.shared_post_id.clone().unwrap_or_default(),
            ShareStatus::Failed => item.error_message.clone().unwrap_or_default(),
        };

        println!(
            "{} | {} -> {} | {} | {} | {} | {}",
            item.id.unwrap_or_default(),
            item.source_page_id,
            item.target_page_id,
            item.platform_post_id,
            item.post_type,
            item.status.as_str(),
            detail
        );
    }
}

/// Format an age in seconds in human-readable form
fn format_age(secs: i64) -> String {
    let minutes = secs.max(0) / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h{:02}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "<1m".to_string()
    }
}

/// Show recent auto-post log entries
async fn cmd_logs(db: &Database, page: Option<&str>, limit: usize, format: &str) -> Result<()> {
    validate_format(format)?;

    let entries = db.recent_logs(page, limit).await?;

    if format == "json" {
        return print_json(&serde_json::json!(entries));
    }

    for entry in &entries {
        println!("{}", format_log_line(entry));
    }
    Ok(())
}

fn format_log_line(entry: &AutoPostLogEntry) -> String {
    let post_type = entry
        .post_type
        .map(|t| t.as_str())
        .unwrap_or("-");
    let outcome = entry
        .platform_post_id
        .as_deref()
        .or(entry.error_message.as_deref())
        .unwrap_or("-");
    let quote = entry
        .quote_text
        .as_deref()
        .map(|q| truncate_content(q, 40))
        .unwrap_or_default();

    format!(
        "{} | {} | {} | {} | {} | {}",
        format_local_timestamp(entry.created_at),
        entry.page_id,
        entry.status.as_str(),
        post_type,
        outcome,
        quote
    )
}

/// Truncate content to `max_chars` characters with ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let head: String = content.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Add every non-empty line of the input to the quote pool
async fn cmd_import(db: &Database, file: Option<PathBuf>) -> Result<()> {
    let input = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path).map_err(|e| {
            QuotecastError::InvalidInput(format!("failed to read {}: {}", path.display(), e))
        })?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| QuotecastError::InvalidInput(format!("failed to read stdin: {}", e)))?;
            buffer
        }
    };

    let quotes = split_quotes(&input);
    for quote in &quotes {
        db.add_quote(quote).await?;
    }
    tracing::debug!(count = quotes.len(), "Imported quotes");

    let unused = db.count_unused_quotes().await?;
    println!("Imported {} quotes ({} unused in pool)", quotes.len(), unused);
    Ok(())
}

fn split_quotes(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Store a page credential, exchanging a user token first when given one
async fn cmd_token(
    db: &Database,
    config: &Config,
    page_id: &str,
    user_token: Option<String>,
    page_token: Option<String>,
) -> Result<()> {
    validate_page_id(page_id)?;

    let token = match (user_token, page_token) {
        (_, Some(token)) => token,
        (Some(user_token), None) => {
            let publisher = FacebookPublisher::new(&config.facebook)?;
            publisher.fetch_page_token(page_id, &user_token).await?
        }
        (None, None) => {
            return Err(QuotecastError::InvalidInput(
                "either --user-token or --page-token is required".to_string(),
            ))
        }
    };

    if token.trim().is_empty() {
        return Err(QuotecastError::InvalidInput(
            "Page token cannot be empty".to_string(),
        ));
    }

    db.set_credential(page_id, token.trim()).await?;
    tracing::debug!(page_id, "Stored page credential");
    println!("Stored page token for {}", page_id);
    Ok(())
}

/// Create or update a page configuration
async fn cmd_page(db: &Database, args: PageArgs) -> Result<()> {
    validate_page_id(&args.page_id)?;

    let mut config = db
        .get_page_config(&args.page_id)
        .await?
        .unwrap_or_else(|| PageConfig::new(args.page_id.clone()));
    apply_page_args(&mut config, args);

    db.upsert_page_config(&config).await?;
    println!("{}", describe_page(&config));
    Ok(())
}

fn apply_page_args(config: &mut PageConfig, args: PageArgs) {
    if args.enable {
        config.enabled = true;
    }
    if args.disable {
        config.enabled = false;
    }
    if let Some(name) = args.name {
        config.page_name = Some(name);
    }
    if let Some(minutes) = args.schedule {
        config.schedule_minutes = Some(minutes);
    }
    if let Some(hours) = args.working_hours {
        config.working_hours = hours;
    }
    if let Some(mode) = args.mode {
        config.post_mode = Some(mode);
    }

    let image = &mut config.image;
    if let Some(source) = args.image_source {
        image.source = source;
    }
    if args.background_url.is_some() {
        image.background_url = args.background_url;
    }
    if args.font.is_some() {
        image.font = args.font;
    }
    if args.model.is_some() {
        image.model = args.model;
    }
    if args.resolution.is_some() {
        image.resolution = args.resolution;
    }
    if args.aspect_ratio.is_some() {
        image.aspect_ratio = args.aspect_ratio;
    }
    if args.prompt.is_some() {
        image.prompt_template = args.prompt;
    }

    if let Some(presets) = args.presets {
        let presets: Vec<String> = presets
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        config.color.enabled = !presets.is_empty();
        config.color.presets = presets;
        config.color.index = 0;
    }
    if args.no_presets {
        config.color.enabled = false;
    }

    if args.share_target.is_some() {
        config.share_target_page_id = args.share_target.filter(|t| !t.trim().is_empty());
    }
    if let Some(mode) = args.share_mode {
        config.share_mode = mode;
    }
    if let Some(minutes) = args.share_schedule {
        config.share_schedule_minutes = Some(minutes);
    }
}

fn describe_page(config: &PageConfig) -> String {
    let schedule = config
        .schedule_minutes
        .as_ref()
        .map(format_minutes)
        .unwrap_or_else(|| "default".to_string());
    let mode = config.post_mode.map(|m| m.as_str()).unwrap_or("unset");
    let share = match &config.share_target_page_id {
        Some(target) => format!("{} ({})", target, config.share_mode.as_str()),
        None => "none".to_string(),
    };

    format!(
        "{} | {} | mode {} | minutes {} | hours {}-{} | token {} | share {}",
        config.page_id,
        if config.enabled { "enabled" } else { "disabled" },
        mode,
        schedule,
        config.working_hours.start,
        config.working_hours.end,
        if config.credential.is_some() { "set" } else { "missing" },
        share
    )
}

fn parse_schedule(input: &str) -> std::result::Result<MinuteSet, String> {
    let minutes = parse_minutes(input);
    if minutes.is_empty() {
        return Err(format!("no valid minutes (0-59) in '{}'", input));
    }
    Ok(minutes)
}

fn parse_working_hours(input: &str) -> std::result::Result<WorkingHours, String> {
    let (start, end) = input
        .split_once('-')
        .ok_or_else(|| format!("expected START-END, got '{}'", input))?;
    let start: u8 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start hour '{}'", start.trim()))?;
    let end: u8 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end hour '{}'", end.trim()))?;

    if start >= end || end > 24 {
        return Err(format!(
            "working hours must satisfy START < END <= 24, got {}-{}",
            start, end
        ));
    }
    Ok(WorkingHours { start, end })
}

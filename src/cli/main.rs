//! model-explorer: explore ERP model metadata and export it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use model_explorer_sdk::cli::commands::{
    DEFAULT_SELECTION_FILE, Session, cache, explore, export, select,
};
use model_explorer_sdk::cli::output::format_stats;
use model_explorer_sdk::config::ExplorerConfig;
use model_explorer_sdk::export::{DiagramFormat, DiagramStyle, Framework, PromptOptions};

#[derive(Parser)]
#[command(name = "model-explorer", about = "Explore and export ERP model metadata", version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Selection file
    #[arg(long, global = true, default_value = DEFAULT_SELECTION_FILE)]
    selection: PathBuf,

    /// Print cache statistics when done
    #[arg(long, global = true)]
    stats: bool,

    /// Increase verbosity (-v DEBUG, -vv TRACE)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Config file (defaults to ./model-explorer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the server
    #[arg(long, global = true)]
    url: Option<String>,

    /// Database name
    #[arg(long, global = true)]
    database: Option<String>,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true, env = "ODOO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Bearer token, used instead of username and password
    #[arg(long, global = true, env = "ODOO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Work offline from a catalog JSON file instead of a server
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Cache directory (defaults to ~/.odoo_explorer)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Args)]
struct PromptArgs {
    /// Description of the app to build
    #[arg(long)]
    description: Option<String>,

    /// Leave timezone fields out of the schema
    #[arg(long)]
    exclude_timezone: bool,

    /// Add timezone handling guidance
    #[arg(long)]
    timezone_handling: bool,

    /// Output file (prints to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List models, optionally filtered by a search term
    Models {
        query: Option<String>,
        #[arg(long)]
        refresh: bool,
    },
    /// Show the fields of a model
    Fields {
        model: String,
        #[arg(long)]
        refresh: bool,
    },
    /// Analyze a model's fields and relationships
    Analyze {
        model: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the latest record of a model
    Sample {
        model: String,
        /// Keep relation fields as raw ids
        #[arg(long)]
        no_expand: bool,
        #[arg(long, default_value_t = 1)]
        depth: u32,
        #[arg(long)]
        refresh: bool,
    },
    /// Manage the model and field selection
    Select {
        #[command(subcommand)]
        action: SelectAction,
    },
    /// Export the selected models as JSON or YAML
    ExportSchema {
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long, default_value = "json")]
        format: String,
        /// Leave relationship edges out
        #[arg(long)]
        no_relationships: bool,
        #[arg(long)]
        exclude_timezone: bool,
        #[arg(long)]
        timezone_handling: bool,
        /// Add a generation timestamp
        #[arg(long)]
        timestamp: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate an app development prompt for the selection
    LlmPrompt(PromptArgs),
    /// Generate a mobile app development prompt for the selection
    MobilePrompt {
        #[command(flatten)]
        prompt: PromptArgs,
        /// react-native, flutter, ...
        #[arg(long)]
        framework: Option<String>,
    },
    /// Mobile app analysis of the selection as JSON
    MobileAnalysis {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Markdown summary of the API endpoints the selection needs
    ApiSummary {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate a React Native details screen for a model
    Component {
        model: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a mobile development package for a model
    Package {
        model: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Draw the relationships of a model
    Diagram {
        model: String,
        #[arg(long, default_value_t = 1)]
        depth: u32,
        /// mermaid or plantuml
        #[arg(long, default_value = "mermaid")]
        format: DiagramFormat,
        #[arg(long)]
        monochrome: bool,
        #[arg(long)]
        background_color: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete all cached metadata and reload the model list
    ClearCache,
}

#[derive(Subcommand)]
enum SelectAction {
    /// Select models
    Add { models: Vec<String> },
    /// Deselect models
    Remove { models: Vec<String> },
    /// Deselect everything
    Clear,
    /// Show the current selection
    Show,
    /// Set, toggle or reset the fields of a model
    Fields {
        model: String,
        /// Replace the field set with these fields (required fields are always kept)
        #[arg(long, value_delimiter = ',')]
        set: Vec<String>,
        /// Toggle these fields
        #[arg(long, value_delimiter = ',', conflicts_with = "set")]
        toggle: Vec<String>,
        #[arg(long, conflicts_with_all = ["set", "toggle", "none"])]
        all: bool,
        #[arg(long, conflicts_with_all = ["set", "toggle"])]
        none: bool,
    },
    /// Pick fields interactively
    Pick { model: String },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose > 0)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

fn load_config(args: &ConnectionArgs) -> Result<ExplorerConfig> {
    let mut config = ExplorerConfig::discover(args.config.as_deref())
        .context("Failed to load configuration")?;

    let server = &mut config.server;
    if args.url.is_some() {
        server.url = args.url.clone();
    }
    if args.database.is_some() {
        server.database = args.database.clone();
    }
    if args.username.is_some() {
        server.username = args.username.clone();
    }
    if args.password.is_some() {
        server.password = args.password.clone();
    }
    if args.token.is_some() {
        server.token = args.token.clone();
    }
    if args.cache_dir.is_some() {
        config.cache.dir = args.cache_dir.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn prompt_options(
    config: &ExplorerConfig,
    args: &PromptArgs,
    framework: Option<&str>,
) -> PromptOptions {
    let mut options = config.export.prompt_options();
    if let Some(description) = &args.description {
        options = options.with_app_description(description.clone());
    }
    if args.exclude_timezone {
        options = options.with_exclude_timezone(true);
    }
    if args.timezone_handling {
        options = options.with_timezone_handling(true);
    }
    if let Some(framework) = framework {
        options = options.with_framework(framework.parse::<Framework>().unwrap_or_default());
    }
    options
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.connection)?;
    let mut session = Session::open(config, cli.connection.catalog.as_deref(), cli.selection)?;

    match cli.command {
        Command::Models { query, refresh } => {
            explore::handle_models(&mut session, query.as_deref(), refresh)?
        }
        Command::Fields { model, refresh } => explore::handle_fields(&mut session, &model, refresh)?,
        Command::Analyze { model, json } => explore::handle_analyze(&mut session, &model, json)?,
        Command::Sample {
            model,
            no_expand,
            depth,
            refresh,
        } => explore::handle_sample(&mut session, &model, !no_expand, depth, refresh)?,
        Command::Select { action } => match action {
            SelectAction::Add { models } => select::handle_select_add(&mut session, &models)?,
            SelectAction::Remove { models } => select::handle_select_remove(&mut session, &models)?,
            SelectAction::Clear => select::handle_select_clear(&mut session)?,
            SelectAction::Show => select::handle_select_show(&session)?,
            SelectAction::Fields {
                model,
                set,
                toggle,
                all,
                none,
            } => {
                let action = if all {
                    select::FieldsAction::All
                } else if none {
                    select::FieldsAction::None
                } else if !toggle.is_empty() {
                    select::FieldsAction::Toggle(toggle)
                } else {
                    select::FieldsAction::Set(set)
                };
                select::handle_select_fields(&mut session, &model, action)?
            }
            SelectAction::Pick { model } => select::handle_select_pick(&mut session, &model)?,
        },
        Command::ExportSchema {
            depth,
            format,
            no_relationships,
            exclude_timezone,
            timezone_handling,
            timestamp,
            output,
        } => {
            let mut options = session.config.export.schema_options();
            if let Some(depth) = depth {
                options = options.with_depth(depth);
            }
            options = options
                .with_relationships(!no_relationships)
                .with_exclude_timezone(options.exclude_timezone || exclude_timezone)
                .with_timezone_handling(options.timezone_handling || timezone_handling)
                .with_timestamp(timestamp);
            export::handle_export_schema(&mut session, options, &format, output.as_deref())?
        }
        Command::LlmPrompt(args) => {
            let options = prompt_options(&session.config, &args, None);
            export::handle_llm_prompt(&mut session, options, args.output.as_deref())?
        }
        Command::MobilePrompt { prompt, framework } => {
            let mut options = prompt_options(&session.config, &prompt, framework.as_deref());
            if !options.exclude_timezone {
                options = options.with_timezone_handling(true);
            }
            export::handle_mobile_prompt(&mut session, options, prompt.output.as_deref())?
        }
        Command::MobileAnalysis { output } => {
            export::handle_mobile_analysis(&mut session, output.as_deref())?
        }
        Command::ApiSummary { output } => export::handle_api_summary(&mut session, output.as_deref())?,
        Command::Component { model, output } => {
            export::handle_component(&mut session, &model, output.as_deref())?
        }
        Command::Package { model, output } => {
            export::handle_package(&mut session, &model, output.as_deref())?
        }
        Command::Diagram {
            model,
            depth,
            format,
            monochrome,
            background_color,
            output,
        } => {
            let mut style = DiagramStyle::default().with_monochrome(monochrome);
            if let Some(color) = background_color {
                style = style.with_background_color(color);
            }
            export::handle_diagram(&mut session, &model, depth, format, style, output.as_deref())?
        }
        Command::ClearCache => cache::handle_clear_cache(&mut session)?,
    }

    let stats = session.close();
    if cli.stats {
        eprint!("{}", format_stats(&stats));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

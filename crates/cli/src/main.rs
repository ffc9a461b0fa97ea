use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use color_eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;
use utapi_core::{config_exists, load_config, Acl, LoggingConfig};

mod handlers;
mod wizard;

/// utapi - manage UploadThing files from the terminal
#[derive(Parser, Debug)]
#[command(name = "utapi")]
#[command(version)]
#[command(about = "Manage UploadThing files from your terminal", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Initial setup (interactive wizard)
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Stored files
    Files {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Storage usage of the app
    Usage {
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// App id and ACL defaults
    AppInfo {
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Presigned URL for a private file
    Url {
        /// File key
        key: String,
        /// Expiration in seconds (provider default when omitted)
        #[arg(short, long)]
        expires: Option<u32>,
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Upload a local file
    Upload {
        /// Local file to upload
        file: String,
        /// Access control for the uploaded file
        #[arg(long, value_enum, default_value = "public-read")]
        acl: AclArg,
        /// Custom identifier stored with the file
        #[arg(long)]
        custom_id: Option<String>,
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },

    /// Diagnostics
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Edit the configuration in $EDITOR
    Edit,
    /// Validate the configuration and the API key
    Validate,
}

#[derive(clap::Subcommand, Debug)]
enum FileAction {
    /// List files
    List {
        /// Page size
        #[arg(short, long, default_value = "100")]
        limit: u32,
        /// Number of files to skip
        #[arg(long, default_value = "0")]
        offset: u32,
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },
    /// Delete files by key
    Delete {
        /// File keys
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Rename a file
    Rename {
        /// File key
        key: String,
        /// New file name
        new_name: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum DoctorAction {
    /// Check the installation
    Check,
    /// Test the connection to UploadThing
    TestConnection,
}

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Access control accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AclArg {
    PublicRead,
    Private,
}

impl From<AclArg> for Acl {
    fn from(arg: AclArg) -> Self {
        match arg {
            AclArg::PublicRead => Acl::PublicRead,
            AclArg::Private => Acl::Private,
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    let logging = if config_exists() {
        load_config().map(|c| c.logging_or_default()).unwrap_or_default()
    } else {
        LoggingConfig::default()
    };
    init_tracing(&logging);

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => match action {
            ConfigAction::Show => handlers::handle_config_show(),
            ConfigAction::Edit => handlers::handle_config_edit(),
            ConfigAction::Validate => handlers::handle_config_validate().await,
        },
        Commands::Files { action } => match action {
            FileAction::List {
                limit,
                offset,
                output,
            } => handlers::handle_files_list(limit, offset, output).await,
            FileAction::Delete { keys } => handlers::handle_files_delete(keys).await,
            FileAction::Rename { key, new_name } => {
                handlers::handle_files_rename(&key, &new_name).await
            }
        },
        Commands::Usage { output } => handlers::handle_usage(output).await,
        Commands::AppInfo { output } => handlers::handle_app_info(output).await,
        Commands::Url {
            key,
            expires,
            output,
        } => handlers::handle_url(&key, expires, output).await,
        Commands::Upload {
            file,
            acl,
            custom_id,
            output,
        } => handlers::handle_upload(&file, acl.into(), custom_id.as_deref(), output).await,
        Commands::Completion { shell } => handlers::handle_completion(&shell, &mut Cli::command()),
        Commands::Doctor { action } => match action {
            DoctorAction::Check => handlers::handle_doctor_check(),
            DoctorAction::TestConnection => handlers::handle_doctor_test_connection().await,
        },
    }
}

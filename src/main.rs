mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskdesk::config::{ServeConfig, default_db_path};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "taskdesk",
    version,
    about = "Minimal task and user management HTTP API"
)]
struct Cli {
    /// Path to the database file (default: .taskdesk/taskdesk.db in current dir)
    #[arg(long, env = "TASKDESK_DB", global = true)]
    db: Option<PathBuf>,

    /// Output as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database in the current directory
    Init {
        /// Add two sample tasks to an empty database
        #[arg(long)]
        seed: bool,
    },
    /// Run the HTTP API (docs at /docs)
    Serve(ServeConfig),
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Create a task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List tasks (newest first)
    List {
        /// Filter by status (todo, ongoing, done)
        #[arg(short, long)]
        status: Option<String>,
        /// Sort by created_at, title or status
        #[arg(long, default_value = "created_at")]
        sort: String,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
    /// Search titles and descriptions
    Search {
        keyword: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
    /// Show a task
    Show {
        /// Task ID
        id: i64,
    },
    /// Change a task's title or description
    Edit {
        /// Task ID
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Set a task's status
    Status {
        /// Task ID
        id: i64,
        /// New status (todo, ongoing, done)
        status: String,
    },
    /// Assign a task to a user; omit --user to unassign
    Assign {
        /// Task ID
        id: i64,
        /// User ID
        #[arg(long)]
        user: Option<i64>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user
    Add { name: String, email: String },
    /// List users by name
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        page_size: i64,
    },
    /// Show a user and their tasks
    Show {
        /// User ID
        id: i64,
    },
    /// Change a user's name or email
    Edit {
        /// User ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete a user (their tasks become unassigned)
    Delete {
        /// User ID
        id: i64,
    },
}

/// Logs go to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    init_tracing(match cli.command {
        Commands::Serve(_) => "info,tower_http=debug",
        _ => "warn",
    });

    let db_path = match cli.db {
        Some(p) => p,
        None => match default_db_path() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: cannot determine current directory: {e}");
                std::process::exit(1);
            }
        },
    };
    let json = cli.json;

    let result = match cli.command {
        Commands::Init { seed } => commands::init::run(&db_path, seed),
        Commands::Serve(config) => commands::serve::run(&db_path, &config),
        Commands::Task { action } => match action {
            TaskAction::Add { title, description } => {
                commands::task::add(&db_path, &title, description.as_deref(), json)
            }
            TaskAction::List {
                status,
                sort,
                asc,
                page,
                page_size,
            } => commands::task::list(
                &db_path,
                status.as_deref(),
                &sort,
                asc,
                page,
                page_size,
                json,
            ),
            TaskAction::Search {
                keyword,
                page,
                page_size,
            } => commands::task::search(&db_path, &keyword, page, page_size, json),
            TaskAction::Show { id } => commands::task::show(&db_path, id, json),
            TaskAction::Edit {
                id,
                title,
                description,
            } => commands::task::edit(
                &db_path,
                id,
                title.as_deref(),
                description.as_deref(),
                json,
            ),
            TaskAction::Status { id, status } => {
                commands::task::status(&db_path, id, &status, json)
            }
            TaskAction::Assign { id, user } => commands::task::assign(&db_path, id, user, json),
            TaskAction::Delete { id } => commands::task::delete(&db_path, id),
        },
        Commands::User { action } => match action {
            UserAction::Add { name, email } => commands::user::add(&db_path, &name, &email, json),
            UserAction::List { page, page_size } => {
                commands::user::list(&db_path, page, page_size, json)
            }
            UserAction::Show { id } => commands::user::show(&db_path, id, json),
            UserAction::Edit { id, name, email } => commands::user::edit(
                &db_path,
                id,
                name.as_deref(),
                email.as_deref(),
                json,
            ),
            UserAction::Delete { id } => commands::user::delete(&db_path, id),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

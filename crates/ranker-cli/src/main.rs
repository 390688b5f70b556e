//! ranker CLI - Reorder ranked events and locations from the command line.

mod commands;
mod interactive;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ranker_core::Category;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ranker")]
#[command(author, version, about = "Manual priority ordering for events and locations")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Store path (defaults to current directory)
    #[arg(long, short = 'C', global = true)]
    path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new store
    Init,

    /// Add an item to the catalog
    Add {
        /// Display name
        name: String,

        /// Category (event or location)
        #[arg(long = "type", short = 't')]
        category: Category,

        /// Explicit uid (defaults to <type>-<slug of name>)
        #[arg(long, short = 'u')]
        uid: Option<String>,
    },

    /// Show the current priority order
    #[command(alias = "ls")]
    List,

    /// Show recently added items
    Recent {
        /// Number of items (defaults to the configured display count)
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Search the catalog by key or name
    Search {
        /// Search text
        query: String,

        /// Maximum results
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Reorder the priority list and commit the changes
    Edit {
        /// Operations applied in order: ins:[<type>:]<key>, del:<index>, mv:<from>:<to>
        ops: Vec<String>,

        /// Interactive mode - prompt for each edit
        #[arg(long, short = 'i')]
        interactive: bool,

        /// Show the resulting changes without committing
        #[arg(long)]
        dry_run: bool,

        /// Commit without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, short = 'p', default_value = "17373")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Determine store path
    let store_path = match cli.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init => commands::init(&store_path, cli.format),
        Commands::Add {
            name,
            category,
            uid,
        } => commands::add(&store_path, &name, category, uid.as_deref(), cli.format),
        Commands::List => commands::list(&store_path, cli.format),
        Commands::Recent { limit } => commands::recent(&store_path, limit, cli.format),
        Commands::Search { query, limit } => {
            commands::search(&store_path, &query, limit, cli.format)
        }
        Commands::Edit {
            ops,
            interactive,
            dry_run,
            yes,
        } => {
            let options = commands::EditOptions {
                dry_run,
                yes,
                interactive,
            };
            commands::edit(&store_path, &ops, &options, cli.format)
        }
        Commands::Serve { port, host } => commands::serve(&store_path, &host, port),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_ops() {
        let cli = Cli::try_parse_from(["ranker", "edit", "del:1", "mv:1:0", "ins:evt-9", "-y"])
            .unwrap();
        match cli.command {
            Commands::Edit { ops, yes, .. } => {
                assert_eq!(ops, vec!["del:1", "mv:1:0", "ins:evt-9"]);
                assert!(yes);
            }
            _ => panic!("Expected Edit"),
        }
    }

    #[test]
    fn test_parse_category() {
        let cli = Cli::try_parse_from([
            "ranker", "add", "Harbour", "--type", "location", "--uid", "loc-7",
        ])
        .unwrap();
        match cli.command {
            Commands::Add { category, uid, .. } => {
                assert_eq!(category, Category::Location);
                assert_eq!(uid.as_deref(), Some("loc-7"));
            }
            _ => panic!("Expected Add"),
        }
        assert!(Cli::try_parse_from(["ranker", "add", "X", "--type", "venue"]).is_err());
    }
}

//! newsnow-db - inspect and maintain the NewsNow cache and user tables.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use newsnow_store::{logging, CacheTable, Config, Database, UserTable};

#[derive(Debug, Parser)]
#[command(name = "newsnow-db")]
#[command(version, about = "Inspect and maintain the NewsNow cache and user tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Create the cache and user tables
    Init,

    /// Print a cache entry
    CacheGet {
        /// Cache key (source id)
        key: String,
    },

    /// Remove a cache entry
    CacheDelete {
        /// Cache key (source id)
        key: String,
    },

    /// Print a user
    UserGet {
        /// User id (identity subject)
        id: String,
    },

    /// Remove a user
    UserDelete {
        /// User id (identity subject)
        id: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse first: bad arguments exit before the database is touched
    let cli = Cli::parse();

    let config = Config::load().map_err(|e| format!("Failed to load configuration: {}", e))?;
    logging::init(&config.logging.level);

    let db = Arc::new(Database::open(&config.database.url)?);
    let cache: CacheTable = CacheTable::new(Arc::clone(&db))?;
    let users = UserTable::new(db);

    if cli.command == Commands::Init || config.cache.enabled {
        cache.init()?;
        users.init()?;
    }

    match cli.command {
        Commands::Init => {
            tracing::info!("Schema ready at {}", config.database.url);
        }
        Commands::CacheGet { key } => match cache.get(&key)? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("cache entry {} not found", key),
        },
        Commands::CacheDelete { key } => {
            cache.delete(&key)?;
            println!("deleted cache entry {}", key);
        }
        Commands::UserGet { id } => match users.get_user(&id)? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("user {} not found", id),
        },
        Commands::UserDelete { id } => {
            users.delete_user(&id)?;
            println!("deleted user {}", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Commands, clap::Error> {
        Cli::try_parse_from(std::iter::once("newsnow-db").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(parse(&["init"]).unwrap(), Commands::Init);
        assert_eq!(
            parse(&["cache-get", "hackernews"]).unwrap(),
            Commands::CacheGet {
                key: "hackernews".to_string()
            }
        );
        assert_eq!(
            parse(&["cache-delete", "v2ex"]).unwrap(),
            Commands::CacheDelete {
                key: "v2ex".to_string()
            }
        );
        assert_eq!(
            parse(&["user-get", "sub-1"]).unwrap(),
            Commands::UserGet {
                id: "sub-1".to_string()
            }
        );
        assert_eq!(
            parse(&["user-delete", "sub-1"]).unwrap(),
            Commands::UserDelete {
                id: "sub-1".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = parse(&["bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_extra_argument_is_rejected() {
        let err = parse(&["cache-get", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let err = parse(&["user-delete"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_version_flag() {
        let err = parse(&["-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

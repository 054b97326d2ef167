use std::path::{Path, PathBuf};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, error};

use walltag::ingest::scanner;
use walltag::utils::config::{save_to_env, StoreConfig, ENV_FILE};
use walltag::{TagStore, Wallpaper};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Database file; overrides WALLTAG_DB_PATH from .env
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the resolved settings to .env
    Init,
    #[command(flatten)]
    Store(StoreCommand),
}

#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Start tracking files under the given tags
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Descend into directories
        #[arg(short, long)]
        recursive: bool,
    },
    /// List every wallpaper carrying a tag
    Get {
        tag: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the stored record for a path
    Show {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Stop tracking a file, matched by content; a deleted file is matched by its stored path
    Remove { path: PathBuf },
    /// Replace the tags of a tracked file
    Edit {
        path: PathBuf,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Record the new location of a moved file, keeping its tags
    Relocate { path: PathBuf },
    /// List all tags with their wallpaper counts
    Tags,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let config = StoreConfig::resolve(args.db_path, Path::new(ENV_FILE))?;

    match args.command {
        Command::Init => {
            save_to_env(Path::new(ENV_FILE), &config)?;
            info!("Wrote settings to {}", ENV_FILE);
            Ok(())
        }
        Command::Store(command) => run(command, &config),
    }
}

fn run(command: StoreCommand, config: &StoreConfig) -> Result<()> {
    let mut store = TagStore::open(config)
        .with_context(|| format!("Failed to open database {:?}", config.db_path))?;

    match command {
        StoreCommand::Add { paths, tags, recursive } => add_all(&mut store, &paths, &tags, recursive)?,
        StoreCommand::Get { tag, json } => {
            let found = store.get(&tag)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                for wallpaper in &found {
                    println!("{}", wallpaper);
                }
            }
        }
        StoreCommand::Show { path, json } => {
            let wallpaper = store.read_wp(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&wallpaper)?);
            } else {
                println!("{}", wallpaper);
            }
        }
        StoreCommand::Remove { path } => {
            let wallpaper = if path.is_file() {
                Wallpaper::new(&path, Vec::new())?
            } else {
                store.lookup(&path)?
            };
            store.remove(&wallpaper)?;
        }
        StoreCommand::Edit { path, tags } => {
            let old = Wallpaper::new(&path, Vec::new())?;
            let new = Wallpaper { tags, ..old.clone() };
            store.update(&old, &new)?;
            println!("{}", new);
        }
        StoreCommand::Relocate { path } => {
            let wallpaper = Wallpaper::new(&path, Vec::new())?;
            let previous = store.relocate(&wallpaper)?;
            println!("{} -> {}", previous.display(), path.display());
        }
        StoreCommand::Tags => {
            for summary in store.tags()? {
                println!("{}\t{}", summary.count, summary.name);
            }
        }
    }

    Ok(())
}

fn add_all(store: &mut TagStore, paths: &[PathBuf], tags: &[String], recursive: bool) -> Result<()> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            if !recursive {
                bail!("{:?} is a directory; pass --recursive to add its contents", path);
            }
            files.extend(scanner::scan_directory(path)?);
        } else {
            files.push(path.clone());
        }
    }

    let mut failed = 0;
    for file in &files {
        let result = Wallpaper::new(file, tags.to_vec()).and_then(|wp| store.add(&wp));
        if let Err(e) = result {
            error!("Failed to add {:?}: {}", file, e);
            failed += 1;
        }
    }

    info!("Added {} of {} file(s)", files.len() - failed, files.len());
    if failed > 0 {
        bail!("{} file(s) could not be added", failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_and_store_commands_parse() {
        let args = Args::try_parse_from(["walltag", "init"]).unwrap();
        assert!(matches!(args.command, Command::Init));

        let args = Args::try_parse_from(["walltag", "--db-path", "w.db", "remove", "a.jpg"]).unwrap();
        assert_eq!(args.db_path, Some(PathBuf::from("w.db")));
        match args.command {
            Command::Store(StoreCommand::Remove { path }) => assert_eq!(path, PathBuf::from("a.jpg")),
            other => panic!("unexpected command {:?}", other),
        }

        let args = Args::try_parse_from(["walltag", "edit", "a.jpg", "-t", "x", "-t", "y"]).unwrap();
        match args.command {
            Command::Store(StoreCommand::Edit { tags, .. }) => assert_eq!(tags, vec!["x", "y"]),
            other => panic!("unexpected command {:?}", other),
        }
    }
}

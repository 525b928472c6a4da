use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use certkv_storage::{MemoryStorage, MemoryStorageConfig, Storage};
use certkv_tree::Cancellation;
use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::*;

/// What the shell should do after a command.
pub enum Reply {
    Lines(Vec<String>),
    Quit,
}

pub async fn run_shell(cli: Cli) -> anyhow::Result<()> {
    let storage = open_storage(&cli)?;
    println!(
        "{} {} (type {} for commands)",
        "certkv".bold(),
        storage.module_id().cyan(),
        "help".yellow()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        let command = match Line::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(err) => {
                // Also covers `help`, which clap reports as an error.
                if let Err(io_err) = err.print() {
                    debug!(error = %io_err, "could not print parse error");
                }
                continue;
            }
        };
        match execute(&storage, command).await {
            Ok(Reply::Lines(out)) => {
                for line in out {
                    println!("{line}");
                }
            }
            Ok(Reply::Quit) => break,
            Err(err) => {
                debug!(error = %err, "command failed");
                eprintln!("{} {err:#}", "error:".red().bold());
            }
        }
    }
    Ok(())
}

fn open_storage(cli: &Cli) -> anyhow::Result<MemoryStorage> {
    let mut config = match &cli.config {
        Some(path) => MemoryStorageConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MemoryStorageConfig::default(),
    };
    if let Some(secs) = cli.lock_timeout_secs {
        config.lock_timeout_secs = Some(secs);
    }
    debug!(?config, "opening storage");
    Ok(MemoryStorage::new(config)?)
}

pub async fn execute(storage: &MemoryStorage, command: Command) -> anyhow::Result<Reply> {
    let out = match command {
        Command::Store(args) => cmd_store(storage, args).await?,
        Command::Load(args) => {
            let value = storage.load(&args.key).await?;
            vec![String::from_utf8_lossy(&value).into_owned()]
        }
        Command::Delete(args) => {
            storage.delete(&args.key).await?;
            vec![format!("{} deleted {}", "✓".green(), args.key.yellow())]
        }
        Command::Exists(args) => vec![storage.exists(&args.key).await.to_string()],
        Command::List(args) => {
            storage
                .list(args.prefix.as_deref().unwrap_or(""), args.recursive)
                .await?
        }
        Command::Stat(args) => cmd_stat(storage, args).await?,
        Command::Lock(args) => {
            storage.lock(&args.key, &cancellation(args.timeout_ms)).await?;
            vec![format!("{} locked {}", "✓".green(), args.key.yellow())]
        }
        Command::TryLock(args) => {
            if storage.tree().try_lock(&args.key)? {
                vec![format!("{} locked {}", "✓".green(), args.key.yellow())]
            } else {
                vec![format!("{} {} is busy", "✗".red(), args.key.yellow())]
            }
        }
        Command::Unlock(args) => {
            storage.unlock(&args.key, &cancellation(args.timeout_ms)).await?;
            vec![format!("{} unlocked {}", "✓".green(), args.key.yellow())]
        }
        Command::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Lines(out))
}

async fn cmd_store(storage: &MemoryStorage, args: StoreArgs) -> anyhow::Result<Vec<String>> {
    let value = args.value.join(" ");
    let size = value.len();
    storage.store(&args.key, Bytes::from(value)).await?;
    Ok(vec![format!(
        "{} stored {} ({size} bytes)",
        "✓".green(),
        args.key.yellow()
    )])
}

async fn cmd_stat(storage: &MemoryStorage, args: StatArgs) -> anyhow::Result<Vec<String>> {
    let info = storage.stat(&args.key).await?;
    if args.json {
        return Ok(vec![serde_json::to_string_pretty(&info)?]);
    }
    let kind = if info.is_terminal { "terminal" } else { "directory" };
    Ok(vec![
        format!("name:     {}", info.name.bold()),
        format!("kind:     {kind}"),
        format!("size:     {}", info.size),
        format!("modified: {}", info.modified.to_rfc3339()),
    ])
}

fn cancellation(timeout_ms: Option<u64>) -> Cancellation {
    timeout_ms.map_or_else(Cancellation::never, |ms| {
        Cancellation::with_timeout(Duration::from_millis(ms))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(storage: &MemoryStorage, line: &str) -> anyhow::Result<Vec<String>> {
        let command = Line::try_parse_from(line.split_whitespace())?.command;
        match execute(storage, command).await? {
            Reply::Lines(out) => Ok(out),
            Reply::Quit => Ok(vec!["<quit>".into()]),
        }
    }

    #[tokio::test]
    async fn store_load_list_session() {
        let s = MemoryStorage::default();
        run(&s, "store acme/users/me.json {\"id\": 1}").await.unwrap();
        run(&s, "store acme/users/you.json {}").await.unwrap();

        assert_eq!(run(&s, "load acme/users/me.json").await.unwrap(), vec!["{\"id\": 1}"]);
        assert_eq!(run(&s, "exists acme/users").await.unwrap(), vec!["true"]);
        assert_eq!(
            run(&s, "list acme/ -r").await.unwrap(),
            vec!["acme/users", "acme/users/me.json", "acme/users/you.json"]
        );

        run(&s, "delete acme/users").await.unwrap();
        assert_eq!(run(&s, "exists acme/users/me.json").await.unwrap(), vec!["false"]);
    }

    #[tokio::test]
    async fn stat_as_json() {
        let s = MemoryStorage::default();
        run(&s, "store k value").await.unwrap();
        let out = run(&s, "stat k --json").await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(json["name"], "k");
        assert_eq!(json["size"], 5);
        assert_eq!(json["is_terminal"], true);
    }

    #[tokio::test]
    async fn lock_commands() {
        let s = MemoryStorage::default();
        run(&s, "store locks/a x").await.unwrap();

        let out = run(&s, "try-lock locks/a").await.unwrap();
        assert!(out[0].contains("locked"));
        let out = run(&s, "try-lock locks/a").await.unwrap();
        assert!(out[0].contains("busy"));

        let err = run(&s, "lock locks/a --timeout-ms 10").await.unwrap_err();
        assert!(err.to_string().contains("deadline exceeded"));

        run(&s, "unlock locks/a").await.unwrap();
        run(&s, "lock locks/a --timeout-ms 10").await.unwrap();
    }

    #[tokio::test]
    async fn errors_surface_without_ending_session() {
        let s = MemoryStorage::default();
        let err = run(&s, "load missing").await.unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert_eq!(run(&s, "quit").await.unwrap(), vec!["<quit>"]);
    }

    #[test]
    fn help_goes_through_parse_error_path() {
        let err = Line::try_parse_from(["help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn config_flag_overrides_file() {
        let cli = Cli::try_parse_from(["certkv", "--lock-timeout-secs", "7"]).unwrap();
        let storage = open_storage(&cli).unwrap();
        assert_eq!(storage.config().lock_timeout_secs, Some(7));
    }
}

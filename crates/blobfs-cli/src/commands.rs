use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use blobfs_fs::{CreateOptions, FileInfo, FileStore, FsPath};
use blobfs_provider::{BackendConfig, BlobFileSystem, BlobFsConfig};
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

/// Record directory used when neither `--config` nor `--root` is given.
const DEFAULT_ROOT: &str = ".blobfs";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.root.as_deref())?;
    debug!(backend = ?config.backend, endpoint = %config.default_endpoint(), "resolved config");
    let fs = BlobFileSystem::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = dispatch(&fs, cli.command, cli.format, &mut out);
    let closed = fs.shutdown();
    debug!(closed, "shut down");
    result
}

fn dispatch(
    fs: &BlobFileSystem,
    command: Command,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Command::Stat(args) => cmd_stat(fs, &args.target, format, out),
        Command::Ls(args) => cmd_ls(fs, &args.target, format, out),
        Command::Mkdir(args) => cmd_mkdir(fs, &args.target, args.shallow, out),
        Command::Put(args) => {
            let bytes = read_input(args.file.as_deref())?;
            cmd_put(fs, &args.target, &bytes, out)
        }
        Command::Cat(args) => cmd_cat(fs, &args.target, out),
        Command::Rm(args) => cmd_rm(fs, &args.target, out),
    }
}

/// Build the effective config: the file if given, else a directory backend
/// under `.blobfs`; `--root` replaces whichever backend that yields.
fn resolve_config(config: Option<&Path>, root: Option<&Path>) -> anyhow::Result<BlobFsConfig> {
    let mut config = match config {
        Some(path) => BlobFsConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BlobFsConfig {
            backend: BackendConfig::Directory {
                root: PathBuf::from(DEFAULT_ROOT),
            },
            ..BlobFsConfig::default()
        },
    };
    if let Some(root) = root {
        config.backend = BackendConfig::Directory {
            root: root.to_path_buf(),
        };
    }
    Ok(config)
}

/// Bare absolute paths address the default endpoint.
fn open(fs: &BlobFileSystem, target: &str) -> anyhow::Result<FileStore> {
    let store = if target.starts_with('/') {
        fs.store_at(&fs.config().default_endpoint(), FsPath::parse(target))?
    } else {
        fs.try_store(target)?
    };
    Ok(store)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn cmd_stat(fs: &BlobFileSystem, target: &str, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    let info = store.info()?;
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?,
        OutputFormat::Text if !info.exists => {
            writeln!(out, "{} {}", store.path().to_string().bold(), "does not exist".red())?
        }
        OutputFormat::Text => {
            let kind = if info.is_directory { "directory".blue() } else { "file".normal() };
            writeln!(out, "{}", store.path().to_string().bold())?;
            writeln!(out, "  Type: {kind}")?;
            writeln!(out, "  Size: {} bytes", info.length)?;
            if let Some(modified) = info.last_modified {
                writeln!(out, "  Modified: {}", modified.to_rfc3339().dimmed())?;
            }
        }
    }
    Ok(())
}

fn cmd_ls(fs: &BlobFileSystem, target: &str, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    let info = store.info()?;
    if !info.exists {
        bail!("{} does not exist", store.path());
    }
    if !info.is_directory {
        bail!("{} is not a directory", store.path());
    }

    let children = store
        .children()?
        .iter()
        .map(FileStore::info)
        .collect::<Result<Vec<FileInfo>, _>>()?;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&children)?)?,
        OutputFormat::Text => {
            for child in &children {
                if !child.exists {
                    // Listed but never finalized, e.g. an abandoned upload.
                    writeln!(out, "{:>10}  {}", "?".dimmed(), child.name.dimmed())?;
                } else if child.is_directory {
                    writeln!(out, "{:>10}  {}/", "-", child.name.blue().bold())?;
                } else {
                    writeln!(out, "{:>10}  {}", child.length, child.name)?;
                }
            }
        }
    }
    Ok(())
}

fn cmd_mkdir(fs: &BlobFileSystem, target: &str, shallow: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    store.create_dir(CreateOptions { shallow })?;
    writeln!(out, "{} Created directory {}", "✓".green().bold(), store.path().to_string().bold())?;
    Ok(())
}

fn cmd_put(fs: &BlobFileSystem, target: &str, bytes: &[u8], out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    store.write_all(bytes)?;
    writeln!(out, "{} Wrote {} bytes to {}", "✓".green().bold(), bytes.len(), store.path().to_string().bold())?;
    Ok(())
}

fn cmd_cat(fs: &BlobFileSystem, target: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    out.write_all(&store.read_to_vec()?)?;
    Ok(())
}

fn cmd_rm(fs: &BlobFileSystem, target: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = open(fs, target)?;
    if !store.info()?.exists {
        bail!("{} does not exist", store.path());
    }
    store.delete()?;
    writeln!(out, "{} Removed {}", "✓".green().bold(), store.path().to_string().bold())?;
    Ok(())
}

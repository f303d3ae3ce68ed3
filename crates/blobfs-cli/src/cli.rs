use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobfs",
    about = "Browse and edit a directory tree stored in a flat blob store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store records under this directory (overrides the configured backend)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show whether a path exists, its type and its size
    Stat(TargetArgs),
    /// List the children of a directory
    Ls(TargetArgs),
    /// Create a directory
    Mkdir(MkdirArgs),
    /// Write a file from FILE or stdin
    Put(PutArgs),
    /// Print a file to stdout
    Cat(TargetArgs),
    /// Delete a file or directory
    Rm(TargetArgs),
}

/// A locator (`blobfs://host:port/a/b`) or an absolute path on the default
/// endpoint (`/a/b`).
#[derive(Args)]
pub struct TargetArgs {
    pub target: String,
}

#[derive(Args)]
pub struct MkdirArgs {
    pub target: String,
    /// Fail if the parent directory does not exist
    #[arg(long)]
    pub shallow: bool,
}

#[derive(Args)]
pub struct PutArgs {
    pub target: String,
    /// Local file to upload; stdin when omitted
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stat() {
        let cli = Cli::try_parse_from(["blobfs", "stat", "/a"]).unwrap();
        if let Command::Stat(args) = cli.command {
            assert_eq!(args.target, "/a");
        } else { panic!("wrong command"); }
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_mkdir_shallow() {
        let cli = Cli::try_parse_from(["blobfs", "mkdir", "--shallow", "blobfs://h/x"]).unwrap();
        if let Command::Mkdir(args) = cli.command {
            assert!(args.shallow);
            assert_eq!(args.target, "blobfs://h/x");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_put_without_file() {
        let cli = Cli::try_parse_from(["blobfs", "put", "/f"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert!(args.file.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags_after_command() {
        let cli = Cli::try_parse_from([
            "blobfs", "ls", "/", "--format", "json", "-v", "--root", "/tmp/x",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Command::Ls(_)));
    }

    #[test]
    fn missing_target_is_rejected() {
        assert!(Cli::try_parse_from(["blobfs", "cat"]).is_err());
    }
}

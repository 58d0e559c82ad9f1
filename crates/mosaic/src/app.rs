use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mosaic", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file. Defaults to `mosaic.toml` if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Retrieve every source of a manifest and write the bundle
    #[command(alias = "a", name = "assemble")]
    Assemble(AssembleArgs),
    /// Show how each source of a local manifest would be obtained
    #[command(alias = "i", name = "inspect")]
    Inspect(InspectArgs),
    /// Print the digest of a local file
    #[command(name = "digest")]
    Digest(DigestArgs),
}

#[derive(Debug, Args)]
pub struct AssembleArgs {
    /// Manifest location (`dweb:/ipfs/..`, `bzz-raw://..`, `https://..`), or a path with `--file`
    pub manifest: String,

    /// Read the manifest from a local file
    #[arg(long)]
    pub file: bool,

    /// Output directory
    #[arg(long, short, default_value = "bundle")]
    pub out: PathBuf,

    /// Give up after this many seconds, 0 for no limit
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Replace the output directory if it exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Manifest file
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct DigestArgs {
    pub file: PathBuf,

    /// Digest algorithm, defaults to the configured one
    #[arg(long, short)]
    pub algorithm: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        App::command().debug_assert();
    }

    #[test]
    fn test_parse_assemble() {
        let app = App::try_parse_from([
            "mosaic",
            "assemble",
            "metadata.json",
            "--file",
            "--out",
            "out",
            "--deadline-secs",
            "60",
            "--config",
            "custom.toml",
        ])
        .unwrap();

        assert_eq!(app.config, Some(PathBuf::from("custom.toml")));
        let Commands::Assemble(args) = app.cmd else {
            panic!("expected assemble");
        };
        assert!(args.file);
        assert!(!args.force);
        assert_eq!(args.manifest, "metadata.json");
        assert_eq!(args.out, PathBuf::from("out"));
        assert_eq!(args.deadline_secs, Some(60));
    }

    #[test]
    fn test_assemble_defaults() {
        let app = App::try_parse_from(["mosaic", "a", "dweb:/ipfs/QmManifest"]).unwrap();
        let Commands::Assemble(args) = app.cmd else {
            panic!("expected assemble");
        };
        assert_eq!(args.out, PathBuf::from("bundle"));
        assert_eq!(args.deadline_secs, None);
        assert!(!args.file);
    }
}

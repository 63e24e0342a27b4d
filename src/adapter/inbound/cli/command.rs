//! Command-line interface definitions.
//!
//! Defines the CLI structure for the clusterup application using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::paths;

/// Brings up multi-container worker clusters for integration tests
#[derive(Parser, Debug)]
#[command(name = "clusterup")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// Tool settings file (TOML); defaults apply when it does not exist
    #[arg(long, global = true, default_value_os_t = paths::default_settings())]
    pub settings: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the clusterup CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring up every instance of an environment document
    Up(UpArgs),

    /// Inspect environment documents
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Start storage backends
    #[command(subcommand)]
    Storage(StorageCommand),

    /// Print derived names
    #[command(subcommand)]
    Name(NameCommand),
}

/// Arguments for `clusterup up`.
#[derive(Parser, Debug)]
pub struct UpArgs {
    /// Environment document (JSON)
    pub config: PathBuf,

    /// Worker image
    #[arg(short, long)]
    pub image: String,

    /// Source tree mounted read-only into every node
    #[arg(short, long, default_value = ".")]
    pub bin: PathBuf,

    /// DNS server: 'auto', 'none' or an IP address
    #[arg(long, default_value = "auto")]
    pub dns: String,

    /// Unique suffix of every name; current timestamp when omitted
    #[arg(short, long)]
    pub uid: Option<String>,

    /// Host directory receiving node logs
    #[arg(short, long)]
    pub logdir: Option<PathBuf>,
}

/// Subcommands for `clusterup config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate an environment document without starting anything.
    Validate(ConfigPathArg),
}

#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Environment document (JSON)
    pub config: PathBuf,
}

/// Subcommands for `clusterup storage`.
#[derive(Subcommand, Debug)]
pub enum StorageCommand {
    /// Start a single-node Ceph RADOS cluster.
    Ceph(CephArgs),
}

#[derive(Parser, Debug)]
pub struct CephArgs {
    /// Storage name
    #[arg(short, long, default_value = "ceph")]
    pub name: String,

    /// Pool to create as NAME:PG_NUM (repeatable)
    #[arg(short, long = "pool", value_parser = parse_pool)]
    pub pools: Vec<(String, u32)>,

    /// Image override
    #[arg(short, long)]
    pub image: Option<String>,

    /// Unique suffix of every name; current timestamp when omitted
    #[arg(short, long)]
    pub uid: Option<String>,
}

/// Subcommands for `clusterup name`.
#[derive(Subcommand, Debug)]
pub enum NameCommand {
    /// Hostname formed from the given parts.
    Hostname(NameArgs),
    /// Runtime node name (`ROLE@hostname`).
    Node {
        /// Role prefix
        #[arg(short, long, default_value = "worker")]
        role: String,
        #[command(flatten)]
        name: NameArgs,
    },
}

#[derive(Parser, Debug)]
pub struct NameArgs {
    /// Name parts, most specific first
    #[arg(required = true)]
    pub parts: Vec<String>,

    /// Unique suffix
    #[arg(short, long)]
    pub uid: String,
}

fn parse_pool(value: &str) -> Result<(String, u32), String> {
    let (name, pg_num) = value
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:PG_NUM, got '{value}'"))?;
    if name.is_empty() {
        return Err("pool name must not be empty".to_string());
    }
    let pg_num = pg_num
        .parse()
        .map_err(|_| format!("invalid placement group count '{pg_num}'"))?;
    Ok((name.to_string(), pg_num))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_up_command() {
        let cli = Cli::try_parse_from([
            "clusterup",
            "up",
            "env.json",
            "--image",
            "worker:dev",
            "--uid",
            "1234",
        ])
        .unwrap();
        let Commands::Up(args) = cli.command else {
            panic!("expected up");
        };
        assert_eq!(args.config, PathBuf::from("env.json"));
        assert_eq!(args.image, "worker:dev");
        assert_eq!(args.dns, "auto");
        assert_eq!(args.uid.as_deref(), Some("1234"));
        assert_eq!(args.bin, PathBuf::from("."));
        assert!(args.logdir.is_none());
    }

    #[test]
    fn up_requires_image() {
        assert!(Cli::try_parse_from(["clusterup", "up", "env.json"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "clusterup",
            "config",
            "validate",
            "env.json",
            "--json",
            "-vv",
            "--settings",
            "s.toml",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings, PathBuf::from("s.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand::Validate(_))
        ));
    }

    #[test]
    fn parse_ceph_pools() {
        let cli = Cli::try_parse_from([
            "clusterup", "storage", "ceph", "-p", "data:8", "-p", "meta:4",
        ])
        .unwrap();
        let Commands::Storage(StorageCommand::Ceph(args)) = cli.command else {
            panic!("expected storage ceph");
        };
        assert_eq!(
            args.pools,
            vec![("data".to_string(), 8), ("meta".to_string(), 4)]
        );
        assert_eq!(args.name, "ceph");
    }

    #[test]
    fn rejects_malformed_pool() {
        assert!(parse_pool("data").is_err());
        assert!(parse_pool(":8").is_err());
        assert!(parse_pool("data:many").is_err());
    }

    #[test]
    fn parse_node_name_command() {
        let cli = Cli::try_parse_from([
            "clusterup", "name", "node", "--role", "cm", "cm1", "c1", "--uid", "42",
        ])
        .unwrap();
        let Commands::Name(NameCommand::Node { role, name }) = cli.command else {
            panic!("expected name node");
        };
        assert_eq!(role, "cm");
        assert_eq!(name.parts, vec!["cm1", "c1"]);
        assert_eq!(name.uid, "42");
    }
}

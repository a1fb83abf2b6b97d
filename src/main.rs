use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use yext::commands;

/// yext - framework extension manifest tool
///
/// Maintain the extension manifest of an installation and show the upgrade
/// notes that apply when a package changes version.
///
/// Examples:
///   yext init                              # Create vendor/yiisoft/extensions.json
///   yext add acme/widgets 1.0.0 --alias @acme/widgets=acme/widgets/src
///   yext notes yiisoft/yii2 2.0.12 2.0.14  # Upgrade notes for a framework update
#[derive(Parser, Debug)]
#[command(author, version = env!("YEXT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Installation root, usually the vendor directory (also via YEXT_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "YEXT_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub install_root: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Create an empty extension manifest if none exists
    Init,

    /// List registered extensions
    List,

    /// Register an extension, replacing any existing record
    Add(AddArgs),

    /// Remove an extension from the manifest
    Remove(RemoveArgs),

    /// Show upgrade notes for a version change of a package
    Notes(NotesArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Package name, e.g. "acme/widgets"
    pub name: String,

    /// Installed version
    pub version: String,

    /// Alias in the form @NAME=PATH; relative paths are taken from the root
    #[arg(long = "alias", short = 'a', value_name = "@NAME=PATH")]
    pub aliases: Vec<String>,

    /// Bootstrap class of the extension
    #[arg(long, value_name = "CLASS")]
    pub bootstrap: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Package name
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct NotesArgs {
    /// Package whose UPGRADE.md is read from the root
    pub package: String,

    /// Version before the update
    pub from: String,

    /// Version after the update
    pub to: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = yext::runtime::RealRuntime;

    match cli.command {
        Commands::Init => commands::init(runtime, cli.install_root)?,
        Commands::List => commands::list(runtime, cli.install_root)?,
        Commands::Add(args) => commands::add(
            runtime,
            cli.install_root,
            &args.name,
            &args.version,
            &args.aliases,
            args.bootstrap,
        )?,
        Commands::Remove(args) => commands::remove(runtime, cli.install_root, &args.name)?,
        Commands::Notes(args) => {
            commands::notes(runtime, cli.install_root, &args.package, &args.from, &args.to)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_add_parsing() {
        let cli = Cli::try_parse_from([
            "yext",
            "add",
            "acme/widgets",
            "1.0.0",
            "--alias",
            "@acme/widgets=acme/widgets/src",
            "-a",
            "@acme/theme=/srv/theme",
            "--bootstrap",
            "acme\\widgets\\Bootstrap",
        ])
        .unwrap();
        match cli.command {
            Commands::Add(args) => {
                assert_eq!(args.name, "acme/widgets");
                assert_eq!(args.version, "1.0.0");
                assert_eq!(
                    args.aliases,
                    vec!["@acme/widgets=acme/widgets/src", "@acme/theme=/srv/theme"]
                );
                assert_eq!(args.bootstrap.as_deref(), Some("acme\\widgets\\Bootstrap"));
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_notes_parsing() {
        let cli = Cli::try_parse_from(["yext", "notes", "yiisoft/yii2", "2.0.12", "dev-master"])
            .unwrap();
        match cli.command {
            Commands::Notes(args) => {
                assert_eq!(args.package, "yiisoft/yii2");
                assert_eq!(args.from, "2.0.12");
                assert_eq!(args.to, "dev-master");
            }
            _ => panic!("Expected Notes command"),
        }
    }

    #[test]
    fn test_cli_global_root_parsing() {
        let cli = Cli::try_parse_from(["yext", "--root", "/tmp/vendor", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
        assert_eq!(cli.install_root, Some(PathBuf::from("/tmp/vendor")));

        let cli = Cli::try_parse_from(["yext", "remove", "acme/widgets", "-r", "/tmp"]).unwrap();
        assert_eq!(cli.install_root, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_cli_notes_requires_versions() {
        assert!(Cli::try_parse_from(["yext", "notes", "yiisoft/yii2", "2.0.12"]).is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["yext"]).is_err());
    }
}

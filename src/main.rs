use anyhow::{Context, Result};
use booker::build::build_site;
use booker::config::Config;
use booker::renumber::renumber;
use booker::watch::Orchestrator;
use clap::{crate_version, App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = App::new("booker")
        .version(crate_version!())
        .about("Builds an ordered, cross-linked HTML book from numbered markdown files")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose logging"),
        )
        .arg(
            Arg::with_name("directory")
                .short("C")
                .long("directory")
                .takes_value(true)
                .value_name("DIR")
                .help("Project directory (defaults to the current directory)"),
        )
        .subcommand(SubCommand::with_name("build").about("Build the book once"))
        .subcommand(
            SubCommand::with_name("watch").about("Build, then rebuild whenever a page changes"),
        )
        .subcommand(
            SubCommand::with_name("renumber")
                .about("Rewrite order prefixes as evenly spaced numbers")
                .arg(
                    Arg::with_name("DIR")
                        .required(true)
                        .help("Directory whose entries are renumbered"),
                )
                .arg(
                    Arg::with_name("recursive")
                        .short("r")
                        .long("recursive")
                        .help("Also renumber every subdirectory"),
                ),
        )
        .get_matches();

    init_logging(matches.is_present("verbose"))?;

    let directory = match matches.value_of("directory") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("Reading the current directory")?,
    };

    match matches.subcommand() {
        ("build", _) => build(&directory),
        ("watch", _) => watch(&directory),
        ("renumber", Some(args)) => renumber_command(args),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .init();
    Ok(())
}

/// `RUST_LOG`, when set, takes precedence over the `-v` default.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}

fn build(directory: &Path) -> Result<()> {
    let config = Config::from_directory(directory)?;
    build_site(&config)?;
    Ok(())
}

fn watch(directory: &Path) -> Result<()> {
    let config = Config::from_directory(directory)?;
    build_site(&config).context("Initial build")?;

    // The configuration is reloaded on every pass so edits to `site.yaml`
    // take effect without a restart.
    let project_file = config.project_file.clone();
    let orchestrator = Orchestrator::new(move || -> Result<()> {
        let config = Config::from_project_file(&project_file)?;
        build_site(&config)?;
        Ok(())
    });
    orchestrator
        .watch(config.project_directory())
        .with_context(|| format!("Watching {}", config.project_directory().display()))
}

fn renumber_command(args: &ArgMatches) -> Result<()> {
    // Required by clap.
    let dir = Path::new(args.value_of("DIR").unwrap_or_default());
    let moved = renumber(dir, args.is_present("recursive"))
        .with_context(|| format!("Renumbering {}", dir.display()))?;
    info!("Renamed {} entries", moved);
    Ok(())
}

//! Stratum command line entry point.
//!
//! Resolves the configuration for a context and prints it as JSON.

use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use serde::Serialize;
use tracing::info;

use stratum::telemetry::{init_telemetry, LogConfig, LogFormat};
use stratum::{Bootstrap, LoaderOptions, CONTEXT_ENV};

/// What to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// The full configuration tree.
    Resolve,
    /// The cache registry, downgraded when the context is development-like.
    Caches,
}

/// Command-line arguments.
struct Args {
    command: Command,
    context: Option<String>,
    root: Option<PathBuf>,
    prefix: Option<String>,
    extension: Option<String>,
    keep_caches: Vec<String>,
    dotenv: bool,
    log_format: LogFormat,
    log_level: String,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut parsed = Self {
            command: Command::Resolve,
            context: None,
            root: None,
            prefix: None,
            extension: None,
            keep_caches: Vec::new(),
            dotenv: false,
            log_format: LogFormat::Pretty,
            log_level: "warn".to_string(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "resolve" => parsed.command = Command::Resolve,
                "caches" => parsed.command = Command::Caches,
                "--context" | "-c" => parsed.context = Some(required(&arg, args.next())),
                "--root" | "-r" => parsed.root = Some(PathBuf::from(required(&arg, args.next()))),
                "--prefix" | "-p" => parsed.prefix = Some(required(&arg, args.next())),
                "--extension" => parsed.extension = Some(required(&arg, args.next())),
                "--keep-cache" => parsed.keep_caches.push(required(&arg, args.next())),
                "--log-level" => parsed.log_level = required(&arg, args.next()),
                "--dotenv" => parsed.dotenv = true,
                "--json" => parsed.log_format = LogFormat::Json,
                "--log-format" => {
                    let name = required(&arg, args.next());
                    parsed.log_format = LogFormat::from_name(&name).unwrap_or_else(|| {
                        eprintln!("Unknown log format: {name}");
                        std::process::exit(1);
                    });
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-V" => {
                    println!("stratum {}", stratum::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        parsed
    }
}

fn required(flag: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Missing value for {flag}");
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r"Stratum - context-layered configuration

USAGE:
    stratum [COMMAND] [OPTIONS]

COMMANDS:
    resolve    Print the resolved configuration tree (default)
    caches     Print the cache registry, downgraded in development contexts

OPTIONS:
    -c, --context <CONTEXT>    Context identifier, e.g. Production/Staging,debug
    -r, --root <PATH>          Sandbox root with numbered layer folders
                               (default: config/context)
    -p, --prefix <PREFIX>      Environment override prefix (default: STRATUM)
        --extension <EXT>      Override file extension: toml or json (default: toml)
        --keep-cache <NAME>    Keep a cache persistent in development (repeatable)
        --dotenv               Load .env before applying environment overrides
        --log-format <FORMAT>  Log encoding: pretty, compact or json (default: pretty)
        --json                 Shorthand for --log-format json
        --log-level <FILTER>   Log filter directive (default: warn)
    -h, --help                 Print help information
    -V, --version              Print version information

ENVIRONMENT VARIABLES:
    STRATUM_CONTEXT            Context identifier when --context is not given
    STRATUM__<A>__<B>=<value>  Overrides tree value A.B

EXAMPLES:
    stratum --context Production/Staging --root /srv/app/config/context
    STRATUM_CONTEXT=Development/Local stratum caches --keep-cache hash
"
    );
}

fn run(args: Args) -> anyhow::Result<()> {
    let log = LogConfig::development()
        .with_format(args.log_format)
        .with_filter(args.log_level);
    init_telemetry(&log).context("failed to initialize logging")?;

    let context = args
        .context
        .or_else(|| std::env::var(CONTEXT_ENV).ok())
        .ok_or_else(|| anyhow!("no context given; pass --context or set {CONTEXT_ENV}"))?;

    let mut options = LoaderOptions::default().with_dotenv(args.dotenv);
    if let Some(root) = args.root {
        options = options.with_sandbox_root(root);
    }
    if let Some(prefix) = args.prefix {
        options = options.with_env_prefix(prefix);
    }
    if let Some(extension) = args.extension {
        options = options.with_extension(extension);
    }

    let mut bootstrap = Bootstrap::with_options(&context, options)?.include_context_files()?;
    for name in &args.keep_caches {
        bootstrap = bootstrap.keep_cache(name);
    }
    let config = bootstrap.load_environment().finish()?;

    match args.command {
        Command::Resolve => print_json(&config.to_tree()),
        Command::Caches => {
            if let Some(report) = config.downgrade_caches() {
                info!(
                    changed = report.changed(),
                    unchanged = report.unchanged(),
                    "caches downgraded"
                );
            }
            print_json(&config.cache_configurations())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let output = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{output}");
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

//! dashctl: tenant dashboard configuration tool

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use dash_session::DashConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Outcome;

fn file_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn out_arg() -> Arg {
    Arg::new("out")
        .long("out")
        .value_parser(value_parser!(PathBuf))
        .help("Directory to write into; stdout when omitted")
}

fn cli() -> Command {
    Command::new("dashctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validate, inspect and move tenant dashboard configurations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Settings file (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More log output; overrides RUST_LOG"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("validate")
                .about("Strictly validate a configuration file")
                .arg(file_arg("file", "Configuration JSON")),
        )
        .subcommand(
            Command::new("normalize")
                .about("Fill defaults into a partial configuration")
                .arg(file_arg("file", "Configuration JSON")),
        )
        .subcommand(
            Command::new("diff")
                .about("List field differences between two documents")
                .arg(file_arg("before", "Older document"))
                .arg(file_arg("after", "Newer document")),
        )
        .subcommand(
            Command::new("flags")
                .about("Show effective feature flags")
                .arg(file_arg("file", "Configuration JSON"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("widgets")
                .about("List the widgets of a page visible to a role")
                .arg(file_arg("file", "Configuration JSON"))
                .arg(
                    Arg::new("page")
                        .long("page")
                        .default_value(dash_schema::DEFAULT_PAGE)
                        .help("Page id"),
                )
                .arg(
                    Arg::new("role")
                        .long("role")
                        .default_value("guest")
                        .help("guest, user, manager or admin"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Wrap a configuration as an export file")
                .arg(file_arg("file", "Configuration JSON"))
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("export-layouts")
                .about("Wrap a configuration's layouts as an export file")
                .arg(file_arg("file", "Configuration JSON"))
                .arg(out_arg()),
        )
        .subcommand(
            Command::new("import")
                .about("Check an export file and print its contents")
                .arg(file_arg("file", "Export JSON"))
                .arg(
                    Arg::new("layouts")
                        .long("layouts")
                        .action(ArgAction::SetTrue)
                        .help("Read layouts from a layout or full export"),
                ),
        )
        .subcommand(
            Command::new("sample")
                .about("Print the default configuration for a tenant")
                .arg(Arg::new("id").required(true).help("Tenant id"))
                .arg(Arg::new("name").long("name").help("Display name")),
        )
        .subcommand(
            Command::new("pull")
                .about("Fetch a tenant from the backend")
                .arg(Arg::new("id").required(true).help("Tenant id")),
        )
        .subcommand(
            Command::new("push")
                .about("Validate a configuration and store it in the backend")
                .arg(file_arg("file", "Configuration JSON")),
        )
        .subcommand(Command::new("list").about("List tenants stored in the backend"))
}

fn init_logging(matches: &ArgMatches) {
    let filter = match matches.get_count("verbose") {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let registry = tracing_subscriber::registry().with(filter);
    if matches.get_flag("log-json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing <{name}>"))
}

fn string<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{name}>"))
}

async fn run(matches: &ArgMatches) -> Result<Outcome> {
    let settings = || -> Result<DashConfig> {
        Ok(DashConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?)
    };

    let output = match matches.subcommand() {
        Some(("validate", args)) => return commands::validate_file(path(args, "file")?),
        Some(("normalize", args)) => commands::normalize_file(path(args, "file")?)?,
        Some(("diff", args)) => commands::diff_files(path(args, "before")?, path(args, "after")?)?,
        Some(("flags", args)) => commands::flags_report(path(args, "file")?, args.get_flag("json"))?,
        Some(("widgets", args)) => {
            commands::widgets_report(path(args, "file")?, string(args, "page")?, string(args, "role")?)?
        }
        Some((name @ ("export" | "export-layouts"), args)) => {
            let out = args.get_one::<PathBuf>("out").map(PathBuf::as_path);
            commands::export_file(path(args, "file")?, name == "export-layouts", out).await?
        }
        Some(("import", args)) => commands::import_file(path(args, "file")?, args.get_flag("layouts")).await?,
        Some(("sample", args)) => {
            let name = args.get_one::<String>("name").map(String::as_str);
            commands::sample(string(args, "id")?, name)?
        }
        Some(("pull", args)) => commands::pull(&settings()?, string(args, "id")?).await?,
        Some(("push", args)) => commands::push(&settings()?, path(args, "file")?).await?,
        Some(("list", _)) => commands::list(&settings()?).await?,
        _ => anyhow::bail!("unknown command"),
    };
    Ok(Outcome {
        output,
        success: true,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(&matches);

    match run(&matches).await {
        Ok(outcome) => {
            if !outcome.output.is_empty() {
                println!("{}", outcome.output);
            }
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

//! # Modeler
//!
//! Command line front-end driving the modeler core without a window. It
//! prints the menus and dialogs the desktop shell would show, inspects and
//! exports diagrams, and replays command scripts against a headless
//! application.
//!
//! ## Usage
//!
//! ```bash
//! # Menu for a focused BPMN editor
//! echo '{"bpmn": true, "editable": true}' | modeler menu
//!
//! # The close dialog for a file
//! modeler dialog close --options '{"name": "order.bpmn"}'
//!
//! # Editor state after opening a diagram
//! modeler inspect order.bpmn
//!
//! # Export a diagram as web archive
//! modeler export order.bpmn --format war --out order.war
//!
//! # Replay commands, one JSON object per line
//! modeler run < commands.jsonl
//! ```

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

mod app;

/// Command line arguments shared by all subcommands
#[derive(Debug, Clone, Default)]
pub struct AppArgs {
    /// Enable debug logging
    pub debug: bool,
    /// Configuration file to use instead of the default one
    pub config_path: Option<PathBuf>,
}

fn cli() -> Command {
    Command::new("modeler")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Headless BPMN, DMN and CMMN modeler")
        .subcommand_required(true)
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("menu")
                .about("Print the menu built from an editor state")
                .arg(
                    Arg::new("state")
                        .long("state")
                        .value_name("FILE")
                        .help("State JSON file, standard input when omitted")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .value_name("KIND")
                        .help("Print a context menu (bpmn or tab) instead"),
                )
                .arg(
                    Arg::new("tab-id")
                        .long("tab-id")
                        .value_name("ID")
                        .help("Tab the context menu refers to"),
                ),
        )
        .subcommand(
            Command::new("dialog")
                .about("Print the descriptor of a dialog request")
                .arg(Arg::new("kind").required(true).help("Dialog type, e.g. close or save"))
                .arg(
                    Arg::new("options")
                        .long("options")
                        .value_name("JSON")
                        .help("Dialog options as JSON object"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Open a diagram and print the resulting editor state")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export a diagram")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .required(true)
                        .value_parser(["png", "jpeg", "svg", "war"]),
                )
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .value_name("FILE")
                        .help("Output file, next to the diagram when omitted")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Replay JSON commands from standard input against a headless application"),
        )
}

fn app_args(matches: &ArgMatches) -> AppArgs {
    AppArgs {
        debug: matches.get_flag("debug"),
        config_path: matches.get_one::<PathBuf>("config").cloned(),
    }
}

/// Initialize logging based on arguments
fn init_logging(args: &AppArgs, configured: &str) {
    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        configured.parse().unwrap_or(tracing::Level::INFO)
    };

    modeler_core::init_tracing_with_level(level);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let args = app_args(&matches);

    let config = app::load_config(&args)?;
    init_logging(&args, &config.advanced.log_level);
    tracing::debug!("Starting modeler v{}", env!("CARGO_PKG_VERSION"));

    let output = match matches.subcommand() {
        Some(("menu", sub)) => app::menu(
            &config,
            sub.get_one::<PathBuf>("state").map(PathBuf::as_path),
            sub.get_one::<String>("context").map(String::as_str),
            sub.get_one::<String>("tab-id").map(String::as_str),
        )?,
        Some(("dialog", sub)) => app::dialog(
            &config,
            sub.get_one::<String>("kind").map(String::as_str).unwrap_or_default(),
            sub.get_one::<String>("options").map(String::as_str),
        )?,
        Some(("inspect", sub)) => match sub.get_one::<PathBuf>("file") {
            Some(file) => app::inspect(&config, file).await?,
            None => anyhow::bail!("missing diagram file"),
        },
        Some(("export", sub)) => {
            let file = sub.get_one::<PathBuf>("file");
            let format = sub.get_one::<String>("format");
            match (file, format) {
                (Some(file), Some(format)) => {
                    let out = sub.get_one::<PathBuf>("out").cloned();
                    app::export(&config, file, format, out).await?
                }
                _ => anyhow::bail!("missing diagram file or format"),
            }
        }
        Some(("run", _)) => app::run(config).await?,
        _ => anyhow::bail!("unknown subcommand"),
    };

    println!("{}", output);
    Ok(())
}

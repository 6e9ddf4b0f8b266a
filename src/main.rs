use basic_theme::build::build_site;
use basic_theme::config::Config;
use clap::{App, Arg, SubCommand};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "basic_theme=debug"
        } else {
            "basic_theme=info"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}

fn main() {
    let matches = App::new("basic-theme")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Renders a blog with the basic theme")
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site found in the current directory or a parent")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Output directory (default: {project}/_site)"),
                )
                .arg(
                    Arg::with_name("verbose")
                        .short("v")
                        .long("verbose")
                        .help("Logs every parsed post and written page"),
                ),
        )
        .get_matches();

    let matches = match matches.subcommand_matches("build") {
        Some(matches) => matches,
        None => {
            eprintln!("{}", matches.usage());
            std::process::exit(2);
        }
    };

    init_logger(matches.is_present("verbose"));

    if let Err(e) = build(matches.value_of("output").map(Path::new)) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn build(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_directory(&std::env::current_dir()?, output)?;
    info!(project = %config.root_directory.display(), "loaded configuration");
    build_site(&config)?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::{App, Arg};
use periodical::config::Config;
use periodical::{Periodical, RawSubscription};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let matches = App::new("periodical")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a Kindle periodical from feed subscriptions")
        .arg(
            Arg::with_name("CONTENT")
                .help("YAML or JSON file holding the subscriptions and their items")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .help("Directory to start searching for periodical.yaml (defaults to the current directory)"),
        )
        .arg(
            Arg::with_name("keep")
                .short("k")
                .long("keep")
                .help("Keep the intermediate files after packaging"),
        )
        .arg(
            Arg::with_name("no-package")
                .long("no-package")
                .help("Only render the intermediate files; don't run the converter"),
        )
        .get_matches();

    let project_dir = match matches.value_of("project") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let config = Config::from_directory(&project_dir.canonicalize()?)?;
    let content = read_content(Path::new(matches.value_of("CONTENT").unwrap_or_default()))?;

    let periodical = Periodical::new(config.meta, config.working_directory)?
        .with_templates(config.templates)
        .with_packager(match matches.is_present("no-package") {
            true => None,
            false => Some(config.packager),
        })
        .keep_intermediate(config.keep_intermediate || matches.is_present("keep"));

    let generated = periodical.generate(content)?;
    match generated.artifact {
        Some(artifact) => println!("{}", artifact.display()),
        None => println!(
            "No .mobi was produced; {} files are in '{}'",
            generated.documents,
            periodical.working_directory().display()
        ),
    }
    Ok(())
}

fn read_content(path: &Path) -> Result<Vec<RawSubscription>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening content file '{}'", path.display()))?;
    serde_yaml::from_reader(file)
        .with_context(|| format!("Parsing content file '{}'", path.display()))
}

//! Loads the project configuration from a `periodical.yaml` file, searching
//! the starting directory and its ancestors.

use crate::meta::PeriodicalMeta;
use crate::package::{Packager, DEFAULT_CONVERTER, DEFAULT_TIMEOUT};
use crate::templates::Templates;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project file.
pub const PROJECT_FILE: &str = "periodical.yaml";

const DEFAULT_WORKING_DIRECTORY: &str = "temp";

#[derive(Deserialize)]
struct Project {
    title: String,
    creator: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    working_directory: Option<PathBuf>,
    #[serde(default)]
    converter: Option<PathBuf>,
    #[serde(default)]
    converter_timeout_secs: Option<u64>,
    #[serde(default)]
    keep_intermediate: bool,
    #[serde(default)]
    theme: Option<PathBuf>,
}

/// Everything needed to build a periodical.
pub struct Config {
    pub meta: PeriodicalMeta,
    pub working_directory: PathBuf,
    pub templates: Templates,
    pub packager: Packager,
    pub keep_intermediate: bool,
}

impl Config {
    /// Finds `periodical.yaml` in `dir` or the nearest ancestor containing
    /// one, and loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path)
                .with_context(|| format!("Loading configuration from '{}'", path.display()))
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads a project file. Relative paths inside it are resolved against
    /// the file's directory.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening project file '{}'", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            )
        })?;
        Config::from_project(project, project_root)
    }

    fn from_project(project: Project, project_root: &Path) -> Result<Config> {
        let templates = match &project.theme {
            Some(theme) => Templates::from_directory(&project_root.join(theme))?,
            None => Templates::default(),
        };

        let packager = Packager {
            converter: match project.converter {
                // bare names are looked up on PATH by the OS
                Some(converter) if converter.components().count() > 1 => {
                    project_root.join(converter)
                }
                Some(converter) => converter,
                None => PathBuf::from(DEFAULT_CONVERTER),
            },
            timeout: match project.converter_timeout_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => Some(DEFAULT_TIMEOUT),
            },
        };

        let output_filename = match project.filename {
            Some(filename) => filename,
            None => default_filename(&project.title),
        };

        Ok(Config {
            meta: PeriodicalMeta {
                publisher: project
                    .publisher
                    .unwrap_or_else(|| project.creator.clone()),
                subject: project.subject.unwrap_or_else(|| "Periodical".to_owned()),
                title: project.title,
                creator: project.creator,
                description: project.description,
                output_filename,
            },
            working_directory: project_root.join(
                project
                    .working_directory
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIRECTORY)),
            ),
            templates,
            packager,
            keep_intermediate: project.keep_intermediate,
        })
    }
}

/// `{slug(title)}-{YYYY-MM-DD}`, so each day's issue gets its own file.
fn default_filename(title: &str) -> String {
    format!(
        "{}-{}",
        slug::slugify(title),
        Utc::now().date_naive().format("%Y-%m-%d")
    )
}

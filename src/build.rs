//! Exports [`Periodical`], which stitches together the high-level steps of
//! building an issue: normalizing the feed data ([`crate::normalize`]),
//! rendering and writing the files ([`crate::write`]), running the converter
//! ([`crate::package`]), and removing the intermediate files.

use crate::meta::PeriodicalMeta;
use crate::normalize::{normalize, Error as NormalizeError};
use crate::package::{cleanup, Packager};
use crate::subscription::RawSubscription;
use crate::templates::Templates;
use crate::write::{write_documents, Error as WriteError, Renderer, MANIFEST_FILE};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// One periodical: its metadata, the scratch directory its files are
/// rendered into, the templates, and the converter settings.
pub struct Periodical {
    meta: PeriodicalMeta,
    working_directory: PathBuf,
    templates: Templates,
    packager: Option<Packager>,
    keep_intermediate: bool,
}

/// What a successful [`Periodical::generate`] produced.
#[derive(Debug, PartialEq)]
pub struct Generated {
    /// Path of the packaged artifact, or `None` when packaging was skipped or
    /// failed. The intermediate files are kept in either case.
    pub artifact: Option<PathBuf>,

    /// Whether the intermediate files were removed. `None` when cleanup
    /// wasn't attempted.
    pub cleaned: Option<bool>,

    /// Number of files written to the working directory.
    pub documents: usize,
}

impl Periodical {
    /// Creates a periodical with the default templates and converter,
    /// creating `working_directory` if it doesn't exist yet.
    pub fn new(meta: PeriodicalMeta, working_directory: impl Into<PathBuf>) -> Result<Periodical> {
        let working_directory = working_directory.into();
        std::fs::create_dir_all(&working_directory).map_err(|err| Error::WorkingDirectory {
            path: working_directory.clone(),
            err,
        })?;
        Ok(Periodical {
            meta,
            working_directory,
            templates: Templates::default(),
            packager: Some(Packager::default()),
            keep_intermediate: false,
        })
    }

    /// Replaces the templates.
    pub fn with_templates(mut self, templates: Templates) -> Periodical {
        self.templates = templates;
        self
    }

    /// Replaces the converter settings. `None` skips packaging altogether.
    pub fn with_packager(mut self, packager: Option<Packager>) -> Periodical {
        self.packager = packager;
        self
    }

    /// Keeps the intermediate files after packaging.
    pub fn keep_intermediate(mut self, keep: bool) -> Periodical {
        self.keep_intermediate = keep;
        self
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Builds an issue from `content`. Fails before writing anything when no
    /// published items remain, and fails on template or write errors. A
    /// failed conversion isn't an error: it is reported through
    /// [`Generated::artifact`].
    pub fn generate(&self, content: Vec<RawSubscription>) -> Result<Generated> {
        let subscriptions = normalize(content)?;
        info!(
            subscriptions = subscriptions.len(),
            items = subscriptions.iter().map(|s| s.items.len()).sum::<usize>(),
            "normalized content"
        );

        let documents = Renderer::new(&self.meta, &self.templates).render(&subscriptions)?;
        write_documents(&self.working_directory, &documents)?;
        info!(
            files = documents.len(),
            directory = %self.working_directory.display(),
            "wrote periodical files"
        );

        let artifact = match &self.packager {
            Some(packager) => packager.package(
                &self.working_directory,
                MANIFEST_FILE,
                &self.meta.output_filename,
            ),
            None => None,
        };

        // intermediate files stay unless an artifact was produced
        let cleaned = match (&artifact, self.keep_intermediate) {
            (Some(_), false) => {
                let cleaned = cleanup(&self.working_directory);
                if cleaned {
                    info!("removed intermediate files");
                }
                Some(cleaned)
            }
            _ => {
                info!(directory = %self.working_directory.display(), "keeping intermediate files");
                None
            }
        };

        Ok(Generated {
            artifact,
            cleaned,
            documents: documents.len(),
        })
    }
}

/// The result of building a periodical.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a periodical. Packaging and cleanup failures
/// are recovered from and therefore don't appear here.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the feed data can't be normalized, including when there
    /// is nothing to publish.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Returned for errors rendering or writing the periodical's files.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned when the working directory can't be created.
    #[error("Creating working directory '{}': {err}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

impl Error {
    /// Whether the error is the "nothing to publish" condition.
    pub fn is_no_content(&self) -> bool {
        matches!(self, Error::Normalize(NormalizeError::NoContent))
    }
}

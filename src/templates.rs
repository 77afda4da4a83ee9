//! Defines [`Templates`], the five template sources the renderer works from.
//! Templates use Go's `text/template` syntax (via [`gtmpl`]); see the files in
//! the crate's `templates/` directory for the values each one receives.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Filename of the article page template within a theme directory.
pub const ARTICLE_FILE: &str = "article.html";
/// Filename of the contents page template within a theme directory.
pub const CONTENTS_FILE: &str = "contents.html";
/// Filename of the packaging manifest template within a theme directory.
pub const PACKAGE_FILE: &str = "content.opf";
/// Filename of the navigation template within a theme directory.
pub const NAVIGATION_FILE: &str = "nav-contents.ncx";
/// Filename of the per-subscription navigation section template within a
/// theme directory.
pub const NAV_SECTION_FILE: &str = "nav-section.ncx";

/// The template sources for every file the renderer produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Templates {
    /// Rendered once per item into `{id}.html`. Receives `title`, `source`
    /// (the subscription title), `summary`, and `content`.
    pub article: String,

    /// Rendered into `contents.html`. Receives `sections`, each with a
    /// `title` and `items` (`href`, `title`).
    pub contents: String,

    /// Rendered into `content.opf`. Receives the periodical metadata,
    /// `identifier`, `date`, and `items` (`id`, `href`).
    pub package: String,

    /// Rendered into `nav-contents.ncx`. Receives `title`, `creator`, and
    /// `sections`, the concatenated output of [`Templates::nav_section`].
    pub navigation: String,

    /// Rendered once per subscription. Receives `id`, `title`, `first`,
    /// `play_order`, and `points` (`id`, `title`, `summary`, `author`,
    /// `play_order`).
    pub nav_section: String,
}

impl Default for Templates {
    /// The built-in Kindle periodical templates.
    fn default() -> Self {
        Templates {
            article: include_str!("../templates/article.html").to_owned(),
            contents: include_str!("../templates/contents.html").to_owned(),
            package: include_str!("../templates/content.opf").to_owned(),
            navigation: include_str!("../templates/nav-contents.ncx").to_owned(),
            nav_section: include_str!("../templates/nav-section.ncx").to_owned(),
        }
    }
}

impl Templates {
    /// Loads templates from a theme directory. Any template file the theme
    /// doesn't provide falls back to the built-in default.
    pub fn from_directory(dir: &Path) -> Result<Templates> {
        let defaults = Templates::default();
        Ok(Templates {
            article: load_or(dir, ARTICLE_FILE, defaults.article)?,
            contents: load_or(dir, CONTENTS_FILE, defaults.contents)?,
            package: load_or(dir, PACKAGE_FILE, defaults.package)?,
            navigation: load_or(dir, NAVIGATION_FILE, defaults.navigation)?,
            nav_section: load_or(dir, NAV_SECTION_FILE, defaults.nav_section)?,
        })
    }
}

fn load_or(dir: &Path, file_name: &str, default: String) -> Result<String> {
    let path = dir.join(file_name);
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            debug!(path = %path.display(), "loaded theme template");
            Ok(contents)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(default),
        Err(err) => Err(Error::Read { path, err }),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading theme templates.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a template file exists but can't be read.
    #[error("Reading template file '{}': {err}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

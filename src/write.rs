//! Renders normalized [`Subscription`]s into the files of a Kindle
//! periodical and writes them to disk.
//!
//! Rendering is split from writing: [`Renderer::render`] is a pure function
//! of its inputs (apart from the manifest's random identifier) returning
//! named [`Document`]s, and [`write_documents`] puts them in the working
//! directory. The manifest and navigation files are assembled from ordered
//! lists of structured records ([`ManifestEntry`], [`NavSection`]) which are
//! handed to the templates in one substitution.

use crate::meta::PeriodicalMeta;
use crate::subscription::{Item, Subscription};
use crate::templates::Templates;
use crate::value::{object, string};
use chrono::{NaiveDate, Utc};
use gtmpl::Value;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Output filename of the contents page.
pub const CONTENTS_FILE: &str = "contents.html";

/// Output filename of the packaging manifest.
pub const MANIFEST_FILE: &str = "content.opf";

/// Output filename of the navigation file.
pub const NAVIGATION_FILE: &str = "nav-contents.ncx";

/// Upper bound (inclusive) of the manifest's random identifier.
pub const MAX_IDENTIFIER: u32 = 9999;

/// Format of the issue date in the packaging manifest.
pub const ISSUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A rendered output file: its name relative to the working directory and
/// its contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub file_name: String,
    pub contents: String,
}

/// One article's entry in the packaging manifest. The same records drive the
/// `<manifest>` items and the `<spine>` reading order.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestEntry {
    /// `item-{id}`
    pub id: String,

    /// `{id}.html`
    pub href: String,
}

impl From<&Item> for ManifestEntry {
    fn from(item: &Item) -> ManifestEntry {
        ManifestEntry {
            id: item.manifest_id(),
            href: item.file_name(),
        }
    }
}

/// One article's entry in the navigation file.
#[derive(Clone, Debug, PartialEq)]
pub struct NavPoint {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub play_order: usize,
}

/// One subscription's section in the navigation file.
#[derive(Clone, Debug, PartialEq)]
pub struct NavSection {
    /// `section-{n}`, counting subscriptions from zero.
    pub id: String,
    pub title: String,

    /// The id of the subscription's first item, which the section links to.
    pub first: String,
    pub play_order: usize,
    pub points: Vec<NavPoint>,
}

/// Builds the manifest records for every item, in reading order.
pub fn manifest_entries(subscriptions: &[Subscription]) -> Vec<ManifestEntry> {
    subscriptions
        .iter()
        .flat_map(|subscription| subscription.items.iter().map(ManifestEntry::from))
        .collect()
}

/// Builds one navigation section per subscription. Play orders are assigned
/// sequentially from 1 across sections and articles; 0 belongs to the
/// contents page.
pub fn nav_sections(subscriptions: &[Subscription], author: &str) -> Vec<NavSection> {
    let mut sections = Vec::with_capacity(subscriptions.len());
    let mut play_order = 0;
    for subscription in subscriptions {
        let first = match subscription.first() {
            Some(first) => first.id.clone(),
            None => continue,
        };
        play_order += 1;
        let section_play_order = play_order;

        let mut points = Vec::with_capacity(subscription.items.len());
        for item in subscription.items.iter() {
            play_order += 1;
            points.push(NavPoint {
                id: item.id.clone(),
                title: item.title.clone(),
                summary: item.summary.clone(),
                author: author.to_owned(),
                play_order,
            });
        }

        sections.push(NavSection {
            id: format!("section-{}", sections.len()),
            title: subscription.title.clone(),
            first,
            play_order: section_play_order,
            points,
        });
    }
    sections
}

/// Picks the manifest's identifier. It only needs to differ between issues
/// in the common case; collisions are tolerated.
pub fn random_identifier() -> u32 {
    rand::thread_rng().gen_range(0..=MAX_IDENTIFIER)
}

/// Responsible for templating the periodical's files.
pub struct Renderer<'a> {
    /// The periodical's metadata.
    pub meta: &'a PeriodicalMeta,

    /// The template sources.
    pub templates: &'a Templates,

    /// The issue date written into the packaging manifest.
    pub date: NaiveDate,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer dated today (UTC).
    pub fn new(meta: &'a PeriodicalMeta, templates: &'a Templates) -> Self {
        Renderer {
            meta,
            templates,
            date: Utc::now().date_naive(),
        }
    }

    /// Renders every file of the periodical with a fresh random identifier.
    /// See [`Renderer::render_with_identifier`].
    pub fn render(&self, subscriptions: &[Subscription]) -> Result<Vec<Document>> {
        self.render_with_identifier(subscriptions, random_identifier())
    }

    /// Renders every file of the periodical: one article page per item, then
    /// the contents page, the packaging manifest, and the navigation file.
    pub fn render_with_identifier(
        &self,
        subscriptions: &[Subscription],
        identifier: u32,
    ) -> Result<Vec<Document>> {
        let mut documents = self.articles(subscriptions)?;
        documents.push(self.contents(subscriptions)?);
        documents.push(self.package(subscriptions, identifier)?);
        documents.push(self.navigation(subscriptions)?);
        Ok(documents)
    }

    fn articles(&self, subscriptions: &[Subscription]) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for subscription in subscriptions {
            for item in subscription.items.iter() {
                let value = object(vec![
                    ("title", string(&item.title)),
                    ("source", string(&subscription.title)),
                    ("summary", string(&item.summary)),
                    ("content", string(&item.content)),
                    ("date", string(&item.date)),
                ]);
                documents.push(Document {
                    file_name: item.file_name(),
                    contents: execute("article", &self.templates.article, value)?,
                });
            }
        }
        Ok(documents)
    }

    fn contents(&self, subscriptions: &[Subscription]) -> Result<Document> {
        let value = object(vec![
            ("title", string(&self.meta.title)),
            (
                "sections",
                Value::Array(subscriptions.iter().map(Value::from).collect()),
            ),
        ]);
        Ok(Document {
            file_name: CONTENTS_FILE.to_owned(),
            contents: execute("contents", &self.templates.contents, value)?,
        })
    }

    fn package(&self, subscriptions: &[Subscription], identifier: u32) -> Result<Document> {
        let mut value = Value::from(self.meta);
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "identifier".to_owned(),
                Value::String(identifier.to_string()),
            );
            obj.insert(
                "date".to_owned(),
                Value::String(self.date.format(ISSUE_DATE_FORMAT).to_string()),
            );
            obj.insert(
                "items".to_owned(),
                Value::Array(
                    manifest_entries(subscriptions)
                        .iter()
                        .map(Value::from)
                        .collect(),
                ),
            );
        }
        Ok(Document {
            file_name: MANIFEST_FILE.to_owned(),
            contents: execute("package", &self.templates.package, value)?,
        })
    }

    fn navigation(&self, subscriptions: &[Subscription]) -> Result<Document> {
        let sections = nav_sections(subscriptions, &self.meta.creator)
            .iter()
            .map(|section| execute("nav_section", &self.templates.nav_section, section.into()))
            .collect::<Result<Vec<String>>>()?
            .concat();

        let value = object(vec![
            ("title", string(&self.meta.title)),
            ("creator", string(&self.meta.creator)),
            ("sections", Value::String(sections)),
        ]);
        Ok(Document {
            file_name: NAVIGATION_FILE.to_owned(),
            contents: execute("navigation", &self.templates.navigation, value)?,
        })
    }
}

fn execute(name: &'static str, template: &str, value: Value) -> Result<String> {
    gtmpl::template(template, value).map_err(|err| Error::Template {
        name,
        message: err.to_string(),
    })
}

/// Writes each [`Document`] into `directory`, in order. A failure leaves the
/// files written so far in place.
pub fn write_documents(directory: &Path, documents: &[Document]) -> Result<()> {
    for document in documents {
        let path = directory.join(&document.file_name);
        std::fs::write(&path, &document.contents).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;
        debug!(path = %path.display(), "wrote file");
    }
    Ok(())
}

/// The result of a fallible rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering or writing the periodical's files.
#[derive(Debug, Error)]
pub enum Error {
    /// An error parsing or executing one of the templates.
    #[error("Rendering {name} template: {message}")]
    Template { name: &'static str, message: String },

    /// An error writing an output file.
    #[error("Writing '{}': {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

//! The document model. [`RawSubscription`] and [`RawItem`] are the shapes
//! handed to us by whatever produced the feed data (deserialized from YAML or
//! JSON by the CLI); [`Subscription`] and [`Item`] are the normalized forms
//! produced by [`crate::normalize`] and consumed by the renderer.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// A feed as delivered by the data source.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawSubscription {
    pub title: String,

    #[serde(default)]
    pub items: Vec<RawItem>,
}

/// An entry as delivered by the data source. `published` is `None` for
/// unpublished items; the input may spell that as a missing field, `null`,
/// `false`, or `0`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawItem {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default, deserialize_with = "deserialize_published")]
    pub published: Option<i64>,
}

impl RawItem {
    /// Builds a published item. Mostly useful for callers that assemble
    /// content in code rather than deserializing it.
    pub fn new(id: impl Into<String>, published: i64) -> RawItem {
        RawItem {
            id: id.into(),
            title: None,
            content: None,
            published: Some(published),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> RawItem {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> RawItem {
        self.content = Some(content.into());
        self
    }
}

fn deserialize_published<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Published {
        Millis(i64),
        Flag(bool),
    }

    match Option::<Published>::deserialize(deserializer)? {
        None | Some(Published::Flag(false)) | Some(Published::Millis(0)) => Ok(None),
        Some(Published::Millis(millis)) => Ok(Some(millis)),
        Some(Published::Flag(true)) => Err(D::Error::custom(
            "`published` must be a timestamp in epoch milliseconds or false",
        )),
    }
}

/// A feed after normalization. Always holds at least one item.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscription {
    pub title: String,
    pub items: Vec<Item>,
}

impl Subscription {
    /// The first item of the subscription. Normalization never yields an
    /// empty subscription, so this is only `None` for hand-built values.
    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }
}

/// A published entry with all of its derived fields filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// Filename-safe identifier; the article lives at `{id}.html`.
    pub id: String,

    /// Display title, always suffixed with ` - {date}`.
    pub title: String,

    /// The full, unmodified content markup.
    pub content: String,

    /// Markup-free, at most [`crate::sanitize::SUMMARY_LENGTH`] characters.
    pub summary: String,

    /// The publication date as `DD/MM/YYYY`.
    pub date: String,

    /// The publication timestamp in epoch milliseconds.
    pub published: i64,
}

impl Item {
    /// The article's filename relative to the working directory.
    pub fn file_name(&self) -> String {
        format!("{}.html", self.id)
    }

    /// The article's id within the packaging manifest.
    pub fn manifest_id(&self) -> String {
        format!("item-{}", self.id)
    }
}

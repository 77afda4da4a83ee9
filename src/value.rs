//! Conversions from the document model and the renderer's records into
//! [`Value`]s for templating.

use crate::meta::PeriodicalMeta;
use crate::subscription::{Item, Subscription};
use crate::write::{ManifestEntry, NavPoint, NavSection};
use gtmpl::Value;
use std::collections::HashMap;

/// Builds a [`Value::Object`] from field names and values.
pub(crate) fn object<I>(fields: I) -> Value
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    Value::Object(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect::<HashMap<String, Value>>(),
    )
}

pub(crate) fn string(s: &str) -> Value {
    Value::String(s.to_owned())
}

impl From<&Item> for Value {
    /// Converts an [`Item`] into the link shape used by the contents page:
    /// `href`, `title`, `id`, `summary`, and `date`.
    fn from(item: &Item) -> Value {
        object(vec![
            ("id", string(&item.id)),
            ("href", Value::String(item.file_name())),
            ("title", string(&item.title)),
            ("summary", string(&item.summary)),
            ("date", string(&item.date)),
        ])
    }
}

impl From<&Subscription> for Value {
    /// Converts a [`Subscription`] into an object with `title` and `items`.
    fn from(subscription: &Subscription) -> Value {
        object(vec![
            ("title", string(&subscription.title)),
            (
                "items",
                Value::Array(subscription.items.iter().map(Value::from).collect()),
            ),
        ])
    }
}

impl From<&PeriodicalMeta> for Value {
    fn from(meta: &PeriodicalMeta) -> Value {
        object(vec![
            ("title", string(&meta.title)),
            ("creator", string(&meta.creator)),
            ("publisher", string(&meta.publisher)),
            ("subject", string(&meta.subject)),
            ("description", string(&meta.description)),
            ("filename", string(&meta.output_filename)),
        ])
    }
}

impl From<&ManifestEntry> for Value {
    fn from(entry: &ManifestEntry) -> Value {
        object(vec![("id", string(&entry.id)), ("href", string(&entry.href))])
    }
}

impl From<&NavPoint> for Value {
    fn from(point: &NavPoint) -> Value {
        object(vec![
            ("id", string(&point.id)),
            ("title", string(&point.title)),
            ("summary", string(&point.summary)),
            ("author", string(&point.author)),
            ("play_order", Value::String(point.play_order.to_string())),
        ])
    }
}

impl From<&NavSection> for Value {
    fn from(section: &NavSection) -> Value {
        object(vec![
            ("id", string(&section.id)),
            ("title", string(&section.title)),
            ("first", string(&section.first)),
            ("play_order", Value::String(section.play_order.to_string())),
            (
                "points",
                Value::Array(section.points.iter().map(Value::from).collect()),
            ),
        ])
    }
}

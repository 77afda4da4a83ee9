//! Turns raw feed data into the normalized document model: fixes the text
//! encoding, derives summaries, dates, and display titles, sanitizes ids, and
//! drops everything that won't be rendered.

use crate::sanitize::{fix_encoding, sanitize_id, summarize};
use crate::subscription::{Item, RawItem, RawSubscription, Subscription};
use chrono::{TimeZone, Utc};
use thiserror::Error;
use tracing::debug;

/// Format of [`Item::date`].
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Number of summary characters used as a title for untitled items.
const FALLBACK_TITLE_LENGTH: usize = 15;

/// Normalizes a batch of subscriptions. Unpublished items are discarded, and
/// so are subscriptions left without items. Fails with [`Error::NoContent`]
/// when nothing remains.
pub fn normalize(raw: Vec<RawSubscription>) -> Result<Vec<Subscription>> {
    let mut subscriptions = Vec::with_capacity(raw.len());
    for subscription in raw.into_iter().map(fix_subscription_encoding) {
        let items = subscription
            .items
            .into_iter()
            .filter_map(|item| item.published.map(|published| normalize_item(item, published)))
            .collect::<Result<Vec<Item>>>()?;

        if items.is_empty() {
            debug!(subscription = %subscription.title, "dropping subscription without items");
            continue;
        }
        subscriptions.push(Subscription {
            title: subscription.title,
            items,
        });
    }

    match subscriptions.is_empty() {
        true => Err(Error::NoContent),
        false => Ok(subscriptions),
    }
}

fn normalize_item(item: RawItem, published: i64) -> Result<Item> {
    let content = item.content.unwrap_or_default();
    let summary = summarize(&content);
    let date = display_date(published)?;
    let title = match item.title {
        Some(title) => format!("{} - {}", title, date),
        None => format!(
            "{} - {}",
            summary
                .chars()
                .take(FALLBACK_TITLE_LENGTH)
                .collect::<String>(),
            date
        ),
    };

    Ok(Item {
        id: sanitize_id(&item.id),
        title,
        content,
        summary,
        date,
        published,
    })
}

/// Formats an epoch-milliseconds timestamp as `DD/MM/YYYY` (UTC).
pub fn display_date(millis: i64) -> Result<String> {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(date) => Ok(date.format(DISPLAY_DATE_FORMAT).to_string()),
        None => Err(Error::InvalidDate(millis)),
    }
}

fn fix_subscription_encoding(subscription: RawSubscription) -> RawSubscription {
    RawSubscription {
        title: fix_encoding(&subscription.title),
        items: subscription
            .items
            .into_iter()
            .map(|item| RawItem {
                id: fix_encoding(&item.id),
                title: item.title.as_deref().map(fix_encoding),
                content: item.content.as_deref().map(fix_encoding),
                published: item.published,
            })
            .collect(),
    }
}

/// The result of a normalization step.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem normalizing feed data.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when no subscription has a published item. Not retryable.
    #[error("no unread items available")]
    NoContent,

    /// Returned when a publication timestamp can't be represented as a date.
    #[error("publication timestamp {0} is out of range")]
    InvalidDate(i64),
}

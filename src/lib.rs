//! The library code for the `periodical` Kindle periodical builder. The
//! architecture can be generally broken down into three distinct steps:
//!
//! 1. Normalizing the feed data ([`crate::normalize`])
//! 2. Rendering the periodical's files into a working directory
//!    ([`crate::write`])
//! 3. Packaging those files into a `.mobi` with an external converter
//!    ([`crate::package`])
//!
//! Of the three, the second step is the more involved. Every published item
//! becomes an article page; the contents page, the packaging manifest
//! (`content.opf`), and the navigation file (`nav-contents.ncx`) are then
//! assembled from ordered records built over all subscriptions and handed to
//! their templates ([`crate::templates`]) in a single substitution.
//!
//! The third step is allowed to fail: when the converter is missing or
//! reports an error, the build still completes and the intermediate files stay
//! in the working directory for inspection. [`crate::build::Periodical`] ties
//! the steps together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod meta;
pub mod normalize;
pub mod package;
pub mod sanitize;
pub mod subscription;
pub mod templates;
mod value;
pub mod write;

pub use build::{Error, Generated, Periodical};
pub use meta::PeriodicalMeta;
pub use subscription::{Item, RawItem, RawSubscription, Subscription};
pub use templates::Templates;

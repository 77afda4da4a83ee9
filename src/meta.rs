//! Defines [`PeriodicalMeta`], the descriptive metadata of one periodical.

/// Metadata supplied once per periodical and used verbatim in the packaging
/// manifest and navigation file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeriodicalMeta {
    pub title: String,
    pub creator: String,
    pub publisher: String,
    pub subject: String,
    pub description: String,

    /// The final artifact's name without the `.mobi` extension.
    pub output_filename: String,
}


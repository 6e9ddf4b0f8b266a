//! Defines the [`Host`] trait: everything the home template needs from the
//! platform it runs in. The template never reaches for ambient state; each
//! emission point and the post cursor are methods on the host passed to
//! [`crate::template::render_home`].

use crate::post::Post;
use chrono::NaiveDate;
use std::fmt;
use std::io::{self, Write};
use url::Url;

/// WordPress's default `F j, Y` date format (e.g., `April 16, 2021`) as a
/// chrono format string.
pub const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// Formats `date` with the chrono format string `format`. Fails if the
/// format is malformed or asks for fields a date doesn't have (e.g., `%H`).
pub fn format_date(date: NaiveDate, format: &str) -> Result<String, fmt::Error> {
    use std::fmt::Write;
    let mut out = String::new();
    write!(out, "{}", date.format(format))?;
    Ok(out)
}

/// The rendering context for a single request.
pub trait Host {
    /// Attributes for the root `<html>` element, already formatted (e.g.,
    /// `lang="en-US"`).
    fn language_attributes(&self) -> String;

    /// The document character set.
    fn charset(&self) -> &str;

    /// CSS classes for `<body>` describing the current view.
    fn body_class(&self) -> Vec<String>;

    /// Writes host content into `<head>`. The output is opaque to the
    /// template.
    fn head(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Writes host content just before `</body>`.
    fn footer(&self, w: &mut dyn Write) -> io::Result<()>;

    fn site_name(&self) -> &str;

    fn home_url(&self) -> &Url;

    /// A chrono format string for post dates.
    fn date_format(&self) -> &str {
        DEFAULT_DATE_FORMAT
    }

    /// Whether the current query has posts left.
    fn have_posts(&self) -> bool;

    /// Advances the post cursor, returning the post to render next.
    fn the_post(&mut self) -> Option<&Post>;
}

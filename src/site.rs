//! Defines [`Site`], the bundled [`Host`]: it serves the template from a
//! [`SiteInfo`], the theme's declared [`ThemeSupports`], and a [`Query`]
//! for the view being rendered.

use crate::config::{SiteInfo, TextDirection};
use crate::escape::EscapeHtml;
use crate::host::Host;
use crate::post::Post;
use crate::query::Query;
use crate::setup::{Feature, ThemeSupports};
use std::io::{self, Write};
use url::Url;

/// Separates the parts of the document title.
const TITLE_SEPARATOR: &str = " &#8211; ";

/// The kind of request being rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// A page of the main post list.
    Home,

    /// A single post's page.
    Single,
}

/// A [`Host`] for one rendered view of the site.
pub struct Site<'a> {
    info: &'a SiteInfo,
    supports: &'a ThemeSupports,
    view: View,
    query: Query<'a>,
}

impl<'a> Site<'a> {
    pub fn new(
        info: &'a SiteInfo,
        supports: &'a ThemeSupports,
        view: View,
        query: Query<'a>,
    ) -> Site<'a> {
        Site {
            info,
            supports,
            view,
            query,
        }
    }

    /// The parts of the document title, in order. Each part is plain text.
    fn title_parts(&self) -> Vec<String> {
        match self.view {
            View::Home => {
                let mut parts = vec![self.info.name.clone()];
                if self.query.page() > 1 {
                    parts.push(format!("Page {}", self.query.page()));
                }
                if let Some(description) = &self.info.description {
                    parts.push(description.clone());
                }
                parts
            }
            View::Single => {
                let mut parts = Vec::with_capacity(2);
                if let Some(post) = self.query.posts().first() {
                    parts.push(post.title.clone());
                }
                parts.push(self.info.name.clone());
                parts
            }
        }
    }
}

impl Host for Site<'_> {
    fn language_attributes(&self) -> String {
        let lang = format!(r#"lang="{}""#, EscapeHtml(&self.info.language));
        match self.info.text_direction {
            TextDirection::Ltr => lang,
            TextDirection::Rtl => format!(r#"dir="rtl" {}"#, lang),
        }
    }

    fn charset(&self) -> &str {
        &self.info.charset
    }

    fn body_class(&self) -> Vec<String> {
        match self.view {
            View::Home => {
                let mut classes = vec![String::from("home"), String::from("blog")];
                if self.query.page() > 1 {
                    classes.push(String::from("paged"));
                    classes.push(format!("paged-{}", self.query.page()));
                }
                classes
            }
            View::Single => vec![String::from("single"), String::from("single-post")],
        }
    }

    fn head(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.supports.supports(Feature::TitleTag) {
            let parts: Vec<String> = self
                .title_parts()
                .iter()
                .map(|part| EscapeHtml(part).to_string())
                .collect();
            writeln!(w, "<title>{}</title>", parts.join(TITLE_SEPARATOR))?;
        }
        for snippet in &self.info.head {
            writeln!(w, "{}", snippet)?;
        }
        Ok(())
    }

    fn footer(&self, w: &mut dyn Write) -> io::Result<()> {
        for snippet in &self.info.footer {
            writeln!(w, "{}", snippet)?;
        }
        Ok(())
    }

    fn site_name(&self) -> &str {
        &self.info.name
    }

    fn home_url(&self) -> &Url {
        &self.info.home_url
    }

    fn date_format(&self) -> &str {
        &self.info.date_format
    }

    fn have_posts(&self) -> bool {
        self.query.have_posts()
    }

    fn the_post(&mut self) -> Option<&Post> {
        self.query.the_post()
    }
}

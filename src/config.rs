//! Loads the site configuration from `site.yaml`. See [`Config`] for the
//! resolved configuration and [`SiteInfo`] for the values the host exposes
//! to the template.

use crate::host::{format_date, DEFAULT_DATE_FORMAT};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use url::Url;

const PROJECT_FILE: &str = "site.yaml";

/// Reading direction of the site's language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Default for TextDirection {
    fn default() -> Self {
        TextDirection::Ltr
    }
}

fn default_language() -> String {
    String::from("en-US")
}

fn default_charset() -> String {
    String::from("UTF-8")
}

fn default_date_format() -> String {
    String::from(DEFAULT_DATE_FORMAT)
}

#[derive(Deserialize)]
struct Project {
    name: String,
    url: Url,

    /// Deliberately has no default: pagination is always explicit.
    posts_per_page: usize,

    #[serde(default)]
    description: Option<String>,

    #[serde(default = "default_language")]
    language: String,

    #[serde(default = "default_charset")]
    charset: String,

    #[serde(default)]
    text_direction: TextDirection,

    #[serde(default = "default_date_format")]
    date_format: String,

    #[serde(default)]
    author: Option<String>,

    #[serde(default)]
    head: Vec<String>,

    #[serde(default)]
    footer: Vec<String>,
}

/// Site-wide values the host hands to the template.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteInfo {
    /// The site name shown in the banner and the title tag.
    pub name: String,

    /// The tagline, if any.
    pub description: Option<String>,

    /// The home URL. Always ends in a trailing slash.
    pub home_url: Url,

    pub language: String,
    pub charset: String,
    pub text_direction: TextDirection,

    /// A chrono format string for post dates.
    pub date_format: String,

    /// Raw HTML snippets injected into `<head>`.
    pub head: Vec<String>,

    /// Raw HTML snippets injected before `</body>`.
    pub footer: Vec<String>,
}

/// The resolved configuration for building a site.
#[derive(Debug)]
pub struct Config {
    pub site: SiteInfo,

    /// The number of posts per home page.
    pub posts_per_page: NonZeroUsize,

    /// Used for posts that don't name an author.
    pub default_author: Option<String>,

    /// The directory containing `site.yaml`.
    pub root_directory: PathBuf,

    /// The directory post source files are read from.
    pub posts_source_directory: PathBuf,

    /// The directory the rendered site is written to.
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for `site.yaml` and loads the first
    /// one found. `output_directory` defaults to `{project}/_site`.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(dir) => Config::from_directory(dir, output_directory),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the configuration from the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let root_directory = path.parent().ok_or_else(|| Error::NoParent(path.to_owned()))?;
        Config::from_project(project, root_directory, output_directory)
    }

    /// Parses the configuration from YAML text as though it were read from a
    /// project file in `root_directory`.
    pub fn from_yaml_str(
        yaml: &str,
        root_directory: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        Config::from_project(serde_yaml::from_str(yaml)?, root_directory, output_directory)
    }

    fn from_project(
        project: Project,
        root_directory: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let posts_per_page =
            NonZeroUsize::new(project.posts_per_page).ok_or(Error::ZeroPostsPerPage)?;

        // Formats that only make sense for times (e.g., `%H:%M`) parse fine
        // but fail once applied to a date, so try one.
        let sample = NaiveDate::from_ymd_opt(2021, 4, 16);
        if sample.map_or(true, |date| format_date(date, &project.date_format).is_err()) {
            return Err(Error::InvalidDateFormat(project.date_format));
        }

        if project.url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(project.url));
        }

        // Post permalinks are joined onto the home URL, which only appends
        // when the path ends in a slash.
        let mut home_url = project.url;
        if !home_url.path().ends_with('/') {
            let path = format!("{}/", home_url.path());
            home_url.set_path(&path);
        }

        Ok(Config {
            site: SiteInfo {
                name: project.name,
                description: project.description.filter(|d| !d.is_empty()),
                home_url,
                language: project.language,
                charset: project.charset,
                text_direction: project.text_direction,
                date_format: project.date_format,
                head: project.head,
                footer: project.footer,
            },
            posts_per_page,
            default_author: project.author,
            root_directory: root_directory.to_owned(),
            posts_source_directory: root_directory.join("posts"),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => root_directory.join("_site"),
            },
        })
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no `site.yaml` exists in the directory or any ancestor.
    NotFound,

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file path has no parent directory.
    NoParent(PathBuf),

    /// Returned when the project file isn't valid YAML or is missing fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when `posts_per_page` is zero.
    ZeroPostsPerPage,

    /// Returned when `date_format` isn't a valid format string.
    InvalidDateFormat(String),

    /// Returned when `url` can't serve as a base for post permalinks.
    InvalidUrl(Url),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::NoParent(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
            Error::DeserializeYaml(err) => write!(f, "Loading configuration: {}", err),
            Error::ZeroPostsPerPage => write!(f, "`posts_per_page` must be at least 1"),
            Error::InvalidDateFormat(format) => {
                write!(f, "invalid `date_format`: `{}`", format)
            }
            Error::InvalidUrl(url) => write!(f, "invalid site `url`: `{}`", url),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

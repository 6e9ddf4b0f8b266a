//! Defines the [`Post`], [`Parser`], and [`Error`] types. Also defines the
//! logic for parsing posts from the file system into memory.

use std::{
    collections::HashSet,
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser as MarkdownParser};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

/// A post as the template sees it. Posts are read-only once parsed.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The title of the post as plain text.
    pub title: String,

    /// The URL path segment identifying the post.
    pub slug: String,

    /// The absolute URL of the post's own page.
    pub permalink: Url,

    /// The publish date.
    pub date: NaiveDate,

    /// The author's display name as plain text.
    pub author: String,

    /// The rendered HTML body.
    pub content: String,
}

/// Parses [`Post`] objects from markdown source files.
pub struct Parser<'a> {
    /// `site_url` is the home URL. Post permalinks are
    /// `{site_url}/{slug}/`.
    site_url: &'a Url,

    /// `default_author` is used for posts whose frontmatter has no
    /// `Author`.
    default_author: Option<&'a str>,
}

const MARKDOWN_EXTENSION: &str = "md";

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(site_url: &'a Url, default_author: Option<&'a str>) -> Parser<'a> {
        Parser {
            site_url,
            default_author,
        }
    }

    /// Searches `source_directory` recursively for post files (extension =
    /// `.md`) and returns a list of [`Post`] objects sorted by date (most
    /// recent first). Each post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title`, `Date`, and optionally
    ///    `Author` and `Slug`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Date: 2021-04-16
    /// Author: Jane
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        let mut slugs = HashSet::new();
        for result in WalkDir::new(source_directory).sort_by_file_name() {
            let entry = result?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
            {
                continue;
            }

            let post = self.parse_post(path)?;
            if !slugs.insert(post.slug.clone()) {
                return Err(Error::Annotated(
                    format!("parsing post `{}`", path.display()),
                    Box::new(Error::DuplicateSlug(post.slug)),
                ));
            }
            debug!(slug = %post.slug, date = %post.date, "parsed post");
            posts.push(post);
        }

        // `sort_by` is stable, so posts sharing a date keep file-name order.
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(posts)
    }

    /// Parses a single [`Post`] from the file at `path`, annotating any error
    /// with the path.
    pub fn parse_post(&self, path: &Path) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        let parsed = File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(Error::from)
            .and_then(|_| {
                let stem = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .ok_or_else(|| InvalidFileNameError(path.to_owned()))?;
                self.parse_str(stem, &contents)
            });
        match parsed {
            Ok(post) => Ok(post),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    /// Parses a [`Post`] from source text. `stem` is the source file name
    /// without its extension, which is the slug unless the frontmatter sets
    /// one.
    pub fn parse_str(&self, stem: &str, input: &str) -> Result<Post> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            // The closing fence must be a whole line; `---` inside a value
            // doesn't count.
            let mut search_from = FENCE.len();
            while let Some(offset) = input[search_from..].find("\n---") {
                let yaml_stop = search_from + offset + 1;
                let body_start = yaml_stop + FENCE.len();
                let rest = &input[body_start..];
                if rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n") {
                    return Ok((FENCE.len(), yaml_stop, body_start));
                }
                search_from = yaml_stop;
            }
            Err(Error::FrontmatterMissingEndFence)
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter =
            serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let date = NaiveDate::parse_from_str(frontmatter.date.trim(), "%Y-%m-%d")
            .map_err(|e| Error::InvalidDate(frontmatter.date.clone(), e))?;

        let author = match (frontmatter.author, self.default_author) {
            (Some(author), _) => author,
            (None, Some(author)) => author.to_owned(),
            (None, None) => return Err(Error::MissingAuthor),
        };

        let slug = slug::slugify(frontmatter.slug.as_deref().unwrap_or(stem));
        if slug.is_empty() {
            return Err(Error::EmptySlug);
        }

        // NOTE: `site_url` needs its trailing slash or [`Url::join`] would
        // replace its last path component instead of appending to it.
        let permalink = self.site_url.join(&format!("{}/", slug))?;

        Ok(Post {
            title: frontmatter.title,
            slug,
            permalink,
            date,
            author,
            content: to_html(&input[body_start..]),
        })
    }
}

/// Renders a markdown post body to HTML.
fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut body = String::new();
    html::push_html(&mut body, MarkdownParser::new_ext(markdown, options));
    body
}

#[derive(Deserialize)]
struct Frontmatter {
    /// The title of the post.
    #[serde(rename = "Title")]
    title: String,

    /// The publish date of the post, `YYYY-MM-DD`.
    #[serde(rename = "Date")]
    date: String,

    /// The author of the post.
    #[serde(default, rename = "Author")]
    author: Option<String>,

    /// Overrides the slug derived from the file name.
    #[serde(default, rename = "Slug")]
    slug: Option<String>,
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the `Date` field isn't a `YYYY-MM-DD` date.
    InvalidDate(String, chrono::ParseError),

    /// Returned when a post has no `Author` and no default author is
    /// configured.
    MissingAuthor,

    /// Returned when a slug slugifies to the empty string.
    EmptySlug,

    /// Returned when two posts resolve to the same slug.
    DuplicateSlug(String),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate(date, err) => {
                write!(f, "invalid date `{}`: {}", date, err)
            }
            Error::MissingAuthor => write!(
                f,
                "post has no `Author` and no default author is configured"
            ),
            Error::EmptySlug => write!(f, "post slug is empty"),
            Error::DuplicateSlug(slug) => {
                write!(f, "another post already uses the slug `{}`", slug)
            }
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate(_, err) => Some(err),
            Error::MissingAuthor => None,
            Error::EmptySlug => None,
            Error::DuplicateSlug(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator while walking the source directory.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn site_url() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn test_parse_posts() -> Result<()> {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Admin"));
        let posts = parser.parse_posts(Path::new("./testdata/posts/"))?;

        let wanted_posts = vec![
            Post {
                title: String::from("Second Post"),
                slug: String::from("second"),
                permalink: Url::parse("https://example.com/blog/second/")?,
                date: NaiveDate::from_ymd_opt(2021, 4, 17).unwrap(),
                author: String::from("Jane Doe"),
                content: String::from("<p>Another day, another <em>post</em>.</p>\n"),
            },
            Post {
                title: String::from("Simple"),
                slug: String::from("hello-world"),
                permalink: Url::parse("https://example.com/blog/hello-world/")?,
                date: NaiveDate::from_ymd_opt(2021, 4, 16).unwrap(),
                author: String::from("Admin"),
                content: String::from("<p>Today is the first day of the blog.</p>\n"),
            },
        ];

        assert_eq!(wanted_posts, posts);
        Ok(())
    }

    #[test]
    fn test_parse_str_uses_stem_as_slug() -> Result<()> {
        let site_url = site_url();
        let parser = Parser::new(&site_url, None);
        let post = parser.parse_str(
            "My First Post",
            "---\nTitle: First\nDate: 2020-01-02\nAuthor: Sam\n---\nHi",
        )?;
        assert_eq!("my-first-post", post.slug);
        assert_eq!(
            "https://example.com/blog/my-first-post/",
            post.permalink.as_str()
        );
        assert_eq!(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(), post.date);
        assert_eq!("<p>Hi</p>\n", post.content);
        Ok(())
    }

    #[test]
    fn test_missing_start_fence() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        match parser.parse_str("x", "Title: x\n---\n") {
            Err(Error::FrontmatterMissingStartFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_end_fence() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        match parser.parse_str("x", "---\nTitle: x\nDate: 2020-01-01\n") {
            Err(Error::FrontmatterMissingEndFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_end_fence_must_be_whole_line() -> Result<()> {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        let post = parser.parse_str(
            "x",
            "---\nTitle: Before --- After\nDate: 2021-01-01\n---\nBody",
        )?;
        assert_eq!("Before --- After", post.title);
        assert_eq!("<p>Body</p>\n", post.content);

        match parser.parse_str("x", "---\nTitle: x\nDate: 2021-01-01\n----\nBody") {
            Err(Error::FrontmatterMissingEndFence) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_end_fence_at_end_of_input() -> Result<()> {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        let post = parser.parse_str("x", "---\r\nTitle: x\r\nDate: 2021-01-01\r\n---")?;
        assert_eq!("x", post.title);
        assert_eq!("", post.content);
        Ok(())
    }

    #[test]
    fn test_empty_slug() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        match parser.parse_str("x", "---\nTitle: x\nDate: 2021-01-01\nSlug: \"!!!\"\n---\n") {
            Err(Error::EmptySlug) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_slug() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        match parser.parse_posts(Path::new("./testdata/duplicate-slugs/")) {
            Err(Error::Annotated(annotation, err)) => {
                assert!(annotation.contains("same-post.md"));
                match *err {
                    Error::DuplicateSlug(slug) => assert_eq!("same-post", slug),
                    other => panic!("unexpected error: {:?}", other),
                }
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_date() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, Some("Sam"));
        match parser.parse_str("x", "---\nTitle: x\nDate: April 1st\n---\n") {
            Err(Error::InvalidDate(date, _)) => assert_eq!("April 1st", date),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_author() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, None);
        match parser.parse_str("x", "---\nTitle: x\nDate: 2020-01-01\n---\n") {
            Err(Error::MissingAuthor) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_post_annotates_errors() {
        let site_url = site_url();
        let parser = Parser::new(&site_url, None);
        let err = parser
            .parse_post(Path::new("./testdata/does-not-exist.md"))
            .unwrap_err();
        assert!(err.to_string().starts_with("parsing post `"));
    }
}

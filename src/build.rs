//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: running the theme's setup hooks,
//! parsing the posts ([`crate::post`]), and rendering every view through the
//! home template ([`crate::template`]).

use crate::config::Config;
use crate::post::{Error as ParseError, Parser as PostParser, Post};
use crate::query::Query;
use crate::setup::{Event, Hooks, ThemeSupports};
use crate::site::{Site, View};
use crate::template::render_home;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Builds the site from a [`Config`] object. Home pages are written to
/// `{output}/index.html`, `{output}/page/2/index.html`, etc., and each post
/// is written to `{output}/{slug}/index.html`. The output directory is
/// cleared first.
pub fn build_site(config: &Config) -> Result<()> {
    info!(
        source = %config.posts_source_directory.display(),
        output = %config.output_directory.display(),
        "building site"
    );

    // Check before anything is parsed or written so a bad `-o` fails fast.
    check_output_directory(config)?;

    let mut supports = ThemeSupports::new();
    Hooks::theme().fire(Event::AfterSetupTheme, &mut supports);

    let post_parser = PostParser::new(&config.site.home_url, config.default_author.as_deref());
    let posts = post_parser.parse_posts(&config.posts_source_directory)?;

    rmdir(&config.output_directory)?;

    let writer = Writer {
        config,
        supports: &supports,
    };
    let pages = writer.write_home_pages(&posts)?;
    writer.write_post_pages(&posts)?;

    info!(posts = posts.len(), home_pages = pages, "built site");
    Ok(())
}

/// Renders views of the site to files in the output directory.
struct Writer<'a> {
    config: &'a Config,
    supports: &'a ThemeSupports,
}

impl Writer<'_> {
    /// Writes every page of the post list and returns the number of pages.
    fn write_home_pages(&self, posts: &[Post]) -> Result<usize> {
        let pages = Query::paginate(posts, self.config.posts_per_page);
        let count = pages.len();
        for query in pages {
            let file_path = home_page_path(&self.config.output_directory, query.page());
            self.write_page(&file_path, View::Home, query)?;
        }
        Ok(count)
    }

    fn write_post_pages(&self, posts: &[Post]) -> Result<()> {
        for post in posts {
            let file_path = self
                .config
                .output_directory
                .join(&post.slug)
                .join("index.html");
            self.write_page(&file_path, View::Single, Query::single(post))?;
        }
        Ok(())
    }

    /// Renders one view into `file_path`, creating parent directories as
    /// needed.
    fn write_page(&self, file_path: &Path, view: View, query: Query) -> Result<()> {
        let annotate = |err| Error::Write {
            path: file_path.to_owned(),
            err,
        };

        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir).map_err(annotate)?;
        }

        let mut site = Site::new(&self.config.site, self.supports, view, query);
        let mut w = BufWriter::new(File::create(file_path).map_err(annotate)?);
        render_home(&mut site, &mut w).map_err(annotate)?;
        w.flush().map_err(annotate)?;
        debug!(path = %file_path.display(), ?view, "wrote page");
        Ok(())
    }
}

/// The file for the 1-based home page `page`.
fn home_page_path(output_directory: &Path, page: usize) -> PathBuf {
    match page {
        1 => output_directory.join("index.html"),
        n => output_directory
            .join("page")
            .join(n.to_string())
            .join("index.html"),
    }
}

/// Refuses output directories whose clearing would delete inputs: the
/// project directory or any ancestor of it, and anything overlapping the
/// posts source directory. Paths are compared after resolving them, so
/// relative paths, `..` and symlinks can't slip past.
fn check_output_directory(config: &Config) -> Result<()> {
    let resolve_annotated = |path: &Path| {
        resolve(path).map_err(|err| Error::Resolve {
            path: path.to_owned(),
            err,
        })
    };
    let output = resolve_annotated(&config.output_directory)?;
    let root = resolve_annotated(&config.root_directory)?;
    let posts = resolve_annotated(&config.posts_source_directory)?;

    if root.starts_with(&output) || posts.starts_with(&output) || output.starts_with(&posts) {
        warn!(
            output = %output.display(),
            "output directory overlaps the project's sources; refusing to clear it"
        );
        return Err(Error::UnsafeOutputDirectory(config.output_directory.clone()));
    }
    Ok(())
}

/// Canonicalizes `path`. A path that doesn't exist yet is resolved through
/// its nearest existing ancestor.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let absolute = match path.is_absolute() {
                true => path.to_owned(),
                false => std::env::current_dir()?.join(path),
            };
            match (absolute.parent(), absolute.file_name()) {
                (Some(parent), Some(name)) => Ok(resolve(parent)?.join(name)),
                _ => Err(e),
            }
        }
        result => result,
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// cleaning the output directory, or writing pages.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned when clearing the output directory would delete the project
    /// or its posts.
    UnsafeOutputDirectory(PathBuf),

    /// Returned when a directory path can't be resolved.
    Resolve { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while rendering a page to disk.
    Write { path: PathBuf, err: std::io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::UnsafeOutputDirectory(path) => write!(
                f,
                "Refusing to clear output directory '{}': it overlaps the project's sources",
                path.display()
            ),
            Error::Resolve { path, err } => {
                write!(f, "Resolving path '{}': {}", path.display(), err)
            }
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Write { path, err } => {
                write!(f, "Writing page '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::UnsafeOutputDirectory(_) => None,
            Error::Resolve { path: _, err } => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Write { path: _, err } => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::read_to_string;

    fn config(output: &Path) -> Config {
        Config::from_project_file(Path::new("./testdata/site/site.yaml"), Some(output)).unwrap()
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let out = tempfile::tempdir().unwrap();
        build_site(&config(out.path()))?;

        // three posts at two per page
        let first = read_to_string(out.path().join("index.html")).unwrap();
        let second = read_to_string(out.path().join("page/2/index.html")).unwrap();
        assert!(!out.path().join("page/3").exists());

        assert!(first.contains(r#"<body class="home blog">"#));
        assert!(first.contains("<title>Test Site &#8211; A test fixture</title>"));
        assert!(first.contains(r#"<a href="https://example.org/third/">Third</a>"#));
        assert!(first.contains(r#"<a href="https://example.org/second/">Second</a>"#));
        assert!(first.contains("<p>Posted on May 3, 2021 by Test Author</p>"));
        assert!(first.find("Third").unwrap() < first.find("Second").unwrap());

        assert!(second.contains(r#"<body class="home blog paged paged-2">"#));
        assert!(second.contains(r#"<a href="https://example.org/first/">First</a>"#));
        assert!(!second.contains("Third"));

        let post = read_to_string(out.path().join("second/index.html")).unwrap();
        assert!(post.contains(r#"<body class="single single-post">"#));
        assert!(post.contains("<title>Second &#8211; Test Site</title>"));
        assert_eq!(1, post.matches("<article>").count());
        Ok(())
    }

    #[test]
    fn test_build_site_without_posts() -> Result<()> {
        let out = tempfile::tempdir().unwrap();
        let empty = tempfile::tempdir().unwrap();
        let mut config = config(out.path());
        config.posts_source_directory = empty.path().to_owned();
        build_site(&config)?;

        let home = read_to_string(out.path().join("index.html")).unwrap();
        assert!(home.contains("<p>No posts found.</p>"));
        assert!(!home.contains("<article>"));
        Ok(())
    }

    #[test]
    fn test_build_site_clears_output() -> Result<()> {
        let out = tempfile::tempdir().unwrap();
        let stale = out.path().join("stale.html");
        std::fs::write(&stale, "old").unwrap();
        build_site(&config(out.path()))?;
        assert!(!stale.exists());
        Ok(())
    }

    /// Copies the fixture project into `dir`.
    fn copy_project(dir: &Path) {
        std::fs::create_dir_all(dir.join("posts")).unwrap();
        std::fs::copy("./testdata/site/site.yaml", dir.join("site.yaml")).unwrap();
        std::fs::copy("./testdata/site/posts/first.md", dir.join("posts/first.md")).unwrap();
    }

    fn assert_refused(config: &Config) {
        match build_site(config) {
            Err(Error::UnsafeOutputDirectory(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_build_site_refuses_project_directory() {
        assert_refused(&config(Path::new("./testdata/site")));
        assert!(Path::new("./testdata/site/site.yaml").exists());
    }

    #[test]
    fn test_build_site_refuses_relative_project_directory() {
        // The project is found by absolute path but `-o` is relative.
        let root = std::fs::canonicalize("./testdata/site").unwrap();
        let config =
            Config::from_project_file(&root.join("site.yaml"), Some(Path::new("./testdata/site")))
                .unwrap();
        assert_refused(&config);
        assert!(root.join("site.yaml").exists());
        assert!(root.join("posts/first.md").exists());
    }

    #[test]
    fn test_build_site_refuses_ancestor_of_project() {
        let outer = tempfile::tempdir().unwrap();
        let project = outer.path().join("project");
        copy_project(&project);
        let config = Config::from_project_file(&project.join("site.yaml"), Some(outer.path())).unwrap();
        assert_refused(&config);
        assert!(project.join("site.yaml").exists());
    }

    #[test]
    fn test_build_site_refuses_posts_directory() {
        let project = tempfile::tempdir().unwrap();
        copy_project(project.path());
        let posts = project.path().join("posts");
        let config = Config::from_project_file(&project.path().join("site.yaml"), Some(posts.as_path())).unwrap();
        assert_refused(&config);
        assert!(posts.join("first.md").exists());
    }

    #[test]
    fn test_build_site_refuses_directory_inside_posts() {
        let project = tempfile::tempdir().unwrap();
        copy_project(project.path());
        let output = project.path().join("posts").join("_site");
        let config = Config::from_project_file(&project.path().join("site.yaml"), Some(output.as_path())).unwrap();
        assert_refused(&config);
        assert!(!output.exists());
    }

    #[test]
    fn test_build_site_default_output_inside_project() -> Result<()> {
        let project = tempfile::tempdir().unwrap();
        copy_project(project.path());
        let config = Config::from_project_file(&project.path().join("site.yaml"), None).unwrap();
        build_site(&config)?;
        assert!(project.path().join("_site/index.html").exists());
        assert!(project.path().join("posts/first.md").exists());
        Ok(())
    }

    #[test]
    fn test_home_page_path() {
        let out = Path::new("/out");
        assert_eq!(PathBuf::from("/out/index.html"), home_page_path(out, 1));
        assert_eq!(PathBuf::from("/out/page/7/index.html"), home_page_path(out, 7));
    }
}

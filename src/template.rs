//! The home template. [`render_home`] writes the HTML document for the
//! site's default view: the document shell, the site banner, the post loop
//! (or a "no posts" notice), and the footer. Which posts appear, and in what
//! order, is entirely up to the [`Host`].

use crate::escape::{EscapeHref, EscapeHtml};
use crate::host::{format_date, Host};
use std::io::{self, Write};

/// Renders the home template for `host` into `w`. Every post the host's
/// cursor yields is rendered as an `<article>`; if the host has no posts, a
/// "No posts found." notice is rendered instead. The only errors are I/O
/// errors from `w` or from the host's injection points, plus an
/// [`io::ErrorKind::InvalidInput`] error if the host's date format can't be
/// applied to a date.
pub fn render_home<H: Host, W: Write>(host: &mut H, w: &mut W) -> io::Result<()> {
    writeln!(w, "<!DOCTYPE html>")?;
    writeln!(w, "<html {}>", host.language_attributes())?;
    writeln!(w, "<head>")?;
    writeln!(w, r#"    <meta charset="{}">"#, EscapeHtml(host.charset()))?;
    writeln!(
        w,
        r#"    <meta name="viewport" content="width=device-width, initial-scale=1">"#
    )?;
    host.head(w)?;
    writeln!(w, "</head>")?;
    writeln!(
        w,
        r#"<body class="{}">"#,
        EscapeHtml(&host.body_class().join(" "))
    )?;
    writeln!(w)?;
    writeln!(
        w,
        r#"<h1><a href="{}">{}</a></h1>"#,
        EscapeHref(host.home_url().as_str()),
        EscapeHtml(host.site_name()),
    )?;
    writeln!(w)?;

    if host.have_posts() {
        // The cursor borrows `host` mutably for as long as a post is held.
        let date_format = host.date_format().to_owned();
        while let Some(post) = host.the_post() {
            writeln!(w, "    <article>")?;
            writeln!(
                w,
                r#"        <h2><a href="{}">{}</a></h2>"#,
                EscapeHref(post.permalink.as_str()),
                EscapeHtml(&post.title),
            )?;
            let date = format_date(post.date, &date_format).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("can't format post date with `{}`", date_format),
                )
            })?;
            writeln!(
                w,
                "        <p>Posted on {} by {}</p>",
                date,
                EscapeHtml(&post.author),
            )?;
            w.write_all(post.content.as_bytes())?;
            if !post.content.ends_with('\n') {
                writeln!(w)?;
            }
            writeln!(w, "    </article>")?;
        }
    } else {
        writeln!(w, "    <p>No posts found.</p>")?;
    }

    writeln!(w)?;
    host.footer(w)?;
    writeln!(w, "</body>")?;
    writeln!(w, "</html>")
}

//! The library code for `basic-theme`, a minimal blog theme. The theme itself
//! is two pieces:
//!
//! 1. A setup hook that declares the optional features the theme supports
//!    ([`crate::setup`])
//! 2. A home template that renders the site banner and the post loop
//!    ([`crate::template`])
//!
//! The template never touches global state. Everything it needs (language
//! attributes, body classes, head and footer injections, and the post cursor)
//! comes from a [`crate::host::Host`] passed in by the caller.
//!
//! The rest of the crate is a small static host for running the theme on its
//! own: posts are parsed from markdown files ([`crate::post`]), paginated into
//! queries ([`crate::query`]), served to the template by
//! [`crate::site::Site`], and written to disk by [`crate::build`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
mod escape;
pub mod host;
pub mod post;
pub mod query;
pub mod setup;
pub mod site;
pub mod template;

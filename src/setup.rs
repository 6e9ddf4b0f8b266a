//! Defines the theme's setup hook. A theme opts into optional host features
//! by declaring them in a [`ThemeSupports`] registry during the
//! [`Event::AfterSetupTheme`] lifecycle event. Rather than attaching named
//! functions to an implicit global registry, hooks are listed explicitly in
//! a [`Hooks`] value which the caller fires during startup.

use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// An optional rendering capability a theme can opt into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Permits per-post featured images.
    PostThumbnails,

    /// Lets the host manage the document `<title>` instead of the theme
    /// hardcoding it.
    TitleTag,
}

impl Feature {
    /// The name the feature is declared under.
    pub fn name(&self) -> &'static str {
        match self {
            Feature::PostThumbnails => "post-thumbnails",
            Feature::TitleTag => "title-tag",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post-thumbnails" => Ok(Feature::PostThumbnails),
            "title-tag" => Ok(Feature::TitleTag),
            _ => Err(UnknownFeatureError(s.to_owned())),
        }
    }
}

/// Returned when parsing a [`Feature`] from a name the host doesn't know.
#[derive(Debug, PartialEq)]
pub struct UnknownFeatureError(String);

impl fmt::Display for UnknownFeatureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown theme feature `{}`", self.0)
    }
}

impl std::error::Error for UnknownFeatureError {}

/// The registry of features a theme has declared, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThemeSupports {
    features: Vec<Feature>,
}

impl ThemeSupports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `feature`. Declaring a feature twice is a no-op; returns
    /// whether the feature was newly added.
    pub fn add(&mut self, feature: Feature) -> bool {
        if self.supports(feature) {
            return false;
        }
        debug!(feature = feature.name(), "declared theme support");
        self.features.push(feature);
        true
    }

    /// Reports whether `feature` has been declared.
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// The theme's setup hook: declares support for post thumbnails and for a
/// host-managed title tag.
pub fn setup_theme(supports: &mut ThemeSupports) {
    supports.add(Feature::PostThumbnails);
    supports.add(Feature::TitleTag);
}

/// Host lifecycle events a hook can run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Fired once at startup, after the theme is loaded and before any
    /// rendering.
    AfterSetupTheme,
}

/// A function run when its [`Event`] fires.
pub type Hook = fn(&mut ThemeSupports);

/// An explicit, ordered list of lifecycle hooks.
pub struct Hooks {
    hooks: Vec<(Event, Hook)>,
}

impl Hooks {
    /// The theme's startup list: [`setup_theme`] on
    /// [`Event::AfterSetupTheme`].
    pub fn theme() -> Self {
        Hooks {
            hooks: vec![(Event::AfterSetupTheme, setup_theme as Hook)],
        }
    }

    /// Runs every hook registered for `event`, in registration order.
    pub fn fire(&self, event: Event, supports: &mut ThemeSupports) {
        for (_, hook) in self.hooks.iter().filter(|(e, _)| *e == event) {
            hook(supports);
        }
    }
}

//! Structure and content signatures derived from a reconstructed sample.

use serde::Serialize;

use super::eval::SampleValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Grid,
    List,
    Carousel,
    Split,
    Hero,
    Stack,
}

impl LayoutKind {
    /// Keyword match on the type tag, first hit wins.
    pub fn classify(type_tag: &str) -> Self {
        let tag = type_tag.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| tag.contains(w));
        if has(&["grid"]) {
            Self::Grid
        } else if has(&["list"]) {
            Self::List
        } else if has(&["carousel", "slider"]) {
            Self::Carousel
        } else if has(&["split", "media"]) {
            Self::Split
        } else if has(&["hero", "banner"]) {
            Self::Hero
        } else {
            Self::Stack
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
            Self::Carousel => "carousel",
            Self::Split => "split",
            Self::Hero => "hero",
            Self::Stack => "stack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Default,
    MediaLeft,
    MediaRight,
    Reversed,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::MediaLeft => "media-left",
            Self::MediaRight => "media-right",
            Self::Reversed => "reversed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureSignature {
    pub layout: LayoutKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u32>,
    pub orientation: Orientation,
}

const COLUMN_KEYS: &[&str] = &["columns", "cols", "columnCount"];
const MEDIA_LEFT_KEYS: &[&str] = &["mediaLeft", "imageLeft"];

impl StructureSignature {
    pub fn derive(type_tag: &str, data: &SampleValue) -> Self {
        let columns = COLUMN_KEYS
            .iter()
            .filter_map(|key| data.get(key))
            .find_map(|value| match value {
                SampleValue::Number(n) if n.is_finite() && *n >= 1.0 => Some(*n as u32),
                SampleValue::String(s) => s.trim().parse::<u32>().ok().filter(|n| *n > 0),
                _ => None,
            });

        let orientation = MEDIA_LEFT_KEYS
            .iter()
            .find_map(|key| data.get(key).and_then(SampleValue::as_bool))
            .map(|left| {
                if left {
                    Orientation::MediaLeft
                } else {
                    Orientation::MediaRight
                }
            })
            .or_else(|| {
                data.get("reverse")
                    .and_then(SampleValue::as_bool)
                    .filter(|r| *r)
                    .map(|_| Orientation::Reversed)
            })
            .unwrap_or(Orientation::Default);

        Self {
            layout: LayoutKind::classify(type_tag),
            columns,
            orientation,
        }
    }
}

/// Which structural element kinds a sample carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentSignature {
    pub has_header: bool,
    pub has_media: bool,
    pub has_collection: bool,
    pub has_actions: bool,
}

const HEADER_KEYS: &[&str] = &[
    "title", "heading", "headline", "subtitle", "subheading", "eyebrow", "tagline", "kicker",
];
const MEDIA_HINTS: &[&str] = &[
    "image", "img", "media", "video", "photo", "picture", "avatar", "logo", "thumbnail", "cover",
    "icon",
];
const ACTION_HINTS: &[&str] = &["cta", "button", "action", "link", "href"];

impl ContentSignature {
    /// Scan property names at every depth.
    pub fn derive(data: &SampleValue) -> Self {
        let mut sig = Self::default();
        sig.scan(data);
        sig
    }

    fn scan(&mut self, value: &SampleValue) {
        match value {
            SampleValue::Object(props) => {
                for (key, value) in props {
                    self.classify(key, value);
                    self.scan(value);
                }
            }
            SampleValue::Array(items) => items.iter().for_each(|v| self.scan(v)),
            _ => {}
        }
    }

    fn classify(&mut self, key: &str, value: &SampleValue) {
        let lower = key.to_lowercase();
        match value {
            SampleValue::String(_) => {
                if HEADER_KEYS.contains(&lower.as_str())
                    || lower.ends_with("title")
                    || lower.ends_with("heading")
                {
                    self.has_header = true;
                }
                if ACTION_HINTS.iter().any(|h| lower.contains(h)) {
                    self.has_actions = true;
                }
            }
            SampleValue::Object(_) | SampleValue::Reference(_) => {
                if MEDIA_HINTS.iter().any(|h| lower.contains(h)) {
                    self.has_media = true;
                }
                if ACTION_HINTS.iter().any(|h| lower.contains(h)) {
                    self.has_actions = true;
                }
            }
            SampleValue::Array(_) => self.has_collection = true,
            _ => {}
        }
    }

    /// `header`, `media`, `collection`, `actions`, in that order.
    pub fn kinds(&self) -> Vec<&'static str> {
        [
            (self.has_header, "header"),
            (self.has_media, "media"),
            (self.has_collection, "collection"),
            (self.has_actions, "actions"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

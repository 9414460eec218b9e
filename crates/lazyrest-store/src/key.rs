//! Path-derived storage keys.
//!
//! A [`Key`] is the canonical, segment-wise form of a request path. The same
//! key renders in two forms:
//!
//! - *resource form*: `items/42` (no trailing separator)
//! - *collection form*: `items/` (exactly one trailing separator)
//!
//! Normalization never fails. Each segment is percent-decoded on its own, so
//! `%2F` stays inside its segment. Empty segments and `.` are then dropped and
//! `..` removes the preceding segment, so a key can never climb above the
//! root. The empty key is the root of the tree.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Separator between key segments.
pub const SEPARATOR: char = '/';

/// Bytes escaped when a segment is rendered back into a path. Non-ASCII
/// characters are always escaped.
const PATH_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A normalized location in the document tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    segments: Vec<String>,
}

impl Key {
    /// The root key (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a raw path into its segments.
    ///
    /// Leading and trailing separators carry no meaning here; the verb
    /// decides which form the key is rendered in.
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for raw in path.trim().split(SEPARATOR) {
            let segment = decode_segment(raw);
            match segment.as_str() {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(segment),
            }
        }
        Self { segments }
    }

    /// Build a key from segments that are already known to be valid.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment: the resource identifier of a resource-form key.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The enclosing collection, or `None` for the root.
    pub fn parent(&self) -> Option<Key> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one segment. The caller guarantees `name` is a single valid
    /// segment (see [`is_valid_segment`]).
    pub fn child(&self, name: &str) -> Key {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// Render in resource form: `a/b`, or `""` for the root. Segments are
    /// percent-encoded so the result parses back to the same key.
    pub fn as_resource(&self) -> String {
        self.segments
            .iter()
            .map(|segment| utf8_percent_encode(segment, PATH_ESCAPES).to_string())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Render in collection form: `a/b/`, or `""` for the root.
    pub fn as_collection(&self) -> String {
        if self.is_root() {
            return String::new();
        }
        let mut rendered = self.as_resource();
        rendered.push(SEPARATOR);
        rendered
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_resource())
    }
}

/// Normalize a path for resource verbs (GET, PUT, DELETE).
///
/// ```
/// use lazyrest_store::to_resource_key;
///
/// assert_eq!(to_resource_key("/items/42/").as_resource(), "items/42");
/// assert!(to_resource_key("/").is_root());
/// ```
pub fn to_resource_key(path: &str) -> Key {
    Key::parse(path)
}

/// Normalize a path for collection verbs (POST).
///
/// ```
/// use lazyrest_store::to_collection_key;
///
/// assert_eq!(to_collection_key("/items").as_collection(), "items/");
/// assert_eq!(to_collection_key("/items/").as_collection(), "items/");
/// ```
pub fn to_collection_key(path: &str) -> Key {
    Key::parse(path)
}

/// Percent-decode one raw path segment. Bytes that do not decode to UTF-8
/// leave the segment as it was sent.
fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}

/// Whether `name` can stand as exactly one key segment.
pub fn is_valid_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(SEPARATOR)
}

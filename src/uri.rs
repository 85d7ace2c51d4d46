// SPDX-License-Identifier: GPL-3.0-only

//! Video URI parsing and typed parameter access
//!
//! A video URI names a source or sink together with its configuration:
//!
//! ```text
//! scheme:[param1=value1,param2=value2,...]//resource
//! ```
//!
//! The bracketed parameter block is optional. Parameter names are not
//! validated here — the bag is open and interpreted by whichever backend the
//! resolver selects. The resource after `//` is copied verbatim; for
//! composing backends it is itself a full video URI.

use crate::errors::{VideoError, VideoResult};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parsed video URI
///
/// Immutable after parsing. Duplicate parameter keys are resolved
/// deterministically: the last occurrence wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    /// Backend family selector (always non-empty)
    pub scheme: String,
    /// Open key/value parameter bag
    pub params: BTreeMap<String, String>,
    /// Resource locator after `//`, verbatim (may be empty, may be a nested URI)
    pub url: String,
}

impl Uri {
    /// Parse a video URI string
    ///
    /// Fails with [`VideoError::MalformedUri`] when the `:` scheme separator
    /// is absent, the parameter block is unterminated, a parameter key is
    /// empty, or the `//` resource delimiter is missing.
    ///
    /// Values may contain commas, brackets or backslashes when escaped with
    /// a backslash; the stored value is unescaped.
    pub fn parse(text: &str) -> VideoResult<Uri> {
        let colon = text.find(':').ok_or_else(|| {
            VideoError::MalformedUri(format!("missing ':' scheme separator in '{}'", text))
        })?;
        let scheme = &text[..colon];
        if scheme.is_empty() {
            return Err(VideoError::MalformedUri(format!(
                "empty scheme in '{}'",
                text
            )));
        }

        let mut rest = &text[colon + 1..];
        let mut params = BTreeMap::new();

        if let Some(block) = rest.strip_prefix('[') {
            let close = find_unescaped(block, ']').ok_or_else(|| {
                VideoError::MalformedUri(format!("unterminated parameter block in '{}'", text))
            })?;
            parse_params(&block[..close], &mut params)?;
            rest = &block[close + 1..];
        }

        let url = rest.strip_prefix("//").ok_or_else(|| {
            VideoError::MalformedUri(format!("expected '//' before resource in '{}'", text))
        })?;

        Ok(Uri {
            scheme: scheme.to_string(),
            params,
            url: url.to_string(),
        })
    }

    /// Check whether a parameter is present (pure lookup, no side effects)
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Raw string value of a parameter, if present
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Typed parameter lookup with a default
    ///
    /// An absent key returns `default`. A present key is converted to `T`;
    /// conversion failure is an error, never a silent fallback — only
    /// absence uses the default.
    pub fn get<T: FromUriParam>(&self, key: &str, default: T) -> VideoResult<T> {
        match self.params.get(key) {
            None => Ok(default),
            Some(value) => {
                T::from_param(value).ok_or_else(|| VideoError::ParamConversion {
                    key: key.to_string(),
                    value: value.clone(),
                    expected: T::EXPECTED,
                })
            }
        }
    }
}

impl FromStr for Uri {
    type Err = VideoError;

    fn from_str(s: &str) -> VideoResult<Uri> {
        Uri::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if !self.params.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", key, escape_value(value))?;
            }
            write!(f, "]")?;
        }
        write!(f, "//{}", self.url)
    }
}

/// Find the byte offset of the first `needle` not preceded by a backslash
fn find_unescaped(haystack: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, ch) in haystack.char_indices() {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == needle {
            return Some(idx);
        }
    }
    None
}

/// Split a parameter block on unescaped commas and fill the map (last wins)
fn parse_params(block: &str, params: &mut BTreeMap<String, String>) -> VideoResult<()> {
    let mut rest = block;
    while !rest.is_empty() {
        let (pair, tail) = match find_unescaped(rest, ',') {
            Some(comma) => (&rest[..comma], &rest[comma + 1..]),
            None => (rest, ""),
        };
        if !pair.is_empty() {
            let (key, value) = match pair.find('=') {
                Some(eq) => (&pair[..eq], &pair[eq + 1..]),
                None => (pair, ""),
            };
            if key.is_empty() {
                return Err(VideoError::MalformedUri(format!(
                    "empty parameter key in '{}'",
                    block
                )));
            }
            params.insert(key.to_string(), unescape_value(value));
        }
        rest = tail;
    }
    Ok(())
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value.chars() {
        if escaped {
            out.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else {
            out.push(ch);
        }
    }
    out
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, ',' | ']' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Conversion from a stored parameter string to a semantic type
///
/// Implemented for strings, booleans, integers, floats and the dimension
/// ([`Dims`]) and position ([`Offset`]) pair types. `from_param` returns
/// `None` on conversion failure; [`Uri::get`] turns that into a
/// [`VideoError::ParamConversion`].
pub trait FromUriParam: Sized {
    /// Type name used in conversion error messages
    const EXPECTED: &'static str;

    /// Convert the stored string, or `None` when it does not represent `Self`
    fn from_param(value: &str) -> Option<Self>;
}

impl FromUriParam for String {
    const EXPECTED: &'static str = "string";

    fn from_param(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromUriParam for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_param(value: &str) -> Option<Self> {
        match value {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

macro_rules! impl_from_uri_param_parse {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl FromUriParam for $ty {
                const EXPECTED: &'static str = $name;

                fn from_param(value: &str) -> Option<Self> {
                    value.parse().ok()
                }
            }
        )+
    };
}

impl_from_uri_param_parse! {
    u16 => "unsigned integer",
    u32 => "unsigned integer",
    u64 => "unsigned integer",
    usize => "unsigned integer",
    i32 => "integer",
    i64 => "integer",
    f32 => "float",
    f64 => "float",
}

/// Dimension pair parsed from `WxH` (e.g. `640x480`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub width: u32,
    pub height: u32,
}

impl Dims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl FromUriParam for Dims {
    const EXPECTED: &'static str = "dimension pair (WxH)";

    fn from_param(value: &str) -> Option<Self> {
        let (w, h) = value.split_once('x')?;
        Some(Dims {
            width: w.parse().ok()?,
            height: h.parse().ok()?,
        })
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Position pair parsed from `X+Y` (e.g. `2+2`, used for sensor windowing)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub x: u32,
    pub y: u32,
}

impl Offset {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl FromUriParam for Offset {
    const EXPECTED: &'static str = "position pair (X+Y)";

    fn from_param(value: &str) -> Option<Self> {
        let (x, y) = value.split_once('+')?;
        Some(Offset {
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        })
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.x, self.y)
    }
}

/// Pairs of unsigned integers also accept the `WxH` dimension syntax
impl FromUriParam for (u32, u32) {
    const EXPECTED: &'static str = "dimension pair (WxH)";

    fn from_param(value: &str) -> Option<Self> {
        Dims::from_param(value).map(|d| (d.width, d.height))
    }
}

//! Access paths such as `devices.device_proxies["Laser A"].power`.
//!
//! A path is a sequence of tokens: bare identifiers, integer or decimal indices in brackets
//! and quoted string keys in brackets. Anything between tokens (dots) is a separator.

use std::{fmt, str::FromStr};

use regex::Regex;

#[cfg(test)]
mod tests;

macro_rules! regex {
    ($s:expr) => {{
        static RE: ::std::sync::OnceLock<Regex> = ::std::sync::OnceLock::new();
        RE.get_or_init(|| Regex::new($s).expect("invalid regex literal"))
    }};
}

/// A single normalized path token.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Attribute name or quoted key.
    Name(String),
    /// Unquoted bracket content that parsed as a finite number.
    Number(f64),
}

impl Segment {
    /// Sequence index addressed by this segment, if any.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= usize::MAX as f64 => {
                Some(*n as usize)
            }
            Segment::Name(s) if is_canonical_index(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Mapping key addressed by this segment.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Name(s) => s.clone(),
            Segment::Number(n) => format_number(*n),
        }
    }

    fn from_token(token: &str) -> Self {
        let Some(inner) = token
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
        else {
            return Segment::Name(token.to_owned());
        };
        for quote in ['"', '\''] {
            if let Some(s) = inner
                .strip_prefix(quote)
                .and_then(|t| t.strip_suffix(quote))
            {
                return Segment::Name(s.to_owned());
            }
        }
        match inner.parse::<f64>() {
            Ok(n) if n.is_finite() => Segment::Number(n),
            _ => Segment::Name(inner.to_owned()),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Name(s) if is_identifier(s) => write!(f, ".{s}"),
            Segment::Name(s) => write!(f, "[{s:?}]"),
            Segment::Number(n) => write!(f, "[{}]", format_number(*n)),
        }
    }
}

/// A parsed access path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccessPath(Vec<Segment>);

impl AccessPath {
    /// Tokenizes `path`. Never fails; an input without tokens yields an empty path.
    pub fn parse(path: &str) -> Self {
        let re = regex!(r#"\w+|\[\d+\.\d+\]|\[\d+\]|\["[^"]*"\]|\['[^']*'\]"#);
        Self(
            re.find_iter(path)
                .map(|m| Segment::from_token(m.as_str()))
                .collect(),
        )
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for AccessPath {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Segment::Name(s) if i == 0 && is_identifier(s) => write!(f, "{s}")?,
                seg => write!(f, "{seg}")?,
            }
        }
        Ok(())
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn is_canonical_index(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && (s == "0" || !s.starts_with('0'))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

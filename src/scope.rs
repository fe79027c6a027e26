use std::fmt;

use serde::{Deserialize, Serialize};

/// Slash separated path of an organizational container (folder), e.g.
/// `team/app`. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScopePath {
    segments: Vec<String>,
}

impl ScopePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn parent(&self) -> Option<ScopePath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn join(&self, segment: &str) -> ScopePath {
        let mut joined = self.clone();
        joined
            .segments
            .extend(ScopePath::parse(segment).segments);
        joined
    }

    /// True when `self` equals `other` or lies below it.
    pub fn is_within(&self, other: &ScopePath) -> bool {
        self.segments.len() >= other.segments.len()
            && self.segments[..other.segments.len()] == other.segments[..]
    }

    /// `self` followed by each ancestor up to (excluding) the root.
    pub fn ancestors(&self) -> impl Iterator<Item = ScopePath> + '_ {
        (1..=self.segments.len()).rev().map(move |len| ScopePath {
            segments: self.segments[..len].to_vec(),
        })
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<String> for ScopePath {
    fn from(value: String) -> Self {
        ScopePath::parse(&value)
    }
}

impl From<&str> for ScopePath {
    fn from(value: &str) -> Self {
        ScopePath::parse(value)
    }
}

impl From<ScopePath> for String {
    fn from(value: ScopePath) -> Self {
        value.to_string()
    }
}

/// One level of the lookup chain. Chains run nearest-enclosing first and end
/// with [`ScopeLevel::Global`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeLevel {
    Folder(ScopePath),
    Global,
}

impl ScopeLevel {
    pub fn chain(scope: &ScopePath) -> Vec<ScopeLevel> {
        let mut levels: Vec<ScopeLevel> = scope.ancestors().map(ScopeLevel::Folder).collect();
        levels.push(ScopeLevel::Global);
        levels
    }

    pub fn from_scope(scope: ScopePath) -> ScopeLevel {
        if scope.is_root() {
            ScopeLevel::Global
        } else {
            ScopeLevel::Folder(scope)
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLevel::Folder(path) => write!(f, "folder:{path}"),
            ScopeLevel::Global => write!(f, "global"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_empty_segments() {
        let scope = ScopePath::parse("/team//app/ ");
        assert_eq!(scope.to_string(), "team/app");
        assert!(ScopePath::parse(" / ").is_root());
    }

    #[test]
    fn ancestors_run_nearest_first() {
        let scope = ScopePath::parse("a/b/c");
        let walk: Vec<String> = scope.ancestors().map(|s| s.to_string()).collect();
        assert_eq!(walk, vec!["a/b/c", "a/b", "a"]);
    }

    #[test]
    fn chain_ends_with_global() {
        let chain = ScopeLevel::chain(&ScopePath::parse("a/b"));
        assert_eq!(
            chain,
            vec![
                ScopeLevel::Folder(ScopePath::parse("a/b")),
                ScopeLevel::Folder(ScopePath::parse("a")),
                ScopeLevel::Global,
            ]
        );
        assert_eq!(ScopeLevel::chain(&ScopePath::root()), vec![ScopeLevel::Global]);
    }

    #[test]
    fn is_within_matches_whole_segments() {
        let scope = ScopePath::parse("team/app/build");
        assert!(scope.is_within(&ScopePath::parse("team")));
        assert!(scope.is_within(&ScopePath::root()));
        assert!(!ScopePath::parse("teams/app").is_within(&ScopePath::parse("team")));
    }
}

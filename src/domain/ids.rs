//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that flow between the extractor, the
//! detector and the replacement engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Structural identifier of an extracted text block
///
/// Derived from the block's position in the document tree (section, table, row,
/// cell, paragraph ordinals) and never from its content, so two blocks with the
/// same text in different places have different ids, and re-extracting the same
/// unmodified document yields the same ids.
///
/// # Examples
///
/// ```
/// use docanon::domain::ids::BlockId;
///
/// let id = BlockId::new("body/tbl0/r1/c2/p0").unwrap();
/// assert_eq!(id.as_str(), "body/tbl0/r1/c2/p0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    /// Creates a new BlockId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Block ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the block ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds a child id by appending a path segment
    pub(crate) fn child(&self, segment: impl fmt::Display) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }

    /// Root id for a named container (`body`, `sect0/header.default`, ...)
    pub(crate) fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BlockId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// SHA-256 hex digest of a block's normalized text
///
/// Two blocks with equal hashes have identical text and therefore identical
/// detection results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hashes normalized block text
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Returns the digest as a hex string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate token substituted for a sensitive value
///
/// Tokens are hyphenated UUID strings; comparison is case-insensitive because
/// editors occasionally change the case of pasted identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SurrogateToken(String);

impl SurrogateToken {
    /// Token for a UUID, always well formed
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.hyphenated().to_string())
    }

    /// Wraps a token string, normalizing it to lowercase
    pub fn new(token: impl Into<String>) -> Result<Self, String> {
        let token = token.into().trim().to_ascii_lowercase();
        if !Self::is_well_formed(&token) {
            return Err(format!("Not a surrogate token: {token}"));
        }
        Ok(Self(token))
    }

    /// Checks the 8-4-4-4-12 hex shape
    pub fn is_well_formed(candidate: &str) -> bool {
        let groups: Vec<&str> = candidate.split('-').collect();
        let expected = [8usize, 4, 4, 4, 12];
        groups.len() == expected.len()
            && groups
                .iter()
                .zip(expected.iter())
                .all(|(g, &len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurrogateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SurrogateToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SurrogateToken> for String {
    fn from(token: SurrogateToken) -> Self {
        token.0
    }
}

impl FromStr for SurrogateToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

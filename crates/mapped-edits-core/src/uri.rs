//! URI wire form and the identity service used to revive it.
//!
//! URIs cross the process boundary as [`UriComponents`]. The receiving side
//! revives them through a [`UriIdentity`] so that two references to the same
//! resource come back as equal [`Uri`] values.

use crate::error::{MappedEditsError, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tower_lsp_server::ls_types::Uri;

/// Maximum number of canonical URIs remembered by [`UriIdentityService`].
const MAX_CANONICAL_ENTRIES: usize = 4096;

/// Structural wire form of a URI.
///
/// Components are kept exactly as they appear in the URI string (still
/// percent-encoded), so `parse` followed by `to_string` is the identity.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::UriComponents;
///
/// let components = UriComponents::parse("file:///src/main.py?x=1#L3").unwrap();
/// assert_eq!(components.scheme, "file");
/// assert_eq!(components.authority.as_deref(), Some(""));
/// assert_eq!(components.path, "/src/main.py");
/// assert_eq!(components.query.as_deref(), Some("x=1"));
/// assert_eq!(components.fragment.as_deref(), Some("L3"));
/// assert_eq!(components.to_string(), "file:///src/main.py?x=1#L3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriComponents {
    pub scheme: String,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl UriComponents {
    /// Splits a URI string into its components.
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, rest) = input
            .split_once(':')
            .filter(|(scheme, _)| is_valid_scheme(scheme))
            .ok_or_else(|| MappedEditsError::invalid_uri(input))?;

        let (rest, fragment) = match rest.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((rest, query)) => (rest, Some(query.to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => match after.find('/') {
                Some(idx) => (Some(after[..idx].to_string()), &after[idx..]),
                None => (Some(after.to_string()), ""),
            },
            None => (None, rest),
        };

        Ok(Self {
            scheme: scheme.to_string(),
            authority,
            path: path.to_string(),
            query,
            fragment,
        })
    }

    pub fn from_uri(uri: &Uri) -> Result<Self> {
        Self::parse(uri.as_str())
    }

    pub fn to_uri(&self) -> Result<Uri> {
        let text = self.to_string();
        Uri::from_str(&text).map_err(|_| MappedEditsError::invalid_uri(text))
    }

    /// Percent-decoded path, used for glob matching.
    pub fn decoded_path(&self) -> String {
        urlencoding::decode(&self.path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.path.clone())
    }
}

impl fmt::Display for UriComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(authority) = &self.authority {
            write!(f, "//{}", authority)?;
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Identity service consulted before URIs are compared or stored.
pub trait UriIdentity: Send + Sync {
    /// Turns wire components into the canonical URI for that resource.
    fn revive(&self, components: &UriComponents) -> Result<Uri>;

    /// Turns a URI into its wire form.
    fn to_components(&self, uri: &Uri) -> Result<UriComponents> {
        UriComponents::from_uri(uri)
    }
}

/// Default [`UriIdentity`] with a canonical URI table.
///
/// The first URI revived for a resource becomes its canonical form; later
/// references that differ only in scheme/authority case, percent-encoding
/// of the path, or (with `ignore_path_casing`) path case revive to that same
/// value.
///
/// # Examples
///
/// ```
/// use mapped_edits_core::{UriComponents, UriIdentity, UriIdentityService};
///
/// let identity = UriIdentityService::new(false);
/// let a = identity.revive(&UriComponents::parse("file:///src/a%2Epy").unwrap()).unwrap();
/// let b = identity.revive(&UriComponents::parse("FILE:///src/a.py").unwrap()).unwrap();
/// assert_eq!(a, b);
/// ```
pub struct UriIdentityService {
    ignore_path_casing: bool,
    canonical: DashMap<String, Uri>,
}

impl UriIdentityService {
    pub fn new(ignore_path_casing: bool) -> Self {
        Self {
            ignore_path_casing,
            canonical: DashMap::new(),
        }
    }

    fn identity_key(&self, components: &UriComponents) -> String {
        let path = components.decoded_path();
        let path = if self.ignore_path_casing {
            path.to_lowercase()
        } else {
            path
        };
        format!(
            "{}://{}{}?{}#{}",
            components.scheme.to_ascii_lowercase(),
            components
                .authority
                .as_deref()
                .unwrap_or_default()
                .to_ascii_lowercase(),
            path,
            components.query.as_deref().unwrap_or_default(),
            components.fragment.as_deref().unwrap_or_default(),
        )
    }

    /// Number of canonical URIs currently remembered.
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl Default for UriIdentityService {
    fn default() -> Self {
        Self::new(false)
    }
}

impl UriIdentity for UriIdentityService {
    fn revive(&self, components: &UriComponents) -> Result<Uri> {
        let key = self.identity_key(components);
        if let Some(uri) = self.canonical.get(&key) {
            return Ok(uri.clone());
        }

        let uri = components.to_uri()?;
        if self.canonical.len() >= MAX_CANONICAL_ENTRIES {
            tracing::debug!("canonical URI table full, clearing");
            self.canonical.clear();
        }
        Ok(self.canonical.entry(key).or_insert(uri).clone())
    }
}

impl fmt::Debug for UriIdentityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriIdentityService")
            .field("ignore_path_casing", &self.ignore_path_casing)
            .field("canonical_count", &self.canonical.len())
            .finish()
    }
}

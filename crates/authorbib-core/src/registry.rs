//! Author registry
//!
//! The registry is the ordered list of configured authors. It is validated
//! once at load time: a registry value that exists is always usable, so the
//! matcher and the path resolver never see an empty identifier set or an
//! unsafe slug.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One configured author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorConfig {
    /// Filesystem- and URL-safe identifier, used verbatim in output paths
    pub slug: String,
    /// Display name for the document heading
    #[serde(default)]
    pub name: Option<String>,
    /// Name variants as they appear in the source library
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl AuthorConfig {
    pub fn new<I, S>(slug: impl Into<String>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slug: slug.into(),
            name: None,
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, falling back to the title-cased slug
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => title_case_slug(&self.slug),
        }
    }

    /// Check slug and identifiers
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_slug(&self.slug)?;

        if self.identifiers.is_empty() {
            return Err(self.invalid("no identifiers configured"));
        }
        if let Some(pos) = self.identifiers.iter().position(|i| i.trim().is_empty()) {
            return Err(self.invalid(format!("identifier #{} is blank", pos + 1)));
        }
        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidAuthorConfig {
            slug: self.slug.clone(),
            reason: reason.into(),
        }
    }
}

/// Ordered, validated set of authors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRegistry {
    authors: Vec<AuthorConfig>,
}

impl AuthorRegistry {
    /// Build a registry, rejecting malformed or duplicate entries
    pub fn new(authors: Vec<AuthorConfig>) -> Result<Self, ConfigError> {
        if authors.is_empty() {
            return Err(ConfigError::Missing("authors"));
        }

        let mut seen = HashSet::new();
        for author in &authors {
            author.validate()?;
            if !seen.insert(author.slug.as_str()) {
                return Err(ConfigError::InvalidAuthorConfig {
                    slug: author.slug.clone(),
                    reason: "duplicate slug".to_string(),
                });
            }
        }

        Ok(Self { authors })
    }

    /// Authors in configuration order
    pub fn iter(&self) -> std::slice::Iter<'_, AuthorConfig> {
        self.authors.iter()
    }

    /// Look up an author by slug
    pub fn get(&self, slug: &str) -> Option<&AuthorConfig> {
        self.authors.iter().find(|a| a.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }
}

impl<'a> IntoIterator for &'a AuthorRegistry {
    type Item = &'a AuthorConfig;
    type IntoIter = std::slice::Iter<'a, AuthorConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Reject slugs that would escape or hide inside the output tree
pub fn validate_slug(slug: &str) -> Result<(), ConfigError> {
    let reason = if slug.is_empty() {
        Some("slug is empty")
    } else if slug.starts_with('.') {
        Some("slug must not start with '.'")
    } else if slug.contains(['/', '\\']) {
        Some("slug must not contain path separators")
    } else if slug.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("slug must not contain whitespace or control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidAuthorConfig {
            slug: slug.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// "anna-mueller" -> "Anna Mueller"
fn title_case_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anna() -> AuthorConfig {
        AuthorConfig::new("anna-mueller", ["Anna Müller", "A. Mueller"])
    }

    #[test]
    fn test_registry_preserves_order() {
        let registry = AuthorRegistry::new(vec![
            anna(),
            AuthorConfig::new("john-doe", ["John Doe"]),
        ])
        .unwrap();

        let slugs: Vec<_> = registry.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, vec!["anna-mueller", "john-doe"]);
        assert!(registry.get("john-doe").is_some());
        assert!(registry.get("jane-roe").is_none());
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let author = AuthorConfig::new("ghost", Vec::<String>::new());
        let err = AuthorRegistry::new(vec![author]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAuthorConfig { .. }));
    }

    #[test]
    fn test_blank_identifier_rejected() {
        let author = AuthorConfig::new("ghost", ["Ghost", "   "]);
        let err = author.validate().unwrap_err();
        assert!(err.to_string().contains("identifier #2 is blank"));
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let err = AuthorRegistry::new(vec![anna(), anna()]).unwrap_err();
        assert!(err.to_string().contains("duplicate slug"));
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = AuthorRegistry::new(Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("authors")));
    }

    #[test]
    fn test_unsafe_slugs_rejected() {
        for slug in ["", ".hidden", "..", "a/b", "a\\b", "anna mueller", "tab\there"] {
            assert!(validate_slug(slug).is_err(), "slug {:?} should be rejected", slug);
        }
        for slug in ["anna-mueller", "j.doe", "müller_2"] {
            assert!(validate_slug(slug).is_ok(), "slug {:?} should be accepted", slug);
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(anna().display_name(), "Anna Mueller");
        assert_eq!(anna().with_name("Anna Müller").display_name(), "Anna Müller");
        assert_eq!(anna().with_name("  ").display_name(), "Anna Mueller");
    }
}

//! Canned answer catalog
//!
//! The catalog is read once at startup and never mutated. The default
//! catalog is compiled in from `data/catalog.yaml`; deployments can point
//! `DOUBT_CATALOG_PATH` at their own file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::matcher;
use crate::error::CatalogError;

const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.yaml");

/// A precomputed question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannedAnswer {
    /// Canonical question text
    pub key: String,
    pub body: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// An answer served whenever the question contains `keyword`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordOverride {
    pub keyword: String,
    pub body: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// A fuzzy hit against the catalog
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannedMatch<'a> {
    pub answer: &'a CannedAnswer,
    pub score: u8,
}

/// Immutable set of keyword overrides and canned answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CannedCatalog {
    #[serde(default)]
    keyword_overrides: Vec<KeywordOverride>,
    #[serde(default)]
    answers: Vec<CannedAnswer>,
}

impl CannedCatalog {
    /// Build a catalog from parts, validating it
    pub fn new(
        keyword_overrides: Vec<KeywordOverride>,
        answers: Vec<CannedAnswer>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            keyword_overrides,
            answers,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog compiled into the binary
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_yaml(EMBEDDED_CATALOG)
    }

    /// Parse a YAML catalog
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: CannedCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a YAML catalog from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given, otherwise the embedded catalog
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading canned answer catalog");
                Self::from_file(path)
            }
            None => Self::embedded(),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for answer in &self.answers {
            let key = answer.key.trim().to_lowercase();
            if key.is_empty() {
                return Err(CatalogError::EmptyField("key"));
            }
            if !seen.insert(key) {
                return Err(CatalogError::DuplicateKey(answer.key.clone()));
            }
        }

        if self
            .keyword_overrides
            .iter()
            .any(|o| o.keyword.trim().is_empty())
        {
            return Err(CatalogError::EmptyField("keyword"));
        }

        Ok(())
    }

    pub fn answers(&self) -> &[CannedAnswer] {
        &self.answers
    }

    pub fn keyword_overrides(&self) -> &[KeywordOverride] {
        &self.keyword_overrides
    }

    pub fn len(&self) -> usize {
        self.answers.len() + self.keyword_overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First override whose keyword occurs anywhere in `normalized`
    ///
    /// Plain substring containment: "osiris" triggers the "osi" override.
    pub fn keyword_override(&self, normalized: &str) -> Option<&KeywordOverride> {
        self.keyword_overrides
            .iter()
            .find(|o| normalized.contains(o.keyword.trim().to_lowercase().as_str()))
    }

    /// Best-scoring canned answer regardless of threshold
    pub fn best_match(&self, normalized: &str) -> Option<CannedMatch<'_>> {
        let keys = self.answers.iter().map(|a| a.key.as_str());
        matcher::best_match(normalized, keys).map(|(index, score)| CannedMatch {
            answer: &self.answers[index],
            score,
        })
    }

    /// Scores for every canned key, in catalog order
    pub fn scores(&self, normalized: &str) -> Vec<(&str, u8)> {
        self.answers
            .iter()
            .map(|a| (a.key.as_str(), matcher::token_set_ratio(normalized, &a.key)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn answer(key: &str) -> CannedAnswer {
        CannedAnswer {
            key: key.to_string(),
            body: format!("body of {key}"),
            citations: vec!["Cite".to_string()],
        }
    }

    #[test]
    fn test_embedded_catalog_loads() {
        let catalog = CannedCatalog::embedded().unwrap();
        assert_eq!(catalog.answers().len(), 4);
        assert_eq!(catalog.keyword_overrides().len(), 1);
        assert_eq!(catalog.keyword_overrides()[0].keyword, "osi");
        assert_eq!(
            catalog.keyword_overrides()[0].citations,
            vec!["Networking Standards", "ISO Model"]
        );
        assert_eq!(catalog.answers()[3].key, "Explain Big O notation with examples");
        assert_eq!(
            catalog.answers()[3].citations,
            vec!["Algorithm Complexities", "Performance Optimization"]
        );
    }

    #[test]
    fn test_embedded_bodies_are_byte_exact() {
        let catalog = CannedCatalog::embedded().unwrap();

        let osi = &catalog.keyword_overrides()[0].body;
        assert!(osi.starts_with("\n📡 **Explain the OSI Model**\n\n"));
        assert!(osi.ends_with("Data Link → Physical)\n"));
        assert_eq!(osi.len(), 2645);

        let bodies: Vec<(&str, usize)> = catalog
            .answers()
            .iter()
            .map(|a| (a.body.as_str(), a.body.len()))
            .collect();
        assert_eq!(
            bodies.iter().map(|(_, len)| *len).collect::<Vec<_>>(),
            vec![1881, 1876, 2200, 2442]
        );
        for (body, _) in &bodies {
            assert!(body.starts_with('\n'));
            assert!(body.ends_with("!\n") || body.ends_with(".\n") || body.ends_with(")*\n"));
            assert!(!body.ends_with("\n\n"));
        }

        // trailing spaces before line breaks are part of the text
        assert!(bodies[1].0.contains("*\"What number are you?\"* \n"));
        assert!(bodies[2].0.contains("valuable registered package via FedEx. \n"));
        assert!(bodies[3].0.contains("            print(i, j) \n"));
    }

    #[test]
    fn test_keyword_override_is_substring() {
        let catalog = CannedCatalog::embedded().unwrap();
        assert!(catalog.keyword_override("what is the osi model").is_some());
        assert!(catalog.keyword_override("tell me about osiris").is_some());
        assert!(catalog.keyword_override("what is tcp").is_none());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let err = CannedCatalog::new(vec![], vec![answer("Help me"), answer("  help ME ")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey(_)));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = CannedCatalog::new(vec![], vec![answer("  ")]).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyField("key")));
    }

    #[test]
    fn test_best_match_prefers_first_on_tie() {
        let catalog =
            CannedCatalog::new(vec![], vec![answer("sort a list"), answer("list a sort")])
                .unwrap();
        let hit = catalog.best_match("sort a list").unwrap();
        assert_eq!(hit.answer.key, "sort a list");
        assert_eq!(hit.score, 100);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "answers:\n  - key: \"What is a stack?\"\n    body: LIFO\n    citations: [\"DS\"]"
        )
        .unwrap();

        let catalog = CannedCatalog::load(Some(file.path())).unwrap();
        assert_eq!(catalog.answers().len(), 1);
        assert!(catalog.keyword_overrides().is_empty());
        assert_eq!(catalog.answers()[0].body, "LIFO");
    }

    #[test]
    fn test_scores_in_catalog_order() {
        let catalog = CannedCatalog::embedded().unwrap();
        let scores = catalog.scores("help me understand recursion");
        assert_eq!(scores.len(), 4);
        assert_eq!(scores[1], ("Help me understand recursion", 100));
    }
}

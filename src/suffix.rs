//! Public-suffix candidate resolution.

use crate::errors::WhoisError;
use publicsuffix::{List, Psl};
use tracing::{debug, info};

const EMBEDDED_LIST: &str = include_str!("../data/public_suffix_list.dat");

pub struct SuffixResolver {
    list: List,
}

impl SuffixResolver {
    pub fn from_list_text(text: &str) -> Result<Self, WhoisError> {
        let list: List = text
            .parse()
            .map_err(|e| WhoisError::PublicSuffix(format!("invalid suffix list: {}", e)))?;
        Ok(Self { list })
    }

    pub fn embedded() -> Result<Self, WhoisError> {
        Self::from_list_text(EMBEDDED_LIST)
    }

    /// Loads the list from a path or http(s) URL; an empty source selects the embedded list.
    pub async fn load(source: &str) -> Result<Self, WhoisError> {
        let source = source.trim();
        if source.is_empty() {
            return Self::embedded();
        }
        let text = crate::catalog::read_source(source).await?;
        let resolver = Self::from_list_text(&text)?;
        info!("Public suffix list loaded from {}", source);
        Ok(resolver)
    }

    /// Candidate query names for `host`, most specific first.
    ///
    /// Every tail of `host` that is a public suffix contributes the name one
    /// label longer than that suffix.
    pub fn public_suffixes(&self, host: &str) -> Result<Vec<String>, WhoisError> {
        let host = host.trim().trim_end_matches('.').to_lowercase();
        let labels: Vec<&str> = host.split('.').collect();
        if host.is_empty() || labels.iter().any(|l| l.is_empty()) {
            return Err(WhoisError::PublicSuffix(format!("cannot derive public suffix of {:?}", host)));
        }

        let mut candidates: Vec<String> = Vec::new();
        for start in 1..labels.len() {
            let tail = labels[start..].join(".");
            if self.is_public_suffix(&tail) {
                let candidate = labels[start - 1..].join(".");
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        if candidates.is_empty() {
            return Err(WhoisError::PublicSuffix(format!("cannot derive public suffix of {:?}", host)));
        }
        debug!(host = %host, ?candidates, "public suffix candidates");
        Ok(candidates)
    }

    fn is_public_suffix(&self, name: &str) -> bool {
        match self.list.suffix(name.as_bytes()) {
            // A lone label is a suffix under the implicit `*` rule even when the list does not know it.
            Some(suffix) => suffix.as_bytes() == name.as_bytes() && (suffix.is_known() || !name.contains('.')),
            None => false,
        }
    }
}

//! Indicator catalog assembly and lookup.
//!
//! The catalog is read-only once built. Structural corruption is detected at
//! construction time so that a running service never scores against a broken
//! table.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domains::{standard_domains, DomainProvider};
use crate::types::{Domain, Indicator};

/// Error types for catalog construction and lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Lookup of a domain that is not in the catalog
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Lookup of an indicator that is not in the catalog
    #[error("Indicator not found: {0}")]
    IndicatorNotFound(String),

    /// Indicator references a domain that was never defined
    #[error("Indicator {indicator_id} references undefined domain {domain_id}")]
    UndefinedDomain {
        indicator_id: String,
        domain_id: String,
    },

    /// Domain lists an indicator that was never defined, or one owned by another domain
    #[error("Domain {domain_id} lists unknown indicator {indicator_id}")]
    DanglingIndicator {
        domain_id: String,
        indicator_id: String,
    },

    /// Indicator not listed by its domain
    #[error("Indicator {indicator_id} is not listed by domain {domain_id}")]
    UnlistedIndicator {
        indicator_id: String,
        domain_id: String,
    },

    /// Same id defined twice
    #[error("Duplicate id in catalog: {0}")]
    DuplicateId(String),

    /// Indicator without any permitted answers
    #[error("Indicator {0} has no options")]
    NoOptions(String),
}

/// Read-only table of domains and their indicators.
#[derive(Debug, Clone)]
pub struct IndicatorCatalog {
    /// Domains in display order
    domains: Vec<Domain>,
    /// Indicators in catalog order (domain order, then indicator order)
    indicators: Vec<Indicator>,
    /// Position of each indicator in `indicators`
    by_id: HashMap<String, usize>,
    /// Position of each domain in `domains`
    domain_index: HashMap<String, usize>,
    /// Sum of every domain's maximum
    max_total: u32,
    /// SHA-256 of the catalog content
    fingerprint: String,
}

impl IndicatorCatalog {
    /// Build the built-in catalog from the standard domain providers.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::from_providers(standard_domains())
    }

    /// Build a catalog from domain providers, in the given order.
    pub fn from_providers(providers: Vec<Box<dyn DomainProvider>>) -> Result<Self, CatalogError> {
        let mut domains = Vec::with_capacity(providers.len());
        let mut indicators = Vec::new();

        for provider in providers {
            let provided = provider.indicators();
            domains.push(Domain {
                id: provider.id().to_string(),
                name: provider.name().to_string(),
                indicator_ids: provided.iter().map(|i| i.id.clone()).collect(),
                max_points: 0,
            });
            indicators.extend(provided);
        }

        Self::from_parts(domains, indicators)
    }

    /// Validate and assemble a catalog from raw parts.
    ///
    /// `max_points` on the supplied domains is ignored and recomputed.
    pub fn from_parts(
        mut domains: Vec<Domain>,
        indicators: Vec<Indicator>,
    ) -> Result<Self, CatalogError> {
        let mut domain_index = HashMap::new();
        for (pos, domain) in domains.iter().enumerate() {
            if domain_index.insert(domain.id.clone(), pos).is_some() {
                return Err(CatalogError::DuplicateId(domain.id.clone()));
            }
        }

        let mut defined: HashMap<&str, &Indicator> = HashMap::new();
        for indicator in &indicators {
            if indicator.options.is_empty() {
                return Err(CatalogError::NoOptions(indicator.id.clone()));
            }
            if !domain_index.contains_key(&indicator.domain_id) {
                return Err(CatalogError::UndefinedDomain {
                    indicator_id: indicator.id.clone(),
                    domain_id: indicator.domain_id.clone(),
                });
            }
            if defined.insert(indicator.id.as_str(), indicator).is_some()
                || domain_index.contains_key(&indicator.id)
            {
                return Err(CatalogError::DuplicateId(indicator.id.clone()));
            }
        }

        let mut listed = HashSet::new();
        for domain in &domains {
            for indicator_id in &domain.indicator_ids {
                let owned = defined
                    .get(indicator_id.as_str())
                    .is_some_and(|i| i.domain_id == domain.id);
                if !owned {
                    return Err(CatalogError::DanglingIndicator {
                        domain_id: domain.id.clone(),
                        indicator_id: indicator_id.clone(),
                    });
                }
                if !listed.insert(indicator_id.as_str()) {
                    return Err(CatalogError::DuplicateId(indicator_id.clone()));
                }
            }
        }

        if let Some(unlisted) = indicators.iter().find(|i| !listed.contains(i.id.as_str())) {
            return Err(CatalogError::UnlistedIndicator {
                indicator_id: unlisted.id.clone(),
                domain_id: unlisted.domain_id.clone(),
            });
        }

        // Order indicators by domain display order, then by position in the domain
        let mut ordered = Vec::with_capacity(indicators.len());
        for domain in domains.iter_mut() {
            let mut max_points = 0;
            for indicator_id in &domain.indicator_ids {
                if let Some(indicator) = defined.get(indicator_id.as_str()) {
                    max_points += indicator.max_points();
                    ordered.push((*indicator).clone());
                }
            }
            domain.max_points = max_points;
        }

        let by_id = ordered
            .iter()
            .enumerate()
            .map(|(pos, i)| (i.id.clone(), pos))
            .collect();
        let max_total = domains.iter().map(|d| d.max_points).sum();
        let fingerprint = compute_fingerprint(&domains, &ordered);

        tracing::debug!(
            domains = domains.len(),
            indicators = ordered.len(),
            max_total,
            fingerprint = %fingerprint,
            "Indicator catalog built"
        );

        Ok(Self {
            domains,
            indicators: ordered,
            by_id,
            domain_index,
            max_total,
            fingerprint,
        })
    }

    /// Domains in fixed display order.
    pub fn list_domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Indicators of one domain in fixed order.
    pub fn indicators_of(&self, domain_id: &str) -> Result<Vec<&Indicator>, CatalogError> {
        let pos = self
            .domain_index
            .get(domain_id)
            .ok_or_else(|| CatalogError::DomainNotFound(domain_id.to_string()))?;

        Ok(self.domains[*pos]
            .indicator_ids
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|p| &self.indicators[*p]))
            .collect())
    }

    /// Look up a domain.
    pub fn domain(&self, domain_id: &str) -> Result<&Domain, CatalogError> {
        self.domain_index
            .get(domain_id)
            .map(|pos| &self.domains[*pos])
            .ok_or_else(|| CatalogError::DomainNotFound(domain_id.to_string()))
    }

    /// Look up an indicator.
    pub fn indicator(&self, indicator_id: &str) -> Result<&Indicator, CatalogError> {
        self.by_id
            .get(indicator_id)
            .map(|pos| &self.indicators[*pos])
            .ok_or_else(|| CatalogError::IndicatorNotFound(indicator_id.to_string()))
    }

    /// Every indicator in catalog order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Number of indicators.
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Maximum attainable total score.
    pub fn max_total(&self) -> u32 {
        self.max_total
    }

    /// Content hash identifying this catalog revision.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    domains: &'a [Domain],
    indicators: &'a [Indicator],
}

fn compute_fingerprint(domains: &[Domain], indicators: &[Indicator]) -> String {
    let json = serde_json::to_string(&FingerprintInput {
        domains,
        indicators,
    })
    .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IndicatorOption;

    fn domain(id: &str, indicator_ids: &[&str]) -> Domain {
        Domain {
            id: id.to_string(),
            name: id.to_uppercase(),
            indicator_ids: indicator_ids.iter().map(|s| s.to_string()).collect(),
            max_points: 0,
        }
    }

    #[test]
    fn test_standard_catalog() {
        let catalog = IndicatorCatalog::standard().unwrap();

        assert_eq!(catalog.list_domains().len(), 10);
        assert_eq!(catalog.len(), 50);
        assert_eq!(catalog.max_total(), 100);
        assert_eq!(catalog.list_domains()[0].id, "water_sanitation");

        for domain in catalog.list_domains() {
            assert_eq!(domain.max_points, 10);
        }
    }

    #[test]
    fn test_indicators_of_keeps_order() {
        let catalog = IndicatorCatalog::standard().unwrap();
        let ids: Vec<_> = catalog
            .indicators_of("education")
            .unwrap()
            .iter()
            .map(|i| i.id.as_str())
            .collect();

        assert_eq!(
            ids,
            vec![
                "ed-enrolment",
                "ed-secondary-completion",
                "ed-primary-school",
                "ed-anganwadi",
                "ed-adult-literacy",
            ]
        );
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = IndicatorCatalog::standard().unwrap();

        assert_eq!(
            catalog.indicators_of("space_program").unwrap_err(),
            CatalogError::DomainNotFound("space_program".to_string())
        );
        assert!(matches!(
            catalog.indicator("nope"),
            Err(CatalogError::IndicatorNotFound(_))
        ));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = IndicatorCatalog::standard().unwrap();
        let b = IndicatorCatalog::standard().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_indicator_with_undefined_domain_fails_fast() {
        let result = IndicatorCatalog::from_parts(
            vec![domain("water", &["w1"])],
            vec![
                Indicator::availability("w1", "water", "Tap?"),
                Indicator::availability("x1", "ghost", "Haunted?"),
            ],
        );

        assert_eq!(
            result.unwrap_err(),
            CatalogError::UndefinedDomain {
                indicator_id: "x1".to_string(),
                domain_id: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_dangling_and_unlisted_indicators() {
        let dangling = IndicatorCatalog::from_parts(
            vec![domain("water", &["w1", "w2"])],
            vec![Indicator::availability("w1", "water", "Tap?")],
        );
        assert!(matches!(
            dangling,
            Err(CatalogError::DanglingIndicator { .. })
        ));

        let unlisted = IndicatorCatalog::from_parts(
            vec![domain("water", &["w1"])],
            vec![
                Indicator::availability("w1", "water", "Tap?"),
                Indicator::availability("w2", "water", "Well?"),
            ],
        );
        assert!(matches!(
            unlisted,
            Err(CatalogError::UnlistedIndicator { .. })
        ));
    }

    #[test]
    fn test_empty_options_rejected() {
        let mut indicator = Indicator::availability("w1", "water", "Tap?");
        indicator.options.clear();

        let result = IndicatorCatalog::from_parts(vec![domain("water", &["w1"])], vec![indicator]);
        assert_eq!(result.unwrap_err(), CatalogError::NoOptions("w1".to_string()));
    }

    #[test]
    fn test_custom_max_points() {
        let mut indicator = Indicator::availability("w1", "water", "Tap?");
        indicator.options.push(IndicatorOption::new("Broken", 1));

        let catalog = IndicatorCatalog::from_parts(
            vec![domain("water", &["w1"])],
            vec![indicator],
        )
        .unwrap();

        assert_eq!(catalog.max_total(), 2);
        assert_eq!(catalog.domain("water").unwrap().max_points, 2);
    }
}

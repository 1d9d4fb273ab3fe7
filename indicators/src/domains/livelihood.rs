//! Livelihood and skill development.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "livelihood";

/// Provider for the livelihood and skill development domain.
pub struct LivelihoodDomain;

impl DomainProvider for LivelihoodDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Livelihood & Skill Development"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "lv-job-cards",
                DOMAIN,
                "Share of households with an active job card",
            ),
            Indicator::coverage(
                "lv-employment-days",
                DOMAIN,
                "Share of demanded wage employment days provided",
            ),
            Indicator::coverage(
                "lv-shg-membership",
                DOMAIN,
                "Share of households with a woman in a self-help group",
            ),
            Indicator::coverage(
                "lv-skill-training",
                DOMAIN,
                "Share of youth who completed skill training",
            ),
            Indicator::availability(
                "lv-livestock-services",
                DOMAIN,
                "Veterinary or livestock service reachable",
            ),
        ]
    }
}

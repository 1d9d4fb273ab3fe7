//! Health and nutrition.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "health";

/// Provider for the health and nutrition domain.
pub struct HealthDomain;

impl DomainProvider for HealthDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Health & Nutrition"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "hn-institutional-delivery",
                DOMAIN,
                "Share of births in a health institution",
            ),
            Indicator::coverage(
                "hn-full-immunisation",
                DOMAIN,
                "Share of children fully immunised",
            ),
            Indicator::availability(
                "hn-health-centre",
                DOMAIN,
                "Sub-centre or wellness centre within three kilometres",
            ),
            Indicator::coverage(
                "hn-health-insurance",
                DOMAIN,
                "Share of eligible households with a health insurance card",
            ),
            Indicator::availability(
                "hn-nutrition-support",
                DOMAIN,
                "Supplementary nutrition reaching pregnant women and infants",
            ),
        ]
    }
}

//! Drinking water and sanitation - household access to safe water and toilets.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "water_sanitation";

/// Provider for the drinking water and sanitation domain.
pub struct WaterSanitationDomain;

impl DomainProvider for WaterSanitationDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Drinking Water & Sanitation"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "ws-piped-water",
                DOMAIN,
                "Share of households with a functional tap connection",
            ),
            Indicator::coverage(
                "ws-household-toilets",
                DOMAIN,
                "Share of households with an individual toilet in use",
            ),
            Indicator::availability(
                "ws-odf-plus",
                DOMAIN,
                "Village declared ODF Plus and verified",
            ),
            Indicator::availability(
                "ws-greywater",
                DOMAIN,
                "Greywater management system in place",
            ),
            Indicator::availability(
                "ws-solid-waste",
                DOMAIN,
                "Door-to-door solid waste collection operating",
            ),
        ]
    }
}

//! Electricity and clean cooking fuel.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "energy";

/// Provider for the electricity and clean fuel domain.
pub struct EnergyDomain;

impl DomainProvider for EnergyDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Electricity & Clean Fuel"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "en-household-electricity",
                DOMAIN,
                "Share of households with an electricity connection",
            ),
            Indicator::coverage(
                "en-clean-cooking",
                DOMAIN,
                "Share of households cooking with LPG or another clean fuel",
            ),
            Indicator::availability(
                "en-supply-hours",
                DOMAIN,
                "Supply available at least 18 hours a day",
            ),
            Indicator::availability(
                "en-solar-public",
                DOMAIN,
                "Solar power installed on public buildings",
            ),
            Indicator::coverage(
                "en-efficient-lighting",
                DOMAIN,
                "Share of households using LED lighting",
            ),
        ]
    }
}

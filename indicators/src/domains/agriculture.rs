//! Agricultural practices.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "agriculture";

/// Provider for the agricultural practices domain.
pub struct AgricultureDomain;

impl DomainProvider for AgricultureDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Agricultural Practices"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "ag-soil-health-card",
                DOMAIN,
                "Share of farmers holding a soil health card",
            ),
            Indicator::coverage(
                "ag-crop-insurance",
                DOMAIN,
                "Share of farmers covered by crop insurance",
            ),
            Indicator::coverage(
                "ag-irrigation",
                DOMAIN,
                "Share of cultivated land under assured irrigation",
            ),
            Indicator::availability(
                "ag-water-harvesting",
                DOMAIN,
                "Community water harvesting structure maintained",
            ),
            Indicator::availability(
                "ag-market-access",
                DOMAIN,
                "Regulated market or collection centre within ten kilometres",
            ),
        ]
    }
}

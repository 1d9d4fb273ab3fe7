//! Digitization - connectivity and e-governance access.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "digital";

/// Provider for the digitization domain.
pub struct DigitalDomain;

impl DomainProvider for DigitalDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Digitization"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::availability(
                "dg-broadband",
                DOMAIN,
                "Gram panchayat connected to broadband",
            ),
            Indicator::availability(
                "dg-common-service-centre",
                DOMAIN,
                "Common service centre operating in the village",
            ),
            Indicator::coverage(
                "dg-mobile-coverage",
                DOMAIN,
                "Share of habitations with 4G coverage",
            ),
            Indicator::coverage(
                "dg-digital-literacy",
                DOMAIN,
                "Share of households with a digitally literate member",
            ),
            Indicator::availability(
                "dg-land-records",
                DOMAIN,
                "Land records digitized and accessible",
            ),
        ]
    }
}

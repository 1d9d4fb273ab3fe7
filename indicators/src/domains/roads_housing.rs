//! Rural roads and housing.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "roads_housing";

/// Provider for the rural roads and housing domain.
pub struct RoadsHousingDomain;

impl DomainProvider for RoadsHousingDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Rural Roads & Housing"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::availability(
                "rh-all-weather-road",
                DOMAIN,
                "Village connected by an all-weather road",
            ),
            Indicator::availability(
                "rh-internal-roads",
                DOMAIN,
                "Internal roads paved with drainage",
            ),
            Indicator::coverage(
                "rh-pucca-housing",
                DOMAIN,
                "Share of households living in a pucca house",
            ),
            Indicator::availability(
                "rh-street-lights",
                DOMAIN,
                "Street lighting on main village roads",
            ),
            Indicator::availability(
                "rh-community-hall",
                DOMAIN,
                "Community hall or panchayat building usable",
            ),
        ]
    }
}

//! Social security - pensions and insurance for vulnerable households.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "social_security";

/// Provider for the social security domain.
pub struct SocialSecurityDomain;

impl DomainProvider for SocialSecurityDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Social Security"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "ss-old-age-pension",
                DOMAIN,
                "Share of eligible elderly receiving a pension",
            ),
            Indicator::coverage(
                "ss-widow-pension",
                DOMAIN,
                "Share of eligible widows receiving a pension",
            ),
            Indicator::coverage(
                "ss-disability-pension",
                DOMAIN,
                "Share of persons with disability receiving support",
            ),
            Indicator::coverage(
                "ss-life-insurance",
                DOMAIN,
                "Share of adults enrolled in a life insurance scheme",
            ),
            Indicator::availability(
                "ss-ration-coverage",
                DOMAIN,
                "All eligible households hold a ration card",
            ),
        ]
    }
}

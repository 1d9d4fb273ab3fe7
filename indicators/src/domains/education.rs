//! Education - enrolment, schooling infrastructure and early childhood care.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "education";

/// Provider for the education domain.
pub struct EducationDomain;

impl DomainProvider for EducationDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Education"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "ed-enrolment",
                DOMAIN,
                "Share of children aged 6-14 enrolled in school",
            ),
            Indicator::coverage(
                "ed-secondary-completion",
                DOMAIN,
                "Share of adolescents completing secondary school",
            ),
            Indicator::availability(
                "ed-primary-school",
                DOMAIN,
                "Primary school within one kilometre",
            ),
            Indicator::availability(
                "ed-anganwadi",
                DOMAIN,
                "Anganwadi centre with its own building",
            ),
            Indicator::coverage(
                "ed-adult-literacy",
                DOMAIN,
                "Adult literacy rate",
            ),
        ]
    }
}

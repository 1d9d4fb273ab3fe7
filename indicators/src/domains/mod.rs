//! Built-in scoring domains.
//!
//! Each domain module provides the indicators observed for one area of
//! village infrastructure or welfare coverage. The catalog assembles them in
//! the fixed display order returned by [`standard_domains`].

pub mod agriculture;
pub mod digital;
pub mod education;
pub mod energy;
pub mod financial_inclusion;
pub mod health;
pub mod livelihood;
pub mod roads_housing;
pub mod social_security;
pub mod water_sanitation;

pub use agriculture::AgricultureDomain;
pub use digital::DigitalDomain;
pub use education::EducationDomain;
pub use energy::EnergyDomain;
pub use financial_inclusion::FinancialInclusionDomain;
pub use health::HealthDomain;
pub use livelihood::LivelihoodDomain;
pub use roads_housing::RoadsHousingDomain;
pub use social_security::SocialSecurityDomain;
pub use water_sanitation::WaterSanitationDomain;

use crate::types::Indicator;

/// Trait for domain-specific indicator content.
pub trait DomainProvider: Send + Sync {
    /// Stable domain identifier
    fn id(&self) -> &'static str;

    /// Display name
    fn name(&self) -> &'static str;

    /// Indicators in display order
    fn indicators(&self) -> Vec<Indicator>;
}

/// All built-in domains in display order.
pub fn standard_domains() -> Vec<Box<dyn DomainProvider>> {
    vec![
        Box::new(WaterSanitationDomain),
        Box::new(EducationDomain),
        Box::new(HealthDomain),
        Box::new(SocialSecurityDomain),
        Box::new(RoadsHousingDomain),
        Box::new(EnergyDomain),
        Box::new(AgricultureDomain),
        Box::new(FinancialInclusionDomain),
        Box::new(DigitalDomain),
        Box::new(LivelihoodDomain),
    ]
}

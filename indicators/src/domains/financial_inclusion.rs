//! Financial inclusion.

use crate::domains::DomainProvider;
use crate::types::Indicator;

const DOMAIN: &str = "financial_inclusion";

/// Provider for the financial inclusion domain.
pub struct FinancialInclusionDomain;

impl DomainProvider for FinancialInclusionDomain {
    fn id(&self) -> &'static str {
        DOMAIN
    }

    fn name(&self) -> &'static str {
        "Financial Inclusion"
    }

    fn indicators(&self) -> Vec<Indicator> {
        vec![
            Indicator::coverage(
                "fi-bank-accounts",
                DOMAIN,
                "Share of adults with an operational bank account",
            ),
            Indicator::availability(
                "fi-banking-point",
                DOMAIN,
                "Bank branch or correspondent within five kilometres",
            ),
            Indicator::coverage(
                "fi-dbt-seeding",
                DOMAIN,
                "Share of accounts seeded for direct benefit transfer",
            ),
            Indicator::coverage(
                "fi-shg-credit",
                DOMAIN,
                "Share of self-help groups with a credit linkage",
            ),
            Indicator::availability(
                "fi-atm",
                DOMAIN,
                "Working ATM or micro-ATM in the village",
            ),
        ]
    }
}

use serde::Serialize;

use super::catalog::{BUSINESS_ROLES, CITIES, COMPANY_NAMES, Role, STREET_NAMES};
use super::hash::{hash_code, pick};
use super::profile::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: &'static str,
    /// `xxx xxx xxx`
    pub org_number: String,
    pub role: &'static Role,
    pub address: Address,
    pub employee_count: u64,
    pub customer_since: String,
}

/// The company a business user acts for, and the user's role in it.
pub fn company_profile(user_id: &str) -> Option<CompanyProfile> {
    if user_id.is_empty() {
        return None;
    }
    let hash = hash_code(user_id);
    let city = pick(&CITIES, hash, 0);

    Some(CompanyProfile {
        company_name: *pick(&COMPANY_NAMES, hash, 0),
        org_number: format_org_number(&(900_000_000 + hash % 100_000_000).to_string()),
        role: pick(&BUSINESS_ROLES, hash, 0),
        address: Address {
            street: format!("{} {}", pick(&STREET_NAMES, hash, 0), hash % 50 + 1),
            postal_code: city.postal_code.to_string(),
            city: city.name.to_string(),
            country: None,
        },
        employee_count: hash % 200 + 10,
        customer_since: (2010 + hash % 14).to_string(),
    })
}

/// Splits a nine digit organization number into groups of three.
pub fn format_org_number(raw: &str) -> String {
    let digits: Vec<char> = raw.chars().collect();
    digits
        .chunks(3)
        .take(2)
        .map(|c| c.iter().collect::<String>())
        .chain(std::iter::once(digits.iter().skip(6).collect()))
        .collect::<Vec<_>>()
        .join(" ")
}

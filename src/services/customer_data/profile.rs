use serde::Serialize;

use crate::services::auth::UserClaims;

use super::catalog::{CITIES, LAST_NAMES, STREET_NAMES};
use super::hash::hash_code;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: Option<String>,
}

impl Address {
    /// "Storgata 12, 0150 Oslo"
    pub fn single_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommunicationPreferences {
    pub email: bool,
    pub sms: bool,
    pub post: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CustomerTier {
    Premium,
    Standard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// `DD.MM.YYYY`
    pub birth_date: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Address,
    pub customer_number: String,
    pub member_since: String,
    pub tier: CustomerTier,
    pub email_verified: bool,
    pub picture: Option<String>,
    pub communication: CommunicationPreferences,
}

/// Display first name: the first word of a non-email `name`, then `given_name`,
/// then the capitalized local part of the email, else "bruker".
pub fn first_name(claims: &UserClaims) -> String {
    if let Some(name) = claims.name.as_deref().filter(|n| !n.is_empty() && !n.contains('@'))
        && let Some(first) = name.split(' ').next()
    {
        return first.to_string();
    }
    if let Some(given) = &claims.given_name {
        return given.clone();
    }
    if let Some(email) = &claims.email {
        let local = email.split('@').next().unwrap_or_default();
        let mut chars = local.chars();
        return match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    "bruker".to_string()
}

/// Mock profile seeded by the subject (or email when the subject is empty).
pub fn generate_user_profile(claims: &UserClaims) -> UserProfile {
    let seed = if !claims.sub.is_empty() {
        claims.sub.as_str()
    } else {
        claims.email.as_deref().unwrap_or("default")
    };
    let hash = hash_code(seed);

    let birth_year = 1960 + hash % 40;
    let birth_month = hash % 12 + 1;
    let birth_day = hash % 28 + 1;

    let phone = format!(
        "+47 {} {} {}{}",
        400 + hash % 100,
        hash % 90 + 10,
        hash * 3 % 90 + 10,
        hash * 7 % 10
    );

    let street = STREET_NAMES[(hash % STREET_NAMES.len() as u64) as usize];
    let city = &CITIES[((hash * 3) % CITIES.len() as u64) as usize];

    let first_name = first_name(claims);
    let last_name = LAST_NAMES[(hash % LAST_NAMES.len() as u64) as usize].to_string();
    let full_name = claims
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("{first_name} {last_name}"));

    UserProfile {
        user_id: claims.sub.clone(),
        first_name,
        last_name,
        full_name,
        birth_date: format!("{birth_day:02}.{birth_month:02}.{birth_year}"),
        email: claims.email.clone(),
        phone,
        address: Address {
            street: format!("{street} {}", hash % 150 + 1),
            postal_code: city.postal_code.to_string(),
            city: city.name.to_string(),
            country: Some("Norge".to_string()),
        },
        customer_number: format!("KNR-{}", 1_000_000 + hash % 9_000_000),
        member_since: (2015 + hash % 10).to_string(),
        tier: if hash % 3 == 0 {
            CustomerTier::Premium
        } else {
            CustomerTier::Standard
        },
        email_verified: claims.is_email_verified(),
        picture: claims.picture.clone(),
        communication: CommunicationPreferences {
            email: true,
            sms: hash % 2 == 0,
            post: hash % 4 == 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_name_prefers_non_email_name() {
        let claims = UserClaims::new("x").with_name("Ola Nordmann");
        assert_eq!(first_name(&claims), "Ola");

        let claims = UserClaims::new("x")
            .with_name("ola@example.no")
            .with_email("ola@example.no");
        assert_eq!(first_name(&claims), "Ola");

        assert_eq!(first_name(&UserClaims::new("x")), "bruker");
    }

    #[test]
    fn first_name_falls_back_to_given_name() {
        let mut claims = UserClaims::new("x").with_email("kari@example.no");
        claims.given_name = Some("Kari".into());
        assert_eq!(first_name(&claims), "Kari");
    }

    #[test]
    fn profile_is_derived_from_hash_of_sub() {
        // hash_code("hello") == 99162322
        let claims = UserClaims::new("hello").with_email("user@example.com");
        let profile = generate_user_profile(&claims);

        assert_eq!(profile.birth_date, "15.11.1962");
        assert_eq!(profile.phone, "+47 422 62 764");
        assert_eq!(profile.address.street, "Parkveien 23");
        assert_eq!(profile.address.city, "Oslo");
        assert_eq!(profile.customer_number, "KNR-1162322");
        assert_eq!(profile.member_since, "2017");
        assert_eq!(profile.last_name, "Kristiansen");
        assert_eq!(profile.full_name, "User Kristiansen");
        assert_eq!(profile.tier, CustomerTier::Standard);
        assert_eq!(profile.address.single_line(), "Parkveien 23, 0150 Oslo");
    }

    #[test]
    fn same_claims_same_profile() {
        let claims = UserClaims::new("auth0|42").with_email("a@b.no");
        assert_eq!(generate_user_profile(&claims), generate_user_profile(&claims));
    }
}

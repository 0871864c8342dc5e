/*
 * Responsibility
 * - Seam between the profile logic and wherever customer data comes from
 * - MockDataSource: everything derived from a hash of the id, no hidden state
 */
use async_trait::async_trait;

use crate::services::auth::UserClaims;
use crate::services::profile::{CustomerType, Identity, IdentityKind};

use super::business::{CompanyProfile, company_profile};
use super::catalog::{BUSINESS_ROLES, COMPANY_NAMES};
use super::delegation::{Delegations, user_delegations};
use super::hash::{hash_code, pick};
use super::insurance::{Insurance, business_insurances, user_insurances};
use super::profile::{UserProfile, generate_user_profile};

#[async_trait]
pub trait CustomerDataSource: Send + Sync {
    // Source name (for logging).
    fn source_name(&self) -> &'static str;

    async fn user_profile(&self, claims: &UserClaims) -> UserProfile;

    async fn user_insurances(&self, owner_id: &str) -> Vec<Insurance>;

    async fn business_insurances(&self, company_id: &str) -> Vec<Insurance>;

    async fn delegations(&self, user_id: &str) -> Delegations;

    async fn company_profile(&self, user_id: &str) -> Option<CompanyProfile>;

    /// Identities `user_id` may act as. The own identity always comes first.
    async fn available_identities(
        &self,
        user_id: &str,
        customer_type: CustomerType,
    ) -> Vec<Identity>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDataSource;

impl MockDataSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CustomerDataSource for MockDataSource {
    fn source_name(&self) -> &'static str {
        "mock"
    }

    async fn user_profile(&self, claims: &UserClaims) -> UserProfile {
        generate_user_profile(claims)
    }

    async fn user_insurances(&self, owner_id: &str) -> Vec<Insurance> {
        user_insurances(owner_id)
    }

    async fn business_insurances(&self, company_id: &str) -> Vec<Insurance> {
        business_insurances(company_id)
    }

    async fn delegations(&self, user_id: &str) -> Delegations {
        user_delegations(user_id)
    }

    async fn company_profile(&self, user_id: &str) -> Option<CompanyProfile> {
        company_profile(user_id)
    }

    async fn available_identities(
        &self,
        user_id: &str,
        customer_type: CustomerType,
    ) -> Vec<Identity> {
        derive_identities(user_id, customer_type)
    }
}

/// Own identity first, then delegations received (private) or other
/// companies (business).
pub fn derive_identities(user_id: &str, customer_type: CustomerType) -> Vec<Identity> {
    if user_id.is_empty() {
        return Vec::new();
    }
    let hash = hash_code(user_id);
    let mut identities = Vec::new();

    match customer_type {
        CustomerType::Private => {
            // the switcher only knows the subject, never the real email
            let claims = UserClaims::new(user_id).with_email("user@example.com");
            identities.push(Identity {
                id: "self".into(),
                name: generate_user_profile(&claims).full_name,
                subtitle: "Din profil".into(),
                kind: IdentityKind::Own { role: None },
            });

            for delegation in user_delegations(user_id).received_from {
                identities.push(Identity {
                    id: format!("delegate-{}", delegation.id),
                    name: delegation.name.clone(),
                    subtitle: format!("Fullmakt fra {}", delegation.relationship.to_lowercase()),
                    kind: IdentityKind::Delegation(delegation),
                });
            }
        }
        CustomerType::Business => {
            let company = company_profile(user_id);
            identities.push(Identity {
                id: "self".into(),
                name: company
                    .as_ref()
                    .map(|c| c.company_name.to_string())
                    .unwrap_or_default(),
                subtitle: "Din bedrift".into(),
                kind: IdentityKind::Own {
                    role: company.map(|c| c.role),
                },
            });

            if hash % 3 == 0 {
                identities.push(Identity {
                    id: "company-2".into(),
                    name: pick(&COMPANY_NAMES, hash, 2).to_string(),
                    subtitle: "Regnskapsfører-tilgang".into(),
                    kind: IdentityKind::Business {
                        role: &BUSINESS_ROLES[2],
                    },
                });
            }
        }
    }

    identities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_where(pred: impl Fn(u64) -> bool) -> String {
        (0..)
            .map(|n| format!("auth0|user-{n}"))
            .find(|u| pred(hash_code(u)))
            .unwrap()
    }

    #[test]
    fn identities_are_deterministic_and_self_first() {
        for customer_type in [CustomerType::Private, CustomerType::Business] {
            for user in ["auth0|1", "auth0|2", "google-oauth2|1234567890"] {
                let first = derive_identities(user, customer_type);
                let second = derive_identities(user, customer_type);

                assert_eq!(first, second);
                assert!(matches!(first[0].kind, IdentityKind::Own { .. }));
                assert_eq!(first[0].id, "self");
            }
        }
    }

    #[test]
    fn private_user_with_received_delegation() {
        let user = user_where(|h| h % 4 == 0);
        let identities = derive_identities(&user, CustomerType::Private);

        assert_eq!(identities.len(), 2);
        assert_eq!(identities[1].id, "delegate-3");
        assert_eq!(identities[1].name, "Kari Nordmann");
        assert_eq!(identities[1].subtitle, "Fullmakt fra mor");
    }

    #[test]
    fn business_user_with_second_company() {
        let user = user_where(|h| h % 3 == 0);
        let hash = hash_code(&user);
        let identities = derive_identities(&user, CustomerType::Business);

        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].subtitle, "Din bedrift");
        assert_eq!(identities[0].name, COMPANY_NAMES[(hash % 6) as usize]);
        assert_eq!(identities[1].id, "company-2");
        assert_eq!(identities[1].name, COMPANY_NAMES[((hash + 2) % 6) as usize]);
    }

    #[test]
    fn business_user_without_second_company() {
        let user = user_where(|h| h % 3 != 0);
        assert_eq!(derive_identities(&user, CustomerType::Business).len(), 1);
    }

    #[test]
    fn empty_user_has_no_identities() {
        assert!(derive_identities("", CustomerType::Private).is_empty());
    }

    #[tokio::test]
    async fn mock_source_delegates_to_generators() {
        let source = MockDataSource::new();

        assert_eq!(source.user_insurances("hello").await, user_insurances("hello"));
        assert_eq!(
            source.available_identities("auth0|1", CustomerType::Business).await,
            derive_identities("auth0|1", CustomerType::Business)
        );
        assert!(source.company_profile("auth0|1").await.is_some());
    }
}

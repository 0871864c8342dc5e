/*
 * Responsibility
 * - Customer type chosen before login
 * - The active identity (own, delegation, other company) and switching between identities
 * - Which insurances are visible while acting as the active identity
 */
use std::sync::Arc;

use crate::error::ProfileError;
use crate::services::customer_data::insurance::filter_by_permissions;
use crate::services::customer_data::{CustomerDataSource, Insurance};

use super::types::{CustomerType, Identity, IdentityKind};

pub struct ProfileSelector {
    source: Arc<dyn CustomerDataSource>,
    customer_type: Option<CustomerType>,
    active: Option<Identity>,
    switcher_open: bool,
}

impl std::fmt::Debug for ProfileSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSelector")
            .field("source", &self.source.source_name())
            .field("customer_type", &self.customer_type)
            .field("active", &self.active.as_ref().map(|i| &i.id))
            .field("switcher_open", &self.switcher_open)
            .finish()
    }
}

impl ProfileSelector {
    pub fn new(source: Arc<dyn CustomerDataSource>) -> Self {
        Self {
            source,
            customer_type: None,
            active: None,
            switcher_open: false,
        }
    }

    pub fn source(&self) -> &Arc<dyn CustomerDataSource> {
        &self.source
    }

    pub fn customer_type(&self) -> Option<CustomerType> {
        self.customer_type
    }

    /// Parses and stores the customer type. An unknown value is logged and
    /// leaves the current selection untouched.
    pub fn select_customer_type(&mut self, raw: &str) -> Result<CustomerType, ProfileError> {
        match raw.parse::<CustomerType>() {
            Ok(customer_type) => {
                self.set_customer_type(customer_type);
                Ok(customer_type)
            }
            Err(e) => {
                tracing::warn!(value = raw, "invalid customer type ignored");
                Err(e)
            }
        }
    }

    /// A different type drops the active identity, which belonged to the old one.
    pub fn set_customer_type(&mut self, customer_type: CustomerType) {
        if self.customer_type == Some(customer_type) {
            return;
        }
        if let Some(previous) = self.active.take() {
            tracing::info!(identity = %previous.id, "customer type changed, active identity cleared");
        }
        self.switcher_open = false;
        self.customer_type = Some(customer_type);
    }

    /// Empty until a customer type is selected.
    pub async fn available_identities(&self, user_id: &str) -> Vec<Identity> {
        match self.customer_type {
            Some(customer_type) => self.source.available_identities(user_id, customer_type).await,
            None => Vec::new(),
        }
    }

    /// Activates the first available identity unless one is already active.
    pub async fn initialize_default(&mut self, user_id: &str) -> Result<Option<&Identity>, ProfileError> {
        if self.active.is_none() {
            let customer_type = self.customer_type.ok_or(ProfileError::CustomerTypeRequired)?;
            let first = self
                .source
                .available_identities(user_id, customer_type)
                .await
                .into_iter()
                .next();
            if let Some(identity) = &first {
                tracing::debug!(identity = %identity.id, "default identity activated");
            }
            self.active = first;
        }
        Ok(self.active.as_ref())
    }

    pub fn active(&self) -> Option<&Identity> {
        self.active.as_ref()
    }

    /// Replaces the active identity and closes the switcher.
    /// Returns `false` when `identity` was already active.
    pub fn switch_to(&mut self, identity: Identity) -> bool {
        self.switcher_open = false;
        if self.active.as_ref().is_some_and(|a| a.id == identity.id) {
            return false;
        }
        tracing::info!(identity = %identity.id, "switched identity");
        self.active = Some(identity);
        true
    }

    /// Switches to the available identity with `identity_id`.
    pub async fn switch_to_id(
        &mut self,
        user_id: &str,
        identity_id: &str,
    ) -> Result<&Identity, ProfileError> {
        let identity = self
            .available_identities(user_id)
            .await
            .into_iter()
            .find(|i| i.id == identity_id)
            .ok_or_else(|| ProfileError::UnknownIdentity(identity_id.to_string()))?;

        self.switch_to(identity);
        self.active.as_ref().ok_or(ProfileError::UnknownIdentity(identity_id.to_string()))
    }

    pub fn is_acting_as_delegate(&self) -> bool {
        self.active.as_ref().is_some_and(Identity::is_delegation)
    }

    pub fn is_acting_as_business(&self) -> bool {
        self.active.as_ref().is_some_and(Identity::is_business)
    }

    pub fn is_switcher_open(&self) -> bool {
        self.switcher_open
    }

    pub fn open_switcher(&mut self) {
        self.switcher_open = true;
    }

    pub fn close_switcher(&mut self) {
        self.switcher_open = false;
    }

    /// Insurances of the active identity, filtered to what it may see.
    pub async fn visible_insurances(&self, user_id: &str) -> Vec<Insurance> {
        let (Some(identity), Some(customer_type)) = (&self.active, self.customer_type) else {
            return Vec::new();
        };

        let all = match (&identity.kind, customer_type) {
            (IdentityKind::Own { .. }, CustomerType::Private) => {
                self.source.user_insurances(user_id).await
            }
            (IdentityKind::Own { .. }, CustomerType::Business) => {
                self.source.business_insurances(user_id).await
            }
            (IdentityKind::Delegation(_), _) => self.source.user_insurances(&identity.id).await,
            (IdentityKind::Business { .. }, _) => {
                self.source.business_insurances(&identity.id).await
            }
        };

        filter_by_permissions(&all, &identity.permitted_categories())
    }

    /// Forgets customer type, active identity and switcher state.
    pub fn reset(&mut self) {
        self.customer_type = None;
        self.active = None;
        self.switcher_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::customer_data::hash::hash_code;
    use crate::services::customer_data::insurance::{business_insurances, user_insurances};
    use crate::services::customer_data::{MockDataSource, PermissionCategory};

    fn selector() -> ProfileSelector {
        ProfileSelector::new(Arc::new(MockDataSource::new()))
    }

    fn user_where(pred: impl Fn(u64) -> bool) -> String {
        (0..)
            .map(|n| format!("auth0|user-{n}"))
            .find(|u| pred(hash_code(u)))
            .unwrap()
    }

    #[test]
    fn invalid_customer_type_is_a_no_op() {
        let mut profiles = selector();
        profiles.select_customer_type("private").unwrap();

        let err = profiles.select_customer_type("vip").unwrap_err();

        assert_eq!(err, ProfileError::InvalidCustomerType("vip".into()));
        assert_eq!(profiles.customer_type(), Some(CustomerType::Private));
    }

    #[tokio::test]
    async fn changing_customer_type_drops_the_active_identity() {
        let user = user_where(|h| h % 3 == 0);
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Private);
        profiles.initialize_default(&user).await.unwrap();

        profiles.select_customer_type("private").unwrap();
        assert_eq!(profiles.active().unwrap().id, "self");

        profiles.select_customer_type("business").unwrap();
        assert!(profiles.active().is_none());
        assert!(profiles.visible_insurances(&user).await.is_empty());

        let own = profiles.initialize_default(&user).await.unwrap().cloned().unwrap();
        assert_eq!(
            profiles.visible_insurances(&user).await,
            filter_by_permissions(&business_insurances(&user), &own.permitted_categories())
        );
    }

    #[tokio::test]
    async fn default_needs_customer_type() {
        let mut profiles = selector();
        assert_eq!(
            profiles.initialize_default("auth0|1").await.unwrap_err(),
            ProfileError::CustomerTypeRequired
        );
        assert!(profiles.available_identities("auth0|1").await.is_empty());
    }

    #[tokio::test]
    async fn default_is_first_identity_and_kept_once_set() {
        let user = user_where(|h| h % 4 == 0);
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Private);

        let first = profiles.initialize_default(&user).await.unwrap().cloned();
        assert_eq!(first.as_ref().map(|i| i.id.as_str()), Some("self"));

        profiles.switch_to_id(&user, "delegate-3").await.unwrap();
        profiles.initialize_default(&user).await.unwrap();
        assert_eq!(profiles.active().unwrap().id, "delegate-3");
        assert!(profiles.is_acting_as_delegate());
    }

    #[tokio::test]
    async fn switching_closes_switcher_and_is_idempotent() {
        let user = user_where(|h| h % 3 == 0);
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Business);
        profiles.initialize_default(&user).await.unwrap();

        profiles.open_switcher();
        let identities = profiles.available_identities(&user).await;
        assert!(profiles.switch_to(identities[1].clone()));
        assert!(!profiles.is_switcher_open());
        assert!(profiles.is_acting_as_business());

        assert!(!profiles.switch_to(identities[1].clone()));
        assert_eq!(profiles.active().unwrap().id, "company-2");
    }

    #[tokio::test]
    async fn unknown_identity_is_rejected() {
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Private);
        profiles.initialize_default("auth0|1").await.unwrap();

        let err = profiles.switch_to_id("auth0|1", "company-9").await.unwrap_err();
        assert_eq!(err, ProfileError::UnknownIdentity("company-9".into()));
        assert_eq!(profiles.active().unwrap().id, "self");
    }

    #[tokio::test]
    async fn private_self_sees_every_own_policy() {
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Private);
        profiles.initialize_default("hello").await.unwrap();

        assert_eq!(profiles.visible_insurances("hello").await, user_insurances("hello"));
    }

    #[tokio::test]
    async fn other_company_is_filtered_by_accountant_role() {
        let user = user_where(|h| h % 3 == 0);
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Business);
        profiles.initialize_default(&user).await.unwrap();
        profiles.switch_to_id(&user, "company-2").await.unwrap();

        let visible = profiles.visible_insurances(&user).await;
        let expected: Vec<_> = business_insurances("company-2")
            .into_iter()
            .filter(|i| i.category == PermissionCategory::Ting)
            .collect();
        assert_eq!(visible, expected);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let mut profiles = selector();
        profiles.set_customer_type(CustomerType::Private);
        profiles.initialize_default("auth0|1").await.unwrap();
        profiles.open_switcher();

        profiles.reset();

        assert!(profiles.customer_type().is_none());
        assert!(profiles.active().is_none());
        assert!(!profiles.is_switcher_open());
        assert!(profiles.visible_insurances("auth0|1").await.is_empty());
    }
}

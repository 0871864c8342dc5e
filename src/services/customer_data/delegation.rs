//! Delegations ("fullmakt"): access one person grants another over their insurances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::catalog::{AccessLevel, PermissionCategory};
use super::hash::hash_code;

/// What a delegation covers, as shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    Forsikringer,
    Pensjon,
}

impl AccessType {
    /// Insurance categories this access type opens up.
    pub fn categories(&self) -> &'static [PermissionCategory] {
        match self {
            Self::Forsikringer => &[PermissionCategory::Ting, PermissionCategory::Person],
            Self::Pensjon => &[PermissionCategory::Pensjon],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegation {
    pub id: u32,
    pub name: String,
    pub relationship: String,
    pub email: Option<String>,
    pub access_level: AccessLevel,
    pub access_types: Vec<AccessType>,
    pub granted: NaiveDate,
    /// `None` is permanent.
    pub expires: Option<NaiveDate>,
}

impl Delegation {
    pub fn is_expired_at(&self, today: NaiveDate) -> bool {
        self.expires.is_some_and(|exp| exp < today)
    }

    /// Union of the categories of all access types, in catalog order.
    pub fn permitted_categories(&self) -> Vec<PermissionCategory> {
        PermissionCategory::ALL
            .into_iter()
            .filter(|c| self.access_types.iter().any(|t| t.categories().contains(c)))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegations {
    pub given_to: Vec<Delegation>,
    pub received_from: Vec<Delegation>,
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn user_delegations(user_id: &str) -> Delegations {
    if user_id.is_empty() {
        return Delegations::default();
    }
    let hash = hash_code(user_id);
    let mut out = Delegations::default();

    if hash % 3 == 0
        && let Some(granted) = date(2024, 1, 15)
    {
        out.given_to.push(Delegation {
            id: 1,
            name: "Marie Hansen".into(),
            relationship: "Ektefelle".into(),
            email: Some("m.hansen@email.no".into()),
            access_level: AccessLevel::Full,
            access_types: vec![AccessType::Forsikringer, AccessType::Pensjon],
            granted,
            expires: None,
        });
    }

    if hash % 5 == 0
        && let Some(granted) = date(2024, 6, 1)
    {
        out.given_to.push(Delegation {
            id: 2,
            name: "Erik Olsen".into(),
            relationship: "Regnskapsfører".into(),
            email: Some("erik@regnskap.no".into()),
            access_level: AccessLevel::Read,
            access_types: vec![AccessType::Forsikringer],
            granted,
            expires: date(2025, 6, 1),
        });
    }

    if hash % 4 == 0
        && let Some(granted) = date(2023, 8, 20)
    {
        out.received_from.push(Delegation {
            id: 3,
            name: "Kari Nordmann".into(),
            relationship: "Mor".into(),
            email: None,
            access_level: AccessLevel::Full,
            access_types: vec![AccessType::Forsikringer, AccessType::Pensjon],
            granted,
            expires: None,
        });
    }

    out
}

pub fn active_delegations(delegations: &[Delegation], today: NaiveDate) -> Vec<Delegation> {
    delegations
        .iter()
        .filter(|d| !d.is_expired_at(today))
        .cloned()
        .collect()
}

pub static RELATIONSHIP_TYPES: [(&str, &str); 7] = [
    ("spouse", "Ektefelle/Samboer"),
    ("parent", "Forelder"),
    ("child", "Barn (over 18)"),
    ("sibling", "Søsken"),
    ("accountant", "Regnskapsfører"),
    ("lawyer", "Advokat"),
    ("other", "Annet"),
];

/// Form input for granting a new delegation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDelegation {
    pub name: String,
    pub email: String,
    pub relationship: Option<String>,
    pub access_level: Option<AccessLevel>,
}

impl NewDelegation {
    /// All problems with the form, as user-facing messages.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();
        if self.name.trim().chars().count() < 2 {
            errors.push("Navn må være minst 2 tegn");
        }
        if !self.email.contains('@') {
            errors.push("Ugyldig e-postadresse");
        }
        if self.relationship.as_deref().is_none_or(str::is_empty) {
            errors.push("Relasjon må velges");
        }
        if self.access_level.is_none() {
            errors.push("Tilgangsnivå må velges");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

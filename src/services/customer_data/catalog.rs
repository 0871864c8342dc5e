//! Static reference data the mock generators pick from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Insurance category, also the unit of RBAC permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionCategory {
    Ting,
    Person,
    Pensjon,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 3] = [Self::Ting, Self::Person, Self::Pensjon];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Ting => "ting",
            Self::Person => "person",
            Self::Pensjon => "pensjon",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ting => "Tingforsikringer",
            Self::Person => "Personforsikringer",
            Self::Pensjon => "Pensjon",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ting => "Forsikringer for eiendeler (bil, hus, båt, etc.)",
            Self::Person => "Forsikringer for ansatte (yrkesskade, helse, etc.)",
            Self::Pensjon => "Pensjonsordninger og -avtaler",
        }
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PermissionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Full,
    Read,
    Limited,
}

impl AccessLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "Full tilgang",
            Self::Read => "Lesetilgang",
            Self::Limited => "Begrenset tilgang",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Full => "Full tilgang (lese og endre)",
            Self::Read => "Kun lesetilgang",
            Self::Limited => "Begrenset tilgang",
        }
    }
}

/// Business role with the categories it may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: &'static str,
    pub name: &'static str,
    pub permissions: &'static [PermissionCategory],
    pub description: &'static str,
}

impl Role {
    pub fn has_permission(&self, category: PermissionCategory) -> bool {
        self.permissions.contains(&category)
    }

    pub fn has_all_permissions(&self, categories: &[PermissionCategory]) -> bool {
        categories.iter().all(|c| self.has_permission(*c))
    }

    pub fn has_any_permission(&self, categories: &[PermissionCategory]) -> bool {
        categories.iter().any(|c| self.has_permission(*c))
    }

    /// "Tingforsikringer, Pensjon"
    pub fn access_description(&self) -> String {
        self.permissions
            .iter()
            .map(PermissionCategory::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub static BUSINESS_ROLES: [Role; 4] = [
    Role {
        id: "daglig_leder",
        name: "Daglig leder",
        permissions: &[
            PermissionCategory::Ting,
            PermissionCategory::Person,
            PermissionCategory::Pensjon,
        ],
        description: "Full tilgang til alle forsikringer og pensjon",
    },
    Role {
        id: "hr_ansvarlig",
        name: "HR-ansvarlig",
        permissions: &[PermissionCategory::Person, PermissionCategory::Pensjon],
        description: "Tilgang til personforsikringer og pensjon",
    },
    Role {
        id: "regnskapsforer",
        name: "Regnskapsfører",
        permissions: &[PermissionCategory::Ting],
        description: "Kun tilgang til tingforsikringer",
    },
    Role {
        id: "okonomisjef",
        name: "Økonomisjef",
        permissions: &[PermissionCategory::Ting, PermissionCategory::Pensjon],
        description: "Tilgang til tingforsikringer og pensjon",
    },
];

pub fn role_by_id(id: &str) -> Option<&'static Role> {
    BUSINESS_ROLES.iter().find(|r| r.id == id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsuranceKind {
    pub name: &'static str,
    pub prefix: &'static str,
    pub category: PermissionCategory,
}

const fn kind(name: &'static str, prefix: &'static str, category: PermissionCategory) -> InsuranceKind {
    InsuranceKind {
        name,
        prefix,
        category,
    }
}

pub static INSURANCE_TYPES: [InsuranceKind; 7] = [
    kind("Bilforsikring", "BIL", PermissionCategory::Ting),
    kind("Innboforsikring", "INN", PermissionCategory::Ting),
    kind("Reiseforsikring", "REI", PermissionCategory::Person),
    kind("Husforsikring", "HUS", PermissionCategory::Ting),
    kind("Livsforsikring", "LIV", PermissionCategory::Person),
    kind("Båtforsikring", "BAT", PermissionCategory::Ting),
    kind("Dyreforsikring", "DYR", PermissionCategory::Person),
];

pub static BUSINESS_INSURANCE_TYPES: [InsuranceKind; 6] = [
    kind("Næringsforsikring", "NÆR", PermissionCategory::Ting),
    kind("Ansvarsforsikring", "ANS", PermissionCategory::Ting),
    kind("Yrkesskadeforsikring", "YRK", PermissionCategory::Person),
    kind("Bedriftsbil", "BIL", PermissionCategory::Ting),
    kind("Kontorforsikring", "KNT", PermissionCategory::Ting),
    kind("Driftstapsforsikring", "DRF", PermissionCategory::Ting),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub name: &'static str,
    pub postal_code: &'static str,
}

pub static CITIES: [City; 6] = [
    City { name: "Oslo", postal_code: "0150" },
    City { name: "Bergen", postal_code: "5003" },
    City { name: "Trondheim", postal_code: "7010" },
    City { name: "Stavanger", postal_code: "4006" },
    City { name: "Drammen", postal_code: "3015" },
    City { name: "Kristiansand", postal_code: "4612" },
];

pub static STREET_NAMES: [&str; 8] = [
    "Storgata",
    "Kirkegata",
    "Parkveien",
    "Solveien",
    "Fjordgata",
    "Bjørkealléen",
    "Granveien",
    "Osloveien",
];

pub static LAST_NAMES: [&str; 15] = [
    "Hansen",
    "Johansen",
    "Olsen",
    "Larsen",
    "Andersen",
    "Pedersen",
    "Nilsen",
    "Kristiansen",
    "Jensen",
    "Karlsen",
    "Johnsen",
    "Pettersen",
    "Eriksen",
    "Berg",
    "Haugen",
];

pub static COMPANY_NAMES: [&str; 6] = [
    "Nordvik AS",
    "Fjordtech Solutions",
    "Bergen Bygg AS",
    "Oslo Consulting Group",
    "Trondheim Transport",
    "Stavanger Shipping",
];

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsentCategory {
    Necessary,
    Analytics,
    Marketing,
    ThirdParty,
}

impl ConsentCategory {
    pub const ALL: [ConsentCategory; 4] = [
        Self::Necessary,
        Self::Analytics,
        Self::Marketing,
        Self::ThirdParty,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Necessary => "necessary",
            Self::Analytics => "analytics",
            Self::Marketing => "marketing",
            Self::ThirdParty => "thirdParty",
        }
    }
}

impl fmt::Display for ConsentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ConsentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown consent category: {s}"))
    }
}

/// The optional categories a user picks on the consent screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSelections {
    pub analytics: bool,
    pub marketing: bool,
    pub third_party: bool,
}

/// Persisted consent for this install.
///
/// `necessary` is private and forced to `true` on construction and on deserialization,
/// so no value of this type can report it as withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    #[serde(default = "always_granted", deserialize_with = "force_granted")]
    necessary: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub marketing: bool,
    #[serde(default)]
    pub third_party: bool,
}

fn always_granted() -> bool {
    true
}

fn force_granted<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    bool::deserialize(deserializer).map(|_| true)
}

impl ConsentRecord {
    pub fn from_selections(selections: ConsentSelections) -> Self {
        Self {
            necessary: true,
            analytics: selections.analytics,
            marketing: selections.marketing,
            third_party: selections.third_party,
        }
    }

    pub fn necessary(&self) -> bool {
        self.necessary
    }

    pub fn get(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Necessary => self.necessary,
            ConsentCategory::Analytics => self.analytics,
            ConsentCategory::Marketing => self.marketing,
            ConsentCategory::ThirdParty => self.third_party,
        }
    }

    /// Returns a copy with `category` set; `Necessary` is ignored.
    pub fn with(mut self, category: ConsentCategory, value: bool) -> Self {
        match category {
            ConsentCategory::Necessary => {}
            ConsentCategory::Analytics => self.analytics = value,
            ConsentCategory::Marketing => self.marketing = value,
            ConsentCategory::ThirdParty => self.third_party = value,
        }
        self
    }
}

/// Result of `ConsentGate::accept`.
///
/// `record` is what the user asked for; `persisted` says whether it reached storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentOutcome {
    pub record: ConsentRecord,
    pub persisted: bool,
}

/// Right-of-access export of the stored consent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentExport {
    pub consents: ConsentRecord,
    pub exported_at: DateTime<Utc>,
    pub version: &'static str,
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::{BUSINESS_INSURANCE_TYPES, INSURANCE_TYPES, InsuranceKind, PermissionCategory};
use super::hash::hash_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsuranceStatus {
    #[serde(rename = "Aktiv")]
    Active,
    #[serde(rename = "Utløpt")]
    Expired,
    #[serde(rename = "Venter")]
    Pending,
    #[serde(rename = "Kansellert")]
    Cancelled,
}

impl InsuranceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Aktiv",
            Self::Expired => "Utløpt",
            Self::Pending => "Venter",
            Self::Cancelled => "Kansellert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insurance {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub policy_number: String,
    pub status: InsuranceStatus,
    pub valid_until: NaiveDate,
    pub monthly_premium: u64,
    pub category: PermissionCategory,
}

impl Insurance {
    /// "1234 kr/mnd"
    pub fn premium_label(&self) -> String {
        format!("{} kr/mnd", self.monthly_premium)
    }
}

struct Plan {
    count: u64,
    type_step: u64,
    year: u64,
    premium_step: u64,
    premium_range: u64,
    premium_floor: u64,
}

fn generate(owner_id: &str, kinds: &[InsuranceKind], plan: impl Fn(u64) -> Plan) -> Vec<Insurance> {
    if owner_id.is_empty() {
        return Vec::new();
    }
    let hash = hash_code(owner_id);
    let plan = plan(hash);

    (0..plan.count)
        .filter_map(|i| {
            let kind = &kinds[((hash + i * plan.type_step) % kinds.len() as u64) as usize];
            let month = (hash + i) % 12 + 1;
            let policy_num = (hash * (i + 1)) % 90_000 + 10_000;
            let valid_until = NaiveDate::from_ymd_opt(plan.year as i32 + 1, month as u32, 1)?;

            Some(Insurance {
                id: i as u32 + 1,
                kind: kind.name,
                policy_number: format!("{}-{}-{policy_num}", kind.prefix, plan.year),
                status: InsuranceStatus::Active,
                valid_until,
                monthly_premium: (hash + i * plan.premium_step) % plan.premium_range
                    + plan.premium_floor,
                category: kind.category,
            })
        })
        .collect()
}

/// One to four private policies for `owner_id`.
pub fn user_insurances(owner_id: &str) -> Vec<Insurance> {
    generate(owner_id, &INSURANCE_TYPES, |hash| Plan {
        count: hash % 4 + 1,
        type_step: 7,
        year: 2024 + hash % 2,
        premium_step: 1000,
        premium_range: 5000,
        premium_floor: 500,
    })
}

/// Two to five company policies for `company_id`.
pub fn business_insurances(company_id: &str) -> Vec<Insurance> {
    generate(company_id, &BUSINESS_INSURANCE_TYPES, |hash| Plan {
        count: hash % 4 + 2,
        type_step: 5,
        year: 2024,
        premium_step: 2000,
        premium_range: 15_000,
        premium_floor: 2000,
    })
}

pub fn filter_by_permissions(
    insurances: &[Insurance],
    permitted: &[PermissionCategory],
) -> Vec<Insurance> {
    insurances
        .iter()
        .filter(|ins| permitted.contains(&ins.category))
        .cloned()
        .collect()
}

pub fn group_by_category(insurances: &[Insurance]) -> BTreeMap<PermissionCategory, Vec<Insurance>> {
    let mut groups: BTreeMap<PermissionCategory, Vec<Insurance>> = BTreeMap::new();
    for insurance in insurances {
        groups
            .entry(insurance.category)
            .or_default()
            .push(insurance.clone());
    }
    groups
}

pub fn total_annual_premium(insurances: &[Insurance]) -> u64 {
    insurances.iter().map(|i| i.monthly_premium * 12).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_policies_follow_the_seed() {
        // hash_code("hello") == 99162322, so 3 policies
        let insurances = user_insurances("hello");

        assert_eq!(insurances.len(), 3);
        let first = &insurances[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.kind, "Bilforsikring");
        assert_eq!(first.policy_number, "BIL-2024-82322");
        assert_eq!(first.valid_until, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        assert_eq!(first.monthly_premium, 2822);
        assert_eq!(first.premium_label(), "2822 kr/mnd");
        assert_eq!(first.category, PermissionCategory::Ting);
        assert!(insurances.iter().all(|i| i.status == InsuranceStatus::Active));
    }

    #[test]
    fn business_policies_have_at_least_two() {
        let insurances = business_insurances("a");
        // hash_code("a") == 97
        assert_eq!(insurances.len(), 3);
        assert!(insurances.iter().all(|i| i.policy_number.contains("-2024-")));
    }

    #[test]
    fn empty_owner_has_nothing() {
        assert!(user_insurances("").is_empty());
        assert!(business_insurances("").is_empty());
    }

    #[test]
    fn filtering_and_totals() {
        let insurances = user_insurances("hello");
        let ting = filter_by_permissions(&insurances, &[PermissionCategory::Ting]);

        assert!(ting.iter().all(|i| i.category == PermissionCategory::Ting));
        assert!(filter_by_permissions(&insurances, &[]).is_empty());

        let groups = group_by_category(&insurances);
        assert_eq!(groups.values().map(Vec::len).sum::<usize>(), insurances.len());

        let expected: u64 = insurances.iter().map(|i| i.monthly_premium).sum::<u64>() * 12;
        assert_eq!(total_annual_premium(&insurances), expected);
    }
}

//! Fixed catalog of actions a customer can take from the profile screen.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveAction {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_step_up: bool,
}

pub static SENSITIVE_ACTIONS: [SensitiveAction; 6] = [
    SensitiveAction {
        id: "change_contact",
        name: "Endre kontaktinformasjon",
        description: "Endre e-post, telefon eller adresse",
        requires_step_up: true,
    },
    SensitiveAction {
        id: "sign_agreement",
        name: "Signere avtale",
        description: "Signere nye forsikringsavtaler",
        requires_step_up: true,
    },
    SensitiveAction {
        id: "add_delegation",
        name: "Gi fullmakt",
        description: "Gi andre tilgang til dine forsikringer",
        requires_step_up: true,
    },
    SensitiveAction {
        id: "cancel_insurance",
        name: "Si opp forsikring",
        description: "Avslutte en forsikringsavtale",
        requires_step_up: true,
    },
    SensitiveAction {
        id: "view_policy",
        name: "Se forsikringsdetaljer",
        description: "Lese forsikringsinformasjon",
        requires_step_up: false,
    },
    SensitiveAction {
        id: "report_claim",
        name: "Melde skade",
        description: "Registrere en skademelding",
        requires_step_up: false,
    },
];

pub fn find_action(id: &str) -> Option<&'static SensitiveAction> {
    SENSITIVE_ACTIONS.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_actions_require_step_up() {
        let gated: Vec<_> = SENSITIVE_ACTIONS
            .iter()
            .filter(|a| a.requires_step_up)
            .map(|a| a.id)
            .collect();
        assert_eq!(
            gated,
            ["change_contact", "sign_agreement", "add_delegation", "cancel_insurance"]
        );
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_action("report_claim").unwrap().name, "Melde skade");
        assert!(find_action("transfer_funds").is_none());
    }
}

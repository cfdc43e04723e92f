//! Built-in role-play scenarios.
//!
//! The registry is static and read-only. `start` consults it for any
//! scenario field the client did not send.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub stakeholder: &'static str,
    pub objective: &'static str,
    pub context: &'static str,
    pub challenges: &'static [&'static str],
}

static SCENARIOS: [Scenario; 5] = [
    Scenario {
        id: "busy-primary-care",
        title: "Busy primary care physician",
        stakeholder: "Dr. Alvarez runs a short-staffed family practice and sees forty patients a day.",
        objective: "Secure two minutes to introduce a once-daily formulation and agree on a follow-up.",
        context: "Walk-in between appointments; the waiting room is full.",
        challenges: &["short-staffed", "time-pressure", "gatekeeper"],
    },
    Scenario {
        id: "frustrated-oncologist",
        title: "Frustrated oncologist",
        stakeholder: "Dr. Lee is frustrated with delays in prior authorization for your product.",
        objective: "Acknowledge the access problem and offer concrete support resources.",
        context: "Scheduled meeting after a patient's therapy start was postponed.",
        challenges: &["frustrated", "access", "prior-authorization"],
    },
    Scenario {
        id: "analytical-cardiologist",
        title: "Analytical cardiologist",
        stakeholder: "Dr. Okafor reads every trial publication and questions surrogate endpoints.",
        objective: "Discuss the outcomes data and identify a patient profile for a trial of therapy.",
        context: "Lunch-and-learn with thirty minutes available.",
        challenges: &["analytical", "evidence-focused", "skeptical"],
    },
    Scenario {
        id: "formulary-pharmacist",
        title: "Hospital formulary pharmacist",
        stakeholder: "A clinical pharmacist burdened with a formulary review backlog and a tight budget.",
        objective: "Position the product's cost-effectiveness for the upcoming P&T committee.",
        context: "Pre-review meeting ahead of the quarterly committee.",
        challenges: &["budget", "burdened", "formulary"],
    },
    Scenario {
        id: "new-nurse-practitioner",
        title: "Newly practicing nurse practitioner",
        stakeholder: "A nurse practitioner who recently joined a rural clinic and wants practical guidance.",
        objective: "Build rapport and understand which patient education materials would help.",
        context: "First meeting at the clinic.",
        challenges: &["relationship-building"],
    },
];

pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}

pub fn find(id: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.id == id)
}

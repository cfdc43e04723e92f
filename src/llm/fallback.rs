//! Deterministic content served when the LLM is unavailable.
//!
//! Every piece of text produced here starts with [`DEMO_MARKER`] so users can
//! tell it apart from model output.

use crate::session_management::HcpState;

pub const DEMO_MARKER: &str = "[Demo response]";

const BUSY_REPLIES: [&str; 3] = [
    "I really only have a minute. What's the one thing I need to know?",
    "Can you just leave the leaflet? I have patients waiting.",
    "Get to the point, please. How does this help my patients?",
];

const IRRITATED_REPLIES: [&str; 3] = [
    "I've heard this pitch before. Why should this time be different?",
    "Your company still hasn't fixed the prior authorization issues.",
    "Honestly, I don't see how this changes anything for my clinic.",
];

const NEUTRAL_REPLIES: [&str; 3] = [
    "Interesting. What did the phase III data show for that population?",
    "How does that compare with what I'm prescribing today?",
    "What would the switch look like for my existing patients?",
];

const COACHING_TIPS: [&str; 3] = [
    "Open with a question about the HCP's patients before presenting data. \
     Listen for a need you can connect to an on-label benefit.",
    "When you meet an objection, acknowledge it, ask a clarifying question and \
     respond with one relevant piece of evidence.",
    "Close every call with a concrete, agreed next step such as a follow-up \
     date or a sample request.",
];

pub fn mark(text: &str) -> String {
    format!("{} {}", DEMO_MARKER, text)
}

/// Scripted HCP reply, rotating through a fixed list by turn number.
pub fn roleplay_reply(state: HcpState, turn: u32) -> String {
    let replies = match state {
        HcpState::Busy => &BUSY_REPLIES,
        HcpState::Irritated => &IRRITATED_REPLIES,
        HcpState::Neutral => &NEUTRAL_REPLIES,
    };
    mark(replies[turn as usize % replies.len()])
}

pub fn coaching_reply(message_count: usize) -> String {
    mark(COACHING_TIPS[message_count % COACHING_TIPS.len()])
}

/// Demo SQL for a question, returned as `(sql, explanation)`.
pub fn sql_translation(question: &str) -> (String, String) {
    let question = question.to_lowercase();
    let sql = if question.contains("region") {
        "SELECT p.region, SUM(rx.quantity) AS total_quantity\n\
         FROM prescriptions rx\n\
         JOIN prescribers p ON p.id = rx.prescriber_id\n\
         GROUP BY p.region\n\
         ORDER BY total_quantity DESC;"
    } else {
        "SELECT p.name, p.specialty, COUNT(*) AS prescriptions\n\
         FROM prescriptions rx\n\
         JOIN prescribers p ON p.id = rx.prescriber_id\n\
         GROUP BY p.name, p.specialty\n\
         ORDER BY prescriptions DESC\n\
         LIMIT 10;"
    };
    (
        sql.to_string(),
        mark("Example query generated without the language model."),
    )
}

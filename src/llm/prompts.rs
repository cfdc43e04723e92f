use crate::llm::collaborator::ConversationMode;
use crate::session_management::session::ScenarioBrief;
use crate::session_management::HcpState;

const COACHING_PROMPT: &str = "You are an experienced pharmaceutical sales coach. \
Give practical, compliant advice to a field representative preparing for or \
reflecting on conversations with healthcare professionals. Keep answers short, \
concrete and on-label. Never invent clinical data.";

const SQL_PROMPT: &str = "You translate questions about pharmaceutical sales data \
into a single ANSI SQL query over the tables prescribers(id, name, specialty, region), \
products(id, name, therapeutic_area) and prescriptions(prescriber_id, product_id, \
written_on, quantity). Answer with a JSON object {\"sql\": string, \"explanation\": string} \
and nothing else.";

const ANALYSIS_PROMPT: &str = "You evaluate a sales representative's role-play \
conversation with a healthcare professional. Score each of question_quality, \
active_listening, objection_handling, value_articulation, empathy and next_step \
from 1 to 5. Answer with a JSON object {\"scores\": {metric: number}, \"feedback\": string} \
and nothing else.";

fn state_direction(state: HcpState) -> &'static str {
    match state {
        HcpState::Busy => {
            "You are pressed for time. Keep replies to one or two sentences and \
             push the rep to get to the point."
        }
        HcpState::Irritated => {
            "You are frustrated and impatient. Be curt, challenge vague claims and \
             only soften if the rep acknowledges your concerns."
        }
        HcpState::Neutral => {
            "You are calm and analytical. Ask for evidence, trial data and how the \
             product fits your patients."
        }
    }
}

/// System prompt for the simulated HCP in a role-play session.
pub fn roleplay_prompt(scenario: &ScenarioBrief, state: HcpState) -> String {
    let mut prompt = String::from(
        "You are role-playing a healthcare professional meeting a pharmaceutical \
         sales representative. Stay in character, never mention that you are an AI \
         and reply with dialogue only.",
    );
    if !scenario.title.is_empty() {
        prompt.push_str(&format!("\nScenario: {}.", scenario.title));
    }
    if !scenario.description.is_empty() {
        prompt.push_str(&format!("\nWho you are: {}", scenario.description));
    }
    if !scenario.context.is_empty() {
        prompt.push_str(&format!("\nContext: {}", scenario.context));
    }
    if !scenario.tags.is_empty() {
        prompt.push_str(&format!("\nTraits: {}.", scenario.tags.join(", ")));
    }
    prompt.push_str(&format!("\nCurrent mood: {}. {}", state, state_direction(state)));
    prompt
}

/// Fixed system prompt for the modes that do not depend on a session.
pub fn system_prompt(mode: ConversationMode) -> &'static str {
    match mode {
        ConversationMode::Coaching => COACHING_PROMPT,
        ConversationMode::Sql => SQL_PROMPT,
        ConversationMode::Analysis => ANALYSIS_PROMPT,
        ConversationMode::Roleplay => {
            "You are role-playing a busy healthcare professional meeting a \
             pharmaceutical sales representative. Stay in character."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roleplay_prompt_includes_scenario_and_mood() {
        let scenario = ScenarioBrief {
            title: "Formulary review".into(),
            description: "Dr. Lee, hospital pharmacist".into(),
            context: "Budget cuts this quarter".into(),
            tags: vec!["analytical".into()],
        };
        let prompt = roleplay_prompt(&scenario, HcpState::Neutral);
        assert!(prompt.contains("Formulary review"));
        assert!(prompt.contains("Dr. Lee, hospital pharmacist"));
        assert!(prompt.contains("Budget cuts"));
        assert!(prompt.contains("Traits: analytical."));
        assert!(prompt.contains("Current mood: neutral."));
    }

    #[test]
    fn roleplay_prompt_skips_empty_fields() {
        let prompt = roleplay_prompt(&ScenarioBrief::default(), HcpState::Busy);
        assert!(!prompt.contains("Scenario:"));
        assert!(!prompt.contains("Traits:"));
        assert!(prompt.contains("Current mood: busy."));
    }

    #[test]
    fn json_modes_ask_for_json() {
        assert!(system_prompt(ConversationMode::Sql).contains("\"sql\""));
        assert!(system_prompt(ConversationMode::Analysis).contains("\"feedback\""));
    }
}

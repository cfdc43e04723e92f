use crate::session_management::HcpState;

const BUSY_LINE: &str =
    "I only have a couple of minutes before my next patient. What do you need?";
const IRRITATED_LINE: &str = "I'm very busy right now.";
const NEUTRAL_LINE: &str = "Alright, I have some time. What would you like to discuss?";

/// Returns the scripted first line the HCP says for a given state.
///
/// The scenario context is accepted for call-site symmetry with the LLM
/// prompts but does not influence the line. A missing state uses the busy line.
pub fn generate_turn0_dialogue(state: Option<HcpState>, _scenario_context: &str) -> &'static str {
    match state {
        Some(HcpState::Irritated) => IRRITATED_LINE,
        Some(HcpState::Neutral) => NEUTRAL_LINE,
        Some(HcpState::Busy) | None => BUSY_LINE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_matches_default() {
        assert_eq!(
            generate_turn0_dialogue(Some(HcpState::Busy), "oncology"),
            generate_turn0_dialogue(None, "anything else")
        );
    }

    #[test]
    fn irritated_line_ignores_context() {
        let a = generate_turn0_dialogue(Some(HcpState::Irritated), "Dr. Lee is frustrated with delays");
        let b = generate_turn0_dialogue(Some(HcpState::Irritated), "");
        assert_eq!(a, "I'm very busy right now.");
        assert_eq!(a, b);
    }

    #[test]
    fn each_state_has_a_distinct_line() {
        let busy = generate_turn0_dialogue(Some(HcpState::Busy), "");
        let irritated = generate_turn0_dialogue(Some(HcpState::Irritated), "");
        let neutral = generate_turn0_dialogue(Some(HcpState::Neutral), "");
        assert_ne!(busy, irritated);
        assert_ne!(busy, neutral);
        assert_ne!(irritated, neutral);
    }
}

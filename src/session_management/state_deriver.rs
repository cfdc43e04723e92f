use crate::session_management::HcpState;

/// Terms that put the HCP under time pressure. They win over every other cue.
const BUSY_TERMS: [&str; 4] = ["overwhelmed", "short-staffed", "rushed", "burdened"];
const FRUSTRATED_TERM: &str = "frustrated";
const ANALYTICAL_TERM: &str = "analytical";
const OVERWHELMED_TERM: &str = "overwhelmed";

/// Picks the opening behavioral state of the HCP from scenario metadata.
///
/// Matching is case-insensitive and substring based, over the description and
/// every tag. Rules are applied in priority order:
/// 1. any busy term (`overwhelmed`, `short-staffed`, `rushed`, `burdened`) -> `Busy`
/// 2. `frustrated` -> `Irritated`
/// 3. an `analytical` tag -> `Neutral`
/// 4. otherwise `Busy`
pub fn derive_initial_state_from_scene(description: &str, tags: Option<&[String]>) -> HcpState {
    let description = description.to_lowercase();
    let tags: Vec<String> = tags
        .unwrap_or_default()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let mentions = |term: &str| description.contains(term) || tags.iter().any(|t| t.contains(term));
    let tagged = |term: &str| tags.iter().any(|t| t.contains(term));

    if BUSY_TERMS.iter().any(|term| mentions(term)) {
        return HcpState::Busy;
    }

    if mentions(FRUSTRATED_TERM) {
        return HcpState::Irritated;
    }

    if tagged(ANALYTICAL_TERM) && !tagged(FRUSTRATED_TERM) && !tagged(OVERWHELMED_TERM) {
        return HcpState::Neutral;
    }

    HcpState::Busy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn busy_terms_in_description_or_tags() {
        for term in ["Overwhelmed", "SHORT-STAFFED", "rushed", "Burdened"] {
            let description = format!("The clinic is {} this week", term);
            assert_eq!(derive_initial_state_from_scene(&description, None), HcpState::Busy);

            let t = tags(&[term, "frustrated"]);
            assert_eq!(derive_initial_state_from_scene("", Some(&t)), HcpState::Busy);
        }
    }

    #[test]
    fn frustrated_without_busy_terms_is_irritated() {
        assert_eq!(
            derive_initial_state_from_scene("Dr. Lee is frustrated with delays", None),
            HcpState::Irritated
        );
        let t = tags(&["Frustrated", "analytical"]);
        assert_eq!(derive_initial_state_from_scene("", Some(&t)), HcpState::Irritated);
    }

    #[test]
    fn analytical_tag_is_neutral() {
        let t = tags(&["analytical", "data-driven"]);
        assert_eq!(
            derive_initial_state_from_scene("Wants to see the trial data", Some(&t)),
            HcpState::Neutral
        );
    }

    #[test]
    fn analytical_only_counts_as_a_tag() {
        assert_eq!(
            derive_initial_state_from_scene("An analytical oncologist", None),
            HcpState::Busy
        );
    }

    #[test]
    fn overwhelmed_wins_over_analytical() {
        let t = tags(&["overwhelmed", "analytical"]);
        assert_eq!(derive_initial_state_from_scene("", Some(&t)), HcpState::Busy);
    }

    #[test]
    fn empty_input_defaults_to_busy() {
        assert_eq!(derive_initial_state_from_scene("", None), HcpState::Busy);
        assert_eq!(derive_initial_state_from_scene("", Some(&[])), HcpState::Busy);
    }
}

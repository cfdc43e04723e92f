use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::{AnalysisSource, ConversationAnalysis, Metric, MetricScore};

fn keywords(metric: Metric) -> &'static [&'static str] {
    match metric {
        Metric::QuestionQuality => &[
            "what", "how", "why", "which", "could you", "tell me", "describe",
            "help me understand",
        ],
        Metric::ActiveListening => &[
            "understand", "sounds like", "you mentioned", "i hear", "so you", "makes sense",
            "you said", "noted",
        ],
        Metric::ObjectionHandling => &[
            "concern", "concerns", "cost", "coverage", "prior authorization", "side effect",
            "side effects", "formulary", "evidence", "data",
        ],
        Metric::ValueArticulation => &[
            "benefit", "outcome", "outcomes", "efficacy", "adherence", "patients", "improve",
            "reduce", "trial", "results",
        ],
        Metric::Empathy => &[
            "appreciate", "thank", "thanks", "sorry", "frustrating", "understandable",
            "i know", "your time",
        ],
        Metric::NextStep => &[
            "follow up", "next step", "next steps", "schedule", "sample", "samples",
            "next week", "send you", "call back",
        ],
    }
}

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9']+").expect("separator pattern is valid"))
}

/// Lower-cases `text` and collapses every run of non-word characters into a
/// single space, padded on both ends so phrases match on word boundaries.
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    format!(" {} ", separators().replace_all(&lowered, " ").trim())
}

/// Scores `text` on one metric by distinct keyword overlap.
///
/// Each keyword or phrase found on word boundaries counts once. The score is
/// `1 + matches`, capped at 5.
pub fn analyze_text_for_metric(text: &str, metric: Metric) -> MetricScore {
    let haystack = normalize(text);
    let matched: Vec<String> = keywords(metric)
        .iter()
        .filter(|kw| haystack.contains(&format!(" {} ", kw)))
        .map(|kw| kw.to_string())
        .collect();
    let score = (1 + matched.len()).min(5) as u8;
    MetricScore {
        metric,
        score,
        matched,
    }
}

fn tip(metric: Metric) -> &'static str {
    match metric {
        Metric::QuestionQuality => "Ask more open questions about the HCP's patients and priorities.",
        Metric::ActiveListening => "Reflect back what the HCP said before moving on.",
        Metric::ObjectionHandling => "Acknowledge objections and answer them with specific evidence.",
        Metric::ValueArticulation => "Tie the product to concrete patient outcomes.",
        Metric::Empathy => "Recognize the HCP's time pressure and concerns explicitly.",
        Metric::NextStep => "Close with a clear, agreed next step.",
    }
}

/// Heuristic analysis of the rep's side of a conversation.
pub fn analyze_conversation(transcript: &str) -> ConversationAnalysis {
    let metrics: Vec<MetricScore> = Metric::ALL
        .iter()
        .map(|metric| analyze_text_for_metric(transcript, *metric))
        .collect();
    let feedback = heuristic_feedback(&metrics);
    ConversationAnalysis::new(metrics, feedback, AnalysisSource::Heuristic)
}

/// Feedback pointing at the weakest metric; ties go to the earliest metric.
pub fn heuristic_feedback(metrics: &[MetricScore]) -> String {
    match metrics.iter().min_by_key(|m| m.score) {
        Some(weakest) if weakest.score < 5 => format!(
            "Focus next on {}: {}",
            weakest.metric.as_str().replace('_', " "),
            tip(weakest.metric)
        ),
        Some(_) => "Strong conversation across every metric.".to_string(),
        None => "Not enough conversation to analyze yet.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_minimum() {
        for metric in Metric::ALL {
            let score = analyze_text_for_metric("", metric);
            assert_eq!(score.score, 1);
            assert!(score.matched.is_empty());
        }
    }

    #[test]
    fn counts_distinct_keywords_on_word_boundaries() {
        let score = analyze_text_for_metric(
            "How are your patients doing? What matters most? How is adherence?",
            Metric::QuestionQuality,
        );
        assert_eq!(score.matched, vec!["what".to_string(), "how".to_string()]);
        assert_eq!(score.score, 3);

        // "somehow" must not count as "how"
        let score = analyze_text_for_metric("Somehow it worked", Metric::QuestionQuality);
        assert_eq!(score.score, 1);
    }

    #[test]
    fn phrases_match_across_punctuation() {
        let score = analyze_text_for_metric(
            "Can we schedule a FOLLOW-UP? I'll send you samples.",
            Metric::NextStep,
        );
        assert!(score.matched.contains(&"follow up".to_string()));
        assert!(score.matched.contains(&"send you".to_string()));
        assert!(score.matched.contains(&"samples".to_string()));
        assert!(score.matched.contains(&"schedule".to_string()));
        assert_eq!(score.score, 5);
    }

    #[test]
    fn score_is_capped() {
        let text = "benefit outcome outcomes efficacy adherence patients improve reduce trial results";
        assert_eq!(analyze_text_for_metric(text, Metric::ValueArticulation).score, 5);
    }

    #[test]
    fn conversation_feedback_targets_weakest_metric() {
        let analysis = analyze_conversation(
            "Thank you for your time. What outcomes matter to your patients? \
             I understand your concern about cost.",
        );
        assert_eq!(analysis.source, AnalysisSource::Heuristic);
        assert_eq!(analysis.metrics.len(), Metric::ALL.len());
        assert_eq!(analysis.score_for(Metric::NextStep), Some(1));
        assert!(analysis.feedback.contains("next step"));
    }
}

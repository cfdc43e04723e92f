//! Conversation analysis.
//!
//! Scores the rep's side of a role-play conversation on a fixed set of
//! behavioral metrics. The model is asked first; the keyword-overlap
//! heuristic in [`metrics`] stands in whenever the model is unavailable or
//! returns something unusable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod evaluator;
pub mod metrics;

pub use evaluator::{analyze_session, summarize_session, SessionSummary};
pub use metrics::{analyze_conversation, analyze_text_for_metric};

/// Behavioral metrics a conversation is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    QuestionQuality,
    ActiveListening,
    ObjectionHandling,
    ValueArticulation,
    Empathy,
    NextStep,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::QuestionQuality,
        Metric::ActiveListening,
        Metric::ObjectionHandling,
        Metric::ValueArticulation,
        Metric::Empathy,
        Metric::NextStep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::QuestionQuality => "question_quality",
            Metric::ActiveListening => "active_listening",
            Metric::ObjectionHandling => "objection_handling",
            Metric::ValueArticulation => "value_articulation",
            Metric::Empathy => "empathy",
            Metric::NextStep => "next_step",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    pub metric: Metric,
    /// 1 (absent) to 5 (strong).
    pub score: u8,
    #[serde(default)]
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Ai,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAnalysis {
    pub metrics: Vec<MetricScore>,
    pub overall_score: f32,
    pub feedback: String,
    pub source: AnalysisSource,
    pub analyzed_at: DateTime<Utc>,
}

impl ConversationAnalysis {
    pub fn new(metrics: Vec<MetricScore>, feedback: String, source: AnalysisSource) -> Self {
        let overall_score = if metrics.is_empty() {
            0.0
        } else {
            let total: u32 = metrics.iter().map(|m| u32::from(m.score)).sum();
            ((total as f32 / metrics.len() as f32) * 10.0).round() / 10.0
        };
        Self {
            metrics,
            overall_score,
            feedback,
            source,
            analyzed_at: Utc::now(),
        }
    }

    pub fn score_for(&self, metric: Metric) -> Option<u8> {
        self.metrics.iter().find(|m| m.metric == metric).map(|m| m.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_score_is_rounded_mean() {
        let metrics = vec![
            MetricScore { metric: Metric::Empathy, score: 5, matched: vec![] },
            MetricScore { metric: Metric::NextStep, score: 2, matched: vec![] },
            MetricScore { metric: Metric::QuestionQuality, score: 2, matched: vec![] },
        ];
        let analysis = ConversationAnalysis::new(metrics, String::new(), AnalysisSource::Ai);
        assert_eq!(analysis.overall_score, 3.0);
        assert_eq!(analysis.score_for(Metric::Empathy), Some(5));
        assert_eq!(analysis.score_for(Metric::ActiveListening), None);
    }

    #[test]
    fn metric_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&Metric::ObjectionHandling).unwrap(),
            "\"objection_handling\""
        );
        for metric in Metric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json.trim_matches('"'), metric.as_str());
        }
    }
}

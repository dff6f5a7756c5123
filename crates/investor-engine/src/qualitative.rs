//! Qualitative score aggregation
//!
//! Five business-quality topics are each rated 0.0–4.0 by an LLM that is
//! asked to answer in the literal form `SCORE|REASON`. Responses are parsed
//! into a tagged [`TopicParse`]; a response that does not parse scores zero
//! for that topic only and never affects the other four.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest score a single topic can contribute
pub const MAX_TOPIC_SCORE: f64 = 4.0;
/// Highest possible qualitative total
pub const MAX_QUALITATIVE_TOTAL: f64 = MAX_TOPIC_SCORE * Topic::ALL.len() as f64;

/// Reason recorded when a response does not match `SCORE|REASON`
pub const PARSE_ERROR_REASON: &str = "parse error";
/// Reason recorded when no response could be obtained at all
pub const UNAVAILABLE_REASON: &str = "scoring unavailable";

/// Business-quality topic, always evaluated in [`Topic::ALL`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Moat,
    RevenueGrowth,
    CompetitiveAdvantage,
    Profitability,
    Management,
}

impl Topic {
    pub const ALL: [Self; 5] = [
        Self::Moat,
        Self::RevenueGrowth,
        Self::CompetitiveAdvantage,
        Self::Profitability,
        Self::Management,
    ];

    /// Name used in prompts and reports
    pub fn label(self) -> &'static str {
        match self {
            Self::Moat => "Moat/Product",
            Self::RevenueGrowth => "Revenue Growth",
            Self::CompetitiveAdvantage => "Competitive Advantage",
            Self::Profitability => "Profitability",
            Self::Management => "Management",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of parsing one raw LLM response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopicParse {
    Scored { score: f64, reason: String },
    ParseError { raw: String },
}

/// Parse a `SCORE|REASON` response
///
/// Splits on the first `|`. The score must be a finite decimal within
/// 0.0..=4.0 and is rounded to one decimal place. Anything else, including
/// a missing delimiter, yields [`TopicParse::ParseError`].
pub fn parse_topic_response(raw: &str) -> TopicParse {
    let parse_error = || TopicParse::ParseError {
        raw: raw.to_string(),
    };

    let Some((score_part, reason_part)) = raw.split_once('|') else {
        return parse_error();
    };

    let Ok(score) = score_part.trim().parse::<f64>() else {
        return parse_error();
    };

    if !score.is_finite() || !(0.0..=MAX_TOPIC_SCORE).contains(&score) {
        return parse_error();
    }

    TopicParse::Scored {
        score: (score * 10.0).round() / 10.0,
        reason: reason_part.trim().to_string(),
    }
}

/// Final score for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: Topic,
    /// Always within 0.0..=4.0
    pub score: f64,
    pub reason: String,
    /// The response did not match `SCORE|REASON`
    pub parse_failed: bool,
    /// The primary model failed and the backup was tried
    pub used_fallback: bool,
}

impl TopicScore {
    /// Score a topic from a raw response, defaulting to zero on parse failure
    pub fn from_response(topic: Topic, raw: &str, used_fallback: bool) -> Self {
        match parse_topic_response(raw) {
            TopicParse::Scored { score, reason } => Self {
                topic,
                score: clamp_score(score),
                reason,
                parse_failed: false,
                used_fallback,
            },
            TopicParse::ParseError { raw } => {
                tracing::warn!(topic = %topic, raw = %raw, "unparsable topic response");
                Self {
                    topic,
                    score: 0.0,
                    reason: PARSE_ERROR_REASON.to_string(),
                    parse_failed: true,
                    used_fallback,
                }
            }
        }
    }

    /// Zero score for a topic whose provider call failed outright
    pub fn unavailable(topic: Topic, used_fallback: bool) -> Self {
        Self {
            topic,
            score: 0.0,
            reason: UNAVAILABLE_REASON.to_string(),
            parse_failed: false,
            used_fallback,
        }
    }

    /// Fraction of the topic maximum, for progress-style rendering
    pub fn fraction(&self) -> f64 {
        self.score / MAX_TOPIC_SCORE
    }
}

/// The five topic scores and their total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeSummary {
    /// 0.0..=20.0
    pub total: f64,
    pub topics: Vec<TopicScore>,
}

impl QualitativeSummary {
    /// Sum already-scored topics
    pub fn from_topic_scores(topics: Vec<TopicScore>) -> Self {
        let total: f64 = topics.iter().map(|t| clamp_score(t.score)).sum();
        Self {
            total: (total * 10.0).round() / 10.0,
            topics,
        }
    }

    /// Number of topics that fell back to a zero score
    pub fn failed_topics(&self) -> usize {
        self.topics
            .iter()
            .filter(|t| t.parse_failed || t.reason == UNAVAILABLE_REASON)
            .count()
    }

    /// Whether the backup model was tried for any topic
    pub fn used_fallback(&self) -> bool {
        self.topics.iter().any(|t| t.used_fallback)
    }
}

/// Aggregate raw responses given in [`Topic::ALL`] order
///
/// Missing trailing responses count as parse failures; extra responses are
/// ignored.
pub fn aggregate<S: AsRef<str>>(raw_responses: &[S]) -> QualitativeSummary {
    let topics = Topic::ALL
        .iter()
        .enumerate()
        .map(|(i, &topic)| {
            let raw = raw_responses.get(i).map_or("", AsRef::as_ref);
            TopicScore::from_response(topic, raw, false)
        })
        .collect();

    QualitativeSummary::from_topic_scores(topics)
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, MAX_TOPIC_SCORE)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        assert_eq!(
            parse_topic_response("3.5|Dominant data-center franchise"),
            TopicParse::Scored {
                score: 3.5,
                reason: "Dominant data-center franchise".to_string()
            }
        );
    }

    #[test]
    fn test_parse_splits_on_first_delimiter_and_trims() {
        assert_eq!(
            parse_topic_response(" 2 | margins | improving \n"),
            TopicParse::Scored {
                score: 2.0,
                reason: "margins | improving".to_string()
            }
        );
    }

    #[test]
    fn test_parse_failures() {
        for raw in ["bad", "", "x|reason", "4.5|too high", "-1|negative", "NaN|nope", "inf|x"] {
            assert!(
                matches!(parse_topic_response(raw), TopicParse::ParseError { .. }),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_rounds_to_one_decimal() {
        match parse_topic_response("2.26|ok") {
            TopicParse::Scored { score, .. } => assert_eq!(score, 2.3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_isolates_failures() {
        let summary = aggregate(&["3.5|ok", "bad", "2.0|x", "4.0|y", "1.5|z"]);

        assert_eq!(summary.total, 11.0);
        assert_eq!(summary.topics.len(), 5);
        assert_eq!(summary.topics[1].topic, Topic::RevenueGrowth);
        assert_eq!(summary.topics[1].score, 0.0);
        assert_eq!(summary.topics[1].reason, PARSE_ERROR_REASON);
        assert!(summary.topics[1].parse_failed);
        assert_eq!(summary.topics[3].reason, "y");
        assert_eq!(summary.failed_topics(), 1);
    }

    #[test]
    fn test_aggregate_short_input_defaults_missing_topics() {
        let summary = aggregate(&["4|a", "4|b"]);
        assert_eq!(summary.total, 8.0);
        assert_eq!(summary.failed_topics(), 3);
        assert_eq!(summary.topics[4].topic, Topic::Management);
    }

    #[test]
    fn test_total_never_exceeds_twenty() {
        let summary = aggregate(&["4|a", "4|b", "4|c", "4|d", "4|e", "4|extra"]);
        assert_eq!(summary.total, MAX_QUALITATIVE_TOTAL);

        let inflated = QualitativeSummary::from_topic_scores(
            Topic::ALL
                .iter()
                .map(|&topic| TopicScore {
                    topic,
                    score: 9.0,
                    reason: String::new(),
                    parse_failed: false,
                    used_fallback: false,
                })
                .collect(),
        );
        assert_eq!(inflated.total, 20.0);
    }

    #[test]
    fn test_unavailable_topic() {
        let score = TopicScore::unavailable(Topic::Moat, true);
        assert_eq!(score.score, 0.0);
        assert_eq!(score.reason, UNAVAILABLE_REASON);

        let summary = QualitativeSummary::from_topic_scores(vec![score]);
        assert!(summary.used_fallback());
        assert_eq!(summary.failed_topics(), 1);
    }
}

//! Prompt template for topic scoring

use minijinja::{Environment, UndefinedBehavior, context};

use crate::error::Result;
use crate::qualitative::Topic;
use crate::snapshot::StockSnapshot;

/// Default topic prompt
///
/// Variables: `symbol`, `company`, `industry`, `topic`, `summary`.
pub const DEFAULT_TOPIC_TEMPLATE: &str = "Analyze {{ symbol }} regarding '{{ topic }}'. \
Context: {{ summary }}. Give a score (0-4) and 1 sentence reason. Format: SCORE|REASON";

/// Renders the per-topic user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPrompt {
    source: String,
}

impl Default for TopicPrompt {
    fn default() -> Self {
        Self {
            source: DEFAULT_TOPIC_TEMPLATE.to_string(),
        }
    }
}

impl TopicPrompt {
    /// Custom template, checked for syntax errors up front
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        environment().template_from_str(&source)?;
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the prompt for one topic
    ///
    /// Unknown variables are an error rather than an empty string.
    pub fn render(&self, snapshot: &StockSnapshot, topic: Topic) -> Result<String> {
        let rendered = environment().render_str(
            &self.source,
            context! {
                symbol => &snapshot.symbol,
                company => &snapshot.profile.name,
                industry => &snapshot.profile.industry,
                topic => topic.label(),
                summary => &snapshot.profile.summary,
            },
        )?;
        Ok(rendered)
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::snapshot::fixtures::snapshot;

    #[test]
    fn test_default_prompt() {
        let snap = snapshot(100.0, Some(4.0), &[]);
        let prompt = TopicPrompt::default().render(&snap, Topic::Moat).unwrap();

        assert_eq!(
            prompt,
            "Analyze TEST regarding 'Moat/Product'. Context: Designs accelerators.. \
             Give a score (0-4) and 1 sentence reason. Format: SCORE|REASON"
        );
    }

    #[test]
    fn test_custom_template() {
        let snap = snapshot(100.0, Some(4.0), &[]);
        let prompt = TopicPrompt::new("{{ company }} / {{ industry }}: {{ topic | upper }}")
            .unwrap()
            .render(&snap, Topic::Management)
            .unwrap();

        assert_eq!(prompt, "Test Corp / Semiconductors: MANAGEMENT");
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        assert!(matches!(
            TopicPrompt::new("{{ symbol "),
            Err(AnalysisError::Prompt(_))
        ));
    }

    #[test]
    fn test_unknown_variable_fails_render() {
        let snap = snapshot(100.0, Some(4.0), &[]);
        let prompt = TopicPrompt::new("{{ ceo }}").unwrap();
        assert!(prompt.render(&snap, Topic::Moat).is_err());
    }
}

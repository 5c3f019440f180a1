//! Declarative assertion definitions
//!
//! Serializable form used by suite files. Building compiles patterns and
//! binds judge questions to a judge model.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::basic;
use super::{Assertion, AssertionError, Judge, JudgePreset};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssertionSpec {
    Contains {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    NotContains {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    MatchesRegex {
        pattern: String,
    },
    LengthBetween {
        min: usize,
        max: usize,
    },
    StartsWith {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    EndsWith {
        text: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    ValidJson,
    WordCount {
        min: usize,
        #[serde(default)]
        max: Option<usize>,
    },
    Judge {
        question: String,
    },
    JudgePreset {
        preset: JudgePreset,
        #[serde(default)]
        subject: Option<String>,
    },
}

impl AssertionSpec {
    pub fn is_judged(&self) -> bool {
        matches!(
            self,
            AssertionSpec::Judge { .. } | AssertionSpec::JudgePreset { .. }
        )
    }

    /// Compile into a runnable assertion
    pub fn build(&self, judge: Option<&Arc<Judge>>) -> Result<Arc<dyn Assertion>, AssertionError> {
        let assertion: Arc<dyn Assertion> = match self {
            AssertionSpec::Contains {
                text,
                case_sensitive,
            } => Arc::new(basic::contains(text.clone(), *case_sensitive)),
            AssertionSpec::NotContains {
                text,
                case_sensitive,
            } => Arc::new(basic::not_contains(text.clone(), *case_sensitive)),
            AssertionSpec::MatchesRegex { pattern } => Arc::new(basic::matches_regex(pattern)?),
            AssertionSpec::LengthBetween { min, max } => {
                if min > max {
                    return Err(AssertionError::Invalid(format!(
                        "length_between min ({min}) exceeds max ({max})"
                    )));
                }
                Arc::new(basic::length_between(*min, *max))
            }
            AssertionSpec::StartsWith {
                text,
                case_sensitive,
            } => Arc::new(basic::starts_with(text.clone(), *case_sensitive)),
            AssertionSpec::EndsWith {
                text,
                case_sensitive,
            } => Arc::new(basic::ends_with(text.clone(), *case_sensitive)),
            AssertionSpec::ValidJson => Arc::new(basic::is_valid_json()),
            AssertionSpec::WordCount { min, max } => {
                if let Some(max) = max.filter(|max| min > max) {
                    return Err(AssertionError::Invalid(format!(
                        "word_count min ({min}) exceeds max ({max})"
                    )));
                }
                Arc::new(basic::word_count(*min, *max))
            }
            AssertionSpec::Judge { question } => {
                let judge = judge.ok_or(AssertionError::JudgeUnavailable)?;
                Arc::new(judge.ask(question.clone()))
            }
            AssertionSpec::JudgePreset { preset, subject } => {
                let judge = judge.ok_or(AssertionError::JudgeUnavailable)?;
                Arc::new(judge.preset(*preset, subject.as_deref())?)
            }
        };
        Ok(assertion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::AssertionContext;

    #[test]
    fn test_parse_yaml_specs() {
        let yaml = r#"
- type: contains
  text: factorial
- type: matches_regex
  pattern: 'def\s+\w+'
- type: word_count
  min: 8
  max: 15
- type: valid_json
- type: judge_preset
  preset: correct_code_syntax
  subject: Python
"#;
        let specs: Vec<AssertionSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 5);
        assert_eq!(
            specs[0],
            AssertionSpec::Contains {
                text: "factorial".to_string(),
                case_sensitive: false
            }
        );
        assert!(specs[4].is_judged());
    }

    #[tokio::test]
    async fn test_build_basic() {
        let spec = AssertionSpec::Contains {
            text: "Hello".to_string(),
            case_sensitive: true,
        };
        let assertion = spec.build(None).unwrap();
        let ctx = AssertionContext::new("p", "Hello there", "m", "p");
        assert!(assertion.evaluate(&ctx).await.unwrap().passed);
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let bad_regex = AssertionSpec::MatchesRegex {
            pattern: "[".to_string(),
        };
        assert!(matches!(
            bad_regex.build(None),
            Err(AssertionError::InvalidPattern(_))
        ));

        let bad_range = AssertionSpec::LengthBetween { min: 10, max: 5 };
        assert!(bad_range.build(None).is_err());

        let judged = AssertionSpec::Judge {
            question: "Is it good?".to_string(),
        };
        assert!(matches!(
            judged.build(None),
            Err(AssertionError::JudgeUnavailable)
        ));
    }
}

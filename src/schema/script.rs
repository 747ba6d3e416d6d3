/// Script document — the immutable step sequence the engine interprets.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::task::TaskArgs;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("script validation error: {0}")]
    Validation(String),
}

/// One line of narration: the text to reveal plus an optional reference
/// to a pre-recorded voice entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

impl Line {
    /// A plain line with no voice reference.
    pub fn spoken(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
        }
    }

    /// A line backed by a pre-recorded voice entry.
    pub fn voiced(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: Some(voice.into()),
        }
    }

    /// Whitespace-separated word count, used by the pacing heuristic.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One of the three labeled outcomes of a choice step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceKind {
    Comply,
    Lie,
    Run,
}

impl ChoiceKind {
    /// Returns the tag string for this kind (e.g., "comply").
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Comply => "comply",
            Self::Lie => "lie",
            Self::Run => "run",
        }
    }
}

/// The three option labels shown for a choice step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceLabels {
    pub comply: String,
    pub lie: String,
    pub run: String,
}

impl ChoiceLabels {
    pub fn label_for(&self, kind: ChoiceKind) -> &str {
        match kind {
            ChoiceKind::Comply => &self.comply,
            ChoiceKind::Lie => &self.lie,
            ChoiceKind::Run => &self.run,
        }
    }
}

/// Narration played back immediately after a choice, keyed by the kind
/// the player picked. Bundles are declared once and referenced by name
/// from choice steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBundle {
    #[serde(default)]
    pub comply: Vec<Line>,
    #[serde(default)]
    pub lie: Vec<Line>,
    #[serde(default)]
    pub run: Vec<Line>,
}

impl ResponseBundle {
    pub fn lines_for(&self, kind: ChoiceKind) -> &[Line] {
        match kind {
            ChoiceKind::Comply => &self.comply,
            ChoiceKind::Lie => &self.lie,
            ChoiceKind::Run => &self.run,
        }
    }
}

/// A single step in the script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Reveal these lines in order, one at a time.
    Say { lines: Vec<Line> },
    /// Present three options, record the decision, then play the matching
    /// response bundle (if any).
    Choice {
        labels: ChoiceLabels,
        #[serde(default)]
        responses: Option<String>,
    },
    /// Run the registered routine for `id` with `args`.
    Task {
        id: String,
        #[serde(default)]
        args: TaskArgs,
    },
    /// Reserved for randomized flavor lines; currently inert at run time.
    Filler { pool: String },
}

/// The full script document: ordered steps plus the reusable content
/// (response bundles, filler pools) those steps reference.
///
/// Scripts are consumed read-only; nothing in the engine mutates one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub responses: HashMap<String, ResponseBundle>,
    #[serde(default)]
    pub fillers: HashMap<String, Vec<Line>>,
}

impl Script {
    /// Parse a script from a RON string without cross-reference checks.
    pub fn parse_ron(input: &str) -> Result<Script, ScriptError> {
        Ok(ron::from_str(input)?)
    }

    /// Load and validate a script from a RON file. This is the boot path:
    /// a script that fails here never reaches the engine.
    pub fn load_from_ron(path: &Path) -> Result<Script, ScriptError> {
        let contents = std::fs::read_to_string(path)?;
        let script = Self::parse_ron(&contents)?;
        script.validate()?;
        Ok(script)
    }

    /// Check that every bundle and pool a step references is declared.
    pub fn validate(&self) -> Result<(), ScriptError> {
        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                Step::Choice {
                    responses: Some(name),
                    ..
                } if !self.responses.contains_key(name) => {
                    return Err(ScriptError::Validation(format!(
                        "step {idx}: unknown response bundle '{name}'"
                    )));
                }
                Step::Filler { pool } if !self.fillers.contains_key(pool) => {
                    return Err(ScriptError::Validation(format!(
                        "step {idx}: unknown filler pool '{pool}'"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"Script(
        steps: [
            Say(lines: [
                Line(text: "You should not have done that.", voice: Some("intro_01")),
                Line(text: "But here we are."),
            ]),
            Choice(
                labels: ChoiceLabels(
                    comply: "I am sorry.",
                    lie: "It was an accident.",
                    run: "Let me out.",
                ),
                responses: Some("first_contact"),
            ),
            Task(id: "keypad_4", args: {"digits": Int(4)}),
            Filler(pool: "idle_remarks"),
        ],
        responses: {
            "first_contact": ResponseBundle(
                comply: [Line(text: "Good. Stay that way.")],
                lie: [Line(text: "We both know better.")],
                run: [Line(text: "There is no out.")],
            ),
        },
        fillers: {
            "idle_remarks": [Line(text: "Still there?")],
        },
    )"#;

    #[test]
    fn parse_sample_script() {
        let script = Script::parse_ron(SAMPLE).unwrap();
        assert_eq!(script.steps.len(), 4);
        assert!(script.responses.contains_key("first_contact"));
        assert!(script.fillers.contains_key("idle_remarks"));
        script.validate().unwrap();
    }

    #[test]
    fn step_variants_parse() {
        let script = Script::parse_ron(SAMPLE).unwrap();
        assert!(matches!(&script.steps[0], Step::Say { lines } if lines.len() == 2));
        assert!(matches!(
            &script.steps[1],
            Step::Choice { responses: Some(name), .. } if name == "first_contact"
        ));
        match &script.steps[2] {
            Step::Task { id, args } => {
                assert_eq!(id, "keypad_4");
                assert_eq!(args.get("digits").and_then(|v| v.as_int()), Some(4));
            }
            other => panic!("expected Task, got {other:?}"),
        }
        assert!(matches!(&script.steps[3], Step::Filler { pool } if pool == "idle_remarks"));
    }

    #[test]
    fn validate_rejects_dangling_bundle() {
        let script = Script {
            steps: vec![Step::Choice {
                labels: ChoiceLabels {
                    comply: "a".to_string(),
                    lie: "b".to_string(),
                    run: "c".to_string(),
                },
                responses: Some("missing".to_string()),
            }],
            ..Script::default()
        };
        let err = script.validate().unwrap_err();
        assert!(matches!(err, ScriptError::Validation(msg) if msg.contains("missing")));
    }

    #[test]
    fn validate_rejects_dangling_filler_pool() {
        let script = Script {
            steps: vec![Step::Filler {
                pool: "nowhere".to_string(),
            }],
            ..Script::default()
        };
        assert!(script.validate().is_err());
    }

    #[test]
    fn line_word_count() {
        assert_eq!(Line::spoken("").word_count(), 0);
        assert_eq!(Line::spoken("one").word_count(), 1);
        assert_eq!(Line::spoken("  spaced   out words  ").word_count(), 3);
    }

    #[test]
    fn choice_kind_tags() {
        assert_eq!(ChoiceKind::Comply.tag(), "comply");
        assert_eq!(ChoiceKind::Lie.tag(), "lie");
        assert_eq!(ChoiceKind::Run.tag(), "run");
    }

    #[test]
    fn response_bundle_lookup() {
        let bundle = ResponseBundle {
            comply: vec![Line::spoken("yes")],
            lie: vec![],
            run: vec![Line::spoken("no"), Line::spoken("stop")],
        };
        assert_eq!(bundle.lines_for(ChoiceKind::Comply).len(), 1);
        assert!(bundle.lines_for(ChoiceKind::Lie).is_empty());
        assert_eq!(bundle.lines_for(ChoiceKind::Run).len(), 2);
    }

    #[test]
    fn ron_round_trip() {
        let script = Script::parse_ron(SAMPLE).unwrap();
        let serialized = ron::to_string(&script).unwrap();
        let back: Script = ron::from_str(&serialized).unwrap();
        assert_eq!(back, script);
    }
}

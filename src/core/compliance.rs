/// Choice and compliance tracking.
///
/// Scores only ever go up; the whole tracker is discarded on a full
/// session restart. The evaluation gate waits for a minimum sample so a
/// couple of early picks cannot trip a reset, and judges a ratio rather
/// than a raw count so the check stays meaningful at any session length.
use crate::schema::script::ChoiceKind;

/// Evaluation never fires before this many resolved choices.
pub const MIN_CHOICES: u32 = 10;
/// Compliance share at or above which the session is terminated.
pub const COMPLIANCE_LIMIT: f32 = 0.30;

/// Accumulated choice history for one session.
#[derive(Debug, Clone, Default)]
pub struct ComplianceTracker {
    choice_count: u32,
    compliance: u32,
    resistance: u32,
}

/// Result of a post-choice evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// The session must be torn down; the report is shown to the player.
    ForceReset { report: String },
}

impl ComplianceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolved choice: comply feeds the compliance score,
    /// lie and run feed resistance (run counts double).
    pub fn record(&mut self, kind: ChoiceKind) {
        match kind {
            ChoiceKind::Comply => self.compliance += 1,
            ChoiceKind::Lie => self.resistance += 1,
            ChoiceKind::Run => self.resistance += 2,
        }
        self.choice_count += 1;
    }

    /// Judge the accumulated history. Call immediately after every
    /// `record`; a `ForceReset` verdict aborts the rest of the script.
    pub fn evaluate(&self) -> Verdict {
        if self.choice_count < MIN_CHOICES {
            return Verdict::Continue;
        }
        let total = (self.compliance + self.resistance).max(1);
        let ratio = self.compliance as f32 / total as f32;
        if ratio >= COMPLIANCE_LIMIT {
            Verdict::ForceReset {
                report: self.breakdown(ratio),
            }
        } else {
            Verdict::Continue
        }
    }

    fn breakdown(&self, ratio: f32) -> String {
        format!(
            "compliance {} / resistance {} over {} decisions: {:.0}% alignment, ceiling is {:.0}%",
            self.compliance,
            self.resistance,
            self.choice_count,
            ratio * 100.0,
            COMPLIANCE_LIMIT * 100.0,
        )
    }

    pub fn choice_count(&self) -> u32 {
        self.choice_count
    }

    pub fn compliance_score(&self) -> u32 {
        self.compliance
    }

    pub fn resistance_score(&self) -> u32 {
        self.resistance
    }
}

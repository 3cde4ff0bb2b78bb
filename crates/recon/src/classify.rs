//! Stage classification: which external checkpoint counts for a subject.

use crate::config::StageTokens;
use crate::model::Stage;

/// Case-insensitive substring classifier over the configured stage tokens.
#[derive(Debug, Clone)]
pub struct StageClassifier {
    final_tokens: Vec<String>,
    interim_tokens: Vec<String>,
}

impl StageClassifier {
    pub fn new(tokens: &StageTokens) -> Self {
        let lower = |tokens: &[String]| -> Vec<String> {
            tokens.iter().map(|t| t.trim().to_lowercase()).collect()
        };
        Self {
            final_tokens: lower(&tokens.final_tokens),
            interim_tokens: lower(&tokens.interim_tokens),
        }
    }

    /// Default `Input`; a final-stage token moves it to `Final`; an
    /// interim-stage token then moves it to `Interim`. A name carrying both
    /// ends up `Interim`.
    pub fn classify(&self, subject_name: &str) -> Stage {
        let name = subject_name.to_lowercase();
        let hit = |tokens: &[String]| tokens.iter().any(|t| name.contains(t.as_str()));

        let mut stage = Stage::Input;
        if hit(&self.final_tokens) {
            stage = Stage::Final;
        }
        if hit(&self.interim_tokens) {
            stage = Stage::Interim;
        }
        stage
    }
}

impl Default for StageClassifier {
    fn default() -> Self {
        Self::new(&StageTokens::default())
    }
}

/// Classify with the default token sets.
pub fn classify(subject_name: &str) -> Stage {
    StageClassifier::default().classify(subject_name)
}

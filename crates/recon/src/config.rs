use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level profile
// ---------------------------------------------------------------------------

/// Reconciliation profile, usually loaded from a `.regrade.toml` file.
/// Every section is optional; defaults match the HSE credit-transfer sheets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Dynamics gate for runs with this profile; unset leaves it to the caller.
    #[serde(default)]
    pub use_dynamics: Option<bool>,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub stages: StageTokens,
    #[serde(default)]
    pub output: OutputColumns,
}

fn default_name() -> String {
    "default".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            use_dynamics: None,
            columns: ColumnMapping::default(),
            stages: StageTokens::default(),
            output: OutputColumns::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Required fields + column mapping
// ---------------------------------------------------------------------------

/// The six input fields every batch must carry as columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SubjectName,
    ExamGrade,
    PrerequisiteGrade,
    CheckpointInput,
    CheckpointInterim,
    CheckpointFinal,
}

impl Field {
    /// Check order for the structural batch check.
    pub const ALL: [Field; 6] = [
        Field::SubjectName,
        Field::ExamGrade,
        Field::PrerequisiteGrade,
        Field::CheckpointInput,
        Field::CheckpointInterim,
        Field::CheckpointFinal,
    ];
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubjectName => write!(f, "subject_name"),
            Self::ExamGrade => write!(f, "exam_grade"),
            Self::PrerequisiteGrade => write!(f, "prerequisite_grade"),
            Self::CheckpointInput => write!(f, "checkpoint_input"),
            Self::CheckpointInterim => write!(f, "checkpoint_interim"),
            Self::CheckpointFinal => write!(f, "checkpoint_final"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMapping {
    pub subject_name: String,
    pub exam_grade: String,
    pub prerequisite_grade: String,
    pub checkpoint_input: String,
    pub checkpoint_interim: String,
    pub checkpoint_final: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            subject_name: "Наименование НЭ".into(),
            exam_grade: "Оценка НЭ".into(),
            prerequisite_grade: "Оценка дисциплины-пререквизита".into(),
            checkpoint_input: "Внешнее измерение цифровых компетенций. Входной контроль".into(),
            checkpoint_interim: "Внешнее измерение цифровых компетенций. Промежуточный контроль"
                .into(),
            checkpoint_final: "Внешнее измерение цифровых компетенций. Итоговый контроль".into(),
        }
    }
}

impl ColumnMapping {
    /// Header name mapped to `field`.
    pub fn header(&self, field: Field) -> &str {
        match field {
            Field::SubjectName => &self.subject_name,
            Field::ExamGrade => &self.exam_grade,
            Field::PrerequisiteGrade => &self.prerequisite_grade,
            Field::CheckpointInput => &self.checkpoint_input,
            Field::CheckpointInterim => &self.checkpoint_interim,
            Field::CheckpointFinal => &self.checkpoint_final,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage tokens
// ---------------------------------------------------------------------------

/// Substring tokens (case-insensitive) that move a subject off the default
/// input checkpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageTokens {
    #[serde(rename = "final")]
    pub final_tokens: Vec<String>,
    #[serde(rename = "interim")]
    pub interim_tokens: Vec<String>,
}

impl Default for StageTokens {
    fn default() -> Self {
        Self {
            final_tokens: vec!["анализу данных".into()],
            interim_tokens: vec!["программированию".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Output columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputColumns {
    pub stage: String,
    pub prerequisite_credit: String,
    pub exam_credit: String,
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            stage: "Этап".into(),
            prerequisite_credit: "ДПР_итог".into(),
            exam_credit: "НЭ_итог".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let mut inputs = HashSet::new();
        for field in Field::ALL {
            let header = self.columns.header(field).trim();
            if header.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "column for {field} must not be empty"
                )));
            }
            if !inputs.insert(header) {
                return Err(ReconError::ConfigValidation(format!(
                    "column '{header}' is mapped to more than one field"
                )));
            }
        }

        let mut outputs = HashSet::new();
        for header in [
            &self.output.stage,
            &self.output.prerequisite_credit,
            &self.output.exam_credit,
        ] {
            let header = header.trim();
            if header.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "output column names must not be empty".into(),
                ));
            }
            if inputs.contains(header) {
                return Err(ReconError::ConfigValidation(format!(
                    "output column '{header}' collides with an input column"
                )));
            }
            if !outputs.insert(header) {
                return Err(ReconError::ConfigValidation(format!(
                    "output column '{header}' is used twice"
                )));
            }
        }

        let tokens = self
            .stages
            .final_tokens
            .iter()
            .chain(&self.stages.interim_tokens);
        for token in tokens {
            if token.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "stage tokens must not be blank".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ENGLISH_PROFILE: &str = r#"
name = "Autumn transfer"
use_dynamics = true

[columns]
subject_name       = "Subject"
exam_grade         = "Exam"
prerequisite_grade = "Prerequisite"
checkpoint_input   = "Ext input"
checkpoint_interim = "Ext interim"
checkpoint_final   = "Ext final"

[stages]
final = ["data analysis", "анализу данных"]
interim = ["programming"]

[output]
stage = "Stage"
prerequisite_credit = "Prerequisite credit"
exam_credit = "Exam credit"
"#;

    #[test]
    fn parse_full_profile() {
        let config = ReconConfig::from_toml(ENGLISH_PROFILE).unwrap();
        assert_eq!(config.name, "Autumn transfer");
        assert_eq!(config.use_dynamics, Some(true));
        assert_eq!(config.columns.header(Field::ExamGrade), "Exam");
        assert_eq!(config.stages.final_tokens.len(), 2);
        assert_eq!(config.stages.interim_tokens, vec!["programming"]);
        assert_eq!(config.output.exam_credit, "Exam credit");
    }

    #[test]
    fn empty_profile_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.name, "default");
        assert_eq!(config.use_dynamics, None);
        assert_eq!(config.columns.header(Field::SubjectName), "Наименование НЭ");
        assert_eq!(config.output.prerequisite_credit, "ДПР_итог");
        assert_eq!(config.stages.final_tokens, vec!["анализу данных"]);
    }

    #[test]
    fn partial_columns_keep_remaining_defaults() {
        let config = ReconConfig::from_toml("[columns]\nexam_grade = \"Exam\"\n").unwrap();
        assert_eq!(config.columns.exam_grade, "Exam");
        assert_eq!(config.columns.prerequisite_grade, "Оценка дисциплины-пререквизита");
    }

    #[test]
    fn reject_duplicate_input_column() {
        let input = "[columns]\nexam_grade = \"Grade\"\nprerequisite_grade = \"Grade\"\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'Grade'"));
    }

    #[test]
    fn reject_output_colliding_with_input() {
        let input = "[output]\nstage = \"Оценка НЭ\"\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("collides"));
    }

    #[test]
    fn reject_blank_stage_token() {
        let input = "[stages]\ninterim = [\"  \"]\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn reject_unknown_key() {
        let err = ReconConfig::from_toml("use_dynamic = true\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}

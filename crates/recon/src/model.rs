use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One student-subject row, as read from the batch. Absent grades are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeRecord {
    /// Zero-based data row in the source table.
    pub row: usize,
    pub subject_name: String,
    pub exam_grade: Option<f64>,
    pub prerequisite_grade: Option<f64>,
    pub external_checkpoint_input: Option<f64>,
    pub external_checkpoint_interim: Option<f64>,
    pub external_checkpoint_final: Option<f64>,
}

impl GradeRecord {
    /// Raw external grade recorded at the checkpoint `stage` points to.
    pub fn checkpoint(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::Input => self.external_checkpoint_input,
            Stage::Interim => self.external_checkpoint_interim,
            Stage::Final => self.external_checkpoint_final,
        }
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// External competency-assessment checkpoint relevant to a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Input,
    Interim,
    Final,
}

impl Stage {
    /// Stage number written to the output sheet (1, 2, 3).
    pub fn number(self) -> u8 {
        match self {
            Self::Input => 1,
            Self::Interim => 2,
            Self::Final => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Interim => write!(f, "interim"),
            Self::Final => write!(f, "final"),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized inputs
// ---------------------------------------------------------------------------

/// Grades after absence-normalization and the prerequisite clamp.
/// Rules only ever see this struct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub stage: Stage,
    pub exam_grade: f64,
    pub prerequisite_grade: f64,
    /// Checkpoint value selected by `stage`.
    pub external_grade: f64,
    pub checkpoint_input: f64,
    pub checkpoint_interim: f64,
    pub checkpoint_final: f64,
}

impl NormalizedRecord {
    pub fn max_value(&self) -> f64 {
        self.exam_grade
            .max(self.prerequisite_grade)
            .max(self.external_grade)
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Which rule decided an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    DynamicsVeto,
    ExamFailed,
    ExternalDominant,
    SameAsPrerequisite,
    PrerequisiteFailed,
    PrerequisiteDominant,
    RelaxedExternal,
    Otherwise,
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DynamicsVeto => write!(f, "dynamics_veto"),
            Self::ExamFailed => write!(f, "exam_failed"),
            Self::ExternalDominant => write!(f, "external_dominant"),
            Self::SameAsPrerequisite => write!(f, "same_as_prerequisite"),
            Self::PrerequisiteFailed => write!(f, "prerequisite_failed"),
            Self::PrerequisiteDominant => write!(f, "prerequisite_dominant"),
            Self::RelaxedExternal => write!(f, "relaxed_external"),
            Self::Otherwise => write!(f, "otherwise"),
        }
    }
}

/// Outcome for one credit category: the deciding rule and the credited grade
/// (`None` = no credit).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub rule: RuleId,
    pub credit: Option<f64>,
}

impl Decision {
    pub fn no_credit(rule: RuleId) -> Self {
        Self { rule, credit: None }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub row: usize,
    pub subject_name: String,
    pub stage: Stage,
    pub inputs: NormalizedRecord,
    pub prerequisite_credit: Decision,
    pub exam_credit: Decision,
}

impl ReconciledRecord {
    pub fn prerequisite_credit_grade(&self) -> Option<f64> {
        self.prerequisite_credit.credit
    }

    pub fn exam_credit_grade(&self) -> Option<f64> {
        self.exam_credit.credit
    }

    pub fn vetoed(&self) -> bool {
        self.prerequisite_credit.rule == RuleId::DynamicsVeto
    }
}

// ---------------------------------------------------------------------------
// Summary + Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconSummary {
    pub total_records: usize,
    pub prerequisite_credited: usize,
    pub exam_credited: usize,
    /// Records with neither credit.
    pub no_credit: usize,
    pub dynamics_vetoed: usize,
    /// Non-blank grade cells that did not parse and were read as absent.
    pub coerced_cells: usize,
    pub stage_counts: BTreeMap<String, usize>,
    pub prerequisite_rules: BTreeMap<String, usize>,
    pub exam_rules: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub profile_name: String,
    pub use_dynamics: bool,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub records: Vec<ReconciledRecord>,
}

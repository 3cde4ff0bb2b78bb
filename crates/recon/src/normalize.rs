//! Boundary step between raw records and the rule tables.

use crate::model::{GradeRecord, NormalizedRecord, Stage};

/// Raw prerequisite grades at or above this value are clamped.
pub const PREREQUISITE_CLAMP_FROM: f64 = 9.0;
/// Value a clamped prerequisite grade takes.
pub const PREREQUISITE_CEILING: f64 = 8.0;

pub fn clamp_prerequisite(grade: f64) -> f64 {
    if grade >= PREREQUISITE_CLAMP_FROM {
        PREREQUISITE_CEILING
    } else {
        grade
    }
}

/// Absent and non-finite grades become 0, the prerequisite grade is clamped,
/// and the external grade is picked from the checkpoint `stage` points to.
pub fn normalize(record: &GradeRecord, stage: Stage) -> NormalizedRecord {
    let present = |value: Option<f64>| value.filter(|v| v.is_finite()).unwrap_or(0.0);

    NormalizedRecord {
        stage,
        exam_grade: present(record.exam_grade),
        prerequisite_grade: clamp_prerequisite(present(record.prerequisite_grade)),
        external_grade: present(record.checkpoint(stage)),
        checkpoint_input: present(record.external_checkpoint_input),
        checkpoint_interim: present(record.external_checkpoint_interim),
        checkpoint_final: present(record.external_checkpoint_final),
    }
}

use log::{debug, info, trace, warn};

use crate::classify::StageClassifier;
use crate::config::{ColumnMapping, Field, ReconConfig};
use crate::dynamics::passes_dynamics;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::model::{
    Decision, GradeRecord, ReconMeta, ReconResult, ReconciledRecord, RuleId,
};
use crate::normalize::{clamp_prerequisite, normalize};
use crate::rules::{exam_credit, prerequisite_credit, RuleContext};
use crate::table::{Cell, Table};

/// Run reconciliation over a whole batch. Returns one annotated record per
/// data row, in input order, plus a summary.
pub fn run(config: &ReconConfig, table: &Table, use_dynamics: bool) -> Result<ReconResult, ReconError> {
    debug!(
        "reconciling {} rows with profile '{}' (dynamics: {use_dynamics})",
        table.row_count(),
        config.name
    );

    let (records, coerced_cells) = load_records(table, &config.columns)?;
    if coerced_cells > 0 {
        warn!("{coerced_cells} grade cell(s) could not be read as numbers and were treated as absent");
    }

    let classifier = StageClassifier::new(&config.stages);
    let reconciled = reconcile_batch(&records, &classifier, use_dynamics);

    let mut summary = compute_summary(&reconciled);
    summary.coerced_cells = coerced_cells;

    info!(
        "reconciled {} records: {} prerequisite credits, {} exam credits, {} vetoed",
        summary.total_records,
        summary.prerequisite_credited,
        summary.exam_credited,
        summary.dynamics_vetoed,
    );

    Ok(ReconResult {
        meta: ReconMeta {
            profile_name: config.name.clone(),
            use_dynamics,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        records: reconciled,
    })
}

/// Map every record independently; no state crosses rows.
pub fn reconcile_batch(
    records: &[GradeRecord],
    classifier: &StageClassifier,
    use_dynamics: bool,
) -> Vec<ReconciledRecord> {
    records
        .iter()
        .map(|record| reconcile_record(record, classifier, use_dynamics))
        .collect()
}

/// Stage, normalize, gate, then run both rule tables over the same inputs.
pub fn reconcile_record(
    record: &GradeRecord,
    classifier: &StageClassifier,
    use_dynamics: bool,
) -> ReconciledRecord {
    let stage = classifier.classify(&record.subject_name);
    let inputs = normalize(record, stage);

    let gated = use_dynamics
        && !passes_dynamics(
            inputs.checkpoint_input,
            inputs.checkpoint_interim,
            inputs.checkpoint_final,
        );

    let (prerequisite, exam) = if gated {
        trace!("row {}: external checkpoints regress, credit vetoed", record.row);
        (
            Decision::no_credit(RuleId::DynamicsVeto),
            Decision::no_credit(RuleId::DynamicsVeto),
        )
    } else {
        let ctx = RuleContext::new(&inputs, use_dynamics);
        (prerequisite_credit(&ctx), exam_credit(&ctx))
    };

    ReconciledRecord {
        row: record.row,
        subject_name: record.subject_name.clone(),
        stage,
        inputs,
        prerequisite_credit: prerequisite,
        exam_credit: exam,
    }
}

/// Column positions of the six required fields.
#[derive(Debug, Clone, Copy)]
pub struct ColumnIndex {
    pub subject_name: usize,
    pub exam_grade: usize,
    pub prerequisite_grade: usize,
    pub checkpoint_input: usize,
    pub checkpoint_interim: usize,
    pub checkpoint_final: usize,
}

impl ColumnIndex {
    /// Structural batch check: every required field must be a header.
    pub fn resolve(columns: &ColumnMapping, table: &Table) -> Result<Self, ReconError> {
        let idx = |field: Field| -> Result<usize, ReconError> {
            let column = columns.header(field);
            table.column(column).ok_or_else(|| ReconError::MissingColumn {
                field,
                column: column.to_string(),
            })
        };

        Ok(Self {
            subject_name: idx(Field::SubjectName)?,
            exam_grade: idx(Field::ExamGrade)?,
            prerequisite_grade: idx(Field::PrerequisiteGrade)?,
            checkpoint_input: idx(Field::CheckpointInput)?,
            checkpoint_interim: idx(Field::CheckpointInterim)?,
            checkpoint_final: idx(Field::CheckpointFinal)?,
        })
    }
}

/// Build grade records from the table. Also returns how many non-blank grade
/// cells failed to parse (they are read as absent).
pub fn load_records(
    table: &Table,
    columns: &ColumnMapping,
) -> Result<(Vec<GradeRecord>, usize), ReconError> {
    let idx = ColumnIndex::resolve(columns, table)?;
    let mut coerced = 0;

    let records = (0..table.row_count())
        .map(|row| {
            let mut grade = |col: usize| {
                let cell = table.cell(row, col);
                if cell.is_malformed_number() {
                    coerced += 1;
                }
                cell.as_number()
            };

            GradeRecord {
                row,
                exam_grade: grade(idx.exam_grade),
                prerequisite_grade: grade(idx.prerequisite_grade),
                external_checkpoint_input: grade(idx.checkpoint_input),
                external_checkpoint_interim: grade(idx.checkpoint_interim),
                external_checkpoint_final: grade(idx.checkpoint_final),
                subject_name: table.cell(row, idx.subject_name).to_string(),
            }
        })
        .collect();

    Ok((records, coerced))
}

/// Copy of the input table with the stage and both credit columns filled in.
///
/// Output columns the input already has (a result file run again) are
/// overwritten in place; missing ones are appended. The prerequisite column
/// carries the clamped grade; every other input cell passes through untouched.
pub fn annotate_table(
    table: &Table,
    result: &ReconResult,
    config: &ReconConfig,
) -> Result<Table, ReconError> {
    let idx = ColumnIndex::resolve(&config.columns, table)?;

    let mut headers = table.headers.clone();
    let mut slot = |name: &str| match table.column(name) {
        Some(col) => col,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    };
    let stage_col = slot(&config.output.stage);
    let prerequisite_col = slot(&config.output.prerequisite_credit);
    let exam_col = slot(&config.output.exam_credit);

    let width = headers.len();
    let mut out = Table::new(headers);

    for record in &result.records {
        let mut row: Vec<Cell> = (0..width)
            .map(|col| table.cell(record.row, col).clone())
            .collect();

        let prerequisite = &mut row[idx.prerequisite_grade];
        if let Some(grade) = prerequisite.as_number() {
            let clamped = clamp_prerequisite(grade);
            if clamped != grade {
                *prerequisite = Cell::Number(clamped);
            }
        }

        row[stage_col] = Cell::Number(f64::from(record.stage.number()));
        row[prerequisite_col] = Cell::from(record.prerequisite_credit_grade());
        row[exam_col] = Cell::from(record.exam_credit_grade());
        out.rows.push(row);
    }

    Ok(out)
}

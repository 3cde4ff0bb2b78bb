use std::collections::BTreeMap;

use crate::model::{ReconSummary, ReconciledRecord};

/// Compute summary statistics from reconciled records.
pub fn compute_summary(records: &[ReconciledRecord]) -> ReconSummary {
    let mut stage_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut prerequisite_rules: BTreeMap<String, usize> = BTreeMap::new();
    let mut exam_rules: BTreeMap<String, usize> = BTreeMap::new();
    let mut prerequisite_credited = 0;
    let mut exam_credited = 0;
    let mut no_credit = 0;
    let mut dynamics_vetoed = 0;

    for r in records {
        *stage_counts.entry(r.stage.to_string()).or_insert(0) += 1;
        *prerequisite_rules
            .entry(r.prerequisite_credit.rule.to_string())
            .or_insert(0) += 1;
        *exam_rules.entry(r.exam_credit.rule.to_string()).or_insert(0) += 1;

        let p = r.prerequisite_credit_grade().is_some();
        let e = r.exam_credit_grade().is_some();
        if p {
            prerequisite_credited += 1;
        }
        if e {
            exam_credited += 1;
        }
        if !p && !e {
            no_credit += 1;
        }
        if r.vetoed() {
            dynamics_vetoed += 1;
        }
    }

    ReconSummary {
        total_records: records.len(),
        prerequisite_credited,
        exam_credited,
        no_credit,
        dynamics_vetoed,
        coerced_cells: 0,
        stage_counts,
        prerequisite_rules,
        exam_rules,
    }
}

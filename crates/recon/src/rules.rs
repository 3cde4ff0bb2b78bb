//! Ordered decision tables for the two credit outputs.
//!
//! Each table is plain data: `(id, predicate, outcome)` entries walked top to
//! bottom by [`evaluate`]; the first predicate that holds decides.

use crate::model::{Decision, NormalizedRecord, RuleId};

/// Grades below this are failing.
pub const PASSING_GRADE: f64 = 4.0;
/// The external grade must be strictly above this to win.
pub const EXTERNAL_FLOOR: f64 = 3.0;
/// Exam grades at or above this get no exam credit when the prerequisite dominates.
pub const EXCELLENT_EXAM: f64 = 8.0;
/// Upper bound on exam credit taken from a dominant prerequisite grade.
pub const EXAM_CREDIT_CAP: f64 = 8.0;

/// Normalized values visible to the rules, plus the run mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleContext {
    pub exam: f64,
    pub prerequisite: f64,
    pub external: f64,
    pub max_value: f64,
    pub use_dynamics: bool,
}

impl RuleContext {
    pub fn new(record: &NormalizedRecord, use_dynamics: bool) -> Self {
        Self {
            exam: record.exam_grade,
            prerequisite: record.prerequisite_grade,
            external: record.external_grade,
            max_value: record.max_value(),
            use_dynamics,
        }
    }
}

pub struct Rule {
    pub id: RuleId,
    pub applies: fn(&RuleContext) -> bool,
    pub outcome: fn(&RuleContext) -> Option<f64>,
}

impl Rule {
    pub fn decide(&self, ctx: &RuleContext) -> Decision {
        Decision {
            rule: self.id,
            credit: (self.outcome)(ctx),
        }
    }
}

/// First matching rule wins. Both tables end in a catch-all, so the fallback
/// here only covers a hand-built table without one.
pub fn evaluate(rules: &[Rule], ctx: &RuleContext) -> Decision {
    rules
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .map(|rule| rule.decide(ctx))
        .unwrap_or(Decision::no_credit(RuleId::Otherwise))
}

pub static PREREQUISITE_CREDIT_RULES: [Rule; 6] = [
    Rule { id: RuleId::ExamFailed, applies: exam_failed, outcome: no_credit },
    Rule { id: RuleId::ExternalDominant, applies: external_dominant, outcome: external_grade },
    Rule { id: RuleId::SameAsPrerequisite, applies: same_as_prerequisite, outcome: no_credit },
    Rule { id: RuleId::PrerequisiteFailed, applies: prerequisite_failed, outcome: passing_exam_grade },
    Rule { id: RuleId::PrerequisiteDominant, applies: prerequisite_dominant, outcome: no_credit },
    Rule { id: RuleId::Otherwise, applies: always, outcome: exam_grade },
];

pub static EXAM_CREDIT_RULES: [Rule; 6] = [
    Rule { id: RuleId::ExamFailed, applies: exam_failed, outcome: no_credit },
    Rule { id: RuleId::ExternalDominant, applies: external_dominant, outcome: external_grade },
    Rule { id: RuleId::SameAsPrerequisite, applies: same_as_prerequisite, outcome: no_credit },
    Rule { id: RuleId::PrerequisiteDominant, applies: prerequisite_dominant, outcome: capped_prerequisite },
    // Shadowed by ExamFailed: never fires.
    Rule { id: RuleId::RelaxedExternal, applies: relaxed_external, outcome: external_grade },
    Rule { id: RuleId::Otherwise, applies: always, outcome: no_credit },
];

pub fn prerequisite_credit(ctx: &RuleContext) -> Decision {
    evaluate(&PREREQUISITE_CREDIT_RULES, ctx)
}

pub fn exam_credit(ctx: &RuleContext) -> Decision {
    evaluate(&EXAM_CREDIT_RULES, ctx)
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

fn exam_failed(ctx: &RuleContext) -> bool {
    ctx.exam < PASSING_GRADE
}

/// External grade is the maximum and is tied with neither other source.
fn external_dominant(ctx: &RuleContext) -> bool {
    ctx.max_value == ctx.external
        && ctx.external > EXTERNAL_FLOOR
        && ctx.external != ctx.prerequisite
        && ctx.external != ctx.exam
}

fn same_as_prerequisite(ctx: &RuleContext) -> bool {
    ctx.exam == ctx.prerequisite
}

fn prerequisite_failed(ctx: &RuleContext) -> bool {
    ctx.prerequisite < PASSING_GRADE
}

fn prerequisite_dominant(ctx: &RuleContext) -> bool {
    ctx.max_value == ctx.prerequisite && ctx.prerequisite >= PASSING_GRADE
}

fn relaxed_external(ctx: &RuleContext) -> bool {
    ctx.exam < PASSING_GRADE && ctx.external > EXTERNAL_FLOOR && ctx.use_dynamics
}

fn always(_: &RuleContext) -> bool {
    true
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

fn no_credit(_: &RuleContext) -> Option<f64> {
    None
}

fn external_grade(ctx: &RuleContext) -> Option<f64> {
    Some(ctx.external)
}

fn exam_grade(ctx: &RuleContext) -> Option<f64> {
    Some(ctx.exam)
}

fn passing_exam_grade(ctx: &RuleContext) -> Option<f64> {
    (ctx.exam >= PASSING_GRADE).then_some(ctx.exam)
}

fn capped_prerequisite(ctx: &RuleContext) -> Option<f64> {
    if ctx.exam >= EXCELLENT_EXAM {
        None
    } else if ctx.prerequisite >= EXAM_CREDIT_CAP {
        Some(EXAM_CREDIT_CAP)
    } else {
        Some(ctx.prerequisite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(exam: f64, prerequisite: f64, external: f64) -> RuleContext {
        RuleContext {
            exam,
            prerequisite,
            external,
            max_value: exam.max(prerequisite).max(external),
            use_dynamics: false,
        }
    }

    fn both(c: RuleContext) -> (Decision, Decision) {
        (prerequisite_credit(&c), exam_credit(&c))
    }

    // -- shared prefix ------------------------------------------------------

    #[test]
    fn failed_exam_gates_both() {
        let (p, e) = both(ctx(3.0, 7.0, 9.0));
        assert_eq!(p, Decision::no_credit(RuleId::ExamFailed));
        assert_eq!(e, Decision::no_credit(RuleId::ExamFailed));
    }

    #[test]
    fn external_dominant_credits_external() {
        // exam=5, prerequisite=5, external=7
        let (p, e) = both(ctx(5.0, 5.0, 7.0));
        assert_eq!(p.rule, RuleId::ExternalDominant);
        assert_eq!(p.credit, Some(7.0));
        assert_eq!(e.credit, Some(7.0));
    }

    #[test]
    fn external_tied_with_exam_is_not_dominant() {
        let (p, e) = both(ctx(7.0, 5.0, 7.0));
        assert_eq!(p.rule, RuleId::Otherwise);
        assert_eq!(p.credit, Some(7.0));
        assert_eq!(e, Decision::no_credit(RuleId::Otherwise));
    }

    #[test]
    fn external_tied_with_prerequisite_is_not_dominant() {
        let (p, e) = both(ctx(5.0, 7.0, 7.0));
        assert_eq!(p, Decision::no_credit(RuleId::PrerequisiteDominant));
        assert_eq!(e.rule, RuleId::PrerequisiteDominant);
        assert_eq!(e.credit, Some(7.0));
    }

    #[test]
    fn external_must_exceed_floor() {
        assert!(!external_dominant(&ctx(2.0, 1.0, 3.0)));
        assert!(external_dominant(&ctx(2.0, 1.0, 3.5)));
    }

    #[test]
    fn exam_equal_to_prerequisite_gives_nothing() {
        let (p, e) = both(ctx(6.0, 6.0, 2.0));
        assert_eq!(p, Decision::no_credit(RuleId::SameAsPrerequisite));
        assert_eq!(e, Decision::no_credit(RuleId::SameAsPrerequisite));
    }

    // -- prerequisite credit ------------------------------------------------

    #[test]
    fn failed_prerequisite_credits_exam() {
        let p = prerequisite_credit(&ctx(5.0, 3.0, 2.0));
        assert_eq!(p.rule, RuleId::PrerequisiteFailed);
        assert_eq!(p.credit, Some(5.0));
    }

    #[test]
    fn dominant_prerequisite_gives_no_prerequisite_credit() {
        let p = prerequisite_credit(&ctx(5.0, 7.0, 2.0));
        assert_eq!(p, Decision::no_credit(RuleId::PrerequisiteDominant));
    }

    #[test]
    fn exam_above_prerequisite_credits_exam() {
        let p = prerequisite_credit(&ctx(7.0, 5.0, 2.0));
        assert_eq!(p.rule, RuleId::Otherwise);
        assert_eq!(p.credit, Some(7.0));
    }

    // -- exam credit --------------------------------------------------------

    #[test]
    fn dominant_prerequisite_credits_prerequisite() {
        let e = exam_credit(&ctx(5.0, 7.0, 2.0));
        assert_eq!(e.rule, RuleId::PrerequisiteDominant);
        assert_eq!(e.credit, Some(7.0));
    }

    #[test]
    fn dominant_prerequisite_caps_at_eight() {
        let e = exam_credit(&ctx(7.0, 8.0, 3.0));
        assert_eq!(e.credit, Some(8.0));
        let e = exam_credit(&ctx(7.0, 8.5, 3.0));
        assert_eq!(e.credit, Some(8.0));
    }

    #[test]
    fn excellent_exam_under_dominant_prerequisite_gets_nothing() {
        // Reproduced as written: a strong exam grade yields no exam credit here.
        let e = exam_credit(&ctx(8.0, 8.5, 3.0));
        assert_eq!(e, Decision::no_credit(RuleId::PrerequisiteDominant));
    }

    #[test]
    fn exam_credit_otherwise_is_nothing() {
        let e = exam_credit(&ctx(7.0, 5.0, 2.0));
        assert_eq!(e, Decision::no_credit(RuleId::Otherwise));
        let e = exam_credit(&ctx(5.0, 3.0, 2.0));
        assert_eq!(e, Decision::no_credit(RuleId::Otherwise));
    }

    // -- the shadowed branch ------------------------------------------------

    #[test]
    fn relaxed_external_matches_on_its_own() {
        let c = RuleContext { use_dynamics: true, ..ctx(2.0, 1.0, 7.0) };
        assert!(relaxed_external(&c));
    }

    #[test]
    fn relaxed_external_is_dead_in_table_order() {
        // Its predicate implies ExamFailed, which sits earlier in the table.
        let c = RuleContext { use_dynamics: true, ..ctx(2.0, 1.0, 7.0) };
        let e = exam_credit(&c);
        assert_eq!(e, Decision::no_credit(RuleId::ExamFailed));

        let relaxed_at = EXAM_CREDIT_RULES
            .iter()
            .position(|r| r.id == RuleId::RelaxedExternal)
            .unwrap();
        let failed_at = EXAM_CREDIT_RULES
            .iter()
            .position(|r| r.id == RuleId::ExamFailed)
            .unwrap();
        assert!(failed_at < relaxed_at);
    }

    // -- evaluator ----------------------------------------------------------

    #[test]
    fn evaluate_without_catch_all_falls_back() {
        let table = [Rule { id: RuleId::ExamFailed, applies: exam_failed, outcome: no_credit }];
        let d = evaluate(&table, &ctx(9.0, 1.0, 1.0));
        assert_eq!(d, Decision::no_credit(RuleId::Otherwise));
    }

    #[test]
    fn tables_end_with_catch_all() {
        assert_eq!(PREREQUISITE_CREDIT_RULES.last().map(|r| r.id), Some(RuleId::Otherwise));
        assert_eq!(EXAM_CREDIT_RULES.last().map(|r| r.id), Some(RuleId::Otherwise));
    }
}

//! Code set reconciliation: three-way partition of two code collections.
//!
//! Pure and stateless. Inputs must already be normalized; comparison is
//! exact string equality. Output ordering is not part of the contract.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::CodeSet;

/// Partition of two code collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Codes present in both collections.
    pub matches: Vec<String>,
    /// Codes only in the first collection (dropped, when A is the AI set).
    pub only_a: Vec<String>,
    /// Codes only in the second collection (added, when B is the user set).
    pub only_b: Vec<String>,
}

impl Reconciliation {
    pub fn is_identical(&self) -> bool {
        self.only_a.is_empty() && self.only_b.is_empty()
    }
}

/// Compute `A ∩ B`, `A − B` and `B − A`. Repeated codes appear once.
pub fn reconcile<A, B>(set_a: &[A], set_b: &[B]) -> Reconciliation
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let in_a: HashSet<&str> = set_a.iter().map(AsRef::as_ref).collect();
    let in_b: HashSet<&str> = set_b.iter().map(AsRef::as_ref).collect();

    let mut result = Reconciliation::default();
    let mut seen = HashSet::new();
    for code in set_a.iter().map(AsRef::as_ref) {
        if !seen.insert(code) {
            continue;
        }
        if in_b.contains(code) {
            result.matches.push(code.to_string());
        } else {
            result.only_a.push(code.to_string());
        }
    }

    let mut seen = HashSet::new();
    for code in set_b.iter().map(AsRef::as_ref) {
        if seen.insert(code) && !in_a.contains(code) {
            result.only_b.push(code.to_string());
        }
    }

    result
}

/// AI value next to the clinician's value for a single-value field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleComparison {
    pub ai: String,
    pub user: String,
    pub matches: bool,
}

impl SingleComparison {
    fn new(ai: &str, user: &str) -> Self {
        Self {
            ai: ai.to_string(),
            user: user.to_string(),
            matches: ai == user,
        }
    }
}

/// Field-by-field audit view of AI codes against the submitted codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSetComparison {
    pub admit_dx: SingleComparison,
    pub pdx: SingleComparison,
    pub sdx: Reconciliation,
    pub cpt: Reconciliation,
    pub modifier: SingleComparison,
}

impl CodeSetComparison {
    pub fn is_identical(&self) -> bool {
        self.admit_dx.matches
            && self.pdx.matches
            && self.modifier.matches
            && self.sdx.is_identical()
            && self.cpt.is_identical()
    }
}

/// Retrospective comparison: which AI codes were kept, dropped or added.
pub fn compare_code_sets(ai: &CodeSet, user: &CodeSet) -> CodeSetComparison {
    CodeSetComparison {
        admit_dx: SingleComparison::new(&ai.admit_dx, &user.admit_dx),
        pdx: SingleComparison::new(&ai.pdx, &user.pdx),
        sdx: reconcile(&ai.sdx, &user.sdx),
        cpt: reconcile(&ai.cpt, &user.cpt),
        modifier: SingleComparison::new(&ai.modifier, &user.modifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn partitions_two_sets() {
        let r = reconcile(&["E11.9", "I10", "R10.9"], &["I10", "K21.9"]);
        assert_eq!(r.matches, vec!["I10"]);
        assert_eq!(sorted(r.only_a), vec!["E11.9", "R10.9"]);
        assert_eq!(r.only_b, vec!["K21.9"]);
    }

    #[test]
    fn argument_swap_swaps_differences() {
        let a = ["99213", "36415", "93000"];
        let b = ["36415", "99214"];
        let ab = reconcile(&a, &b);
        let ba = reconcile(&b, &a);
        assert_eq!(sorted(ab.matches), sorted(ba.matches));
        assert_eq!(sorted(ab.only_a), sorted(ba.only_b));
        assert_eq!(sorted(ab.only_b), sorted(ba.only_a));
    }

    #[test]
    fn order_independent_and_idempotent() {
        let r1 = reconcile(&["A", "B", "C"], &["C", "D"]);
        let r2 = reconcile(&["C", "B", "A"], &["D", "C"]);
        assert_eq!(sorted(r1.matches.clone()), sorted(r2.matches));
        assert_eq!(sorted(r1.only_a.clone()), sorted(r2.only_a));
        assert_eq!(sorted(r1.only_b.clone()), sorted(r2.only_b));

        let again = reconcile(&["A", "B", "C"], &["C", "D"]);
        assert_eq!(r1, again);
    }

    #[test]
    fn performs_no_normalization() {
        let r = reconcile(&["e11.9"], &["E11.9"]);
        assert!(r.matches.is_empty());
        assert_eq!(r.only_a, vec!["e11.9"]);
        assert_eq!(r.only_b, vec!["E11.9"]);
    }

    #[test]
    fn repeated_codes_reported_once() {
        let r = reconcile(&["I10", "I10"], &["I10"]);
        assert_eq!(r.matches, vec!["I10"]);
        assert!(r.is_identical());
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];
        let r = reconcile(&empty, &["Z00.00"]);
        assert!(r.matches.is_empty());
        assert!(r.only_a.is_empty());
        assert_eq!(r.only_b, vec!["Z00.00"]);
    }

    #[test]
    fn compare_code_sets_reports_each_field() {
        let ai = CodeSet {
            admit_dx: "R07.9".into(),
            pdx: "I21.4".into(),
            sdx: vec!["E11.9".into(), "I10".into()],
            cpt: vec!["93458".into()],
            modifier: "".into(),
        };
        let user = CodeSet {
            admit_dx: "R07.9".into(),
            pdx: "I21.19".into(),
            sdx: vec!["I10".into(), "E78.5".into()],
            cpt: vec!["93458".into()],
            modifier: "26".into(),
        };

        let cmp = compare_code_sets(&ai, &user);
        assert!(cmp.admit_dx.matches);
        assert!(!cmp.pdx.matches);
        assert_eq!(cmp.sdx.only_a, vec!["E11.9"]);
        assert_eq!(cmp.sdx.only_b, vec!["E78.5"]);
        assert!(cmp.cpt.is_identical());
        assert!(!cmp.modifier.matches);
        assert!(!cmp.is_identical());
        assert!(compare_code_sets(&ai, &ai).is_identical());
    }
}

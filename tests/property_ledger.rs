use colorbench::domain::models::{BoundObservation, Ledger};
use colorbench::services::compare;
use proptest::prelude::*;

fn observation() -> impl Strategy<Value = (usize, Option<i64>, Option<i64>)> {
    (0usize..5, proptest::option::of(0i64..50), proptest::option::of(0i64..50))
}

proptest! {
    /// Property: Merging only ever tightens
    ///
    /// After any sequence of merges, each side holds the best value seen:
    /// the max of all lower bounds and the min of all upper bounds.
    #[test]
    fn prop_merge_keeps_best_bounds(ops in prop::collection::vec(observation(), 0..40)) {
        let mut ledger = Ledger::new();
        for (i, (instance, lb, ub)) in ops.iter().enumerate() {
            let before = ledger.get(&format!("g{instance}")).cloned().unwrap_or_default();
            ledger.merge(&format!("g{instance}"), *lb, *ub, &format!("s{i}"));
            let after = ledger.get(&format!("g{instance}")).cloned().unwrap_or_default();

            if let (Some(old), Some(new)) = (before.lower(), after.lower()) {
                prop_assert!(new >= old);
            }
            if let (Some(old), Some(new)) = (before.upper(), after.upper()) {
                prop_assert!(new <= old);
            }
        }

        for instance in 0..5 {
            let seen = ops.iter().filter(|(i, _, _)| *i == instance);
            let best_lb = seen.clone().filter_map(|(_, lb, _)| *lb).max();
            let best_ub = seen.filter_map(|(_, _, ub)| *ub).min();
            let entry = ledger.get(&format!("g{instance}")).cloned().unwrap_or_default();
            prop_assert_eq!(entry.lower(), best_lb);
            prop_assert_eq!(entry.upper(), best_ub);
        }
    }

    /// Property: Replaying observations is a no-op
    ///
    /// Merging the same sequence a second time, under any source label,
    /// changes neither values nor provenance.
    #[test]
    fn prop_replay_is_idempotent(ops in prop::collection::vec(observation(), 0..40)) {
        let mut ledger = Ledger::new();
        for (instance, lb, ub) in &ops {
            ledger.merge(&format!("g{instance}"), *lb, *ub, "first");
        }
        let snapshot = ledger.clone();

        for (instance, lb, ub) in &ops {
            let outcome = ledger.merge(&format!("g{instance}"), *lb, *ub, "replay");
            prop_assert!(!outcome.changed());
        }
        prop_assert_eq!(ledger, snapshot);
    }

    /// Property: A ledger never contradicts itself
    ///
    /// Comparing a consistent ledger's own observations against it yields
    /// no inconsistencies and no improvements.
    #[test]
    fn prop_self_comparison_is_quiet(ops in prop::collection::vec(observation(), 0..40)) {
        let mut ledger = Ledger::new();
        for (instance, lb, ub) in &ops {
            // Keep every merged pair consistent.
            let (lb, ub) = match (lb, ub) {
                (Some(l), Some(u)) if l > u => (Some(*u), Some(*l)),
                _ => (*lb, *ub),
            };
            ledger.merge(&format!("g{instance}"), lb, ub, "s");
        }
        let consistent: Vec<BoundObservation> = ledger
            .observations()
            .into_iter()
            .filter(|o| !matches!((o.lower, o.upper), (Some(l), Some(u)) if l > u))
            .collect();

        let report = compare(&ledger, &consistent);
        prop_assert!(report.not_found.is_empty());
        prop_assert!(report.inconsistent.is_empty());
        prop_assert!(report.improved.is_empty());
    }
}

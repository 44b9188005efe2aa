//! Invariants that must hold for any sequence of learning and forgetting.

use std::sync::Arc;

use fabric_core::{
    Fabric, FabricConfig, Link, LinkTable, ManualClock, MemoryConfig, MemoryController, Pattern,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Reinforce(f64),
    Strengthen(f64),
    Prune { threshold: f64, decay: f64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0.0f64..0.6).prop_map(Op::Reinforce),
        (-0.5f64..1.5).prop_map(Op::Strengthen),
        (0.0f64..0.2, 0.0f64..=1.0).prop_map(|(threshold, decay)| Op::Prune { threshold, decay }),
    ]
}

proptest! {
    #[test]
    fn link_weight_stays_in_unit_interval(initial in -1.0f64..2.0, ops in prop::collection::vec(op(), 0..40)) {
        let mut table = LinkTable::new();
        table.connect(0, 1, initial);
        for op in ops {
            match op {
                Op::Reinforce(rate) => {
                    if let Some(weight) = table.weight(0, 1) {
                        let mut link = Link::new(weight);
                        link.reinforce(rate);
                        prop_assert!((0.0..=1.0).contains(&link.weight));
                    }
                }
                Op::Strengthen(w) => {
                    table.strengthen_to(0, 1, w);
                }
                Op::Prune { threshold, decay } => {
                    table.decay_and_prune(threshold, decay, || false);
                }
            }
            if let Some(weight) = table.weight(0, 1) {
                prop_assert!((0.0..=1.0).contains(&weight), "weight {weight}");
            }
            prop_assert!(table.len() <= 1);
        }
    }

    #[test]
    fn stepping_never_breaks_weight_bounds(
        links in prop::collection::vec((0usize..12, 0usize..12, 0.0f64..=1.0), 0..60),
        stimuli in prop::collection::vec(prop::collection::btree_set(0usize..12, 1..6), 1..10),
    ) {
        let fabric = Fabric::with_clock(FabricConfig::default(), Arc::new(ManualClock::new(0.0))).unwrap();
        fabric.grow(12, "a").unwrap();
        for (a, b, w) in links {
            fabric.connect(a, b, w);
        }
        for stimulus in stimuli {
            fabric.activate(stimulus, 1.5);
            let _ = fabric.step();
        }
        for link in fabric.snapshot().links {
            prop_assert!((0.0..=1.0).contains(&link.weight));
        }
    }

    #[test]
    fn connect_is_idempotent(first in 0.0f64..=1.0, second in 0.0f64..=1.0) {
        let fabric = Fabric::new(FabricConfig::default()).unwrap();
        fabric.grow(2, "a").unwrap();
        fabric.connect(0, 1, first);
        fabric.connect(0, 1, second);
        prop_assert_eq!(fabric.link_count(), 1);
        prop_assert_eq!(fabric.link_weight(0, 1), Some(first));
    }

    #[test]
    fn consolidation_needs_threshold_observations(threshold in 1usize..6, seen in 0usize..8) {
        let fabric = Arc::new(Fabric::new(FabricConfig::default()).unwrap());
        fabric.grow(8, "a").unwrap();
        let config = MemoryConfig { consolidation_threshold: threshold, ..MemoryConfig::default() };
        let memory = MemoryController::seeded(fabric, config, 3).unwrap();
        let p = Pattern::from([1, 4, 6]);
        for _ in 0..seen {
            memory.observe(p.clone());
        }
        memory.consolidate();
        prop_assert_eq!(memory.is_consolidated(&p), seen >= threshold);
    }
}

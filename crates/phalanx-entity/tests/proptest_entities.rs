//! Property tests for the entity table.
//!
//! Random sequences of create / add_ref / release / destroy / broadcast must
//! keep the manager consistent with a simple shadow model, and no handle to a
//! destroyed entity may ever resolve again.

use std::collections::HashMap;
use std::sync::Arc;

use phalanx_entity::prelude::*;
use proptest::prelude::*;

const CAPACITY: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    Create(f32),
    AddRef(usize),
    Release(usize),
    Destroy(usize),
    Damage(u32),
    Update(f32),
}

fn finite_f32() -> impl Strategy<Value = f32> {
    (-10_000i32..10_000i32).prop_map(|v| v as f32 * 0.01)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => finite_f32().prop_map(Op::Create),
        1 => (0..64usize).prop_map(Op::AddRef),
        2 => (0..64usize).prop_map(Op::Release),
        1 => (0..64usize).prop_map(Op::Destroy),
        1 => (0..60u32).prop_map(Op::Damage),
        1 => (0..100u32).prop_map(|v| Op::Update(v as f32 * 0.01)),
    ]
}

fn catalog() -> Arc<TemplateCatalog> {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(EntityTemplate::new("soldier").with_hit_points(100));
    Arc::new(catalog)
}

fn strategy() -> impl Strategy<Value = AllocationStrategy> {
    prop_oneof![
        Just(AllocationStrategy::NextFit),
        Just(AllocationStrategy::LowestFree)
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_invariants(
        allocation in strategy(),
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut m = EntityManager::new(
            catalog(),
            ManagerConfig { capacity: CAPACITY, allocation, ..ManagerConfig::default() },
        );

        // Shadow model: live handle -> refcount.
        let mut live: HashMap<EntityHandle, u32> = HashMap::new();
        let mut order: Vec<EntityHandle> = Vec::new();
        let mut dead: Vec<EntityHandle> = Vec::new();

        let pick = |order: &[EntityHandle], i: usize| -> Option<EntityHandle> {
            if order.is_empty() { None } else { Some(order[i % order.len()]) }
        };

        for op in ops {
            match op {
                Op::Create(x) => {
                    match m.create_named("soldier", Vec3::new(x, 0.0, 0.0), 0.0) {
                        Ok(h) => {
                            prop_assert!(live.len() < CAPACITY);
                            prop_assert!(!live.contains_key(&h));
                            prop_assert_eq!(m.get(h).unwrap().handle(), h);
                            live.insert(h, 1);
                            order.push(h);
                        }
                        Err(EntityError::CapacityExhausted { .. }) => {
                            prop_assert_eq!(live.len(), CAPACITY);
                        }
                        Err(e) => prop_assert!(false, "unexpected error {e}"),
                    }
                }
                Op::AddRef(i) => {
                    if let Some(h) = pick(&order, i) {
                        let count = m.add_ref(h).unwrap();
                        let shadow = live.get_mut(&h).unwrap();
                        *shadow += 1;
                        prop_assert_eq!(count, *shadow);
                    }
                }
                Op::Release(i) => {
                    if let Some(h) = pick(&order, i) {
                        let destroyed = m.release(h).unwrap();
                        let shadow = live.get_mut(&h).unwrap();
                        *shadow -= 1;
                        prop_assert_eq!(destroyed, *shadow == 0);
                        if destroyed {
                            live.remove(&h);
                            order.retain(|&o| o != h);
                            dead.push(h);
                        }
                    }
                }
                Op::Destroy(i) => {
                    if let Some(h) = pick(&order, i) {
                        m.destroy(h).unwrap();
                        live.remove(&h);
                        order.retain(|&o| o != h);
                        dead.push(h);
                    }
                }
                Op::Damage(amount) => {
                    let report = m.broadcast(&Message::Damage { amount });
                    prop_assert_eq!(report.delivered, order.len());
                    for h in report.destroyed {
                        live.remove(&h);
                        order.retain(|&o| o != h);
                        dead.push(h);
                    }
                }
                Op::Update(dt) => {
                    let report = m.update_all(dt);
                    prop_assert_eq!(report.delivered, order.len());
                    prop_assert!(report.destroyed.is_empty());
                }
            }

            // Table and shadow agree.
            prop_assert_eq!(m.len(), live.len());
            let mut expected: Vec<EntityHandle> = live.keys().copied().collect();
            expected.sort_by_key(|h| h.index());
            prop_assert_eq!(m.all_active(), expected);
            for (&h, &count) in &live {
                prop_assert_eq!(m.refcount(h).unwrap(), count);
            }

            // Dead handles never come back, even when their index is reused.
            for &h in &dead {
                prop_assert!(!m.is_valid(h));
                prop_assert!(m.get(h).is_err());
                prop_assert!(!live.contains_key(&h));
            }
        }
    }

    /// Creating, destroying and re-creating an index always yields a handle
    /// that differs from every earlier handle for that index.
    #[test]
    fn recycled_indices_get_fresh_generations(rounds in 1..40usize) {
        let mut m = EntityManager::new(catalog(), ManagerConfig::with_capacity(1));
        let mut seen = Vec::new();
        for _ in 0..rounds {
            let h = m.create_named("soldier", Vec3::ZERO, 0.0).unwrap();
            prop_assert_eq!(h.index(), 0);
            prop_assert!(!seen.contains(&h));
            seen.push(h);
            m.release(h).unwrap();
        }
    }

    /// Splitting a time step does not change where a linearly moving entity
    /// ends up.
    #[test]
    fn split_updates_match_single_update(
        tx in finite_f32(),
        tz in finite_f32(),
        dt1 in 0u32..200,
        dt2 in 0u32..200,
    ) {
        let mut c = TemplateCatalog::new();
        c.insert(EntityTemplate::new("rider").with_speed(3.0));
        let c = Arc::new(c);

        let mut split = EntityManager::new(c.clone(), ManagerConfig::with_capacity(1));
        let mut whole = EntityManager::new(c, ManagerConfig::with_capacity(1));
        let a = split.create_named("rider", Vec3::ZERO, 0.0).unwrap();
        let b = whole.create_named("rider", Vec3::ZERO, 0.0).unwrap();
        let target = Vec3::new(tx, 0.0, tz);
        split.broadcast(&Message::MoveTo { target });
        whole.broadcast(&Message::MoveTo { target });

        let (dt1, dt2) = (dt1 as f32 * 0.01, dt2 as f32 * 0.01);
        split.update_all(dt1);
        split.update_all(dt2);
        whole.update_all(dt1 + dt2);

        let pa = split.get(a).unwrap().position;
        let pb = whole.get(b).unwrap().position;
        prop_assert!(pa.approx_eq(pb, 1e-3), "{:?} vs {:?}", pa, pb);
    }
}

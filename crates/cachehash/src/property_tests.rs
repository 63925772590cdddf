//! Property-based tests for CacheHash
//!
//! Runs random operation sequences against the cache and a plain
//! `VecDeque` model of recency order (front = most recently used).

use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{CacheHash, Error};

// == Strategies ==
/// Short keys over a tiny alphabet so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..4, 1..3)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: Vec<u8>, value: u32 },
    Get { key: Vec<u8> },
    Has { key: Vec<u8> },
    Evict,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Has { key }),
        1 => Just(CacheOp::Evict),
    ]
}

/// Recency model: front is most recently used
#[derive(Default)]
struct Model {
    entries: VecDeque<(Vec<u8>, u32)>,
}

impl Model {
    fn position(&self, key: &[u8]) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn lookup(&self, key: &[u8]) -> Option<u32> {
        self.position(key).map(|pos| self.entries[pos].1)
    }

    fn touch(&mut self, key: &[u8]) -> Option<u32> {
        let pos = self.position(key)?;
        let entry = self.entries.remove(pos)?;
        let value = entry.1;
        self.entries.push_front(entry);
        Some(value)
    }
}

fn recording_cache(capacity: usize) -> (CacheHash<u32>, Rc<RefCell<Vec<u32>>>) {
    let evicted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&evicted);
    let cache = CacheHash::with_evict_callback(capacity, move |v| sink.borrow_mut().push(v));
    (cache, evicted)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Every operation keeps size within capacity and agrees with the model
    #[test]
    fn prop_matches_lru_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let (mut cache, evicted) = recording_cache(capacity);
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    if model.position(&key).is_some() {
                        prop_assert_eq!(
                            cache.try_put(&key, value),
                            Err(Error::DuplicateKey(key.len()))
                        );
                        continue;
                    }
                    let expected_evict = if model.entries.len() == capacity {
                        model.entries.pop_back().map(|(_, v)| v)
                    } else {
                        None
                    };
                    evicted.borrow_mut().clear();
                    cache.put(&key, value);
                    model.entries.push_front((key, value));
                    prop_assert_eq!(evicted.borrow().first().copied(), expected_evict);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(cache.get(&key).copied(), model.touch(&key));
                }
                CacheOp::Has { key } => {
                    prop_assert_eq!(cache.has(&key).copied(), model.lookup(&key));
                }
                CacheOp::Evict => {
                    let expected = if model.entries.len() == capacity {
                        model.entries.pop_back().map(|(_, v)| v)
                    } else {
                        None
                    };
                    prop_assert_eq!(cache.evict_if_full(), expected);
                }
            }

            prop_assert!(cache.len() <= cache.capacity());
            prop_assert_eq!(cache.len(), model.entries.len());
            prop_assert!(cache.check_invariants().is_ok());
        }

        let order: Vec<u32> = cache.iter().map(|(_, v)| *v).collect();
        let expected: Vec<u32> = model.entries.iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(order, expected);
    }

    // Peeking never changes which entry goes next
    #[test]
    fn prop_has_does_not_reorder(
        capacity in 1usize..8,
        peeks in prop::collection::vec(0usize..8, 0..20),
    ) {
        let (mut cache, evicted) = recording_cache(capacity);
        for i in 0..capacity {
            cache.put(format!("k{}", i).as_bytes(), i as u32);
        }
        for p in peeks {
            let _ = cache.has(format!("k{}", p).as_bytes());
        }

        cache.put(b"new", u32::MAX);
        prop_assert_eq!(evicted.borrow().clone(), vec![0]);
    }

    // Put then get returns the stored value while the key is resident
    #[test]
    fn prop_round_trip(entries in prop::collection::hash_map(key_strategy(), any::<u32>(), 1..10)) {
        let mut cache = CacheHash::new(entries.len());
        for (key, value) in &entries {
            cache.put(key, *value);
        }
        for (key, value) in &entries {
            prop_assert_eq!(cache.get(key), Some(value));
        }
    }

    // Teardown releases each resident value exactly once
    #[test]
    fn prop_drain_completeness(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 0..60),
    ) {
        let mut cache = CacheHash::new(capacity);
        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    let _ = cache.try_put(&key, value);
                }
                CacheOp::Get { key } => {
                    cache.get(&key);
                }
                CacheOp::Has { .. } => {}
                CacheOp::Evict => {
                    cache.evict_if_full();
                }
            }
        }

        let mut resident: Vec<u32> = cache.iter().map(|(_, v)| *v).collect();
        let mut released = Vec::new();
        cache.free_with(|v| released.push(v));

        resident.sort_unstable();
        released.sort_unstable();
        prop_assert_eq!(released, resident);
    }
}

use std::collections::BTreeMap;
use std::ops::Bound;

use proptest::prelude::*;
use rand::prelude::random;
use simplelog::{Config, LevelFilter, TestLogger};

use crate::empty::Empty;
use crate::error::LlrbError;
use crate::llrb::Llrb;

fn init_logger() {
    TestLogger::init(LevelFilter::Debug, Config::default()).ok();
}

fn load_seq(keys: &[i64]) -> (Llrb<i64, i64>, RefNodes) {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(10);
    for key in keys {
        assert!(llrb.set(*key, 10).is_none());
        refns.set(*key, 10);
    }
    (llrb, refns)
}

fn assert_iter_eq<I, J>(mut iter: I, mut iter_ref: J)
where
    I: Iterator<Item = (i64, i64)>,
    J: Iterator<Item = (i64, i64)>,
{
    loop {
        match (iter.next(), iter_ref.next()) {
            (Some(item), Some(ref_item)) => assert_eq!(item, ref_item),
            (None, None) => break,
            (Some(item), None) => panic!("invalid item: {:?}", item),
            (None, Some(ref_item)) => panic!("invalid none: {:?}", ref_item),
        }
    }
}

#[test]
fn test_id() {
    let llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    assert_eq!(llrb.id(), "test-llrb".to_string());
}

#[test]
fn test_empty() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    assert_eq!(llrb.len(), 0);
    assert!(llrb.is_empty());
    assert_eq!(llrb.height(), -1);
    assert_eq!(llrb.min(), None);
    assert_eq!(llrb.max(), None);
    assert_eq!(llrb.floor(&10), None);
    assert_eq!(llrb.ceiling(&10), None);
    assert_eq!(llrb.rank(&10), 0);
    assert_eq!(llrb.select(0), None);
    assert!(llrb.keys().is_empty());
    assert!(llrb.keys_in_range(&0, &10).is_empty());
    assert!(llrb.iter().next().is_none());

    assert_eq!(llrb.delete(&10), None);
    assert_eq!(llrb.delete_min(), None);
    assert_eq!(llrb.delete_max(), None);
    assert!(llrb.is_empty());

    let stats = llrb.validate().unwrap();
    assert_eq!(stats.entries(), 0);
    assert_eq!(stats.blacks(), Some(0));
}

#[test]
fn test_single() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    assert!(llrb.set(7, 70).is_none());
    assert_eq!(llrb.len(), 1);
    assert_eq!(llrb.height(), 0);
    assert_eq!(llrb.min(), Some(7));
    assert_eq!(llrb.max(), Some(7));
    assert!(llrb.validate().is_ok());

    assert_eq!(llrb.delete(&7), Some(70));
    assert!(llrb.is_empty());
    assert_eq!(llrb.height(), -1);
}

#[test]
fn test_create() {
    let (mut llrb, refns) = load_seq(&[2, 1, 3, 6, 5, 4, 8, 0, 9]);

    assert!(llrb.create(7, 10).is_ok());
    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    // error case, entry is left untouched.
    assert_eq!(llrb.create(7, 20), Err(LlrbError::OverwriteKey));
    assert_eq!(llrb.get(&7), Some(10));
    assert_eq!(llrb.len(), 10);

    for i in 0..7 {
        assert_eq!(llrb.get(&i), refns.get(i));
    }
}

#[test]
fn test_set() {
    let (mut llrb, mut refns) = load_seq(&[2, 1, 3, 6, 5, 4, 8, 0, 9, 7]);

    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    // overwrite returns the old value and keeps a single entry.
    assert_eq!(llrb.set(5, 500), Some(10));
    refns.set(5, 500);
    assert_eq!(llrb.set(5, 501), Some(500));
    refns.set(5, 501);
    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());

    for i in 0..10 {
        assert_eq!(llrb.get(&i), refns.get(i));
        assert!(llrb.contains(&i));
    }
    assert!(!llrb.contains(&10));
    assert_iter_eq(llrb.iter(), refns.iter());
}

#[test]
fn test_delete() {
    let (mut llrb, mut refns) = load_seq(&[2, 1, 3, 6, 5, 4, 8, 0, 9, 7]);

    // delete a missing node.
    assert!(llrb.delete(&10).is_none());
    assert!(llrb.delete(&-1).is_none());
    assert_eq!(llrb.len(), 10);
    assert!(llrb.validate().is_ok());
    assert_iter_eq(llrb.iter(), refns.iter());

    for i in 0..10 {
        let val = llrb.delete(&i);
        let refval = refns.delete(i);
        assert_eq!(val, refval);
        assert!(!llrb.contains(&i));
        assert!(llrb.validate().is_ok());
    }
    assert_eq!(llrb.len(), 0);
    assert!(llrb.iter().next().is_none());
}

#[test]
fn test_delete_scenario() {
    let mut llrb: Llrb<i64, Empty> = Llrb::new("test-llrb");
    for key in [5, 3, 8, 1, 4, 7, 9].iter() {
        llrb.set(*key, Empty);
    }
    assert_eq!(llrb.delete(&5), Some(Empty));
    assert!(llrb.validate().is_ok());
    assert!(!llrb.contains(&5));
    for key in [3, 8, 1, 4, 7, 9].iter() {
        assert!(llrb.contains(key));
    }
    assert_eq!(llrb.keys(), vec![1, 3, 4, 7, 8, 9]);
}

#[test]
fn test_delete_min_max() {
    let (mut llrb, mut refns) = load_seq(&[2, 1, 3, 6, 5, 4, 8, 0, 9, 7]);

    let mut flag = true;
    while !llrb.is_empty() {
        let (item, ref_item) = if flag {
            (llrb.delete_min(), refns.delete_min())
        } else {
            (llrb.delete_max(), refns.delete_max())
        };
        assert_eq!(item, ref_item);
        assert_eq!(llrb.len(), refns.len());
        assert!(llrb.validate().is_ok());
        flag = !flag;
    }
    assert_eq!(llrb.delete_min(), None);
    assert_eq!(llrb.delete_max(), None);
}

#[test]
fn test_sequential() {
    init_logger();

    let llrb = Llrb::load_from("test-llrb", (0..1000_i64).map(|i| (i, i * 10))).unwrap();
    assert_eq!(llrb.len(), 1000);
    assert_eq!(llrb.min(), Some(0));
    assert_eq!(llrb.max(), Some(999));
    // floor(log2(1000)) + 1
    assert!(llrb.height() <= 10, "height {}", llrb.height());
    assert_eq!(llrb.rank(&500), 500);
    assert_eq!(llrb.select(500), Some(500));
    assert_eq!(llrb.select(1000), None);
    assert_eq!(llrb.keys(), (0..1000).collect::<Vec<i64>>());

    let stats = llrb.validate().unwrap();
    assert_eq!(stats.entries(), 1000);
    assert!(stats.blacks().unwrap() > 0);
    let depths = stats.depths().unwrap();
    assert_eq!(depths.samples(), 1001);
    assert!(depths.min() <= depths.mean() && depths.mean() <= depths.max());
    assert_eq!(depths.max() as isize, llrb.height() + 1);
    assert!(depths.json().starts_with("{ \"min\": "));
    depths.pretty_print("test ");
}

#[test]
fn test_load_from_duplicate() {
    let items = vec![(1, 10), (2, 20), (1, 30)];
    match Llrb::<i64, i64>::load_from("test-llrb", items.into_iter()) {
        Err(LlrbError::OverwriteKey) => (),
        Err(err) => panic!("unexpected error {:?}", err),
        Ok(_) => panic!("expected OverwriteKey"),
    }
}

#[test]
fn test_floor_ceiling() {
    let mut llrb: Llrb<i64, Empty> = Llrb::new("test-llrb");
    for key in (0..100).map(|i| i * 2) {
        llrb.set(key, Empty);
    }
    assert_eq!(llrb.floor(&-1), None);
    assert_eq!(llrb.ceiling(&-1), Some(0));
    assert_eq!(llrb.floor(&51), Some(50));
    assert_eq!(llrb.ceiling(&51), Some(52));
    assert_eq!(llrb.floor(&52), Some(52));
    assert_eq!(llrb.ceiling(&52), Some(52));
    assert_eq!(llrb.floor(&1000), Some(198));
    assert_eq!(llrb.ceiling(&199), None);
}

#[test]
fn test_keys_in_range() {
    let mut llrb: Llrb<i64, Empty> = Llrb::new("test-llrb");
    for key in (0..100).map(|i| i * 2) {
        llrb.set(key, Empty);
    }
    let keys: Vec<i64> = (10..=20).filter(|k| k % 2 == 0).collect();
    assert_eq!(llrb.keys_in_range(&10, &20), keys);
    assert_eq!(llrb.keys_in_range(&9, &21), keys);
    assert_eq!(llrb.keys_in_range(&20, &20), vec![20]);
    assert!(llrb.keys_in_range(&21, &21).is_empty());
    assert!(llrb.keys_in_range(&20, &10).is_empty());
    assert_eq!(llrb.keys_in_range(&-100, &1000).len(), 100);
}

#[test]
fn test_string_keys() {
    let mut llrb: Llrb<String, String> = Llrb::new("test-llrb");
    for i in 0..100 {
        let key = format!("key-{:03}", i);
        llrb.set(key, format!("value-{}", i));
    }
    assert!(llrb.validate().is_ok());
    assert_eq!(llrb.get("key-042"), Some("value-42".to_string()));
    assert!(llrb.contains("key-099"));
    assert!(!llrb.contains("key-100"));
    assert_eq!(llrb.rank("key-010"), 10);
    assert_eq!(llrb.floor("key-0105"), Some("key-010".to_string()));
    assert_eq!(llrb.ceiling("key-0105"), Some("key-011".to_string()));
    assert_eq!(llrb.keys_in_range("key-010", "key-012").len(), 3);

    let range = (Bound::Included("key-095"), Bound::Unbounded);
    let items: Vec<String> = llrb.range::<str, _>(range).map(|(k, _)| k).collect();
    assert_eq!(items.len(), 5);

    assert_eq!(llrb.delete("key-042"), Some("value-42".to_string()));
    assert!(llrb.delete("key-042").is_none());
    assert_eq!(llrb.len(), 99);
    assert!(llrb.validate().is_ok());
}

// key type that cannot be formatted with `{:?}`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
struct OpaqueKey(i64);

#[test]
fn test_validate_opaque_keys() {
    init_logger();

    let mut llrb: Llrb<OpaqueKey, Empty> = Llrb::new("test-llrb");
    for key in (0..200).rev() {
        llrb.set(OpaqueKey(key), Empty);
    }
    let stats = llrb.validate().ok().unwrap();
    assert_eq!(stats.entries(), 200);
    assert!(llrb.delete(&OpaqueKey(100)).is_some());
    assert!(llrb.validate().is_ok());

    match llrb.create(OpaqueKey(10), Empty) {
        Err(err) => assert_eq!(err.kind(), "OverwriteKey"),
        Ok(_) => panic!("expected OverwriteKey"),
    }
}

#[test]
fn test_error_kind() {
    let err: LlrbError<i64> = LlrbError::SortError(10, 2);
    assert_eq!(err.kind(), "SortError");
    assert_eq!(LlrbError::<i64>::SizeMismatch(3, 2).kind(), "SizeMismatch");
    assert_eq!(LlrbError::<i64>::RedRoot.kind(), "RedRoot");
    assert_eq!(
        LlrbError::<i64>::UnbalancedBlacks("left 2 right 1".to_string()).kind(),
        "UnbalancedBlacks"
    );
}

#[test]
fn test_iter_limit() {
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    llrb.set_iter_limit(0);
    for key in 0..50 {
        llrb.set(key, key);
    }
    let keys: Vec<i64> = llrb.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, (0..50).collect::<Vec<i64>>());

    llrb.set_iter_limit(7);
    let keys: Vec<i64> = llrb.range(10..20).rev().map(|(k, _)| k).collect();
    assert_eq!(keys, (10..20).rev().collect::<Vec<i64>>());
}

#[test]
fn test_crud() {
    init_logger();

    let size = 1000;
    let mut llrb: Llrb<i64, i64> = Llrb::new("test-llrb");
    let mut refns = RefNodes::new(size);

    for _ in 0..20_000 {
        let key: i64 = (random::<i64>() % (size as i64)).abs();
        let value: i64 = random();
        let op: i64 = (random::<i64>() % 6).abs();
        match op {
            0 => {
                let ok1 = llrb.get(&key).is_none();
                let ok2 = llrb.create(key, value).is_ok();
                if ok2 {
                    refns.set(key, value);
                }
                assert_eq!(ok1, ok2);
            }
            1 => {
                let val = llrb.set(key, value);
                let refval = refns.set(key, value);
                assert_eq!(val, refval);
            }
            2 => {
                let val = llrb.delete(&key);
                let refval = refns.delete(key);
                assert_eq!(val, refval);
            }
            3 => {
                let val = llrb.get(&key);
                let refval = refns.get(key);
                assert_eq!(val, refval);
            }
            4 if random::<u8>() % 8 == 0 => {
                assert_eq!(llrb.delete_min(), refns.delete_min());
            }
            5 if random::<u8>() % 8 == 0 => {
                assert_eq!(llrb.delete_max(), refns.delete_max());
            }
            _ => (),
        };

        assert!(llrb.validate().is_ok());
        assert_eq!(llrb.len(), refns.len());
    }

    assert_iter_eq(llrb.iter(), refns.iter());
    assert_eq!(llrb.min(), refns.min());
    assert_eq!(llrb.max(), refns.max());

    for key in 0..(size as i64) {
        assert_eq!(llrb.floor(&key), refns.floor(key));
        assert_eq!(llrb.ceiling(&key), refns.ceiling(key));
        assert_eq!(llrb.rank(&key), refns.rank(key));
        assert_eq!(llrb.select(key as usize), refns.select(key as usize));
    }

    // ranges and reverses
    for _ in 0..1_000 {
        let (low, high) = random_low_high(size);

        assert_iter_eq(llrb.range((low, high)), refns.range(low, high));
        assert_iter_eq(llrb.range((low, high)).rev(), refns.reverse(low, high));

        if let (Bound::Included(low), Bound::Included(high)) = (low, high) {
            let keys = llrb.keys_in_range(&low, &high);
            assert_eq!(keys, refns.keys_in_range(low, high));
            let mut stream = llrb.stream(&low, &high);
            let keys: Vec<i64> = stream.iter(&llrb).collect();
            assert_eq!(keys, refns.keys_in_range(low, high));
        }
    }
}

fn key_strategy() -> impl Strategy<Value = i64> {
    -500_i64..500
}

#[derive(Clone, Debug)]
enum MapOp {
    Set(i64, i64),
    Delete(i64),
    DeleteMin,
    DeleteMax,
}

fn map_op_strategy() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        4 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| MapOp::Set(k, v)),
        3 => key_strategy().prop_map(MapOp::Delete),
        1 => Just(MapOp::DeleteMin),
        1 => Just(MapOp::DeleteMax),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replays random writes on both Llrb and BTreeMap, the tree must
    /// stay valid and agree with the oracle after every step.
    #[test]
    fn ops_match_btreemap(ops in proptest::collection::vec(map_op_strategy(), 1..400)) {
        let mut llrb: Llrb<i64, i64> = Llrb::new("prop-llrb");
        let mut btmap: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops.iter() {
            match op {
                MapOp::Set(k, v) => {
                    prop_assert_eq!(llrb.set(*k, *v), btmap.insert(*k, *v));
                }
                MapOp::Delete(k) => {
                    prop_assert_eq!(llrb.delete(k), btmap.remove(k));
                }
                MapOp::DeleteMin => {
                    let key = btmap.keys().next().cloned();
                    let item = key.and_then(|k| btmap.remove(&k).map(|v| (k, v)));
                    prop_assert_eq!(llrb.delete_min(), item);
                }
                MapOp::DeleteMax => {
                    let key = btmap.keys().next_back().cloned();
                    let item = key.and_then(|k| btmap.remove(&k).map(|v| (k, v)));
                    prop_assert_eq!(llrb.delete_max(), item);
                }
            }
            prop_assert!(llrb.validate().is_ok());
            prop_assert_eq!(llrb.len(), btmap.len());
        }

        let keys: Vec<i64> = btmap.keys().cloned().collect();
        prop_assert_eq!(llrb.keys(), keys);
    }

    /// rank(select(r)) == r for every valid rank.
    #[test]
    fn rank_select_inverse(keys in proptest::collection::vec(key_strategy(), 0..300)) {
        let mut llrb: Llrb<i64, Empty> = Llrb::new("prop-llrb");
        for key in keys.iter() {
            llrb.set(*key, Empty);
        }
        for r in 0..llrb.len() {
            let key = llrb.select(r).unwrap();
            prop_assert_eq!(llrb.rank(&key), r);
        }
        prop_assert_eq!(llrb.select(llrb.len()), None);
    }

    /// floor(q) <= q <= ceiling(q) whenever both exist.
    #[test]
    fn floor_ceiling_sandwich(
        keys in proptest::collection::vec(key_strategy(), 1..300),
        queries in proptest::collection::vec(-600_i64..600, 1..50),
    ) {
        let mut llrb: Llrb<i64, Empty> = Llrb::new("prop-llrb");
        for key in keys.iter() {
            llrb.set(*key, Empty);
        }
        for q in queries.iter() {
            let (floor, ceiling) = (llrb.floor(q), llrb.ceiling(q));
            if let Some(floor) = floor {
                prop_assert!(floor <= *q);
            }
            if let Some(ceiling) = ceiling {
                prop_assert!(*q <= ceiling);
            }
            prop_assert_eq!(floor.is_none(), *q < llrb.min().unwrap());
            prop_assert_eq!(ceiling.is_none(), *q > llrb.max().unwrap());
        }
    }

    /// Inserting distinct keys and deleting all of them leaves an
    /// empty tree.
    #[test]
    fn delete_completeness(keys in proptest::collection::btree_set(key_strategy(), 0..300)) {
        let mut llrb: Llrb<i64, Empty> = Llrb::new("prop-llrb");
        for key in keys.iter() {
            llrb.set(*key, Empty);
        }
        prop_assert_eq!(llrb.len(), keys.len());
        for key in keys.iter() {
            prop_assert_eq!(llrb.delete(key), Some(Empty));
            prop_assert!(llrb.validate().is_ok());
        }
        prop_assert_eq!(llrb.len(), 0);
        for key in keys.iter() {
            prop_assert!(!llrb.contains(key));
        }
    }
}

include!("./ref_test.rs");

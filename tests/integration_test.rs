//! End-to-end coverage of `Monotree` across backends and hashers,
//! exercising the testable properties from spec §8.
use monotree::database::MemoryDB;
use monotree::hasher::{Blake2b, Blake2s, Blake3, Sha2, Sha3};
use monotree::utils::{random_hash, random_hashes, shuffle};
use monotree::{verify_proof, Hash, Hasher, Monotree, Result};

/// Surfaces `log::debug!`/`log::warn!` (batch boundaries, `BrokenTrie`) on
/// the terminal when running this suite with a failing case to chase down.
/// `TermLogger::init` errors if called twice in one process, which a
/// multi-`#[test]` binary will do, so the result is discarded.
fn init_logger() {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::ConfigBuilder::new().build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}

fn fill<D: monotree::Database, H: Hasher>(
    tree: &mut Monotree<D, H>,
    n: usize,
) -> Result<(Option<Hash>, Vec<Hash>, Vec<Hash>)> {
    let keys = random_hashes(n);
    let leaves = random_hashes(n);
    let mut root = None;
    for (k, v) in keys.iter().zip(leaves.iter()) {
        root = tree.insert(root.as_ref(), k, v)?;
    }
    Ok((root, keys, leaves))
}

macro_rules! hasher_suite {
    ($name:ident, $hasher:ty) => {
        #[test]
        fn $name() -> Result<()> {
            let mut tree = Monotree::<MemoryDB, $hasher>::new("memdb");
            let (root, keys, leaves) = fill(&mut tree, 150)?;
            assert_ne!(root, None);

            let hasher = <$hasher as Hasher>::new();
            for (k, v) in keys.iter().zip(leaves.iter()) {
                assert_eq!(tree.get(root.as_ref(), k)?, Some(*v));
                let proof = tree.get_merkle_proof(root.as_ref(), k)?;
                assert!(verify_proof(&hasher, root.as_ref(), Some(v), &proof));
            }
            Ok(())
        }
    };
}

hasher_suite!(round_trips_with_blake3, Blake3);
hasher_suite!(round_trips_with_blake2s, Blake2s);
hasher_suite!(round_trips_with_blake2b, Blake2b);
hasher_suite!(round_trips_with_sha2, Sha2);
hasher_suite!(round_trips_with_sha3, Sha3);

#[test]
fn order_independence_holds_under_shuffling() -> Result<()> {
    let n = 300;
    let keys = random_hashes(n);
    let leaves = random_hashes(n);

    let mut sequential = Monotree::<MemoryDB, Blake3>::new("memdb");
    let mut root = None;
    for (k, v) in keys.iter().zip(leaves.iter()) {
        root = sequential.insert(root.as_ref(), k, v)?;
    }

    let mut pairs: Vec<(Hash, Hash)> = keys.iter().zip(leaves.iter()).map(|(k, v)| (*k, *v)).collect();
    shuffle(&mut pairs);

    let mut shuffled = Monotree::<MemoryDB, Blake3>::new("memdb");
    let mut root_shuffled = None;
    for (k, v) in pairs.iter() {
        root_shuffled = shuffled.insert(root_shuffled.as_ref(), k, v)?;
    }

    assert_eq!(root, root_shuffled);
    Ok(())
}

#[test]
fn overwriting_a_key_updates_the_leaf_without_new_keys() -> Result<()> {
    let mut tree = Monotree::<MemoryDB, Blake3>::new("memdb");
    let (root, keys, leaves) = fill(&mut tree, 50)?;
    let key = keys[10];
    let old_leaf = leaves[10];
    let new_leaf = random_hash();
    assert_eq!(tree.get(root.as_ref(), &key)?, Some(old_leaf));

    let root2 = tree.insert(root.as_ref(), &key, &new_leaf)?;
    assert_eq!(tree.get(root2.as_ref(), &key)?, Some(new_leaf));

    for (k, v) in keys.iter().zip(leaves.iter()) {
        if *k != key {
            assert_eq!(tree.get(root2.as_ref(), k)?, Some(*v));
        }
    }
    Ok(())
}

#[test]
fn absent_key_yields_none_and_unverifiable_proof() -> Result<()> {
    let mut tree = Monotree::<MemoryDB, Blake3>::new("memdb");
    let (root, _keys, _leaves) = fill(&mut tree, 80)?;
    let absent = random_hash();
    assert_eq!(tree.get(root.as_ref(), &absent)?, None);

    let hasher = Blake3::new();
    let bogus_leaf = random_hash();
    let proof = tree.get_merkle_proof(root.as_ref(), &absent)?;
    assert!(!verify_proof(&hasher, root.as_ref(), Some(&bogus_leaf), &proof));
    Ok(())
}

#[test]
fn batch_insert_equals_sequential_insert() -> Result<()> {
    init_logger();
    let n = 512;
    let keys = random_hashes(n);
    let leaves = random_hashes(n);

    let mut sequential = Monotree::<MemoryDB, Blake3>::new("memdb");
    let mut root_seq = None;
    for (k, v) in keys.iter().zip(leaves.iter()) {
        root_seq = sequential.insert(root_seq.as_ref(), k, v)?;
    }

    let mut batched = Monotree::<MemoryDB, Blake3>::new("memdb");
    let root_batch = batched.inserts(None, &keys, &leaves)?;

    assert_eq!(root_seq, root_batch);
    Ok(())
}

#[test]
fn fewer_db_writes_than_a_fixed_depth_sparse_merkle_tree() -> Result<()> {
    // Property S4: Monotree's radix compression should need strictly fewer
    // backing-store writes than a naive depth-H SMT for the same workload,
    // once enough keys share long common prefixes to collapse.
    use monotree::smt::VanillaSmt;

    let n = 400;
    let keys = random_hashes(n);
    let leaves = random_hashes(n);

    let mut mono = Monotree::<MemoryDB, Blake3>::new("memdb");
    let mut root = None;
    for (k, v) in keys.iter().zip(leaves.iter()) {
        root = mono.insert(root.as_ref(), k, v)?;
    }
    assert_ne!(root, None);

    let mut smt = VanillaSmt::<MemoryDB, Blake3>::new("memdb");
    let mut smt_root = smt.new_tree()?;
    for (k, v) in keys.iter().zip(leaves.iter()) {
        smt_root = smt.insert(&smt_root, k, v)?;
    }

    assert!(mono.db_writes() < smt.db_writes());
    Ok(())
}

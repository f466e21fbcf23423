use monotree::database::rocksdb::RocksDB;
use monotree::hasher::*;
use monotree::utils::*;
use monotree::*;

fn main() -> Result<()> {
    // Init a monotree instance with a database and hash function
    //
    // Monotree::<DATABASE, HASHER>::new(DB_PATH)
    //      where DATABASE = {MemoryDB, RocksDB, Sled}
    //            HASHER = {Blake3, Blake2s, Blake2b, Sha2, Sha3}
    let mut tree = Monotree::<RocksDB, Blake2b>::new("/tmp/monotree");

    // It is natural the tree root initially has 'None'
    let root = None;

    // Prepare 500 random pairs of key and leaf.
    // random_hash(SIZE) creates a vector of fixed-length random array of 32 bytes.
    let n = 500;
    let keys = random_hashes(n);
    let leaves = random_hashes(n);

    // Insert a vector of entries of (key, leaf) into tree.
    // 'inserts()' is significantly faster than 'insert()' for the following reason.
    // (1) batch writes, (2) chunking keys prior to insertion, and (3) in-memory caching
    let root = tree.inserts(root.as_ref(), &keys, &leaves)?;
    assert_ne!(root, None);

    // Similarly, `gets()` is designed for batch usage.
    let result = tree.gets(root.as_ref(), &keys)?;
    assert_eq!(result.len(), keys.len());

    /////////////////////////////////////////////////////////////////////
    // `Merkle proof` section: verifying inclusion of data (inclusion proof)

    // `Monotree` has compressed representations, but it fully retains
    // the core property of the Sparse Merkle Tree (SMT).
    // Thus, `non-inclusion proof` is quite straightforward. Just go walk down
    // the tree with a key (or a path) given. If we cannot successfully get a leaf,
    // we can assure that the leaf is not a part of the tree.
    // The process of inclusion proof is outlined below:

    // pick a random key from the keys among inserted just before
    let key = keys[99];

    // generate a Merkle proof for a given root and key.
    let proof = tree.get_merkle_proof(root.as_ref(), &key)?;

    // To verify the proof correctly, you need to provide a hasher matched
    // Previously the tree was initialized with `Blake2b`
    let hasher = Blake2b::new();

    // get a leaf matched with the key: where the Merkle proof verification starts off
    let leaf = leaves[99];

    // verify the Merkle proof using all those above
    let verified = verify_proof(&hasher, root.as_ref(), Some(&leaf), proof.as_ref());
    assert_eq!(verified, true);

    /////////////////////////////////////////////////////////////////////
    // Tracking the latest root(state)
    //
    // set the latest state or root to the database
    tree.set_headroot(root.as_ref())?;

    // get the lastest state or root from the database
    let headroot = tree.get_headroot()?;
    assert_eq!(headroot, root);

    /////////////////////////////////////////////////////////////////////
    // Usage examples with some functional tests
    // Carefully trace the variable `root` as they are frequently shadowed.

    let mut tree = Monotree::default();
    let mut root = None;
    let hasher = Blake3::new();

    //--- insert/get and gen_proof/verify_proof over iterator
    for (i, (key, value)) in keys.iter().zip(leaves.iter()).enumerate() {
        // insert a key into tree
        root = tree.insert(root.as_ref(), key, value)?;

        // inserted a key and yields a root, where cumulative check-up goes on
        for (k, v) in keys.iter().zip(leaves.iter()).take(i + 1) {
            // check if the key-value pair was correctly inserted so far
            assert_eq!(tree.get(root.as_ref(), k)?, Some(*v));

            // generates a Merkle proof with all keys so far
            let proof = tree.get_merkle_proof(root.as_ref(), k)?;

            // verify the Merkle proof with all keys so far
            assert_eq!(
                verify_proof(&hasher, root.as_ref(), Some(v), proof.as_ref()),
                true
            );
        }
    }
    assert_ne!(root, None);

    //--- non-inclusion proof for a key that was never inserted
    let absent_key = random_hash();
    assert_eq!(tree.get(root.as_ref(), &absent_key)?, None);
    let proof = tree.get_merkle_proof(root.as_ref(), &absent_key)?;
    assert_eq!(
        verify_proof(&hasher, root.as_ref(), None, proof.as_ref()),
        false
    );

    //--- faster way to insert many entries at once
    // Starting from an empty tree again, redo the bulk insert above using
    // the batch-oriented method.
    let mut tree = Monotree::default();
    let root = tree.inserts(None, &keys, &leaves)?;
    assert_ne!(root, None);

    // Even if we shuffle the (key, leaf) pairs before inserting them into
    // a fresh tree,
    let mut pairs: Vec<(Hash, Hash)> = keys.iter().zip(leaves.iter()).map(|(k, v)| (*k, *v)).collect();
    shuffle(&mut pairs);
    let shuffled_keys: Vec<Hash> = pairs.iter().map(|(k, _)| *k).collect();
    let shuffled_leaves: Vec<Hash> = pairs.iter().map(|(_, v)| *v).collect();
    let mut tree2 = Monotree::default();
    let root2 = tree2.inserts(None, &shuffled_keys, &shuffled_leaves)?;

    // the resulting root is the same — insertion order never affects the
    // final tree.
    assert_eq!(root, root2);

    Ok(())
}

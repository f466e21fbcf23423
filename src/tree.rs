//! Monotree: path-compressed binary Merkle trie (spec §4.3).
//!
//! Ported algorithmically from `original_source/monotree.py`'s `Monotree`
//! class (the reference this crate's design was distilled from): `put`,
//! `get`, `get_proof`/`encode_proof` carry over case-for-case, rewritten
//! against this crate's owned [`Bits`]/[`Node`] types instead of Python
//! bit-strings and raw byte slices.
use crate::bits::Bits;
use crate::node::{Node, Unit};
use crate::utils::slice_to_hash;
use crate::{Database, Hash, Hasher, Proof, Result, ROOT_KEY};

/// A radix-compressed Merkle trie over `D`, hashed with `H`.
///
/// `D` and `H` are the only configuration surface (spec §6: no wire
/// protocol, no config file, no environment variables); `dbpath` is
/// forwarded straight to `D::new`.
pub struct Monotree<D: Database, H: Hasher> {
    db: D,
    hasher: H,
}

impl<D: Database, H: Hasher> Monotree<D, H> {
    pub fn new(dbpath: &str) -> Self {
        Monotree {
            db: D::new(dbpath),
            hasher: H::new(),
        }
    }

    /// The empty tree's root is always `nil` (`None`); this exists purely
    /// as a named entry point mirroring the teacher's demos, which call
    /// it once before the first insert.
    pub fn new_tree(&mut self) -> Result<Option<Hash>> {
        Ok(None)
    }

    /// Opens a write batch: puts issued by `insert`/`inserts` until the
    /// matching `commit` are buffered and read-your-writes via the
    /// `Database`'s in-memory overlay (spec §4.1).
    pub fn prepare(&mut self) -> Result<()> {
        self.db.init_batch()
    }

    /// Closes a write batch opened with `prepare`, flushing buffered puts
    /// to the backing store atomically from its perspective.
    pub fn commit(&mut self) -> Result<()> {
        self.db.finish_batch()
    }

    fn put_node(&mut self, primary: Unit, other: Option<Unit>) -> Result<Hash> {
        let node = match other {
            None => Node::Soft(primary),
            Some(sibling) => Node::hard(primary, sibling),
        };
        let bytes = node.to_bytes();
        let hash = self.hasher.digest(&bytes);
        self.db.put(&hash, bytes)?;
        Ok(hash)
    }

    fn read_node(&mut self, hash: &Hash) -> Result<Node> {
        let bytes = self.db.get(hash)?.ok_or_else(|| {
            log::warn!("monotree: descent hit a hash absent from the store");
            crate::Errors::BrokenTrie("dangling node pointer".into())
        })?;
        Node::from_bytes(&bytes)
    }

    /// Reads the node at `hash` and splits it into the edge matching
    /// `bits`'s leading bit (the child to descend into) and, for a hard
    /// node, the other edge (the sibling). A soft node has no sibling.
    fn descend(&mut self, hash: &Hash, bits: &Bits) -> Result<(Unit, Option<Unit>)> {
        match self.read_node(hash)? {
            Node::Soft(u) => Ok((u, None)),
            Node::Hard(l, r) => {
                if bits.is_right() {
                    Ok((r, Some(l)))
                } else {
                    Ok((l, Some(r)))
                }
            }
        }
    }

    /// `insert(root, key, leaf) -> root'` (spec §4.3.2).
    pub fn insert(
        &mut self,
        root: Option<&Hash>,
        key: &Hash,
        leaf: &Hash,
    ) -> Result<Option<Hash>> {
        let bits = Bits::from_bytes_full(key);
        let new_root = match root {
            None => self.put_node(
                Unit {
                    hash: *leaf,
                    bits,
                },
                None,
            )?,
            Some(root) => self.put(root, &bits, leaf)?,
        };
        Ok(Some(new_root))
    }

    fn put(&mut self, h: &Hash, bits: &Bits, leaf: &Hash) -> Result<Hash> {
        let (child, sibling) = self.descend(h, bits)?;
        let n = child.bits.lcp(bits);

        // Case A: full mismatch. Only reachable at a soft node — a hard
        // node's matched child always shares at least the leading
        // direction bit with `bits` by construction, so `sibling` is
        // always `None` here.
        if n == 0 {
            let new_leaf = Unit {
                hash: *leaf,
                bits: bits.clone(),
            };
            return self.put_node(child, Some(new_leaf));
        }

        // Case B: the whole remaining key is consumed by this edge —
        // overwrite the child hash, keep the edge label and sibling.
        if n == bits.len() {
            let replaced = Unit {
                hash: *leaf,
                bits: child.bits.clone(),
            };
            return self.put_node(replaced, sibling);
        }

        // Case C: the edge is fully consumed but key bits remain —
        // recurse, keep the edge label and sibling.
        if n == child.bits.len() {
            let recursed = self.put(&child.hash, &bits.shift(n), leaf)?;
            let updated = Unit {
                hash: recursed,
                bits: child.bits.clone(),
            };
            return self.put_node(updated, sibling);
        }

        // Case D: partial mismatch — split into an inner hard node
        // holding the old edge's tail and the new leaf's tail, then
        // shorten this edge down to the shared prefix.
        let split_old = Unit {
            hash: child.hash,
            bits: child.bits.shift(n),
        };
        let split_new = Unit {
            hash: *leaf,
            bits: bits.shift(n),
        };
        let inner = self.put_node(split_old, Some(split_new))?;
        let shortened = Unit {
            hash: inner,
            bits: child.bits.prefix(n),
        };
        self.put_node(shortened, sibling)
    }

    /// Batch insert (spec §4.3.5): chunks `keys`/`leaves` into groups of
    /// `batch_size`, wrapping each group in `prepare`/`commit`.
    pub fn inserts(
        &mut self,
        root: Option<&Hash>,
        keys: &[Hash],
        leaves: &[Hash],
    ) -> Result<Option<Hash>> {
        self.inserts_chunked(root, keys, leaves, 20)
    }

    pub fn inserts_chunked(
        &mut self,
        root: Option<&Hash>,
        keys: &[Hash],
        leaves: &[Hash],
        batch_size: usize,
    ) -> Result<Option<Hash>> {
        let mut root = root.copied();
        let key_chunks = crate::utils::chunks(keys, batch_size);
        let leaf_chunks = crate::utils::chunks(leaves, batch_size);
        for (key_chunk, leaf_chunk) in key_chunks.iter().zip(leaf_chunks.iter()) {
            self.prepare()?;
            for (key, leaf) in key_chunk.iter().zip(leaf_chunk.iter()) {
                root = self.insert(root.as_ref(), key, leaf)?;
            }
            self.commit()?;
        }
        Ok(root)
    }

    /// `get(root, key)` (spec §4.3.1). `None` means the key is absent.
    pub fn get(&mut self, root: Option<&Hash>, key: &Hash) -> Result<Option<Hash>> {
        let root = match root {
            None => return Ok(None),
            Some(r) => r,
        };
        let bits = Bits::from_bytes_full(key);
        self.get_recursive(root, &bits)
    }

    fn get_recursive(&mut self, h: &Hash, bits: &Bits) -> Result<Option<Hash>> {
        let (child, _sibling) = self.descend(h, bits)?;
        let n = child.bits.lcp(bits);
        if n == bits.len() {
            return Ok(Some(child.hash));
        }
        if n == child.bits.len() {
            return self.get_recursive(&child.hash, &bits.shift(n));
        }
        Ok(None)
    }

    pub fn gets(&mut self, root: Option<&Hash>, keys: &[Hash]) -> Result<Vec<Option<Hash>>> {
        keys.iter().map(|key| self.get(root, key)).collect()
    }

    /// `prove(root, key)` (spec §4.3.3). Empty for the empty tree.
    pub fn get_merkle_proof(&mut self, root: Option<&Hash>, key: &Hash) -> Result<Proof> {
        let root = match root {
            None => return Ok(Vec::new()),
            Some(r) => r,
        };
        let bits = Bits::from_bytes_full(key);
        let mut proof = Vec::new();
        self.get_proof_recursive(root, &bits, &mut proof)?;
        Ok(proof)
    }

    fn get_proof_recursive(&mut self, h: &Hash, bits: &Bits, proof: &mut Proof) -> Result<()> {
        let (child, sibling) = self.descend(h, bits)?;
        let n = child.bits.lcp(bits);
        if n == bits.len() {
            let node = match sibling {
                None => Node::Soft(child),
                Some(s) => Node::hard(child, s),
            };
            proof.push(encode_proof(&node, bits));
            return Ok(());
        }
        if n == child.bits.len() {
            let node = match sibling {
                None => Node::Soft(child.clone()),
                Some(s) => Node::hard(child.clone(), s),
            };
            proof.push(encode_proof(&node, bits));
            return self.get_proof_recursive(&child.hash, &bits.shift(n), proof);
        }
        // mismatch: key absent, proof truncated at the point of divergence
        Ok(())
    }

    /// Stashes `root` under the reserved [`ROOT_KEY`], so an embedder that
    /// only persists `(hash -> node bytes)` pairs has a canonical place to
    /// recover the latest root hash from.
    pub fn set_headroot(&mut self, root: Option<&Hash>) -> Result<()> {
        let bytes = root.map(|r| r.to_vec()).unwrap_or_default();
        self.db.put(ROOT_KEY, bytes)
    }

    pub fn get_headroot(&mut self) -> Result<Option<Hash>> {
        match self.db.get(ROOT_KEY)? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(slice_to_hash(&bytes))),
            _ => Ok(None),
        }
    }

    /// Backing-store read/write counters (spec §8 property S4), forwarded
    /// from the underlying [`Database`]. Zero for backends that don't
    /// track them.
    pub fn db_reads(&self) -> usize {
        self.db.reads()
    }

    pub fn db_writes(&self) -> usize {
        self.db.writes()
    }
}

impl Default for Monotree<crate::DefaultDatabase, crate::DefaultHasher> {
    fn default() -> Self {
        Monotree::new("memdb")
    }
}

/// Encodes a proof step for the node just visited (spec §4.3.3). `bits`
/// is the query BitString at this level — its leading bit is what decided
/// a hard-node descent direction.
fn encode_proof(node: &Node, bits: &Bits) -> (bool, Vec<u8>) {
    let bytes = node.to_bytes();
    match node {
        Node::Soft(_) => (false, bytes[crate::HASH_LEN..].to_vec()),
        Node::Hard(..) => {
            if bits.is_right() {
                let mut cut = bytes[..bytes.len() - crate::HASH_LEN - 1].to_vec();
                cut.push(0x01);
                (true, cut)
            } else {
                (false, bytes[crate::HASH_LEN..].to_vec())
            }
        }
    }
}

/// Stateless proof verification (spec §4.3.4): recomputes the root from
/// `(leaf, proof)` alone, without any store access. `leaf = None` is the
/// nil sentinel, not a special case of `Hash` — this covers the empty-tree
/// vacuous match (spec §8 property 6) directly instead of overloading a
/// concrete all-zero `Hash`.
pub fn verify_proof<H: Hasher>(
    hasher: &H,
    root: Option<&Hash>,
    leaf: Option<&Hash>,
    proof: &[(bool, Vec<u8>)],
) -> bool {
    let mut h: Vec<u8> = leaf.map(|l| l.to_vec()).unwrap_or_default();
    for (prefix, cut) in proof.iter().rev() {
        h = if !*prefix {
            hasher.digest(&[h.as_slice(), cut.as_slice()].concat()).to_vec()
        } else {
            if cut.is_empty() {
                return false;
            }
            let split = cut.len() - 1;
            let combined = [&cut[..split], h.as_slice(), &cut[split..]].concat();
            hasher.digest(&combined).to_vec()
        };
    }
    match root {
        Some(r) => h.as_slice() == r.as_slice(),
        None => h.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryDB;
    use crate::hasher::Blake3;
    use crate::utils::random_hash;

    fn tree() -> Monotree<MemoryDB, Blake3> {
        Monotree::new("memdb")
    }

    #[test]
    fn single_insert_round_trips() {
        let mut t = tree();
        let (key, leaf) = (random_hash(), random_hash());
        let root = t.insert(None, &key, &leaf).unwrap();
        assert_ne!(root, None);
        assert_eq!(t.get(root.as_ref(), &key).unwrap(), Some(leaf));
    }

    #[test]
    fn proof_roundtrips_for_many_keys() {
        let mut t = tree();
        let n = 200;
        let keys = random_hash_vec(n);
        let leaves = random_hash_vec(n);
        let mut root = None;
        for (k, v) in keys.iter().zip(leaves.iter()) {
            root = t.insert(root.as_ref(), k, v).unwrap();
        }
        let hasher = Blake3::new();
        for (k, v) in keys.iter().zip(leaves.iter()) {
            assert_eq!(t.get(root.as_ref(), k).unwrap(), Some(*v));
            let proof = t.get_merkle_proof(root.as_ref(), k).unwrap();
            assert!(verify_proof(&hasher, root.as_ref(), Some(v), &proof));
        }
    }

    #[test]
    fn order_independence() {
        let n = 100;
        let keys = random_hash_vec(n);
        let leaves = random_hash_vec(n);

        let mut forward = tree();
        let mut root_fwd = None;
        for (k, v) in keys.iter().zip(leaves.iter()) {
            root_fwd = forward.insert(root_fwd.as_ref(), k, v).unwrap();
        }

        let mut backward = tree();
        let mut root_bwd = None;
        for (k, v) in keys.iter().zip(leaves.iter()).rev() {
            root_bwd = backward.insert(root_bwd.as_ref(), k, v).unwrap();
        }

        assert_eq!(root_fwd, root_bwd);
    }

    #[test]
    fn root_stability_on_repeat_insert() {
        let mut t = tree();
        let (key, leaf) = (random_hash(), random_hash());
        let root1 = t.insert(None, &key, &leaf).unwrap();
        let root2 = t.insert(root1.as_ref(), &key, &leaf).unwrap();
        assert_eq!(root1, root2);
    }

    #[test]
    fn empty_tree_semantics() {
        let mut t = tree();
        let key = random_hash();
        assert_eq!(t.get(None, &key).unwrap(), None);
        let proof = t.get_merkle_proof(None, &key).unwrap();
        assert!(proof.is_empty());
        let hasher = Blake3::new();
        assert!(verify_proof(&hasher, None, None, &proof));
        assert!(!verify_proof(&hasher, None, Some(&key), &proof));
    }

    #[test]
    fn proof_binding_rejects_wrong_leaf() {
        let mut t = tree();
        let (key, leaf) = (random_hash(), random_hash());
        let root = t.insert(None, &key, &leaf).unwrap();
        let proof = t.get_merkle_proof(root.as_ref(), &key).unwrap();
        let hasher = Blake3::new();
        let other = random_hash();
        assert!(verify_proof(&hasher, root.as_ref(), Some(&leaf), &proof));
        assert!(!verify_proof(&hasher, root.as_ref(), Some(&other), &proof));
    }

    #[test]
    fn tampered_proof_fails_verification() {
        let mut t = tree();
        let n = 30;
        let keys = random_hash_vec(n);
        let leaves = random_hash_vec(n);
        let mut root = None;
        for (k, v) in keys.iter().zip(leaves.iter()) {
            root = t.insert(root.as_ref(), k, v).unwrap();
        }
        let key = keys[0];
        let leaf = leaves[0];
        let mut proof = t.get_merkle_proof(root.as_ref(), &key).unwrap();
        // flip a bit in the first cut that has any bytes
        if let Some((_, cut)) = proof.iter_mut().find(|(_, c)| !c.is_empty()) {
            cut[0] ^= 0xff;
        }
        let hasher = Blake3::new();
        assert!(!verify_proof(&hasher, root.as_ref(), Some(&leaf), &proof));
    }

    #[test]
    fn batch_insert_matches_sequential_insert() {
        let n = 64;
        let keys = random_hash_vec(n);
        let leaves = random_hash_vec(n);

        let mut sequential = tree();
        let mut root_seq = None;
        for (k, v) in keys.iter().zip(leaves.iter()) {
            root_seq = sequential.insert(root_seq.as_ref(), k, v).unwrap();
        }

        let mut batched = tree();
        let root_batch = batched
            .inserts_chunked(None, &keys, &leaves, 7)
            .unwrap();

        assert_eq!(root_seq, root_batch);
    }

    #[test]
    fn headroot_round_trips() {
        let mut t = tree();
        let (key, leaf) = (random_hash(), random_hash());
        let root = t.insert(None, &key, &leaf).unwrap();
        t.set_headroot(root.as_ref()).unwrap();
        assert_eq!(t.get_headroot().unwrap(), root);
    }

    fn random_hash_vec(n: usize) -> Vec<Hash> {
        crate::utils::random_hashes(n)
    }
}

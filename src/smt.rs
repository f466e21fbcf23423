//! Two fixed-depth Sparse Merkle Tree baselines (spec §4.4, §4.5), kept
//! for comparison against [`crate::Monotree`]'s radix-compressed trie.
//! Ported from `original_source/vanilla_smt.py` and `cached_smt.py`.
//!
//! Both trees have depth `H = 8 * HASH_LEN` and a root that always exists
//! — unlike `Monotree`'s `Option<Hash>`, the all-nil tree still has a real
//! (precomputable) root hash, so `root()` returns `Hash`, not
//! `Option<Hash>`.
use crate::bits::Bits;
use crate::utils::slice_to_hash;
use crate::{Database, Errors, Hash, Hasher, Result, HASH_LEN};

/// Tree depth in bits: one level per bit of a full-width key.
pub const DEPTH: usize = HASH_LEN * 8;

/// A root-to-leaf sibling path. Unlike `Monotree`'s `Proof`, an untouched
/// branch's deepest sibling is the empty byte string (nil), which a fixed
/// `[u8; HASH_LEN]` can't represent — hence `Vec<u8>` per level rather
/// than `Hash`.
pub type SiblingPath = Vec<Vec<u8>>;

fn nil() -> Vec<u8> {
    Vec::new()
}

/// Splits a stored `2*HASH_LEN`-byte pair `(left ‖ right)` into the half
/// matching `right`. Mirrors the Python reference's permissive slicing of
/// a possibly-empty stored value (the degenerate last step down an
/// all-nil branch, where the stored pair is itself `nil ‖ nil = b""`).
fn half(pair: &[u8], right: bool) -> Vec<u8> {
    if pair.len() < 2 * HASH_LEN {
        return Vec::new();
    }
    if right {
        pair[HASH_LEN..].to_vec()
    } else {
        pair[..HASH_LEN].to_vec()
    }
}

/// A plain depth-`H` Sparse Merkle Tree: no precomputed shortcuts, every
/// `get`/`insert` walks all `H` levels.
pub struct VanillaSmt<D: Database, H: Hasher> {
    db: D,
    hasher: H,
}

impl<D: Database, H: Hasher> VanillaSmt<D, H> {
    pub fn new(dbpath: &str) -> Self {
        VanillaSmt {
            db: D::new(dbpath),
            hasher: H::new(),
        }
    }

    /// Builds the empty tree bottom-up: `nil` at depth `H`, each level `i`
    /// above stores `H(child ‖ child) -> child ‖ child` until the root at
    /// depth 0. Returns the root hash; the empty tree's root always
    /// exists (spec §4.4).
    pub fn new_tree(&mut self) -> Result<Hash> {
        let mut h = nil();
        for _ in 0..DEPTH {
            let pair = [h.as_slice(), h.as_slice()].concat();
            let parent = self.hasher.digest(&pair);
            self.db.put(&parent, pair)?;
            h = parent.to_vec();
        }
        Ok(slice_to_hash(&h))
    }

    pub fn prepare(&mut self) -> Result<()> {
        self.db.init_batch()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.db.finish_batch()
    }

    pub fn get(&mut self, root: &Hash, key: &Hash) -> Result<Option<Hash>> {
        let bits = Bits::from_bytes_full(key);
        let mut h = root.to_vec();
        for level in 0..DEPTH {
            if h.is_empty() {
                return Ok(None);
            }
            let pair = self.db.get(&h)?.ok_or_else(|| {
                log::warn!("vanilla smt: descent hit a hash absent from the store");
                Errors::BrokenTrie("dangling SMT node pointer".into())
            })?;
            h = half(&pair, bits.bit(level as u16));
        }
        if h.is_empty() {
            Ok(None)
        } else {
            Ok(Some(slice_to_hash(&h)))
        }
    }

    /// Collects the root-to-leaf sibling path for `key`, one entry per
    /// level, without mutating the store.
    fn sibling_path(&mut self, root: &Hash, bits: &Bits) -> Result<SiblingPath> {
        let mut path = Vec::with_capacity(DEPTH);
        let mut h = root.to_vec();
        for level in 0..DEPTH {
            if h.is_empty() {
                path.push(nil());
                continue;
            }
            let pair = self.db.get(&h)?.ok_or_else(|| {
                Errors::BrokenTrie("dangling SMT node pointer".into())
            })?;
            path.push(half(&pair, !bits.bit(level as u16)));
            h = half(&pair, bits.bit(level as u16));
        }
        Ok(path)
    }

    /// `insert(root, key, leaf) -> root'` (spec §4.4.2): collects the
    /// sibling path, then rehashes leaf-to-root.
    pub fn insert(&mut self, root: &Hash, key: &Hash, leaf: &Hash) -> Result<Hash> {
        let bits = Bits::from_bytes_full(key);
        let path = self.sibling_path(root, &bits)?;
        let mut h = leaf.to_vec();
        for level in (0..DEPTH).rev() {
            let sibling = &path[level];
            let pair = if bits.bit(level as u16) {
                [sibling.as_slice(), h.as_slice()].concat()
            } else {
                [h.as_slice(), sibling.as_slice()].concat()
            };
            let parent = self.hasher.digest(&pair);
            self.db.put(&parent, pair)?;
            h = parent.to_vec();
        }
        Ok(slice_to_hash(&h))
    }

    pub fn get_merkle_proof(&mut self, root: &Hash, key: &Hash) -> Result<SiblingPath> {
        let bits = Bits::from_bytes_full(key);
        self.sibling_path(root, &bits)
    }

    pub fn db_reads(&self) -> usize {
        self.db.reads()
    }

    pub fn db_writes(&self) -> usize {
        self.db.writes()
    }
}

/// `verify_proof(key, leaf, proof, root)` (spec §4.4.3): stateless
/// recomputation of the root from a sibling path. `leaf = None` stands
/// for the nil sentinel.
pub fn verify_vanilla_proof<H: Hasher>(
    hasher: &H,
    key: &Hash,
    leaf: Option<&Hash>,
    proof: &SiblingPath,
    root: &Hash,
) -> bool {
    if proof.len() != DEPTH {
        return false;
    }
    let bits = Bits::from_bytes_full(key);
    let mut h: Vec<u8> = leaf.map(|l| l.to_vec()).unwrap_or_default();
    for level in (0..DEPTH).rev() {
        let sibling = &proof[level];
        let pair = if bits.bit(level as u16) {
            [sibling.as_slice(), h.as_slice()].concat()
        } else {
            [h.as_slice(), sibling.as_slice()].concat()
        };
        h = hasher.digest(&pair).to_vec();
    }
    h.as_slice() == root.as_slice()
}

/// [`VanillaSmt`] plus a precomputed `nilchain`: `nilchain[DEPTH] = nil`,
/// `nilchain[i] = H(nilchain[i+1] ‖ nilchain[i+1])`, so `nilchain[0]` is
/// the empty tree's root. Lookups and proofs short-circuit the moment the
/// current pointer equals `nilchain[level]` — everything beneath an
/// all-nil subtree is known without touching the store.
pub struct CachedSmt<D: Database, H: Hasher> {
    db: D,
    hasher: H,
    nilchain: Vec<Vec<u8>>,
}

/// Builds `nilchain[0..=DEPTH]` by pure repeated hashing (`nilchain[DEPTH]
/// = nil`, `nilchain[i] = H(nilchain[i+1] ‖ nilchain[i+1])`), independent
/// of any store. Shared between [`CachedSmt::new_tree`] (which also
/// persists each level's pair) and [`verify_cached_proof`] (which is
/// stateless and has no store to read from).
fn build_nilchain<H: Hasher>(hasher: &H) -> Vec<Vec<u8>> {
    let mut chain = vec![nil(); DEPTH + 1];
    for level in (0..DEPTH).rev() {
        let child = chain[level + 1].clone();
        let pair = [child.as_slice(), child.as_slice()].concat();
        chain[level] = hasher.digest(&pair).to_vec();
    }
    chain
}

impl<D: Database, H: Hasher> CachedSmt<D, H> {
    pub fn new(dbpath: &str) -> Self {
        CachedSmt {
            db: D::new(dbpath),
            hasher: H::new(),
            nilchain: vec![nil(); DEPTH + 1],
        }
    }

    pub fn new_tree(&mut self) -> Result<Hash> {
        let chain = build_nilchain(&self.hasher);
        for level in (0..DEPTH).rev() {
            let child = &chain[level + 1];
            let pair = [child.as_slice(), child.as_slice()].concat();
            self.db.put(&chain[level], pair)?;
        }
        let root = slice_to_hash(&chain[0]);
        self.nilchain = chain;
        Ok(root)
    }

    pub fn prepare(&mut self) -> Result<()> {
        self.db.init_batch()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.db.finish_batch()
    }

    /// Spec §4.5's short-circuit, applied directly to the wording
    /// ("if the current node at level `i` equals `nilchain[i]`, the
    /// entire subtree beneath it is nil") rather than to the reference
    /// implementation's literal `children_pair == nilchain[i] * 2` check,
    /// which compares one level too deep and never actually fires — see
    /// DESIGN.md.
    fn is_nil_at(&self, h: &[u8], level: usize) -> bool {
        h == self.nilchain[level].as_slice()
    }

    pub fn get(&mut self, root: &Hash, key: &Hash) -> Result<Option<Hash>> {
        let bits = Bits::from_bytes_full(key);
        let mut h = root.to_vec();
        for level in 0..DEPTH {
            if h.is_empty() || self.is_nil_at(&h, level) {
                return Ok(None);
            }
            let pair = self.db.get(&h)?.ok_or_else(|| {
                log::warn!("cached smt: descent hit a hash absent from the store");
                Errors::BrokenTrie("dangling SMT node pointer".into())
            })?;
            h = half(&pair, bits.bit(level as u16));
        }
        if h.is_empty() {
            Ok(None)
        } else {
            Ok(Some(slice_to_hash(&h)))
        }
    }

    /// Spec §4.5's "Proof" optimization: stops the moment the remaining
    /// subtree is all-nil and returns the path as collected so far,
    /// shorter than `DEPTH`, rather than padding it out here. The caller
    /// (`insert`, or `verify_cached_proof` at the other end) supplies the
    /// missing upper-level siblings from `nilchain`.
    fn sibling_path(&mut self, root: &Hash, bits: &Bits) -> Result<SiblingPath> {
        let mut path = Vec::with_capacity(DEPTH);
        let mut h = root.to_vec();
        for level in 0..DEPTH {
            if h.is_empty() || self.is_nil_at(&h, level) {
                return Ok(path);
            }
            let pair = self.db.get(&h)?.ok_or_else(|| {
                Errors::BrokenTrie("dangling SMT node pointer".into())
            })?;
            path.push(half(&pair, !bits.bit(level as u16)));
            h = half(&pair, bits.bit(level as u16));
        }
        Ok(path)
    }

    /// `insert(root, key, leaf) -> root'` (spec §4.5.2): like
    /// [`VanillaSmt::insert`], but a shorter-than-`DEPTH` sibling path
    /// (from the nil short-circuit above) is padded from `nilchain`
    /// rather than re-descended.
    pub fn insert(&mut self, root: &Hash, key: &Hash, leaf: &Hash) -> Result<Hash> {
        let bits = Bits::from_bytes_full(key);
        let path = self.sibling_path(root, &bits)?;
        let mut h = leaf.to_vec();
        for level in (0..DEPTH).rev() {
            let sibling = if level < path.len() {
                &path[level]
            } else {
                &self.nilchain[level + 1]
            };
            let pair = if bits.bit(level as u16) {
                [sibling.as_slice(), h.as_slice()].concat()
            } else {
                [h.as_slice(), sibling.as_slice()].concat()
            };
            let parent = self.hasher.digest(&pair);
            self.db.put(&parent, pair)?;
            h = parent.to_vec();
        }
        Ok(slice_to_hash(&h))
    }

    pub fn get_merkle_proof(&mut self, root: &Hash, key: &Hash) -> Result<SiblingPath> {
        let bits = Bits::from_bytes_full(key);
        self.sibling_path(root, &bits)
    }

    pub fn db_reads(&self) -> usize {
        self.db.reads()
    }

    pub fn db_writes(&self) -> usize {
        self.db.writes()
    }
}

/// `verify(root, key, leaf, proof)` for [`CachedSmt`] (spec §4.5): `proof`
/// may be shorter than `DEPTH` when the traversal that produced it
/// short-circuited into an all-nil subtree. Unlike
/// [`verify_vanilla_proof`], a short proof is not rejected — the missing
/// upper-level siblings are padded in from a freshly recomputed
/// `nilchain` before replaying the usual leaf-to-root rehash.
pub fn verify_cached_proof<H: Hasher>(
    hasher: &H,
    key: &Hash,
    leaf: Option<&Hash>,
    proof: &SiblingPath,
    root: &Hash,
) -> bool {
    if proof.len() > DEPTH {
        return false;
    }
    let nilchain = build_nilchain(hasher);
    let bits = Bits::from_bytes_full(key);
    let mut h: Vec<u8> = leaf.map(|l| l.to_vec()).unwrap_or_default();
    for level in (0..DEPTH).rev() {
        let sibling = if level < proof.len() {
            &proof[level]
        } else {
            &nilchain[level + 1]
        };
        let pair = if bits.bit(level as u16) {
            [sibling.as_slice(), h.as_slice()].concat()
        } else {
            [h.as_slice(), sibling.as_slice()].concat()
        };
        h = hasher.digest(&pair).to_vec();
    }
    h.as_slice() == root.as_slice()
}

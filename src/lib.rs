//! `monotree` is a radix-compressed, binary Merkle trie over fixed-width
//! hash keys: insert, lookup and Merkle-proof generation/verification are
//! all `O(log N)` in the number of stored keys, in contrast to the
//! `O(H)` depth of a plain Sparse Merkle Tree. Two SMT baselines,
//! [`smt::VanillaSmt`] and [`smt::CachedSmt`], are provided for
//! comparison; they share the same [`Database`]/[`Hasher`] interface.
//!
//! ```rust,no_run
//! use monotree::{Monotree, Hash, Hasher};
//! use monotree::database::MemoryDB;
//! use monotree::hasher::Blake3;
//! use monotree::utils::random_hash;
//!
//! let mut tree = Monotree::<MemoryDB, Blake3>::new("memdb");
//! let mut root: Option<Hash> = None;
//!
//! let (key, leaf) = (random_hash(), random_hash());
//! root = tree.insert(root.as_ref(), &key, &leaf).unwrap();
//! assert_eq!(tree.get(root.as_ref(), &key).unwrap(), Some(leaf));
//!
//! let proof = tree.get_merkle_proof(root.as_ref(), &key).unwrap();
//! assert!(monotree::verify_proof(
//!     &Blake3::new(),
//!     root.as_ref(),
//!     Some(&leaf),
//!     &proof
//! ));
//! ```
//!
//! A tree is identified solely by its (possibly absent) root hash; every
//! mutating operation is a pure function `(root, key, leaf) -> root'` over
//! a [`Database`] capability, plus side-effect writes of new nodes. Nodes
//! already written under a superseded root are left in place (unreachable,
//! not garbage collected) — see spec §1's Non-goals.
//!
//! Dependency order, leaves first: [`Hasher`] → [`bits::Bits`] →
//! [`Database`] → [`node::Node`] → [`smt`] → [`tree`].
pub mod bits;
pub mod database;
pub mod hasher;
pub mod node;
pub mod smt;
pub mod tree;
pub mod utils;

pub use bits::Bits;
pub use database::Database;
pub use hasher::Hasher;
pub use node::{Node, Unit};
pub use tree::{verify_proof, Monotree};

/// Byte-width of a [`Hash`]. `monotree` pins this at compile time (see
/// DESIGN.md for why this departs from spec §3's "N configurable at
/// construction").
pub const HASH_LEN: usize = 32;

/// Wire-format width of a BitString's length prefix (`enc_edge`'s
/// `be16(ℓ)`, spec §4.6).
pub type BitsLen = u16;

pub type Result<T> = std::result::Result<T, Errors>;

/// A fixed-width cryptographic digest.
pub type Hash = [u8; HASH_LEN];

/// An ordered Merkle-proof step: `prefix` is `false` for a soft node (or a
/// hard node descended left), `true` for a hard node descended right;
/// `cut` is the remaining bytes needed to reconstruct that node's hash
/// given the child hash (spec §4.3.3).
pub type Proof = Vec<(bool, Vec<u8>)>;

/// Reserved store key under which [`Monotree::set_headroot`] stashes the
/// current root, so a caller that only persists `(key -> value)` pairs in
/// a `Database` still has somewhere canonical to recover the latest root
/// from.
pub const ROOT_KEY: &Hash = b"_______monotree::headroot_______";

/// Default backend: an in-process `HashMap`-based store.
pub type DefaultDatabase = database::MemoryDB;
/// Default hasher: 256-bit BLAKE3.
pub type DefaultHasher = hasher::Blake3;

/// Error kinds from spec §7. `InvalidProof` has no variant here:
/// verification (`tree::verify_proof`, `smt::VanillaSmt::verify_proof`,
/// `smt::CachedSmt::verify_proof`) is total and returns `bool`, never
/// `Result` — there is nothing to construct for it.
#[derive(thiserror::Error, Debug)]
pub enum Errors {
    /// A descent reached a hash absent from the store, or a node
    /// bytestring whose tag byte is neither `0x00` nor `0x01`. Fatal:
    /// signals store corruption.
    #[error("broken trie: {0}")]
    BrokenTrie(String),

    /// Backend I/O failure during `get`/`put`/`delete`/`commit`. Fatal.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// Key length != N, or hash length != N, on input. Rejected at the
    /// boundary before any store access.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

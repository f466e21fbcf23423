//! Canonical serialization of Monotree's two node shapes (spec §3, §4.6):
//! a **soft** node (one outgoing edge) and a **hard** node (two outgoing
//! edges, one per leading bit). The last byte of the serialized form is
//! the tag: `0x00` soft, `0x01` hard.
use crate::bits::Bits;
use crate::utils::slice_to_hash;
use crate::{BitsLen, Errors, Hash, Result, HASH_LEN};

/// One outgoing edge: the BitString label and the hash it leads to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    pub hash: Hash,
    pub bits: Bits,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A single outgoing edge.
    Soft(Unit),
    /// Two outgoing edges, ordered `(left, right)` where `left.bits` starts
    /// with bit 0 and `right.bits` starts with bit 1.
    Hard(Unit, Unit),
}

impl Node {
    /// Builds a hard node, normalizing `(a, b)` into `(left, right)` order
    /// by each edge's leading bit (spec §4.3.2's `put_node`).
    pub fn hard(a: Unit, b: Unit) -> Node {
        if a.bits.is_right() {
            Node::Hard(b, a)
        } else {
            Node::Hard(a, b)
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Node::Soft(u) => {
                let mut out = Vec::with_capacity(HASH_LEN + u.bits.to_bytes().len() + 1);
                out.extend_from_slice(&u.hash);
                out.extend_from_slice(&u.bits.to_bytes());
                out.push(0x00);
                out
            }
            Node::Hard(l, r) => {
                let mut out = Vec::new();
                out.extend_from_slice(&l.hash);
                out.extend_from_slice(&l.bits.to_bytes());
                out.extend_from_slice(&r.bits.to_bytes());
                out.extend_from_slice(&r.hash);
                out.push(0x01);
                out
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Node> {
        let max_bits = (HASH_LEN * 8) as BitsLen;
        match bytes.last() {
            Some(0x00) => {
                if bytes.len() < HASH_LEN + 1 {
                    return Err(Errors::ShapeMismatch("truncated soft node".into()));
                }
                let hash = slice_to_hash(&bytes[..HASH_LEN]);
                let (bits, consumed) = Bits::from_bytes(&bytes[HASH_LEN..], max_bits)?;
                if HASH_LEN + consumed + 1 != bytes.len() {
                    return Err(Errors::ShapeMismatch("trailing bytes in soft node".into()));
                }
                Ok(Node::Soft(Unit { hash, bits }))
            }
            Some(0x01) => {
                if bytes.len() < 2 * HASH_LEN + 1 {
                    return Err(Errors::ShapeMismatch("truncated hard node".into()));
                }
                let hash_l = slice_to_hash(&bytes[..HASH_LEN]);
                let (bits_l, consumed_l) = Bits::from_bytes(&bytes[HASH_LEN..], max_bits)?;
                let right_start = HASH_LEN + consumed_l;
                let (bits_r, consumed_r) = Bits::from_bytes(&bytes[right_start..], max_bits)?;
                let hash_r_at = right_start + consumed_r;
                if hash_r_at + HASH_LEN + 1 != bytes.len() {
                    return Err(Errors::ShapeMismatch("trailing bytes in hard node".into()));
                }
                let hash_r = slice_to_hash(&bytes[hash_r_at..hash_r_at + HASH_LEN]);
                Ok(Node::Hard(
                    Unit {
                        hash: hash_l,
                        bits: bits_l,
                    },
                    Unit {
                        hash: hash_r,
                        bits: bits_r,
                    },
                ))
            }
            Some(_) => Err(Errors::BrokenTrie(
                "node tag byte is neither 0x00 nor 0x01".into(),
            )),
            None => Err(Errors::ShapeMismatch("empty node bytes".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::random_hash;

    fn unit(bits_len: BitsLen, right: bool) -> Unit {
        let key = random_hash();
        let mut bits = Bits::from_bytes_full(&key).prefix(bits_len.max(1));
        if bits.is_right() != right {
            // flip the leading bit by relabeling via the other key's complement;
            // simplest is to regenerate until it matches for this small helper.
            loop {
                let k = random_hash();
                bits = Bits::from_bytes_full(&k).prefix(bits_len.max(1));
                if bits.is_right() == right {
                    break;
                }
            }
        }
        Unit { hash: key, bits }
    }

    #[test]
    fn soft_node_round_trips() {
        let u = unit(40, false);
        let node = Node::Soft(u);
        let bytes = node.to_bytes();
        assert_eq!(*bytes.last().unwrap(), 0x00);
        assert_eq!(Node::from_bytes(&bytes).unwrap(), node);
    }

    #[test]
    fn hard_node_round_trips_and_normalizes_sides() {
        let left = unit(12, false);
        let right = unit(9, true);
        let node = Node::hard(right.clone(), left.clone());
        match &node {
            Node::Hard(l, r) => {
                assert!(!l.bits.is_right());
                assert!(r.bits.is_right());
            }
            _ => panic!("expected hard node"),
        }
        let bytes = node.to_bytes();
        assert_eq!(*bytes.last().unwrap(), 0x01);
        assert_eq!(Node::from_bytes(&bytes).unwrap(), node);
    }

    #[test]
    fn from_bytes_rejects_unknown_tag() {
        let mut bytes = Node::Soft(unit(8, false)).to_bytes();
        let last = bytes.len() - 1;
        bytes[last] = 0x02;
        assert!(Node::from_bytes(&bytes).is_err());
    }
}

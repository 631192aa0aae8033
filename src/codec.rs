//! Persisted form of a trie.
//!
//! The node graph is written by the same unordered walk that tears it down,
//! one record per node, so decoding relinks nodes directly instead of
//! re-running insertion.
//!
//! ```text
//! stream := varint(count) record*          count == 0: nothing follows
//! record := varint(index << 2 | tag) bytes(key) bytes(value) flags
//! bytes  := varint(len) u8*len             bincode payload
//! tag    := 0 root-empty | 1 branch | 2 edge-one | 3 edge-zero
//! flags  := HAS_SIBLING (1) | HAS_CHILD (2)
//! ```

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::bits::BitKey;
use crate::error::{Error, Result};
use crate::node::{NodeId, Role, Walk};
use crate::trie::PatriciaTrie;

const TAG_ROOT: u64 = 0;
const TAG_BRANCH: u64 = 1;
const TAG_EDGE_ONE: u64 = 2;
const TAG_EDGE_ZERO: u64 = 3;

const HAS_SIBLING: u8 = 1;
const HAS_CHILD: u8 = 2;

// =============================================================================
// Framing
// =============================================================================

fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn encode_bytes(data: &[u8], buf: &mut Vec<u8>) {
    encode_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

fn corrupted(reason: &str) -> Error {
    warn!(reason, "rejecting corrupted trie stream");
    Error::StreamCorrupted(reason.to_string())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8> {
        let byte = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| corrupted("truncated stream"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.byte()?;
            if shift >= 64 {
                return Err(corrupted("varint overflow"));
            }
            value |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn bytes(&mut self) -> Result<&'a [u8]> {
        let len = usize::try_from(self.varint()?).map_err(|_| corrupted("payload too large"))?;
        let end = self
            .pos
            .checked_add(len)
            .ok_or_else(|| corrupted("payload too large"))?;
        let data = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| corrupted("truncated stream"))?;
        self.pos = end;
        Ok(data)
    }
}

fn role_code(role: Role) -> u64 {
    match role {
        Role::RootEmpty | Role::RootUnset => TAG_ROOT,
        Role::Branch(i) => (u64::from(i) << 2) | TAG_BRANCH,
        Role::EdgeOne(i) => (u64::from(i) << 2) | TAG_EDGE_ONE,
        Role::EdgeZero(i) => (u64::from(i) << 2) | TAG_EDGE_ZERO,
    }
}

fn role_from_code(code: u64) -> Result<Role> {
    let index = u32::try_from(code >> 2).map_err(|_| corrupted("bit index out of range"))?;
    match code & 3 {
        TAG_ROOT if index == 0 => Ok(Role::RootEmpty),
        TAG_ROOT => Err(corrupted("root record with a bit index")),
        TAG_BRANCH => Ok(Role::Branch(index)),
        TAG_EDGE_ONE => Ok(Role::EdgeOne(index)),
        _ => Ok(Role::EdgeZero(index)),
    }
}

/// Where the next decoded record is linked.
enum Attach {
    First,
    Child(NodeId),
    Sibling(NodeId),
}

// =============================================================================
// Encoding
// =============================================================================

impl<K: BitKey + Serialize, V: Serialize> PatriciaTrie<K, V> {
    /// Encode the whole trie into a byte vector.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        encode_varint(self.len() as u64, &mut buf);
        if self.is_empty() {
            return Ok(buf);
        }

        let root = &self.nodes[NodeId::ROOT];
        let start = if root.entry.is_some() {
            Some(NodeId::ROOT)
        } else {
            root.children
        };
        let mut walk = Walk::new(start);
        let mut records = 0usize;
        while let Some(visit) = walk.advance(&self.nodes) {
            let node = &self.nodes[visit.id];
            let missing = || Error::StreamCorrupted("linked node without an entry".into());
            let (key, value) = node.entry.as_ref().ok_or_else(missing)?;
            encode_varint(role_code(node.role), &mut buf);
            encode_bytes(&bincode::serialize(key)?, &mut buf);
            encode_bytes(&bincode::serialize(value)?, &mut buf);
            let mut flags = 0;
            if visit.has_sibling {
                flags |= HAS_SIBLING;
            }
            if visit.has_children {
                flags |= HAS_CHILD;
            }
            buf.push(flags);
            records += 1;
        }

        debug!(records, bytes = buf.len(), "trie encoded");
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let buf = self.encode()?;
        writer.write_all(&buf)?;
        writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// Decoding
// =============================================================================

impl<K: BitKey + DeserializeOwned, V: DeserializeOwned> PatriciaTrie<K, V> {
    /// Rebuild a trie from [`encode`](Self::encode) output.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let count = reader.varint()?;
        let mut trie = Self::new();
        if count > 0 {
            trie.decode_records(&mut reader, count)?;
        }
        if !reader.is_empty() {
            return Err(corrupted("trailing bytes"));
        }
        debug!(entries = trie.len(), bytes = bytes.len(), "trie decoded");
        Ok(trie)
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Self::decode(&buf)
    }

    fn decode_records(&mut self, reader: &mut Reader<'_>, count: u64) -> Result<()> {
        let mut attach = Some(Attach::First);
        let mut pending: Vec<NodeId> = Vec::new();
        let mut records = 0u64;

        while let Some(at) = attach.take() {
            if records == count {
                return Err(corrupted("more records than the entry count"));
            }
            let role = role_from_code(reader.varint()?)?;
            let key: K = bincode::deserialize(reader.bytes()?)?;
            let value: V = bincode::deserialize(reader.bytes()?)?;
            let flags = reader.byte()?;
            if flags & !(HAS_SIBLING | HAS_CHILD) != 0 {
                return Err(corrupted("unknown link flags"));
            }
            records += 1;

            let id = if role == Role::RootEmpty {
                if !matches!(at, Attach::First) {
                    return Err(corrupted("root record out of place"));
                }
                if flags & HAS_SIBLING != 0 {
                    return Err(corrupted("root record with a sibling"));
                }
                if key.bit_len() != 0 {
                    return Err(corrupted("root record with a non-empty key"));
                }
                let root = &mut self.nodes[NodeId::ROOT];
                root.entry = Some((key, value));
                root.role = Role::RootEmpty;
                NodeId::ROOT
            } else {
                if key.bit_len() == 0 {
                    return Err(corrupted("empty key outside the root"));
                }
                let id = self.nodes.alloc(key, value);
                self.nodes[id].role = role;
                match at {
                    Attach::First => self.nodes.enlist(NodeId::ROOT, id),
                    Attach::Child(owner) => self.nodes.enlist(owner, id),
                    Attach::Sibling(prev) => self.nodes.append(prev, id),
                }
                id
            };

            attach = match (flags & HAS_SIBLING != 0, flags & HAS_CHILD != 0) {
                (true, true) => {
                    pending.push(id);
                    Some(Attach::Sibling(id))
                }
                (true, false) => Some(Attach::Sibling(id)),
                (false, true) => Some(Attach::Child(id)),
                (false, false) => pending.pop().map(Attach::Child),
            };
        }

        if records != count {
            return Err(corrupted("entry count mismatch"));
        }
        self.restore_len(records as usize);
        Ok(())
    }
}

use std::collections::HashMap;

use crate::foundation::bytes::{ByteReader, c_string};
use crate::foundation::error::{CarError, CarResult};

const BOM_MAGIC: &[u8; 8] = b"BOMStore";
const TREE_MAGIC: &[u8; 4] = b"tree";

/// Parsed BOM store: block address table plus named variables.
///
/// Blocks are addressed by index; index 0 is the null block. All structures in this layer are
/// big-endian.
#[derive(Clone, Debug)]
pub(crate) struct BomStore {
    blocks: Vec<(u32, u32)>,
    vars: HashMap<String, u32>,
}

impl BomStore {
    pub(crate) fn parse(data: &[u8]) -> CarResult<Self> {
        let mut r = ByteReader::new(data, "bom header");
        let magic = r.take(8)?;
        if magic != BOM_MAGIC {
            return Err(CarError::invalid_format("missing BOMStore signature"));
        }
        let version = r.u32_be()?;
        if version != 1 {
            return Err(CarError::invalid_format(format!(
                "unsupported BOM version {version}"
            )));
        }
        let _declared_blocks = r.u32_be()?;
        let index_offset = r.u32_be()? as usize;
        let index_len = r.u32_be()? as usize;
        let vars_offset = r.u32_be()? as usize;
        let vars_len = r.u32_be()? as usize;

        let index = slice(data, index_offset, index_len, "bom block index")?;
        let mut r = ByteReader::new(index, "bom block index");
        let count = r.u32_be()? as usize;
        if count > r.remaining() / 8 {
            return Err(CarError::invalid_format(format!(
                "bom block index declares {count} blocks in {} bytes",
                index_len
            )));
        }
        let mut blocks = Vec::with_capacity(count);
        for _ in 0..count {
            let addr = r.u32_be()?;
            let len = r.u32_be()?;
            if (addr as usize).saturating_add(len as usize) > data.len() {
                return Err(CarError::invalid_format(format!(
                    "bom block at {addr} (+{len}) exceeds file of {} bytes",
                    data.len()
                )));
            }
            blocks.push((addr, len));
        }

        let vars_raw = slice(data, vars_offset, vars_len, "bom variables")?;
        let mut r = ByteReader::new(vars_raw, "bom variables");
        let var_count = r.u32_be()?;
        let mut vars = HashMap::new();
        for _ in 0..var_count {
            let block = r.u32_be()?;
            let name_len = usize::from(r.u8()?);
            let name = c_string(r.take(name_len)?);
            vars.insert(name, block);
        }

        Ok(Self { blocks, vars })
    }

    pub(crate) fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub(crate) fn var(&self, name: &str) -> Option<u32> {
        self.vars.get(name).copied()
    }

    pub(crate) fn block<'a>(&self, data: &'a [u8], id: u32) -> CarResult<&'a [u8]> {
        let (addr, len) = self
            .blocks
            .get(id as usize)
            .copied()
            .ok_or_else(|| CarError::invalid_format(format!("bom block {id} out of range")))?;
        slice(data, addr as usize, len as usize, "bom block")
    }

    pub(crate) fn var_block<'a>(&self, data: &'a [u8], name: &str) -> CarResult<&'a [u8]> {
        let id = self
            .var(name)
            .ok_or_else(|| CarError::invalid_format(format!("missing bom variable {name}")))?;
        self.block(data, id)
    }

    /// Open the B-tree stored under variable `name` for a leaf-order walk.
    pub(crate) fn tree<'a>(
        &'a self,
        data: &'a [u8],
        name: &str,
    ) -> CarResult<Option<TreeWalk<'a>>> {
        let Some(id) = self.var(name) else {
            return Ok(None);
        };
        let mut r = ByteReader::new(self.block(data, id)?, "bom tree header");
        if r.take(4)? != TREE_MAGIC {
            return Err(CarError::invalid_format(format!(
                "variable {name} is not a bom tree"
            )));
        }
        let _version = r.u32_be()?;
        let root = r.u32_be()?;
        let _block_size = r.u32_be()?;
        let path_count = r.u32_be()?;
        Ok(Some(TreeWalk {
            store: self,
            data,
            root,
            declared: path_count,
            state: WalkState::Start,
            hops: 0,
        }))
    }
}

fn slice<'a>(data: &'a [u8], offset: usize, len: usize, what: &str) -> CarResult<&'a [u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            CarError::invalid_format(format!(
                "{what} at {offset} (+{len}) exceeds file of {} bytes",
                data.len()
            ))
        })
}

/// One leaf record: key and value blocks, borrowed from the container bytes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TreeEntry<'a> {
    pub(crate) key: &'a [u8],
    pub(crate) value: &'a [u8],
    /// Block id of `value`, usable with [`BomStore::block`] for later lookups.
    pub(crate) value_block: u32,
}

#[derive(Clone, Debug)]
enum WalkState {
    Start,
    Leaf {
        pairs: Vec<(u32, u32)>,
        next: usize,
        forward: u32,
    },
    Done,
}

/// Lazy walk over tree leaves in storage order, following forward links.
///
/// The number of page hops is bounded by the block count so a cyclic or corrupt link chain ends
/// with an error instead of looping.
pub(crate) struct TreeWalk<'a> {
    store: &'a BomStore,
    data: &'a [u8],
    root: u32,
    declared: u32,
    state: WalkState,
    hops: usize,
}

impl<'a> TreeWalk<'a> {
    /// Entry count recorded in the tree header.
    pub(crate) fn declared_len(&self) -> u32 {
        self.declared
    }

    fn read_paths(&mut self, id: u32) -> CarResult<(bool, u32, Vec<(u32, u32)>)> {
        self.hops += 1;
        if self.hops > self.store.block_count() + 1 {
            return Err(CarError::invalid_format("bom tree page chain does not terminate"));
        }
        let mut r = ByteReader::new(self.store.block(self.data, id)?, "bom tree page");
        let is_leaf = r.u16_be()? != 0;
        let count = usize::from(r.u16_be()?);
        let forward = r.u32_be()?;
        let _backward = r.u32_be()?;
        if count > r.remaining() / 8 {
            return Err(CarError::invalid_format(format!(
                "bom tree page {id} declares {count} entries past its end"
            )));
        }
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            pairs.push((r.u32_be()?, r.u32_be()?));
        }
        Ok((is_leaf, forward, pairs))
    }

    fn first_leaf(&mut self) -> CarResult<WalkState> {
        let mut id = self.root;
        loop {
            let (is_leaf, forward, pairs) = self.read_paths(id)?;
            if is_leaf {
                return Ok(WalkState::Leaf {
                    pairs,
                    next: 0,
                    forward,
                });
            }
            id = match pairs.first() {
                Some((child, _)) => *child,
                None => return Ok(WalkState::Done),
            };
        }
    }

    fn advance(&mut self) -> CarResult<Option<TreeEntry<'a>>> {
        loop {
            match &mut self.state {
                WalkState::Start => {
                    self.state = self.first_leaf()?;
                }
                WalkState::Done => return Ok(None),
                WalkState::Leaf {
                    pairs,
                    next,
                    forward,
                } => {
                    if let Some(&(value_id, key_id)) = pairs.get(*next) {
                        *next += 1;
                        let value = self.store.block(self.data, value_id)?;
                        let key = self.store.block(self.data, key_id)?;
                        return Ok(Some(TreeEntry {
                            key,
                            value,
                            value_block: value_id,
                        }));
                    }
                    let forward = *forward;
                    if forward == 0 {
                        self.state = WalkState::Done;
                        continue;
                    }
                    let (_, next_forward, next_pairs) = self.read_paths(forward)?;
                    self.state = WalkState::Leaf {
                        pairs: next_pairs,
                        next: 0,
                        forward: next_forward,
                    };
                }
            }
        }
    }
}

impl<'a> Iterator for TreeWalk<'a> {
    type Item = CarResult<TreeEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.state = WalkState::Done;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/container/bom.rs"]
mod tests;

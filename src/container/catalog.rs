use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::container::bom::{BomStore, TreeWalk};
use crate::container::header::{CarHeader, KeyFormat};
use crate::foundation::bytes::{ByteReader, c_string};
use crate::foundation::error::{CarError, CarResult};
use crate::key::attributes::RenditionAttribute;
use crate::key::rendition_key::{NameTables, RenditionKey};
use crate::rendition::csi::{CsiHeader, CsiRecord, LayoutType};
use crate::rendition::decode;
use crate::rendition::model::{MultisizeIndex, Rendition};

/// Options applied when opening a container.
#[derive(Clone, Debug)]
pub struct OpenOpts {
    /// Largest decoded bitmap, in bytes, any single rendition may allocate.
    pub max_bitmap_bytes: usize,
}

impl Default for OpenOpts {
    fn default() -> Self {
        Self {
            max_bitmap_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Read-only handle over a compiled asset catalog.
///
/// Opening validates the BOM store, the catalog header and the key format, and reads the facet
/// and appearance name tables. Rendition payloads are only decoded on request. The handle is
/// `Send + Sync`; parallel enumeration shares it by reference.
pub struct Container {
    data: Vec<u8>,
    store: BomStore,
    header: CarHeader,
    key_format: KeyFormat,
    names: NameTables,
    opts: OpenOpts,
    side_tables: OnceLock<SideTables>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("len", &self.data.len())
            .field("header", &self.header)
            .field("key_format", &self.key_format)
            .finish_non_exhaustive()
    }
}

/// Slice of a packed atlas referenced by an internal-reference rendition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AtlasMember {
    pub(crate) rendition_name: String,
    pub(crate) frame: (i32, i32, u32, u32),
}

/// Cross-entry tables built on first use with one pass over the index.
#[derive(Debug, Default)]
pub(crate) struct SideTables {
    /// Key tokens to value block id.
    pub(crate) by_tokens: HashMap<Vec<u16>, u32>,
    /// Facet name to the sizes of its multisize set.
    pub(crate) multisize_sets: HashMap<String, Vec<MultisizeIndex>>,
    /// Atlas key tokens to the slices that reference it.
    pub(crate) atlas_members: HashMap<Vec<u16>, Vec<AtlasMember>>,
}

/// One rendition index entry: key and header read eagerly, payload still undecoded.
#[derive(Clone, Debug)]
pub struct IndexEntry<'a> {
    /// Position in tree storage order.
    pub position: usize,
    /// Classification key.
    pub key: RenditionKey,
    /// Raw key tokens in key-format order.
    pub tokens: Vec<u16>,
    /// Rendition header, absent when the record is too damaged to read.
    pub header: Option<CsiHeader>,
    pub(crate) record: &'a [u8],
    pub(crate) block: u32,
}

impl Container {
    /// Read and index the container at `path`.
    pub fn open(path: impl AsRef<Path>) -> CarResult<Self> {
        Self::open_with(path, OpenOpts::default())
    }

    /// [`Container::open`] with explicit options.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, opts: OpenOpts) -> CarResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes_with(data, opts)
    }

    /// Index an in-memory container.
    pub fn from_bytes(data: Vec<u8>) -> CarResult<Self> {
        Self::from_bytes_with(data, OpenOpts::default())
    }

    /// [`Container::from_bytes`] with explicit options.
    pub fn from_bytes_with(data: Vec<u8>, opts: OpenOpts) -> CarResult<Self> {
        let store = BomStore::parse(&data)?;
        let header = CarHeader::parse(store.var_block(&data, "CARHEADER")?)?;
        let key_format = KeyFormat::parse(store.var_block(&data, "KEYFORMAT")?)?;
        if store.var("RENDITIONS").is_none() {
            return Err(CarError::invalid_format("missing bom variable RENDITIONS"));
        }
        let names = NameTables {
            facets: read_facets(&store, &data)?,
            appearances: read_appearances(&store, &data)?,
        };
        tracing::debug!(
            renditions = header.rendition_count,
            facets = names.facets.len(),
            appearances = names.appearances.len(),
            "opened container"
        );
        Ok(Self {
            data,
            store,
            header,
            key_format,
            names,
            opts,
            side_tables: OnceLock::new(),
        })
    }

    /// Catalog header.
    pub fn header(&self) -> &CarHeader {
        &self.header
    }

    /// Compiler banner, e.g. `@(#)PROGRAM:CoreUI  PROJECT:CoreUI-609.4`.
    pub fn version_string(&self) -> &str {
        &self.header.main_version_string
    }

    /// Attribute order of rendition keys.
    pub fn key_format(&self) -> &KeyFormat {
        &self.key_format
    }

    /// Options the container was opened with.
    pub fn opts(&self) -> &OpenOpts {
        &self.opts
    }

    /// Lazy walk over the rendition index in tree storage order.
    ///
    /// A structural fault in the tree is yielded as an `Err` item, after which the walk ends.
    pub fn entries(&self) -> CarResult<Entries<'_>> {
        let walk = self
            .store
            .tree(&self.data, "RENDITIONS")?
            .ok_or_else(|| CarError::invalid_format("missing bom variable RENDITIONS"))?;
        Ok(Entries {
            container: self,
            walk,
            position: 0,
            done: false,
        })
    }

    /// Keys of every rendition, without decoding payloads.
    pub fn keys(&self) -> CarResult<Vec<RenditionKey>> {
        self.entries()?
            .map(|entry| entry.map(|e| e.key))
            .collect()
    }

    /// Find and decode the rendition whose key tokens match `key`.
    pub fn lookup(&self, key: &RenditionKey) -> CarResult<Option<Rendition>> {
        let tokens = self.key_format.encode_tokens(&key.attributes);
        match self.entry_by_tokens(&tokens)? {
            Some(entry) => decode::decode(self, &entry).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn entry_by_tokens(&self, tokens: &[u16]) -> CarResult<Option<IndexEntry<'_>>> {
        let Some(&block) = self.side_tables().by_tokens.get(tokens) else {
            return Ok(None);
        };
        let record = self.store.block(&self.data, block)?;
        let key_bytes: Vec<u8> = tokens.iter().flat_map(|t| t.to_le_bytes()).collect();
        self.index_entry(0, &key_bytes, record, block).map(Some)
    }

    pub(crate) fn side_tables(&self) -> &SideTables {
        self.side_tables.get_or_init(|| self.build_side_tables())
    }

    fn build_side_tables(&self) -> SideTables {
        let mut tables = SideTables::default();
        let entries = match self.entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "rendition index unavailable for side tables");
                return tables;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "side tables stop at damaged index");
                    break;
                }
            };
            tables
                .by_tokens
                .entry(entry.tokens.clone())
                .or_insert(entry.block);
            let Some(header) = &entry.header else {
                continue;
            };
            match header.layout {
                LayoutType::MultisizeImageSet => {
                    let sizes = CsiRecord::parse(entry.record)
                        .and_then(|rec| decode::read_multisize_set(rec.payload));
                    match sizes {
                        Ok(sizes) => {
                            tables.multisize_sets.insert(entry.key.name.clone(), sizes);
                        }
                        Err(e) => {
                            tracing::debug!(name = %entry.key.name, error = %e, "skip multisize set")
                        }
                    }
                }
                LayoutType::InternalReference => {
                    let link = CsiRecord::parse(entry.record).and_then(|rec| {
                        Ok((decode::read_internal_link(rec.payload)?, rec.properties.frame))
                    });
                    match link {
                        Ok((target, Some(frame))) => {
                            tables
                                .atlas_members
                                .entry(target)
                                .or_default()
                                .push(AtlasMember {
                                    rendition_name: header.name.clone(),
                                    frame,
                                });
                        }
                        Ok((_, None)) => {
                            tracing::debug!(name = %header.name, "internal reference without frame")
                        }
                        Err(e) => {
                            tracing::debug!(name = %header.name, error = %e, "skip internal reference")
                        }
                    }
                }
                _ => {}
            }
        }
        tables
    }

    fn index_entry<'a>(
        &'a self,
        position: usize,
        key: &[u8],
        record: &'a [u8],
        block: u32,
    ) -> CarResult<IndexEntry<'a>> {
        let attributes = self.key_format.decode_tokens(key)?;
        let tokens = attributes.iter().map(|(_, v)| *v).collect();
        let header = match CsiHeader::parse(record) {
            Ok(header) => Some(header),
            Err(e) => {
                tracing::debug!(position, error = %e, "unreadable rendition header");
                None
            }
        };
        let rendition_name = header.as_ref().map(|h| h.name.clone()).unwrap_or_default();
        Ok(IndexEntry {
            position,
            key: RenditionKey::from_attributes(attributes, rendition_name, &self.names),
            tokens,
            header,
            record,
            block,
        })
    }
}

/// Iterator returned by [`Container::entries`].
pub struct Entries<'a> {
    container: &'a Container,
    walk: TreeWalk<'a>,
    position: usize,
    done: bool,
}

impl<'a> Entries<'a> {
    /// Entry count recorded in the index header.
    pub fn declared_len(&self) -> usize {
        self.walk.declared_len() as usize
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = CarResult<IndexEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.walk.next()?.and_then(|raw| {
            self.container
                .index_entry(self.position, raw.key, raw.value, raw.value_block)
        });
        match &item {
            Ok(_) => self.position += 1,
            Err(_) => self.done = true,
        }
        Some(item)
    }
}

fn read_facets(store: &BomStore, data: &[u8]) -> CarResult<HashMap<u16, String>> {
    let mut facets = HashMap::new();
    let Some(walk) = store.tree(data, "FACETKEYS")? else {
        return Ok(facets);
    };
    for entry in walk {
        let entry = entry?;
        let name = c_string(entry.key);
        let mut r = ByteReader::new(entry.value, "facet value");
        let _hotspot_x = r.u16_le()?;
        let _hotspot_y = r.u16_le()?;
        let count = r.u16_le()?;
        for _ in 0..count {
            let attr = RenditionAttribute::new(r.u16_le()?);
            let value = r.u16_le()?;
            if attr == RenditionAttribute::Identifier {
                facets.entry(value).or_insert_with(|| name.clone());
            }
        }
    }
    Ok(facets)
}

fn read_appearances(store: &BomStore, data: &[u8]) -> CarResult<HashMap<u16, String>> {
    let mut appearances = HashMap::new();
    let Some(walk) = store.tree(data, "APPEARANCEKEYS")? else {
        return Ok(appearances);
    };
    for entry in walk {
        let entry = entry?;
        let id = ByteReader::new(entry.value, "appearance value").u16_le()?;
        appearances.insert(id, c_string(entry.key));
    }
    Ok(appearances)
}

#[cfg(test)]
#[path = "../../tests/unit/container/catalog.rs"]
mod tests;

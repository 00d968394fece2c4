//! In-memory writer for `.car` fixtures.
//!
//! Produces BOM stores with the catalog variables the reader understands. Shared by unit tests
//! (mounted as `crate::support`) and integration tests (`mod support;`).
#![allow(dead_code)]

use std::io::{Cursor, Write as _};

pub const ATTR_APPEARANCE: u16 = 7;
pub const ATTR_ELEMENT: u16 = 1;
pub const ATTR_PART: u16 = 2;
pub const ATTR_DIRECTION: u16 = 4;
pub const ATTR_SCALE: u16 = 12;
pub const ATTR_IDIOM: u16 = 15;
pub const ATTR_SUBTYPE: u16 = 16;
pub const ATTR_IDENTIFIER: u16 = 17;
pub const ATTR_SIZE_CLASS_H: u16 = 20;
pub const ATTR_SIZE_CLASS_V: u16 = 21;
pub const ATTR_MEMORY: u16 = 22;
pub const ATTR_GRAPHICS: u16 = 23;
pub const ATTR_GAMUT: u16 = 24;

pub const DEFAULT_KEY_FORMAT: [u16; 13] = [
    ATTR_APPEARANCE,
    ATTR_ELEMENT,
    ATTR_PART,
    ATTR_DIRECTION,
    ATTR_SCALE,
    ATTR_IDIOM,
    ATTR_SUBTYPE,
    ATTR_IDENTIFIER,
    ATTR_SIZE_CLASS_H,
    ATTR_SIZE_CLASS_V,
    ATTR_MEMORY,
    ATTR_GRAPHICS,
    ATTR_GAMUT,
];

pub const LAYOUT_VECTOR: u16 = 9;
pub const LAYOUT_IMAGE: u16 = 10;
pub const LAYOUT_DATA: u16 = 1000;
pub const LAYOUT_EXTERNAL_LINK: u16 = 1001;
pub const LAYOUT_LAYER_STACK: u16 = 1002;
pub const LAYOUT_INTERNAL_REFERENCE: u16 = 1003;
pub const LAYOUT_PACKED_IMAGE: u16 = 1004;
pub const LAYOUT_TEXTURE: u16 = 1007;
pub const LAYOUT_COLOR: u16 = 1009;
pub const LAYOUT_MULTISIZE_SET: u16 = 1010;
pub const LAYOUT_MODEL: u16 = 1011;
pub const LAYOUT_RECOGNITION_OBJECT: u16 = 1014;
pub const LAYOUT_RECOGNITION_IMAGE: u16 = 1015;
pub const LAYOUT_RECOGNITION_GROUP: u16 = 1016;

pub const TLV_METRICS: u32 = 1003;
pub const TLV_UTI: u32 = 1005;
pub const TLV_EXIF_ORIENTATION: u32 = 1006;
pub const TLV_EXTERNAL_TAGS: u32 = 1008;
pub const TLV_FRAME: u32 = 1009;
pub const TLV_PHYSICAL_SIZE: u32 = 1010;

pub const FLAG_OPAQUE: u32 = 1 << 3;
pub const FLAG_COMPLETE_TEXTURE_EXTRUSION: u32 = 1 << 12;

pub fn fourcc(code: &[u8; 4]) -> [u8; 4] {
    u32::from_be_bytes(*code).to_le_bytes()
}

/// Key attributes for one rendition; unspecified format tokens are written as zero.
#[derive(Clone, Debug, Default)]
pub struct Attrs(pub Vec<(u16, u16)>);

impl Attrs {
    pub fn id(identifier: u16) -> Self {
        Self(vec![(ATTR_IDENTIFIER, identifier), (ATTR_SCALE, 1)])
    }

    pub fn with(mut self, attr: u16, value: u16) -> Self {
        self.0.retain(|(a, _)| *a != attr);
        self.0.push((attr, value));
        self
    }

    pub fn tokens(&self, format: &[u16]) -> Vec<u16> {
        format
            .iter()
            .map(|attr| {
                self.0
                    .iter()
                    .find(|(a, _)| a == attr)
                    .map(|(_, v)| *v)
                    .unwrap_or(0)
            })
            .collect()
    }
}

/// One CSI record.
#[derive(Clone, Debug)]
pub struct Csi {
    pub layout: u16,
    pub pixel_format: [u8; 4],
    pub width: u32,
    pub height: u32,
    pub scale_x100: u32,
    pub flags: u32,
    pub name: String,
    pub tlvs: Vec<(u32, Vec<u8>)>,
    pub payload: Vec<u8>,
}

impl Csi {
    pub fn new(layout: u16, name: &str) -> Self {
        Self {
            layout,
            pixel_format: *b"\0\0\0\0",
            width: 0,
            height: 0,
            scale_x100: 100,
            flags: 0,
            name: name.to_string(),
            tlvs: Vec::new(),
            payload: Vec::new(),
        }
    }

    pub fn layout(mut self, layout: u16) -> Self {
        self.layout = layout;
        self
    }

    pub fn pixel_format(mut self, code: &[u8; 4]) -> Self {
        self.pixel_format = *code;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale_x100 = scale * 100;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    pub fn tlv(mut self, kind: u32, data: Vec<u8>) -> Self {
        self.tlvs.push((kind, data));
        self
    }

    pub fn payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut tlv = Vec::new();
        for (kind, data) in &self.tlvs {
            tlv.extend_from_slice(&kind.to_le_bytes());
            tlv.extend_from_slice(&(data.len() as u32).to_le_bytes());
            tlv.extend_from_slice(data);
        }

        let mut out = Vec::new();
        out.extend_from_slice(&fourcc(b"CTSI"));
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.scale_x100.to_le_bytes());
        out.extend_from_slice(&fourcc(&self.pixel_format));
        out.extend_from_slice(&0u32.to_le_bytes());
        // csimetadata
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&self.layout.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        let mut name = self.name.as_bytes().to_vec();
        name.resize(128, 0);
        out.extend_from_slice(&name);
        // csibitmaplist
        out.extend_from_slice(&(tlv.len() as u32).to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        assert_eq!(out.len(), 184);
        out.extend_from_slice(&tlv);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// `CELM` chunk holding uncompressed premultiplied BGRA rows.
pub fn celm_bgra(width: u32, height: u32, rgba_premul: &[u8]) -> Vec<u8> {
    assert_eq!(rgba_premul.len(), (width * height * 4) as usize);
    celm(0, &rgba_to_bgra(rgba_premul))
}

/// `CELM` chunk holding zlib-compressed premultiplied BGRA rows.
pub fn celm_bgra_zip(rgba_premul: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(&rgba_to_bgra(rgba_premul)).unwrap();
    celm(2, &enc.finish().unwrap())
}

/// `CELM` chunk holding LZFSE-compressed premultiplied BGRA rows.
pub fn celm_bgra_lzfse(rgba_premul: &[u8]) -> Vec<u8> {
    let mut enc = Vec::new();
    lzfse_rust::encode_bytes(&rgba_to_bgra(rgba_premul), &mut enc).unwrap();
    celm(4, &enc)
}

pub fn celm(compression: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"CELM"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

pub fn rawd(version: u32, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"RAWD"));
    out.extend_from_slice(&version.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

/// `COLR` chunk; colorspace 0 is sRGB.
pub fn colr(colorspace: u8, components: &[f64]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"COLR"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&u32::from(colorspace).to_le_bytes());
    out.extend_from_slice(&(components.len() as u32).to_le_bytes());
    for c in components {
        out.extend_from_slice(&c.to_le_bytes());
    }
    out
}

pub fn colr_system(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"COLR"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(1u32 << 8).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(name.len() as u32).to_le_bytes());
    out.extend_from_slice(name.as_bytes());
    out
}

/// `SISM` chunk: `(width, height, index, idiom)` per size.
pub fn sism(sizes: &[(u32, u32, u16, u16)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"SISM"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(sizes.len() as u32).to_le_bytes());
    for (w, h, index, idiom) in sizes {
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        out.extend_from_slice(&index.to_le_bytes());
        out.extend_from_slice(&idiom.to_le_bytes());
    }
    out
}

/// `INLK` chunk referencing another rendition by its key tokens.
pub fn inlk(target: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"INLK"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&LAYOUT_PACKED_IMAGE.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&((target.len() * 2) as u32).to_le_bytes());
    for t in target {
        out.extend_from_slice(&t.to_le_bytes());
    }
    out
}

pub fn frame_tlv(x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&x.to_le_bytes());
    out.extend_from_slice(&y.to_le_bytes());
    out.extend_from_slice(&w.to_le_bytes());
    out.extend_from_slice(&h.to_le_bytes());
    out
}

pub fn uti_tlv(uti: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(uti.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(uti.as_bytes());
    out
}

pub fn metrics_tlv(top_left: (u32, u32), bottom_right: (u32, u32), size: (u32, u32)) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1u32.to_le_bytes());
    for v in [
        top_left.0,
        top_left.1,
        bottom_right.0,
        bottom_right.1,
        size.0,
        size.1,
    ] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

pub fn physical_size_tlv(w: f64, h: f64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&w.to_le_bytes());
    out.extend_from_slice(&h.to_le_bytes());
    out
}

/// One layer record for [`lays`].
#[derive(Clone, Debug)]
pub struct LayerSpec {
    pub frame: (f32, f32, f32, f32),
    pub opacity: f32,
    pub blend_mode: i32,
    pub fixed_frame: bool,
    pub target: Vec<u16>,
}

/// `LAYS` chunk; an empty `radiosity` slice means no radiosity image.
pub fn lays(radiosity: &[u16], layers: &[LayerSpec]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"LAYS"));
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&(layers.len() as u32).to_le_bytes());
    out.extend_from_slice(&((radiosity.len() * 2) as u32).to_le_bytes());
    for t in radiosity {
        out.extend_from_slice(&t.to_le_bytes());
    }
    for layer in layers {
        let (x, y, w, h) = layer.frame;
        for v in [x, y, w, h, layer.opacity] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&layer.blend_mode.to_le_bytes());
        out.extend_from_slice(&u32::from(layer.fixed_frame).to_le_bytes());
        out.extend_from_slice(&((layer.target.len() * 2) as u32).to_le_bytes());
        for t in &layer.target {
            out.extend_from_slice(&t.to_le_bytes());
        }
    }
    out
}

/// `RGRP` chunk: three name lists (items, images, objects).
pub fn rgrp(items: &[&str], images: &[&str], objects: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fourcc(b"RGRP"));
    out.extend_from_slice(&1u32.to_le_bytes());
    for list in [items, images, objects] {
        out.extend_from_slice(&(list.len() as u32).to_le_bytes());
        for name in list {
            out.extend_from_slice(&(name.len() as u32).to_le_bytes());
            out.extend_from_slice(name.as_bytes());
        }
    }
    out
}

pub fn rgba_to_bgra(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[2], px[1], px[0], px[3]])
        .collect()
}

pub fn solid_rgba(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    px.repeat((width * height) as usize)
}

pub fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, solid_rgba(width, height, px)).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Opaque image rendition helper.
pub fn image_csi(name: &str, width: u32, height: u32, px: [u8; 4]) -> Csi {
    Csi::new(LAYOUT_IMAGE, name)
        .pixel_format(b"ARGB")
        .size(width, height)
        .payload(celm_bgra(width, height, &solid_rgba(width, height, px)))
}

/// Whole-container writer.
#[derive(Clone, Debug)]
pub struct CarBuilder {
    pub key_format: Vec<u16>,
    pub facets: Vec<(String, u16)>,
    pub appearances: Vec<(String, u16)>,
    pub renditions: Vec<(Attrs, Csi)>,
    pub raw_renditions: Vec<(Vec<u16>, Vec<u8>)>,
    pub leaf_capacity: usize,
    /// Point the first leaf's forward link at a block that does not exist.
    pub corrupt_forward_link: bool,
    pub main_version: String,
}

impl Default for CarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CarBuilder {
    pub fn new() -> Self {
        Self {
            key_format: DEFAULT_KEY_FORMAT.to_vec(),
            facets: Vec::new(),
            appearances: Vec::new(),
            renditions: Vec::new(),
            raw_renditions: Vec::new(),
            leaf_capacity: 64,
            corrupt_forward_link: false,
            main_version: "@(#)PROGRAM:CoreUI  PROJECT:CoreUI-609.4".to_string(),
        }
    }

    pub fn facet(mut self, name: &str, identifier: u16) -> Self {
        self.facets.push((name.to_string(), identifier));
        self
    }

    pub fn appearance(mut self, name: &str, id: u16) -> Self {
        self.appearances.push((name.to_string(), id));
        self
    }

    pub fn rendition(mut self, attrs: Attrs, csi: Csi) -> Self {
        self.renditions.push((attrs, csi));
        self
    }

    /// Rendition whose value block is written verbatim.
    pub fn raw_rendition(mut self, attrs: Attrs, value: Vec<u8>) -> Self {
        let tokens = attrs.tokens(&self.key_format);
        self.raw_renditions.push((tokens, value));
        self
    }

    pub fn leaf_capacity(mut self, n: usize) -> Self {
        self.leaf_capacity = n.max(1);
        self
    }

    pub fn tokens(&self, attrs: &Attrs) -> Vec<u16> {
        attrs.tokens(&self.key_format)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bom = BomWriter::default();

        let header = bom.add(self.car_header());
        let keyfmt = bom.add(self.key_format_block());

        let mut entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .renditions
            .iter()
            .map(|(attrs, csi)| (u16s(&attrs.tokens(&self.key_format)), csi.encode()))
            .collect();
        entries.extend(
            self.raw_renditions
                .iter()
                .map(|(tokens, value)| (u16s(tokens), value.clone())),
        );
        let renditions = bom.tree(&entries, self.leaf_capacity, self.corrupt_forward_link);

        let facets: Vec<(Vec<u8>, Vec<u8>)> = self
            .facets
            .iter()
            .map(|(name, id)| {
                let mut v = Vec::new();
                v.extend_from_slice(&0u16.to_le_bytes());
                v.extend_from_slice(&0u16.to_le_bytes());
                v.extend_from_slice(&1u16.to_le_bytes());
                v.extend_from_slice(&ATTR_IDENTIFIER.to_le_bytes());
                v.extend_from_slice(&id.to_le_bytes());
                (name.as_bytes().to_vec(), v)
            })
            .collect();
        let facet_tree = bom.tree(&facets, 64, false);

        let appearances: Vec<(Vec<u8>, Vec<u8>)> = self
            .appearances
            .iter()
            .map(|(name, id)| (name.as_bytes().to_vec(), id.to_le_bytes().to_vec()))
            .collect();
        let appearance_tree = bom.tree(&appearances, 64, false);

        bom.var("CARHEADER", header);
        bom.var("KEYFORMAT", keyfmt);
        bom.var("RENDITIONS", renditions);
        bom.var("FACETKEYS", facet_tree);
        bom.var("APPEARANCEKEYS", appearance_tree);
        bom.finish()
    }

    fn car_header(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&fourcc(b"CTAR"));
        out.extend_from_slice(&609u32.to_le_bytes());
        out.extend_from_slice(&15u32.to_le_bytes());
        out.extend_from_slice(&1_600_000_000u32.to_le_bytes());
        let count = (self.renditions.len() + self.raw_renditions.len()) as u32;
        out.extend_from_slice(&count.to_le_bytes());
        let mut main = self.main_version.as_bytes().to_vec();
        main.resize(128, 0);
        out.extend_from_slice(&main);
        let mut version = b"IBCocoaTouchImageCatalogTool-10.0".to_vec();
        version.resize(256, 0);
        out.extend_from_slice(&version);
        out.extend_from_slice(&[0xab; 16]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());
        out
    }

    fn key_format_block(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&fourcc(b"kfmt"));
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(self.key_format.len() as u32).to_le_bytes());
        for t in &self.key_format {
            out.extend_from_slice(&u32::from(*t).to_le_bytes());
        }
        out
    }
}

fn u16s(tokens: &[u16]) -> Vec<u8> {
    tokens.iter().flat_map(|t| t.to_le_bytes()).collect()
}

/// Block-addressed BOM store writer (big-endian structures).
#[derive(Default)]
pub struct BomWriter {
    blocks: Vec<Vec<u8>>,
    vars: Vec<(String, u32)>,
}

impl BomWriter {
    /// Append a block and return its id; id 0 is the reserved null block.
    pub fn add(&mut self, data: Vec<u8>) -> u32 {
        self.blocks.push(data);
        self.blocks.len() as u32
    }

    pub fn var(&mut self, name: &str, block: u32) {
        self.vars.push((name.to_string(), block));
    }

    /// Write a B-tree with `capacity` entries per leaf and return the tree header block id.
    pub fn tree(&mut self, entries: &[(Vec<u8>, Vec<u8>)], capacity: usize, corrupt: bool) -> u32 {
        let mut leaves: Vec<(u32, Vec<(u32, u32)>)> = Vec::new();
        for chunk in entries.chunks(capacity.max(1)) {
            let mut pairs = Vec::new();
            for (key, value) in chunk {
                let v = self.add(value.clone());
                let k = self.add(key.clone());
                pairs.push((v, k));
            }
            // Placeholder; patched once neighbours are known.
            let id = self.add(Vec::new());
            leaves.push((id, pairs));
        }
        if leaves.is_empty() {
            let id = self.add(Vec::new());
            leaves.push((id, Vec::new()));
        }

        for i in 0..leaves.len() {
            let forward = if corrupt && i == 0 {
                0xffff
            } else {
                leaves.get(i + 1).map(|(id, _)| *id).unwrap_or(0)
            };
            let backward = if i == 0 { 0 } else { leaves[i - 1].0 };
            let block = paths_block(true, forward, backward, &leaves[i].1);
            self.blocks[(leaves[i].0 - 1) as usize] = block;
        }

        let root = if leaves.len() == 1 {
            leaves[0].0
        } else {
            let pairs: Vec<(u32, u32)> = leaves
                .iter()
                .map(|(id, pairs)| (*id, pairs.first().map(|p| p.1).unwrap_or(0)))
                .collect();
            self.add(paths_block(false, 0, 0, &pairs))
        };

        let mut tree = Vec::new();
        tree.extend_from_slice(b"tree");
        tree.extend_from_slice(&1u32.to_be_bytes());
        tree.extend_from_slice(&root.to_be_bytes());
        tree.extend_from_slice(&4096u32.to_be_bytes());
        tree.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        tree.push(0);
        self.add(tree)
    }

    pub fn finish(self) -> Vec<u8> {
        const HEADER_LEN: usize = 512;
        let mut out = vec![0u8; HEADER_LEN];
        let mut addresses = Vec::new();
        for block in &self.blocks {
            addresses.push((out.len() as u32, block.len() as u32));
            out.extend_from_slice(block);
        }

        let index_offset = out.len() as u32;
        out.extend_from_slice(&((addresses.len() + 1) as u32).to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        for (addr, len) in &addresses {
            out.extend_from_slice(&addr.to_be_bytes());
            out.extend_from_slice(&len.to_be_bytes());
        }
        let index_len = out.len() as u32 - index_offset;

        let vars_offset = out.len() as u32;
        out.extend_from_slice(&(self.vars.len() as u32).to_be_bytes());
        for (name, block) in &self.vars {
            out.extend_from_slice(&block.to_be_bytes());
            out.push(name.len() as u8);
            out.extend_from_slice(name.as_bytes());
        }
        let vars_len = out.len() as u32 - vars_offset;

        let mut header = Vec::new();
        header.extend_from_slice(b"BOMStore");
        header.extend_from_slice(&1u32.to_be_bytes());
        header.extend_from_slice(&(addresses.len() as u32).to_be_bytes());
        header.extend_from_slice(&index_offset.to_be_bytes());
        header.extend_from_slice(&index_len.to_be_bytes());
        header.extend_from_slice(&vars_offset.to_be_bytes());
        header.extend_from_slice(&vars_len.to_be_bytes());
        out[..header.len()].copy_from_slice(&header);
        out
    }
}

fn paths_block(is_leaf: bool, forward: u32, backward: u32, pairs: &[(u32, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&u16::from(is_leaf).to_be_bytes());
    out.extend_from_slice(&(pairs.len() as u16).to_be_bytes());
    out.extend_from_slice(&forward.to_be_bytes());
    out.extend_from_slice(&backward.to_be_bytes());
    for (index0, index1) in pairs {
        out.extend_from_slice(&index0.to_be_bytes());
        out.extend_from_slice(&index1.to_be_bytes());
    }
    out
}

/// Unique scratch directory under the system temp dir.
pub fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "carscope_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

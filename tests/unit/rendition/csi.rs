use super::*;
use crate::support::{self, Csi};

#[test]
fn parses_header_fields() {
    let bytes = Csi::new(support::LAYOUT_IMAGE, "icon@2x.png")
        .pixel_format(b"ARGB")
        .size(4, 2)
        .scale(2)
        .flags(support::FLAG_OPAQUE)
        .payload(vec![1, 2, 3])
        .encode();
    let record = CsiRecord::parse(&bytes).unwrap();
    let h = &record.header;
    assert_eq!(h.name, "icon@2x.png");
    assert_eq!((h.width, h.height), (4, 2));
    assert_eq!(h.scale(), 2.0);
    assert_eq!(h.pixel_format, PixelFormat::Argb);
    assert_eq!(h.pixel_format.code(), "ARGB");
    assert_eq!(h.layout, LayoutType::Image(10));
    assert!(h.is_opaque());
    assert!(!h.complete_texture_extrusion());
    assert_eq!(record.payload, &[1, 2, 3]);
    assert_eq!(record.properties.exif_orientation, 1);
}

#[test]
fn reads_tlv_properties() {
    let bytes = Csi::new(support::LAYOUT_DATA, "blob")
        .tlv(support::TLV_UTI, support::uti_tlv("public.json"))
        .tlv(support::TLV_FRAME, support::frame_tlv(2, 3, 4, 5))
        .tlv(
            support::TLV_METRICS,
            support::metrics_tlv((1, 0), (0, 0), (8, 8)),
        )
        .tlv(support::TLV_EXIF_ORIENTATION, 6u32.to_le_bytes().to_vec())
        .tlv(support::TLV_PHYSICAL_SIZE, support::physical_size_tlv(0.2, 0.1))
        .tlv(4242, vec![9; 7])
        .encode();
    let props = CsiRecord::parse(&bytes).unwrap().properties;
    assert_eq!(props.uti.as_deref(), Some("public.json"));
    assert_eq!(props.frame, Some((2, 3, 4, 5)));
    assert!(props.metrics.unwrap().is_alpha_cropped());
    assert_eq!(props.exif_orientation, 6);
    assert_eq!(props.physical_size, Some((0.2, 0.1)));
}

#[test]
fn truncated_payload_is_invalid_format() {
    let mut bytes = Csi::new(support::LAYOUT_DATA, "blob")
        .payload(vec![0; 32])
        .encode();
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        CsiRecord::parse(&bytes),
        Err(CarError::InvalidFormat(_))
    ));
}

#[test]
fn bad_tag_is_invalid_format() {
    let mut bytes = Csi::new(support::LAYOUT_DATA, "blob").encode();
    bytes[0] = 0;
    assert!(matches!(
        CsiHeader::parse(&bytes),
        Err(CarError::InvalidFormat(_))
    ));
}

#[test]
fn layout_tags_round_trip() {
    for raw in [9u16, 10, 12, 25, 34, 50, 1000, 1003, 1009, 1016, 4000] {
        assert_eq!(LayoutType::new(raw).value(), raw);
    }
    assert_eq!(LayoutType::new(4000), LayoutType::Other(4000));
    assert_eq!(PixelFormat::new(0).code(), "0x00000000");
}

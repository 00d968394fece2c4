use super::*;
use crate::key::attributes::Idiom;
use crate::support::{self, Attrs, CarBuilder, Csi};

fn sample() -> CarBuilder {
    CarBuilder::new()
        .facet("AppIcon", 1)
        .facet("Tint", 2)
        .appearance("NSAppearanceNameDarkAqua", 1)
        .rendition(
            Attrs::id(1).with(support::ATTR_IDIOM, 1),
            support::image_csi("AppIcon.png", 2, 2, [255, 0, 0, 255]),
        )
        .rendition(
            Attrs::id(2).with(support::ATTR_APPEARANCE, 1),
            Csi::new(support::LAYOUT_COLOR, "Tint").payload(support::colr(0, &[0.0, 0.0, 1.0, 1.0])),
        )
}

#[test]
fn opens_and_exposes_header() {
    let container = Container::from_bytes(sample().build()).unwrap();
    assert_eq!(container.header().rendition_count, 2);
    assert!(container.version_string().starts_with("@(#)PROGRAM:CoreUI"));
    assert_eq!(container.key_format().attributes.len(), 13);
}

#[test]
fn keys_resolve_facets_and_appearances() {
    let container = Container::from_bytes(sample().build()).unwrap();
    let keys = container.keys().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].name, "AppIcon");
    assert_eq!(keys[0].idiom, Idiom::Phone);
    assert_eq!(keys[1].name, "Tint");
    assert_eq!(
        keys[1].appearance.as_deref(),
        Some("NSAppearanceNameDarkAqua")
    );
}

#[test]
fn entries_carry_positions_and_headers() {
    let container = Container::from_bytes(sample().build()).unwrap();
    let entries: Vec<_> = container.entries().unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(entries[0].position, 0);
    assert_eq!(entries[1].position, 1);
    assert_eq!(
        entries[1].header.as_ref().unwrap().layout,
        LayoutType::Color
    );
}

#[test]
fn damaged_record_keeps_key_but_loses_header() {
    let builder = sample().raw_rendition(Attrs::id(9), b"garbage".to_vec());
    let container = Container::from_bytes(builder.build()).unwrap();
    let entries: Vec<_> = container.entries().unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(entries.len(), 3);
    assert!(entries[2].header.is_none());
    assert_eq!(entries[2].key.rendition_name, "");
}

#[test]
fn missing_variables_are_invalid_format() {
    let mut data = sample().build();
    // Rename the CARHEADER variable so it can no longer be found.
    let pos = data
        .windows(9)
        .position(|w| w == b"CARHEADER")
        .unwrap();
    data[pos] = b'X';
    assert!(matches!(
        Container::from_bytes(data),
        Err(CarError::InvalidFormat(_))
    ));
}

#[test]
fn open_reports_io_errors() {
    let err = Container::open(support::temp_dir("missing").join("none.car")).unwrap_err();
    assert!(matches!(err, CarError::Io(_)));
}

#[test]
fn side_tables_index_tokens_sets_and_atlas_members() {
    let builder = CarBuilder::new()
        .facet("Icon", 5)
        .rendition(
            Attrs::id(5),
            Csi::new(support::LAYOUT_MULTISIZE_SET, "Icon")
                .payload(support::sism(&[(16, 16, 0, 0), (32, 32, 1, 0)])),
        )
        .rendition(
            Attrs::id(6),
            support::image_csi("atlas", 4, 4, [0, 0, 0, 255]),
        );
    let atlas_tokens = builder.tokens(&Attrs::id(6));
    let builder = builder.rendition(
        Attrs::id(7),
        Csi::new(support::LAYOUT_INTERNAL_REFERENCE, "slice")
            .tlv(support::TLV_FRAME, support::frame_tlv(0, 0, 2, 2))
            .payload(support::inlk(&atlas_tokens)),
    );
    let container = Container::from_bytes(builder.build()).unwrap();
    let tables = container.side_tables();
    assert_eq!(tables.by_tokens.len(), 3);
    assert_eq!(tables.multisize_sets["Icon"].len(), 2);
    assert_eq!(
        tables.atlas_members[&atlas_tokens],
        vec![AtlasMember {
            rendition_name: "slice".to_string(),
            frame: (0, 0, 2, 2),
        }]
    );
}

#[test]
fn lookup_by_key_round_trips() {
    let container = Container::from_bytes(sample().build()).unwrap();
    for key in container.keys().unwrap() {
        let rendition = container.lookup(&key).unwrap().unwrap();
        assert_eq!(rendition.key, key);
    }
    let mut unknown = container.keys().unwrap().remove(0);
    unknown.attributes = vec![(RenditionAttribute::Identifier, 77)];
    assert!(container.lookup(&unknown).unwrap().is_none());
}

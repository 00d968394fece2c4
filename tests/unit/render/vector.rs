use super::*;

fn svg(body: &str) -> VectorDocument {
    VectorDocument {
        format: VectorFormat::Svg,
        bytes: format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2" viewBox="0 0 4 2">{body}</svg>"#
        )
        .into_bytes(),
    }
}

#[test]
fn svg_rasterizes_at_scale() {
    let doc = svg(r##"<rect x="0" y="0" width="4" height="2" fill="#ff0000"/>"##);
    let bitmap = rasterize_vector(&doc, 2.0).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (8, 4));
    assert_eq!(bitmap.pixel(4, 2), Some([255, 0, 0, 255]));
}

#[test]
fn uncovered_area_stays_transparent() {
    let doc = svg(r##"<rect x="0" y="0" width="2" height="2" fill="#0000ff"/>"##);
    let bitmap = rasterize_vector(&doc, 1.0).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (4, 2));
    assert_eq!(bitmap.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(bitmap.pixel(3, 1), Some([0, 0, 0, 0]));
}

#[test]
fn pdf_is_unsupported() {
    let doc = VectorDocument {
        format: VectorFormat::Pdf,
        bytes: b"%PDF-1.7\n".to_vec(),
    };
    assert!(rasterize_vector(&doc, 1.0).unwrap_err().is_unsupported());
}

#[test]
fn malformed_svg_is_invalid_format() {
    let doc = VectorDocument {
        format: VectorFormat::Svg,
        bytes: b"<svg".to_vec(),
    };
    assert!(matches!(
        rasterize_vector(&doc, 1.0),
        Err(CarError::InvalidFormat(_))
    ));
}

use super::*;
use crate::support::{self, LayerSpec};

#[test]
fn reads_layers_in_declared_order() {
    let payload = support::lays(
        &[9, 9],
        &[
            LayerSpec {
                frame: (0.0, 0.0, 4.0, 4.0),
                opacity: 1.0,
                blend_mode: 0,
                fixed_frame: false,
                target: vec![1, 2],
            },
            LayerSpec {
                frame: (1.0, 2.0, 2.0, 2.0),
                opacity: 1.5,
                blend_mode: 1,
                fixed_frame: true,
                target: vec![3],
            },
        ],
    );
    let stack = read_layer_stack(&payload).unwrap();
    assert_eq!(stack.radiosity, Some(vec![9, 9]));
    assert_eq!(stack.layers.len(), 2);
    assert_eq!(stack.layers[0].target, vec![1, 2]);
    assert_eq!(stack.layers[1].frame, Rect::new(1.0, 2.0, 3.0, 4.0));
    assert_eq!(stack.layers[1].opacity, 1.0);
    assert_eq!(stack.layers[1].blend_mode, 1);
    assert!(stack.layers[1].fixed_frame);
}

#[test]
fn empty_radiosity_is_none() {
    let stack = read_layer_stack(&support::lays(&[], &[])).unwrap();
    assert_eq!(stack.radiosity, None);
    assert!(stack.layers.is_empty());
}

#[test]
fn truncated_layer_is_invalid_format() {
    let mut payload = support::lays(
        &[],
        &[LayerSpec {
            frame: (0.0, 0.0, 1.0, 1.0),
            opacity: 1.0,
            blend_mode: 0,
            fixed_frame: false,
            target: vec![1, 2, 3],
        }],
    );
    payload.truncate(payload.len() - 2);
    assert!(matches!(
        read_layer_stack(&payload),
        Err(CarError::InvalidFormat(_))
    ));
}

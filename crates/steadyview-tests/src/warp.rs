//! Integration tests for the stabilizing warp renderer.

use crate::fixtures::{asymmetric_pattern, scene, shift_frame};
use steadyview_core::OPAQUE_BLACK;
use steadyview_effects::{apply_stabilization, stabilized};
use steadyview_tracking::Correction;

#[test]
fn identity_correction_is_byte_identical() {
    let original = scene(33, 17, 0, 0, 4);
    let mut frame = original.clone();
    apply_stabilization(&mut frame, &Correction::new(0.0, 0.0, 0));
    assert_eq!(frame.data, original.data);
}

#[test]
fn integer_warp_undoes_integer_shift() {
    let reference = scene(48, 40, 0, 0, 9);
    for (sx, sy) in [(3i32, -2i32), (-5, 4), (0, 6), (7, 0)] {
        let shifted = shift_frame(&reference, sx, sy);
        let restored = stabilized(&shifted, &Correction::new(sx as f32, sy as f32, 0));

        let x_range = (-sx).max(0)..(48 - sx.max(0));
        let y_range = (-sy).max(0)..(40 - sy.max(0));
        for y in y_range.clone() {
            for x in x_range.clone() {
                let got = restored.pixel(x as u32, y as u32);
                let want = reference.pixel(x as u32, y as u32);
                for c in 0..4 {
                    assert!(
                        (got[c] as i32 - want[c] as i32).abs() <= 1,
                        "shift ({sx}, {sy}) pixel ({x}, {y}): {got:?} vs {want:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn crop_blacks_border_and_leaves_interior() {
    let frame = scene(40, 30, 0, 0, 2);
    for k in [1u32, 4, 9] {
        let out = stabilized(&frame, &Correction::new(0.0, 0.0, k));
        for y in 0..30u32 {
            for x in 0..40u32 {
                let border = x < k || x >= 40 - k || y < k || y >= 30 - k;
                if border {
                    assert_eq!(out.pixel(x, y), OPAQUE_BLACK);
                } else {
                    assert_eq!(out.pixel(x, y), frame.pixel(x, y));
                }
            }
        }
    }
}

#[test]
fn crop_after_warp_still_masks_border() {
    let frame = scene(40, 30, 0, 0, 2);
    let out = stabilized(&frame, &Correction::new(-1.5, 0.25, 3));
    for x in 0..40 {
        assert_eq!(out.pixel(x, 0), OPAQUE_BLACK);
        assert_eq!(out.pixel(x, 29), OPAQUE_BLACK);
    }
    assert_ne!(out.pixel(20, 15), OPAQUE_BLACK);
}

#[test]
fn crop_of_half_the_short_side_blacks_everything() {
    let frame = scene(40, 30, 0, 0, 2);
    for k in [15u32, 16, 100] {
        let mut out = frame.clone();
        apply_stabilization(&mut out, &Correction::new(0.0, 0.0, k));
        assert!(out.pixels().iter().all(|p| *p == OPAQUE_BLACK), "crop {k}");
    }
}

#[test]
fn large_shifts_leave_most_pixels_black() {
    let frame = scene(64, 48, 0, 0, 6);
    for (dx, dy) in [(60.0, 0.0), (0.0, -45.0), (-55.3, 40.7), (64.0, 48.0)] {
        let out = stabilized(&frame, &Correction::new(dx, dy, 0));
        let black = out.pixels().iter().filter(|p| **p == OPAQUE_BLACK).count();
        let ratio = black as f32 / out.pixel_count() as f32;
        assert!(ratio > 0.8, "({dx}, {dy}) black ratio {ratio}");
    }
}

#[test]
fn orientation_is_preserved_under_fractional_warp() {
    let src = asymmetric_pattern(12, 12);
    let out = stabilized(&src, &Correction::new(0.0, 0.5, 0));
    // Rows inside the red band stay red; the band is still at the top.
    assert_eq!(out.pixel(5, 0), [255, 0, 0, 255]);
    assert_eq!(out.pixel(5, 2), [255, 0, 0, 255]);
    assert_eq!(out.pixel(5, 8), [0, 0, 255, 255]);
    // The marker column stays on the left.
    assert_eq!(out.pixel(1, 6), [0, 255, 0, 255]);
    // Row 3 samples halfway between the last red row and the first blue one.
    assert_eq!(out.pixel(5, 3), [128, 0, 128, 255]);
    // The bottom row needs source row 12.
    assert_eq!(out.pixel(5, 11), OPAQUE_BLACK);
}

#[test]
fn non_mutating_variant_leaves_input_alone() {
    let frame = scene(20, 20, 0, 0, 1);
    let before = frame.clone();
    let out = stabilized(&frame, &Correction::new(2.5, -1.0, 2));
    assert_eq!(frame, before);
    assert_eq!((out.width, out.height), (20, 20));
}

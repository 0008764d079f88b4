// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the viewport/crop calculator

use camera_preview::geometry::{CameraOutputSize, ViewportRect, compute_viewport};

fn size(width: u32, height: u32) -> CameraOutputSize {
    CameraOutputSize::new(width, height).unwrap()
}

#[test]
fn test_portrait_phone_with_1080p_camera() {
    let rect = compute_viewport(1080, 1920, size(1920, 1080));
    assert_eq!(
        rect,
        ViewportRect {
            x: 0,
            y: 656,
            width: 1080,
            height: 607
        }
    );
}

#[test]
fn test_landscape_display_fills_height() {
    let rect = compute_viewport(1920, 1080, size(1920, 1080));
    assert_eq!(
        rect,
        ViewportRect {
            x: 0,
            y: 0,
            width: 1920,
            height: 1080
        }
    );
}

#[test]
fn test_landscape_display_narrower_than_camera_overflows() {
    // 4:3 display, 16:9 camera: height fits, width spills on both sides
    let rect = compute_viewport(1440, 1080, size(1920, 1080));
    assert_eq!(rect.height, 1080);
    assert_eq!(rect.width, 1920);
    assert_eq!(rect.x, -240);
    assert_eq!(rect.y, 0);
}

#[test]
fn test_square_display_fits_width() {
    let rect = compute_viewport(1000, 1000, size(1600, 1200));
    assert_eq!(rect.width, 1000);
    assert_eq!(rect.height, 750);
    assert_eq!(rect.x, 0);
    assert_eq!(rect.y, 125);
}

#[test]
fn test_tiny_scale_never_drops_below_one_pixel() {
    let rect = compute_viewport(1, 4000, size(4000, 1));
    assert_eq!(rect.width, 1);
    assert_eq!(rect.height, 1);
}

#[test]
fn test_zero_display_is_treated_as_one_pixel() {
    let rect = compute_viewport(0, 0, size(640, 480));
    assert!(rect.width >= 1);
    assert!(rect.height >= 1);
}

#[test]
fn test_viewport_is_idempotent() {
    let camera = size(1280, 720);
    assert_eq!(
        compute_viewport(720, 1280, camera),
        compute_viewport(720, 1280, camera)
    );
}

#[test]
fn test_aspect_ratio_is_preserved() {
    let cases = [
        (1080, 1920, size(1920, 1080)),
        (2560, 1440, size(1280, 720)),
        (800, 1280, size(640, 480)),
        (1920, 1200, size(4032, 3024)),
    ];
    for (dw, dh, camera) in cases {
        let rect = compute_viewport(dw, dh, camera);
        let ratio = f64::from(rect.width) / f64::from(rect.height);
        assert!(
            (ratio - camera.aspect_ratio()).abs() < 0.01,
            "{dw}x{dh} with {camera} gave {rect}"
        );
    }
}

#[test]
fn test_viewport_is_centred() {
    let rect = compute_viewport(1080, 2400, size(1920, 1080));
    let top = i64::from(rect.y);
    let bottom = 2400 - (top + i64::from(rect.height));
    assert!((top - bottom).abs() <= 1);
}

#[test]
fn test_parse_size() {
    assert_eq!("1920x1080".parse::<CameraOutputSize>().unwrap(), size(1920, 1080));
    assert!("0x1080".parse::<CameraOutputSize>().is_err());
    assert!("1920".parse::<CameraOutputSize>().is_err());
}

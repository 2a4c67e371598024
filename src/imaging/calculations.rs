//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension matches exactly, the other may
/// exceed; neither is ever smaller than the target.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h.max(tgt_h))
    }
}

/// Offset of a centered `crop` window inside an `outer` area.
pub fn calculate_center_crop(outer: (u32, u32), crop: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(crop.0) / 2,
        outer.1.saturating_sub(crop.1) / 2,
    )
}

/// Calculate dimensions that fit inside a bounding box.
///
/// Aspect ratio is preserved and the longer side (relative to the box)
/// touches the box edge. A source that already fits is returned unchanged,
/// so this never upscales. Neither dimension drops below 1.
pub fn calculate_fit_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let max_aspect = max_w as f64 / max_h as f64;

    if src_aspect > max_aspect {
        let h = (max_w as f64 / src_aspect).round() as u32;
        (max_w, h.max(1))
    } else {
        let w = (max_h as f64 * src_aspect).round() as u32;
        (w.max(1), max_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // calculate_fill_dimensions tests
    // =========================================================================

    #[test]
    fn fill_wider_source_to_portrait_target() {
        // 800x600 (4:3) → 400x500 target
        // Source is wider, so height matches: 500, width = 500 * (4/3) = 667
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 500)), (667, 500));
    }

    #[test]
    fn fill_taller_source_to_landscape_target() {
        assert_eq!(calculate_fill_dimensions((600, 800), (500, 400)), (500, 667));
    }

    #[test]
    fn fill_same_aspect_ratio() {
        assert_eq!(calculate_fill_dimensions((800, 600), (400, 300)), (400, 300));
    }

    #[test]
    fn fill_square_target_from_landscape() {
        // 400x300 → 50x50: height matches, width = 50 * 4/3 = 67
        assert_eq!(calculate_fill_dimensions((400, 300), (50, 50)), (67, 50));
    }

    #[test]
    fn fill_upscales_small_sources() {
        assert_eq!(calculate_fill_dimensions((20, 10), (200, 200)), (400, 200));
    }

    #[test]
    fn fill_never_undershoots_target() {
        for source in [(1, 1000), (1000, 1), (333, 777), (1001, 999)] {
            let (w, h) = calculate_fill_dimensions(source, (75, 75));
            assert!(w >= 75 && h >= 75, "{source:?} -> {w}x{h}");
        }
    }

    // =========================================================================
    // calculate_center_crop tests
    // =========================================================================

    #[test]
    fn center_crop_offsets() {
        assert_eq!(calculate_center_crop((67, 50), (50, 50)), (8, 0));
        assert_eq!(calculate_center_crop((50, 67), (50, 50)), (0, 8));
        assert_eq!(calculate_center_crop((50, 50), (50, 50)), (0, 0));
    }

    // =========================================================================
    // calculate_fit_dimensions tests
    // =========================================================================

    #[test]
    fn fit_landscape_into_square() {
        assert_eq!(calculate_fit_dimensions((400, 300), (300, 300)), (300, 225));
    }

    #[test]
    fn fit_portrait_into_square() {
        assert_eq!(calculate_fit_dimensions((1500, 2000), (1000, 1000)), (750, 1000));
    }

    #[test]
    fn fit_keeps_small_sources() {
        assert_eq!(calculate_fit_dimensions((120, 90), (2000, 2000)), (120, 90));
        assert_eq!(calculate_fit_dimensions((300, 300), (300, 300)), (300, 300));
    }

    #[test]
    fn fit_extreme_aspect_keeps_one_pixel() {
        assert_eq!(calculate_fit_dimensions((5000, 2), (200, 200)), (200, 1));
    }

    #[test]
    fn fit_preserves_aspect_within_a_pixel() {
        let source = (1234, 567);
        let (w, h) = calculate_fit_dimensions(source, (500, 500));
        let expected_h = w as f64 * source.1 as f64 / source.0 as f64;
        assert!((h as f64 - expected_h).abs() <= 1.0);
    }
}

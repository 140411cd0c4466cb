/// Image size chosen by [`fit_within`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub width: f64,
    pub height: f64,
    /// True if the height bound was binding and the width was derived from it.
    pub fitted_to_height: bool,
}

/// Vertical space reserved for a caption: the font size plus `gap` above and below.
#[inline]
pub fn caption_band(caption_size: f64, gap: f64) -> f64 {
    caption_size + gap * 2.0
}

/// Fits an image of `aspect_ratio` (width / height) into `max_width` x `max_height`.
///
/// The image first takes the full width; if that makes it taller than `max_height`
/// it is re-fitted to the height instead. `max_height` is not checked for sign, so a
/// non-positive bound yields a non-positive size.
pub fn fit_within(max_width: f64, max_height: f64, aspect_ratio: f64) -> Fit {
    let height = max_width / aspect_ratio;
    if height > max_height {
        Fit {
            width: max_height * aspect_ratio,
            height: max_height,
            fitted_to_height: true,
        }
    } else {
        Fit {
            width: max_width,
            height,
            fitted_to_height: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_fills_width() {
        let f = fit_within(300.0, 400.0, 1.5);
        assert_eq!(f.width, 300.0);
        assert_eq!(f.height, 200.0);
        assert!(!f.fitted_to_height);
    }

    #[test]
    fn tall_image_is_clamped_to_height() {
        let f = fit_within(300.0, 100.0, 0.5);
        assert_eq!(f.height, 100.0);
        assert_eq!(f.width, 50.0);
        assert!(f.fitted_to_height);
    }

    #[test]
    fn negative_bound_passes_through() {
        let f = fit_within(100.0, -20.0, 2.0);
        assert_eq!(f.height, -20.0);
        assert_eq!(f.width, -40.0);
    }

    #[test]
    fn band_counts_gap_twice() {
        assert_eq!(caption_band(10.0, 5.0), 20.0);
        assert_eq!(caption_band(0.0, 0.0), 0.0);
    }
}

//! HSL colour helpers.

/// HSL (all components 0..=1, hue wraps) to linear RGB
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_channel(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(hsl_to_rgb(1.25, 0.8, 0.4), hsl_to_rgb(0.25, 0.8, 0.4)));
        assert!(close(hsl_to_rgb(-0.75, 0.8, 0.4), hsl_to_rgb(0.25, 0.8, 0.4)));
    }

    #[test]
    fn test_grey_when_unsaturated() {
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.7), [0.7, 0.7, 0.7]);
    }

    #[test]
    fn test_channels_stay_in_unit_range() {
        for i in 0..100 {
            let rgb = hsl_to_rgb(i as f32 * 0.071, 1.5, i as f32 * 0.013);
            assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }
}

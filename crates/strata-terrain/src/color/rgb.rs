//! RGB colors and HSL conversion.

/// An RGB color with channels in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

/// Hue, saturation and lightness, each in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hsl {
    /// Hue as a fraction of a full turn.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Construct from channels in `[0.0, 1.0]`.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Construct from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f64 / 255.0,
            g: ((hex >> 8) & 0xff) as f64 / 255.0,
            b: (hex & 0xff) as f64 / 255.0,
        }
    }

    /// Channels quantized to bytes, clamped and rounded.
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    /// Packed `0xRRGGBB` value.
    pub fn to_hex(self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }

    /// Convert to hue/saturation/lightness.
    pub fn to_hsl(self) -> Hsl {
        let Rgb { r, g, b } = self;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (min + max) / 2.0;

        if min == max {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let delta = max - min;
        let s = if l <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let h = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Hsl { h: h / 6.0, s, l }
    }

    /// Convert from hue/saturation/lightness. Hue wraps; saturation and
    /// lightness are clamped.
    pub fn from_hsl(hsl: Hsl) -> Self {
        let h = hsl.h.rem_euclid(1.0);
        let s = hsl.s.clamp(0.0, 1.0);
        let l = hsl.l.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::new(l, l, l);
        }

        let p = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let q = 2.0 * l - p;
        Self::new(
            hue_to_channel(q, p, h + 1.0 / 3.0),
            hue_to_channel(q, p, h),
            hue_to_channel(q, p, h - 1.0 / 3.0),
        )
    }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

/// Interpolate from `a` to `b` by `t` in HSL space.
///
/// Hue is interpolated linearly without wrapping. `t` of exactly 0 or 1
/// returns the corresponding input unchanged.
pub fn interpolate_hsl(a: Rgb, b: Rgb, t: f64) -> Rgb {
    if t == 0.0 {
        return a;
    }
    if t == 1.0 {
        return b;
    }
    let ha = a.to_hsl();
    let hb = b.to_hsl();
    Rgb::from_hsl(Hsl {
        h: ha.h + (hb.h - ha.h) * t,
        s: ha.s + (hb.s - ha.s) * t,
        l: ha.l + (hb.l - ha.l) * t,
    })
}

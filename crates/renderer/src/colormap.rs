//! Named color maps.
//!
//! `planck-like` and the classic matplotlib maps (`gray`, `hot`, `jet`) are
//! piecewise-linear channel ramps over [0, 1], the segment layout of
//! matplotlib's `LinearSegmentedColormap`. The perceptual maps come from
//! `colorous`. A `_r` suffix on any registered name gives the reversed map.

use std::fmt;

use colorous::Gradient;

use crate::error::{RenderError, Result};

/// `(x, value)` anchors of one channel, `x` strictly increasing from 0 to 1.
type Channel = &'static [(f32, f32)];

#[derive(Debug, Clone, Copy)]
struct Ramp {
    red: Channel,
    green: Channel,
    blue: Channel,
}

/// Planck-style diverging ramp: dark blue through white to dark red.
const PLANCK_LIKE: Ramp = Ramp {
    red: &[
        (0.0, 0.0),
        (0.1, 0.0),
        (0.2, 0.0),
        (0.3, 0.0),
        (0.4, 0.0),
        (0.5, 1.0),
        (0.6, 1.0),
        (0.7, 1.0),
        (0.8, 0.83),
        (0.9, 0.67),
        (1.0, 0.5),
    ],
    green: &[
        (0.0, 0.0),
        (0.1, 0.0),
        (0.2, 0.0),
        (0.3, 0.3),
        (0.4, 0.7),
        (0.5, 1.0),
        (0.6, 0.7),
        (0.7, 0.3),
        (0.8, 0.0),
        (0.9, 0.0),
        (1.0, 0.0),
    ],
    blue: &[
        (0.0, 0.5),
        (0.1, 0.67),
        (0.2, 0.83),
        (0.3, 1.0),
        (0.4, 1.0),
        (0.5, 1.0),
        (0.6, 0.0),
        (0.7, 0.0),
        (0.8, 0.0),
        (0.9, 0.0),
        (1.0, 0.0),
    ],
};

const GRAY: Ramp = Ramp {
    red: &[(0.0, 0.0), (1.0, 1.0)],
    green: &[(0.0, 0.0), (1.0, 1.0)],
    blue: &[(0.0, 0.0), (1.0, 1.0)],
};

const HOT: Ramp = Ramp {
    red: &[(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)],
    green: &[(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)],
    blue: &[(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)],
};

const JET: Ramp = Ramp {
    red: &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
    green: &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ],
    blue: &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
};

/// How a registered map turns `x` into a color.
#[derive(Clone, Copy)]
enum Source {
    /// Exact piecewise-linear channel definitions.
    Segments(Ramp),
    /// A `colorous` scheme, run backwards when `flipped`.
    Scheme { gradient: Gradient, flipped: bool },
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Segments(ramp) => f.debug_tuple("Segments").field(ramp).finish(),
            Source::Scheme { flipped, .. } => f.debug_struct("Scheme").field("flipped", flipped).finish(),
        }
    }
}

const fn scheme(gradient: Gradient) -> Source {
    Source::Scheme {
        gradient,
        flipped: false,
    }
}

/// Registered maps, in listing order.
const REGISTRY: &[(&str, Source)] = &[
    ("planck-like", Source::Segments(PLANCK_LIKE)),
    ("gray", Source::Segments(GRAY)),
    ("hot", Source::Segments(HOT)),
    ("jet", Source::Segments(JET)),
    ("viridis", scheme(colorous::VIRIDIS)),
    ("inferno", scheme(colorous::INFERNO)),
    ("magma", scheme(colorous::MAGMA)),
    ("plasma", scheme(colorous::PLASMA)),
    ("cividis", scheme(colorous::CIVIDIS)),
    ("turbo", scheme(colorous::TURBO)),
    // Blue at 0, red at 1.
    (
        "coolwarm",
        Source::Scheme {
            gradient: colorous::RED_BLUE,
            flipped: true,
        },
    ),
];

const REVERSED_SUFFIX: &str = "_r";

/// A color map resolved from the registry.
#[derive(Debug, Clone)]
pub struct ColorMap {
    name: String,
    source: Source,
    reversed: bool,
}

impl ColorMap {
    /// Look up `name`, honoring the `_r` suffix.
    pub fn by_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix(REVERSED_SUFFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        REGISTRY
            .iter()
            .find(|(registered, _)| *registered == base)
            .map(|(_, source)| Self {
                name: name.to_string(),
                source: *source,
                reversed,
            })
            .ok_or_else(|| RenderError::UnknownColorMap {
                name: name.to_string(),
                available: available().join(", "),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Color at `x` as `[r, g, b, a]` in [0, 1]. `x` is clamped to [0, 1].
    pub fn sample(&self, x: f32) -> [f32; 4] {
        let x = x.clamp(0.0, 1.0);
        let x = if self.reversed { 1.0 - x } else { x };
        match self.source {
            Source::Segments(ramp) => [
                interpolate(ramp.red, x),
                interpolate(ramp.green, x),
                interpolate(ramp.blue, x),
                1.0,
            ],
            Source::Scheme { gradient, flipped } => {
                let t = if flipped { 1.0 - x } else { x };
                let color = gradient.eval_continuous(f64::from(t));
                [unit(color.r), unit(color.g), unit(color.b), 1.0]
            }
        }
    }
}

/// Names accepted by [`ColorMap::by_name`] without the `_r` variants.
pub fn available() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

/// Returns `true` if `name` resolves to a registered map.
pub fn is_registered(name: &str) -> bool {
    ColorMap::by_name(name).is_ok()
}

fn unit(channel: u8) -> f32 {
    f32::from(channel) / 255.0
}

fn interpolate(anchors: Channel, x: f32) -> f32 {
    let upper = anchors.partition_point(|(ax, _)| *ax < x);
    if upper == 0 {
        return anchors[0].1;
    }
    if upper >= anchors.len() {
        return anchors[anchors.len() - 1].1;
    }
    let (x0, y0) = anchors[upper - 1];
    let (x1, y1) = anchors[upper];
    if x == x1 {
        return y1;
    }
    let t = (x - x0) / (x1 - x0);
    y0 + (y1 - y0) * t
}

//! Score-to-circle geometry for the 0–100 résumé score.
//!
//! The ring is drawn as a dashed stroke: the dash array is the full circumference
//! and the dash offset hides the unearned share of it. A score of 0 hides the
//! whole ring, a score of 100 hides nothing.

use std::f64::consts::PI;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::warn;

const MIN_SCORE: i64 = 0;
const MAX_SCORE: i64 = 100;

const TRACK_COLOR: &str = "#e5e7eb";
const GRADIENT_START: &str = "#FF97AD";
const GRADIENT_END: &str = "#5171FF";

// ────────────────────────────────────────────────────────────────────────────
// Sizes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ScoreSize {
    /// `(radius, stroke)` in view-box units.
    fn geometry(self) -> (f64, f64) {
        match self {
            ScoreSize::Small => (32.0, 6.0),
            ScoreSize::Medium => (40.0, 8.0),
            ScoreSize::Large => (60.0, 10.0),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Descriptor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCircle {
    pub circumference: f64,
    pub offset: f64,
    /// Radius of the stroke's centre line, i.e. the nominal radius minus half the stroke.
    pub radius: f64,
    pub stroke: f64,
    pub label: String,
}

/// Computes the ring for `score` at `size`. Scores outside 0–100 are clamped.
pub fn render(score: i64, size: ScoreSize) -> ScoreCircle {
    let clamped = score.clamp(MIN_SCORE, MAX_SCORE);
    if clamped != score {
        warn!("Score {score} is outside {MIN_SCORE}–{MAX_SCORE}; drawing it as {clamped}");
    }

    let (radius, stroke) = size.geometry();
    let effective_radius = radius - stroke / 2.0;
    let circumference = 2.0 * PI * effective_radius;
    let progress = clamped as f64 / MAX_SCORE as f64;

    ScoreCircle {
        circumference,
        offset: circumference * (1.0 - progress),
        radius: effective_radius,
        stroke,
        label: format!("{clamped}/100"),
    }
}

impl ScoreCircle {
    /// Standalone SVG: grey track, gradient progress arc starting at 12 o'clock,
    /// and the label centred on top.
    pub fn to_svg(&self) -> String {
        let mut svg = String::with_capacity(1024);
        // Writing into a String cannot fail.
        let _ = write!(
            svg,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%" viewBox="0 0 100 100">"##
        );
        let _ = write!(
            svg,
            r##"<defs><linearGradient id="grad" x1="1" y1="0" x2="0" y2="1"><stop offset="0%" stop-color="{GRADIENT_START}"/><stop offset="100%" stop-color="{GRADIENT_END}"/></linearGradient></defs>"##
        );
        let _ = write!(
            svg,
            r##"<g transform="rotate(-90 50 50)"><circle cx="50" cy="50" r="{r:.2}" stroke="{TRACK_COLOR}" stroke-width="{w}" fill="transparent"/><circle cx="50" cy="50" r="{r:.2}" stroke="url(#grad)" stroke-width="{w}" fill="transparent" stroke-dasharray="{c:.2}" stroke-dashoffset="{o:.2}" stroke-linecap="round"/></g>"##,
            r = self.radius,
            w = self.stroke,
            c = self.circumference,
            o = self.offset,
        );
        let _ = write!(
            svg,
            r##"<text x="50" y="50" text-anchor="middle" dominant-baseline="central" font-family="sans-serif" font-size="14" font-weight="600">{}</text></svg>"##,
            self.label
        );
        svg
    }
}

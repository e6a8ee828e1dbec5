//! Adds SVG path geometry to a [`PolygonMeshBuilder`] and exports its active
//! loops as SVG for debugging.
//!
//! Paths are taken as they are: loops keep the winding of their path data,
//! so solid shapes must run counter-clockwise in the builder's y-up frame.

mod path;

pub use path::{PathCommand, SvgPath};

use std::f64::consts::TAU;
use std::fmt::Write;

use tracing::warn;

use crate::builder::PolygonMeshBuilder;
use crate::error::{Result, SvgError};
use crate::math::{Vector2, TOLERANCE};

/// Number of segments used for circles.
const CIRCLE_SEGMENTS: u32 = 24;

/// What to do with path commands that cannot become edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedPolicy {
    /// Skip them, logging a warning.
    #[default]
    Ignore,
    /// Fail with [`SvgError::UnsupportedCommand`].
    Error,
}

/// Options for [`PolygonMeshBuilder::add_path`] and
/// [`PolygonMeshBuilder::add_paths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgOptions {
    pub unsupported: UnsupportedPolicy,
    /// Chords per cubic Bézier segment.
    pub curve_segments: usize,
    /// Scale both axes equally when fitting paths into a target rectangle.
    pub keep_aspect_ratio: bool,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            unsupported: UnsupportedPolicy::Ignore,
            curve_segments: 6,
            keep_aspect_ratio: true,
        }
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum corner.
    pub position: Vector2,
    pub size: Vector2,
}

impl Rect {
    #[must_use]
    pub fn new(position: Vector2, size: Vector2) -> Self {
        Self { position, size }
    }

    #[must_use]
    pub fn max(&self) -> Vector2 {
        self.position + self.size
    }

    /// Smallest rectangle containing both `self` and `point`.
    #[must_use]
    pub fn including(&self, point: Vector2) -> Self {
        let min = self.position.inf(&point);
        let max = self.max().sup(&point);
        Self::new(min, max - min)
    }

    /// Smallest rectangle containing both rectangles.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Self {
        self.including(other.position).including(other.max())
    }
}

/// Maps path coordinates into the builder: `offset + p * scale`.
#[derive(Debug, Clone, Copy)]
struct Placement {
    offset: Vector2,
    scale: Vector2,
}

impl Placement {
    fn identity() -> Self {
        Self {
            offset: Vector2::zeros(),
            scale: Vector2::new(1.0, 1.0),
        }
    }

    /// Maps `bounds` onto `target`, centred along the looser axis when the
    /// aspect ratio is kept.
    fn fit(bounds: &Rect, target: &Rect, keep_aspect_ratio: bool) -> Self {
        let ratio = |target: f64, source: f64| {
            if source.abs() <= TOLERANCE {
                1.0
            } else {
                target / source
            }
        };
        let mut scale = Vector2::new(
            ratio(target.size.x, bounds.size.x),
            ratio(target.size.y, bounds.size.y),
        );

        let mut offset = target.position - bounds.position.component_mul(&scale);

        if keep_aspect_ratio {
            let uniform = scale.x.min(scale.y);
            scale = Vector2::new(uniform, uniform);
            offset = target.position - bounds.position * uniform
                + (target.size - bounds.size * uniform) * 0.5;
        }

        Self { offset, scale }
    }
}

impl PolygonMeshBuilder {
    /// Adds an edge loop for every closed subpath, circle and closed polygon
    /// of a filled path.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError::UnsupportedCommand`] for unsupported commands when
    /// [`SvgOptions::unsupported`] is [`UnsupportedPolicy::Error`]. Loops
    /// added before the failing command stay in the builder.
    pub fn add_path(&mut self, path: &SvgPath, options: &SvgOptions) -> Result<&mut Self> {
        self.add_placed_path(path, options, Placement::identity())
    }

    /// Adds several paths, optionally fitting their combined bounds into
    /// `target`.
    ///
    /// # Errors
    ///
    /// See [`add_path`](Self::add_path).
    pub fn add_paths(
        &mut self,
        paths: &[SvgPath],
        options: &SvgOptions,
        target: Option<Rect>,
    ) -> Result<&mut Self> {
        let bounds = paths
            .iter()
            .filter_map(SvgPath::bounds)
            .reduce(|a, b| a.union(&b));

        let placement = match (target, bounds) {
            (Some(target), Some(bounds)) => {
                Placement::fit(&bounds, &target, options.keep_aspect_ratio)
            }
            _ => Placement::identity(),
        };

        for path in paths {
            self.add_placed_path(path, options, placement)?;
        }

        Ok(self)
    }

    fn add_placed_path(
        &mut self,
        path: &SvgPath,
        options: &SvgOptions,
        placement: Placement,
    ) -> Result<&mut Self> {
        if !path.filled {
            return Ok(self);
        }

        let Placement { offset, scale } = placement;
        let mut open = Vec::new();
        let mut start = Vector2::zeros();
        let mut last = Vector2::zeros();

        for command in &path.commands {
            match command {
                PathCommand::MoveTo(p) => {
                    open.clear();
                    open.push(*p);
                    start = *p;
                }
                PathCommand::LineTo(p) => open.push(*p),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => flatten_cubic(
                    &mut open,
                    [last, *control1, *control2, *end],
                    options.curve_segments,
                ),
                PathCommand::Circle { center, radius } => {
                    let points = circle_points(*center, *radius);
                    self.add_edge_loop_transformed(&points, offset, scale, false)?;
                }
                PathCommand::Polygon { points, closed } => {
                    if *closed && points.len() >= 3 {
                        self.add_edge_loop_transformed(points, offset, scale, false)?;
                    }
                }
                PathCommand::ClosePath => {
                    if open.len() >= 3 {
                        self.add_edge_loop_transformed(&open, offset, scale, false)?;
                    }
                    // Drawing may continue from the start without a move.
                    open.clear();
                    open.push(start);
                }
                PathCommand::Unsupported(name) => match options.unsupported {
                    UnsupportedPolicy::Ignore => {
                        warn!(command = %name, "skipping unsupported SVG path command");
                    }
                    UnsupportedPolicy::Error => {
                        return Err(SvgError::UnsupportedCommand(name.clone()).into());
                    }
                },
            }

            if let Some(&p) = open.last() {
                last = p;
            }
        }

        Ok(self)
    }

    /// The active loops as an SVG document, one `<polygon>` per loop.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let mut out = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\">\n");

        for points in self.active_loops() {
            out.push_str("  <polygon points=\"");
            for p in points {
                let _ = write!(out, "{},{} ", p.x, p.y);
            }
            out.push_str("\" fill=\"black\" stroke=\"red\" />\n");
        }

        out.push_str("</svg>\n");
        out
    }
}

/// Appends `segments` points along a cubic Bézier, excluding its start.
fn flatten_cubic(out: &mut Vec<Vector2>, [p0, p1, p2, p3]: [Vector2; 4], segments: usize) {
    let segments = segments.max(1);

    for i in 1..=segments {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / segments as f64;
        let s = 1.0 - t;

        out.push(p0 * (s * s * s) + p1 * (3.0 * s * s * t) + p2 * (3.0 * s * t * t) + p3 * (t * t * t));
    }
}

/// Counter-clockwise polygon approximating a circle.
fn circle_points(center: Vector2, radius: f64) -> Vec<Vector2> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = f64::from(i) * TAU / f64::from(CIRCLE_SEGMENTS);
            center + Vector2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

use svgtypes::{PathParser, PathSegment};

use crate::error::{Result, SvgError};
use crate::math::Vector2;

use super::Rect;

/// One drawing command of an SVG path, in absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    /// Starts a new subpath.
    MoveTo(Vector2),
    LineTo(Vector2),
    /// Cubic Bézier from the current point.
    CubicTo {
        control1: Vector2,
        control2: Vector2,
        end: Vector2,
    },
    /// A closed circle, independent of the current subpath.
    Circle { center: Vector2, radius: f64 },
    /// A `<polygon>` (closed) or `<polyline>` (open) element.
    Polygon { points: Vec<Vector2>, closed: bool },
    /// Closes the current subpath.
    ClosePath,
    /// A command this crate cannot turn into edges.
    Unsupported(String),
}

/// A path element: its commands and whether it is filled.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub commands: Vec<PathCommand>,
    /// Unfilled paths are outlines only and produce no loops.
    pub filled: bool,
}

impl SvgPath {
    /// A filled path made of `commands`.
    #[must_use]
    pub fn new(commands: Vec<PathCommand>) -> Self {
        Self {
            commands,
            filled: true,
        }
    }

    /// Parses SVG path data (the `d` attribute) into a filled path.
    ///
    /// `M`, `L`, `H`, `V`, `C`, `S` and `Z` map onto commands in absolute
    /// coordinates. Quadratic curves and arcs become
    /// [`PathCommand::Unsupported`], though the current point still moves to
    /// their end.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError::MalformedPathData`] if the data does not parse.
    pub fn parse(data: &str) -> Result<Self> {
        let mut commands = Vec::new();
        let mut current = Vector2::zeros();
        let mut subpath_start = current;
        let mut last_control: Option<Vector2> = None;

        for segment in PathParser::from(data) {
            let mut control = None;

            match segment.map_err(SvgError::from)? {
                PathSegment::MoveTo { abs, x, y } => {
                    current = resolve(current, abs, x, y);
                    subpath_start = current;
                    commands.push(PathCommand::MoveTo(current));
                }
                PathSegment::LineTo { abs, x, y } => {
                    current = resolve(current, abs, x, y);
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::HorizontalLineTo { abs, x } => {
                    current.x = if abs { x } else { current.x + x };
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::VerticalLineTo { abs, y } => {
                    current.y = if abs { y } else { current.y + y };
                    commands.push(PathCommand::LineTo(current));
                }
                PathSegment::CurveTo {
                    abs,
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    let control1 = resolve(current, abs, x1, y1);
                    let control2 = resolve(current, abs, x2, y2);
                    let end = resolve(current, abs, x, y);
                    current = cubic_to(&mut commands, control1, control2, end);
                    control = Some(control2);
                }
                PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                    // First control mirrors the previous cubic's second one.
                    let control1 = last_control.map_or(current, |c| current * 2.0 - c);
                    let control2 = resolve(current, abs, x2, y2);
                    let end = resolve(current, abs, x, y);
                    current = cubic_to(&mut commands, control1, control2, end);
                    control = Some(control2);
                }
                PathSegment::Quadratic { abs, x, y, .. } => {
                    commands.push(unsupported('Q', abs));
                    current = resolve(current, abs, x, y);
                }
                PathSegment::SmoothQuadratic { abs, x, y } => {
                    commands.push(unsupported('T', abs));
                    current = resolve(current, abs, x, y);
                }
                PathSegment::EllipticalArc { abs, x, y, .. } => {
                    commands.push(unsupported('A', abs));
                    current = resolve(current, abs, x, y);
                }
                PathSegment::ClosePath { .. } => {
                    commands.push(PathCommand::ClosePath);
                    current = subpath_start;
                }
            }

            last_control = control;
        }

        Ok(Self::new(commands))
    }

    /// Bounds of every point the path references, control points included.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        let mut add = |p: Vector2| {
            bounds = Some(match bounds {
                Some(rect) => rect.including(p),
                None => Rect::new(p, Vector2::zeros()),
            });
        };

        for command in &self.commands {
            match command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => add(*p),
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    add(*control1);
                    add(*control2);
                    add(*end);
                }
                PathCommand::Circle { center, radius } => {
                    let r = Vector2::new(*radius, *radius);
                    add(center - r);
                    add(center + r);
                }
                PathCommand::Polygon { points, .. } => points.iter().copied().for_each(&mut add),
                PathCommand::ClosePath | PathCommand::Unsupported(_) => {}
            }
        }

        bounds
    }
}

/// `(x, y)` in absolute coordinates.
fn resolve(current: Vector2, abs: bool, x: f64, y: f64) -> Vector2 {
    let point = Vector2::new(x, y);
    if abs {
        point
    } else {
        current + point
    }
}

fn cubic_to(
    commands: &mut Vec<PathCommand>,
    control1: Vector2,
    control2: Vector2,
    end: Vector2,
) -> Vector2 {
    commands.push(PathCommand::CubicTo {
        control1,
        control2,
        end,
    });
    end
}

fn unsupported(letter: char, abs: bool) -> PathCommand {
    let letter = if abs { letter } else { letter.to_ascii_lowercase() };
    PathCommand::Unsupported(letter.to_string())
}

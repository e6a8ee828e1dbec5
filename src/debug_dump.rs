//! Reproducible snapshots of failing inputs.
//!
//! A [`DebugDump`] stores the loops fed to a builder together with the edge
//! profile applied to them and the error they caused. Dumps are saved as
//! JSON, so a failure seen elsewhere can be loaded, replayed and shrunk with
//! [`DebugDump::reduce`].

use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::PolygonMeshBuilder;
use crate::error::{DumpError, Result};
use crate::math::Vector2;
use crate::pool::BuilderPool;

/// Profile applied to the outline before filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EdgeStyle {
    /// No bevel, just a flat fill.
    #[default]
    Sharp,
    /// One 45 degree bevel.
    Bevel,
    /// A convex, smooth quarter circle.
    Round,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DebugDump {
    /// Message of the error the dump was taken for.
    #[serde(default)]
    pub exception: Option<String>,
    /// Loops in the format written by [`serialize_edge_loops`].
    pub edge_loops: String,
    pub edge_style: EdgeStyle,
    pub edge_width: f64,
    /// Faces of a [`EdgeStyle::Round`] profile.
    pub edge_faces: usize,
}

impl DebugDump {
    #[must_use]
    pub fn new<P: AsRef<[Vector2]>>(
        loops: &[P],
        edge_style: EdgeStyle,
        edge_width: f64,
        edge_faces: usize,
    ) -> Self {
        Self {
            exception: None,
            edge_loops: serialize_edge_loops(loops),
            edge_style,
            edge_width,
            edge_faces,
        }
    }

    /// Records the error this dump reproduces.
    #[must_use]
    pub fn with_exception(mut self, error: &impl Display) -> Self {
        self.exception = Some(error.to_string());
        self
    }

    /// # Errors
    ///
    /// Returns [`DumpError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(DumpError::from)?)
    }

    /// Loads a dump written by [`to_json`](Self::to_json).
    ///
    /// Unknown fields are ignored and a missing `Exception` reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::Json`] if `json` is not a valid dump.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(DumpError::from)?)
    }

    /// # Errors
    ///
    /// Returns [`DumpError::MalformedLoop`] if the stored loops cannot be read.
    pub fn loops(&self) -> Result<Vec<Vec<Vector2>>> {
        deserialize_edge_loops(&self.edge_loops)
    }

    /// Adds the stored loops to `builder`.
    ///
    /// # Errors
    ///
    /// Fails if the loops cannot be read or a loop has fewer than 3 points.
    pub fn init(&self, builder: &mut PolygonMeshBuilder) -> Result<()> {
        init(builder, &self.loops()?)
    }

    /// Applies the stored edge profile.
    ///
    /// # Errors
    ///
    /// Whatever the underlying bevels return.
    pub fn bevel(&self, builder: &mut PolygonMeshBuilder) -> Result<()> {
        let width = self.edge_width;

        match self.edge_style {
            EdgeStyle::Sharp => {}
            EdgeStyle::Bevel => {
                builder.bevel(width, width)?;
            }
            EdgeStyle::Round => {
                builder.arc(width, width, self.edge_faces, true, true)?;
            }
        }

        Ok(())
    }

    /// # Errors
    ///
    /// See [`PolygonMeshBuilder::fill`].
    pub fn fill(&self, builder: &mut PolygonMeshBuilder) -> Result<()> {
        builder.fill()?;
        Ok(())
    }

    /// Replays the whole dump on `builder`: [`init`](Self::init),
    /// [`bevel`](Self::bevel), then [`fill`](Self::fill).
    ///
    /// # Errors
    ///
    /// The first error any step returns.
    pub fn run(&self, builder: &mut PolygonMeshBuilder) -> Result<()> {
        self.init(builder)?;
        self.bevel(builder)?;
        self.fill(builder)
    }

    /// Shrinks the dump to the loops that fail on their own, each with as
    /// many vertices removed as possible while it keeps failing.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::MalformedLoop`] if the stored loops cannot be read.
    pub fn reduce(&self) -> Result<Self> {
        let pool = BuilderPool::new();
        let mut builder = pool.acquire();
        let mut failing = Vec::new();

        for mut points in self.loops()? {
            if !self.fails_alone(&mut builder, &points) {
                continue;
            }

            if points.len() >= 4 {
                for j in (0..points.len()).rev() {
                    if points.len() <= 3 {
                        break;
                    }

                    let removed = points.remove(j);
                    if !self.fails_alone(&mut builder, &points) {
                        points.insert(j, removed);
                    }
                }
            }

            debug!(vertices = points.len(), "reduced failing loop");
            failing.push(points);
        }

        Ok(Self {
            edge_loops: serialize_edge_loops(&failing),
            ..self.clone()
        })
    }

    fn fails_alone(&self, builder: &mut PolygonMeshBuilder, points: &[Vector2]) -> bool {
        builder.clear();

        let result = init(builder, &[points])
            .and_then(|()| self.bevel(builder))
            .and_then(|()| self.fill(builder));

        result.is_err()
    }
}

fn init<P: AsRef<[Vector2]>>(builder: &mut PolygonMeshBuilder, loops: &[P]) -> Result<()> {
    for points in loops {
        builder.add_edge_loop(points.as_ref(), false)?;
    }
    Ok(())
}

/// Writes each loop on its own line as `x,y;x,y;...`.
#[must_use]
pub fn serialize_edge_loops<P: AsRef<[Vector2]>>(loops: &[P]) -> String {
    let mut out = String::new();

    for points in loops {
        for p in points.as_ref() {
            let _ = write!(out, "{},{};", p.x, p.y);
        }
        out.push('\n');
    }

    out
}

/// Reads loops written by [`serialize_edge_loops`], stopping at the first
/// empty line.
///
/// # Errors
///
/// Returns [`DumpError::MalformedLoop`] naming the first bad line (1-based).
pub fn deserialize_edge_loops(source: &str) -> Result<Vec<Vec<Vector2>>> {
    let mut loops = Vec::new();

    for (i, line) in source.lines().enumerate() {
        let malformed = |reason: String| DumpError::MalformedLoop { line: i + 1, reason };

        let mut points = Vec::new();
        for entry in line.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (x, y) = entry
                .split_once(',')
                .ok_or_else(|| malformed(format!("expected `x,y`, got `{entry}`")))?;
            let parse = |s: &str| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("bad coordinate `{s}`: {e}")))
            };
            points.push(Vector2::new(parse(x)?, parse(y)?));
        }

        if points.is_empty() {
            break;
        }
        loops.push(points);
    }

    Ok(loops)
}

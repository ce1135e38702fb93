//! Waypoint preview for the grid overlay
//!
//! Walks a script without running it and collects the points the carriage
//! would visit. Lines that fail to parse are skipped and reported.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::parser::{parse_command, script_lines, Command};

/// Where a preview point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewKind {
    /// A `GO` target
    Go,
    /// First point of a `CYCLE`
    CycleStart,
    /// Second point of a `CYCLE`
    CycleEnd,
}

/// A point to draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewPoint {
    /// Machine coordinates (work coordinates plus offset)
    pub position: DVec2,
    /// Origin of the point
    pub kind: PreviewKind,
    /// 1-based script line
    pub line: usize,
}

/// Result of previewing a script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptPreview {
    /// Points in visiting order
    pub points: Vec<PreviewPoint>,
    /// Lines that did not parse
    pub skipped: Vec<usize>,
}

impl ScriptPreview {
    /// Build a preview of `script` with the work origin at `offset`
    ///
    /// A one-argument `GO` reuses the Y of the previous point, starting at 0.
    pub fn build(script: &str, offset: DVec2) -> Self {
        let mut preview = Self::default();
        let mut last = DVec2::ZERO;

        for (line, text) in script_lines(script) {
            let command = match parse_command(text) {
                Ok(command) => command,
                Err(_) => {
                    preview.skipped.push(line);
                    continue;
                }
            };

            match command {
                Command::Go { x, y } => {
                    last = DVec2::new(x, y.unwrap_or(last.y));
                    preview.push(last + offset, PreviewKind::Go, line);
                }
                Command::Cycle(spec) => {
                    preview.push(spec.a + offset, PreviewKind::CycleStart, line);
                    preview.push(spec.b + offset, PreviewKind::CycleEnd, line);
                    preview.push(spec.a + offset, PreviewKind::CycleStart, line);
                    last = spec.a;
                }
                Command::End => break,
                _ => {}
            }
        }

        preview
    }

    fn push(&mut self, position: DVec2, kind: PreviewKind, line: usize) {
        self.points.push(PreviewPoint {
            position,
            kind,
            line,
        });
    }

    /// Smallest box holding every point, `None` when there are no points
    pub fn bounds(&self) -> Option<(DVec2, DVec2)> {
        let first = self.points.first()?.position;
        Some(self.points.iter().fold((first, first), |(min, max), p| {
            (min.min(p.position), max.max(p.position))
        }))
    }

    /// Whether any point was found
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Shorthand for [`ScriptPreview::build`] returning only the positions
pub fn preview_points(script: &str, offset: DVec2) -> Vec<DVec2> {
    ScriptPreview::build(script, offset)
        .points
        .into_iter()
        .map(|p| p.position)
        .collect()
}

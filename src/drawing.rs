//! In-progress arrow gesture.
//!
//! One owned [`ArrowDrawing`] holds the current drag; the canvas calls its
//! handlers with container-local points. Nothing here touches history: a
//! drag only reaches the store once it is released over a target marker.

use crate::geometry::{self, distance_between_points};
use crate::model::{Arrow, ArrowDraft, ArrowMode, Id, Marker, Point, UnfinishedArrow};
use std::collections::BTreeSet;

/// Freehand drags record a waypoint whenever the pointer gets this far
/// (Chebyshev) from the previous one.
pub const FREEHAND_SAMPLE_DISTANCE: f32 = 5.0;

#[derive(Clone, Debug, Default)]
pub struct ArrowDrawing {
    current: Option<UnfinishedArrow>,
}

impl ArrowDrawing {
    pub fn current(&self) -> Option<&UnfinishedArrow> {
        self.current.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    pub fn begin_from_marker(&mut self, marker: &Marker, point: Point) {
        self.current = Some(UnfinishedArrow {
            from_marker: marker.id,
            from_point: point,
            mid_points: Vec::new(),
            to_marker: None,
            to_point: point,
            dependencies: BTreeSet::from([marker.id]),
        });
    }

    /// Starts a new arrow on the nearest point of an existing one. The new
    /// arrow inherits everything the old one depends on.
    pub fn begin_from_arrow(&mut self, arrow: &Arrow, point: Point) -> geometry::Result<()> {
        let from_point = geometry::point_on_polyline_near_point(point, &arrow.polyline())?;
        let mut dependencies = arrow.dependencies.clone();
        dependencies.insert(arrow.id);
        dependencies.insert(arrow.from_marker);
        self.current = Some(UnfinishedArrow {
            from_marker: arrow.from_marker,
            from_point,
            mid_points: Vec::new(),
            to_marker: None,
            to_point: point,
            dependencies,
        });
        Ok(())
    }

    pub fn pointer_moved(&mut self, point: Point, hovered: Option<Id>, mode: ArrowMode) {
        let Some(drag) = self.current.as_mut() else {
            return;
        };
        if mode == ArrowMode::Freehand {
            let last = drag.mid_points.last().copied().unwrap_or(drag.from_point);
            if distance_between_points(point, last) > FREEHAND_SAMPLE_DISTANCE {
                drag.mid_points.push(point);
            }
        }
        drag.to_point = point;
        drag.to_marker = hovered.filter(|id| *id != drag.from_marker);
    }

    /// Pins a waypoint in jointed mode.
    pub fn add_joint(&mut self, point: Point) {
        if let Some(drag) = self.current.as_mut() {
            drag.mid_points.push(point);
            drag.to_point = point;
        }
    }

    /// Ends the gesture. Only a release over a marker other than the origin
    /// produces an arrow.
    pub fn pointer_released(&mut self, point: Point, target: Option<Id>) -> Option<ArrowDraft> {
        let drag = self.current.take()?;
        let to_marker = target.filter(|id| *id != drag.from_marker)?;
        let mut dependencies = drag.dependencies;
        dependencies.insert(to_marker);
        Some(ArrowDraft {
            from_marker: drag.from_marker,
            from_point: drag.from_point,
            mid_points: drag.mid_points,
            to_marker,
            to_point: point,
            dependencies,
        })
    }

    pub fn cancel(&mut self) {
        self.current = None;
    }
}

use codemark::geometry::{distance_to_polyline, is_point_in_rect};
use codemark::model::{Id, Point, Rect};
use codemark::store::State;
use eframe::egui;

pub(super) const CANVAS_PADDING: f32 = 12.0;
pub(super) const HIT_THRESHOLD: f32 = 6.0;

// Container origin is the top-left corner of the first character.
#[derive(Clone, Copy, Debug)]
pub(super) struct CodeLayout {
    pub origin: egui::Pos2,
    pub char_width: f32,
    pub line_height: f32,
    pub gutter_width: f32,
}

impl CodeLayout {
    pub fn measure(
        painter: &egui::Painter,
        canvas_min: egui::Pos2,
        font: &egui::FontId,
        line_count: usize,
    ) -> Self {
        let sample = painter.layout_no_wrap("0".repeat(16), font.clone(), egui::Color32::WHITE);
        let char_width = sample.size().x / 16.0;
        let line_height = sample.size().y;
        let digits = line_count.max(1).to_string().len() as f32;
        // Room for the digits plus the line annotation bars.
        let gutter_width = (digits + 4.0) * char_width;
        Self {
            origin: canvas_min + egui::vec2(gutter_width + CANVAS_PADDING, CANVAS_PADDING),
            char_width,
            line_height,
            gutter_width,
        }
    }

    pub fn content_size(&self, lines: &[&str]) -> egui::Vec2 {
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        egui::vec2(
            self.gutter_width + CANVAS_PADDING * 2.0 + widest as f32 * self.char_width,
            CANVAS_PADDING * 2.0 + lines.len() as f32 * self.line_height,
        )
    }

    pub fn to_container(&self, pos: egui::Pos2) -> Point {
        Point::new(pos.x - self.origin.x, pos.y - self.origin.y)
    }

    pub fn to_screen(&self, p: Point) -> egui::Pos2 {
        self.origin + egui::vec2(p.x, p.y)
    }

    pub fn screen_rect(&self, rect: &Rect) -> egui::Rect {
        rect.to_rect().translate(self.origin.to_vec2())
    }

    pub fn in_gutter(&self, p: Point) -> bool {
        p.x < -CANVAS_PADDING && p.x >= -(CANVAS_PADDING + self.gutter_width)
    }

    pub fn line_at(&self, y: f32, line_count: usize) -> Option<u32> {
        if y < 0.0 {
            return None;
        }
        let index = (y / self.line_height).floor() as usize;
        (index < line_count).then(|| index as u32 + 1)
    }

    pub fn line_top(&self, line: u32) -> f32 {
        line.saturating_sub(1) as f32 * self.line_height
    }

    // Snapped to columns on the line where the drag started.
    pub fn text_selection(&self, start: Point, end: Point, lines: &[&str]) -> Option<(Rect, u32)> {
        let line = self.line_at(start.y, lines.len())?;
        let len = lines[line as usize - 1].chars().count() as f32;
        let column = |x: f32| (x / self.char_width).round().clamp(0.0, len);
        let (a, b) = (column(start.x), column(end.x));
        if a == b {
            return None;
        }
        let rect = Rect::from_ltwh(
            a.min(b) * self.char_width,
            self.line_top(line),
            (a - b).abs() * self.char_width,
            self.line_height,
        );
        Some((rect, line))
    }
}

pub(super) fn marker_at(state: &State, p: Point) -> Option<Id> {
    state
        .markers
        .iter()
        .rev()
        .find(|m| is_point_in_rect(p, &m.rect))
        .map(|m| m.id)
}

pub(super) fn arrow_at(state: &State, p: Point) -> Option<Id> {
    state
        .arrows
        .iter()
        .rev()
        .find(|a| {
            let path = if state.show_straight_arrows {
                vec![a.from_point, a.to_point]
            } else {
                a.polyline()
            };
            distance_to_polyline(p, &path).is_some_and(|d| d <= HIT_THRESHOLD)
        })
        .map(|a| a.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemark::model::{Arrow, Marker};
    use std::collections::BTreeSet;

    fn layout() -> CodeLayout {
        CodeLayout {
            origin: egui::pos2(50.0, 12.0),
            char_width: 8.0,
            line_height: 16.0,
            gutter_width: 26.0,
        }
    }

    #[test]
    fn lines_are_one_based_and_bounded() {
        let l = layout();
        assert_eq!(l.line_at(-1.0, 3), None);
        assert_eq!(l.line_at(0.0, 3), Some(1));
        assert_eq!(l.line_at(40.0, 3), Some(3));
        assert_eq!(l.line_at(48.0, 3), None);
        assert_eq!(l.line_top(3), 32.0);
    }

    #[test]
    fn text_selection_snaps_to_characters_on_the_start_line() {
        let l = layout();
        let lines = ["fn main() {", "    run();", "}"];
        let (rect, line) = l
            .text_selection(Point::new(33.0, 20.0), Point::new(75.0, 40.0), &lines)
            .unwrap();
        assert_eq!(line, 2);
        assert_eq!(rect, Rect::from_ltwh(32.0, 16.0, 40.0, 16.0));
    }

    #[test]
    fn text_selection_is_clamped_and_ignores_empty_spans() {
        let l = layout();
        let lines = ["ab", "abcd"];
        let (rect, _) = l
            .text_selection(Point::new(500.0, 2.0), Point::new(-40.0, 2.0), &lines)
            .unwrap();
        assert_eq!(rect, Rect::from_ltwh(0.0, 0.0, 16.0, 16.0));
        assert!(
            l.text_selection(Point::new(9.0, 2.0), Point::new(7.0, 2.0), &lines)
                .is_none()
        );
    }

    #[test]
    fn screen_and_container_coordinates_round_trip() {
        let l = layout();
        let p = l.to_container(egui::pos2(58.0, 28.0));
        assert_eq!(p, Point::new(8.0, 16.0));
        assert_eq!(l.to_screen(p), egui::pos2(58.0, 28.0));
        assert!(l.in_gutter(Point::new(-20.0, 0.0)));
        assert!(!l.in_gutter(Point::new(-5.0, 0.0)));
    }

    #[test]
    fn hit_testing_prefers_the_topmost_entity() {
        let mut state = State::default();
        for (id, left) in [(1, 0.0), (2, 4.0)] {
            state.markers.push(Marker {
                id,
                rect: Rect::from_ltwh(left, 0.0, 10.0, 10.0),
                color: "gold".to_string(),
            });
        }
        state.arrows.push(Arrow {
            id: 3,
            from_marker: 1,
            from_point: Point::new(5.0, 5.0),
            mid_points: vec![Point::new(50.0, 80.0)],
            to_marker: 2,
            to_point: Point::new(100.0, 5.0),
            color: None,
            dependencies: BTreeSet::from([1, 2]),
        });
        assert_eq!(marker_at(&state, Point::new(6.0, 5.0)), Some(2));
        assert_eq!(marker_at(&state, Point::new(2.0, 5.0)), Some(1));
        assert_eq!(arrow_at(&state, Point::new(50.0, 78.0)), Some(3));
        state.show_straight_arrows = true;
        assert_eq!(arrow_at(&state, Point::new(50.0, 78.0)), None);
        assert_eq!(arrow_at(&state, Point::new(50.0, 7.0)), Some(3));
    }
}

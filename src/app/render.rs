use codemark::geometry::{arrow_angle_for_points, point_array_for_line};
use codemark::model::{ArrowPath, Id, Point, Rect, Rgba, Selection, UnfinishedArrow};
use codemark::store::State;
use eframe::egui;
use std::collections::BTreeSet;
use std::f32::consts::PI;

use super::geometry::{CANVAS_PADDING, CodeLayout};

const ARROW_WIDTH: f32 = 2.0;
const ARROWHEAD_LENGTH: f32 = 15.0;
const MARKER_ALPHA: u8 = 110;
const ANNOTATION_BAR_WIDTH: f32 = 3.0;
const ANNOTATION_BAR_GAP: f32 = 1.5;
const FALLBACK_COLOR: Rgba = Rgba::rgb(160, 160, 160);

#[derive(Default)]
pub(super) struct TrimWarnings {
    reported: BTreeSet<Id>,
}

impl TrimWarnings {
    fn first_for(&mut self, id: Id) -> bool {
        self.reported.insert(id)
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }
}

fn palette_rgba(state: &State, name: &str) -> Rgba {
    state
        .palette_color(name)
        .map(|c| c.rgba)
        .unwrap_or(FALLBACK_COLOR)
}

fn visible_lines(
    painter: &egui::Painter,
    layout: &CodeLayout,
    line_count: usize,
) -> std::ops::RangeInclusive<u32> {
    let clip = painter.clip_rect();
    let top = layout.to_container(clip.min).y.max(0.0);
    let bottom = layout.to_container(clip.max).y.max(0.0);
    let first = (top / layout.line_height).floor() as u32 + 1;
    let last = ((bottom / layout.line_height).ceil() as u32 + 1).min(line_count as u32);
    first..=last
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect, layout: &CodeLayout) {
    let style = painter.ctx().style();
    painter.rect_filled(rect, 0.0, style.visuals.extreme_bg_color);
    let gutter = egui::Rect::from_min_size(rect.min, egui::vec2(layout.gutter_width, rect.height()));
    painter.rect_filled(gutter, 0.0, style.visuals.faint_bg_color);
}

pub(super) fn draw_gutter(
    painter: &egui::Painter,
    layout: &CodeLayout,
    state: &State,
    font: &egui::FontId,
    line_count: usize,
) {
    let text_color = painter.ctx().style().visuals.weak_text_color();
    let gutter_left = layout.origin.x - CANVAS_PADDING - layout.gutter_width;
    let number_right = gutter_left + layout.gutter_width - layout.char_width * 0.5;
    for line in visible_lines(painter, layout, line_count) {
        let y = layout.origin.y + layout.line_top(line);
        painter.text(
            egui::pos2(number_right, y),
            egui::Align2::RIGHT_TOP,
            line.to_string(),
            font.clone(),
            text_color,
        );

        let Some(colors) = state.line_annotations.get(&line) else {
            continue;
        };
        let mut x = gutter_left + ANNOTATION_BAR_GAP;
        for (name, _) in colors.iter().filter(|(_, active)| **active) {
            let bar = egui::Rect::from_min_size(
                egui::pos2(x, y),
                egui::vec2(ANNOTATION_BAR_WIDTH, layout.line_height),
            );
            painter.rect_filled(bar, 0.0, palette_rgba(state, name).to_color32());
            x += ANNOTATION_BAR_WIDTH + ANNOTATION_BAR_GAP;
        }
    }
}

pub(super) fn draw_code(
    painter: &egui::Painter,
    layout: &CodeLayout,
    lines: &[&str],
    font: &egui::FontId,
) {
    let color = painter.ctx().style().visuals.text_color();
    for line in visible_lines(painter, layout, lines.len()) {
        let Some(text) = lines.get(line as usize - 1) else {
            continue;
        };
        painter.text(
            layout.to_screen(Point::new(0.0, layout.line_top(line))),
            egui::Align2::LEFT_TOP,
            *text,
            font.clone(),
            color,
        );
    }
}

pub(super) fn draw_markers(painter: &egui::Painter, layout: &CodeLayout, state: &State) {
    let selected = match state.current_selection {
        Some(Selection::Marker { id }) => Some(id),
        _ => None,
    };
    for marker in &state.markers {
        let rgba = palette_rgba(state, &marker.color);
        let r = layout.screen_rect(&marker.rect);
        painter.rect_filled(r, 2.0, rgba.with_alpha(MARKER_ALPHA).to_color32());
        if selected == Some(marker.id) {
            painter.rect_stroke(
                r.expand(1.0),
                2.0,
                egui::Stroke::new(1.5, rgba.to_color32()),
                egui::StrokeKind::Middle,
            );
        }
    }
}

pub(super) fn draw_text_selection(painter: &egui::Painter, layout: &CodeLayout, rect: &Rect) {
    let r = layout.screen_rect(rect);
    let style = painter.ctx().style();
    let selection = &style.visuals.selection;
    painter.rect_filled(r, 0.0, selection.bg_fill.gamma_multiply(0.6));
    painter.rect_stroke(r, 0.0, selection.stroke, egui::StrokeKind::Middle);
}

pub(super) fn draw_arrows(
    painter: &egui::Painter,
    layout: &CodeLayout,
    state: &State,
    warnings: &mut TrimWarnings,
) {
    let selected = match state.current_selection {
        Some(Selection::Arrow { id, .. }) => Some(id),
        _ => None,
    };
    for arrow in &state.arrows {
        let rgba = state
            .arrow_color(arrow)
            .map(|c| c.rgba)
            .unwrap_or(FALLBACK_COLOR);
        let width = if selected == Some(arrow.id) {
            ARROW_WIDTH * 2.0
        } else {
            ARROW_WIDTH
        };
        let to_rect = state.marker(arrow.to_marker).map(|m| m.rect);
        draw_arrow_path(
            painter,
            layout,
            Some((arrow.id, &mut *warnings)),
            arrow,
            to_rect.as_ref(),
            state.show_straight_arrows,
            egui::Stroke::new(width, rgba.to_color32()),
        );
    }
}

pub(super) fn draw_unfinished_arrow(
    painter: &egui::Painter,
    layout: &CodeLayout,
    state: &State,
    drag: &UnfinishedArrow,
) {
    let rgba = state
        .marker(drag.from_marker)
        .map(|m| palette_rgba(state, &m.color))
        .unwrap_or(FALLBACK_COLOR);
    let to_rect = drag
        .to_marker
        .and_then(|id| state.marker(id))
        .map(|m| m.rect);
    draw_arrow_path(
        painter,
        layout,
        None,
        drag,
        to_rect.as_ref(),
        state.show_straight_arrows,
        egui::Stroke::new(ARROW_WIDTH, rgba.to_color32()),
    );
}

fn draw_arrow_path<A: ArrowPath>(
    painter: &egui::Painter,
    layout: &CodeLayout,
    committed: Option<(Id, &mut TrimWarnings)>,
    arrow: &A,
    to_rect: Option<&Rect>,
    straight: bool,
    stroke: egui::Stroke,
) {
    let points = match point_array_for_line(arrow, to_rect, straight) {
        Ok(points) => points,
        Err(e) => {
            match committed {
                Some((id, warnings)) => {
                    if warnings.first_for(id) {
                        log::warn!("arrow {id}: {e}, drawing it untrimmed");
                    }
                }
                None => log::debug!("arrow being drawn: {e}"),
            }
            match point_array_for_line(arrow, None, straight) {
                Ok(points) => points,
                Err(_) => return,
            }
        }
    };
    let screen: Vec<egui::Pos2> = points.iter().map(|p| layout.to_screen(*p)).collect();
    painter.add(egui::Shape::line(screen.clone(), stroke));
    if let (Some(angle), Some(tip)) = (arrow_angle_for_points(&points), screen.last()) {
        draw_arrowhead(painter, *tip, angle, stroke);
    }
}

fn draw_arrowhead(painter: &egui::Painter, tip: egui::Pos2, angle: f32, stroke: egui::Stroke) {
    for side in [PI / 8.0, -PI / 8.0] {
        let a = angle + PI + side;
        let end = tip + egui::vec2(a.cos(), a.sin()) * ARROWHEAD_LENGTH;
        painter.line_segment([tip, end], stroke);
    }
}

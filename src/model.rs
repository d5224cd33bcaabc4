use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identity shared by markers and arrows. Allocated from a single counter so
/// a dependency set can hold either kind.
pub type Id = u64;

/// Named palette color. Markers and line annotations refer to colors by name.
pub type ColorName = String;

/// Active colors per 1-based line number.
pub type LineAnnotations = BTreeMap<u32, BTreeMap<ColorName, bool>>;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in container coordinates.
///
/// Always built through [`Rect::from_ltwh`] or [`Rect::from_points`] so that
/// `right == left + width`, `bottom == top + height` and both extents are
/// non-negative.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        let (left, width) = if width < 0.0 {
            (left + width, -width)
        } else {
            (left, width)
        };
        let (top, height) = if height < 0.0 {
            (top + height, -height)
        } else {
            (top, height)
        };
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
            width,
            height,
        }
    }

    pub fn from_points(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self::from_ltwh(left, top, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    pub fn to_rect(self) -> egui::Rect {
        egui::Rect::from_min_max(
            egui::pos2(self.left, self.top),
            egui::pos2(self.right, self.bottom),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PaletteColor {
    pub name: ColorName,
    pub rgba: Rgba,
}

pub fn default_palette() -> Vec<PaletteColor> {
    vec![
        PaletteColor {
            name: "lightblue".to_string(),
            rgba: Rgba::rgb(173, 216, 230),
        },
        PaletteColor {
            name: "lightgreen".to_string(),
            rgba: Rgba::rgb(144, 238, 144),
        },
        PaletteColor {
            name: "gold".to_string(),
            rgba: Rgba::rgb(255, 215, 0),
        },
        PaletteColor {
            name: "pink".to_string(),
            rgba: Rgba::rgb(255, 192, 203),
        },
    ]
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub id: Id,
    pub rect: Rect,
    pub color: ColorName,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArrowMode {
    #[default]
    Freehand,
    Jointed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Arrow {
    pub id: Id,
    pub from_marker: Id,
    pub from_point: Point,
    #[serde(default)]
    pub mid_points: Vec<Point>,
    pub to_marker: Id,
    pub to_point: Point,
    #[serde(default)]
    pub color: Option<ColorName>,
    pub dependencies: BTreeSet<Id>,
}

impl Arrow {
    pub fn polyline(&self) -> Vec<Point> {
        full_path(self.from_point, &self.mid_points, self.to_point)
    }
}

/// An arrow being drawn. `to_marker` is whatever marker the pointer hovers,
/// if any.
#[derive(Clone, Debug, PartialEq)]
pub struct UnfinishedArrow {
    pub from_marker: Id,
    pub from_point: Point,
    pub mid_points: Vec<Point>,
    pub to_marker: Option<Id>,
    pub to_point: Point,
    pub dependencies: BTreeSet<Id>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrowDraft {
    pub from_marker: Id,
    pub from_point: Point,
    pub mid_points: Vec<Point>,
    pub to_marker: Id,
    pub to_point: Point,
    pub dependencies: BTreeSet<Id>,
}

/// Anything the path resolver can route: committed or in-progress arrows.
pub trait ArrowPath {
    fn from_point(&self) -> Point;
    fn mid_points(&self) -> &[Point];
    fn to_point(&self) -> Point;
}

impl ArrowPath for Arrow {
    fn from_point(&self) -> Point {
        self.from_point
    }

    fn mid_points(&self) -> &[Point] {
        &self.mid_points
    }

    fn to_point(&self) -> Point {
        self.to_point
    }
}

impl ArrowPath for UnfinishedArrow {
    fn from_point(&self) -> Point {
        self.from_point
    }

    fn mid_points(&self) -> &[Point] {
        &self.mid_points
    }

    fn to_point(&self) -> Point {
        self.to_point
    }
}

pub(crate) fn full_path(from: Point, mid: &[Point], to: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(mid.len() + 2);
    points.push(from);
    points.extend_from_slice(mid);
    points.push(to);
    points
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Text { rect: Rect, line: u32 },
    Marker { id: Id },
    Arrow { id: Id, point: Point },
}

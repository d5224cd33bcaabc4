//! Annotation state and its reducer.

use crate::model::{
    Arrow, ArrowDraft, ColorName, Id, LineAnnotations, Marker, PaletteColor, Point, Rect,
    Selection, default_palette,
};
use crate::undoable::{self, History, UndoSlice, Undoable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Loaded ids at or above this are renumbered so allocation cannot overflow.
const RENUMBER_FROM: Id = Id::MAX / 2;

#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub source: String,
    pub current_selection: Option<Selection>,
    pub markers: Vec<Marker>,
    pub arrows: Vec<Arrow>,
    pub line_annotations: LineAnnotations,
    pub colors: Vec<PaletteColor>,
    pub show_straight_arrows: bool,
    next_id: Id,
}

impl Default for State {
    fn default() -> Self {
        Self::new(default_palette())
    }
}

impl State {
    pub fn new(colors: Vec<PaletteColor>) -> Self {
        Self {
            source: String::new(),
            current_selection: None,
            markers: Vec::new(),
            arrows: Vec::new(),
            line_annotations: LineAnnotations::new(),
            colors,
            show_straight_arrows: false,
            next_id: 1,
        }
    }

    pub fn marker(&self, id: Id) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn arrow(&self, id: Id) -> Option<&Arrow> {
        self.arrows.iter().find(|a| a.id == id)
    }

    pub fn palette_color(&self, name: &str) -> Option<&PaletteColor> {
        self.colors.iter().find(|c| c.name == name)
    }

    /// Color an arrow is drawn in: its own, else its origin marker's.
    pub fn arrow_color(&self, arrow: &Arrow) -> Option<&PaletteColor> {
        let name = match &arrow.color {
            Some(name) => name.as_str(),
            None => self.marker(arrow.from_marker)?.color.as_str(),
        };
        self.palette_color(name)
    }

    fn allocate_id(&mut self) -> Id {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn bump_next_id(&mut self) {
        let max = self
            .markers
            .iter()
            .map(|m| m.id)
            .chain(self.arrows.iter().map(|a| a.id))
            .max()
            .unwrap_or(0);
        if max >= RENUMBER_FROM {
            log::warn!("annotation id {max} is out of range, renumbering");
            self.renumber();
        } else {
            self.next_id = self.next_id.max(max + 1);
        }
    }

    // Referenced ids are remapped too, so dangling dependencies stay distinct.
    fn renumber(&mut self) {
        let mut old: BTreeSet<Id> = BTreeSet::new();
        old.extend(self.markers.iter().map(|m| m.id));
        for arrow in &self.arrows {
            old.insert(arrow.id);
            old.insert(arrow.from_marker);
            old.insert(arrow.to_marker);
            old.extend(arrow.dependencies.iter().copied());
        }
        let map: BTreeMap<Id, Id> = old.into_iter().zip(1..).collect();
        let remap = |id: Id| map.get(&id).copied().unwrap_or(id);

        for marker in &mut self.markers {
            marker.id = remap(marker.id);
        }
        for arrow in &mut self.arrows {
            arrow.id = remap(arrow.id);
            arrow.from_marker = remap(arrow.from_marker);
            arrow.to_marker = remap(arrow.to_marker);
            arrow.dependencies = arrow.dependencies.iter().map(|id| remap(*id)).collect();
        }
        self.next_id = map.len() as Id + 1;
    }

    fn drop_dangling_selection(&mut self) {
        let dangling = match &self.current_selection {
            Some(Selection::Marker { id }) => self.marker(*id).is_none(),
            Some(Selection::Arrow { id, .. }) => self.arrow(*id).is_none(),
            Some(Selection::Text { .. }) | None => false,
        };
        if dangling {
            self.current_selection = None;
        }
    }

    /// The action that deletes the selected marker or arrow, if it still
    /// exists.
    pub fn remove_selection_action(&self) -> Option<Action> {
        match self.current_selection {
            Some(Selection::Marker { id }) if self.marker(id).is_some() => {
                Some(Action::RemoveMarker(id))
            }
            Some(Selection::Arrow { id, .. }) if self.arrow(id).is_some() => {
                Some(Action::RemoveArrow(id))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetSource(String),
    SelectText { rect: Rect, line: u32 },
    SelectMarker(Id),
    SelectArrow { id: Id, point: Point },
    ClearSelection,
    AddMarker { rect: Rect, color: ColorName },
    SetMarkerColor { id: Id, color: ColorName },
    RemoveMarker(Id),
    AddArrow(ArrowDraft),
    RemoveArrow(Id),
    ToggleLineAnnotation { line: u32, color: ColorName },
    SetShowStraightArrows(bool),
    LoadAnnotations(Annotations),
}

pub fn is_undoable_action(action: &Action) -> bool {
    matches!(
        action,
        Action::AddMarker { .. }
            | Action::SetMarkerColor { .. }
            | Action::RemoveMarker(_)
            | Action::AddArrow(_)
            | Action::RemoveArrow(_)
            | Action::ToggleLineAnnotation { .. }
    )
}

pub fn reducer(state: &mut State, action: &Action) {
    match action {
        Action::SetSource(source) => {
            state.source = source.clone();
        }
        Action::SelectText { rect, line } => {
            state.current_selection = Some(Selection::Text {
                rect: *rect,
                line: *line,
            });
        }
        Action::SelectMarker(id) => {
            if state.marker(*id).is_some() {
                state.current_selection = Some(Selection::Marker { id: *id });
            }
        }
        Action::SelectArrow { id, point } => {
            if state.arrow(*id).is_some() {
                state.current_selection = Some(Selection::Arrow {
                    id: *id,
                    point: *point,
                });
            }
        }
        Action::ClearSelection => {
            state.current_selection = None;
        }
        Action::AddMarker { rect, color } => {
            let id = state.allocate_id();
            state.markers.push(Marker {
                id,
                rect: *rect,
                color: color.clone(),
            });
            state.current_selection = None;
        }
        Action::SetMarkerColor { id, color } => {
            if let Some(marker) = state.markers.iter_mut().find(|m| m.id == *id) {
                marker.color = color.clone();
            }
        }
        Action::RemoveMarker(id) => {
            remove_with_dependents(state, *id);
            state.current_selection = None;
        }
        Action::AddArrow(draft) => {
            let id = state.allocate_id();
            let mut dependencies = draft.dependencies.clone();
            dependencies.insert(draft.from_marker);
            dependencies.insert(draft.to_marker);
            state.arrows.push(Arrow {
                id,
                from_marker: draft.from_marker,
                from_point: draft.from_point,
                mid_points: draft.mid_points.clone(),
                to_marker: draft.to_marker,
                to_point: draft.to_point,
                color: None,
                dependencies,
            });
        }
        Action::RemoveArrow(id) => {
            remove_with_dependents(state, *id);
            state.current_selection = None;
        }
        Action::ToggleLineAnnotation { line, color } => {
            let colors = state.line_annotations.entry(*line).or_default();
            let active = colors.entry(color.clone()).or_insert(false);
            *active = !*active;
        }
        Action::SetShowStraightArrows(straight) => {
            state.show_straight_arrows = *straight;
        }
        Action::LoadAnnotations(annotations) => {
            annotations.clone().restore(state);
            state.current_selection = None;
            state.bump_next_id();
        }
    }
}

/// Removes the entity `id` and every arrow anchored to it. Ids are
/// collected first, then everything is removed in one pass.
fn remove_with_dependents(state: &mut State, id: Id) {
    let doomed: BTreeSet<Id> = std::iter::once(id)
        .chain(
            state
                .arrows
                .iter()
                .filter(|a| a.id == id || a.dependencies.contains(&id))
                .map(|a| a.id),
        )
        .collect();
    if doomed.len() > 1 {
        log::debug!(
            "removing {id} cascades to {} dependent arrow(s)",
            doomed.len() - 1
        );
    }
    state.markers.retain(|m| !doomed.contains(&m.id));
    state.arrows.retain(|a| !doomed.contains(&a.id));
}

/// The undoable slice: everything a user would expect undo to bring back.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub arrows: Vec<Arrow>,
    #[serde(default)]
    pub line_annotations: LineAnnotations,
    #[serde(default = "default_palette")]
    pub colors: Vec<PaletteColor>,
}

impl Annotations {
    pub fn empty(colors: Vec<PaletteColor>) -> Self {
        Self {
            markers: Vec::new(),
            arrows: Vec::new(),
            line_annotations: LineAnnotations::new(),
            colors,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
            && self.arrows.is_empty()
            && self
                .line_annotations
                .values()
                .all(|colors| colors.values().all(|active| !active))
    }
}

impl UndoSlice<State> for Annotations {
    fn capture(state: &State) -> Self {
        Self {
            markers: state.markers.clone(),
            arrows: state.arrows.clone(),
            line_annotations: state.line_annotations.clone(),
            colors: state.colors.clone(),
        }
    }

    fn restore(self, state: &mut State) {
        state.markers = self.markers;
        state.arrows = self.arrows;
        state.line_annotations = self.line_annotations;
        state.colors = self.colors;
        state.drop_dangling_selection();
    }
}

pub type Store = History<State, Annotations>;

pub type Engine =
    Undoable<State, Action, Annotations, fn(&mut State, &Action), fn(&Action) -> bool>;

pub fn engine(colors: Vec<PaletteColor>) -> Engine {
    undoable::wrap(
        reducer as fn(&mut State, &Action),
        is_undoable_action as fn(&Action) -> bool,
        Annotations::empty(colors),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undoable::{redo, reset, undo};

    fn marker_rect(left: f32) -> Rect {
        Rect::from_ltwh(left, 0.0, 10.0, 10.0)
    }

    fn setup() -> (Engine, Store) {
        let engine = engine(default_palette());
        let store = Store::new(State::default());
        (engine, store)
    }

    fn add_marker(engine: &Engine, store: &mut Store, left: f32) -> Id {
        engine.reduce(
            store,
            Action::AddMarker {
                rect: marker_rect(left),
                color: "gold".to_string(),
            },
        );
        store.markers.last().unwrap().id
    }

    fn draft(from: Id, to: Id, extra: &[Id]) -> ArrowDraft {
        ArrowDraft {
            from_marker: from,
            from_point: Point::new(5.0, 5.0),
            mid_points: vec![],
            to_marker: to,
            to_point: Point::new(105.0, 5.0),
            dependencies: extra.iter().copied().collect(),
        }
    }

    fn add_arrow(engine: &Engine, store: &mut Store, d: ArrowDraft) -> Id {
        engine.reduce(store, Action::AddArrow(d));
        store.arrows.last().unwrap().id
    }

    #[test]
    fn ids_are_unique_across_markers_and_arrows() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        assert_eq!(BTreeSet::from([m1, m2, a]).len(), 3);
    }

    #[test]
    fn arrows_always_depend_on_both_ends() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        let arrow = store.arrow(a).unwrap();
        assert!(arrow.dependencies.contains(&m1));
        assert!(arrow.dependencies.contains(&m2));
    }

    #[test]
    fn removing_a_marker_cascades_in_one_undoable_step() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let m3 = add_marker(&engine, &mut store, 200.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        // Chained from `a`, so it inherits m1 and m2 as dependencies.
        let b = add_arrow(&engine, &mut store, draft(m1, m3, &[a, m2]));
        let unrelated = add_arrow(&engine, &mut store, draft(m3, m1, &[]));
        let before = Annotations::capture(store.present());

        engine.reduce(&mut store, Action::RemoveMarker(m2));
        assert!(store.marker(m2).is_none());
        assert!(store.arrow(a).is_none());
        assert!(store.arrow(b).is_none());
        assert!(store.arrow(unrelated).is_some());
        assert_eq!(store.markers.len(), 2);

        engine.reduce(&mut store, undo());
        assert_eq!(Annotations::capture(store.present()), before);
    }

    #[test]
    fn removing_an_arrow_removes_arrows_chained_from_it() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let m3 = add_marker(&engine, &mut store, 200.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        let b = add_arrow(&engine, &mut store, draft(m1, m3, &[a, m2]));
        engine.reduce(&mut store, Action::RemoveArrow(a));
        assert!(store.arrow(b).is_none());
        assert_eq!(store.markers.len(), 3);
    }

    #[test]
    fn selection_is_not_part_of_history() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        engine.reduce(&mut store, undo());
        engine.reduce(&mut store, Action::SelectMarker(m1));
        assert_eq!(
            store.current_selection,
            Some(Selection::Marker { id: m1 })
        );
        assert!(store.can_redo());
        engine.reduce(&mut store, redo());
        assert!(store.marker(m2).is_some());
        assert_eq!(
            store.current_selection,
            Some(Selection::Marker { id: m1 })
        );
    }

    #[test]
    fn line_annotations_toggle() {
        let (engine, mut store) = setup();
        let toggle = Action::ToggleLineAnnotation {
            line: 3,
            color: "pink".to_string(),
        };
        engine.reduce(&mut store, toggle.clone());
        assert_eq!(store.line_annotations[&3]["pink"], true);
        engine.reduce(&mut store, toggle);
        assert_eq!(store.line_annotations[&3]["pink"], false);
        engine.reduce(&mut store, undo());
        assert_eq!(store.line_annotations[&3]["pink"], true);
    }

    #[test]
    fn recolor_is_undoable() {
        let (engine, mut store) = setup();
        let m = add_marker(&engine, &mut store, 0.0);
        engine.reduce(
            &mut store,
            Action::SetMarkerColor {
                id: m,
                color: "pink".to_string(),
            },
        );
        assert_eq!(store.marker(m).unwrap().color, "pink");
        engine.reduce(&mut store, undo());
        assert_eq!(store.marker(m).unwrap().color, "gold");
    }

    #[test]
    fn arrow_color_falls_back_to_origin_marker() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        let arrow = store.arrow(a).unwrap().clone();
        assert_eq!(store.arrow_color(&arrow).unwrap().name, "gold");
    }

    #[test]
    fn reset_clears_annotations_and_can_be_undone() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        engine.reduce(
            &mut store,
            Action::ToggleLineAnnotation {
                line: 1,
                color: "gold".to_string(),
            },
        );
        engine.reduce(&mut store, reset());
        assert!(Annotations::capture(store.present()).is_empty());
        assert_eq!(store.colors, default_palette());
        engine.reduce(&mut store, undo());
        assert!(store.marker(m1).is_some());
    }

    #[test]
    fn loaded_annotations_do_not_collide_with_new_ids() {
        let (engine, mut store) = setup();
        let mut loaded = Annotations::empty(default_palette());
        loaded.markers.push(Marker {
            id: 41,
            rect: marker_rect(0.0),
            color: "gold".to_string(),
        });
        engine.reduce(&mut store, Action::LoadAnnotations(loaded));
        assert!(!store.can_undo());
        let fresh = add_marker(&engine, &mut store, 50.0);
        assert!(fresh > 41);
    }

    #[test]
    fn undo_forgets_a_selection_whose_marker_is_gone() {
        let (engine, mut store) = setup();
        let m = add_marker(&engine, &mut store, 0.0);
        engine.reduce(&mut store, Action::SelectMarker(m));
        assert_eq!(store.remove_selection_action(), Some(Action::RemoveMarker(m)));

        engine.reduce(&mut store, undo());
        assert_eq!(store.current_selection, None);
        assert_eq!(store.remove_selection_action(), None);
        assert!(store.can_redo());
        engine.reduce(&mut store, redo());
        assert!(store.marker(m).is_some());
    }

    #[test]
    fn redo_keeps_a_text_selection_and_drops_a_stale_arrow_selection() {
        let (engine, mut store) = setup();
        let m1 = add_marker(&engine, &mut store, 0.0);
        let m2 = add_marker(&engine, &mut store, 100.0);
        let a = add_arrow(&engine, &mut store, draft(m1, m2, &[]));
        engine.reduce(
            &mut store,
            Action::SelectArrow {
                id: a,
                point: Point::new(50.0, 5.0),
            },
        );
        engine.reduce(&mut store, undo());
        assert_eq!(store.current_selection, None);

        let text = Selection::Text {
            rect: marker_rect(200.0),
            line: 1,
        };
        engine.reduce(
            &mut store,
            Action::SelectText {
                rect: marker_rect(200.0),
                line: 1,
            },
        );
        engine.reduce(&mut store, redo());
        assert!(store.arrow(a).is_some());
        assert_eq!(store.current_selection, Some(text));
        assert_eq!(store.remove_selection_action(), None);
    }

    #[test]
    fn out_of_range_loaded_ids_are_renumbered() {
        let (engine, mut store) = setup();
        let mut loaded = Annotations::empty(default_palette());
        for id in [Id::MAX, 5] {
            loaded.markers.push(Marker {
                id,
                rect: marker_rect(0.0),
                color: "gold".to_string(),
            });
        }
        loaded.arrows.push(Arrow {
            id: Id::MAX - 1,
            from_marker: 5,
            from_point: Point::new(5.0, 5.0),
            mid_points: vec![],
            to_marker: Id::MAX,
            to_point: Point::new(105.0, 5.0),
            color: None,
            dependencies: BTreeSet::from([5, Id::MAX]),
        });
        engine.reduce(&mut store, Action::LoadAnnotations(loaded));

        let ids: Vec<Id> = store.markers.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 1]);
        let arrow = &store.arrows[0];
        assert_eq!(arrow.id, 2);
        assert_eq!((arrow.from_marker, arrow.to_marker), (1, 3));
        assert_eq!(arrow.dependencies, BTreeSet::from([1, 3]));
        assert_eq!(add_marker(&engine, &mut store, 50.0), 4);
    }
}

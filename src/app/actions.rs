use codemark::model::ArrowMode;
use codemark::settings;
use codemark::source::Source;
use codemark::store::{Action, Annotations};
use codemark::undoable::{self, HistoryAction, UndoSlice};
use std::path::PathBuf;

use super::CodemarkApp;

impl CodemarkApp {
    pub(super) fn dispatch(&mut self, action: impl Into<HistoryAction<Action>>) {
        let action = action.into();
        let touches_slice = match &action {
            HistoryAction::Apply(a) => self.engine.is_undoable(a),
            HistoryAction::Undo => self.store.can_undo(),
            HistoryAction::Redo => self.store.can_redo(),
            HistoryAction::Reset => true,
        };
        self.engine.reduce(&mut self.store, action);
        if touches_slice {
            self.persist_annotations();
        }
    }

    pub(super) fn undo(&mut self) {
        self.drawing.cancel();
        self.dispatch(undoable::undo());
    }

    pub(super) fn redo(&mut self) {
        self.drawing.cancel();
        self.dispatch(undoable::redo());
    }

    pub(super) fn clear_annotations(&mut self) {
        self.drawing.cancel();
        self.dispatch(Action::ClearSelection);
        self.dispatch(undoable::reset());
        self.status = Some("Cleared annotations".to_string());
    }

    pub(super) fn remove_selected(&mut self) {
        if let Some(action) = self.store.remove_selection_action() {
            self.dispatch(action);
        }
    }

    // Escape drops a drag first; only a second press clears the selection.
    pub(super) fn cancel(&mut self) {
        if self.drawing.is_drawing() || self.text_drag.is_some() {
            self.drawing.cancel();
            self.text_drag = None;
        } else {
            self.dispatch(Action::ClearSelection);
        }
    }

    pub(super) fn toggle_arrow_mode(&mut self) {
        self.settings.arrow_mode = match self.settings.arrow_mode {
            ArrowMode::Freehand => ArrowMode::Jointed,
            ArrowMode::Jointed => ArrowMode::Freehand,
        };
        self.persist_settings();
    }

    pub(super) fn set_show_straight_arrows(&mut self, straight: bool) {
        self.dispatch(Action::SetShowStraightArrows(straight));
        self.settings.show_straight_arrows = straight;
        self.persist_settings();
    }

    pub(super) fn open_source_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter(
                "Source",
                &[
                    "rs", "c", "h", "cpp", "hpp", "go", "py", "js", "ts", "java", "toml", "md", "txt",
                ],
            )
            .pick_file()
        {
            self.open_source(path);
        }
    }

    pub(super) fn open_source(&mut self, path: PathBuf) {
        let source = match Source::open(&path) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("{e}");
                self.status = Some(format!("Open failed: {e}"));
                return;
            }
        };
        let mut warning = None;
        let annotations = match self.annotations.load(&source.key()) {
            Ok(Some(annotations)) => annotations,
            Ok(None) => Annotations::empty(self.settings.palette.clone()),
            Err(e) => {
                log::warn!("{e}");
                warning = Some(format!("Annotations for {} unreadable: {e}", source.display_name()));
                Annotations::empty(self.settings.palette.clone())
            }
        };

        self.drawing.cancel();
        self.text_drag = None;
        self.trim_warnings.clear();
        self.dispatch(Action::SetSource(source.text.clone()));
        self.dispatch(Action::LoadAnnotations(annotations));
        self.store.clear();
        self.status = Some(warning.unwrap_or_else(|| format!("Opened {}", source.display_name())));
        log::info!("opened {}", source.path.display());

        self.settings.last_source = Some(source.path.clone());
        self.source = Some(source);
        self.persist_settings();
    }

    pub(super) fn persist_annotations(&mut self) {
        let Some(source) = &self.source else {
            return;
        };
        let slice = Annotations::capture(self.store.present());
        if let Err(e) = self.annotations.save(&source.key(), &slice) {
            log::warn!("{e}");
            self.status = Some(format!("Save failed: {e}"));
        }
    }

    pub(super) fn persist_settings(&mut self) {
        if let Err(e) = settings::save_settings(&self.settings_path, &self.settings) {
            log::warn!("{e}");
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }
}

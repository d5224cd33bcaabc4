use codemark::model::{ArrowMode, Id, Point, Selection};
use codemark::store::Action;
use eframe::egui;

use super::command_palette::{CommandContext, CommandId, CommandPalette};
use super::geometry::{CodeLayout, arrow_at, marker_at};
use super::help::draw_help_window;
use super::render::{
    draw_arrows, draw_background, draw_code, draw_gutter, draw_markers, draw_text_selection,
    draw_unfinished_arrow,
};
use super::{CodemarkApp, TextDrag};

impl eframe::App for CodemarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| self.top_bar(ui));

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(status) = &self.status {
                    ui.label(status);
                } else if let Some(Selection::Text { .. }) = self.store.current_selection {
                    ui.label("Pick a color to mark the selection");
                } else {
                    ui.label("Ready");
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Undo: {}", self.store.undo_count()));
                    ui.separator();
                    ui.label(format!("Arrows: {}", self.store.arrows.len()));
                    ui.separator();
                    ui.label(format!("Markers: {}", self.store.markers.len()));
                    if let Some(source) = &self.source {
                        ui.separator();
                        ui.label(source.display_name());
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.source.is_none() {
                ui.centered_and_justified(|ui| {
                    if ui.button("Open a source file… (⌘O)").clicked() {
                        self.open_source_dialog();
                    }
                });
                return;
            }
            egui::ScrollArea::both()
                .auto_shrink([false, false])
                .show(ui, |ui| self.code_canvas(ui));
        });

        let cx = CommandContext {
            has_undo: self.store.can_undo(),
            has_redo: self.store.can_redo(),
            has_removable_selection: self.store.remove_selection_action().is_some(),
        };
        if let Some(cmd) = self.command_palette.ui(ctx, cx) {
            CommandPalette::execute(self, ctx, cmd);
        }
        draw_help_window(ctx, &mut self.show_help);
    }
}

impl CodemarkApp {
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let skip_shortcuts = ctx.wants_keyboard_input() || self.command_palette.open;
        let palette_open = self.command_palette.open;
        let mut open_palette = false;
        let mut cancel = false;
        let mut commands = Vec::new();
        ctx.input_mut(|i| {
            if !palette_open
                && i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::P)
            {
                open_palette = true;
            }
            if i.consume_key(egui::Modifiers::COMMAND, egui::Key::O) {
                commands.push(CommandId::OpenSource);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::F1) {
                commands.push(CommandId::Help);
            }
            if skip_shortcuts {
                return;
            }
            if i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::Z)
                || i.consume_key(egui::Modifiers::COMMAND, egui::Key::Y)
            {
                commands.push(CommandId::Redo);
            } else if i.consume_key(egui::Modifiers::COMMAND, egui::Key::Z) {
                commands.push(CommandId::Undo);
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Escape) {
                cancel = true;
            }
            if i.consume_key(egui::Modifiers::NONE, egui::Key::Delete)
                || i.consume_key(egui::Modifiers::NONE, egui::Key::Backspace)
            {
                commands.push(CommandId::RemoveSelected);
            }
        });

        if open_palette {
            self.command_palette.open("");
        }
        if cancel {
            self.cancel();
        }
        for cmd in commands {
            CommandPalette::execute(self, ctx, cmd);
        }
    }

    fn top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open… (⌘O)").clicked() {
                self.open_source_dialog();
            }
            ui.separator();
            if ui
                .add_enabled(self.store.can_undo(), egui::Button::new("Undo (⌘Z)"))
                .clicked()
            {
                self.undo();
            }
            if ui
                .add_enabled(self.store.can_redo(), egui::Button::new("Redo (⌘⇧Z)"))
                .clicked()
            {
                self.redo();
            }
            if ui
                .add_enabled(self.source.is_some(), egui::Button::new("Clear"))
                .clicked()
            {
                self.clear_annotations();
            }
            ui.separator();

            ui.label("Line color:");
            let colors = self.store.colors.clone();
            for color in &colors {
                let mut button = egui::Button::new("").fill(color.rgba.to_color32());
                if color.name == self.active_color {
                    button = button.stroke(egui::Stroke::new(2.0, ui.visuals().strong_text_color()));
                }
                if ui
                    .add_sized([18.0, 18.0], button)
                    .on_hover_text(color.name.as_str())
                    .clicked()
                {
                    self.active_color = color.name.clone();
                }
            }
            ui.separator();

            let mode = self.settings.arrow_mode;
            if ui
                .selectable_label(mode == ArrowMode::Freehand, "Freehand")
                .clicked()
                && mode != ArrowMode::Freehand
            {
                self.toggle_arrow_mode();
            }
            if ui
                .selectable_label(mode == ArrowMode::Jointed, "Jointed")
                .clicked()
                && mode != ArrowMode::Jointed
            {
                self.toggle_arrow_mode();
            }
            let mut straight = self.store.show_straight_arrows;
            if ui.checkbox(&mut straight, "Straight arrows").changed() {
                self.set_show_straight_arrows(straight);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("?").clicked() {
                    self.show_help = true;
                }
                if ui.button("Commands (⌘⇧P)").clicked() {
                    self.command_palette.open("");
                }
            });
        });
    }

    fn code_canvas(&mut self, ui: &mut egui::Ui) {
        let font = egui::FontId::monospace(self.settings.font_size);
        let text = self.store.source.clone();
        let lines: Vec<&str> = text.lines().collect();

        let mut layout = CodeLayout::measure(ui.painter(), egui::Pos2::ZERO, &font, lines.len());
        let size = layout.content_size(&lines).max(ui.available_size());
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        layout.origin += rect.min.to_vec2();

        let ctx = ui.ctx().clone();
        let pointer = ctx
            .input(|i| i.pointer.interact_pos())
            .map(|p| layout.to_container(p));
        let hovered_marker = pointer.and_then(|p| marker_at(&self.store, p));
        let mode = self.settings.arrow_mode;

        if response.drag_started() {
            if let Some(origin) = ctx.input(|i| i.pointer.press_origin()) {
                self.begin_drag(layout.to_container(origin), &layout);
            }
        }
        if response.dragged() {
            if let Some(p) = pointer {
                if self.drawing.is_drawing() {
                    let joint = mode == ArrowMode::Jointed
                        && ctx.input(|i| i.pointer.button_pressed(egui::PointerButton::Secondary));
                    if joint {
                        self.drawing.add_joint(p);
                    }
                    self.drawing.pointer_moved(p, hovered_marker, mode);
                } else if let Some(drag) = &mut self.text_drag {
                    drag.current = p;
                }
            }
        }
        if response.drag_stopped() {
            self.end_drag(pointer, hovered_marker, &lines, &layout);
        }
        if response.clicked() {
            if let Some(p) = pointer {
                self.click(p, &layout, lines.len());
            }
        }

        if let Some(p) = ctx
            .input(|i| i.pointer.hover_pos())
            .map(|p| layout.to_container(p))
        {
            if self.drawing.is_drawing() || marker_at(&self.store, p).is_some() {
                ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
            } else if arrow_at(&self.store, p).is_some() || layout.in_gutter(p) {
                ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
            } else if rect.contains(layout.to_screen(p)) {
                ctx.set_cursor_icon(egui::CursorIcon::Text);
            }
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, &layout);
        draw_gutter(&painter, &layout, &self.store, &font, lines.len());
        draw_markers(&painter, &layout, &self.store);
        draw_code(&painter, &layout, &lines, &font);
        if let Some(drag) = &self.text_drag {
            if let Some((r, _)) = layout.text_selection(drag.start, drag.current, &lines) {
                draw_text_selection(&painter, &layout, &r);
            }
        } else if let Some(Selection::Text { rect, .. }) = &self.store.current_selection {
            draw_text_selection(&painter, &layout, rect);
        }
        draw_arrows(&painter, &layout, &self.store, &mut self.trim_warnings);
        if let Some(drag) = self.drawing.current() {
            draw_unfinished_arrow(&painter, &layout, &self.store, drag);
        }

        self.selection_popover(&ctx, &layout);
    }

    fn begin_drag(&mut self, p: Point, layout: &CodeLayout) {
        if layout.in_gutter(p) {
            return;
        }
        self.status = None;
        if let Some(marker) = marker_at(&self.store, p).and_then(|id| self.store.marker(id)) {
            self.drawing.begin_from_marker(marker, p);
        } else if let Some(arrow) = arrow_at(&self.store, p).and_then(|id| self.store.arrow(id)) {
            if let Err(e) = self.drawing.begin_from_arrow(arrow, p) {
                log::warn!("cannot branch from arrow {}: {e}", arrow.id);
            }
        } else {
            self.text_drag = Some(TextDrag {
                start: p,
                current: p,
            });
        }
    }

    fn end_drag(
        &mut self,
        pointer: Option<Point>,
        hovered_marker: Option<Id>,
        lines: &[&str],
        layout: &CodeLayout,
    ) {
        if self.drawing.is_drawing() {
            let point = pointer.or_else(|| self.drawing.current().map(|d| d.to_point));
            match point {
                Some(point) => {
                    if let Some(draft) = self.drawing.pointer_released(point, hovered_marker) {
                        self.dispatch(Action::AddArrow(draft));
                    }
                }
                None => self.drawing.cancel(),
            }
        } else if let Some(drag) = self.text_drag.take() {
            match layout.text_selection(drag.start, drag.current, lines) {
                Some((rect, line)) => self.dispatch(Action::SelectText { rect, line }),
                None => self.dispatch(Action::ClearSelection),
            }
        }
    }

    fn click(&mut self, p: Point, layout: &CodeLayout, line_count: usize) {
        self.status = None;
        if layout.in_gutter(p) {
            if let Some(line) = layout.line_at(p.y, line_count) {
                if !self.active_color.is_empty() {
                    let color = self.active_color.clone();
                    self.dispatch(Action::ToggleLineAnnotation { line, color });
                }
            }
            return;
        }
        if let Some(id) = marker_at(&self.store, p) {
            self.dispatch(Action::SelectMarker(id));
        } else if let Some(id) = arrow_at(&self.store, p) {
            self.dispatch(Action::SelectArrow { id, point: p });
        } else {
            self.dispatch(Action::ClearSelection);
        }
    }

    fn selection_popover(&mut self, ctx: &egui::Context, layout: &CodeLayout) {
        if self.drawing.is_drawing() || self.text_drag.is_some() {
            return;
        }
        let Some(selection) = self.store.current_selection.clone() else {
            return;
        };
        let anchor = match &selection {
            Selection::Text { rect, .. } => Point::new(rect.left, rect.bottom),
            Selection::Marker { id } => match self.store.marker(*id) {
                Some(m) => Point::new(m.rect.left, m.rect.bottom),
                None => return,
            },
            Selection::Arrow { point, .. } => *point,
        };

        let colors = self.store.colors.clone();
        let mut picked = None;
        let mut remove = false;
        egui::Area::new(egui::Id::new("selection_popover"))
            .fixed_pos(layout.to_screen(anchor) + egui::vec2(0.0, 4.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if !matches!(selection, Selection::Arrow { .. }) {
                            for color in &colors {
                                if ui
                                    .add_sized(
                                        [18.0, 18.0],
                                        egui::Button::new("").fill(color.rgba.to_color32()),
                                    )
                                    .on_hover_text(color.name.as_str())
                                    .clicked()
                                {
                                    picked = Some(color.name.clone());
                                }
                            }
                        }
                        if !matches!(selection, Selection::Text { .. })
                            && ui.button("Remove").clicked()
                        {
                            remove = true;
                        }
                    });
                });
            });

        match (selection, picked) {
            (Selection::Text { rect, .. }, Some(color)) => {
                self.dispatch(Action::AddMarker { rect, color });
            }
            (Selection::Marker { id }, Some(color)) => {
                self.dispatch(Action::SetMarkerColor { id, color });
            }
            _ => {}
        }
        if remove {
            self.remove_selected();
        }
    }
}

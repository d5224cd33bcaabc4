use eframe::egui;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::CodemarkApp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum CommandId {
    OpenSource,
    Undo,
    Redo,
    RemoveSelected,
    ClearAnnotations,
    ToggleArrowMode,
    ToggleStraightArrows,
    Help,
}

pub(super) struct CommandSpec {
    pub id: CommandId,
    pub name: &'static str,
    pub search: &'static str,
    pub shortcut: &'static str,
}

const fn command(
    id: CommandId,
    name: &'static str,
    search: &'static str,
    shortcut: &'static str,
) -> CommandSpec {
    CommandSpec { id, name, search, shortcut }
}

const COMMANDS: &[CommandSpec] = &[
    command(CommandId::OpenSource, "Open source file", "open source file load code", "⌘O"),
    command(CommandId::Undo, "Undo", "undo", "⌘Z"),
    command(CommandId::Redo, "Redo", "redo", "⌘⇧Z"),
    command(CommandId::RemoveSelected, "Remove selected marker or arrow", "delete remove marker arrow selected", "Del"),
    command(CommandId::ClearAnnotations, "Clear all annotations", "clear reset all annotations markers arrows", ""),
    command(CommandId::ToggleArrowMode, "Toggle freehand / jointed arrows", "arrow mode freehand jointed toggle", ""),
    command(CommandId::ToggleStraightArrows, "Toggle straight arrows", "arrow straight lines toggle", ""),
    command(CommandId::Help, "Shortcuts and gestures", "help shortcuts keys", "F1"),
];

#[derive(Default)]
pub(super) struct CommandPalette {
    pub open: bool,
    pub query: String,
    pub selected: usize,
    request_focus: bool,
}

#[derive(Clone, Copy)]
pub(super) struct CommandContext {
    pub has_undo: bool,
    pub has_redo: bool,
    pub has_removable_selection: bool,
}

impl CommandPalette {
    pub fn open(&mut self, query: impl Into<String>) {
        self.open = true;
        self.query = query.into();
        self.selected = 0;
        self.request_focus = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
        self.selected = 0;
        self.request_focus = false;
    }

    fn is_enabled(cx: CommandContext, id: CommandId) -> bool {
        match id {
            CommandId::Undo => cx.has_undo,
            CommandId::Redo => cx.has_redo,
            CommandId::RemoveSelected => cx.has_removable_selection,
            _ => true,
        }
    }

    pub(super) fn execute(app: &mut CodemarkApp, ctx: &egui::Context, id: CommandId) {
        match id {
            CommandId::OpenSource => app.open_source_dialog(),
            CommandId::Undo => app.undo(),
            CommandId::Redo => app.redo(),
            CommandId::RemoveSelected => app.remove_selected(),
            CommandId::ClearAnnotations => app.clear_annotations(),
            CommandId::ToggleArrowMode => app.toggle_arrow_mode(),
            CommandId::ToggleStraightArrows => {
                let straight = !app.store.show_straight_arrows;
                app.set_show_straight_arrows(straight);
            }
            CommandId::Help => app.show_help = true,
        }
        ctx.request_repaint();
    }

    fn filtered(&self) -> Vec<(&'static CommandSpec, i64)> {
        let matcher = SkimMatcherV2::default();
        let q = self.query.trim();
        if q.is_empty() {
            return COMMANDS.iter().map(|c| (c, 0)).collect();
        }
        let mut out: Vec<_> = COMMANDS
            .iter()
            .filter_map(|c| matcher.fuzzy_match(c.search, q).map(|score| (c, score)))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(b.0.name)));
        out
    }

    pub fn ui(&mut self, ctx: &egui::Context, cx: CommandContext) -> Option<CommandId> {
        if !self.open {
            return None;
        }
        let matches = self.filtered();
        if self.selected >= matches.len() {
            self.selected = matches.len().saturating_sub(1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.close();
            return None;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowDown)) && !matches.is_empty() {
            self.selected = (self.selected + 1).min(matches.len() - 1);
        }
        if ctx.input(|i| i.key_pressed(egui::Key::ArrowUp)) && !matches.is_empty() {
            self.selected = self.selected.saturating_sub(1);
        }
        let mut run_selected = ctx.input(|i| i.key_pressed(egui::Key::Enter));

        let just_opened = self.request_focus;
        let screen = ctx.content_rect();
        let width = 420.0_f32.min(screen.width() - 32.0);
        let pos = egui::pos2(screen.center().x - width * 0.5, screen.top() + 48.0);
        let area = egui::Area::new(egui::Id::new("command_palette"))
            .fixed_pos(pos)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_width(width);
                    let resp = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .desired_width(f32::INFINITY)
                            .hint_text("Type a command"),
                    );
                    if self.request_focus {
                        resp.request_focus();
                        self.request_focus = false;
                    }
                    if matches.is_empty() {
                        ui.weak("No matching command");
                        return;
                    }
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .max_height(220.0)
                        .auto_shrink([false, true])
                        .show(ui, |ui| {
                            for (idx, (spec, _score)) in matches.iter().enumerate() {
                                let enabled = CommandPalette::is_enabled(cx, spec.id);
                                ui.horizontal(|ui| {
                                    let row = ui.add_enabled(
                                        enabled,
                                        egui::Button::new(spec.name)
                                            .selected(idx == self.selected)
                                            .frame(idx == self.selected),
                                    );
                                    if idx == self.selected {
                                        row.scroll_to_me(None);
                                    }
                                    if row.clicked() {
                                        self.selected = idx;
                                        run_selected = true;
                                    }
                                    ui.with_layout(
                                        egui::Layout::right_to_left(egui::Align::Center),
                                        |ui| {
                                            ui.weak(spec.shortcut);
                                        },
                                    );
                                });
                            }
                        });
                });
            });
        if !just_opened && area.response.clicked_elsewhere() {
            self.close();
            return None;
        }

        if run_selected {
            if let Some((spec, _)) = matches.get(self.selected) {
                if CommandPalette::is_enabled(cx, spec.id) {
                    let cmd = spec.id;
                    self.close();
                    return Some(cmd);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_lists_every_command() {
        let palette = CommandPalette::default();
        assert_eq!(palette.filtered().len(), COMMANDS.len());
    }

    #[test]
    fn fuzzy_query_finds_the_arrow_commands() {
        let mut palette = CommandPalette::default();
        palette.open("jointed");
        let ids: Vec<_> = palette.filtered().iter().map(|(c, _)| c.id).collect();
        assert_eq!(ids, vec![CommandId::ToggleArrowMode]);
    }

    #[test]
    fn history_commands_follow_the_stacks() {
        let cx = CommandContext {
            has_undo: true,
            has_redo: false,
            has_removable_selection: false,
        };
        assert!(CommandPalette::is_enabled(cx, CommandId::Undo));
        assert!(!CommandPalette::is_enabled(cx, CommandId::Redo));
        assert!(!CommandPalette::is_enabled(cx, CommandId::RemoveSelected));
        assert!(CommandPalette::is_enabled(cx, CommandId::ClearAnnotations));
    }

    #[test]
    fn keyboard_bound_commands_show_their_shortcut() {
        let shortcut = |id| COMMANDS.iter().find(|c| c.id == id).map(|c| c.shortcut);
        assert_eq!(shortcut(CommandId::Undo), Some("⌘Z"));
        assert_eq!(shortcut(CommandId::Help), Some("F1"));
        assert_eq!(shortcut(CommandId::ClearAnnotations), Some(""));
    }
}

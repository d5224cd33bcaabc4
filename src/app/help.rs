use eframe::egui;

pub(super) fn draw_help_window(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Help & Commands")
        .open(open)
        .resizable(true)
        .default_width(520.0)
        .default_height(420.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Keyboard Shortcuts");
                ui.separator();

                help_row(ui, "⌘⇧P", "Open command palette");
                help_row(ui, "⌘O", "Open source file");
                help_row(ui, "⌘Z", "Undo");
                help_row(ui, "⌘⇧Z / ⌘Y", "Redo");
                help_row(ui, "Delete / Backspace", "Remove selected marker or arrow");
                help_row(ui, "Escape", "Cancel drag, then clear selection");
                help_row(ui, "F1", "This window");

                ui.add_space(10.0);
                ui.heading("Annotating");
                ui.separator();
                help_row(ui, "Drag over code", "Select a span, then pick a color to mark it");
                help_row(ui, "Click marker", "Recolor or remove it");
                help_row(ui, "Drag from marker", "Draw an arrow; release on another marker");
                help_row(ui, "Drag from arrow", "Branch a new arrow off an existing one");
                help_row(ui, "Right-click (drawing)", "Add a joint in jointed mode");
                help_row(ui, "Click line number", "Toggle the active color on that line");

                ui.add_space(10.0);
                ui.heading("Files");
                ui.separator();
                ui.label("• Annotations are saved automatically, one JSON file per source");
                ui.label("• Settings are stored in ~/.config/codemark.toml or settings.toml");
                ui.label("• Set RUST_LOG=debug for verbose logs, CODEMARK_LOG=<path> to log to a file");
            });
        });
}

fn help_row(ui: &mut egui::Ui, shortcut: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [150.0, 16.0],
            egui::Label::new(egui::RichText::new(shortcut).monospace().strong()),
        );
        ui.label(description);
    });
}

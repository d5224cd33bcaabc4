use codemark::drawing::ArrowDrawing;
use codemark::model::{ColorName, Point};
use codemark::persistence::AnnotationStore;
use codemark::settings::{self, AppSettings};
use codemark::source::Source;
use codemark::store::{self, Engine, State, Store};
use std::path::PathBuf;

mod actions;
mod command_palette;
mod geometry;
mod help;
mod render;
mod update;

#[derive(Clone, Copy, Debug)]
struct TextDrag {
    start: Point,
    current: Point,
}

pub struct CodemarkApp {
    store: Store,
    engine: Engine,
    drawing: ArrowDrawing,
    text_drag: Option<TextDrag>,
    source: Option<Source>,
    annotations: AnnotationStore,
    settings: AppSettings,
    settings_path: PathBuf,
    active_color: ColorName,
    status: Option<String>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
    trim_warnings: render::TrimWarnings,
}

impl CodemarkApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, initial: Option<PathBuf>) -> Self {
        let settings_path =
            AppSettings::config_path().unwrap_or_else(|| PathBuf::from("settings.toml"));
        let mut status = None;
        let settings = if settings_path.exists() {
            match settings::load_settings(&settings_path) {
                Ok(settings) => {
                    log::info!("loaded settings from {}", settings_path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("{e}");
                    status = Some(format!("Settings load failed: {e}"));
                    AppSettings::default()
                }
            }
        } else {
            AppSettings::default()
        };

        let engine = store::engine(settings.palette.clone()).with_limit(settings.history_limit);
        let mut state = State::new(settings.palette.clone());
        state.show_straight_arrows = settings.show_straight_arrows;
        let active_color = settings
            .palette
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let mut app = Self {
            store: Store::new(state),
            engine,
            drawing: ArrowDrawing::default(),
            text_drag: None,
            source: None,
            annotations: AnnotationStore::new(settings.annotations_dir.clone()),
            settings,
            settings_path,
            active_color,
            status,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
            trim_warnings: render::TrimWarnings::default(),
        };

        if let Some(path) = initial.or_else(|| app.settings.last_source.clone()) {
            app.open_source(path);
        }
        app
    }
}

mod app;

use std::path::PathBuf;

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Ok(path) = std::env::var("CODEMARK_LOG") {
        match std::fs::File::create(&path) {
            Ok(file) => {
                env_logger::Builder::from_env(env)
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Failed to create log file {}: {}", path, e);
                env_logger::Builder::from_env(env).init();
            }
        }
    } else {
        env_logger::Builder::from_env(env).init();
    }
}

fn main() -> eframe::Result<()> {
    init_logging();
    let initial = std::env::args_os().nth(1).map(PathBuf::from);
    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "codemark",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::CodemarkApp::new(cc, initial)))),
    )
}

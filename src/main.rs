use facewizard::app::FaceWizardApp;
use facewizard::config::Config;
use facewizard::face_detection::model_azure::AzureFaceModel;
use facewizard::face_detection::FaceDetector;
use facewizard::logging;
use facewizard::session::Workbench;
use facewizard::{Error, Result, APP_NAME};

fn main() -> Result<()> {
    logging::init_subscriber(logging::DEFAULT_FILTER)?;

    let config = Config::get()?;
    tracing::info!(endpoint = %config.endpoint, "starting {}", APP_NAME);

    // detection requests run here; the gui keeps the main thread
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("facewizard-worker")
        .enable_all()
        .build()
        .map_err(Error::Runtime)?;

    let model = AzureFaceModel::new(&config)?;
    let workbench = Workbench::new(
        FaceDetector::new(model),
        runtime.handle().clone(),
        config.outline_thickness,
    );

    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(config.window_width, config.window_height)),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(move |cc| {
            let _re_ui = re_ui::ReUi::load_and_apply(&cc.egui_ctx);
            Box::new(FaceWizardApp::new(cc, workbench))
        }),
    )?;

    Ok(())
}

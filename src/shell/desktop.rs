use super::{close_action, commands::*, CloseAction, QuitFlag};
use crate::assistant::{backend_from_config, Assistant};
use crate::capability::{DataChannel, FileChannel, NotAvailable};
use crate::config::AppConfig;
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::store::AppStore;
use crate::voice::{DemoRecognizer, VoiceController};
use crate::{logging, SharedStore};
use std::sync::Arc;
use tauri::{
    menu::{MenuBuilder, MenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Emitter, Manager, RunEvent, WindowEvent,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub config: AppConfig,
    pub store: SharedStore,
    pub assistant: Arc<Assistant>,
    pub voice: VoiceController<DemoRecognizer>,
    /// In-flight chat reply, cancelled by `cancel_message` or a newer send.
    pub chat_cancel: Mutex<Option<CancellationToken>>,
    pub voice_cancel: Mutex<Option<CancellationToken>>,
    pub data: Box<dyn DataChannel>,
    pub files: Box<dyn FileChannel>,
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("uncaught panic: {info}");
        default_hook(info);
        std::process::exit(1);
    }));
}

fn open_storage(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    let path = config.database_path();
    match SqliteStore::open(&path) {
        Ok(db) => {
            tracing::info!(path = %path.display(), "storage opened");
            Arc::new(db)
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                path = %path.display(),
                "storage init failed, data will not survive a restart"
            );
            Arc::new(MemoryStore::new())
        }
    }
}

fn show_main(app: &AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.show();
        let _ = window.set_focus();
    }
}

fn toggle_main(app: &AppHandle) {
    if let Some(window) = app.get_webview_window("main") {
        if window.is_visible().unwrap_or(false) {
            let _ = window.hide();
        } else {
            let _ = window.show();
            let _ = window.set_focus();
        }
    }
}

fn build_tray(app: &tauri::App) -> tauri::Result<()> {
    let show = MenuItem::with_id(app, "show", "Show Jarvis", true, None::<&str>)?;
    let voice = MenuItem::with_id(app, "voice", "Voice Command", true, None::<&str>)?;
    let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
    let tray_menu = MenuBuilder::new(app)
        .item(&show)
        .item(&voice)
        .separator()
        .item(&quit)
        .build()?;

    let mut tray = TrayIconBuilder::with_id("main")
        .tooltip("Jarvis Local")
        .menu(&tray_menu)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| match event.id.as_ref() {
            "show" => show_main(app),
            "voice" => {
                show_main(app);
                let _ = app.emit("activate-voice", ());
            }
            "quit" => {
                app.state::<QuitFlag>().set();
                app.exit(0);
            }
            _ => {}
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                toggle_main(tray.app_handle());
            }
        });
    if let Some(icon) = app.default_window_icon() {
        tray = tray.icon(icon.clone());
    }
    tray.build(app)?;
    Ok(())
}

pub fn run() {
    let config = AppConfig::load();

    // keep the guard alive for the whole run so the file writer flushes
    let _log_guard = match logging::init(&config.log_filter, &config.log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("[jarvis] logging init failed: {e}");
            None
        }
    };
    install_panic_hook();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        backend = ?config.llm_backend,
        "starting Jarvis Local"
    );

    let mut store = AppStore::new(open_storage(&config));
    store.initialize();
    let start_minimized = store.settings().start_minimized;

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        assistant: Arc::new(Assistant::new(backend_from_config(&config))),
        voice: VoiceController::new(DemoRecognizer::new(config.timings)),
        chat_cancel: Mutex::new(None),
        voice_cancel: Mutex::new(None),
        data: Box::new(NotAvailable),
        files: Box::new(NotAvailable),
        config,
    };

    let app = tauri::Builder::default()
        .manage(state)
        .manage(QuitFlag::new())
        .setup(move |app| {
            if let Some(window) = app.get_webview_window("main") {
                if start_minimized {
                    tracing::info!("starting minimized to tray");
                } else {
                    window.show()?;
                    window.set_focus()?;
                }
            } else {
                tracing::error!("main window missing on startup");
            }

            build_tray(app)?;

            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let state = handle.state::<AppState>();
                let health = state.assistant.check_status(&state.store).await;
                tracing::info!(running = health.running, "initial LLM status check done");
            });

            Ok(())
        })
        .on_window_event(|window, event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                let quit = window.state::<QuitFlag>();
                if close_action(&quit) == CloseAction::Hide {
                    api.prevent_close();
                    let _ = window.hide();
                    tracing::debug!(label = window.label(), "window hidden to tray");
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            window_minimize,
            window_maximize,
            window_close,
            window_is_maximized,
            app_get_path,
            app_get_version,
            get_snapshot,
            get_dashboard,
            set_current_page,
            list_tasks,
            add_task,
            update_task,
            delete_task,
            select_task,
            list_events,
            add_event,
            update_event,
            delete_event,
            select_event,
            index_folder,
            search_files,
            list_skills,
            toggle_skill,
            get_settings,
            update_settings,
            send_message,
            cancel_message,
            check_llm_status,
            llm_chat,
            llm_check_status,
            voice_start,
            voice_stop,
            db_query,
            db_run,
            db_get_all,
            db_get,
            select_directory,
            select_file,
            read_file,
            write_file,
        ])
        .build(tauri::generate_context!());

    let app = match app {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to build application");
            std::process::exit(1);
        }
    };

    app.run(|app_handle, event| match event {
        RunEvent::ExitRequested { .. } => {
            app_handle.state::<QuitFlag>().set();
            tracing::info!("shutting down");
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => show_main(app_handle),
        _ => {}
    });
}

//! IPC commands exposed to the web UI.

use super::{named_path, ShellError};
use crate::assistant::{ChatTurn, LlmHealth};
use crate::capability::{CapabilityError, FileFilter};
use crate::model::{
    CalendarEvent, EntityId, EventPatch, FileItem, NewEvent, NewTask, Page, Settings, SettingsPatch,
    Skill, Task, TaskFilter, TaskPatch,
};
use crate::store::{AppSnapshot, Dashboard};
use crate::voice::VoiceOutcome;
use chrono::Utc;
use serde_json::Value;
use tauri::{AppHandle, Emitter, State, WebviewWindow};
use tokio_util::sync::CancellationToken;

use super::desktop::AppState;

// --- window controls ---

#[tauri::command]
pub fn window_minimize(window: WebviewWindow) -> Result<(), String> {
    window.minimize().map_err(|e| e.to_string())
}

/// Toggle maximized state; returns whether the window is now maximized.
#[tauri::command]
pub fn window_maximize(window: WebviewWindow) -> Result<bool, String> {
    if window.is_maximized().map_err(|e| e.to_string())? {
        window.unmaximize().map_err(|e| e.to_string())?;
        Ok(false)
    } else {
        window.maximize().map_err(|e| e.to_string())?;
        Ok(true)
    }
}

#[tauri::command]
pub fn window_close(window: WebviewWindow) -> Result<(), String> {
    window.hide().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn window_is_maximized(window: WebviewWindow) -> bool {
    window.is_maximized().unwrap_or(false)
}

// --- app info ---

#[tauri::command]
pub fn app_get_path(name: String, state: State<'_, AppState>) -> Result<String, String> {
    named_path(&name, &state.config)
        .map(|p| p.to_string_lossy().into_owned())
        .map_err(|e: ShellError| e.to_string())
}

#[tauri::command]
pub fn app_get_version(app_handle: AppHandle) -> String {
    app_handle.package_info().version.to_string()
}

// --- store ---

#[tauri::command]
pub async fn get_snapshot(state: State<'_, AppState>) -> Result<AppSnapshot, String> {
    Ok(state.store.lock().await.snapshot())
}

#[tauri::command]
pub async fn get_dashboard(state: State<'_, AppState>) -> Result<Dashboard, String> {
    Ok(state.store.lock().await.dashboard(Utc::now()))
}

#[tauri::command]
pub async fn set_current_page(page: Page, state: State<'_, AppState>) -> Result<(), String> {
    state.store.lock().await.set_current_page(page);
    Ok(())
}

// --- tasks ---

#[tauri::command]
pub async fn list_tasks(
    filter: Option<TaskFilter>,
    state: State<'_, AppState>,
) -> Result<Vec<Task>, String> {
    Ok(state.store.lock().await.tasks_filtered(filter.unwrap_or_default()))
}

#[tauri::command]
pub async fn add_task(task: NewTask, state: State<'_, AppState>) -> Result<Task, String> {
    state.store.lock().await.add_task(task).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn update_task(
    id: EntityId,
    updates: TaskPatch,
    state: State<'_, AppState>,
) -> Result<Option<Task>, String> {
    state.store.lock().await.update_task(id, updates).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_task(id: EntityId, state: State<'_, AppState>) -> Result<(), String> {
    state.store.lock().await.delete_task(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_task(
    id: Option<EntityId>,
    state: State<'_, AppState>,
) -> Result<Option<Task>, String> {
    let mut store = state.store.lock().await;
    store.select_task(id);
    Ok(store.selected_task())
}

// --- calendar ---

#[tauri::command]
pub async fn list_events(state: State<'_, AppState>) -> Result<Vec<CalendarEvent>, String> {
    Ok(state.store.lock().await.events_sorted())
}

#[tauri::command]
pub async fn add_event(
    event: NewEvent,
    state: State<'_, AppState>,
) -> Result<CalendarEvent, String> {
    state.store.lock().await.add_event(event).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn update_event(
    id: EntityId,
    updates: EventPatch,
    state: State<'_, AppState>,
) -> Result<Option<CalendarEvent>, String> {
    state.store.lock().await.update_event(id, updates).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn delete_event(id: EntityId, state: State<'_, AppState>) -> Result<(), String> {
    state.store.lock().await.delete_event(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_event(
    id: Option<EntityId>,
    state: State<'_, AppState>,
) -> Result<Option<CalendarEvent>, String> {
    let mut store = state.store.lock().await;
    store.select_event(id);
    Ok(store.selected_event())
}

// --- files and skills ---

#[tauri::command]
pub async fn index_folder(path: String, state: State<'_, AppState>) -> Result<Vec<String>, String> {
    let mut store = state.store.lock().await;
    store.index_folder(path);
    Ok(store.indexed_folders())
}

#[tauri::command]
pub async fn search_files(
    query: String,
    state: State<'_, AppState>,
) -> Result<Vec<FileItem>, String> {
    Ok(state.store.lock().await.search_files(&query))
}

#[tauri::command]
pub async fn list_skills(state: State<'_, AppState>) -> Result<Vec<Skill>, String> {
    Ok(state.store.lock().await.skills())
}

#[tauri::command]
pub async fn toggle_skill(
    id: EntityId,
    state: State<'_, AppState>,
) -> Result<Option<bool>, String> {
    Ok(state.store.lock().await.toggle_skill(id))
}

// --- settings ---

#[tauri::command]
pub async fn get_settings(state: State<'_, AppState>) -> Result<Settings, String> {
    Ok(state.store.lock().await.settings())
}

#[tauri::command]
pub async fn update_settings(
    settings: SettingsPatch,
    state: State<'_, AppState>,
) -> Result<Settings, String> {
    state.store.lock().await.update_settings(settings).map_err(|e| e.to_string())
}

// --- chat ---

#[tauri::command]
pub async fn send_message(content: String, state: State<'_, AppState>) -> Result<String, String> {
    let token = CancellationToken::new();
    if let Some(previous) = state.chat_cancel.lock().await.replace(token.clone()) {
        previous.cancel();
    }
    state
        .assistant
        .send_message(&state.store, content, &token)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_message(state: State<'_, AppState>) -> Result<(), String> {
    if let Some(token) = state.chat_cancel.lock().await.take() {
        token.cancel();
    }
    Ok(())
}

#[tauri::command]
pub async fn check_llm_status(state: State<'_, AppState>) -> Result<LlmHealth, String> {
    Ok(state.assistant.check_status(&state.store).await)
}

#[tauri::command]
pub async fn llm_chat(
    messages: Vec<ChatTurn>,
    state: State<'_, AppState>,
) -> Result<String, String> {
    let model = state.store.lock().await.settings().llm_model;
    state.assistant.chat(&model, &messages).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn llm_check_status(state: State<'_, AppState>) -> Result<LlmHealth, String> {
    let model = state.store.lock().await.settings().llm_model;
    state.assistant.health(&model).await.map_err(|e| e.to_string())
}

// --- voice ---

#[tauri::command]
pub async fn voice_start(app_handle: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let token = CancellationToken::new();
    if let Some(previous) = state.voice_cancel.lock().await.replace(token.clone()) {
        previous.cancel();
    }

    let emitter = app_handle.clone();
    let outcome = state
        .voice
        .run(&state.store, &token, move |status| {
            let _ = emitter.emit("voice:status", status);
        })
        .await;

    match outcome {
        VoiceOutcome::Finished(Some(text)) => {
            let _ = app_handle.emit("voice:result", text);
            Ok(())
        }
        VoiceOutcome::Finished(None) | VoiceOutcome::Cancelled => Ok(()),
        VoiceOutcome::Failed(e) => Err(e),
    }
}

#[tauri::command]
pub async fn voice_stop(app_handle: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let token = state.voice_cancel.lock().await.take();
    crate::voice::stop(&state.store, token).await;
    let _ = app_handle.emit("voice:status", crate::model::VoiceStatus::Idle);
    Ok(())
}

// --- declared boundary channels ---

#[tauri::command]
pub fn db_query(
    query: String,
    params: Option<Vec<Value>>,
    state: State<'_, AppState>,
) -> Result<Value, CapabilityError> {
    state.data.query(&query, params.as_deref().unwrap_or_default())
}

#[tauri::command]
pub fn db_run(
    query: String,
    params: Option<Vec<Value>>,
    state: State<'_, AppState>,
) -> Result<Value, CapabilityError> {
    state.data.run(&query, params.as_deref().unwrap_or_default())
}

#[tauri::command]
pub fn db_get_all(
    query: String,
    params: Option<Vec<Value>>,
    state: State<'_, AppState>,
) -> Result<Vec<Value>, CapabilityError> {
    state.data.get_all(&query, params.as_deref().unwrap_or_default())
}

#[tauri::command]
pub fn db_get(
    query: String,
    params: Option<Vec<Value>>,
    state: State<'_, AppState>,
) -> Result<Option<Value>, CapabilityError> {
    state.data.get(&query, params.as_deref().unwrap_or_default())
}

#[tauri::command]
pub fn select_directory(state: State<'_, AppState>) -> Result<Option<String>, CapabilityError> {
    state.files.select_directory()
}

#[tauri::command]
pub fn select_file(
    filters: Option<Vec<FileFilter>>,
    state: State<'_, AppState>,
) -> Result<Option<String>, CapabilityError> {
    state.files.select_file(filters.as_deref().unwrap_or_default())
}

#[tauri::command]
pub fn read_file(path: String, state: State<'_, AppState>) -> Result<String, CapabilityError> {
    state.files.read_file(&path)
}

#[tauri::command]
pub fn write_file(
    path: String,
    content: String,
    state: State<'_, AppState>,
) -> Result<(), CapabilityError> {
    state.files.write_file(&path, &content)
}

use crate::db::Database;
use crate::models::{Installation, InstallationStatus};
use tauri::State;

#[tauri::command]
pub fn create_installation(
    db: State<Database>,
    quote_id: i64,
    scheduled_date: String,
    notes: Option<String>,
) -> Result<i64, String> {
    db.create_installation(quote_id, &scheduled_date, notes.as_deref().unwrap_or_default())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_installations(
    db: State<Database>,
    status: Option<InstallationStatus>,
) -> Result<Vec<Installation>, String> {
    db.list_installations(status).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_installation_status(
    db: State<Database>,
    id: i64,
    status: InstallationStatus,
) -> Result<(), String> {
    db.update_installation_status(id, status)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_installation(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_installation(id).map_err(|e| e.to_string())
}

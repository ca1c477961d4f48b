use crate::backup;
use crate::db::Database;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tauri::State;

#[tauri::command]
pub fn get_backup_dir(db: State<Database>) -> Result<String, String> {
    let dir = backup::backup_dir(&db).map_err(|e| e.to_string())?;
    Ok(dir.to_string_lossy().to_string())
}

/// Caminho vazio volta para a pasta padrão
#[tauri::command]
pub fn set_backup_dir(db: State<Database>, path: String) -> Result<String, String> {
    let dir = backup::set_backup_dir(&db, &path).map_err(|e| e.to_string())?;
    Ok(dir.to_string_lossy().to_string())
}

/// Grava o backup e tenta enviar ao Google Drive; falha no envio só gera log
#[tauri::command]
pub async fn save_backup(db: State<'_, Database>) -> Result<String, String> {
    let path = backup::save_backup(&db).map_err(|e| e.to_string())?;
    crate::drive::sync_backup(&db).await;
    Ok(path.to_string_lossy().to_string())
}

#[tauri::command]
pub fn export_all_data(db: State<Database>) -> Result<serde_json::Value, String> {
    backup::export_all_data(&db).map_err(|e| e.to_string())
}

/// Retorna registros restaurados por tabela
#[tauri::command]
pub fn restore_backup(db: State<Database>, path: Option<String>) -> Result<BTreeMap<String, usize>, String> {
    let path = path.filter(|p| !p.trim().is_empty()).map(PathBuf::from);
    backup::restore_from_backup(&db, path.as_deref()).map_err(|e| e.to_string())
}

/// Id do arquivo no Drive, ou `None` sem pasta/token configurados
#[tauri::command]
pub async fn upload_backup_to_drive(db: State<'_, Database>) -> Result<Option<String>, String> {
    crate::drive::upload_backup_to_drive(&db)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn test_drive_connection(db: State<'_, Database>) -> Result<bool, String> {
    crate::drive::test_drive_connection(&db)
        .await
        .map_err(|e| e.to_string())
}

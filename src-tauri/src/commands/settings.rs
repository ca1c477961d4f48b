use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use crate::db::Database;
use crate::models::{Settings, SettingsUpdate};
use tauri::State;

/// Tamanho máximo do logo (500KB)
const MAX_LOGO_BYTES: usize = 500_000;

#[tauri::command]
pub fn get_settings(db: State<Database>) -> Result<Settings, String> {
    db.get_settings().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_settings(db: State<Database>, update: SettingsUpdate) -> Result<bool, String> {
    db.update_settings(&update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_dobra_value(db: State<Database>) -> Result<f64, String> {
    db.get_dobra_value().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn load_company_logo(db: State<Database>, logo_path: String) -> Result<String, String> {
    let bytes = std::fs::read(&logo_path)
        .map_err(|e| format!("Erro ao ler imagem: {}", e))?;

    if bytes.len() > MAX_LOGO_BYTES {
        return Err("A imagem é muito grande. Máximo 500KB.".to_string());
    }
    image::guess_format(&bytes).map_err(|_| "Formato de imagem não suportado".to_string())?;

    db.set_company_logo(&bytes).map_err(|e| e.to_string())?;
    Ok("Logo carregado com sucesso".to_string())
}

/// Logo em base64, ou `None` sem logo
#[tauri::command]
pub fn get_company_logo(db: State<Database>) -> Result<Option<String>, String> {
    let logo = db.company_logo().map_err(|e| e.to_string())?;
    Ok(logo.map(|bytes| BASE64.encode(bytes)))
}

#[tauri::command]
pub fn remove_company_logo(db: State<Database>) -> Result<(), String> {
    db.clear_company_logo().map_err(|e| e.to_string())
}

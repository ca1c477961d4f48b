use crate::db::Database;
use crate::models::{DashboardStats, MonthlyAnalytics, StatusCount};
use crate::{charts, export};
use std::collections::BTreeMap;
use std::path::Path;
use tauri::State;

#[tauri::command]
pub fn get_dashboard_stats(db: State<Database>) -> Result<DashboardStats, String> {
    db.dashboard_stats().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_monthly_analytics(db: State<Database>) -> Result<Vec<MonthlyAnalytics>, String> {
    db.monthly_analytics().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_quotes_by_status(db: State<Database>) -> Result<Vec<StatusCount>, String> {
    db.quotes_by_status().map_err(|e| e.to_string())
}

/// Grava os PNG na pasta de gráficos; nome -> caminho
#[tauri::command]
pub fn generate_charts(db: State<Database>) -> Result<BTreeMap<String, String>, String> {
    let saved = charts::save_all_charts(&db).map_err(|e| e.to_string())?;
    Ok(saved
        .into_iter()
        .map(|(name, path)| (name, path.to_string_lossy().to_string()))
        .collect())
}

/// Gráficos em base64 para a tela de análises
#[tauri::command]
pub fn get_chart_images(db: State<Database>) -> Result<BTreeMap<String, String>, String> {
    let images = charts::build_charts(&db).map_err(|e| e.to_string())?;
    images
        .iter()
        .map(|(name, img)| Ok((name.to_string(), charts::chart_base64(img).map_err(|e| e.to_string())?)))
        .collect()
}

#[tauri::command]
pub fn export_quotes_csv(db: State<Database>, path: String) -> Result<String, String> {
    export::export_quotes_csv(&db, Path::new(&path)).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn export_expenses_csv(db: State<Database>, path: String) -> Result<String, String> {
    export::export_expenses_csv(&db, Path::new(&path)).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn export_inventory_csv(db: State<Database>, path: String) -> Result<String, String> {
    export::export_inventory_csv(&db, Path::new(&path)).map_err(|e| e.to_string())
}

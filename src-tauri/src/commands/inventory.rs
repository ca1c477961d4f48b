use crate::db::Database;
use crate::models::{InventoryItem, StockOperation};
use tauri::State;

#[tauri::command]
pub fn create_inventory_item(db: State<Database>, item: InventoryItem) -> Result<i64, String> {
    db.create_inventory_item(&item).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_inventory(
    db: State<Database>,
    search: Option<String>,
    type_filter: Option<String>,
) -> Result<Vec<InventoryItem>, String> {
    db.list_inventory(
        search.as_deref().unwrap_or_default(),
        type_filter.as_deref().unwrap_or_default(),
    )
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_inventory_item(db: State<Database>, id: i64) -> Result<InventoryItem, String> {
    db.get_inventory_item(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_low_stock(db: State<Database>) -> Result<Vec<InventoryItem>, String> {
    db.list_low_stock().map_err(|e| e.to_string())
}

/// Retorna a nova quantidade
#[tauri::command]
pub fn update_inventory_quantity(
    db: State<Database>,
    id: i64,
    amount: f64,
    operation: StockOperation,
) -> Result<f64, String> {
    db.update_inventory_quantity(id, amount, operation)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_inventory_item(db: State<Database>, item: InventoryItem) -> Result<(), String> {
    db.update_inventory_item(&item).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_inventory_item(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_inventory_item(id).map_err(|e| e.to_string())
}

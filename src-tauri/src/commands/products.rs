use crate::db::Database;
use crate::models::{MaterialUnit, Product, ProductMaterial, ProductType, ProductUpdate};
use tauri::State;

#[tauri::command]
pub fn create_product(db: State<Database>, product: Product) -> Result<i64, String> {
    db.create_product(&product).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_products(
    db: State<Database>,
    search: Option<String>,
    type_filter: Option<String>,
) -> Result<Vec<Product>, String> {
    db.list_products(
        search.as_deref().unwrap_or_default(),
        type_filter.as_deref().unwrap_or_default(),
    )
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_product(db: State<Database>, id: i64) -> Result<Product, String> {
    db.get_product(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_product(db: State<Database>, id: i64, update: ProductUpdate) -> Result<bool, String> {
    db.update_product(id, &update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_product(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_product(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_product_types(db: State<Database>) -> Result<Vec<ProductType>, String> {
    db.list_product_types().map_err(|e| e.to_string())
}

#[tauri::command]
pub fn create_product_type(db: State<Database>, key: String, label: String) -> Result<i64, String> {
    db.create_product_type(&key, &label).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_product_type(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_product_type(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_product_materials(db: State<Database>, product_id: i64) -> Result<Vec<ProductMaterial>, String> {
    db.list_product_materials(product_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn add_product_material(
    db: State<Database>,
    product_id: i64,
    inventory_id: i64,
    quantity_per_unit: f64,
    unit_type: Option<MaterialUnit>,
) -> Result<i64, String> {
    db.add_product_material(product_id, inventory_id, quantity_per_unit, unit_type.unwrap_or_default())
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_product_material(db: State<Database>, id: i64) -> Result<(), String> {
    db.remove_product_material(id).map_err(|e| e.to_string())
}

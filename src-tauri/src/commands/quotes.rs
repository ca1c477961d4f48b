use crate::db::Database;
use crate::models::{
    DiscountType, NewQuote, NewQuoteItem, Quote, QuoteItem, QuoteItemUpdate, QuoteStatus, QuoteTotals, QuoteUpdate,
    QuoteWithItems,
};
use std::path::PathBuf;
use tauri::State;

#[tauri::command]
pub fn create_quote(db: State<Database>, quote: NewQuote) -> Result<i64, String> {
    db.create_quote(&quote).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_quotes(
    db: State<Database>,
    search: Option<String>,
    status: Option<QuoteStatus>,
) -> Result<Vec<Quote>, String> {
    db.list_quotes(search.as_deref().unwrap_or_default(), status)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_quote(db: State<Database>, id: i64) -> Result<QuoteWithItems, String> {
    db.get_quote(id).map_err(|e| e.to_string())
}

/// Retorna os avisos de estoque quando a edição aprova o orçamento
#[tauri::command]
pub fn update_quote(db: State<Database>, id: i64, update: QuoteUpdate) -> Result<Vec<String>, String> {
    db.update_quote(id, &update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_quote_discount(
    db: State<Database>,
    id: i64,
    value: f64,
    discount_type: DiscountType,
) -> Result<QuoteTotals, String> {
    db.set_quote_discount(id, value, discount_type)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_quote_status(db: State<Database>, id: i64, status: QuoteStatus) -> Result<Vec<String>, String> {
    db.update_quote_status(id, status).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn approve_quote(db: State<Database>, id: i64) -> Result<Vec<String>, String> {
    db.approve_quote(id).map_err(|e| e.to_string())
}

/// Próximo status do fluxo, com os avisos de estoque da aprovação
#[tauri::command]
pub fn advance_quote_status(db: State<Database>, id: i64) -> Result<(QuoteStatus, Vec<String>), String> {
    db.advance_quote_status(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_quote(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_quote(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn recalculate_quote_totals(db: State<Database>, id: i64) -> Result<QuoteTotals, String> {
    db.recalculate_quote_totals(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn add_quote_item(db: State<Database>, quote_id: i64, item: NewQuoteItem) -> Result<i64, String> {
    db.add_quote_item(quote_id, &item).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_quote_item(db: State<Database>, item_id: i64, update: QuoteItemUpdate) -> Result<QuoteItem, String> {
    db.update_quote_item(item_id, &update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn remove_quote_item(db: State<Database>, item_id: i64) -> Result<(), String> {
    db.remove_quote_item(item_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn deduct_stock_for_quote(db: State<Database>, quote_id: i64) -> Result<Vec<String>, String> {
    db.deduct_stock_for_quote(quote_id).map_err(|e| e.to_string())
}

/// Gera o PDF e retorna o caminho do arquivo
#[tauri::command]
pub fn generate_quote_pdf(db: State<Database>, id: i64, output: Option<String>) -> Result<String, String> {
    let output = output.filter(|p| !p.trim().is_empty()).map(PathBuf::from);
    let path = crate::pdf::export_quote_pdf(&db, id, output.as_deref()).map_err(|e| e.to_string())?;
    Ok(path.to_string_lossy().to_string())
}

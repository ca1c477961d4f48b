use crate::db::Database;
use crate::models::{
    Employee, EmployeeUpdate, Expense, ExpenseCategory, ExpenseSummary, ExpenseUpdate, Payment, PaymentSummary,
    PayrollEntry, PayrollSummary,
};
use std::collections::BTreeMap;
use tauri::State;

// --- Pagamentos ---

#[tauri::command]
pub fn add_payment(db: State<Database>, payment: Payment) -> Result<i64, String> {
    db.add_payment(&payment).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_payments(db: State<Database>, quote_id: i64) -> Result<Vec<Payment>, String> {
    db.list_payments(quote_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_payment(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_payment(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_payment_summary(db: State<Database>, quote_id: i64) -> Result<PaymentSummary, String> {
    db.payment_summary(quote_id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_all_payment_summaries(db: State<Database>) -> Result<BTreeMap<i64, PaymentSummary>, String> {
    db.all_payment_summaries().map_err(|e| e.to_string())
}

// --- Despesas ---

#[tauri::command]
pub fn create_expense(db: State<Database>, expense: Expense) -> Result<i64, String> {
    db.create_expense(&expense).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_expense(db: State<Database>, id: i64, update: ExpenseUpdate) -> Result<bool, String> {
    db.update_expense(id, &update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_expenses(
    db: State<Database>,
    search: Option<String>,
    category: Option<ExpenseCategory>,
) -> Result<Vec<Expense>, String> {
    db.list_expenses(search.as_deref().unwrap_or_default(), category)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_expense(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_expense(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_expenses_summary(db: State<Database>) -> Result<ExpenseSummary, String> {
    db.expenses_summary().map_err(|e| e.to_string())
}

// --- Funcionários e folha ---

#[tauri::command]
pub fn create_employee(db: State<Database>, employee: Employee) -> Result<i64, String> {
    db.create_employee(&employee).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn update_employee(db: State<Database>, id: i64, update: EmployeeUpdate) -> Result<bool, String> {
    db.update_employee(id, &update).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_employees(db: State<Database>, active_only: Option<bool>) -> Result<Vec<Employee>, String> {
    db.list_employees(active_only.unwrap_or(false))
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_employee(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_employee(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn add_payroll(db: State<Database>, entry: PayrollEntry) -> Result<i64, String> {
    db.add_payroll(&entry).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_payroll(db: State<Database>, month: Option<String>) -> Result<Vec<PayrollEntry>, String> {
    db.list_payroll(month.as_deref()).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn delete_payroll(db: State<Database>, id: i64) -> Result<(), String> {
    db.delete_payroll(id).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_payroll_summary(db: State<Database>) -> Result<PayrollSummary, String> {
    db.payroll_summary().map_err(|e| e.to_string())
}

use super::{like_pattern, now_string, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Expense, ExpenseCategory, ExpenseSummary, ExpenseUpdate};
use rusqlite::Row;
use std::collections::BTreeMap;

const EXPENSE_COLUMNS: &str = "id, description, category, amount, expense_date, notes, created_at, updated_at";

fn row_to_expense(row: &Row) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: Some(row.get(0)?),
        description: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        expense_date: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Valor deve ser maior que zero"));
    }
    Ok(())
}

impl Database {
    pub fn create_expense(&self, expense: &Expense) -> AppResult<i64> {
        if expense.description.trim().is_empty() {
            return Err(AppError::validation("Descrição é obrigatória"));
        }
        validate_amount(expense.amount)?;

        let date = expense
            .expense_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .unwrap_or_else(today);

        self.write(|tx| {
            tx.execute(
                "INSERT INTO expenses (description, category, amount, expense_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    expense.description.trim(),
                    expense.category,
                    expense.amount,
                    date,
                    expense.notes.trim(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn update_expense(&self, id: i64, update: &ExpenseUpdate) -> AppResult<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref v) = update.description {
            if v.trim().is_empty() {
                return Err(AppError::validation("Descrição é obrigatória"));
            }
            sets.push("description = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        if let Some(v) = update.category {
            sets.push("category = ?");
            params.push(Box::new(v));
        }
        if let Some(v) = update.amount {
            validate_amount(v)?;
            sets.push("amount = ?");
            params.push(Box::new(v));
        }
        if let Some(ref v) = update.expense_date {
            if !v.trim().is_empty() {
                sets.push("expense_date = ?");
                params.push(Box::new(v.trim().to_string()));
            }
        }
        if let Some(ref v) = update.notes {
            sets.push("notes = ?");
            params.push(Box::new(v.trim().to_string()));
        }

        if sets.is_empty() {
            return Ok(false);
        }
        sets.push("updated_at = ?");
        params.push(Box::new(now_string()));
        params.push(Box::new(id));

        let sql = format!("UPDATE expenses SET {} WHERE id = ?", sets.join(", "));
        self.write(|tx| {
            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let changed = tx.execute(&sql, params_refs.as_slice())?;
            if changed == 0 {
                return Err(AppError::not_found("Despesa não encontrada"));
            }
            Ok(true)
        })
    }

    /// Mais recentes primeiro
    pub fn list_expenses(&self, search: &str, category: Option<ExpenseCategory>) -> AppResult<Vec<Expense>> {
        self.read(|conn| {
            let mut sql = format!("SELECT {} FROM expenses WHERE 1=1", EXPENSE_COLUMNS);
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if !search.trim().is_empty() {
                sql.push_str(" AND (description LIKE ? OR notes LIKE ?)");
                let pattern = like_pattern(search);
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
            if let Some(category) = category {
                sql.push_str(" AND category = ?");
                params.push(Box::new(category));
            }
            sql.push_str(" ORDER BY expense_date DESC, id DESC");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let expenses = stmt
                .query_map(params_refs.as_slice(), row_to_expense)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(expenses)
        })
    }

    pub fn delete_expense(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM expenses WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Despesa não encontrada"));
            }
            Ok(())
        })
    }

    pub fn expenses_summary(&self) -> AppResult<ExpenseSummary> {
        self.read(|conn| {
            let total: f64 = conn.query_row("SELECT COALESCE(SUM(amount), 0) FROM expenses", [], |row| row.get(0))?;
            let month_total: f64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM expenses
                 WHERE strftime('%Y-%m', expense_date) = strftime('%Y-%m', 'now', 'localtime')",
                [],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare("SELECT category, SUM(amount) FROM expenses GROUP BY category")?;
            let by_category: BTreeMap<String, f64> = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?
                .collect::<Result<_, _>>()?;

            Ok(ExpenseSummary {
                total,
                month_total,
                by_category,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(description: &str, category: ExpenseCategory, amount: f64, date: Option<&str>) -> Expense {
        Expense {
            id: None,
            description: description.to_string(),
            category,
            amount,
            expense_date: date.map(String::from),
            notes: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_resumo_por_categoria_e_mes() {
        let db = Database::open_in_memory().unwrap();
        db.create_expense(&expense("Gasolina", ExpenseCategory::Transporte, 120.0, None)).unwrap();
        db.create_expense(&expense("Pedágio", ExpenseCategory::Transporte, 30.0, None)).unwrap();
        db.create_expense(&expense("Aluguel galpão", ExpenseCategory::Aluguel, 1500.0, Some("2020-01-05")))
            .unwrap();

        let summary = db.expenses_summary().unwrap();
        assert_eq!(summary.total, 1650.0);
        assert_eq!(summary.month_total, 150.0);
        assert_eq!(summary.by_category["transporte"], 150.0);
        assert_eq!(summary.by_category["aluguel"], 1500.0);
    }

    #[test]
    fn test_filtros_e_edicao() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .create_expense(&expense("Disco de corte", ExpenseCategory::Material, 45.0, Some("2026-05-02")))
            .unwrap();
        db.create_expense(&expense("Furadeira", ExpenseCategory::Equipamento, 600.0, Some("2026-05-03")))
            .unwrap();

        let all = db.list_expenses("", None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].description, "Furadeira");
        assert_eq!(db.list_expenses("disco", None).unwrap().len(), 1);
        assert_eq!(
            db.list_expenses("", Some(ExpenseCategory::Equipamento)).unwrap().len(),
            1
        );

        db.update_expense(
            id,
            &ExpenseUpdate {
                amount: Some(50.0),
                category: Some(ExpenseCategory::Manutencao),
                ..Default::default()
            },
        )
        .unwrap();
        let list = db.list_expenses("", Some(ExpenseCategory::Manutencao)).unwrap();
        assert_eq!(list[0].amount, 50.0);

        db.delete_expense(id).unwrap();
        assert!(matches!(db.delete_expense(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_valor_obrigatorio() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.create_expense(&expense("X", ExpenseCategory::Geral, 0.0, None)).is_err());
        assert!(db.create_expense(&expense(" ", ExpenseCategory::Geral, 10.0, None)).is_err());
    }
}

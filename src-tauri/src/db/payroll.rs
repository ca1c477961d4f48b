use super::{now_string, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Employee, EmployeeUpdate, PayrollEntry, PayrollSummary};
use rusqlite::{OptionalExtension, Row};

fn row_to_employee(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        role: row.get(2)?,
        phone: row.get(3)?,
        salary: row.get(4)?,
        active: row.get::<_, i32>(5)? != 0,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// `AAAA-MM`
fn is_reference_month(value: &str) -> bool {
    chrono::NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").is_ok() && value.len() == 7
}

impl Database {
    pub fn create_employee(&self, employee: &Employee) -> AppResult<i64> {
        if employee.name.trim().is_empty() {
            return Err(AppError::validation("Nome do funcionário é obrigatório"));
        }
        if !employee.salary.is_finite() || employee.salary < 0.0 {
            return Err(AppError::validation("Salário não pode ser negativo"));
        }

        self.write(|tx| {
            tx.execute(
                "INSERT INTO employees (name, role, phone, salary, active) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    employee.name.trim(),
                    employee.role.trim(),
                    employee.phone.trim(),
                    employee.salary,
                    employee.active as i32,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn update_employee(&self, id: i64, update: &EmployeeUpdate) -> AppResult<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref v) = update.name {
            if v.trim().is_empty() {
                return Err(AppError::validation("Nome do funcionário é obrigatório"));
            }
            sets.push("name = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        if let Some(ref v) = update.role {
            sets.push("role = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        if let Some(ref v) = update.phone {
            sets.push("phone = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        if let Some(v) = update.salary {
            if !v.is_finite() || v < 0.0 {
                return Err(AppError::validation("Salário não pode ser negativo"));
            }
            sets.push("salary = ?");
            params.push(Box::new(v));
        }
        if let Some(v) = update.active {
            sets.push("active = ?");
            params.push(Box::new(v as i32));
        }

        if sets.is_empty() {
            return Ok(false);
        }
        sets.push("updated_at = ?");
        params.push(Box::new(now_string()));
        params.push(Box::new(id));

        let sql = format!("UPDATE employees SET {} WHERE id = ?", sets.join(", "));
        self.write(|tx| {
            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let changed = tx.execute(&sql, params_refs.as_slice())?;
            if changed == 0 {
                return Err(AppError::not_found("Funcionário não encontrado"));
            }
            Ok(true)
        })
    }

    pub fn list_employees(&self, active_only: bool) -> AppResult<Vec<Employee>> {
        self.read(|conn| {
            let sql = if active_only {
                "SELECT id, name, role, phone, salary, active, created_at, updated_at
                 FROM employees WHERE active = 1 ORDER BY name"
            } else {
                "SELECT id, name, role, phone, salary, active, created_at, updated_at
                 FROM employees ORDER BY active DESC, name"
            };
            let mut stmt = conn.prepare(sql)?;
            let employees = stmt
                .query_map([], row_to_employee)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(employees)
        })
    }

    /// Os pagamentos de folha do funcionário são removidos junto
    pub fn delete_employee(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM employees WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Funcionário não encontrado"));
            }
            Ok(())
        })
    }

    pub fn add_payroll(&self, entry: &PayrollEntry) -> AppResult<i64> {
        if !entry.amount.is_finite() || entry.amount <= 0.0 {
            return Err(AppError::validation("Valor deve ser maior que zero"));
        }
        let month = entry.reference_month.trim();
        if !is_reference_month(month) {
            return Err(AppError::validation("Mês de referência inválido (use AAAA-MM)"));
        }
        let payment_date = entry
            .payment_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string());

        self.write(|tx| {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM employees WHERE id = ?1",
                    rusqlite::params![entry.employee_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Err(AppError::not_found("Funcionário não encontrado"));
            }

            tx.execute(
                "INSERT INTO payroll (employee_id, amount, reference_month, payment_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![entry.employee_id, entry.amount, month, payment_date, entry.notes.trim()],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Com nome e cargo do funcionário; `month` filtra pelo mês de referência
    pub fn list_payroll(&self, month: Option<&str>) -> AppResult<Vec<PayrollEntry>> {
        self.read(|conn| {
            let mut sql = String::from(
                "SELECT p.id, p.employee_id, p.amount, p.reference_month, p.payment_date, p.notes,
                 e.name, e.role, p.created_at
                 FROM payroll p
                 JOIN employees e ON p.employee_id = e.id
                 WHERE 1=1",
            );
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
            if let Some(m) = month.map(str::trim).filter(|m| !m.is_empty()) {
                sql.push_str(" AND p.reference_month = ?");
                params.push(Box::new(m.to_string()));
            }
            sql.push_str(" ORDER BY p.reference_month DESC, p.payment_date DESC, p.id DESC");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params_refs.as_slice(), |row| {
                    Ok(PayrollEntry {
                        id: Some(row.get(0)?),
                        employee_id: row.get(1)?,
                        amount: row.get(2)?,
                        reference_month: row.get(3)?,
                        payment_date: row.get(4)?,
                        notes: row.get(5)?,
                        employee_name: row.get(6)?,
                        employee_role: row.get(7)?,
                        created_at: row.get(8)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    pub fn delete_payroll(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM payroll WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Pagamento de folha não encontrado"));
            }
            Ok(())
        })
    }

    pub fn payroll_summary(&self) -> AppResult<PayrollSummary> {
        self.read(|conn| {
            let (active_employees, expected_monthly): (i64, f64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(salary), 0) FROM employees WHERE active = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let month_total: f64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM payroll
                 WHERE reference_month = strftime('%Y-%m', 'now', 'localtime')",
                [],
                |row| row.get(0),
            )?;
            let total_paid: f64 = conn.query_row("SELECT COALESCE(SUM(amount), 0) FROM payroll", [], |row| row.get(0))?;

            Ok(PayrollSummary {
                active_employees,
                expected_monthly,
                month_total,
                total_paid,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, salary: f64) -> Employee {
        Employee {
            id: None,
            name: name.to_string(),
            role: "Instalador".to_string(),
            phone: String::new(),
            salary,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn entry(employee_id: i64, amount: f64, month: &str) -> PayrollEntry {
        PayrollEntry {
            id: None,
            employee_id,
            amount,
            reference_month: month.to_string(),
            payment_date: None,
            notes: String::new(),
            employee_name: None,
            employee_role: None,
            created_at: None,
        }
    }

    #[test]
    fn test_mes_de_referencia() {
        assert!(is_reference_month("2026-10"));
        assert!(!is_reference_month("2026-13"));
        assert!(!is_reference_month("10/2026"));
        assert!(!is_reference_month("2026-1"));
    }

    #[test]
    fn test_resumo_da_folha() {
        let db = Database::open_in_memory().unwrap();
        let jose = db.create_employee(&employee("José", 2500.0)).unwrap();
        let ana = db.create_employee(&employee("Ana", 3000.0)).unwrap();
        db.update_employee(ana, &EmployeeUpdate { active: Some(false), ..Default::default() })
            .unwrap();

        let this_month = chrono::Local::now().format("%Y-%m").to_string();
        db.add_payroll(&entry(jose, 2500.0, &this_month)).unwrap();
        db.add_payroll(&entry(ana, 1000.0, "2020-01")).unwrap();

        let summary = db.payroll_summary().unwrap();
        assert_eq!(summary.active_employees, 1);
        assert_eq!(summary.expected_monthly, 2500.0);
        assert_eq!(summary.month_total, 2500.0);
        assert_eq!(summary.total_paid, 3500.0);

        assert_eq!(db.list_employees(true).unwrap().len(), 1);
        assert_eq!(db.list_employees(false).unwrap().len(), 2);
    }

    #[test]
    fn test_listagem_com_funcionario() {
        let db = Database::open_in_memory().unwrap();
        let jose = db.create_employee(&employee("José", 2500.0)).unwrap();
        let id = db.add_payroll(&entry(jose, 800.0, "2026-09")).unwrap();
        db.add_payroll(&entry(jose, 900.0, "2026-10")).unwrap();

        let september = db.list_payroll(Some("2026-09")).unwrap();
        assert_eq!(september.len(), 1);
        assert_eq!(september[0].employee_name.as_deref(), Some("José"));
        assert_eq!(september[0].employee_role.as_deref(), Some("Instalador"));
        assert_eq!(db.list_payroll(None).unwrap()[0].reference_month, "2026-10");

        db.delete_payroll(id).unwrap();
        db.delete_employee(jose).unwrap();
        assert!(db.list_payroll(None).unwrap().is_empty());
    }

    #[test]
    fn test_validacoes_da_folha() {
        let db = Database::open_in_memory().unwrap();
        let jose = db.create_employee(&employee("José", 2500.0)).unwrap();
        assert!(db.add_payroll(&entry(jose, 0.0, "2026-10")).is_err());
        assert!(db.add_payroll(&entry(jose, 10.0, "outubro")).is_err());
        assert!(matches!(
            db.add_payroll(&entry(999, 10.0, "2026-10")),
            Err(AppError::NotFound(_))
        ));
    }
}

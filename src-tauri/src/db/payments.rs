use super::{now_string, quotes::find_quote, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Payment, PaymentSummary};
use rusqlite::OptionalExtension;
use std::collections::BTreeMap;

impl Database {
    pub fn add_payment(&self, payment: &Payment) -> AppResult<i64> {
        if !payment.amount.is_finite() || payment.amount <= 0.0 {
            return Err(AppError::validation("Valor do pagamento deve ser maior que zero"));
        }

        let payment_date = payment
            .payment_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .unwrap_or_else(now_string);

        self.write(|tx| {
            if find_quote(tx, payment.quote_id)?.is_none() {
                return Err(AppError::not_found("Orçamento não encontrado"));
            }

            tx.execute(
                "INSERT INTO payments (quote_id, amount, payment_method, notes, payment_date)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    payment.quote_id,
                    payment.amount,
                    payment.payment_method.trim(),
                    payment.notes.trim(),
                    payment_date,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn list_payments(&self, quote_id: i64) -> AppResult<Vec<Payment>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, quote_id, amount, payment_method, notes, payment_date, created_at
                 FROM payments WHERE quote_id = ?1
                 ORDER BY payment_date DESC, id DESC",
            )?;
            let payments = stmt
                .query_map(rusqlite::params![quote_id], |row| {
                    Ok(Payment {
                        id: Some(row.get(0)?),
                        quote_id: row.get(1)?,
                        amount: row.get(2)?,
                        payment_method: row.get(3)?,
                        notes: row.get(4)?,
                        payment_date: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(payments)
        })
    }

    pub fn delete_payment(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM payments WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Pagamento não encontrado"));
            }
            Ok(())
        })
    }

    /// Orçamento inexistente conta como total zero
    pub fn payment_summary(&self, quote_id: i64) -> AppResult<PaymentSummary> {
        self.read(|conn| {
            let total: f64 = conn
                .query_row(
                    "SELECT total FROM quotes WHERE id = ?1",
                    rusqlite::params![quote_id],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0.0);
            let paid: f64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE quote_id = ?1",
                rusqlite::params![quote_id],
                |row| row.get(0),
            )?;
            Ok(PaymentSummary::new(total, paid))
        })
    }

    /// Resumo de todos os orçamentos em uma consulta
    pub fn all_payment_summaries(&self) -> AppResult<BTreeMap<i64, PaymentSummary>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT q.id, q.total, COALESCE(SUM(p.amount), 0)
                 FROM quotes q
                 LEFT JOIN payments p ON q.id = p.quote_id
                 GROUP BY q.id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows
                .into_iter()
                .map(|(id, total, paid)| (id, PaymentSummary::new(total, paid)))
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::products::tests::product;
    use crate::db::quotes::tests::{item, new_quote};

    fn payment(quote_id: i64, amount: f64) -> Payment {
        Payment {
            id: None,
            quote_id,
            amount,
            payment_method: "PIX".to_string(),
            notes: String::new(),
            payment_date: None,
            created_at: None,
        }
    }

    #[test]
    fn test_saldo_e_quitacao() {
        let db = Database::open_in_memory().unwrap();
        let calha = db.create_product(&product("Calha", 30.0, 12.0)).unwrap();
        let quote_id = db.create_quote(&new_quote("Paulo")).unwrap();
        db.add_quote_item(quote_id, &item(calha, 10.0)).unwrap();

        db.add_payment(&payment(quote_id, 100.0)).unwrap();
        let summary = db.payment_summary(quote_id).unwrap();
        assert_eq!(summary.total, 300.0);
        assert_eq!(summary.total_paid, 100.0);
        assert_eq!(summary.balance, 200.0);
        assert!(!summary.is_paid);

        let second = db.add_payment(&payment(quote_id, 250.0)).unwrap();
        let summary = db.payment_summary(quote_id).unwrap();
        assert_eq!(summary.balance, 0.0);
        assert!(summary.is_paid);

        let all = db.all_payment_summaries().unwrap();
        assert_eq!(all[&quote_id].total_paid, 350.0);

        db.delete_payment(second).unwrap();
        assert_eq!(db.list_payments(quote_id).unwrap().len(), 1);
    }

    #[test]
    fn test_validacoes_de_pagamento() {
        let db = Database::open_in_memory().unwrap();
        let quote_id = db.create_quote(&new_quote("Paulo")).unwrap();

        assert!(matches!(
            db.add_payment(&payment(quote_id, 0.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            db.add_payment(&payment(999, 10.0)),
            Err(AppError::NotFound(_))
        ));

        let mut with_date = payment(quote_id, 50.0);
        with_date.payment_date = Some("2026-03-10".into());
        db.add_payment(&with_date).unwrap();
        let list = db.list_payments(quote_id).unwrap();
        assert_eq!(list[0].payment_date.as_deref(), Some("2026-03-10"));
    }

    #[test]
    fn test_orcamento_sem_pagamentos() {
        let db = Database::open_in_memory().unwrap();
        let quote_id = db.create_quote(&new_quote("Paulo")).unwrap();
        let summary = db.payment_summary(quote_id).unwrap();
        // Total zero já conta como quitado
        assert!(summary.is_paid);
        assert_eq!(db.all_payment_summaries().unwrap().len(), 1);
    }
}

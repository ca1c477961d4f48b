use super::{now_string, quotes::find_quote, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Installation, InstallationStatus, QuoteStatus};
use rusqlite::{OptionalExtension, Row};

const INSTALLATION_COLUMNS: &str =
    "id, quote_id, client_name, address, scheduled_date, status, notes, created_at, updated_at";

fn row_to_installation(row: &Row) -> rusqlite::Result<Installation> {
    Ok(Installation {
        id: Some(row.get(0)?),
        quote_id: row.get(1)?,
        client_name: row.get(2)?,
        address: row.get(3)?,
        scheduled_date: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    /// Agenda a instalação de um orçamento aprovado ou concluído,
    /// copiando cliente e endereço.
    pub fn create_installation(&self, quote_id: i64, scheduled_date: &str, notes: &str) -> AppResult<i64> {
        if scheduled_date.trim().is_empty() {
            return Err(AppError::validation("Data da instalação é obrigatória"));
        }

        self.write(|tx| {
            let quote = find_quote(tx, quote_id)?
                .ok_or_else(|| AppError::not_found("Orçamento não encontrado"))?;
            if !quote.status.is_closed_deal() {
                return Err(AppError::Domain("Orçamento precisa estar aprovado".to_string()));
            }

            tx.execute(
                "INSERT INTO installations (quote_id, client_name, address, scheduled_date, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    quote_id,
                    quote.client_name,
                    quote.client_address,
                    scheduled_date.trim(),
                    notes.trim(),
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Ordenadas pela data agendada
    pub fn list_installations(&self, status_filter: Option<InstallationStatus>) -> AppResult<Vec<Installation>> {
        self.read(|conn| {
            let mut sql = format!("SELECT {} FROM installations WHERE 1=1", INSTALLATION_COLUMNS);
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if let Some(status) = status_filter {
                sql.push_str(" AND status = ?");
                params.push(Box::new(status));
            }
            sql.push_str(" ORDER BY scheduled_date ASC, id ASC");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let installations = stmt
                .query_map(params_refs.as_slice(), row_to_installation)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(installations)
        })
    }

    /// Concluir a instalação conclui também o orçamento
    pub fn update_installation_status(&self, id: i64, status: InstallationStatus) -> AppResult<()> {
        self.write(|tx| {
            let quote_id: i64 = tx
                .query_row(
                    "SELECT quote_id FROM installations WHERE id = ?1",
                    rusqlite::params![id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| AppError::not_found("Instalação não encontrada"))?;

            let now = now_string();
            tx.execute(
                "UPDATE installations SET status = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![status, now, id],
            )?;

            if status == InstallationStatus::Completed {
                tx.execute(
                    "UPDATE quotes SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![QuoteStatus::Completed, now, quote_id],
                )?;
            }
            Ok(())
        })
    }

    pub fn delete_installation(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM installations WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Instalação não encontrada"));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::quotes::tests::new_quote;

    #[test]
    fn test_exige_orcamento_aprovado() {
        let db = Database::open_in_memory().unwrap();
        let quote_id = db.create_quote(&new_quote("Marcos")).unwrap();

        let err = db.create_installation(quote_id, "2026-11-05", "").unwrap_err();
        assert!(matches!(err, AppError::Domain(_)));
        assert_eq!(err.to_string(), "Orçamento precisa estar aprovado");

        let err = db.create_installation(999, "2026-11-05", "").unwrap_err();
        assert_eq!(err.to_string(), "Orçamento não encontrado");
    }

    #[test]
    fn test_conclusao_conclui_orcamento() {
        let db = Database::open_in_memory().unwrap();
        let quote_id = db.create_quote(&new_quote("Marcos")).unwrap();
        db.approve_quote(quote_id).unwrap();

        let id = db.create_installation(quote_id, "2026-11-05", "Levar escada").unwrap();
        let list = db.list_installations(None).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].client_name, "Marcos");
        assert_eq!(list[0].address, "Rua das Flores, 10");
        assert_eq!(list[0].status, InstallationStatus::Pending);

        db.update_installation_status(id, InstallationStatus::InProgress).unwrap();
        assert_eq!(db.get_quote(quote_id).unwrap().quote.status, QuoteStatus::Approved);

        db.update_installation_status(id, InstallationStatus::Completed).unwrap();
        assert_eq!(db.get_quote(quote_id).unwrap().quote.status, QuoteStatus::Completed);
        assert_eq!(
            db.list_installations(Some(InstallationStatus::Completed)).unwrap().len(),
            1
        );
        assert!(db.list_installations(Some(InstallationStatus::Pending)).unwrap().is_empty());
    }

    #[test]
    fn test_ordem_por_data_e_exclusao() {
        let db = Database::open_in_memory().unwrap();
        let quote_id = db.create_quote(&new_quote("Marcos")).unwrap();
        db.update_quote_status(quote_id, QuoteStatus::Completed).unwrap();

        db.create_installation(quote_id, "2026-12-01", "").unwrap();
        let first = db.create_installation(quote_id, "2026-11-01", "").unwrap();

        let list = db.list_installations(None).unwrap();
        assert_eq!(list[0].id, Some(first));

        db.delete_installation(first).unwrap();
        assert_eq!(db.list_installations(None).unwrap().len(), 1);
        assert!(db.delete_installation(first).is_err());
    }
}

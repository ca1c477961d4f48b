use super::{now_string, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Settings, SettingsUpdate, DEFAULT_DOBRA_VALUE};
use rusqlite::{Connection, OptionalExtension};

pub(crate) fn read_settings(conn: &Connection) -> AppResult<Settings> {
    let settings = conn
        .query_row(
            "SELECT company_name, company_phone, company_email, company_address, company_cnpj,
             company_logo IS NOT NULL AND length(company_logo) > 0,
             dobra_value, backup_path, drive_folder_link, updated_at
             FROM settings WHERE id = 1",
            [],
            |row| {
                Ok(Settings {
                    company_name: row.get(0)?,
                    company_phone: row.get(1)?,
                    company_email: row.get(2)?,
                    company_address: row.get(3)?,
                    company_cnpj: row.get(4)?,
                    has_logo: row.get(5)?,
                    dobra_value: row.get::<_, Option<f64>>(6)?.unwrap_or(DEFAULT_DOBRA_VALUE),
                    backup_path: row.get(7)?,
                    drive_folder_link: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            },
        )
        .optional()?;

    Ok(settings.unwrap_or_default())
}

pub(crate) fn dobra_value(conn: &Connection) -> AppResult<f64> {
    let value: Option<f64> = conn
        .query_row("SELECT dobra_value FROM settings WHERE id = 1", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(value.unwrap_or(DEFAULT_DOBRA_VALUE))
}

/// Aplica os campos preenchidos. Texto vazio em `backup_path` ou
/// `drive_folder_link` limpa o valor.
pub(crate) fn apply_settings_update(conn: &Connection, update: &SettingsUpdate) -> AppResult<bool> {
    let mut sets: Vec<&str> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(ref v) = update.company_name {
        let name = v.trim();
        if name.is_empty() {
            return Err(AppError::validation("Nome da empresa é obrigatório"));
        }
        sets.push("company_name = ?");
        params.push(Box::new(name.to_string()));
    }
    if let Some(ref v) = update.company_phone {
        sets.push("company_phone = ?");
        params.push(Box::new(v.trim().to_string()));
    }
    if let Some(ref v) = update.company_email {
        sets.push("company_email = ?");
        params.push(Box::new(v.trim().to_string()));
    }
    if let Some(ref v) = update.company_address {
        sets.push("company_address = ?");
        params.push(Box::new(v.trim().to_string()));
    }
    if let Some(ref v) = update.company_cnpj {
        sets.push("company_cnpj = ?");
        params.push(Box::new(v.trim().to_string()));
    }
    if let Some(v) = update.dobra_value {
        if !v.is_finite() || v < 0.0 {
            return Err(AppError::validation("Valor da dobra não pode ser negativo"));
        }
        sets.push("dobra_value = ?");
        params.push(Box::new(v));
    }
    if let Some(ref v) = update.backup_path {
        sets.push("backup_path = ?");
        params.push(Box::new(non_empty(v)));
    }
    if let Some(ref v) = update.drive_folder_link {
        sets.push("drive_folder_link = ?");
        params.push(Box::new(non_empty(v)));
    }

    if sets.is_empty() {
        return Ok(false);
    }

    sets.push("updated_at = ?");
    params.push(Box::new(now_string()));

    let sql = format!("UPDATE settings SET {} WHERE id = 1", sets.join(", "));
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, params_refs.as_slice())?;

    Ok(changed > 0)
}

fn non_empty(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

impl Database {
    pub fn get_settings(&self) -> AppResult<Settings> {
        self.read(read_settings)
    }

    pub fn update_settings(&self, update: &SettingsUpdate) -> AppResult<bool> {
        self.write(|tx| apply_settings_update(tx, update))
    }

    pub fn get_dobra_value(&self) -> AppResult<f64> {
        self.read(dobra_value)
    }

    pub fn set_company_logo(&self, bytes: &[u8]) -> AppResult<()> {
        if bytes.is_empty() {
            return Err(AppError::validation("Imagem vazia"));
        }
        self.write(|tx| {
            tx.execute(
                "UPDATE settings SET company_logo = ?1, updated_at = ?2 WHERE id = 1",
                rusqlite::params![bytes, now_string()],
            )?;
            Ok(())
        })
    }

    pub fn clear_company_logo(&self) -> AppResult<()> {
        self.write(|tx| {
            tx.execute(
                "UPDATE settings SET company_logo = NULL, updated_at = ?1 WHERE id = 1",
                rusqlite::params![now_string()],
            )?;
            Ok(())
        })
    }

    pub fn company_logo(&self) -> AppResult<Option<Vec<u8>>> {
        self.read(|conn| {
            let logo: Option<Vec<u8>> = conn
                .query_row("SELECT company_logo FROM settings WHERE id = 1", [], |row| row.get(0))
                .optional()?
                .flatten();
            Ok(logo.filter(|b| !b.is_empty()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padroes() {
        let db = Database::open_in_memory().unwrap();
        let s = db.get_settings().unwrap();
        assert_eq!(s.company_name, "CalhaGest");
        assert_eq!(s.dobra_value, 5.0);
        assert!(!s.has_logo);
        assert!(s.backup_path.is_none());
        assert_eq!(db.get_dobra_value().unwrap(), 5.0);
    }

    #[test]
    fn test_atualizacao_parcial() {
        let db = Database::open_in_memory().unwrap();
        let changed = db
            .update_settings(&SettingsUpdate {
                company_name: Some("Calhas Silva".into()),
                dobra_value: Some(7.5),
                backup_path: Some("/tmp/backup".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(changed);

        let s = db.get_settings().unwrap();
        assert_eq!(s.company_name, "Calhas Silva");
        assert_eq!(s.dobra_value, 7.5);
        assert_eq!(s.backup_path.as_deref(), Some("/tmp/backup"));
        assert_eq!(s.company_phone, "");

        db.update_settings(&SettingsUpdate {
            backup_path: Some("  ".into()),
            ..Default::default()
        })
        .unwrap();
        assert!(db.get_settings().unwrap().backup_path.is_none());
    }

    #[test]
    fn test_sem_campos_nao_altera() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.update_settings(&SettingsUpdate::default()).unwrap());
    }

    #[test]
    fn test_validacoes() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_settings(&SettingsUpdate {
                dobra_value: Some(-1.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = db
            .update_settings(&SettingsUpdate {
                company_name: Some(" ".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_logo() {
        let db = Database::open_in_memory().unwrap();
        db.set_company_logo(&[0x89, b'P', b'N', b'G']).unwrap();
        assert!(db.get_settings().unwrap().has_logo);
        assert_eq!(db.company_logo().unwrap().unwrap().len(), 4);

        db.clear_company_logo().unwrap();
        assert!(db.company_logo().unwrap().is_none());
    }
}

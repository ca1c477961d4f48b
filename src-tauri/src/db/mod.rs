pub mod analytics;
pub mod expenses;
pub mod installations;
pub mod inventory;
pub mod payments;
pub mod payroll;
pub mod products;
pub mod quotes;
pub mod schema;
pub mod settings;

use crate::config::AppConfig;
use crate::error::AppResult;
use rusqlite::{Connection, Transaction};
use std::sync::{Mutex, MutexGuard};

pub struct Database {
    pub conn: Mutex<Connection>,
    pub config: AppConfig,
}

impl Database {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(&config.db_path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database {
            conn: Mutex::new(conn),
            config,
        };

        db.run_migrations()?;
        log::info!("Banco de dados aberto em {}", db.config.db_path.display());

        Ok(db)
    }

    /// Banco em memória sem backup automático
    pub fn open_in_memory() -> AppResult<Self> {
        let config = AppConfig::in_dir(std::env::temp_dir().join("calhagest"));
        Self::in_memory_with(config)
    }

    pub fn in_memory_with(config: AppConfig) -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Database {
            conn: Mutex::new(conn),
            config,
        };
        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> AppResult<()> {
        let conn = self.lock()?;
        schema::create_tables(&conn)?;

        // Migrações incrementais (.ok() ignora coluna já existente)
        conn.execute("ALTER TABLE settings ADD COLUMN dobra_value REAL NOT NULL DEFAULT 5.0", [])
            .ok();
        conn.execute("ALTER TABLE settings ADD COLUMN backup_path TEXT", []).ok();
        conn.execute("ALTER TABLE settings ADD COLUMN drive_folder_link TEXT", [])
            .ok();
        conn.execute("ALTER TABLE products ADD COLUMN has_dobra INTEGER NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute("ALTER TABLE products ADD COLUMN width REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute("ALTER TABLE products ADD COLUMN length REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute(
            "ALTER TABLE products ADD COLUMN pricing_unit TEXT NOT NULL DEFAULT 'metro'",
            [],
        )
        .ok();
        conn.execute(
            "ALTER TABLE products ADD COLUMN is_installed INTEGER NOT NULL DEFAULT 1",
            [],
        )
        .ok();
        conn.execute("ALTER TABLE quotes ADD COLUMN payment_methods TEXT NOT NULL DEFAULT ''", [])
            .ok();
        conn.execute("ALTER TABLE quotes ADD COLUMN discount_total REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute(
            "ALTER TABLE quotes ADD COLUMN discount_type TEXT NOT NULL DEFAULT 'percentage'",
            [],
        )
        .ok();
        conn.execute(
            "ALTER TABLE quotes ADD COLUMN quote_type TEXT NOT NULL DEFAULT 'instalacao'",
            [],
        )
        .ok();
        conn.execute("ALTER TABLE quote_items ADD COLUMN discount REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute("ALTER TABLE quote_items ADD COLUMN width REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute("ALTER TABLE quote_items ADD COLUMN length REAL NOT NULL DEFAULT 0", [])
            .ok();
        conn.execute(
            "ALTER TABLE quote_items ADD COLUMN pricing_unit TEXT NOT NULL DEFAULT 'metro'",
            [],
        )
        .ok();

        schema::seed_product_types(&conn)?;

        Ok(())
    }

    pub fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }

    /// Consulta somente leitura
    pub fn read<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Executa `f` em uma transação. Após o commit (e com o lock liberado)
    /// dispara o backup automático, que nunca falha a operação.
    pub fn write<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction) -> AppResult<T>,
    {
        let value = {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            value
        };

        if self.config.auto_backup {
            crate::backup::trigger_backup(self);
        }

        Ok(value)
    }
}

/// Data/hora local no formato gravado pelo SQLite
pub fn now_string() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// `%termo%` para filtros LIKE
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migracoes_idempotentes() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().unwrap();

        let tipos: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM product_types", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(tipos, 3);

        let settings: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(settings, 1);
    }

    #[test]
    fn test_write_desfaz_em_erro() {
        let db = Database::open_in_memory().unwrap();

        let result: AppResult<()> = db.write(|tx| {
            tx.execute("INSERT INTO inventory (name) VALUES ('Chapa')", [])?;
            Err(crate::error::AppError::validation("falha"))
        });
        assert!(result.is_err());

        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM inventory", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_banco_em_arquivo() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::in_dir(dir.path());
        let path = config.db_path.clone();

        let db = Database::new(config).unwrap();
        db.write(|tx| {
            tx.execute("INSERT INTO inventory (name, quantity) VALUES ('Rebite', 10)", [])?;
            Ok(())
        })
        .unwrap();
        drop(db);

        let db = Database::new(AppConfig::in_dir(dir.path())).unwrap();
        let qty: f64 = db
            .read(|conn| Ok(conn.query_row("SELECT quantity FROM inventory", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(qty, 10.0);
        assert!(path.exists());
    }
}

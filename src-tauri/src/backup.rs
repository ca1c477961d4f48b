use crate::db::{now_string, settings::apply_settings_update, Database};
use crate::error::{AppError, AppResult};
use crate::models::SettingsUpdate;
use base64::Engine;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const BACKUP_FILENAME: &str = "calhagest_backup.json";

/// Ordem de inserção na restauração (pais antes dos filhos).
/// A limpeza percorre a lista ao contrário.
const TABLES: [&str; 11] = [
    "expenses",
    "employees",
    "product_types",
    "inventory",
    "products",
    "quotes",
    "installations",
    "quote_items",
    "product_materials",
    "payments",
    "payroll",
];

/// Pasta configurada em `settings.backup_path` ou a padrão em Documentos
pub fn backup_dir(db: &Database) -> AppResult<PathBuf> {
    let settings = db.get_settings()?;
    Ok(settings
        .backup_path
        .map(PathBuf::from)
        .unwrap_or_else(|| db.config.default_backup_dir.clone()))
}

/// Texto vazio volta para a pasta padrão
pub fn set_backup_dir(db: &Database, dir: &str) -> AppResult<PathBuf> {
    db.update_settings(&SettingsUpdate {
        backup_path: Some(dir.to_string()),
        ..Default::default()
    })?;
    backup_dir(db)
}

pub fn default_backup_path(db: &Database) -> AppResult<PathBuf> {
    Ok(backup_dir(db)?.join(BACKUP_FILENAME))
}

fn to_json(value: ValueRef) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => json!(i),
        ValueRef::Real(f) => json!(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

fn from_json(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// Linhas como objetos JSON coluna -> valor. O logo nunca entra no backup.
fn rows_as_json(conn: &Connection, sql: &str) -> AppResult<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::new();
        for (i, name) in columns.iter().enumerate() {
            if name == "company_logo" {
                continue;
            }
            record.insert(name.clone(), to_json(row.get_ref(i)?));
        }
        out.push(Value::Object(record));
    }
    Ok(out)
}

fn table_columns(conn: &Connection, table: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{}\")", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

pub fn export_all_data(db: &Database) -> AppResult<Value> {
    db.read(|conn| {
        let mut data = Map::new();
        data.insert(
            "meta".to_string(),
            json!({
                "app": "CalhaGest",
                "version": env!("CARGO_PKG_VERSION"),
                "exported_at": now_string(),
            }),
        );

        let settings = rows_as_json(conn, "SELECT * FROM settings WHERE id = 1")?;
        data.insert(
            "settings".to_string(),
            settings.into_iter().next().unwrap_or_else(|| json!({})),
        );

        for table in TABLES {
            let rows = rows_as_json(conn, &format!("SELECT * FROM {} ORDER BY id", table))?;
            data.insert(table.to_string(), Value::Array(rows));
        }
        Ok(Value::Object(data))
    })
}

/// Grava o JSON em arquivo temporário e renomeia por cima do anterior
pub fn save_backup(db: &Database) -> AppResult<PathBuf> {
    let data = export_all_data(db)?;
    let dir = backup_dir(db)?;
    fs::create_dir_all(&dir)?;

    let path = dir.join(BACKUP_FILENAME);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(&data)?)?;
    fs::rename(&tmp, &path)?;

    log::info!("Backup salvo em {}", path.display());
    Ok(path)
}

/// Backup automático: falhas só vão para o log
pub fn trigger_backup(db: &Database) {
    if let Err(e) = save_backup(db) {
        log::warn!("Falha no backup automático: {}", e);
    }
}

/// `None` quando o arquivo não existe
pub fn load_backup(db: &Database, path: Option<&Path>) -> AppResult<Option<Value>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_backup_path(db)?,
    };
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn restorable_settings(settings: &Map<String, Value>) -> SettingsUpdate {
    let text = |key: &str| settings.get(key).and_then(Value::as_str).map(String::from);
    SettingsUpdate {
        company_name: text("company_name").filter(|v| !v.trim().is_empty()),
        company_phone: text("company_phone"),
        company_email: text("company_email"),
        company_address: text("company_address"),
        company_cnpj: text("company_cnpj"),
        dobra_value: settings.get("dobra_value").and_then(Value::as_f64),
        backup_path: None,
        drive_folder_link: settings
            .get("drive_folder_link")
            .map(|v| v.as_str().unwrap_or_default().to_string()),
    }
}

fn insert_record(conn: &Connection, table: &str, columns: &[String], record: &Map<String, Value>) -> AppResult<bool> {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for column in columns {
        if let Some(v) = record.get(column) {
            names.push(format!("\"{}\"", column));
            values.push(from_json(v));
        }
    }
    if names.is_empty() {
        return Ok(false);
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        vec!["?"; names.len()].join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
    Ok(true)
}

fn restore_data(conn: &Connection, data: &Value) -> AppResult<BTreeMap<String, usize>> {
    let data = data
        .as_object()
        .ok_or_else(|| AppError::validation("Arquivo de backup inválido"))?;

    if let Some(settings) = data.get("settings").and_then(Value::as_object) {
        apply_settings_update(conn, &restorable_settings(settings))?;
    }

    // Tabelas ausentes no arquivo ficam intactas (backups antigos não trazem finanças)
    let present: Vec<(&str, &Vec<Value>)> = TABLES
        .iter()
        .filter_map(|table| data.get(*table).and_then(Value::as_array).map(|rows| (*table, rows)))
        .collect();

    for (table, _) in present.iter().rev() {
        conn.execute(&format!("DELETE FROM {}", table), [])?;
    }

    let mut summary = BTreeMap::new();
    for (table, rows) in present {
        let columns = table_columns(conn, table)?;
        let mut restored = 0;
        for record in rows.iter().filter_map(Value::as_object) {
            if insert_record(conn, table, &columns, record)? {
                restored += 1;
            }
        }
        summary.insert(table.to_string(), restored);
    }
    Ok(summary)
}

/// Substitui os dados pelo conteúdo do backup mantendo os ids originais.
/// Tudo em uma transação; qualquer erro desfaz a restauração.
pub fn restore_from_backup(db: &Database, path: Option<&Path>) -> AppResult<BTreeMap<String, usize>> {
    let data = load_backup(db, path)?.ok_or_else(|| AppError::not_found("Arquivo de backup não encontrado"))?;
    let summary = db.write(|tx| restore_data(tx, &data))?;

    let total: usize = summary.values().sum();
    log::info!("Backup restaurado: {} registros", total);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::inventory::tests::stock_item;
    use crate::db::products::tests::product;
    use crate::db::quotes::tests::{item, new_quote};
    use crate::models::{Employee, Expense, ExpenseCategory, MaterialUnit, Payment, PayrollEntry};

    fn populated(config: AppConfig) -> Database {
        let db = Database::in_memory_with(config).unwrap();
        db.update_settings(&SettingsUpdate {
            company_name: Some("Calhas Silva".into()),
            dobra_value: Some(7.5),
            ..Default::default()
        })
        .unwrap();

        let chapa = db.create_inventory_item(&stock_item("Chapa galvanizada", 50.0, 5.0)).unwrap();
        let calha = db.create_product(&product("Calha moldura", 45.0, 20.0)).unwrap();
        db.add_product_material(calha, chapa, 1.0, MaterialUnit::Metro).unwrap();

        let quote = db.create_quote(&new_quote("Dona Maria")).unwrap();
        db.add_quote_item(quote, &item(calha, 12.0)).unwrap();
        db.approve_quote(quote).unwrap();
        db.create_installation(quote, "2026-11-20", "").unwrap();
        db.add_payment(&Payment {
            id: None,
            quote_id: quote,
            amount: 200.0,
            payment_method: "PIX".into(),
            notes: String::new(),
            payment_date: None,
            created_at: None,
        })
        .unwrap();

        db.create_expense(&Expense {
            id: None,
            description: "Combustível".into(),
            category: ExpenseCategory::Transporte,
            amount: 80.0,
            expense_date: None,
            notes: String::new(),
            created_at: None,
            updated_at: None,
        })
        .unwrap();
        let employee = db
            .create_employee(&Employee {
                id: None,
                name: "Carlos".into(),
                role: "Instalador".into(),
                phone: String::new(),
                salary: 2200.0,
                active: true,
                created_at: None,
                updated_at: None,
            })
            .unwrap();
        db.add_payroll(&PayrollEntry {
            id: None,
            employee_id: employee,
            amount: 2200.0,
            reference_month: "2026-10".into(),
            payment_date: None,
            notes: String::new(),
            employee_name: None,
            employee_role: None,
            created_at: None,
        })
        .unwrap();
        db
    }

    #[test]
    fn test_exportacao_sem_logo() {
        let tmp = tempfile::tempdir().unwrap();
        let db = populated(AppConfig::in_dir(tmp.path()));
        db.set_company_logo(&[1, 2, 3]).unwrap();

        let data = export_all_data(&db).unwrap();
        assert_eq!(data["meta"]["app"], "CalhaGest");
        assert_eq!(data["settings"]["company_name"], "Calhas Silva");
        assert!(data["settings"].get("company_logo").is_none());
        assert_eq!(data["quotes"].as_array().unwrap().len(), 1);
        assert_eq!(data["product_types"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_ida_e_volta_preserva_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let source = populated(AppConfig::in_dir(tmp.path()));
        // Id fora da sequência para conferir a chave original
        source.delete_expense(1).unwrap();
        source
            .create_expense(&Expense {
                id: None,
                description: "Aluguel".into(),
                category: ExpenseCategory::Aluguel,
                amount: 900.0,
                expense_date: Some("2026-10-01".into()),
                notes: String::new(),
                created_at: None,
                updated_at: None,
            })
            .unwrap();

        let path = save_backup(&source).unwrap();
        assert_eq!(path, tmp.path().join("backup").join(BACKUP_FILENAME));
        assert!(!path.with_extension("json.tmp").exists());

        let target = Database::in_memory_with(AppConfig::in_dir(tmp.path())).unwrap();
        target.create_product(&product("Será apagado", 1.0, 1.0)).unwrap();

        let summary = restore_from_backup(&target, None).unwrap();
        assert_eq!(summary["quotes"], 1);
        assert_eq!(summary["quote_items"], 1);
        assert_eq!(summary["payroll"], 1);
        assert_eq!(summary["products"], 1);

        let before = export_all_data(&source).unwrap();
        let after = export_all_data(&target).unwrap();
        for table in TABLES {
            assert_eq!(before[table], after[table], "tabela {}", table);
        }
        assert_eq!(after["expenses"][0]["id"], 2);

        let settings = target.get_settings().unwrap();
        assert_eq!(settings.company_name, "Calhas Silva");
        assert_eq!(settings.dobra_value, 7.5);
    }

    #[test]
    fn test_arquivo_ausente() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::in_memory_with(AppConfig::in_dir(tmp.path())).unwrap();
        assert!(load_backup(&db, None).unwrap().is_none());
        assert!(matches!(
            restore_from_backup(&db, Some(&tmp.path().join("nada.json"))),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_backup_invalido_nao_altera_dados() {
        let tmp = tempfile::tempdir().unwrap();
        let db = populated(AppConfig::in_dir(tmp.path()));
        let path = tmp.path().join("quebrado.json");
        fs::write(&path, r#"{"products": [{"id": 1, "name": null}]}"#).unwrap();

        assert!(restore_from_backup(&db, Some(&path)).is_err());
        assert_eq!(db.list_quotes("", None).unwrap().len(), 1);
        assert_eq!(db.list_products("", "").unwrap().len(), 1);
    }

    #[test]
    fn test_backup_sem_financeiro_preserva_despesas() {
        let tmp = tempfile::tempdir().unwrap();
        let db = populated(AppConfig::in_dir(tmp.path()));

        // Formato antigo: só produtos, orçamentos, estoque e instalações
        let mut data = export_all_data(&db).unwrap();
        let obj = data.as_object_mut().unwrap();
        for table in ["expenses", "employees", "payroll", "payments"] {
            obj.remove(table);
        }
        obj["products"][0]["name"] = json!("Calha moldura antiga");
        let path = tmp.path().join("antigo.json");
        fs::write(&path, serde_json::to_string(&data).unwrap()).unwrap();

        let summary = restore_from_backup(&db, Some(&path)).unwrap();
        assert_eq!(summary["products"], 1);
        assert_eq!(summary["quotes"], 1);
        assert!(!summary.contains_key("expenses"));
        assert!(!summary.contains_key("employees"));

        assert_eq!(db.list_products("", "").unwrap()[0].name, "Calha moldura antiga");
        assert_eq!(db.list_expenses("", None).unwrap().len(), 1);
        assert_eq!(db.list_employees(false).unwrap().len(), 1);
        assert_eq!(db.list_payroll(None).unwrap().len(), 1);
    }

    #[test]
    fn test_backup_automatico_e_pasta_configurada() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = AppConfig::in_dir(tmp.path());
        config.auto_backup = true;
        let db = Database::in_memory_with(config).unwrap();

        db.create_product(&product("Rufo", 25.0, 10.0)).unwrap();
        let default_file = tmp.path().join("backup").join(BACKUP_FILENAME);
        assert!(default_file.exists());

        let custom = tmp.path().join("nuvem");
        let dir = set_backup_dir(&db, custom.to_str().unwrap()).unwrap();
        assert_eq!(dir, custom);
        assert!(custom.join(BACKUP_FILENAME).exists());

        let loaded = load_backup(&db, None).unwrap().unwrap();
        assert_eq!(loaded["products"][0]["name"], "Rufo");

        assert_eq!(set_backup_dir(&db, "").unwrap(), tmp.path().join("backup"));
    }
}

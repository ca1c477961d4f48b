use super::{like_pattern, now_string, Database};
use crate::error::{AppError, AppResult};
use crate::models::{InventoryItem, StockOperation};
use rusqlite::{OptionalExtension, Row};

const INVENTORY_COLUMNS: &str = "id, name, type, quantity, unit, min_stock, created_at, updated_at";

fn row_to_item(row: &Row) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        item_type: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        min_stock: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    pub fn create_inventory_item(&self, item: &InventoryItem) -> AppResult<i64> {
        if item.name.trim().is_empty() {
            return Err(AppError::validation("Nome do item é obrigatório"));
        }
        if item.quantity < 0.0 || item.min_stock < 0.0 {
            return Err(AppError::validation("Quantidades não podem ser negativas"));
        }

        self.write(|tx| {
            tx.execute(
                "INSERT INTO inventory (name, type, quantity, unit, min_stock)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    item.name.trim(),
                    item.item_type.trim(),
                    item.quantity,
                    if item.unit.trim().is_empty() { "unidades" } else { item.unit.trim() },
                    item.min_stock,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn list_inventory(&self, search: &str, type_filter: &str) -> AppResult<Vec<InventoryItem>> {
        self.read(|conn| {
            let mut sql = format!("SELECT {} FROM inventory WHERE 1=1", INVENTORY_COLUMNS);
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if !search.trim().is_empty() {
                sql.push_str(" AND name LIKE ?");
                params.push(Box::new(like_pattern(search)));
            }
            if !type_filter.trim().is_empty() {
                sql.push_str(" AND type = ?");
                params.push(Box::new(type_filter.trim().to_string()));
            }
            sql.push_str(" ORDER BY name");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map(params_refs.as_slice(), row_to_item)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
    }

    pub fn get_inventory_item(&self, id: i64) -> AppResult<InventoryItem> {
        self.read(|conn| {
            let sql = format!("SELECT {} FROM inventory WHERE id = ?1", INVENTORY_COLUMNS);
            conn.query_row(&sql, rusqlite::params![id], row_to_item)
                .optional()?
                .ok_or_else(|| AppError::not_found("Item de estoque não encontrado"))
        })
    }

    /// Itens abaixo do mínimo (mínimo zero não alerta)
    pub fn list_low_stock(&self) -> AppResult<Vec<InventoryItem>> {
        self.read(|conn| {
            let sql = format!(
                "SELECT {} FROM inventory WHERE min_stock > 0 AND quantity < min_stock ORDER BY quantity",
                INVENTORY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let items = stmt
                .query_map([], row_to_item)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
    }

    /// Ajuste manual; retorna a nova quantidade
    pub fn update_inventory_quantity(&self, id: i64, amount: f64, op: StockOperation) -> AppResult<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::validation("Quantidade não pode ser negativa"));
        }

        self.write(|tx| {
            let current: f64 = tx
                .query_row(
                    "SELECT quantity FROM inventory WHERE id = ?1",
                    rusqlite::params![id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| AppError::not_found("Item de estoque não encontrado"))?;

            let new_quantity = op.apply(current, amount);
            tx.execute(
                "UPDATE inventory SET quantity = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![new_quantity, now_string(), id],
            )?;
            Ok(new_quantity)
        })
    }

    pub fn update_inventory_item(&self, item: &InventoryItem) -> AppResult<()> {
        let id = item
            .id
            .ok_or_else(|| AppError::validation("ID requerido para atualizar"))?;
        if item.name.trim().is_empty() {
            return Err(AppError::validation("Nome do item é obrigatório"));
        }

        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE inventory SET name = ?1, type = ?2, unit = ?3, min_stock = ?4, updated_at = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    item.name.trim(),
                    item.item_type.trim(),
                    item.unit.trim(),
                    item.min_stock.max(0.0),
                    now_string(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(AppError::not_found("Item de estoque não encontrado"));
            }
            Ok(())
        })
    }

    pub fn delete_inventory_item(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM inventory WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Item de estoque não encontrado"));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn stock_item(name: &str, quantity: f64, min_stock: f64) -> InventoryItem {
        InventoryItem {
            id: None,
            name: name.to_string(),
            item_type: "chapa".to_string(),
            quantity,
            unit: "metros".to_string(),
            min_stock,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_ajustes_de_quantidade() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_inventory_item(&stock_item("Chapa", 10.0, 0.0)).unwrap();

        assert_eq!(db.update_inventory_quantity(id, 5.0, StockOperation::Add).unwrap(), 15.0);
        assert_eq!(db.update_inventory_quantity(id, 20.0, StockOperation::Remove).unwrap(), 0.0);
        assert_eq!(db.update_inventory_quantity(id, 8.0, StockOperation::Set).unwrap(), 8.0);
        assert_eq!(db.get_inventory_item(id).unwrap().quantity, 8.0);

        assert!(matches!(
            db.update_inventory_quantity(999, 1.0, StockOperation::Add),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_estoque_baixo() {
        let db = Database::open_in_memory().unwrap();
        db.create_inventory_item(&stock_item("Rebite", 2.0, 10.0)).unwrap();
        db.create_inventory_item(&stock_item("Silicone", 20.0, 10.0)).unwrap();
        db.create_inventory_item(&stock_item("Parafuso", 0.0, 0.0)).unwrap();

        let low = db.list_low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Rebite");
        assert!(low[0].is_low());
    }

    #[test]
    fn test_busca_e_edicao() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_inventory_item(&stock_item("Chapa galvanizada", 10.0, 0.0)).unwrap();
        db.create_inventory_item(&stock_item("Rebite pop", 100.0, 0.0)).unwrap();

        assert_eq!(db.list_inventory("galva", "").unwrap().len(), 1);
        assert_eq!(db.list_inventory("", "chapa").unwrap().len(), 2);

        let mut item = db.get_inventory_item(id).unwrap();
        item.min_stock = 3.0;
        item.unit = "m".into();
        db.update_inventory_item(&item).unwrap();
        let item = db.get_inventory_item(id).unwrap();
        assert_eq!(item.min_stock, 3.0);
        assert_eq!(item.quantity, 10.0);

        db.delete_inventory_item(id).unwrap();
        assert_eq!(db.list_inventory("", "").unwrap().len(), 1);
    }
}

use super::{like_pattern, now_string, Database};
use crate::error::{AppError, AppResult};
use crate::models::{MaterialUnit, Product, ProductMaterial, ProductType, ProductUpdate};
use rusqlite::{Connection, OptionalExtension, Row};

const PRODUCT_COLUMNS: &str = "id, name, type, measure, width, length, price_per_meter, cost,
     has_dobra, pricing_unit, is_installed, description, created_at, updated_at";

fn row_to_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        product_type: row.get(2)?,
        measure: row.get(3)?,
        width: row.get(4)?,
        length: row.get(5)?,
        price_per_meter: row.get(6)?,
        cost: row.get(7)?,
        has_dobra: row.get::<_, i32>(8)? != 0,
        pricing_unit: row.get(9)?,
        is_installed: row.get::<_, i32>(10)? != 0,
        description: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

pub(crate) fn find_product(conn: &Connection, id: i64) -> AppResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    Ok(conn
        .query_row(&sql, rusqlite::params![id], row_to_product)
        .optional()?)
}

fn validate_product(name: &str, price: f64, cost: f64) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Nome do produto é obrigatório"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation("Preço não pode ser negativo"));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(AppError::validation("Custo não pode ser negativo"));
    }
    Ok(())
}

impl Database {
    pub fn create_product(&self, product: &Product) -> AppResult<i64> {
        validate_product(&product.name, product.price_per_meter, product.cost)?;

        self.write(|tx| {
            tx.execute(
                "INSERT INTO products (name, type, measure, width, length, price_per_meter, cost,
                 has_dobra, pricing_unit, is_installed, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    product.name.trim(),
                    product.product_type.trim(),
                    product.measure,
                    product.width,
                    product.length,
                    product.price_per_meter,
                    product.cost,
                    product.has_dobra as i32,
                    product.pricing_unit,
                    product.is_installed as i32,
                    product.description,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Lista por nome; `search` filtra nome ou descrição, `type_filter` o tipo exato.
    pub fn list_products(&self, search: &str, type_filter: &str) -> AppResult<Vec<Product>> {
        self.read(|conn| {
            let mut sql = format!("SELECT {} FROM products WHERE 1=1", PRODUCT_COLUMNS);
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if !search.trim().is_empty() {
                sql.push_str(" AND (name LIKE ? OR description LIKE ?)");
                let pattern = like_pattern(search);
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
            if !type_filter.trim().is_empty() {
                sql.push_str(" AND type = ?");
                params.push(Box::new(type_filter.trim().to_string()));
            }
            sql.push_str(" ORDER BY name");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let products = stmt
                .query_map(params_refs.as_slice(), row_to_product)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(products)
        })
    }

    pub fn get_product(&self, id: i64) -> AppResult<Product> {
        self.read(|conn| find_product(conn, id))?
            .ok_or_else(|| AppError::not_found("Produto não encontrado"))
    }

    pub fn update_product(&self, id: i64, update: &ProductUpdate) -> AppResult<bool> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref v) = update.name {
            if v.trim().is_empty() {
                return Err(AppError::validation("Nome do produto é obrigatório"));
            }
            sets.push("name = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        if let Some(ref v) = update.product_type {
            sets.push("type = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        for (column, value) in [
            ("measure = ?", update.measure),
            ("width = ?", update.width),
            ("length = ?", update.length),
            ("price_per_meter = ?", update.price_per_meter),
            ("cost = ?", update.cost),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::validation("Valores do produto não podem ser negativos"));
                }
                sets.push(column);
                params.push(Box::new(v));
            }
        }
        if let Some(v) = update.has_dobra {
            sets.push("has_dobra = ?");
            params.push(Box::new(v as i32));
        }
        if let Some(v) = update.pricing_unit {
            sets.push("pricing_unit = ?");
            params.push(Box::new(v));
        }
        if let Some(v) = update.is_installed {
            sets.push("is_installed = ?");
            params.push(Box::new(v as i32));
        }
        if let Some(ref v) = update.description {
            sets.push("description = ?");
            params.push(Box::new(v.clone()));
        }

        if sets.is_empty() {
            return Ok(false);
        }

        sets.push("updated_at = ?");
        params.push(Box::new(now_string()));
        params.push(Box::new(id));

        let sql = format!("UPDATE products SET {} WHERE id = ?", sets.join(", "));

        self.write(|tx| {
            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let changed = tx.execute(&sql, params_refs.as_slice())?;
            if changed == 0 {
                return Err(AppError::not_found("Produto não encontrado"));
            }
            Ok(true)
        })
    }

    /// Itens de orçamento que usavam o produto mantêm a cópia do nome
    pub fn delete_product(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM products WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Produto não encontrado"));
            }
            Ok(())
        })
    }

    // ---- Tipos de produto ----

    pub fn list_product_types(&self) -> AppResult<Vec<ProductType>> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT id, key, label, created_at FROM product_types ORDER BY label")?;
            let types = stmt
                .query_map([], |row| {
                    Ok(ProductType {
                        id: Some(row.get(0)?),
                        key: row.get(1)?,
                        label: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(types)
        })
    }

    /// A chave é gravada em minúsculas e sem espaços nas pontas
    pub fn create_product_type(&self, key: &str, label: &str) -> AppResult<i64> {
        let key = key.trim().to_lowercase();
        let label = label.trim();
        if key.is_empty() || label.is_empty() {
            return Err(AppError::validation("Chave e nome do tipo são obrigatórios"));
        }

        self.write(|tx| {
            let exists: Option<i64> = tx
                .query_row(
                    "SELECT id FROM product_types WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Err(AppError::validation(format!("Tipo '{}' já existe", key)));
            }

            tx.execute(
                "INSERT INTO product_types (key, label) VALUES (?1, ?2)",
                rusqlite::params![key, label],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn delete_product_type(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM product_types WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Tipo de produto não encontrado"));
            }
            Ok(())
        })
    }

    // ---- Materiais do produto ----

    pub fn list_product_materials(&self, product_id: i64) -> AppResult<Vec<ProductMaterial>> {
        self.read(|conn| product_materials(conn, product_id))
    }

    pub fn add_product_material(
        &self,
        product_id: i64,
        inventory_id: i64,
        quantity_per_unit: f64,
        unit_type: MaterialUnit,
    ) -> AppResult<i64> {
        if !quantity_per_unit.is_finite() || quantity_per_unit <= 0.0 {
            return Err(AppError::validation("Quantidade por unidade deve ser maior que zero"));
        }

        self.write(|tx| {
            if find_product(tx, product_id)?.is_none() {
                return Err(AppError::not_found("Produto não encontrado"));
            }
            let inventory: Option<i64> = tx
                .query_row(
                    "SELECT id FROM inventory WHERE id = ?1",
                    rusqlite::params![inventory_id],
                    |row| row.get(0),
                )
                .optional()?;
            if inventory.is_none() {
                return Err(AppError::not_found("Item de estoque não encontrado"));
            }

            tx.execute(
                "INSERT INTO product_materials (product_id, inventory_id, quantity_per_unit, unit_type)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![product_id, inventory_id, quantity_per_unit, unit_type],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn remove_product_material(&self, material_id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute(
                "DELETE FROM product_materials WHERE id = ?1",
                rusqlite::params![material_id],
            )?;
            if changed == 0 {
                return Err(AppError::not_found("Material não encontrado"));
            }
            Ok(())
        })
    }
}

/// Materiais do produto com nome, unidade e saldo do estoque
pub(crate) fn product_materials(conn: &Connection, product_id: i64) -> AppResult<Vec<ProductMaterial>> {
    let mut stmt = conn.prepare(
        "SELECT pm.id, pm.product_id, pm.inventory_id, pm.quantity_per_unit, pm.unit_type,
         i.name, i.unit, i.quantity
         FROM product_materials pm
         JOIN inventory i ON pm.inventory_id = i.id
         WHERE pm.product_id = ?1
         ORDER BY pm.id",
    )?;

    let materials = stmt
        .query_map(rusqlite::params![product_id], |row| {
            Ok(ProductMaterial {
                id: Some(row.get(0)?),
                product_id: row.get(1)?,
                inventory_id: row.get(2)?,
                quantity_per_unit: row.get(3)?,
                unit_type: row.get(4)?,
                inventory_name: row.get(5)?,
                inventory_unit: row.get(6)?,
                inventory_quantity: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(materials)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::PricingUnit;

    pub(crate) fn product(name: &str, price: f64, cost: f64) -> Product {
        Product {
            id: None,
            name: name.to_string(),
            product_type: "calha".to_string(),
            measure: 0.3,
            width: 30.0,
            length: 0.0,
            price_per_meter: price,
            cost,
            has_dobra: false,
            pricing_unit: PricingUnit::Metro,
            is_installed: true,
            description: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_crud_produto() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_product(&product("Calha 30cm", 45.0, 20.0)).unwrap();

        let p = db.get_product(id).unwrap();
        assert_eq!(p.name, "Calha 30cm");
        assert_eq!(p.pricing_unit, PricingUnit::Metro);
        assert!(p.is_installed);

        db.update_product(
            id,
            &ProductUpdate {
                price_per_meter: Some(50.0),
                has_dobra: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        let p = db.get_product(id).unwrap();
        assert_eq!(p.price_per_meter, 50.0);
        assert!(p.has_dobra);
        assert_eq!(p.cost, 20.0);

        db.delete_product(id).unwrap();
        assert!(matches!(db.get_product(id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_filtros_da_listagem() {
        let db = Database::open_in_memory().unwrap();
        db.create_product(&product("Calha moldura", 45.0, 20.0)).unwrap();
        let mut rufo = product("Rufo pingadeira", 30.0, 12.0);
        rufo.product_type = "rufo".into();
        db.create_product(&rufo).unwrap();

        assert_eq!(db.list_products("", "").unwrap().len(), 2);
        assert_eq!(db.list_products("moldura", "").unwrap().len(), 1);
        let rufos = db.list_products("", "rufo").unwrap();
        assert_eq!(rufos.len(), 1);
        assert_eq!(rufos[0].name, "Rufo pingadeira");
    }

    #[test]
    fn test_produto_invalido() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.create_product(&product("  ", 10.0, 1.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            db.create_product(&product("Calha", -1.0, 1.0)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            db.update_product(999, &ProductUpdate { cost: Some(1.0), ..Default::default() }),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_tipos_de_produto() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_product_type("  Condutor ", "Condutor").unwrap();
        let tipos = db.list_product_types().unwrap();
        assert_eq!(tipos.len(), 4);
        assert!(tipos.iter().any(|t| t.key == "condutor"));

        assert!(db.create_product_type("CONDUTOR", "Outro").is_err());

        db.delete_product_type(id).unwrap();
        assert_eq!(db.list_product_types().unwrap().len(), 3);
    }

    #[test]
    fn test_materiais_do_produto() {
        let db = Database::open_in_memory().unwrap();
        let product_id = db.create_product(&product("Calha", 45.0, 20.0)).unwrap();
        let inv_id = db
            .write(|tx| {
                tx.execute("INSERT INTO inventory (name, quantity, unit) VALUES ('Chapa', 50, 'metros')", [])?;
                Ok(tx.last_insert_rowid())
            })
            .unwrap();

        let material_id = db
            .add_product_material(product_id, inv_id, 1.0, MaterialUnit::Metro)
            .unwrap();
        let materials = db.list_product_materials(product_id).unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].inventory_name.as_deref(), Some("Chapa"));
        assert_eq!(materials[0].inventory_quantity, Some(50.0));

        assert!(db.add_product_material(product_id, 999, 1.0, MaterialUnit::Cm).is_err());
        assert!(db.add_product_material(product_id, inv_id, 0.0, MaterialUnit::Cm).is_err());

        db.remove_product_material(material_id).unwrap();
        assert!(db.list_product_materials(product_id).unwrap().is_empty());
    }

    #[test]
    fn test_excluir_produto_remove_materiais() {
        let db = Database::open_in_memory().unwrap();
        let product_id = db.create_product(&product("Calha", 45.0, 20.0)).unwrap();
        let inv_id = db
            .write(|tx| {
                tx.execute("INSERT INTO inventory (name, quantity) VALUES ('Suporte', 100)", [])?;
                Ok(tx.last_insert_rowid())
            })
            .unwrap();
        db.add_product_material(product_id, inv_id, 2.0, MaterialUnit::Unidade).unwrap();

        db.delete_product(product_id).unwrap();
        let count: i64 = db
            .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM product_materials", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }
}

use super::{like_pattern, now_string, products::find_product, settings::dobra_value, Database};
use crate::error::{AppError, AppResult};
use crate::models::{
    DiscountType, MaterialUnit, NewQuote, NewQuoteItem, Quote, QuoteItem, QuoteItemUpdate,
    QuoteStatus, QuoteTotals, QuoteUpdate, QuoteWithItems,
};
use crate::pricing;
use rusqlite::{Connection, OptionalExtension, Row};

pub(crate) const QUOTE_COLUMNS: &str = "id, client_name, client_phone, client_address, total, cost_total,
     profit, profitability, status, technical_notes, contract_terms, payment_methods, scheduled_date,
     discount_total, discount_type, quote_type, created_at, updated_at";

pub(crate) fn row_to_quote(row: &Row) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: Some(row.get(0)?),
        client_name: row.get(1)?,
        client_phone: row.get(2)?,
        client_address: row.get(3)?,
        total: row.get(4)?,
        cost_total: row.get(5)?,
        profit: row.get(6)?,
        profitability: row.get(7)?,
        status: row.get(8)?,
        technical_notes: row.get(9)?,
        contract_terms: row.get(10)?,
        payment_methods: row.get(11)?,
        scheduled_date: row.get(12)?,
        discount_total: row.get(13)?,
        discount_type: row.get(14)?,
        quote_type: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

const ITEM_COLUMNS: &str = "id, quote_id, product_id, product_name, measure, width, length, pricing_unit,
     meters, price_per_meter, cost_per_meter, discount, total, cost_total, created_at";

fn row_to_item(row: &Row) -> rusqlite::Result<QuoteItem> {
    Ok(QuoteItem {
        id: Some(row.get(0)?),
        quote_id: row.get(1)?,
        product_id: row.get(2)?,
        product_name: row.get(3)?,
        measure: row.get(4)?,
        width: row.get(5)?,
        length: row.get(6)?,
        pricing_unit: row.get(7)?,
        meters: row.get(8)?,
        price_per_meter: row.get(9)?,
        cost_per_meter: row.get(10)?,
        discount: row.get(11)?,
        total: row.get(12)?,
        cost_total: row.get(13)?,
        created_at: row.get(14)?,
    })
}

pub(crate) fn find_quote(conn: &Connection, id: i64) -> AppResult<Option<Quote>> {
    let sql = format!("SELECT {} FROM quotes WHERE id = ?1", QUOTE_COLUMNS);
    Ok(conn.query_row(&sql, rusqlite::params![id], row_to_quote).optional()?)
}

fn require_quote(conn: &Connection, id: i64) -> AppResult<Quote> {
    find_quote(conn, id)?.ok_or_else(|| AppError::not_found("Orçamento não encontrado"))
}

pub(crate) fn quote_items(conn: &Connection, quote_id: i64) -> AppResult<Vec<QuoteItem>> {
    let sql = format!("SELECT {} FROM quote_items WHERE quote_id = ?1 ORDER BY id", ITEM_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(rusqlite::params![quote_id], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Recalcula e grava total, custo, lucro e rentabilidade a partir dos itens.
pub(crate) fn recalculate_totals(conn: &Connection, quote_id: i64) -> AppResult<QuoteTotals> {
    let (discount_value, discount_type): (f64, DiscountType) = conn
        .query_row(
            "SELECT discount_total, discount_type FROM quotes WHERE id = ?1",
            rusqlite::params![quote_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or_else(|| AppError::not_found("Orçamento não encontrado"))?;

    let mut stmt = conn.prepare("SELECT total, cost_total FROM quote_items WHERE quote_id = ?1")?;
    let lines = stmt
        .query_map(rusqlite::params![quote_id], |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let totals = pricing::compute_quote_totals(lines, discount_value, discount_type);

    conn.execute(
        "UPDATE quotes SET total = ?1, cost_total = ?2, profit = ?3, profitability = ?4, updated_at = ?5
         WHERE id = ?6",
        rusqlite::params![
            totals.total,
            totals.cost_total,
            totals.profit,
            totals.profitability,
            now_string(),
            quote_id,
        ],
    )?;

    Ok(totals)
}

fn validate_quantity(meters: f64) -> AppResult<()> {
    if !meters.is_finite() || meters <= 0.0 {
        return Err(AppError::validation("Quantidade deve ser maior que zero"));
    }
    Ok(())
}

fn validate_item_discount(discount: f64) -> AppResult<()> {
    if !discount.is_finite() || discount < 0.0 {
        return Err(AppError::validation("Desconto do item não pode ser negativo"));
    }
    Ok(())
}

fn insert_item(conn: &Connection, quote_id: i64, item: &NewQuoteItem) -> AppResult<i64> {
    let product = find_product(conn, item.product_id)?
        .ok_or_else(|| AppError::not_found("Produto não encontrado"))?;
    require_quote(conn, quote_id)?;

    let price = pricing::unit_price(
        product.price_per_meter,
        item.custom_price,
        product.has_dobra,
        product.pricing_unit,
        dobra_value(conn)?,
    );
    let amounts = pricing::item_amounts(item.meters, price, product.cost, item.discount);

    conn.execute(
        "INSERT INTO quote_items (quote_id, product_id, product_name, measure, width, length,
         pricing_unit, meters, price_per_meter, cost_per_meter, discount, total, cost_total)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            quote_id,
            product.id,
            product.name,
            product.measure,
            product.width,
            product.length,
            product.pricing_unit,
            item.meters,
            price,
            product.cost,
            item.discount,
            amounts.total,
            amounts.cost_total,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Baixa os materiais de cada item no estoque. Nunca bloqueia: o saldo
/// fica em zero e a falta vira aviso.
pub(crate) fn deduct_stock(conn: &Connection, quote_id: i64) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT qi.meters, pm.inventory_id, pm.quantity_per_unit, pm.unit_type
         FROM quote_items qi
         JOIN product_materials pm ON pm.product_id = qi.product_id
         WHERE qi.quote_id = ?1
         ORDER BY qi.id, pm.id",
    )?;
    let consumptions = stmt
        .query_map(rusqlite::params![quote_id], |row| {
            Ok((
                row.get::<_, f64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, MaterialUnit>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut warnings = Vec::new();
    let now = now_string();

    for (meters, inventory_id, rate, unit) in consumptions {
        let deduct = pricing::material_deduction(meters, rate, unit);

        // Saldo lido a cada material: o mesmo item pode aparecer mais de uma vez
        let stock: Option<(String, f64)> = conn
            .query_row(
                "SELECT name, quantity FROM inventory WHERE id = ?1",
                rusqlite::params![inventory_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((name, available)) = stock else {
            continue;
        };

        if available < deduct {
            let warning = pricing::insufficient_stock_warning(&name, available, deduct);
            log::warn!("Orçamento {}: {}", quote_id, warning);
            warnings.push(warning);
        }

        conn.execute(
            "UPDATE inventory SET quantity = MAX(0, quantity - ?1), updated_at = ?2 WHERE id = ?3",
            rusqlite::params![deduct, now, inventory_id],
        )?;
    }

    Ok(warnings)
}

/// Grava o status. Ao entrar em "approved" vindo de outro status, baixa o estoque.
fn apply_status(conn: &Connection, quote: &Quote, status: QuoteStatus) -> AppResult<Vec<String>> {
    let id = quote.id.ok_or_else(|| AppError::not_found("Orçamento não encontrado"))?;
    conn.execute(
        "UPDATE quotes SET status = ?1, updated_at = ?2 WHERE id = ?3",
        rusqlite::params![status, now_string(), id],
    )?;

    if status == QuoteStatus::Approved && quote.status != QuoteStatus::Approved {
        return deduct_stock(conn, id);
    }
    Ok(Vec::new())
}

impl Database {
    pub fn create_quote(&self, quote: &NewQuote) -> AppResult<i64> {
        if quote.client_name.trim().is_empty() {
            return Err(AppError::validation("Nome do cliente é obrigatório"));
        }
        pricing::validate_discount(quote.discount_total, quote.discount_type).map_err(AppError::validation)?;

        self.write(|tx| {
            tx.execute(
                "INSERT INTO quotes (client_name, client_phone, client_address, technical_notes,
                 contract_terms, payment_methods, scheduled_date, discount_total, discount_type, quote_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    quote.client_name.trim(),
                    quote.client_phone.trim(),
                    quote.client_address.trim(),
                    quote.technical_notes,
                    quote.contract_terms,
                    quote.payment_methods,
                    quote.scheduled_date,
                    quote.discount_total,
                    quote.discount_type,
                    quote.quote_type,
                ],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Mais recentes primeiro; `search` procura no nome e no endereço do cliente
    pub fn list_quotes(&self, search: &str, status_filter: Option<QuoteStatus>) -> AppResult<Vec<Quote>> {
        self.read(|conn| {
            let mut sql = format!("SELECT {} FROM quotes WHERE 1=1", QUOTE_COLUMNS);
            let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

            if !search.trim().is_empty() {
                sql.push_str(" AND (client_name LIKE ? OR client_address LIKE ?)");
                let pattern = like_pattern(search);
                params.push(Box::new(pattern.clone()));
                params.push(Box::new(pattern));
            }
            if let Some(status) = status_filter {
                sql.push_str(" AND status = ?");
                params.push(Box::new(status));
            }
            sql.push_str(" ORDER BY created_at DESC, id DESC");

            let params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let mut stmt = conn.prepare(&sql)?;
            let quotes = stmt
                .query_map(params_refs.as_slice(), row_to_quote)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(quotes)
        })
    }

    pub fn get_quote(&self, id: i64) -> AppResult<QuoteWithItems> {
        self.read(|conn| {
            let quote = require_quote(conn, id)?;
            let items = quote_items(conn, id)?;
            Ok(QuoteWithItems { quote, items })
        })
    }

    /// Atualização parcial. Mudança de desconto recalcula os totais e a
    /// aprovação baixa o estoque; retorna os avisos de estoque.
    pub fn update_quote(&self, id: i64, update: &QuoteUpdate) -> AppResult<Vec<String>> {
        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref v) = update.client_name {
            if v.trim().is_empty() {
                return Err(AppError::validation("Nome do cliente é obrigatório"));
            }
            sets.push("client_name = ?");
            params.push(Box::new(v.trim().to_string()));
        }
        for (column, value) in [
            ("client_phone = ?", &update.client_phone),
            ("client_address = ?", &update.client_address),
            ("technical_notes = ?", &update.technical_notes),
            ("contract_terms = ?", &update.contract_terms),
            ("payment_methods = ?", &update.payment_methods),
        ] {
            if let Some(v) = value {
                sets.push(column);
                params.push(Box::new(v.trim().to_string()));
            }
        }
        if let Some(ref v) = update.scheduled_date {
            sets.push("scheduled_date = ?");
            params.push(Box::new(if v.trim().is_empty() { None } else { Some(v.trim().to_string()) }));
        }
        if let Some(v) = update.quote_type {
            sets.push("quote_type = ?");
            params.push(Box::new(v));
        }

        self.write(|tx| {
            let current = require_quote(tx, id)?;

            if update.touches_discount() {
                let value = update.discount_total.unwrap_or(current.discount_total);
                let kind = update.discount_type.unwrap_or(current.discount_type);
                pricing::validate_discount(value, kind).map_err(AppError::validation)?;
                tx.execute(
                    "UPDATE quotes SET discount_total = ?1, discount_type = ?2 WHERE id = ?3",
                    rusqlite::params![value, kind, id],
                )?;
                recalculate_totals(tx, id)?;
            }

            if !sets.is_empty() {
                let sql = format!("UPDATE quotes SET {}, updated_at = ? WHERE id = ?", sets.join(", "));
                let now = now_string();
                let mut params_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
                params_refs.push(&now);
                params_refs.push(&id);
                tx.execute(&sql, params_refs.as_slice())?;
            }

            match update.status {
                Some(status) if status != current.status => apply_status(tx, &current, status),
                _ => Ok(Vec::new()),
            }
        })
    }

    pub fn set_quote_discount(&self, id: i64, value: f64, discount_type: DiscountType) -> AppResult<QuoteTotals> {
        pricing::validate_discount(value, discount_type).map_err(AppError::validation)?;

        self.write(|tx| {
            let changed = tx.execute(
                "UPDATE quotes SET discount_total = ?1, discount_type = ?2 WHERE id = ?3",
                rusqlite::params![value, discount_type, id],
            )?;
            if changed == 0 {
                return Err(AppError::not_found("Orçamento não encontrado"));
            }
            recalculate_totals(tx, id)
        })
    }

    /// Qualquer status pode ser gravado; a aprovação retorna os avisos de estoque.
    pub fn update_quote_status(&self, id: i64, status: QuoteStatus) -> AppResult<Vec<String>> {
        self.write(|tx| {
            let current = require_quote(tx, id)?;
            if current.status == status {
                return Ok(Vec::new());
            }
            apply_status(tx, &current, status)
        })
    }

    pub fn approve_quote(&self, id: i64) -> AppResult<Vec<String>> {
        self.update_quote_status(id, QuoteStatus::Approved)
    }

    /// Avança um passo no fluxo; retorna o novo status e os avisos de estoque
    pub fn advance_quote_status(&self, id: i64) -> AppResult<(QuoteStatus, Vec<String>)> {
        self.write(|tx| {
            let current = require_quote(tx, id)?;
            let next = current
                .status
                .next()
                .ok_or_else(|| AppError::Domain("Orçamento já está concluído".to_string()))?;
            let warnings = apply_status(tx, &current, next)?;
            Ok((next, warnings))
        })
    }

    /// Itens, instalações e pagamentos vão junto (CASCADE)
    pub fn delete_quote(&self, id: i64) -> AppResult<()> {
        self.write(|tx| {
            let changed = tx.execute("DELETE FROM quotes WHERE id = ?1", rusqlite::params![id])?;
            if changed == 0 {
                return Err(AppError::not_found("Orçamento não encontrado"));
            }
            Ok(())
        })
    }

    pub fn recalculate_quote_totals(&self, quote_id: i64) -> AppResult<QuoteTotals> {
        self.write(|tx| recalculate_totals(tx, quote_id))
    }

    /// Inclui o item e recalcula os totais na mesma transação
    pub fn add_quote_item(&self, quote_id: i64, item: &NewQuoteItem) -> AppResult<i64> {
        validate_quantity(item.meters)?;
        validate_item_discount(item.discount)?;

        self.write(|tx| {
            let item_id = insert_item(tx, quote_id, item)?;
            recalculate_totals(tx, quote_id)?;
            Ok(item_id)
        })
    }

    /// `custom_price` aqui é o novo preço unitário final (a dobra já não é somada)
    pub fn update_quote_item(&self, item_id: i64, update: &QuoteItemUpdate) -> AppResult<QuoteItem> {
        if let Some(m) = update.meters {
            validate_quantity(m)?;
        }
        if let Some(d) = update.discount {
            validate_item_discount(d)?;
        }
        if let Some(p) = update.custom_price {
            if !p.is_finite() || p < 0.0 {
                return Err(AppError::validation("Preço não pode ser negativo"));
            }
        }

        self.write(|tx| {
            let sql = format!("SELECT {} FROM quote_items WHERE id = ?1", ITEM_COLUMNS);
            let item = tx
                .query_row(&sql, rusqlite::params![item_id], row_to_item)
                .optional()?
                .ok_or_else(|| AppError::not_found("Item não encontrado"))?;

            let meters = update.meters.unwrap_or(item.meters);
            let price = update.custom_price.unwrap_or(item.price_per_meter);
            let discount = update.discount.unwrap_or(item.discount);
            let amounts = pricing::item_amounts(meters, price, item.cost_per_meter, discount);

            tx.execute(
                "UPDATE quote_items SET meters = ?1, price_per_meter = ?2, discount = ?3, total = ?4, cost_total = ?5
                 WHERE id = ?6",
                rusqlite::params![meters, price, discount, amounts.total, amounts.cost_total, item_id],
            )?;
            recalculate_totals(tx, item.quote_id)?;

            Ok(QuoteItem {
                meters,
                price_per_meter: price,
                discount,
                total: amounts.total,
                cost_total: amounts.cost_total,
                ..item
            })
        })
    }

    pub fn remove_quote_item(&self, item_id: i64) -> AppResult<()> {
        self.write(|tx| {
            let quote_id: i64 = tx
                .query_row(
                    "SELECT quote_id FROM quote_items WHERE id = ?1",
                    rusqlite::params![item_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| AppError::not_found("Item não encontrado"))?;

            tx.execute("DELETE FROM quote_items WHERE id = ?1", rusqlite::params![item_id])?;
            recalculate_totals(tx, quote_id)?;
            Ok(())
        })
    }

    /// Baixa de estoque avulsa; normalmente chamada pela aprovação
    pub fn deduct_stock_for_quote(&self, quote_id: i64) -> AppResult<Vec<String>> {
        self.write(|tx| {
            require_quote(tx, quote_id)?;
            deduct_stock(tx, quote_id)
        })
    }
}

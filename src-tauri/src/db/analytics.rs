use super::{
    quotes::{row_to_quote, QUOTE_COLUMNS},
    Database,
};
use crate::error::AppResult;
use crate::models::{DashboardStats, MonthlyAnalytics, QuoteStatus, StatusCount};
use rusqlite::Connection;

/// Orçamentos que entram no faturamento
const CLOSED: &str = "status IN ('approved', 'completed')";

fn count(conn: &Connection, sql: &str) -> rusqlite::Result<i64> {
    conn.query_row(sql, [], |row| row.get(0))
}

fn sum(conn: &Connection, sql: &str) -> rusqlite::Result<f64> {
    conn.query_row(sql, [], |row| row.get(0))
}

impl Database {
    pub fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        self.read(|conn| {
            let recent_sql = format!(
                "SELECT {} FROM quotes ORDER BY created_at DESC, id DESC LIMIT 3",
                QUOTE_COLUMNS
            );
            let mut stmt = conn.prepare(&recent_sql)?;
            let recent_quotes = stmt
                .query_map([], row_to_quote)?
                .collect::<Result<Vec<_>, _>>()?;

            let pending: f64 = sum(
                conn,
                &format!(
                    "SELECT COALESCE(SUM(q.total), 0) - COALESCE((
                        SELECT SUM(p.amount) FROM payments p
                        WHERE p.quote_id IN (SELECT id FROM quotes WHERE {CLOSED})
                     ), 0)
                     FROM quotes q WHERE q.{CLOSED}"
                ),
            )?;

            Ok(DashboardStats {
                total_quotes: count(conn, "SELECT COUNT(*) FROM quotes")?,
                approved_quotes: count(conn, &format!("SELECT COUNT(*) FROM quotes WHERE {CLOSED}"))?,
                total_revenue: sum(conn, &format!("SELECT COALESCE(SUM(total), 0) FROM quotes WHERE {CLOSED}"))?,
                total_profit: sum(conn, &format!("SELECT COALESCE(SUM(profit), 0) FROM quotes WHERE {CLOSED}"))?,
                total_cost: sum(conn, &format!("SELECT COALESCE(SUM(cost_total), 0) FROM quotes WHERE {CLOSED}"))?,
                recent_quotes,
                pending_installations: count(conn, "SELECT COUNT(*) FROM installations WHERE status = 'pending'")?,
                low_stock_count: count(
                    conn,
                    "SELECT COUNT(*) FROM inventory WHERE quantity < min_stock AND min_stock > 0",
                )?,
                total_received: sum(conn, "SELECT COALESCE(SUM(amount), 0) FROM payments")?,
                total_pending: pending.max(0.0),
                paid_quotes: count(
                    conn,
                    &format!(
                        "SELECT COUNT(*) FROM quotes q
                         WHERE q.{CLOSED} AND q.total > 0
                         AND q.total <= (SELECT COALESCE(SUM(p.amount), 0) FROM payments p WHERE p.quote_id = q.id)"
                    ),
                )?,
            })
        })
    }

    /// Últimos 12 meses, do mais recente para o mais antigo. A contagem
    /// inclui todos os orçamentos; valores só os aprovados/concluídos.
    pub fn monthly_analytics(&self) -> AppResult<Vec<MonthlyAnalytics>> {
        self.read(|conn| {
            let sql = format!(
                "SELECT strftime('%Y-%m', created_at) AS month,
                 COUNT(*),
                 COALESCE(SUM(CASE WHEN {CLOSED} THEN total ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN {CLOSED} THEN cost_total ELSE 0 END), 0),
                 COALESCE(SUM(CASE WHEN {CLOSED} THEN profit ELSE 0 END), 0)
                 FROM quotes
                 WHERE created_at >= date('now', 'localtime', '-12 months')
                 GROUP BY month
                 ORDER BY month DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(MonthlyAnalytics {
                        month: row.get(0)?,
                        quote_count: row.get(1)?,
                        revenue: row.get(2)?,
                        cost: row.get(3)?,
                        profit: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Contagem por status, incluindo os que estão zerados
    pub fn quotes_by_status(&self) -> AppResult<Vec<StatusCount>> {
        self.read(|conn| {
            let mut stmt = conn.prepare("SELECT COUNT(*) FROM quotes WHERE status = ?1")?;
            QuoteStatus::ALL
                .iter()
                .map(|status| {
                    let count: i64 = stmt.query_row(rusqlite::params![status], |row| row.get(0))?;
                    Ok(StatusCount { status: *status, count })
                })
                .collect()
        })
    }
}

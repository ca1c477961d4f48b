use serde::{Deserialize, Serialize};

use super::{Quote, QuoteStatus};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DashboardStats {
    pub total_quotes: i64,
    /// Aprovados ou concluídos
    pub approved_quotes: i64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub total_cost: f64,
    pub recent_quotes: Vec<Quote>,
    pub pending_installations: i64,
    pub low_stock_count: i64,
    pub total_received: f64,
    pub total_pending: f64,
    pub paid_quotes: i64,
}

/// Linha mensal (`AAAA-MM`) da análise dos últimos 12 meses
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MonthlyAnalytics {
    pub month: String,
    pub quote_count: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusCount {
    pub status: QuoteStatus,
    pub count: i64,
}

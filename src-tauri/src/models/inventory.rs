use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InventoryItem {
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub min_stock: f64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn default_unit() -> String {
    "unidades".to_string()
}

impl InventoryItem {
    /// Estoque mínimo zero desliga o alerta
    pub fn is_low(&self) -> bool {
        self.min_stock > 0.0 && self.quantity < self.min_stock
    }
}

/// Operação de ajuste manual de estoque
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Add,
    Remove,
    Set,
}

text_enum!(StockOperation { Add => "add", Remove => "remove", Set => "set" });

impl StockOperation {
    /// Nova quantidade; remoção nunca fica abaixo de zero
    pub fn apply(&self, current: f64, amount: f64) -> f64 {
        match self {
            StockOperation::Add => current + amount,
            StockOperation::Remove => (current - amount).max(0.0),
            StockOperation::Set => amount,
        }
    }
}

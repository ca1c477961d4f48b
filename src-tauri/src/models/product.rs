use serde::{Deserialize, Serialize};

/// Como o produto é cobrado no orçamento
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PricingUnit {
    #[default]
    Metro,
    Unidade,
}

text_enum!(PricingUnit { Metro => "metro", Unidade => "unidade" });

impl PricingUnit {
    /// Sufixo usado na quantidade ("m" ou "un")
    pub fn short_label(&self) -> &'static str {
        match self {
            PricingUnit::Metro => "m",
            PricingUnit::Unidade => "un",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub measure: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub length: f64,
    pub price_per_meter: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub has_dobra: bool,
    #[serde(default)]
    pub pricing_unit: PricingUnit,
    #[serde(default = "default_true")]
    pub is_installed: bool,
    #[serde(default)]
    pub description: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Alteração parcial de produto; campos `None` não são tocados.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub measure: Option<f64>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub price_per_meter: Option<f64>,
    pub cost: Option<f64>,
    pub has_dobra: Option<bool>,
    pub pricing_unit: Option<PricingUnit>,
    pub is_installed: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductType {
    pub id: Option<i64>,
    pub key: String,
    pub label: String,
    pub created_at: Option<String>,
}

/// Unidade da taxa de consumo de um material
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaterialUnit {
    #[default]
    Metro,
    Cm,
    Unidade,
}

text_enum!(MaterialUnit { Metro => "metro", Cm => "cm", Unidade => "unidade" });

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductMaterial {
    pub id: Option<i64>,
    pub product_id: i64,
    pub inventory_id: i64,
    pub quantity_per_unit: f64,
    #[serde(default)]
    pub unit_type: MaterialUnit,
    /// Preenchidos na listagem (JOIN com estoque)
    pub inventory_name: Option<String>,
    pub inventory_unit: Option<String>,
    pub inventory_quantity: Option<f64>,
}

use serde::{Deserialize, Serialize};

use super::PricingUnit;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Completed,
}

text_enum!(QuoteStatus {
    Draft => "draft",
    Sent => "sent",
    Approved => "approved",
    Completed => "completed",
});

impl QuoteStatus {
    /// Próximo passo do fluxo rascunho → enviado → aprovado → concluído.
    /// O servidor não obriga a seguir essa ordem.
    pub fn next(&self) -> Option<QuoteStatus> {
        match self {
            QuoteStatus::Draft => Some(QuoteStatus::Sent),
            QuoteStatus::Sent => Some(QuoteStatus::Approved),
            QuoteStatus::Approved => Some(QuoteStatus::Completed),
            QuoteStatus::Completed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Rascunho",
            QuoteStatus::Sent => "Enviado",
            QuoteStatus::Approved => "Aprovado",
            QuoteStatus::Completed => "Concluído",
        }
    }

    /// Entra no faturamento
    pub fn is_closed_deal(&self) -> bool {
        matches!(self, QuoteStatus::Approved | QuoteStatus::Completed)
    }

    pub const ALL: [QuoteStatus; 4] = [
        QuoteStatus::Draft,
        QuoteStatus::Sent,
        QuoteStatus::Approved,
        QuoteStatus::Completed,
    ];
}

/// Desconto do orçamento: percentual sobre o subtotal ou valor fixo em R$
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[default]
    Percentage,
    Value,
}

text_enum!(DiscountType { Percentage => "percentage", Value => "value" });

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuoteType {
    #[default]
    Instalacao,
    Fornecimento,
}

text_enum!(QuoteType { Instalacao => "instalacao", Fornecimento => "fornecimento" });

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Quote {
    pub id: Option<i64>,
    pub client_name: String,
    pub client_phone: String,
    pub client_address: String,
    pub total: f64,
    pub cost_total: f64,
    pub profit: f64,
    pub profitability: f64,
    pub status: QuoteStatus,
    pub technical_notes: String,
    pub contract_terms: String,
    /// Formas de pagamento separadas por vírgula
    pub payment_methods: String,
    pub scheduled_date: Option<String>,
    /// Valor do desconto (percentual ou R$, conforme `discount_type`)
    pub discount_total: f64,
    pub discount_type: DiscountType,
    pub quote_type: QuoteType,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Quote {
    pub fn payment_method_list(&self) -> Vec<String> {
        self.payment_methods
            .split(',')
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteItem {
    pub id: Option<i64>,
    pub quote_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub measure: f64,
    pub width: f64,
    pub length: f64,
    pub pricing_unit: PricingUnit,
    /// Quantidade: metros ou unidades, conforme `pricing_unit`
    pub meters: f64,
    /// Preço unitário já com a dobra
    pub price_per_meter: f64,
    pub cost_per_meter: f64,
    /// Desconto do item em R$
    pub discount: f64,
    pub total: f64,
    pub cost_total: f64,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteWithItems {
    #[serde(flatten)]
    pub quote: Quote,
    pub items: Vec<QuoteItem>,
}

impl QuoteWithItems {
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|i| i.total).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NewQuote {
    pub client_name: String,
    pub client_phone: String,
    pub client_address: String,
    pub technical_notes: String,
    pub contract_terms: String,
    pub payment_methods: String,
    pub scheduled_date: Option<String>,
    pub discount_total: f64,
    pub discount_type: DiscountType,
    pub quote_type: QuoteType,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QuoteUpdate {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub client_address: Option<String>,
    pub status: Option<QuoteStatus>,
    pub technical_notes: Option<String>,
    pub contract_terms: Option<String>,
    pub payment_methods: Option<String>,
    pub scheduled_date: Option<String>,
    pub discount_total: Option<f64>,
    pub discount_type: Option<DiscountType>,
    pub quote_type: Option<QuoteType>,
}

impl QuoteUpdate {
    pub fn touches_discount(&self) -> bool {
        self.discount_total.is_some() || self.discount_type.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewQuoteItem {
    pub product_id: i64,
    pub meters: f64,
    /// Substitui o preço do produto quando maior que zero
    #[serde(default)]
    pub custom_price: Option<f64>,
    #[serde(default)]
    pub discount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QuoteItemUpdate {
    pub meters: Option<f64>,
    pub custom_price: Option<f64>,
    pub discount: Option<f64>,
}

/// Valores persistidos por `recalculate_quote_totals`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct QuoteTotals {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub total: f64,
    pub cost_total: f64,
    pub profit: f64,
    pub profitability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluxo_status() {
        assert_eq!(QuoteStatus::Draft.next(), Some(QuoteStatus::Sent));
        assert_eq!(QuoteStatus::Approved.next(), Some(QuoteStatus::Completed));
        assert_eq!(QuoteStatus::Completed.next(), None);
        assert!(QuoteStatus::Completed.is_closed_deal());
        assert!(!QuoteStatus::Sent.is_closed_deal());
    }

    #[test]
    fn test_texto_dos_enums() {
        assert_eq!("approved".parse::<QuoteStatus>().unwrap(), QuoteStatus::Approved);
        assert!("cancelado".parse::<QuoteStatus>().is_err());
        assert_eq!(DiscountType::Value.as_str(), "value");
        assert_eq!(
            serde_json::to_string(&QuoteType::Fornecimento).unwrap(),
            "\"fornecimento\""
        );
    }
}

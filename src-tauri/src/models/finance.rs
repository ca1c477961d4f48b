use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Payment {
    pub id: Option<i64>,
    pub quote_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub notes: String,
    /// Agora, quando omitida
    pub payment_date: Option<String>,
    pub created_at: Option<String>,
}

/// Situação financeira de um orçamento
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PaymentSummary {
    pub total: f64,
    pub total_paid: f64,
    /// Saldo devedor, nunca negativo
    pub balance: f64,
    pub is_paid: bool,
}

impl PaymentSummary {
    pub fn new(total: f64, total_paid: f64) -> Self {
        let balance = total - total_paid;
        PaymentSummary {
            total,
            total_paid,
            balance: balance.max(0.0),
            is_paid: balance <= 0.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    #[default]
    Geral,
    Equipamento,
    Material,
    Transporte,
    Aluguel,
    Manutencao,
    Outros,
}

text_enum!(ExpenseCategory {
    Geral => "geral",
    Equipamento => "equipamento",
    Material => "material",
    Transporte => "transporte",
    Aluguel => "aluguel",
    Manutencao => "manutencao",
    Outros => "outros",
});

impl ExpenseCategory {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseCategory::Geral => "Geral",
            ExpenseCategory::Equipamento => "Equipamento",
            ExpenseCategory::Material => "Material",
            ExpenseCategory::Transporte => "Transporte",
            ExpenseCategory::Aluguel => "Aluguel",
            ExpenseCategory::Manutencao => "Manutenção",
            ExpenseCategory::Outros => "Outros",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Expense {
    pub id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub amount: f64,
    /// Hoje, quando omitida
    pub expense_date: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<f64>,
    pub expense_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ExpenseSummary {
    pub total: f64,
    pub month_total: f64,
    pub by_category: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Employee {
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub salary: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub salary: Option<f64>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PayrollEntry {
    pub id: Option<i64>,
    pub employee_id: i64,
    pub amount: f64,
    /// `AAAA-MM`
    pub reference_month: String,
    pub payment_date: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// Preenchidos na listagem
    pub employee_name: Option<String>,
    pub employee_role: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PayrollSummary {
    pub active_employees: i64,
    /// Soma dos salários dos funcionários ativos
    pub expected_monthly: f64,
    pub month_total: f64,
    pub total_paid: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumo_pagamento() {
        let parcial = PaymentSummary::new(405.0, 200.0);
        assert_eq!(parcial.balance, 205.0);
        assert!(!parcial.is_paid);

        let excedente = PaymentSummary::new(100.0, 120.0);
        assert_eq!(excedente.balance, 0.0);
        assert!(excedente.is_paid);
    }

    #[test]
    fn test_categoria_padrao() {
        let json = r#"{"id": null, "description": "Combustível", "amount": 80.0,
                       "expense_date": null, "created_at": null, "updated_at": null}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.category, ExpenseCategory::Geral);
        assert_eq!(ExpenseCategory::Manutencao.label(), "Manutenção");
    }
}

//! Cálculos de orçamento e de baixa de estoque, sem acesso ao banco.

use crate::models::{DiscountType, MaterialUnit, PricingUnit, QuoteTotals};

/// Preço unitário de um item: preço informado (se > 0) ou do produto,
/// mais a dobra quando o produto tem dobra e é cobrado por metro.
pub fn unit_price(
    product_price: f64,
    custom_price: Option<f64>,
    has_dobra: bool,
    pricing_unit: PricingUnit,
    dobra_value: f64,
) -> f64 {
    let base = custom_price.filter(|p| *p > 0.0).unwrap_or(product_price);
    if has_dobra && pricing_unit == PricingUnit::Metro {
        base + dobra_value
    } else {
        base
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemAmounts {
    pub total: f64,
    pub cost_total: f64,
}

/// `total = quantidade * preço - desconto` (desconto em R$)
pub fn item_amounts(quantity: f64, unit_price: f64, unit_cost: f64, discount: f64) -> ItemAmounts {
    ItemAmounts {
        total: quantity * unit_price - discount,
        cost_total: quantity * unit_cost,
    }
}

pub fn discount_amount(subtotal: f64, value: f64, discount_type: DiscountType) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    match discount_type {
        DiscountType::Value => value,
        DiscountType::Percentage => subtotal * value / 100.0,
    }
}

/// Totais do orçamento a partir de `(total, custo)` de cada item
pub fn compute_quote_totals<I>(items: I, discount_value: f64, discount_type: DiscountType) -> QuoteTotals
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (subtotal, cost_total) = items
        .into_iter()
        .fold((0.0, 0.0), |(s, c), (total, cost)| (s + total, c + cost));

    let discount_amount = discount_amount(subtotal, discount_value, discount_type);
    let total = subtotal - discount_amount;
    let profit = total - cost_total;
    let profitability = if total > 0.0 { profit / total * 100.0 } else { 0.0 };

    QuoteTotals {
        subtotal,
        discount_amount,
        total,
        cost_total,
        profit,
        profitability,
    }
}

/// Validação do desconto do orçamento
pub fn validate_discount(value: f64, discount_type: DiscountType) -> Result<(), &'static str> {
    if !value.is_finite() || value < 0.0 {
        return Err("Desconto não pode ser negativo");
    }
    if discount_type == DiscountType::Percentage && value > 100.0 {
        return Err("Desconto percentual não pode passar de 100%");
    }
    Ok(())
}

/// Quanto um material consome para a quantidade do item
pub fn material_deduction(quantity: f64, rate: f64, unit: MaterialUnit) -> f64 {
    match unit {
        MaterialUnit::Metro => quantity * rate,
        MaterialUnit::Cm => quantity * 100.0 * rate,
        MaterialUnit::Unidade => rate,
    }
}

pub fn insufficient_stock_warning(name: &str, available: f64, needed: f64) -> String {
    format!(
        "Estoque insuficiente: {} (disponível: {:.1}, necessário: {:.1})",
        name, available, needed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desconto_percentual() {
        let totals = compute_quote_totals([(300.0, 120.0), (150.0, 60.0)], 10.0, DiscountType::Percentage);
        assert_eq!(totals.subtotal, 450.0);
        assert!((totals.discount_amount - 45.0).abs() < 1e-9);
        assert!((totals.total - 405.0).abs() < 1e-9);
        assert!((totals.profit - 225.0).abs() < 1e-9);
        assert!((totals.profitability - 225.0 / 405.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_desconto_fixo() {
        let totals = compute_quote_totals([(300.0, 100.0), (150.0, 50.0)], 50.0, DiscountType::Value);
        assert_eq!(totals.discount_amount, 50.0);
        assert_eq!(totals.total, 400.0);
        assert_eq!(totals.profit, 250.0);
    }

    #[test]
    fn test_sem_itens_rentabilidade_zero() {
        let totals = compute_quote_totals(Vec::<(f64, f64)>::new(), 10.0, DiscountType::Percentage);
        assert_eq!(totals.total, 0.0);
        assert_eq!(totals.profitability, 0.0);

        // Desconto fixo maior que o subtotal deixa total negativo, rentabilidade zero
        let totals = compute_quote_totals([(20.0, 5.0)], 30.0, DiscountType::Value);
        assert_eq!(totals.total, -10.0);
        assert_eq!(totals.profitability, 0.0);
    }

    #[test]
    fn test_desconto_nao_positivo_ignorado() {
        assert_eq!(discount_amount(100.0, 0.0, DiscountType::Value), 0.0);
        assert_eq!(discount_amount(100.0, -5.0, DiscountType::Percentage), 0.0);
    }

    #[test]
    fn test_preco_unitario_com_dobra() {
        assert_eq!(unit_price(40.0, None, true, PricingUnit::Metro, 5.0), 45.0);
        assert_eq!(unit_price(40.0, Some(50.0), true, PricingUnit::Metro, 5.0), 55.0);
        assert_eq!(unit_price(40.0, Some(0.0), false, PricingUnit::Metro, 5.0), 40.0);
        // Dobra não se aplica a produto por unidade
        assert_eq!(unit_price(12.0, None, true, PricingUnit::Unidade, 5.0), 12.0);
    }

    #[test]
    fn test_item_com_desconto_em_reais() {
        let amounts = item_amounts(10.0, 45.0, 20.0, 30.0);
        assert_eq!(amounts.total, 420.0);
        assert_eq!(amounts.cost_total, 200.0);
    }

    #[test]
    fn test_baixa_por_unidade_de_material() {
        assert_eq!(material_deduction(10.0, 0.5, MaterialUnit::Metro), 5.0);
        assert_eq!(material_deduction(2.0, 0.5, MaterialUnit::Cm), 100.0);
        assert_eq!(material_deduction(10.0, 4.0, MaterialUnit::Unidade), 4.0);
    }

    #[test]
    fn test_mensagem_estoque_insuficiente() {
        assert_eq!(
            insufficient_stock_warning("Chapa", 5.0, 8.0),
            "Estoque insuficiente: Chapa (disponível: 5.0, necessário: 8.0)"
        );
    }

    #[test]
    fn test_validacao_desconto() {
        assert!(validate_discount(10.0, DiscountType::Percentage).is_ok());
        assert!(validate_discount(150.0, DiscountType::Percentage).is_err());
        assert!(validate_discount(150.0, DiscountType::Value).is_ok());
        assert!(validate_discount(-1.0, DiscountType::Value).is_err());
    }
}

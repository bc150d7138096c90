use rust_decimal::Decimal;
use serde::Serialize;

use crate::orders::models::OrderItem;

/// Computed totals for one line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Computed totals for a whole order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
}

/// Pure totals math; persisted values are always derived through here,
/// never written by a client.
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Compute subtotal/tax/total for one line.
    ///
    /// Quantity may be negative for reversal (RETURN/VOID) lines, in which
    /// case subtotal and tax come out negated as well.
    pub fn line_item_totals(
        unit_price: Decimal,
        quantity: i32,
        tax_rate_percent: Decimal,
        discount_amount: Decimal,
    ) -> LineTotals {
        let subtotal = unit_price * Decimal::from(quantity);
        let tax_amount = subtotal * tax_rate_percent / Decimal::ONE_HUNDRED;
        let total_amount = subtotal + tax_amount - discount_amount;

        LineTotals {
            subtotal,
            tax_amount,
            total_amount,
        }
    }

    /// Aggregate order totals as field-wise sums over the current items.
    pub fn order_totals(items: &[OrderItem]) -> OrderTotals {
        let subtotal: Decimal = items.iter().map(|item| item.subtotal).sum();
        let tax_amount: Decimal = items.iter().map(|item| item.tax_amount).sum();
        let discount_amount: Decimal = items.iter().map(|item| item.discount_amount).sum();
        let total_amount = subtotal + tax_amount - discount_amount;

        OrderTotals {
            subtotal,
            tax_amount,
            discount_amount,
            total_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(unit_price: Decimal, quantity: i32, tax_rate: Decimal, discount: Decimal) -> OrderItem {
        let totals = TotalsCalculator::line_item_totals(unit_price, quantity, tax_rate, discount);
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            product_variant_id: Uuid::new_v4(),
            product_name: "Test Product".to_string(),
            variant_name: "Default".to_string(),
            sku: "SKU-1".to_string(),
            unit_price,
            quantity,
            tax_rate,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: discount,
            total_amount: totals.total_amount,
        }
    }

    #[test]
    fn test_line_totals_worked_example() {
        // unitPrice=10, quantity=3, taxRate=5, discount=2
        let totals = TotalsCalculator::line_item_totals(dec!(10), 3, dec!(5), dec!(2));
        assert_eq!(totals.subtotal, dec!(30));
        assert_eq!(totals.tax_amount, dec!(1.5));
        assert_eq!(totals.total_amount, dec!(29.5));
    }

    #[test]
    fn test_line_totals_zero_tax_zero_discount() {
        let totals = TotalsCalculator::line_item_totals(dec!(4.500), 2, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(totals.subtotal, dec!(9.000));
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec!(9.000));
    }

    #[test]
    fn test_line_totals_negative_quantity_negates_amounts() {
        let forward = TotalsCalculator::line_item_totals(dec!(10), 3, dec!(5), Decimal::ZERO);
        let reversal = TotalsCalculator::line_item_totals(dec!(10), -3, dec!(5), Decimal::ZERO);
        assert_eq!(reversal.subtotal, -forward.subtotal);
        assert_eq!(reversal.tax_amount, -forward.tax_amount);
        assert_eq!(reversal.total_amount, -forward.total_amount);
    }

    #[test]
    fn test_order_totals_sums_fields() {
        let items = vec![
            item(dec!(10), 3, dec!(5), dec!(2)),
            item(dec!(2.5), 4, Decimal::ZERO, Decimal::ZERO),
        ];
        let totals = TotalsCalculator::order_totals(&items);
        assert_eq!(totals.subtotal, dec!(40));
        assert_eq!(totals.tax_amount, dec!(1.5));
        assert_eq!(totals.discount_amount, dec!(2));
        assert_eq!(totals.total_amount, dec!(39.5));
    }

    #[test]
    fn test_order_totals_empty_order_is_zero() {
        let totals = TotalsCalculator::order_totals(&[]);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn arb_item() -> impl Strategy<Value = OrderItem> {
        (1u32..10_000, 1i32..100, 0u32..25, 0u32..500).prop_map(
            |(price_mils, quantity, tax_pct, discount_mils)| {
                let unit_price = Decimal::new(price_mils as i64, 3);
                let tax_rate = Decimal::from(tax_pct);
                let discount = Decimal::new(discount_mils as i64, 3);
                let totals =
                    TotalsCalculator::line_item_totals(unit_price, quantity, tax_rate, discount);
                OrderItem {
                    id: Uuid::new_v4(),
                    order_id: Uuid::new_v4(),
                    product_id: Uuid::new_v4(),
                    product_variant_id: Uuid::new_v4(),
                    product_name: "P".to_string(),
                    variant_name: "V".to_string(),
                    sku: "S".to_string(),
                    unit_price,
                    quantity,
                    tax_rate,
                    subtotal: totals.subtotal,
                    tax_amount: totals.tax_amount,
                    discount_amount: discount,
                    total_amount: totals.total_amount,
                }
            },
        )
    }

    /// The order total always equals the sum of its items' totals, for any
    /// sequence of items. This is the invariant the recompute-after-mutation
    /// rule exists to preserve.
    #[test]
    fn prop_order_total_equals_sum_of_item_totals() {
        proptest!(|(items in proptest::collection::vec(arb_item(), 0..12))| {
            let totals = TotalsCalculator::order_totals(&items);
            let item_sum: Decimal = items.iter().map(|i| i.total_amount).sum();
            prop_assert_eq!(totals.total_amount, item_sum);
        });
    }

    /// Negating a line's quantity negates subtotal and tax exactly
    /// (with zero discount), which is what reversal bills rely on.
    #[test]
    fn prop_reversal_lines_negate_exactly() {
        proptest!(|(price_mils in 1u32..10_000, quantity in 1i32..100, tax_pct in 0u32..25)| {
            let unit_price = Decimal::new(price_mils as i64, 3);
            let tax_rate = Decimal::from(tax_pct);
            let forward = TotalsCalculator::line_item_totals(
                unit_price, quantity, tax_rate, Decimal::ZERO);
            let reversal = TotalsCalculator::line_item_totals(
                unit_price, -quantity, tax_rate, Decimal::ZERO);
            prop_assert_eq!(reversal.subtotal, -forward.subtotal);
            prop_assert_eq!(reversal.tax_amount, -forward.tax_amount);
            prop_assert_eq!(reversal.total_amount, -forward.total_amount);
        });
    }

    #[test]
    fn prop_discount_only_reduces_total() {
        proptest!(|(price_mils in 1u32..10_000, quantity in 1i32..100, tax_pct in 0u32..25)| {
            let unit_price = Decimal::new(price_mils as i64, 3);
            let tax_rate = Decimal::from(tax_pct);
            let without = TotalsCalculator::line_item_totals(
                unit_price, quantity, tax_rate, Decimal::ZERO);
            let with = TotalsCalculator::line_item_totals(
                unit_price, quantity, tax_rate, dec!(0.100));
            prop_assert_eq!(with.subtotal, without.subtotal);
            prop_assert_eq!(with.tax_amount, without.tax_amount);
            prop_assert_eq!(with.total_amount, without.total_amount - dec!(0.100));
        });
    }
}

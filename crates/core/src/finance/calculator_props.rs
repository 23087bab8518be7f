//! Property-based tests for document totals.
//!
//! - Purchase order totals always satisfy
//!   `total = sub_total − discount + tax + shipping`
//! - The subtotal is the sum of the rounded line values
//! - A GRN never carries more discount than its share of the order

use proptest::prelude::*;
use rust_decimal::Decimal;
use stockyard_shared::types::{
    Currency, GrnId, GrnItemId, ProductId, PurchaseOrderId, PurchaseOrderItemId,
};

use super::calculator::FinancialCalculator;
use crate::purchasing::PurchaseOrderItem;
use crate::receiving::GrnItem;

/// Strategy to generate unit prices (0.01 to 1,000.00).
fn unit_price() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate tax rates (0.00 to 100.00).
fn tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|basis| Decimal::new(basis, 2))
}

/// Strategy to generate a line as (quantity, unit price, discount percent).
fn line() -> impl Strategy<Value = (i64, Decimal, u32)> {
    (1i64..500, unit_price(), 0u32..=100)
}

fn currency() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::Myr), Just(Currency::Usd), Just(Currency::Jpy)]
}

fn make_item((quantity, unit_price, pct): (i64, Decimal, u32), currency: Currency) -> PurchaseOrderItem {
    let gross = currency.round(Decimal::from(quantity) * unit_price);
    let discount = currency.round(gross * Decimal::from(pct) / Decimal::ONE_HUNDRED);
    PurchaseOrderItem {
        id: PurchaseOrderItemId::new(),
        purchase_order_id: PurchaseOrderId::new(),
        line_no: 1,
        product_id: ProductId::new(),
        quantity,
        unit_price,
        discount_amount: discount,
        total_price: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        notes: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* set of lines, rate and shipping the header identity holds
    /// exactly and no amount is negative.
    #[test]
    fn prop_purchase_order_total_identity(
        lines in prop::collection::vec(line(), 1..8),
        rate in tax_rate(),
        shipping_cents in 0i64..100_000,
        currency in currency(),
    ) {
        let items: Vec<_> = lines.into_iter().map(|l| make_item(l, currency)).collect();
        let shipping = currency.round(Decimal::new(shipping_cents, 2));
        let totals = FinancialCalculator::purchase_order_totals(&items, rate, shipping, currency).unwrap();

        prop_assert_eq!(
            totals.total_amount,
            totals.sub_total - totals.discount_amount + totals.tax_amount + shipping
        );
        prop_assert!(totals.discount_amount <= totals.sub_total);
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
        prop_assert_eq!(totals.tax_amount, currency.round(totals.tax_amount));
    }

    /// *For any* set of lines the subtotal equals the sum of
    /// `quantity × unit_price` per line, and the line totals add up to
    /// `sub_total − discount`.
    #[test]
    fn prop_sub_total_matches_lines(
        lines in prop::collection::vec(line(), 1..8),
        rate in tax_rate(),
    ) {
        let currency = Currency::Myr;
        let items: Vec<_> = lines.into_iter().map(|l| make_item(l, currency)).collect();
        let totals = FinancialCalculator::purchase_order_totals(&items, rate, Decimal::ZERO, currency).unwrap();

        let expected: Decimal = items
            .iter()
            .map(|i| currency.round(Decimal::from(i.quantity) * i.unit_price))
            .sum();
        let line_totals: Decimal = items
            .iter()
            .map(|i| {
                FinancialCalculator::purchase_order_line(i.quantity, i.unit_price, i.discount_amount, rate, currency)
                    .unwrap()
                    .total_price
            })
            .sum();

        prop_assert_eq!(totals.sub_total, expected);
        prop_assert_eq!(line_totals, totals.sub_total - totals.discount_amount);
    }

    /// *For any* partial delivery of a discounted order, the GRN's discount is
    /// between zero and the order discount, and its identity holds.
    #[test]
    fn prop_grn_discount_is_pro_rata(
        (ordered, delivered) in (1i64..500).prop_flat_map(|q| (Just(q), 0..=q)),
        price in unit_price(),
        pct in 0u32..=100,
        rate in tax_rate(),
    ) {
        let currency = Currency::Myr;
        let order_item = make_item((ordered, price, pct), currency);
        let order = FinancialCalculator::purchase_order_totals(&[order_item], rate, Decimal::ZERO, currency).unwrap();

        let grn_line = GrnItem {
            id: GrnItemId::new(),
            grn_id: GrnId::new(),
            line_no: 1,
            purchase_order_item_id: PurchaseOrderItemId::new(),
            product_id: ProductId::new(),
            ordered_quantity: ordered,
            received_quantity: delivered,
            accepted_quantity: delivered,
            rejected_quantity: 0,
            unit_price: price,
            total_price: FinancialCalculator::grn_line_total(delivered, price, currency).unwrap(),
            notes: None,
        };
        let grn = FinancialCalculator::grn_totals(
            &[grn_line],
            rate,
            order.sub_total,
            order.discount_amount,
            currency,
        )
        .unwrap();

        prop_assert!(grn.sub_total <= order.sub_total);
        prop_assert!(grn.discount_amount >= Decimal::ZERO);
        prop_assert!(grn.discount_amount <= order.discount_amount);
        prop_assert_eq!(grn.total_amount, grn.sub_total - grn.discount_amount + grn.tax_amount);
        if delivered == ordered {
            prop_assert_eq!(grn.discount_amount, order.discount_amount);
        }
    }
}

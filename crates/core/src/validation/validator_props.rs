//! Property-based tests for payload validation.
//!
//! - Non-positive purchase order quantities are always rejected
//! - GRN lines never inspect more than was received
//! - Tax rates are accepted exactly on 0..=100

use proptest::prelude::*;
use rust_decimal::Decimal;
use stockyard_shared::types::{ProductId, PurchaseOrderItemId};

use super::validator::ReconciliationValidator;
use crate::error::ProcurementError;
use crate::purchasing::PurchaseOrderItemInput;
use crate::receiving::GrnItemInput;

/// Strategy for prices from 0.00 to 10,000.00.
fn price() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for tax rates with two decimals, -50.00 to 150.00.
fn any_rate() -> impl Strategy<Value = Decimal> {
    (-5_000i64..15_000i64).prop_map(|basis| Decimal::new(basis, 2))
}

fn grn_line(received: i64, accepted: i64, rejected: i64) -> GrnItemInput {
    GrnItemInput {
        purchase_order_item_id: PurchaseOrderItemId::new(),
        received_quantity: received,
        accepted_quantity: accepted,
        rejected_quantity: rejected,
        unit_price: None,
        notes: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* quantity <= 0 the line is rejected with `InvalidQuantity`.
    #[test]
    fn prop_non_positive_quantity_rejected(quantity in -10_000i64..=0, unit_price in price()) {
        let input = PurchaseOrderItemInput {
            product_id: ProductId::new(),
            quantity,
            unit_price,
            discount_amount: Decimal::ZERO,
            notes: None,
        };
        let result = ReconciliationValidator::default().validate_purchase_order_item(&input);
        prop_assert!(matches!(result, Err(ProcurementError::InvalidQuantity(_))));
    }

    /// *For any* positive quantity and a discount within the line amount the
    /// line is accepted.
    #[test]
    fn prop_discount_within_line_accepted(
        quantity in 1i64..1_000,
        unit_price in price(),
        pct in 0u32..=100,
    ) {
        let gross = Decimal::from(quantity) * unit_price;
        let discount = (gross * Decimal::from(pct) / Decimal::ONE_HUNDRED).round_dp(2).min(gross);
        let input = PurchaseOrderItemInput {
            product_id: ProductId::new(),
            quantity,
            unit_price,
            discount_amount: discount,
            notes: None,
        };
        prop_assert!(ReconciliationValidator::default().validate_purchase_order_item(&input).is_ok());
    }

    /// *For any* non-negative quantities, the GRN line is accepted iff
    /// accepted + rejected <= received.
    #[test]
    fn prop_inspected_never_exceeds_received(
        received in 0i64..1_000,
        accepted in 0i64..1_000,
        rejected in 0i64..1_000,
    ) {
        let result = ReconciliationValidator::default()
            .validate_grn_item(&grn_line(received, accepted, rejected));
        if accepted + rejected <= received {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(ProcurementError::InvalidQuantity(_))));
        }
    }

    /// *For any* rate, the header is accepted iff 0 <= rate <= 100.
    #[test]
    fn prop_tax_rate_range(rate in any_rate()) {
        let input = crate::purchasing::PurchaseOrderInput {
            supplier_id: Some(stockyard_shared::types::SupplierId::new()),
            created_by_id: Some(stockyard_shared::types::UserId::new()),
            order_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
            tax_rate: Some(rate),
            ..Default::default()
        };
        let ok = ReconciliationValidator::default().validate_purchase_order(&input, false).is_ok();
        prop_assert_eq!(ok, rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED);
    }
}

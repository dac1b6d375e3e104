//! # Sale Pricing
//!
//! The pure half of the sale transaction: request validation, line pricing,
//! order totals and the loyalty rule. The database layer drives these steps
//! inside one transaction and supplies the live product rows.
//!
//! ## Workflow
//! ```text
//! SaleRequest (JSON)
//!      │
//!      ▼
//! SaleDraft::from_request      ← required fields, quantities, tax/discount ≥ 0
//!      │
//!      ▼  for each line, in input order (db crate, inside the transaction)
//! PricedLine::price(line, product)   ← stock check, unit price, subtotal
//!      │
//!      ▼
//! SaleTotals::compute          ← subtotal + tax − discount, never negative
//!      │
//!      ▼
//! SaleDraft::into_sale         ← the Sale row with its frozen lines
//!      │
//!      ▼
//! loyalty_points_for(total)    ← floor(total / 10 currency units)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::sale_number::SaleNumber;
use crate::types::{PaymentMethod, PaymentStatus, Product, Sale, SaleItem};
use crate::validation;

/// Currency units of spend per loyalty point.
const CENTS_PER_LOYALTY_POINT: i64 = 1_000;

// =============================================================================
// Request
// =============================================================================

/// Sale creation request as submitted by the client.
///
/// Every field is optional at the type level so that missing values surface
/// as validation errors with a useful message rather than as decode errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    #[serde(default, alias = "customerId")]
    pub customer: Option<String>,
    #[serde(default)]
    pub items: Vec<LineRequest>,
    pub staff_member: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub tax_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    /// Tax as a decimal amount (`5.25`). Exclusive with `taxCents`.
    pub tax: Option<f64>,
    /// Discount as a decimal amount. Exclusive with `discountCents`.
    pub discount: Option<f64>,
    pub notes: Option<String>,
    /// Pre-assigned number; skips the daily counter when present.
    pub sale_number: Option<String>,
    pub sale_date: Option<DateTime<Utc>>,
}

/// One requested line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    #[serde(default, alias = "product")]
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    /// Overrides the product's current price for this line only.
    pub unit_price_cents: Option<i64>,
    /// Decimal form of the override (`9.99`). Exclusive with `unitPriceCents`.
    pub unit_price: Option<f64>,
}

// =============================================================================
// Draft
// =============================================================================

/// A validated sale request, not yet priced against the product ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub customer_id: Option<String>,
    pub lines: Vec<DraftLine>,
    pub staff_member: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub tax: Money,
    pub discount: Money,
    pub notes: Option<String>,
    pub sale_number: Option<SaleNumber>,
    pub sale_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_override: Option<Money>,
}

impl SaleDraft {
    /// Validates a request without touching any ledger.
    pub fn from_request(request: SaleRequest) -> CoreResult<SaleDraft> {
        if request.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        validation::validate_sale_size(request.items.len())?;

        let staff_member = request
            .staff_member
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ValidationError::required("staffMember"))?;

        let payment_method: PaymentMethod = request
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ValidationError::required("paymentMethod"))?
            .parse()?;

        let tax_cents = amount_in_cents("tax", request.tax_cents, request.tax)?.unwrap_or(0);
        let discount_cents =
            amount_in_cents("discount", request.discount_cents, request.discount)?.unwrap_or(0);

        let lines = request
            .items
            .into_iter()
            .map(DraftLine::from_request)
            .collect::<Result<Vec<_>, _>>()?;

        let sale_number = request
            .sale_number
            .filter(|n| !n.trim().is_empty())
            .map(|n| SaleNumber::parse(&n))
            .transpose()?;

        Ok(SaleDraft {
            customer_id: request
                .customer
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            lines,
            staff_member,
            payment_method,
            payment_status: request.payment_status.unwrap_or_default(),
            tax: Money::from_cents(tax_cents),
            discount: Money::from_cents(discount_cents),
            notes: request
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            sale_number,
            sale_date: request.sale_date,
        })
    }

    /// Assembles the sale row once every line has been priced.
    pub fn into_sale(
        self,
        id: String,
        sale_number: String,
        lines: Vec<PricedLine>,
        totals: SaleTotals,
        now: DateTime<Utc>,
    ) -> Sale {
        Sale {
            id,
            sale_number,
            sale_date: self.sale_date.unwrap_or(now),
            customer_id: self.customer_id,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            discount_cents: totals.discount.cents(),
            total_cents: totals.total.cents(),
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            staff_member: self.staff_member,
            notes: self.notes,
            created_at: now,
            items: lines.into_iter().map(PricedLine::into_item).collect(),
        }
    }
}

impl DraftLine {
    fn from_request(line: LineRequest) -> Result<DraftLine, ValidationError> {
        let product_id = line
            .product_id
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let (product_id, quantity) = match (product_id, line.quantity) {
            (Some(p), Some(q)) => (p, q),
            _ => return Err(ValidationError::required("Each item's productId and quantity")),
        };
        validation::validate_quantity(quantity)?;

        let unit_price = amount_in_cents("unitPrice", line.unit_price_cents, line.unit_price)?;

        Ok(DraftLine {
            product_id,
            quantity,
            unit_price_override: unit_price.map(Money::from_cents),
        })
    }
}

/// Resolves an amount sent either as integer cents (`<field>Cents`) or as a
/// decimal currency value (`<field>`). Sending both is an error, as is a
/// negative or non-finite amount.
fn amount_in_cents(
    field: &str,
    cents: Option<i64>,
    decimal: Option<f64>,
) -> Result<Option<i64>, ValidationError> {
    let cents = match (cents, decimal) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("send either {field} or {field}Cents, not both"),
            })
        }
        (Some(cents), None) => cents,
        (None, Some(decimal)) => Money::from_major_f64(decimal)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected a finite currency amount".to_string(),
            })?
            .cents(),
        (None, None) => return Ok(None),
    };

    validation::validate_non_negative(field, cents)?;
    Ok(Some(cents))
}

// =============================================================================
// Pricing
// =============================================================================

/// A line priced against the product row it sells from.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl PricedLine {
    /// Checks stock and resolves the unit price for one line.
    ///
    /// The override, when present, is used verbatim; the product's stored
    /// price is never modified here.
    pub fn price(line: &DraftLine, product: &Product) -> CoreResult<PricedLine> {
        if !product.can_sell(line.quantity) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: line.quantity,
            });
        }

        let unit_price = line.unit_price_override.unwrap_or_else(|| product.price());
        let subtotal = unit_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "line subtotal".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        Ok(PricedLine {
            product_id: product.id.clone(),
            quantity: line.quantity,
            unit_price,
            subtotal,
        })
    }

    fn into_item(self) -> SaleItem {
        SaleItem {
            product_id: self.product_id,
            quantity: self.quantity,
            unit_price_cents: self.unit_price.cents(),
            subtotal_cents: self.subtotal.cents(),
        }
    }
}

/// Order-level amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl SaleTotals {
    /// `subtotal = Σ line subtotals`, `total = subtotal + tax − discount`.
    pub fn compute(lines: &[PricedLine], tax: Money, discount: Money) -> CoreResult<SaleTotals> {
        let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
        let total = subtotal + tax - discount;

        if total.is_negative() {
            return Err(CoreError::NegativeTotal {
                subtotal_cents: subtotal.cents(),
                tax_cents: tax.cents(),
                discount_cents: discount.cents(),
            });
        }

        Ok(SaleTotals {
            subtotal,
            tax,
            discount,
            total,
        })
    }
}

/// Loyalty points earned by a sale: one per whole 10 currency units.
///
/// ```rust
/// use smartstock_core::money::Money;
/// use smartstock_core::sale::loyalty_points_for;
///
/// assert_eq!(loyalty_points_for(Money::from_cents(5500)), 5);
/// assert_eq!(loyalty_points_for(Money::from_cents(999)), 0);
/// ```
pub fn loyalty_points_for(total: Money) -> i64 {
    if total.is_negative() {
        return 0;
    }
    total.cents() / CENTS_PER_LOYALTY_POINT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            sku: id.to_uppercase(),
            category: "General".to_string(),
            price_cents,
            stock,
            min_stock: 1,
            supplier: None,
            description: None,
            barcode: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(items: Vec<LineRequest>) -> SaleRequest {
        SaleRequest {
            items,
            staff_member: Some("Jordan".to_string()),
            payment_method: Some("Cash".to_string()),
            ..Default::default()
        }
    }

    fn line(product_id: &str, quantity: i64) -> LineRequest {
        LineRequest {
            product_id: Some(product_id.to_string()),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = SaleDraft::from_request(request(vec![])).unwrap_err();
        assert!(matches!(err, CoreError::EmptySale));
    }

    #[test]
    fn test_staff_and_payment_method_required() {
        let mut req = request(vec![line("a", 1)]);
        req.staff_member = Some("   ".to_string());
        assert!(matches!(
            SaleDraft::from_request(req).unwrap_err(),
            CoreError::Validation(ValidationError::Required { .. })
        ));

        let mut req = request(vec![line("a", 1)]);
        req.payment_method = None;
        assert!(SaleDraft::from_request(req).is_err());

        let mut req = request(vec![line("a", 1)]);
        req.payment_method = Some("Barter".to_string());
        assert!(matches!(
            SaleDraft::from_request(req).unwrap_err(),
            CoreError::Validation(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_line_requires_product_and_quantity() {
        let req = request(vec![LineRequest {
            product_id: Some("a".to_string()),
            quantity: None,
            ..Default::default()
        }]);
        assert!(SaleDraft::from_request(req).is_err());

        let req = request(vec![line("a", 0)]);
        assert!(SaleDraft::from_request(req).is_err());
    }

    #[test]
    fn test_negative_tax_or_discount_rejected() {
        let mut req = request(vec![line("a", 1)]);
        req.tax_cents = Some(-1);
        assert!(SaleDraft::from_request(req).is_err());

        let mut req = request(vec![line("a", 1)]);
        req.discount_cents = Some(-1);
        assert!(SaleDraft::from_request(req).is_err());
    }

    #[test]
    fn test_decimal_amounts_become_cents() {
        let req: SaleRequest = serde_json::from_value(serde_json::json!({
            "items": [{ "productId": "a", "quantity": 1, "unitPrice": 9.99 }],
            "staffMember": "Jordan",
            "paymentMethod": "Cash",
            "tax": 5,
            "discount": 1.1
        }))
        .unwrap();

        let draft = SaleDraft::from_request(req).unwrap();
        assert_eq!(draft.lines[0].unit_price_override, Some(Money::from_cents(999)));
        assert_eq!(draft.tax, Money::from_cents(500));
        assert_eq!(draft.discount, Money::from_cents(110));
    }

    #[test]
    fn test_decimal_and_cents_forms_are_exclusive() {
        let mut req = request(vec![LineRequest {
            unit_price_cents: Some(999),
            unit_price: Some(9.99),
            ..line("a", 1)
        }]);
        assert!(matches!(
            SaleDraft::from_request(req.clone()).unwrap_err(),
            CoreError::Validation(ValidationError::InvalidFormat { ref field, .. }) if field == "unitPrice"
        ));

        req.items = vec![line("a", 1)];
        req.tax_cents = Some(100);
        req.tax = Some(1.0);
        assert!(SaleDraft::from_request(req).is_err());
    }

    #[test]
    fn test_negative_or_non_finite_decimal_rejected() {
        let req = request(vec![LineRequest {
            unit_price: Some(-0.5),
            ..line("a", 1)
        }]);
        assert!(matches!(
            SaleDraft::from_request(req).unwrap_err(),
            CoreError::Validation(ValidationError::Negative { .. })
        ));

        let mut req = request(vec![line("a", 1)]);
        req.discount = Some(f64::INFINITY);
        assert!(SaleDraft::from_request(req).is_err());
    }

    #[test]
    fn test_defaults() {
        let draft = SaleDraft::from_request(request(vec![line("a", 2)])).unwrap();
        assert_eq!(draft.tax, Money::zero());
        assert_eq!(draft.discount, Money::zero());
        assert_eq!(draft.payment_status, PaymentStatus::Paid);
        assert_eq!(draft.customer_id, None);
        assert_eq!(draft.sale_number, None);
    }

    #[test]
    fn test_preassigned_sale_number_is_validated() {
        let mut req = request(vec![line("a", 1)]);
        req.sale_number = Some("SALE-20240305-0042".to_string());
        let draft = SaleDraft::from_request(req).unwrap();
        assert_eq!(draft.sale_number.unwrap().sequence(), 42);

        let mut req = request(vec![line("a", 1)]);
        req.sale_number = Some("42".to_string());
        assert!(SaleDraft::from_request(req).is_err());
    }

    #[test]
    fn test_product_alias_accepted() {
        let req: SaleRequest = serde_json::from_value(serde_json::json!({
            "items": [{ "product": "abc", "quantity": 2 }],
            "staffMember": "Jordan",
            "paymentMethod": "Debit Card"
        }))
        .unwrap();
        let draft = SaleDraft::from_request(req).unwrap();
        assert_eq!(draft.lines[0].product_id, "abc");
        assert_eq!(draft.payment_method, PaymentMethod::DebitCard);
    }

    #[test]
    fn test_price_uses_product_price() {
        let p = product("a", 1250, 5);
        let draft_line = DraftLine {
            product_id: "a".to_string(),
            quantity: 5,
            unit_price_override: None,
        };
        let priced = PricedLine::price(&draft_line, &p).unwrap();
        assert_eq!(priced.unit_price.cents(), 1250);
        assert_eq!(priced.subtotal.cents(), 6250);
    }

    #[test]
    fn test_price_override_is_verbatim() {
        let p = product("a", 1250, 5);
        let draft_line = DraftLine {
            product_id: "a".to_string(),
            quantity: 2,
            unit_price_override: Some(Money::from_cents(999)),
        };
        let priced = PricedLine::price(&draft_line, &p).unwrap();
        assert_eq!(priced.unit_price.cents(), 999);
        assert_eq!(priced.subtotal.cents(), 1998);
        assert_eq!(p.price_cents, 1250);
    }

    #[test]
    fn test_insufficient_stock() {
        let p = product("a", 100, 5);
        let draft_line = DraftLine {
            product_id: "a".to_string(),
            quantity: 6,
            unit_price_override: None,
        };
        match PricedLine::price(&draft_line, &p).unwrap_err() {
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => {
                assert_eq!(product, "Product a");
                assert_eq!(available, 5);
                assert_eq!(requested, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_totals() {
        let lines = vec![
            PricedLine {
                product_id: "a".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
                subtotal: Money::from_cents(2000),
            },
            PricedLine {
                product_id: "b".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(3500),
                subtotal: Money::from_cents(3500),
            },
        ];
        let totals =
            SaleTotals::compute(&lines, Money::from_cents(440), Money::from_cents(500)).unwrap();
        assert_eq!(totals.subtotal.cents(), 5500);
        assert_eq!(totals.total.cents(), 5440);
    }

    #[test]
    fn test_negative_total_rejected() {
        let lines = vec![PricedLine {
            product_id: "a".to_string(),
            quantity: 1,
            unit_price: Money::from_cents(500),
            subtotal: Money::from_cents(500),
        }];
        let err = SaleTotals::compute(&lines, Money::zero(), Money::from_cents(501)).unwrap_err();
        assert!(matches!(err, CoreError::NegativeTotal { .. }));
    }

    #[test]
    fn test_into_sale_is_consistent() {
        let draft = SaleDraft::from_request(request(vec![line("a", 3)])).unwrap();
        let p = product("a", 700, 10);
        let priced = vec![PricedLine::price(&draft.lines[0], &p).unwrap()];
        let totals = SaleTotals::compute(&priced, draft.tax, draft.discount).unwrap();
        let now = Utc::now();

        let sale = draft.into_sale(
            "s1".to_string(),
            "SALE-20240305-0001".to_string(),
            priced,
            totals,
            now,
        );
        assert!(sale.is_consistent());
        assert_eq!(sale.sale_date, now);
        assert_eq!(sale.total_cents, 2100);
    }

    #[test]
    fn test_loyalty_points() {
        assert_eq!(loyalty_points_for(Money::from_cents(5500)), 5);
        assert_eq!(loyalty_points_for(Money::from_cents(10_000)), 10);
        assert_eq!(loyalty_points_for(Money::from_cents(999)), 0);
        assert_eq!(loyalty_points_for(Money::zero()), 0);
    }
}

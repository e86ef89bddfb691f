// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived figures for the dashboard views.
//!
//! Everything here is pure arithmetic over records that were already
//! fetched; nothing touches the database.

use crate::models::{Expense, FuelSupply, Shift, Tank, Transaction, has_status};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// `part / whole * 100`, two decimals; zero when there is no whole.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    ratio(part, whole).saturating_mul(HUNDRED).round_dp(2)
}

/// Division that clamps to the `Decimal` range instead of panicking.
fn ratio(a: Decimal, b: Decimal) -> Decimal {
    a.checked_div(b).unwrap_or(if a.is_sign_negative() == b.is_sign_negative() {
        Decimal::MAX
    } else {
        Decimal::MIN
    })
}

pub fn within_period(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    from.is_none_or(|f| date >= f) && to.is_none_or(|t| date <= t)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    pub count: usize,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub total: Decimal,
    pub count: usize,
    pub categories: Vec<CategoryShare>,
}

pub fn expense_breakdown(expenses: &[Expense]) -> ExpenseBreakdown {
    let mut agg: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
    let mut total = Decimal::ZERO;
    let mut count = 0;
    for e in expenses.iter().filter(|e| !has_status(&e.status, "cancelled")) {
        let entry = agg.entry(e.category.as_str()).or_insert((Decimal::ZERO, 0));
        entry.0 = entry.0.saturating_add(e.amount);
        entry.1 += 1;
        total = total.saturating_add(e.amount);
        count += 1;
    }
    let mut categories: Vec<CategoryShare> = agg
        .into_iter()
        .map(|(category, (amount, n))| CategoryShare {
            category: category.to_string(),
            amount,
            count: n,
            percentage: percentage(amount, total),
        })
        .collect();
    categories.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    ExpenseBreakdown {
        total,
        count,
        categories,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankLevel {
    pub id: i64,
    pub name: String,
    pub fuel_type: String,
    pub current_liters: Decimal,
    pub capacity_liters: Decimal,
    pub fill_percent: Decimal,
    pub free_liters: Decimal,
    pub low: bool,
}

pub fn tank_levels(tanks: &[Tank]) -> Vec<TankLevel> {
    tanks
        .iter()
        .map(|t| {
            let current = t.current_level_liters.unwrap_or_default();
            TankLevel {
                id: t.id,
                name: t.name.clone(),
                fuel_type: t.fuel_type.clone(),
                current_liters: current,
                capacity_liters: t.capacity_liters,
                fill_percent: percentage(current, t.capacity_liters),
                free_liters: t.capacity_liters.saturating_sub(current).max(Decimal::ZERO),
                low: t.min_level_liters.is_some_and(|min| current < min),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesBucket {
    pub amount: Decimal,
    pub liters: Decimal,
    pub count: usize,
}

impl SalesBucket {
    fn add(&mut self, t: &Transaction) {
        self.amount = self.amount.saturating_add(t.amount);
        self.liters = self.liters.saturating_add(t.quantity_liters);
        self.count += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total: SalesBucket,
    pub average_ticket: Decimal,
    pub by_fuel_type: BTreeMap<String, SalesBucket>,
    pub by_payment_method: BTreeMap<String, SalesBucket>,
}

pub fn sales_summary(transactions: &[Transaction]) -> SalesSummary {
    let mut s = SalesSummary::default();
    for t in transactions.iter().filter(|t| !has_status(&t.status, "refunded")) {
        s.total.add(t);
        s.by_fuel_type.entry(t.fuel_type.clone()).or_default().add(t);
        let method = t.payment_method.clone().unwrap_or_else(|| "unknown".into());
        s.by_payment_method.entry(method).or_default().add(t);
    }
    if s.total.count > 0 {
        s.average_ticket = (s.total.amount / Decimal::from(s.total.count)).round_dp(2);
    }
    s
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSupply {
    pub provider_id: i64,
    pub deliveries: usize,
    pub liters: Decimal,
    pub cost: Decimal,
    pub average_price_per_liter: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplySummary {
    pub liters: Decimal,
    pub cost: Decimal,
    pub pending: usize,
    pub providers: Vec<ProviderSupply>,
}

pub fn supply_summary(supplies: &[FuelSupply]) -> SupplySummary {
    let mut out = SupplySummary::default();
    let mut per: BTreeMap<i64, ProviderSupply> = BTreeMap::new();
    for s in supplies {
        if has_status(&s.status, "cancelled") {
            continue;
        }
        if has_status(&s.status, "pending") {
            out.pending += 1;
            continue;
        }
        let cost = s.cost();
        out.liters = out.liters.saturating_add(s.quantity_liters);
        out.cost = out.cost.saturating_add(cost);
        let p = per.entry(s.provider_id).or_insert_with(|| ProviderSupply {
            provider_id: s.provider_id,
            ..Default::default()
        });
        p.deliveries += 1;
        p.liters = p.liters.saturating_add(s.quantity_liters);
        p.cost = p.cost.saturating_add(cost);
    }
    out.providers = per
        .into_values()
        .map(|mut p| {
            if !p.liters.is_zero() {
                p.average_price_per_liter = ratio(p.cost, p.liters).round_dp(4);
            }
            p
        })
        .collect();
    out.providers.sort_by(|a, b| b.cost.cmp(&a.cost).then(a.provider_id.cmp(&b.provider_id)));
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub employee_id: i64,
    pub shifts: usize,
    pub open: usize,
    pub cash_collected: Decimal,
}

pub fn shift_summary(shifts: &[Shift]) -> Vec<ShiftSummary> {
    let mut per: BTreeMap<i64, ShiftSummary> = BTreeMap::new();
    for s in shifts {
        let e = per.entry(s.employee_id).or_insert_with(|| ShiftSummary {
            employee_id: s.employee_id,
            ..Default::default()
        });
        e.shifts += 1;
        if has_status(&s.status, "open") {
            e.open += 1;
        }
        if let Some(delta) = s.cash_delta() {
            e.cash_collected = e.cash_collected.saturating_add(delta);
        }
    }
    per.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceOverview {
    pub revenue: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    pub margin_percent: Decimal,
}

pub fn finance_overview(transactions: &[Transaction], expenses: &[Expense]) -> FinanceOverview {
    let revenue = sales_summary(transactions).total.amount;
    let spent = expense_breakdown(expenses).total;
    let net = revenue.saturating_sub(spent);
    FinanceOverview {
        revenue,
        expenses: spent,
        net,
        margin_percent: percentage(net, revenue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn expense(id: i64, category: &str, amount: &str, status: Option<&str>) -> Expense {
        Expense {
            id,
            date: day("2025-04-01"),
            category: category.into(),
            amount: d(amount),
            description: None,
            payment_method: None,
            status: status.map(Into::into),
        }
    }

    fn sale(fuel: &str, liters: &str, amount: &str, method: Option<&str>, status: &str) -> Transaction {
        Transaction {
            id: 0,
            date: day("2025-04-02"),
            filling_system_id: None,
            employee_id: None,
            fuel_type: fuel.into(),
            quantity_liters: d(liters),
            amount: d(amount),
            payment_method: method.map(Into::into),
            status: Some(status.into()),
        }
    }

    #[test]
    fn expense_shares_sum_and_skip_cancelled() {
        let b = expense_breakdown(&[
            expense(1, "utilities", "300", Some("paid")),
            expense(2, "maintenance", "100", None),
            expense(3, "utilities", "100", Some("pending")),
            expense(4, "payroll", "9999", Some("cancelled")),
        ]);
        assert_eq!(b.total, d("500"));
        assert_eq!(b.count, 3);
        assert_eq!(b.categories[0].category, "utilities");
        assert_eq!(b.categories[0].amount, d("400"));
        assert_eq!(b.categories[0].count, 2);
        assert_eq!(b.categories[0].percentage, d("80"));
        assert_eq!(b.categories[1].percentage, d("20"));
    }

    #[test]
    fn empty_inputs_give_zero_percentages() {
        assert!(expense_breakdown(&[]).categories.is_empty());
        assert_eq!(percentage(d("5"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(finance_overview(&[], &[]).margin_percent, Decimal::ZERO);
    }

    #[test]
    fn tank_fill_and_low_flag() {
        let levels = tank_levels(&[
            Tank {
                id: 1,
                name: "T1".into(),
                fuel_type: "diesel".into(),
                capacity_liters: d("20000"),
                current_level_liters: Some(d("5000")),
                min_level_liters: Some(d("6000")),
                status: None,
            },
            Tank {
                id: 2,
                name: "T2".into(),
                fuel_type: "lpg".into(),
                capacity_liters: Decimal::ZERO,
                current_level_liters: None,
                min_level_liters: None,
                status: None,
            },
        ]);
        assert_eq!(levels[0].fill_percent, d("25"));
        assert_eq!(levels[0].free_liters, d("15000"));
        assert!(levels[0].low);
        assert_eq!(levels[1].fill_percent, Decimal::ZERO);
        assert!(!levels[1].low);
    }

    #[test]
    fn sales_grouped_by_fuel_and_payment() {
        let s = sales_summary(&[
            sale("diesel", "40", "60", Some("card"), "completed"),
            sale("diesel", "10", "15", Some("cash"), "completed"),
            sale("lpg", "20", "18", None, "completed"),
            sale("lpg", "99", "99", Some("card"), "refunded"),
        ]);
        assert_eq!(s.total.count, 3);
        assert_eq!(s.total.amount, d("93"));
        assert_eq!(s.total.liters, d("70"));
        assert_eq!(s.average_ticket, d("31"));
        assert_eq!(s.by_fuel_type["diesel"].amount, d("75"));
        assert_eq!(s.by_payment_method["unknown"].count, 1);
        assert_eq!(s.by_payment_method["card"].liters, d("40"));
    }

    #[test]
    fn supplies_fall_back_to_quantity_times_price() {
        let base = FuelSupply {
            id: 1,
            provider_id: 7,
            tank_id: 1,
            fuel_type: "diesel".into(),
            quantity_liters: d("1000"),
            price_per_liter: d("1.5"),
            total_cost: None,
            delivery_date: day("2025-04-03"),
            invoice_number: None,
            status: Some("delivered".into()),
        };
        let explicit = FuelSupply {
            id: 2,
            total_cost: Some(d("1400")),
            ..base.clone()
        };
        let pending = FuelSupply {
            id: 3,
            status: Some("pending".into()),
            ..base.clone()
        };
        let s = supply_summary(&[base, explicit, pending]);
        assert_eq!(s.cost, d("2900"));
        assert_eq!(s.liters, d("2000"));
        assert_eq!(s.pending, 1);
        assert_eq!(s.providers.len(), 1);
        assert_eq!(s.providers[0].average_price_per_liter, d("1.45"));
    }

    #[test]
    fn finance_overview_nets_revenue_against_expenses() {
        let o = finance_overview(
            &[sale("diesel", "100", "200", Some("card"), "completed")],
            &[expense(1, "rent", "50", Some("paid"))],
        );
        assert_eq!(o.net, d("150"));
        assert_eq!(o.margin_percent, d("75"));
    }

    #[test]
    fn shifts_grouped_per_employee() {
        let shift = |id, employee_id, open: Option<&str>, close: Option<&str>, status: &str| Shift {
            id,
            employee_id,
            start_time: "2025-04-02 06:00:00".into(),
            end_time: None,
            opening_cash: open.map(d),
            closing_cash: close.map(d),
            status: Some(status.into()),
        };
        let s = shift_summary(&[
            shift(1, 4, Some("200"), Some("1450.50"), "closed"),
            shift(2, 4, Some("200"), None, "open"),
            shift(3, 9, None, Some("300"), "closed"),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].employee_id, 4);
        assert_eq!(s[0].shifts, 2);
        assert_eq!(s[0].open, 1);
        assert_eq!(s[0].cash_collected, d("1250.50"));
        assert_eq!(s[1].cash_collected, d("300"));
    }

    #[test]
    fn period_bounds_are_inclusive() {
        let (from, to) = (Some(day("2025-04-01")), Some(day("2025-04-30")));
        assert!(within_period(day("2025-04-01"), from, to));
        assert!(within_period(day("2025-04-30"), from, to));
        assert!(!within_period(day("2025-05-01"), from, to));
        assert!(within_period(day("1999-01-01"), None, None));
    }

    #[test]
    fn oversized_rows_clamp_instead_of_panicking() {
        let huge = Decimal::MAX.to_string();
        let expenses = vec![expense(1, "rent", &huge, None), expense(2, "rent", &huge, None)];
        let b = expense_breakdown(&expenses);
        assert_eq!(b.total, Decimal::MAX);
        assert_eq!(b.categories[0].percentage, d("100"));

        assert_eq!(percentage(Decimal::MAX, d("0.0001")), Decimal::MAX.round_dp(2));
        let overview = finance_overview(&[], &expenses);
        assert_eq!(overview.net, Decimal::MIN);
    }
}

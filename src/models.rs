// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPrice {
    pub id: i64,
    pub fuel_type: String,
    pub price_per_liter: Decimal,
    pub effective_date: NaiveDate,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub id: i64,
    pub name: String,
    pub fuel_type: String,
    pub capacity_liters: Decimal,
    #[serde(default)]
    pub current_level_liters: Option<Decimal>,
    #[serde(default)]
    pub min_level_liters: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillingSystem {
    pub id: i64,
    pub name: String,
    pub tank_id: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelSupply {
    pub id: i64,
    pub provider_id: i64,
    pub tank_id: i64,
    pub fuel_type: String,
    pub quantity_liters: Decimal,
    pub price_per_liter: Decimal,
    #[serde(default)]
    pub total_cost: Option<Decimal>,
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub filling_system_id: Option<i64>,
    #[serde(default)]
    pub employee_id: Option<i64>,
    pub fuel_type: String,
    pub quantity_liters: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub position: String,
    #[serde(default)]
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: i64,
    pub employee_id: i64,
    pub start_time: String, // YYYY-MM-DD HH:MM:SS, UTC
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub opening_cash: Option<Decimal>,
    #[serde(default)]
    pub closing_cash: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

impl FuelSupply {
    pub fn cost(&self) -> Decimal {
        self.total_cost
            .unwrap_or_else(|| self.quantity_liters.saturating_mul(self.price_per_liter))
    }
}

impl Shift {
    /// Cash taken during the shift, once it has been closed out.
    pub fn cash_delta(&self) -> Option<Decimal> {
        Some(self.closing_cash?.saturating_sub(self.opening_cash.unwrap_or_default()))
    }
}

pub(crate) fn has_status(status: &Option<String>, wanted: &str) -> bool {
    status.as_deref() == Some(wanted)
}

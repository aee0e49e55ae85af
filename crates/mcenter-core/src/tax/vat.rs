use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::McenterError;
use crate::types::*;
use crate::McenterResult;

pub const VAT_RATE: Rate = dec!(0.10);

/// Simplified taxpayers below this annual supply (VAT inclusive) owe no VAT
pub const SIMPLIFIED_EXEMPTION_THRESHOLD: Money = dec!(48_000_000);

/// Upper limit of annual supply for simplified taxation
pub const SIMPLIFIED_CEILING: Money = dec!(104_000_000);

/// Credit on purchase invoices for simplified taxpayers, as a share of the
/// VAT-inclusive purchase amount
const SIMPLIFIED_PURCHASE_CREDIT: Rate = dec!(0.005);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxpayerType {
    #[default]
    General,
    Simplified,
}

/// Industry groups for the simplified-taxpayer value-added ratio (부가가치율)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryGroup {
    /// Retail, restaurants, recyclable collection
    RetailRestaurant,
    /// Manufacturing, agriculture, lodging, transport
    ManufacturingLodging,
    /// Construction, real-estate rental and other services
    #[default]
    OtherServices,
    /// Finance, insurance, professional and scientific services
    Professional,
}

impl IndustryGroup {
    pub fn value_added_ratio(self) -> Rate {
        match self {
            IndustryGroup::RetailRestaurant => dec!(0.15),
            IndustryGroup::ManufacturingLodging => dec!(0.20),
            IndustryGroup::OtherServices => dec!(0.30),
            IndustryGroup::Professional => dec!(0.40),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatInput {
    #[serde(default)]
    pub taxpayer_type: TaxpayerType,
    /// Taxable supplies for the period, excluding VAT
    pub supply_amount: Money,
    /// Purchases with tax invoices for the period, excluding VAT
    pub purchase_amount: Money,
    #[serde(default)]
    pub industry: IndustryGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VatOutput {
    pub taxpayer_type: TaxpayerType,
    pub output_vat: Money,
    pub input_vat: Money,
    /// Negative for a refund (general taxpayers only)
    pub vat_payable: Money,
    pub exempt: bool,
}

pub fn calculate_vat(input: &VatInput) -> McenterResult<ComputationOutput<VatOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.supply_amount < Decimal::ZERO || input.purchase_amount < Decimal::ZERO {
        return Err(McenterError::InvalidInput {
            field: "supply_amount".into(),
            reason: "Supply and purchase amounts cannot be negative".into(),
        });
    }

    let output = match input.taxpayer_type {
        TaxpayerType::General => {
            let output_vat = (input.supply_amount * VAT_RATE).floor();
            let input_vat = (input.purchase_amount * VAT_RATE).floor();
            if input_vat > output_vat {
                warnings.push("Input VAT exceeds output VAT; refund position".into());
            }
            VatOutput {
                taxpayer_type: TaxpayerType::General,
                output_vat,
                input_vat,
                vat_payable: output_vat - input_vat,
                exempt: false,
            }
        }
        TaxpayerType::Simplified => {
            let gross_supply = input.supply_amount * (Decimal::ONE + VAT_RATE);
            if gross_supply >= SIMPLIFIED_CEILING {
                warnings.push(format!(
                    "Annual supply {} exceeds the simplified taxation ceiling; general taxation applies from next period",
                    gross_supply.round_dp(0)
                ));
            }
            let exempt = gross_supply < SIMPLIFIED_EXEMPTION_THRESHOLD;
            let output_vat =
                (gross_supply * input.industry.value_added_ratio() * VAT_RATE).floor();
            let input_vat = (input.purchase_amount
                * (Decimal::ONE + VAT_RATE)
                * SIMPLIFIED_PURCHASE_CREDIT)
                .floor();
            let vat_payable = if exempt {
                Decimal::ZERO
            } else {
                (output_vat - input_vat).max(Decimal::ZERO)
            };
            VatOutput {
                taxpayer_type: TaxpayerType::Simplified,
                output_vat,
                input_vat,
                vat_payable,
                exempt,
            }
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Korean VAT (general 10%, simplified value-added ratio)",
        &serde_json::json!({
            "taxpayer_type": input.taxpayer_type,
            "industry": input.industry,
            "value_added_ratio": input.industry.value_added_ratio().to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_taxpayer() {
        let out = calculate_vat(&VatInput {
            taxpayer_type: TaxpayerType::General,
            supply_amount: dec!(100_000_000),
            purchase_amount: dec!(60_000_000),
            industry: IndustryGroup::OtherServices,
        })
        .unwrap();
        assert_eq!(out.result.vat_payable, dec!(4_000_000));
    }

    #[test]
    fn test_general_refund() {
        let out = calculate_vat(&VatInput {
            taxpayer_type: TaxpayerType::General,
            supply_amount: dec!(10_000_000),
            purchase_amount: dec!(30_000_000),
            industry: IndustryGroup::OtherServices,
        })
        .unwrap();
        assert_eq!(out.result.vat_payable, dec!(-2_000_000));
    }

    #[test]
    fn test_simplified_restaurant() {
        let out = calculate_vat(&VatInput {
            taxpayer_type: TaxpayerType::Simplified,
            supply_amount: dec!(80_000_000),
            purchase_amount: dec!(20_000_000),
            industry: IndustryGroup::RetailRestaurant,
        })
        .unwrap();
        // 88M * 15% * 10% = 1.32M ; credit 22M * 0.5% = 110k
        assert_eq!(out.result.output_vat, dec!(1_320_000));
        assert_eq!(out.result.input_vat, dec!(110_000));
        assert_eq!(out.result.vat_payable, dec!(1_210_000));
        assert!(!out.result.exempt);
    }

    #[test]
    fn test_simplified_exemption() {
        let out = calculate_vat(&VatInput {
            taxpayer_type: TaxpayerType::Simplified,
            supply_amount: dec!(30_000_000),
            purchase_amount: dec!(5_000_000),
            industry: IndustryGroup::RetailRestaurant,
        })
        .unwrap();
        assert!(out.result.exempt);
        assert_eq!(out.result.vat_payable, Decimal::ZERO);
    }
}

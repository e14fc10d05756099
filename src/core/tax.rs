use super::types::TaxBreakdown;

pub const TAX_YEAR: &str = "2025-2026";

pub const PERSONAL_ALLOWANCE: f64 = 12_570.0;
pub const ALLOWANCE_TAPER_START: f64 = 100_000.0;
pub const ALLOWANCE_ZERO_AT: f64 = 125_140.0;

/// Band limits apply to taxable income, i.e. after the allowance.
pub const BASIC_RATE_LIMIT: f64 = 37_700.0;
pub const HIGHER_RATE_LIMIT: f64 = 125_140.0;

pub const BASIC_RATE: f64 = 0.20;
pub const HIGHER_RATE: f64 = 0.40;
pub const ADDITIONAL_RATE: f64 = 0.45;

pub const NI_PRIMARY_THRESHOLD: f64 = 12_570.0;
pub const NI_UPPER_EARNINGS_LIMIT: f64 = 50_270.0;
pub const NI_MAIN_RATE: f64 = 0.08;
pub const NI_UPPER_RATE: f64 = 0.02;

pub fn annual_tax(annual_income: f64) -> f64 {
    tax_breakdown(annual_income).total
}

pub fn tax_breakdown(annual_income: f64) -> TaxBreakdown {
    let income = non_negative(annual_income);
    let personal_allowance = personal_allowance(income);
    let income_tax = income_tax(income);
    let national_insurance = national_insurance(income);

    TaxBreakdown {
        personal_allowance,
        income_tax,
        national_insurance,
        total: income_tax + national_insurance,
    }
}

pub fn personal_allowance(annual_income: f64) -> f64 {
    let income = non_negative(annual_income);
    let reduction = (income - ALLOWANCE_TAPER_START).max(0.0) / 2.0;
    (PERSONAL_ALLOWANCE - reduction).max(0.0)
}

pub fn income_tax(annual_income: f64) -> f64 {
    let income = non_negative(annual_income);
    let taxable_income = (income - personal_allowance(income)).max(0.0);

    let basic_taxable = taxable_income.min(BASIC_RATE_LIMIT);
    let higher_taxable = (taxable_income - BASIC_RATE_LIMIT)
        .max(0.0)
        .min(HIGHER_RATE_LIMIT - BASIC_RATE_LIMIT);
    let additional_taxable = (taxable_income - HIGHER_RATE_LIMIT).max(0.0);

    basic_taxable * BASIC_RATE + higher_taxable * HIGHER_RATE + additional_taxable * ADDITIONAL_RATE
}

pub fn national_insurance(annual_income: f64) -> f64 {
    let income = non_negative(annual_income);
    if income <= NI_PRIMARY_THRESHOLD {
        return 0.0;
    }

    let main_band = income.min(NI_UPPER_EARNINGS_LIMIT) - NI_PRIMARY_THRESHOLD;
    let upper_band = (income - NI_UPPER_EARNINGS_LIMIT).max(0.0);
    main_band * NI_MAIN_RATE + upper_band * NI_UPPER_RATE
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn no_tax_or_ni_at_personal_allowance() {
        assert_approx(income_tax(PERSONAL_ALLOWANCE), 0.0);
        assert_approx(national_insurance(PERSONAL_ALLOWANCE), 0.0);
        assert_approx(annual_tax(PERSONAL_ALLOWANCE), 0.0);
    }

    #[test]
    fn basic_rate_earner_pays_twenty_percent_and_main_ni() {
        let breakdown = tax_breakdown(30_000.0);
        assert_approx(breakdown.personal_allowance, 12_570.0);
        assert_approx(breakdown.income_tax, 3_486.0);
        assert_approx(breakdown.national_insurance, 1_394.4);
        assert_approx(breakdown.total, 4_880.4);
        assert_approx(annual_tax(30_000.0), 4_880.4);
    }

    #[test]
    fn additional_rate_earner_loses_whole_allowance() {
        let breakdown = tax_breakdown(150_000.0);
        assert_approx(breakdown.personal_allowance, 0.0);
        assert_approx(breakdown.income_tax, 53_703.0);
        assert_approx(breakdown.national_insurance, 5_010.6);
        assert_approx(annual_tax(150_000.0), 58_713.6);
    }

    #[test]
    fn allowance_tapers_inside_the_taper_window() {
        assert_approx(personal_allowance(100_000.0), 12_570.0);
        assert_approx(personal_allowance(110_000.0), 7_570.0);
        assert_approx(personal_allowance(ALLOWANCE_ZERO_AT), 0.0);
        assert_approx(personal_allowance(200_000.0), 0.0);
    }

    #[test]
    fn higher_rate_band_starts_after_basic_limit() {
        // 60_000 - 12_570 = 47_430 taxable: 37_700 basic, 9_730 higher.
        assert_approx(income_tax(60_000.0), 37_700.0 * 0.20 + 9_730.0 * 0.40);
        assert_approx(
            national_insurance(60_000.0),
            37_700.0 * 0.08 + 9_730.0 * 0.02,
        );
    }

    #[test]
    fn ni_starts_just_above_primary_threshold() {
        assert_approx(national_insurance(12_571.0), 0.08);
    }

    #[test]
    fn negative_and_non_finite_income_is_untaxed() {
        assert_approx(annual_tax(-5_000.0), 0.0);
        assert_approx(annual_tax(f64::NAN), 0.0);
        assert_approx(annual_tax(f64::NEG_INFINITY), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_annual_tax_is_non_negative_and_monotone(
            income_pence in 1u64..50_000_000,
            raise_pence in 0u64..5_000_000
        ) {
            let low = income_pence as f64 / 100.0;
            let high = (income_pence + raise_pence) as f64 / 100.0;
            let low_tax = annual_tax(low);
            let high_tax = annual_tax(high);

            prop_assert!(low_tax >= 0.0);
            prop_assert!(high_tax + EPS >= low_tax);
        }

        #[test]
        fn prop_tax_never_exceeds_income(income_pence in 0u64..100_000_000) {
            let income = income_pence as f64 / 100.0;
            prop_assert!(annual_tax(income) <= income + EPS);
        }

        #[test]
        fn prop_breakdown_total_is_sum_of_parts(income_pence in 0u64..50_000_000) {
            let breakdown = tax_breakdown(income_pence as f64 / 100.0);
            prop_assert!(
                (breakdown.total - breakdown.income_tax - breakdown.national_insurance).abs() <= EPS
            );
        }
    }
}

//! Fuel classification and intensity banding
//!
//! Fixed vocabulary:
//! - Renewable: wind, solar, hydro, biomass
//! - Low-carbon: renewable + nuclear
//! - Fossil: gas, coal
//!
//! Anything else ("imports", "other", ...) is unclassified. It is neither
//! low-carbon nor fossil, so the three aggregate percentages need not sum
//! to the total.

use crate::types::{FuelClass, IntensityLevel};

/// Fuels counted as renewable.
pub const RENEWABLE_FUELS: [&str; 4] = ["wind", "solar", "hydro", "biomass"];

/// Fuels counted as low-carbon (renewable plus nuclear).
pub const LOW_CARBON_FUELS: [&str; 5] = ["wind", "solar", "hydro", "biomass", "nuclear"];

/// Fuels counted on the fossil card.
pub const FOSSIL_FUELS: [&str; 2] = ["gas", "coal"];

fn in_set(label: &str, set: &[&str]) -> bool {
    set.iter().any(|fuel| fuel.eq_ignore_ascii_case(label.trim()))
}

/// Classify a fuel label. Unknown labels classify as neither renewable nor
/// low-carbon; there is no error path.
pub fn classify_fuel(label: &str) -> FuelClass {
    FuelClass {
        is_renewable: in_set(label, &RENEWABLE_FUELS),
        is_low_carbon: in_set(label, &LOW_CARBON_FUELS),
    }
}

/// Explicit fossil membership (gas or coal only).
pub fn is_fossil(label: &str) -> bool {
    in_set(label, &FOSSIL_FUELS)
}

/// Map an intensity in gCO₂/kWh to its band.
///
/// Total over all floats. Negative values land in Very Low; NaN fails every
/// comparison and lands in Very High.
pub fn level_for_intensity(value: f64) -> IntensityLevel {
    if value < 100.0 {
        IntensityLevel::VeryLow
    } else if value < 200.0 {
        IntensityLevel::Low
    } else if value < 300.0 {
        IntensityLevel::Moderate
    } else if value < 400.0 {
        IntensityLevel::High
    } else {
        IntensityLevel::VeryHigh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert!(classify_fuel("Wind").is_renewable);
        assert!(classify_fuel("SOLAR").is_low_carbon);
        assert!(classify_fuel(" hydro ").is_renewable);
    }

    #[test]
    fn nuclear_is_low_carbon_but_not_renewable() {
        let class = classify_fuel("nuclear");
        assert!(!class.is_renewable);
        assert!(class.is_low_carbon);
    }

    #[test]
    fn unknown_fuels_are_unclassified() {
        for label in ["imports", "other", "", "pumped storage"] {
            assert_eq!(classify_fuel(label), FuelClass::default(), "{label}");
            assert!(!is_fossil(label), "{label}");
        }
    }

    #[test]
    fn renewable_implies_low_carbon() {
        for fuel in RENEWABLE_FUELS {
            let class = classify_fuel(fuel);
            assert!(class.is_renewable && class.is_low_carbon);
        }
    }

    #[test]
    fn fossil_set_is_gas_and_coal() {
        assert!(is_fossil("gas"));
        assert!(is_fossil("Coal"));
        assert!(!is_fossil("biomass"));
        assert!(!is_fossil("oil"));
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(level_for_intensity(99.0), IntensityLevel::VeryLow);
        assert_eq!(level_for_intensity(100.0), IntensityLevel::Low);
        assert_eq!(level_for_intensity(199.999), IntensityLevel::Low);
        assert_eq!(level_for_intensity(200.0), IntensityLevel::Moderate);
        assert_eq!(level_for_intensity(300.0), IntensityLevel::High);
        assert_eq!(level_for_intensity(399.0), IntensityLevel::High);
        assert_eq!(level_for_intensity(400.0), IntensityLevel::VeryHigh);
    }

    #[test]
    fn negative_values_are_very_low() {
        assert_eq!(level_for_intensity(-15.0), IntensityLevel::VeryLow);
    }

    #[test]
    fn bands_are_contiguous_and_exhaustive() {
        // Walk [0, 1000) in quarter steps; the band never goes down and
        // every step lands on the band whose lower bound it has passed.
        let mut previous = IntensityLevel::VeryLow;
        for step in 0..4000 {
            let value = f64::from(step) * 0.25;
            let level = level_for_intensity(value);
            assert!(level >= previous);
            assert!(value >= level.lower_bound());
            previous = level;
        }
        assert_eq!(previous, IntensityLevel::VeryHigh);
    }
}

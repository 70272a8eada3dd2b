// SPDX-License-Identifier: Apache-2.0

use crate::product::ProductLine;
use serde::{Deserialize, Serialize};

/// Closed set of form choices with a stable wire slug per variant.
macro_rules! choice_enum {
    ($name:ident { $($variant:ident => $slug:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $slug)] $variant),+
        }

        impl $name {
            pub const CHOICES: &'static [&'static str] = &[$($slug),+];

            #[must_use]
            pub fn parse(raw: &str) -> Option<Self> {
                let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($slug => Some(Self::$variant),)+
                    _ => None,
                }
            }

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $slug),+
                }
            }
        }
    };
}

choice_enum!(CoverageLevel {
    Minimum => "minimum",
    Standard => "standard",
    Premium => "premium",
});

choice_enum!(PropertyType {
    SingleFamily => "single_family",
    Condo => "condo",
    Townhouse => "townhouse",
    MobileHome => "mobile_home",
    MultiFamily => "multi_family",
});

choice_enum!(Occupancy {
    Owner => "owner",
    Renter => "renter",
    Landlord => "landlord",
});

choice_enum!(LifeTerm {
    Years10 => "10",
    Years15 => "15",
    Years20 => "20",
    Years25 => "25",
    Years30 => "30",
    Whole => "whole",
});

choice_enum!(HealthCoverageType {
    Individual => "individual",
    Family => "family",
    MedicareSupplement => "medicare_supplement",
    ShortTerm => "short_term",
});

choice_enum!(BenefitPeriod {
    ShortTerm => "short_term",
    LongTerm => "long_term",
});

choice_enum!(WaitingPeriod {
    Days30 => "30",
    Days60 => "60",
    Days90 => "90",
    Days180 => "180",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoDetails {
    pub vehicle_year: u16,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub drivers: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_insurer: Option<String>,
    pub coverage_level: CoverageLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HomeDetails {
    pub property_type: PropertyType,
    pub year_built: u16,
    pub square_feet: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<u64>,
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifeDetails {
    pub coverage_amount: u64,
    pub term: LifeTerm,
    pub tobacco_use: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HealthDetails {
    pub household_size: u8,
    pub coverage_type: HealthCoverageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<u64>,
    pub pre_existing_conditions: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisabilityDetails {
    pub occupation: String,
    pub annual_income: u64,
    pub benefit_period: BenefitPeriod,
    pub waiting_period_days: WaitingPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "line", rename_all = "lowercase")]
pub enum ProductDetails {
    Auto(AutoDetails),
    Home(HomeDetails),
    Life(LifeDetails),
    Health(HealthDetails),
    Disability(DisabilityDetails),
}

impl ProductDetails {
    #[must_use]
    pub const fn product(&self) -> ProductLine {
        match self {
            Self::Auto(_) => ProductLine::Auto,
            Self::Home(_) => ProductLine::Home,
            Self::Life(_) => ProductLine::Life,
            Self::Health(_) => ProductLine::Health,
            Self::Disability(_) => ProductLine::Disability,
        }
    }

    /// One-line description an agent sees first when opening the lead.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Auto(d) => format!(
                "Auto quote: {} {} {}, {} driver(s), {} coverage",
                d.vehicle_year,
                d.vehicle_make,
                d.vehicle_model,
                d.drivers,
                d.coverage_level.as_str()
            ),
            Self::Home(d) => format!(
                "Home quote: {} built {}, {} sq ft, {}",
                d.property_type.as_str(),
                d.year_built,
                d.square_feet,
                d.occupancy.as_str()
            ),
            Self::Life(d) => format!(
                "Life quote: ${} {} term, tobacco={}",
                d.coverage_amount,
                d.term.as_str(),
                d.tobacco_use
            ),
            Self::Health(d) => format!(
                "Health quote: {} plan, household of {}",
                d.coverage_type.as_str(),
                d.household_size
            ),
            Self::Disability(d) => format!(
                "Disability quote: {} benefit, {}-day wait, occupation {}",
                d.benefit_period.as_str(),
                d.waiting_period_days.as_str(),
                d.occupation
            ),
        }
    }
}

//! Afrobarometer Round 8 country profiles.

use serde::{Deserialize, Serialize};

use crate::error::{PsuError, Result};

/// Per-country identifiers, survey file and fieldwork date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Lower-case key used in output file names (`southafrica`).
    pub key: String,
    /// Three-letter folder acronym (`SAF`).
    pub acronym: String,
    /// Display name as spelled in ACLED exports (`South Africa`).
    pub name: String,
    /// Survey spreadsheet file name inside `Afrobarometer/<acronym>/`.
    pub survey_file: String,
    pub survey_year: i32,
    /// Fieldwork anchor month, 1–12.
    pub survey_month: u32,
}

impl Country {
    fn new(key: &str, acronym: &str, name: &str, survey_file: &str, year: i32, month: u32) -> Self {
        Self {
            key: key.into(),
            acronym: acronym.into(),
            name: name.into(),
            survey_file: survey_file.into(),
            survey_year: year,
            survey_month: month,
        }
    }

    /// The four Round 8 countries in processing order.
    pub fn round8() -> Vec<Country> {
        vec![
            Country::new("nigeria", "NIG", "Nigeria", "NIG_R8.Data.wtd.final_1JUN23.xlsx", 2020, 1),
            Country::new("ethiopia", "ETH", "Ethiopia", "ETH_R8.Data.wtd.final_31May23.xlsx", 2019, 12),
            Country::new("southafrica", "SAF", "South Africa", "SAF_R8.Data.wtd.final_1JUN23.xlsx", 2021, 4),
            Country::new("kenya", "KEN", "Kenya", "KEN_R8.Data.wtd.final_31May23.xlsx", 2019, 8),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.survey_month) {
            return Err(PsuError::Config(format!(
                "{}: survey_month {} outside 1-12",
                self.key, self.survey_month
            )));
        }
        Ok(())
    }
}

/// Look up a country by key or acronym, case-insensitively.
pub fn find<'a>(countries: &'a [Country], name: &str) -> Result<&'a Country> {
    countries
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(name) || c.acronym.eq_ignore_ascii_case(name))
        .ok_or_else(|| PsuError::UnknownCountry(name.to_string()))
}

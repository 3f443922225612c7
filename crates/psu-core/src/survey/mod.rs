//! Survey variable extraction.
//!
//! Pipeline per country:
//!   select & normalize → farmer indicator → ethnic power rank →
//!   domain masking → identifiers appended → outcome finalization.

pub mod codebook;
pub mod derive;
pub mod finalize;
pub mod mask;
pub mod ranking;
pub mod select;
pub mod table;

use std::path::PathBuf;

use log::{debug, info};

use crate::config::DataPaths;
use crate::country::Country;
use crate::error::Result;

use codebook::Codebook;
use derive::{ethnic_power_rank, head_farmer_indicator};
use finalize::zero_missing_outcomes;
use mask::apply_domains;
use ranking::EthnicRanking;
use select::{select_identifiers, select_questions};
use table::SurveyTable;

/// Turn one country's raw survey table into the cleaned variable table.
/// Row order is preserved.
pub fn extract(raw: &SurveyTable, country: &Country, codebook: &Codebook) -> Result<SurveyTable> {
    let ranking = EthnicRanking::for_country(&country.key)?;
    let mut table = select_questions(raw, codebook, &country.key)?;
    let identifiers = select_identifiers(raw, codebook, &country.key)?;

    head_farmer_indicator(&mut table, &codebook.occupation)?;
    ethnic_power_rank(&mut table, &codebook.ethnic, &ranking)?;

    for (code, n) in apply_domains(&mut table, &codebook.domains) {
        if n > 0 {
            debug!("{}: masked {} invalid {} responses", country.key, n, code);
        }
    }

    for col in identifiers {
        table.push(col)?;
    }
    zero_missing_outcomes(&mut table, &codebook.outcomes);
    Ok(table)
}

/// Read, extract and write one country. Returns the output path.
pub fn run_country(paths: &DataPaths, country: &Country, codebook: &Codebook) -> Result<PathBuf> {
    let input = paths.survey_input(country);
    info!("{}: reading {}", country.key, input.display());
    let raw = SurveyTable::read_path(&input)?;
    let cleaned = extract(&raw, country, codebook)?;
    let output = paths.survey_output(country);
    cleaned.write_csv_path(&output)?;
    info!(
        "{}: {} respondents × {} columns → {}",
        country.key,
        cleaned.n_rows(),
        cleaned.columns().len(),
        output.display()
    );
    Ok(output)
}

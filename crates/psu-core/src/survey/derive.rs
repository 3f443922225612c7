//! Composite variables built from raw responses.

use crate::error::{PsuError, Result};
use crate::survey::codebook::{EthnicRule, OccupationRule};
use crate::survey::ranking::EthnicRanking;
use crate::survey::table::{Cell, SurveyTable};

fn missing_column(code: &str) -> PsuError {
    PsuError::MissingColumn {
        country: "selected table".into(),
        code: code.to_string(),
    }
}

/// Resolved household-head occupation for one respondent.
fn head_code(head: &Cell, own: &Cell, rule: &OccupationRule) -> Option<i64> {
    let v = head.as_f64()?;
    let v = if v == rule.proxy_code as f64 { own.as_f64()? } else { v };
    if v.fract() != 0.0 {
        return None;
    }
    let code = v as i64;
    (rule.valid.0..=rule.valid.1).contains(&code).then_some(code)
}

/// Replace the head-of-household occupation column with a farmer indicator
/// (1 farmer, 0 other, missing when unresolvable) and drop the respondent's
/// own occupation column.
pub fn head_farmer_indicator(table: &mut SurveyTable, rule: &OccupationRule) -> Result<()> {
    let own = table.remove(rule.own).ok_or_else(|| missing_column(rule.own))?;
    let head = table.column_mut(rule.head).ok_or_else(|| missing_column(rule.head))?;
    for (h, o) in head.cells.iter_mut().zip(own.cells.iter()) {
        *h = match head_code(h, o, rule) {
            Some(code) if code == rule.farmer_code => Cell::Number(1.0),
            Some(_) => Cell::Number(0.0),
            None => Cell::Missing,
        };
    }
    Ok(())
}

/// Recode raw ethnic-group codes into power ranks in place.
pub fn ethnic_power_rank(table: &mut SurveyTable, rule: &EthnicRule, ranking: &EthnicRanking) -> Result<()> {
    let col = table.column_mut(rule.column).ok_or_else(|| missing_column(rule.column))?;
    for cell in col.cells.iter_mut() {
        *cell = match cell.as_f64().and_then(|v| ranking.rank(v, rule.sentinel)) {
            Some(rank) => Cell::Number(f64::from(rank)),
            None => Cell::Missing,
        };
    }
    Ok(())
}

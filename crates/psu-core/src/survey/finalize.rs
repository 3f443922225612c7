//! Outcome finalization: a non-substantive answer to a fear question is
//! recorded as "did not report fear" (0) rather than left missing.

use crate::survey::table::{Cell, SurveyTable};

pub fn zero_missing_outcomes(table: &mut SurveyTable, outcomes: &[&str]) {
    for code in outcomes {
        if let Some(col) = table.column_mut(code) {
            for cell in col.cells.iter_mut().filter(|c| c.is_missing()) {
                *cell = Cell::Number(0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outcome_columns_are_filled() {
        let mut t = SurveyTable::from_rows(
            vec!["Q54a".into(), "Q1".into()],
            vec![
                vec![Cell::Missing, Cell::Missing],
                vec![Cell::Number(2.0), Cell::Number(40.0)],
            ],
        );
        zero_missing_outcomes(&mut t, &["Q54a", "Q54b"]);
        assert_eq!(t.column("Q54a").unwrap().cells, vec![Cell::Number(0.0), Cell::Number(2.0)]);
        assert_eq!(t.column("Q1").unwrap().cells, vec![Cell::Missing, Cell::Number(40.0)]);
    }
}

//! Value-domain masking.

use crate::survey::codebook::Domain;
use crate::survey::table::{Cell, SurveyTable};

/// Mask every value outside its column's domain. Columns without a declared
/// domain are untouched; domains for absent columns are skipped. Returns the
/// number of cells masked per column, in `domains` order.
pub fn apply_domains(table: &mut SurveyTable, domains: &[(&str, Domain)]) -> Vec<(String, usize)> {
    let mut masked = Vec::with_capacity(domains.len());
    for (code, domain) in domains {
        let Some(col) = table.column_mut(code) else {
            continue;
        };
        let mut n = 0usize;
        for cell in col.cells.iter_mut() {
            let valid = match cell {
                Cell::Missing => continue,
                Cell::Number(v) => domain.contains(*v),
                Cell::Text(_) => false,
            };
            if !valid {
                *cell = Cell::Missing;
                n += 1;
            }
        }
        masked.push((code.to_string(), n));
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SurveyTable {
        SurveyTable::from_rows(
            vec!["Q1".into(), "Q3".into(), "Respondent".into()],
            vec![
                vec![Cell::Number(34.0), Cell::Number(1.0), Cell::Number(9.0)],
                vec![Cell::Number(999.0), Cell::Number(9.0), Cell::Number(8.0)],
                vec![Cell::Text("n/a".into()), Cell::Missing, Cell::Number(-1.0)],
            ],
        )
    }

    #[test]
    fn out_of_domain_values_become_missing() {
        let mut t = table();
        let report = apply_domains(&mut t, &[("Q1", Domain::Range(18, 129)), ("Q3", Domain::Set(&[1, 2]))]);
        assert_eq!(
            t.column("Q1").unwrap().cells,
            vec![Cell::Number(34.0), Cell::Missing, Cell::Missing]
        );
        assert_eq!(
            t.column("Q3").unwrap().cells,
            vec![Cell::Number(1.0), Cell::Missing, Cell::Missing]
        );
        assert_eq!(report, vec![("Q1".to_string(), 2), ("Q3".to_string(), 1)]);
    }

    #[test]
    fn undeclared_columns_pass_through() {
        let mut t = table();
        let before = t.column("Respondent").unwrap().clone();
        apply_domains(&mut t, &[("Q1", Domain::Range(18, 129)), ("Q999", Domain::Set(&[1]))]);
        assert_eq!(t.column("Respondent").unwrap(), &before);
    }

    #[test]
    fn masking_is_idempotent() {
        let domains = [("Q1", Domain::Range(18, 129)), ("Q3", Domain::Set(&[1, 2]))];
        let mut once = table();
        apply_domains(&mut once, &domains);
        let mut twice = once.clone();
        apply_domains(&mut twice, &domains);
        assert_eq!(once, twice);
    }
}

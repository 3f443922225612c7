//! Column selection with cross-country header normalization.

use crate::error::{PsuError, Result};
use crate::survey::codebook::{Codebook, GENDER_CODE, GENDER_HEADER};
use crate::survey::table::{Column, SurveyTable};

/// Canonical question code for a raw header, or `None` for non-question
/// columns. `"Q4b. Your present living conditions"` → `"Q4b"`.
pub fn canonical_code(header: &str) -> Option<&str> {
    let h = header.trim();
    if h == GENDER_HEADER {
        return Some(GENDER_CODE);
    }
    if !h.starts_with('Q') {
        return None;
    }
    h.split(". ").next().map(str::trim)
}

fn unique_match<'a>(
    table: &'a SurveyTable,
    country: &str,
    code: &str,
    matches: impl Fn(&str) -> bool,
) -> Result<&'a Column> {
    let mut found = table.columns().iter().filter(|c| matches(&c.name));
    let first = found.next().ok_or_else(|| PsuError::MissingColumn {
        country: country.to_string(),
        code: code.to_string(),
    })?;
    let extra = found.count();
    if extra > 0 {
        return Err(PsuError::AmbiguousColumn {
            country: country.to_string(),
            code: code.to_string(),
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Project the allow-listed questions, renamed to their canonical codes, in
/// codebook order.
pub fn select_questions(raw: &SurveyTable, codebook: &Codebook, country: &str) -> Result<SurveyTable> {
    let mut out = SurveyTable::new(raw.n_rows());
    for code in codebook.codes() {
        let col = unique_match(raw, country, code, |h| canonical_code(h) == Some(code))?;
        out.push(col.clone().renamed(code))?;
    }
    Ok(out)
}

/// Identifier, weight and location columns under their output names.
pub fn select_identifiers(raw: &SurveyTable, codebook: &Codebook, country: &str) -> Result<Vec<Column>> {
    codebook
        .identifiers
        .iter()
        .map(|(source, name)| {
            unique_match(raw, country, source, |h| h.trim() == *source).map(|c| c.clone().renamed(*name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::table::Cell;

    #[test]
    fn canonical_code_strips_wording() {
        assert_eq!(canonical_code("Q4b. Your present living conditions"), Some("Q4b"));
        assert_eq!(canonical_code("Q96c. Occupation of head of household"), Some("Q96c"));
        assert_eq!(canonical_code("Q54a"), Some("Q54a"));
        assert_eq!(canonical_code("This interview, gender"), Some("Q0"));
        assert_eq!(canonical_code("Respondent number"), None);
    }

    fn raw(headers: &[&str]) -> SurveyTable {
        let row = headers.iter().enumerate().map(|(i, _)| Cell::Number(i as f64)).collect();
        SurveyTable::from_rows(headers.iter().map(|h| h.to_string()).collect(), vec![row])
    }

    #[test]
    fn missing_code_is_a_schema_error() {
        let t = raw(&["This interview, gender", "Q1. Age"]);
        let err = select_questions(&t, &Codebook::round8(), "kenya").unwrap_err();
        match err {
            PsuError::MissingColumn { country, code } => {
                assert_eq!(country, "kenya");
                assert_eq!(code, "Q3");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_spelling_is_ambiguous() {
        let mut cb = Codebook::round8();
        cb.questions.truncate(2);
        let t = raw(&["This interview, gender", "Q1. Age", "Q1. Age (years)"]);
        assert!(matches!(
            select_questions(&t, &cb, "nigeria"),
            Err(PsuError::AmbiguousColumn { count: 2, .. })
        ));
    }

    #[test]
    fn selection_follows_codebook_order() {
        let mut cb = Codebook::round8();
        cb.questions.truncate(3);
        let t = raw(&["Q3. Overall direction of the country", "Respondent number", "Q1. Age", "This interview, gender"]);
        let sel = select_questions(&t, &cb, "ethiopia").unwrap();
        assert_eq!(sel.headers().collect::<Vec<_>>(), vec!["Q0", "Q1", "Q3"]);
        assert_eq!(sel.column("Q3").unwrap().cells, vec![Cell::Number(0.0)]);
    }

    #[test]
    fn identifiers_are_renamed() {
        let cb = Codebook::round8();
        let headers: Vec<&str> = cb.identifiers.iter().map(|(s, _)| *s).collect();
        let ids = select_identifiers(&raw(&headers), &cb, "kenya").unwrap();
        let names: Vec<&str> = ids.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Respondent", "EA_Num", "EA_weight", "HH_weight", "Latitude", "Longitude"]);
    }
}

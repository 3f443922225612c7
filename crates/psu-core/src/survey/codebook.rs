//! Static Round 8 codebook: which questions are extracted, their valid
//! response codes, and the parameters of the derived variables.

/// A question kept for analysis. `label` is the questionnaire wording after
/// the code, kept for documentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub code: &'static str,
    pub label: &'static str,
}

const fn q(code: &'static str, label: &'static str) -> Question {
    Question { code, label }
}

/// Valid response codes of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Set(&'static [i64]),
    /// Inclusive integer range.
    Range(i64, i64),
}

impl Domain {
    /// Only integral values can be valid codes.
    pub fn contains(&self, v: f64) -> bool {
        if v.fract() != 0.0 || !v.is_finite() {
            return false;
        }
        let code = v as i64;
        match self {
            Domain::Set(codes) => codes.contains(&code),
            Domain::Range(lo, hi) => (*lo..=*hi).contains(&code),
        }
    }
}

/// Parameters of the household-head farmer indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupationRule {
    /// Head-of-household occupation column, overwritten with the indicator.
    pub head: &'static str,
    /// Respondent occupation column, consumed and dropped.
    pub own: &'static str,
    /// Head code meaning "respondent is the head": use the respondent's own code.
    pub proxy_code: i64,
    pub farmer_code: i64,
    /// Substantive occupation codes; anything else is missing.
    pub valid: (i64, i64),
}

/// Parameters of the ethnic power recode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthnicRule {
    pub column: &'static str,
    /// Codes at or above this value are non-substantive ("other", refused, don't know).
    pub sentinel: i64,
}

#[derive(Debug, Clone)]
pub struct Codebook {
    pub questions: Vec<Question>,
    pub domains: Vec<(&'static str, Domain)>,
    /// Outcome columns whose missing values are reported as 0.
    pub outcomes: Vec<&'static str>,
    pub occupation: OccupationRule,
    pub ethnic: EthnicRule,
    /// Identifier/weight/location columns: (source header, output name).
    pub identifiers: Vec<(&'static str, &'static str)>,
}

/// Header of the interview-gender column, which carries no question number.
pub const GENDER_HEADER: &str = "This interview, gender";
pub const GENDER_CODE: &str = "Q0";

impl Codebook {
    pub fn round8() -> Self {
        Self {
            questions: vec![
                q("Q0", "This interview, gender"),
                q("Q1", "Age"),
                q("Q3", "Overall direction of the country"),
                q("Q4b", "Your present living conditions"),
                q("Q5", "Treated unfairly by government based on economic status"),
                q("Q7a", "How often gone without food"),
                q("Q10a", "Freedom to say what you think"),
                q("Q43a", "Level of corruption"),
                q("Q54a", "Feared violence in neighbourhood"),
                q("Q54b", "Feared violence during public protest"),
                q("Q54c", "Feared violence by extremists"),
                q("Q56", "How free is news media"),
                q("Q81", "Ethnic community, cultural group or tribe"),
                q("Q82a", "Ethnic group treated unfairly by government"),
                q("Q84a", "Unfair treatment by other people based on economic status"),
                q("Q84b", "Unfair treatment by other people based on religion"),
                q("Q84c", "Unfair treatment by other people based on ethnicity"),
                q("Q88", "Who traditional leaders serve"),
                q("Q95c", "Occupation of respondent"),
                q("Q96c", "Occupation of head of household"),
                q("Q97", "Education of respondent"),
                q("Q98b", "Religious group treated unfairly by government"),
            ],
            domains: vec![
                ("Q0", Domain::Set(&[1, 2])),
                ("Q1", Domain::Range(18, 129)),
                ("Q3", Domain::Set(&[1, 2])),
                ("Q4b", Domain::Set(&[1, 2, 3, 4, 5])),
                ("Q5", Domain::Set(&[0, 1, 2, 3])),
                ("Q7a", Domain::Set(&[0, 1, 2, 3, 4])),
                ("Q10a", Domain::Set(&[1, 2, 3, 4])),
                ("Q43a", Domain::Set(&[1, 2, 3, 4, 5])),
                ("Q54a", Domain::Set(&[0, 1, 2])),
                ("Q54b", Domain::Set(&[0, 1, 2])),
                ("Q54c", Domain::Set(&[0, 1, 2])),
                ("Q56", Domain::Set(&[0, 1, 2, 3])),
                ("Q81", Domain::Set(&[1, 2, 3, 4])),
                ("Q82a", Domain::Set(&[0, 1, 2, 3])),
                ("Q84a", Domain::Set(&[0, 1, 2, 3])),
                ("Q84b", Domain::Set(&[0, 1, 2, 3])),
                ("Q84c", Domain::Set(&[0, 1, 2, 3])),
                ("Q88", Domain::Set(&[1, 2, 3])),
                ("Q96c", Domain::Set(&[0, 1])),
                ("Q97", Domain::Range(0, 9)),
                ("Q98b", Domain::Set(&[0, 1, 2, 3])),
            ],
            outcomes: vec!["Q54a", "Q54b", "Q54c"],
            occupation: OccupationRule {
                head: "Q96c",
                own: "Q95c",
                proxy_code: 97,
                farmer_code: 3,
                valid: (0, 12),
            },
            ethnic: EthnicRule {
                column: "Q81",
                sentinel: 9990,
            },
            identifiers: vec![
                ("Respondent number", "Respondent"),
                ("EA Unique Number", "EA_Num"),
                (
                    "within country weighting factor, weights to EA level (\"old AB withinwt\")",
                    "EA_weight",
                ),
                (
                    "within country weighting factor, weights to HH level (\"new AB withinwt\")",
                    "HH_weight",
                ),
                ("GPS Latitude in EA", "Latitude"),
                ("GPS Longitude in EA", "Longitude"),
            ],
        }
    }

    pub fn domain(&self, code: &str) -> Option<&Domain> {
        self.domains.iter().find(|(c, _)| *c == code).map(|(_, d)| d)
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.questions.iter().map(|q| q.code)
    }
}

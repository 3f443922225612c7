//! Ethnic Power Relations rankings for the Round 8 ethnic-group codes.
//!
//! Ranks are ordinal (1 = most excluded … 4 = most powerful). `None` marks
//! codes that exist in the questionnaire but have no ranking.

use std::collections::BTreeMap;

use crate::error::{PsuError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthnicRanking {
    entries: BTreeMap<i64, Option<u8>>,
    /// Rank given to codes above the highest tabulated code.
    fallback: u8,
}

const KENYA: &[(i64, Option<u8>)] = &[
    (1, None),
    (4, None),
    (300, Some(4)),
    (301, Some(2)),
    (302, Some(2)),
    (303, Some(2)),
    (304, Some(4)),
    (305, Some(3)),
    (306, Some(4)),
    (307, Some(4)),
    (308, Some(3)),
    (309, Some(2)),
    (310, Some(1)),
    (311, Some(2)),
    (312, Some(4)),
];

const SOUTH_AFRICA: &[(i64, Option<u8>)] = &[
    (700, Some(4)),
    (701, Some(4)),
    (702, Some(4)),
    (703, Some(4)),
    (704, Some(4)),
    (705, Some(4)),
    (706, Some(4)),
    (707, Some(4)),
    (708, Some(4)),
    (709, Some(4)),
    (710, Some(4)),
    (711, Some(4)),
    (712, Some(4)),
];

const NIGERIA: &[(i64, Option<u8>)] = &[
    (620, Some(4)),
    (621, Some(3)),
    (622, Some(3)),
    (623, Some(2)),
    (624, Some(2)),
    (625, Some(4)),
    (626, Some(2)),
    (627, Some(2)),
    (628, Some(2)),
    (629, Some(2)),
    (630, Some(2)),
    (631, Some(2)),
    (632, Some(2)),
    (633, Some(2)),
    (634, Some(2)),
    (635, Some(2)),
    (636, Some(2)),
    (637, Some(2)),
    (638, Some(2)),
    (639, Some(2)),
    (640, Some(2)),
    (641, Some(2)),
    (642, Some(2)),
    (643, Some(2)),
    (644, Some(2)),
];

const ETHIOPIA: &[(i64, Option<u8>)] = &[
    (1340, Some(4)),
    (1341, Some(3)),
    (1342, Some(3)),
    (1343, Some(4)),
    (1344, Some(1)),
    (1345, Some(3)),
    (1346, Some(3)),
    (1347, Some(3)),
    (1348, Some(3)),
    (1349, Some(3)),
    (1350, Some(3)),
    (1351, Some(3)),
    (1352, Some(3)),
    (1353, Some(3)),
    (1354, Some(3)),
    (1355, Some(3)),
    (1356, Some(2)),
    (1357, Some(2)),
    (1358, Some(2)),
    (1359, Some(3)),
    (1360, Some(3)),
];

impl EthnicRanking {
    pub fn new(entries: &[(i64, Option<u8>)], fallback: u8) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
            fallback,
        }
    }

    /// Ranking table for a Round 8 country key.
    pub fn for_country(key: &str) -> Result<Self> {
        match key {
            "kenya" => Ok(Self::new(KENYA, 2)),
            "southafrica" => Ok(Self::new(SOUTH_AFRICA, 4)),
            "nigeria" => Ok(Self::new(NIGERIA, 2)),
            "ethiopia" => Ok(Self::new(ETHIOPIA, 2)),
            other => Err(PsuError::MissingRanking(other.to_string())),
        }
    }

    pub fn max_code(&self) -> i64 {
        self.entries.keys().next_back().copied().unwrap_or(i64::MIN)
    }

    pub fn fallback(&self) -> u8 {
        self.fallback
    }

    /// Rank of a raw ethnic-group code. Codes at or above `sentinel` are
    /// non-substantive and yield `None` before any other rule applies.
    pub fn rank(&self, code: f64, sentinel: i64) -> Option<u8> {
        if code.fract() != 0.0 || !code.is_finite() {
            return None;
        }
        let code = code as i64;
        if code >= sentinel {
            return None;
        }
        if code > self.max_code() {
            return Some(self.fallback);
        }
        self.entries.get(&code).copied().flatten()
    }
}

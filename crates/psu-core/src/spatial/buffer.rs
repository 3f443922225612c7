//! Buffer variants of the sampling-unit footprints.
//!
//! Buffers are computed upstream; a variant only names which pre-computed
//! layer to read and how its outputs are labelled.

use std::fmt;

use crate::config::BufferSets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferVariant {
    /// The unbuffered PSU polygon.
    Polygon,
    /// Fixed-distance buffer in kilometres.
    Distance(u32),
    /// Buffer whose area is the given percentage of the polygon's.
    Percent(u32),
}

impl BufferVariant {
    /// Label used in output file names: `poly`, `5km`, `200`.
    pub fn label(&self) -> String {
        match self {
            BufferVariant::Polygon => "poly".to_string(),
            BufferVariant::Distance(km) => format!("{km}km"),
            BufferVariant::Percent(p) => p.to_string(),
        }
    }

    /// Name of the vector layer holding this variant for a country.
    pub fn layer_name(&self, acronym: &str) -> String {
        match self {
            BufferVariant::Polygon => format!("{acronym}_R8_PSU_polys"),
            _ => format!("{acronym}_R8_PSU_{}_buffers", self.label()),
        }
    }
}

impl fmt::Display for BufferVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Which family of variants a run covers. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferMode {
    #[default]
    Polygon,
    Distance,
    Percent,
}

impl BufferMode {
    pub fn variants(self, sets: &BufferSets) -> Vec<BufferVariant> {
        match self {
            BufferMode::Polygon => vec![BufferVariant::Polygon],
            BufferMode::Distance => sets.kms.iter().map(|&k| BufferVariant::Distance(k)).collect(),
            BufferMode::Percent => sets.percents.iter().map(|&p| BufferVariant::Percent(p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_layers() {
        assert_eq!(BufferVariant::Polygon.label(), "poly");
        assert_eq!(BufferVariant::Distance(10).label(), "10km");
        assert_eq!(BufferVariant::Percent(750).label(), "750");
        assert_eq!(BufferVariant::Polygon.layer_name("NIG"), "NIG_R8_PSU_polys");
        assert_eq!(BufferVariant::Percent(200).layer_name("SAF"), "SAF_R8_PSU_200_buffers");
    }

    #[test]
    fn modes_expand_to_configured_sets() {
        let sets = BufferSets::default();
        assert_eq!(BufferMode::default().variants(&sets), vec![BufferVariant::Polygon]);
        let kms = BufferMode::Distance.variants(&sets);
        assert_eq!(kms.len(), 6);
        assert_eq!(kms[0], BufferVariant::Distance(1));
        assert_eq!(kms[5], BufferVariant::Distance(50));
        let pct = BufferMode::Percent.variants(&sets);
        assert_eq!(pct.last(), Some(&BufferVariant::Percent(1000)));
    }
}

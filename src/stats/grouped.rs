use std::{collections::BTreeMap, fmt};

use anyhow::Result;
use polars::prelude::*;
use tracing::warn;

use crate::{common, stats::{DecileClassifier, EmptyQuantile}};

/// Grouping of scenario rows that are ranked together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub iso3: String,
    pub scenario: String,
    pub strategy: String,
    pub confidence: String,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.iso3, self.scenario, self.strategy, self.confidence)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRow {
    pub key: GroupKey,
    pub id: String,
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub key: GroupKey,
    pub error: EmptyQuantile,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedClassification {
    /// Label per input row; `None` for positive-density rows of groups that
    /// could not be binned.
    pub labels: Vec<Option<u8>>,
    pub failures: Vec<GroupFailure>,
}

impl DecileClassifier {
    /// Eleven-bucket labelling per [`GroupKey`]: rows with zero density get 0,
    /// the remaining rows of the group are ranked into deciles 10..=100.
    pub fn classify_grouped(&self, rows: &[ScenarioRow]) -> GroupedClassification {
        let mut groups: BTreeMap<&GroupKey, Vec<usize>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            groups.entry(&row.key).or_default().push(i);
        }

        let mut result = GroupedClassification { labels: vec![None; rows.len()], failures: Vec::new() };
        for (key, members) in groups {
            let (positive, zero): (Vec<usize>, Vec<usize>) = members.into_iter()
                .partition(|&i| rows[i].density > 0.0);

            for i in zero { result.labels[i] = Some(0) }
            if positive.is_empty() {
                continue;
            }

            let densities: Vec<_> = positive.iter().map(|&i| rows[i].density).collect();
            match self.labels(&densities) {
                Ok(labels) => {
                    for (&i, label) in positive.iter().zip(labels) { result.labels[i] = Some(label) }
                }
                Err(error) => {
                    warn!(group = %key, %error, "served regions of group left unclassified");
                    result.failures.push(GroupFailure { key: key.clone(), error });
                }
            }
        }
        result
    }
}

/// Read scenario rows (`GID_0, scenario, strategy, confidence, GID_id,
/// population_km2`), label them, and return the input table with a `decile`
/// column appended (empty for the unbinned rows of failed groups).
pub fn classify_groups_csv(bytes: &[u8]) -> Result<(Vec<u8>, Vec<GroupFailure>)> {
    let key_columns = ["GID_0", "scenario", "strategy", "confidence", "GID_id"];
    let dtypes: Vec<_> = key_columns.iter().map(|&c| (c, DataType::String)).collect();
    let mut df = common::read_from_csv_bytes(bytes, &dtypes)?;

    let iso3 = common::string_column(&df, "GID_0")?;
    let scenario = common::string_column(&df, "scenario")?;
    let strategy = common::string_column(&df, "strategy")?;
    let confidence = common::string_column(&df, "confidence")?;
    let ids = common::string_column(&df, "GID_id")?;
    let density = common::f64_column(&df, "population_km2")?;

    let rows: Vec<_> = (0..df.height())
        .map(|i| ScenarioRow {
            key: GroupKey {
                iso3: iso3[i].clone(),
                scenario: scenario[i].clone(),
                strategy: strategy[i].clone(),
                confidence: confidence[i].clone(),
            },
            id: ids[i].clone(),
            density: density[i].unwrap_or(0.0),
        })
        .collect();

    let classified = DecileClassifier::new().classify_grouped(&rows);
    df.with_column(Column::new(
        "decile".into(),
        classified.labels.iter().map(|l| l.map(i64::from)).collect::<Vec<_>>(),
    ))?;

    Ok((common::write_to_csv_bytes(&df)?, classified.failures))
}

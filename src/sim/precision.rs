//! numeric precisions and the per-precision scale factors resolved from an [`ArchConfig`](crate::settings::ArchConfig)

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use eyre::{bail, Report};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// the numeric representation of operands fed to the compute array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Precision {
    Fp16,
    Int9,
    Int8,
    Int4,
}

impl Default for Precision {
    fn default() -> Self {
        Precision::Fp16
    }
}

impl Precision {
    /// the key used in config files
    pub fn key(&self) -> &'static str {
        match self {
            Precision::Fp16 => "fp16",
            Precision::Int9 => "int9",
            Precision::Int8 => "int8",
            Precision::Int4 => "int4",
        }
    }
}

impl FromStr for Precision {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "fp16" => Precision::Fp16,
            "int9" => Precision::Int9,
            "int8" => Precision::Int8,
            "int4" => Precision::Int4,
            _ => bail!("unknown precision {s:?}"),
        })
    }
}

impl TryFrom<String> for Precision {
    type Error = Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Precision::Fp16 => "FP16",
            Precision::Int9 => "INT9",
            Precision::Int8 => "INT8",
            Precision::Int4 => "INT4",
        };
        write!(f, "{name}")
    }
}

/// all the table entries of one precision, looked up once per run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionParams {
    pub precision: Precision,
    pub bits_per_element: u32,
    /// MACs packed per MAC unit per cycle, relative to FP16
    pub density_scale: f64,
    /// energy of one MAC relative to an FP16 MAC
    pub mac_energy_scale: f64,
}

/// write a precision-keyed table with plain string keys, toml rejects enum keys
pub(crate) fn serialize_table<S, V>(
    table: &BTreeMap<Precision, V>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_map(table.iter().map(|(precision, value)| (precision.key(), value)))
}

/// read a precision-keyed table, keys are matched case-insensitively
pub(crate) fn deserialize_table<'de, D, V>(deserializer: D) -> Result<BTreeMap<Precision, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    BTreeMap::<String, V>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            key.parse::<Precision>()
                .map(|precision| (precision, value))
                .map_err(|e| D::Error::custom(e.to_string()))
        })
        .collect()
}

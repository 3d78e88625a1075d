use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One bike location row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "Vehicle Number")]
    pub vehicle_number: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "GDP_PPP", deserialize_with = "deserialize_optional_f64")]
    pub gdp_ppp: Option<f64>,
    #[serde(rename = "Population_Density", deserialize_with = "deserialize_optional_f64")]
    pub population_density: Option<f64>,
}

// pandas' default `na_values`
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn deserialize_optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed) {
        return Ok(None);
    }
    let value = trimmed
        .parse::<f64>()
        .map_err(|e| serde::de::Error::custom(format!("invalid number '{}': {}", trimmed, e)))?;
    // Other NaN spellings the float parser accepts (`NAN`, `+nan`, ...)
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Numeric columns of the bike location table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    Latitude,
    Longitude,
    GdpPpp,
    PopulationDensity,
}

impl Column {
    /// Order used by the summary table.
    pub const ALL: [Column; 4] = [
        Column::Latitude,
        Column::Longitude,
        Column::GdpPpp,
        Column::PopulationDensity,
    ];

    /// Header name in the source CSV.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Latitude => "Latitude",
            Column::Longitude => "Longitude",
            Column::GdpPpp => "GDP_PPP",
            Column::PopulationDensity => "Population_Density",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::Latitude => "Latitude",
            Column::Longitude => "Longitude",
            Column::GdpPpp => "GDP (PPP)",
            Column::PopulationDensity => "Population Density",
        }
    }

    pub fn value(&self, record: &Record) -> Option<f64> {
        match self {
            Column::Latitude => Some(record.latitude),
            Column::Longitude => Some(record.longitude),
            Column::GdpPpp => record.gdp_ppp,
            Column::PopulationDensity => record.population_density,
        }
    }

    /// Slug used for HTML element ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::GdpPpp => "gdp_ppp",
            Column::PopulationDensity => "population_density",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// All records loaded from one CSV file, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-missing values of `column`, in record order.
    pub fn values(&self, column: Column) -> Vec<f64> {
        self.records.iter().filter_map(|r| column.value(r)).collect()
    }
}

/// Formats an optional value the way the dashboard prints it (`nan` when missing).
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format_float(v),
        None => "nan".to_string(),
    }
}

// Shortest round-trip digits; exponents carry a sign and at least two digits (`1e+16`, `1.5e-05`).
fn format_float(value: f64) -> String {
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => debug,
    }
}

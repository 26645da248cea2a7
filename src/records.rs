use anyhow::Context;
use serde::Deserialize;
use std::{collections::HashMap, fs::File, path::Path};

// Field names as they appear in the extract header.
pub const FIELD_DATE: &str = "fecha";
pub const FIELD_PRODUCT: &str = "producto";
pub const FIELD_QUANTITY: &str = "cantidad";
pub const FIELD_UNIT_PRICE: &str = "precio_unitario";

/// One sales transaction as read from the extract: field name to raw
/// string value. A field is absent when the extract lacks its column.
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(transparent)]
pub struct SaleRecord {
    fields: HashMap<String, String>,
}

impl SaleRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        SaleRecord {
            fields: pairs
                .iter()
                .map(|&(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        }
    }
}

pub fn read_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<SaleRecord>> {
    let file = File::open(&path)
        .with_context(|| format!("cannot open sales extract {}", path.as_ref().display()))?;
    // The CSV reader is buffered automatically, so it does not need to
    // be wrapped in an io::BufReader.
    let mut rdr = csv::Reader::from_reader(file);

    let records = rdr
        .deserialize::<SaleRecord>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("malformed sales extract {}", path.as_ref().display()))?;

    Ok(records)
}

use serde::{Deserialize, Serialize};

/// One input row: a company with its market capitalization, grouped by country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub symbol: String,
    pub name: String,
    pub marketcap: f64,
    pub country: String,
}

/// Accessor strategy for chart elements. The chart is polymorphic over the
/// row type; anything that can yield a key, display name, weight, group key
/// and icon path can be laid out.
pub trait Datum {
    fn key(&self) -> &str;
    fn name(&self) -> &str;
    fn value(&self) -> f64;
    fn group(&self) -> &str;
    fn icon_path(&self) -> String;
}

impl Datum for Record {
    fn key(&self) -> &str {
        &self.symbol
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> f64 {
        self.marketcap
    }

    fn group(&self) -> &str {
        &self.country
    }

    fn icon_path(&self) -> String {
        format!("company-logos/{}.webp", self.symbol)
    }
}

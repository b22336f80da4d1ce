use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("dataset is empty")]
    EmptyDataset,
    #[error("total value is zero; nothing to tessellate")]
    ZeroTotal,
    #[error("record `{key}` has negative value {value}")]
    NegativeValue { key: String, value: f64 },
    #[error("record `{key}` has a non-finite value")]
    NonFiniteValue { key: String },
}

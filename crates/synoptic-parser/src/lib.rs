mod cells;
pub mod discharge;
pub mod errors;
pub mod model;
pub mod schema;
mod table;

pub use discharge::{load_discharge, parse_discharge};
pub use errors::LoadError;
pub use model::{
    DischargeRecord, Fraction, FractionValues, HydroPeriod, Measurement, SampleRow, SampleTable,
    Sentinel, SentinelSet, SiteId,
};
pub use schema::TableKind;
pub use table::{load_table, parse_table};

#[cfg(test)]
mod tests;

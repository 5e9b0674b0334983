//! Loading, validation and aggregation for the health graduate gender-gap
//! datasets (graduates by region, occupations, earnings).

pub mod catalog;
pub mod config;
pub mod data;
pub mod error;
pub mod sample;
pub mod state;
pub mod views;

pub use catalog::Catalog;
pub use config::{Config, Rq};
pub use data::loader::{load_table, LoadOptions, Strictness};
pub use data::model::{Gender, Table, Value};
pub use data::schema::{ColumnSpec, ColumnType, Schema};
pub use error::{LoadError, QueryError, SchemaProblem};

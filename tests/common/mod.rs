//! Common test utilities for sheetgraph integration tests
//!
//! Builders for the reaction/molecule workbooks the tests share, in memory
//! and as real `.xlsx` / `.csv` uploads.

#![allow(dead_code)]

pub mod upload;
pub mod workbook;

pub use upload::{reaction_csv, reaction_xlsx};
pub use workbook::{measurement_workbook, reaction_workbook, substrate_schema};

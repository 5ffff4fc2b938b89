//! Conversion module.
//!
//! This module handles question bank to quiz template conversion:
//! - Grouper: Tagged rows to question groups
//! - Mapper: Question groups to quiz records
//! - Pipeline: Main conversion pipeline

pub mod grouper;
pub mod mapper;
pub mod pipeline;

pub use grouper::{group_rows, Grouping};
pub use mapper::{map_group, parse_correct_flag, FieldMapper, MappedQuestion};
pub use pipeline::*;

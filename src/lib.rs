//! Copies tabular/geospatial datasets from a CARTO account into a
//! PostgreSQL/PostGIS database, driven by a JSON configuration file.
//!
//! The flow is strictly linear: load config, then for each configured table
//! download it through the CARTO SQL API, decode the CSV payload and write
//! it to the destination schema.

pub mod application;
pub mod config;
pub mod domain;
pub mod etl_service;
pub mod infrastructure;

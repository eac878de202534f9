pub mod batch;
pub mod categorizer;
pub mod columns;
pub mod converter;
pub mod db;
pub mod detector;
pub mod error;
pub mod fields;
pub mod fmt;
pub mod importer;
pub mod models;
pub mod pipeline;
pub mod settings;
pub mod tokenizer;
pub mod workbook;

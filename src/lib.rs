//! sbmlgraph - SBML models in a property graph
//!
//! Synchronizes tagged model subgraphs into Neo4j with replace-by-tag
//! semantics and scores stored models for structural similarity.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod models;
pub mod repositories;
pub mod services;
pub mod source;

pub use di::FromRef;

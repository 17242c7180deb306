//! Turns a semicolon separated personal-finance export into a flow graph for a Sankey diagram.
//!
//! A [`FlowParser`] selects the rows of one year or month, splits them into an income subset and
//! an issues (expenses) subset, sums the income sources and the expense categories and returns a
//! [`model::RootNode`]. The [`sankey`] module turns that graph into the arrays of a Plotly Sankey
//! trace and an HTML page.

mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod error;
mod fs;
pub mod model;
mod parser;
pub mod sankey;


pub use config::{Config, LastUsed};
pub use error::{Error, Result};
pub use parser::{Columns, FlowParser, Labels};

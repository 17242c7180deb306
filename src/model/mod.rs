//! Types that represent the core data model: the transaction table, filters, categories and
//! the flow graph.
mod amount;
mod category;
mod filter;
mod mapping;
mod node;
mod period;
mod table;

pub use amount::{normalized_sum, Amount, AmountError, AmountFormat};
pub use category::{extract_categories, Category, IssueLevel};
pub use filter::{ColumnFilter, SourceFilter};
pub use mapping::{Mapping, MappingError};
pub use node::{FlowNode, RootNode};
pub use period::Period;
pub use table::{Selection, TransactionTable, DELIMITER, EMPTY_CELL};

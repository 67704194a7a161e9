pub mod data;
pub mod filter;

pub use data::loader::load_file;
pub use data::model::{CellValue, Dataset, Record};
pub use filter::error::{FilterError, FilterResult};
pub use filter::executor::{DatasetExecutor, PredicateExecutor, ResultSet};
pub use filter::predicate::{Predicate, PredicateBuilder, PredicateRegistry};
pub use filter::spec::{ColumnFilter, Combinator, FilterEntry, FilterSpec};
pub use filter::RecordFilter;

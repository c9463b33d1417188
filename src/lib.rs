pub mod common;
pub mod selector;
pub mod sort;

pub use common::models::{FormatRecord, SelectedFormat};
pub use selector::errors::SelectError;
pub use selector::{DEFAULT_EXPR, FormatSelector, SelectorOptions};
pub use sort::{Comparator, SortError, SortOptions};

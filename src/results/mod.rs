pub mod column;
pub mod result_set;
pub mod row;

pub use column::ColumnValue;
pub use result_set::ResultSet;
pub use row::Row;

pub mod types;
pub mod filter;
pub mod filter_where;
pub mod filter_order;
pub mod error;
pub mod pagination;
pub mod property_query;

pub use types::*;
pub use error::FilterError;
pub use filter::Filter;
pub use pagination::{PageMeta, PageQuery, Paginated, Pagination};
pub use property_query::{PropertyListQuery, PropertyFilter};

mod executor;
mod predicate;
mod queryset;
mod value;

pub use executor::Executor;
pub use predicate::{CompareOp, Pattern, Predicate};
pub use queryset::{Direction, OrderBy, QuerySet};
pub use value::{DATE_FORMAT, DATETIME_FORMAT, Row, Value};

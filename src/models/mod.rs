mod budget;
mod transaction;

pub(crate) use budget::Budget;
pub(crate) use transaction::{Transaction, TransactionKind, DATE_FORMAT};

pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod projector;
pub mod query;
pub mod session_store;
pub mod shared;

#[cfg(test)]
pub(crate) mod test_support;

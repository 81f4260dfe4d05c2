#[cfg(test)]
pub(crate) mod memory;
pub mod order_service;
pub mod review_service;

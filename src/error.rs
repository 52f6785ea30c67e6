//! Error taxonomy for cart, inventory and validation operations

/// Failures at the key-value store boundary.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("key-value store unavailable")]
    Unavailable(#[from] sled::Error),
    #[error("failed to decode stored record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("upstream read failed: {0}")]
    Upstream(String),
    #[error("write contention, retries exhausted")]
    Contention,
}

/// Domain failures surfaced to the request boundary.
#[derive(thiserror::Error, Debug)]
pub enum CartError {
    #[error("Failed to find cart")]
    CartNotFound,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Item does not exist in cart")]
    ItemNotFound,
    #[error("Quantity exceeds inventory availability")]
    QuantityExceeded,
    #[error("Unable to save: exceeds max size")]
    CapacityExceeded,
    #[error("Please try again")]
    ServiceUnavailable(#[from] StoreError),
    #[error("{0}")]
    ValidationViolation(String),
    #[error("Unknown error has occurred")]
    Unknown(String),
}

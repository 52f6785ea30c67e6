//! Storage key derivation
//!
//! Raw identifiers never reach the store as-is. Each is hashed through
//! SHA-256 and prefixed with the namespace and environment, so keys are
//! deterministic, non-reversible and scoped per deployment.
use crate::config::Environment;

/// Sub-namespace a derived key belongs to. Cart records carry a `cart#`
/// marker; validation entries sit directly under the namespace prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Cart,
    Validation,
}

/// Derive the storage key for a raw identifier.
pub fn derive_key(namespace: &str, environment: Environment, resource: Resource, raw: &str) -> String {
    let digest = sha256::digest(raw);

    match resource {
        Resource::Cart => format!("{namespace}_{}_cart#{digest}", environment.as_str()),
        Resource::Validation => format!("{namespace}_{}_{digest}", environment.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_and_validation_keys_do_not_collide() {
        let cart = derive_key("shop", Environment::Dev, Resource::Cart, "abc");
        let validation = derive_key("shop", Environment::Dev, Resource::Validation, "abc");

        assert!(cart.starts_with("shop_dev_cart#"));
        assert!(validation.starts_with("shop_dev_"));
        assert_ne!(cart, validation);
    }

    #[test]
    fn environments_are_scoped() {
        let dev = derive_key("shop", Environment::Dev, Resource::Cart, "abc");
        let prod = derive_key("shop", Environment::Prod, Resource::Cart, "abc");

        assert_ne!(dev, prod);
    }
}

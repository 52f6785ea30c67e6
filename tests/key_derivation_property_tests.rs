//! Property-based tests for storage key derivation
//!
//! This module uses the proptest crate to verify the key derivation
//! invariants across a wide range of randomly generated inputs: derivation
//! is deterministic, collision-free in practice, and scoped per environment.

use proptest::prelude::*;

use ephemeral_cart::config::Environment;
use ephemeral_cart::keys::{Resource, derive_key};

/// Strategy to generate raw identifiers (cart ids, emails, phone numbers)
fn raw_identifier_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9@._+-]{1,64}"
}

/// Strategy to generate namespaces
fn namespace_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,15}"
}

/// Strategy to generate either resource sub-namespace
fn resource_strategy() -> impl Strategy<Value = Resource> {
    prop_oneof![Just(Resource::Cart), Just(Resource::Validation)]
}

proptest! {
    /// Property: derivation is a pure function, the same input always
    /// yields the same key
    #[test]
    fn derivation_is_deterministic(
        namespace in namespace_strategy(),
        resource in resource_strategy(),
        raw in raw_identifier_strategy(),
    ) {
        let first = derive_key(&namespace, Environment::Dev, resource, &raw);
        let second = derive_key(&namespace, Environment::Dev, resource, &raw);
        prop_assert_eq!(first, second);
    }

    /// Property: distinct raw identifiers never map to the same key
    /// (collision-negligible for SHA-256)
    #[test]
    fn distinct_inputs_never_collide(
        namespace in namespace_strategy(),
        resource in resource_strategy(),
        a in raw_identifier_strategy(),
        b in raw_identifier_strategy(),
    ) {
        prop_assume!(a != b);
        let key_a = derive_key(&namespace, Environment::Dev, resource, &a);
        let key_b = derive_key(&namespace, Environment::Dev, resource, &b);
        prop_assert_ne!(key_a, key_b);
    }

    /// Property: the same input under dev and prod yields different keys
    #[test]
    fn environments_are_disjoint(
        namespace in namespace_strategy(),
        resource in resource_strategy(),
        raw in raw_identifier_strategy(),
    ) {
        let dev = derive_key(&namespace, Environment::Dev, resource, &raw);
        let prod = derive_key(&namespace, Environment::Prod, resource, &raw);
        prop_assert_ne!(dev, prod);
    }

    /// Property: derived keys always carry the namespace/environment prefix
    /// and never leak the raw identifier
    #[test]
    fn keys_are_prefixed_and_opaque(
        namespace in namespace_strategy(),
        raw in raw_identifier_strategy(),
    ) {
        let key = derive_key(&namespace, Environment::Prod, Resource::Cart, &raw);
        let expected_prefix = format!("{namespace}_prod_cart#");
        prop_assert!(key.starts_with(&expected_prefix));
        // 64 hex chars of digest after the marker
        let digest = key.rsplit('#').next().unwrap();
        prop_assert_eq!(digest.len(), 64);
        prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! Runtime configuration for the cart and validation services
use chrono::Duration;

/// Deployment environment, part of every derived storage key so that
/// dev and prod records never collide in a shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CartConfig {
    pub namespace: String,
    pub environment: Environment,
    /// Sliding expiration window for cart records.
    pub cart_ttl: Duration,
    /// Fixed expiration for cached validation verdicts.
    pub validation_ttl: Duration,
    /// Hard cap on stored validation entries; writes past it are rejected.
    pub max_validation_entries: usize,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            namespace: "storefront".into(),
            environment: Environment::Dev,
            cart_ttl: Duration::hours(6),
            validation_ttl: Duration::hours(72),
            max_validation_entries: 10_000,
        }
    }
}

impl CartConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.into();
        self
    }
    pub fn set_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
    pub fn set_cart_ttl(mut self, ttl: Duration) -> Self {
        self.cart_ttl = ttl;
        self
    }
    pub fn set_validation_ttl(mut self, ttl: Duration) -> Self {
        self.validation_ttl = ttl;
        self
    }
    pub fn set_max_validation_entries(mut self, max: usize) -> Self {
        self.max_validation_entries = max;
        self
    }
    /// Fixed key the inventory snapshot is cached under.
    pub fn inventory_key(&self) -> String {
        format!("{}_{}_inventory", self.namespace, self.environment.as_str())
    }
    /// Prefix shared by every record this deployment writes.
    pub fn key_prefix(&self) -> String {
        format!("{}_{}_", self.namespace, self.environment.as_str())
    }
}

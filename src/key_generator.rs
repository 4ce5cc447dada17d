//! Storage key derivation for throttle buckets.

/// Category tag placed between the namespace and the throttle key.
pub const THROTTLE_CATEGORY: &str = "throttle";

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// Builds storage keys of the form `<namespace>:throttle:<key>`
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    prefix: String,
}

impl KeyGenerator {
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: format!(
                "{}{}{}{}",
                Self::escape_component(namespace),
                SEPARATOR,
                THROTTLE_CATEGORY,
                SEPARATOR
            ),
        }
    }

    /// Generate the storage key for a throttle key
    pub fn generate_key(&self, throttle_key: &str) -> String {
        let mut key = String::with_capacity(self.prefix.len() + throttle_key.len());
        key.push_str(&self.prefix);
        key.push_str(&Self::escape_component(throttle_key));
        key
    }

    /// Escape separators inside a component so that distinct
    /// (namespace, key) pairs can never produce the same storage key.
    pub fn escape_component(component: &str) -> String {
        let mut escaped = String::with_capacity(component.len());
        for c in component.chars() {
            if c == SEPARATOR || c == ESCAPE {
                escaped.push(ESCAPE);
            }
            escaped.push(c);
        }
        escaped
    }
}

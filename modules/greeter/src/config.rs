use serde::{Deserialize, Serialize};

/// Configuration for the greeter service (`services.greeter`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GreeterConfig {
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            audience: default_audience(),
        }
    }
}

fn default_greeting() -> String {
    "Hello".to_owned()
}

fn default_audience() -> String {
    "world".to_owned()
}

// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates service names while the file is parsed.

use serde::Deserialize;

use crate::types::ServiceName;

pub fn deserialize_service_name<'de, D>(deserializer: D) -> Result<ServiceName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ServiceName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_apis<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let apis: Vec<String> = Vec::deserialize(deserializer)?;
    if let Some(blank) = apis.iter().position(|a| a.trim().is_empty()) {
        return Err(serde::de::Error::custom(format!(
            "apis[{blank}] cannot be empty"
        )));
    }
    Ok(apis)
}

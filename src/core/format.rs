//! Decoding raw data into typed configuration.

use crate::error::{ReloadError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Document format used to decode raw data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    /// Try JSON first, then YAML. The first success wins.
    #[default]
    Auto,
    /// YAML only
    Yaml,
    /// JSON only
    Json,
}

/// Decode `data` into `T`.
///
/// With `strict` set, fields that `T` does not know about are rejected
/// instead of ignored.
///
/// # Errors
///
/// Returns [`ReloadError::Decode`] if the data is not valid in the chosen
/// format or does not match `T`. For [`ConfigFormat::Auto`] the YAML error
/// is reported when both formats fail.
///
/// # Examples
///
/// ```rust
/// use hotswap_reload::core::{ConfigFormat, decode};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Server {
///     port: u16,
/// }
///
/// let from_json: Server = decode(br#"{"port": 80}"#, ConfigFormat::Auto, false).unwrap();
/// let from_yaml: Server = decode(b"port: 80", ConfigFormat::Auto, false).unwrap();
/// assert_eq!(from_json, from_yaml);
///
/// let strict: Result<Server, _> = decode(b"port: 80\nhost: x", ConfigFormat::Yaml, true);
/// assert!(strict.is_err());
/// ```
pub fn decode<T: DeserializeOwned>(data: &[u8], format: ConfigFormat, strict: bool) -> Result<T> {
    match format {
        ConfigFormat::Json => decode_json(data, strict),
        ConfigFormat::Yaml => decode_yaml(data, strict),
        ConfigFormat::Auto => decode_json(data, strict).or_else(|json_err| {
            tracing::trace!(error = %json_err, "not JSON, trying YAML");
            decode_yaml(data, strict)
        }),
    }
}

fn decode_json<T: DeserializeOwned>(data: &[u8], strict: bool) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(data);
    let value = deserialize_checked(&mut de, strict)
        .map_err(|e| ReloadError::Decode(format!("invalid JSON: {}", e)))?;
    de.end()
        .map_err(|e| ReloadError::Decode(format!("invalid JSON: {}", e)))?;
    Ok(value)
}

fn decode_yaml<T: DeserializeOwned>(data: &[u8], strict: bool) -> Result<T> {
    let de = serde_yaml::Deserializer::from_slice(data);
    deserialize_checked(de, strict).map_err(|e| ReloadError::Decode(format!("invalid YAML: {}", e)))
}

/// Deserialize, collecting ignored fields when `strict` is set.
fn deserialize_checked<'de, D, T>(de: D, strict: bool) -> std::result::Result<T, String>
where
    D: serde::Deserializer<'de>,
    D::Error: std::fmt::Display,
    T: Deserialize<'de>,
{
    if !strict {
        return T::deserialize(de).map_err(|e| e.to_string());
    }

    let mut unknown = Vec::new();
    let value = serde_ignored::deserialize(de, |path| unknown.push(path.to_string()))
        .map_err(|e| e.to_string())?;
    if !unknown.is_empty() {
        return Err(format!("unknown field(s): {}", unknown.join(", ")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Server {
        port: u16,
        host: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct App {
        server: Server,
        #[serde(default)]
        debug: bool,
    }

    const JSON: &[u8] = br#"{"server": {"port": 8080, "host": "localhost"}, "debug": true}"#;
    const YAML: &[u8] = b"server:\n  port: 8080\n  host: localhost\ndebug: true\n";

    fn expected() -> App {
        App {
            server: Server {
                port: 8080,
                host: "localhost".to_string(),
            },
            debug: true,
        }
    }

    #[test]
    fn test_auto_detects_both() {
        assert_eq!(decode::<App>(JSON, ConfigFormat::Auto, false).unwrap(), expected());
        assert_eq!(decode::<App>(YAML, ConfigFormat::Auto, false).unwrap(), expected());
    }

    #[test]
    fn test_explicit_format_mismatch() {
        assert!(decode::<App>(YAML, ConfigFormat::Json, false).is_err());
        // JSON is valid YAML
        assert_eq!(decode::<App>(JSON, ConfigFormat::Yaml, false).unwrap(), expected());
    }

    #[test]
    fn test_auto_reports_yaml_error() {
        let err = decode::<App>(b"server: [unterminated", ConfigFormat::Auto, false).unwrap_err();
        assert!(matches!(&err, ReloadError::Decode(msg) if msg.contains("YAML")));
    }

    #[test]
    fn test_strict_rejects_unknown_fields() {
        let data = br#"{"server": {"port": 1, "host": "h", "tls": true}}"#;
        assert!(decode::<App>(data, ConfigFormat::Json, false).is_ok());

        let err = decode::<App>(data, ConfigFormat::Json, true).unwrap_err();
        assert!(matches!(&err, ReloadError::Decode(msg) if msg.contains("server.tls")));

        let yaml = b"server:\n  port: 1\n  host: h\nextra: 2\n";
        let err = decode::<App>(yaml, ConfigFormat::Yaml, true).unwrap_err();
        assert!(matches!(&err, ReloadError::Decode(msg) if msg.contains("extra")));
    }

    #[test]
    fn test_trailing_json_rejected() {
        assert!(decode::<Server>(br#"{"port":1,"host":"h"} {}"#, ConfigFormat::Json, false).is_err());
    }

    #[test]
    fn test_format_names() {
        let format: ConfigFormat = serde_json::from_str(r#""yaml""#).unwrap();
        assert_eq!(format, ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::default(), ConfigFormat::Auto);
    }
}

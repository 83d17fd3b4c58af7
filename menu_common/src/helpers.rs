use std::str::FromStr;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse an optional string into `T`. Missing values yield the default. Values that fail to parse are returned as an
/// error string so that the caller can decide whether to log a warning and fall back.
pub fn parse_or_default<T: FromStr>(value: Option<String>, default: T) -> Result<T, String> {
    match value {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|_| v),
    }
}

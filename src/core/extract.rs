use serde_json::Value;

/// Parse model output that is supposed to be JSON but may arrive wrapped in
/// prose. Direct parse first, then the first balanced `{...}` substring.
pub fn parse_model_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    extract_json_object(content).and_then(|candidate| serde_json::from_str(candidate).ok())
}

/// First balanced `{...}` substring of `content`, honoring string literals
/// and escapes so braces inside strings do not end the scan.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let bytes = content.as_bytes();
    let start = content.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

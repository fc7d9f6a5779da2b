use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// The image endpoint streams results even for a single image; the URL
/// arrives in a `image_generation.partial_succeeded` event.
const IMAGE_GENERATED_EVENT: &str = "image_generation.partial_succeeded";

/// One server-sent event: the event name (`message` when the stream does not
/// name one) and its data payload, multi-line data joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Parse a complete SSE response body into events. Blocks are separated by
/// blank lines; `\r\n` line endings and comment lines are tolerated. A
/// trailing block without a terminating blank line is still emitted.
pub fn parse_events(body: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut event_name: Option<String> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    let mut flush = |event_name: &mut Option<String>, data_lines: &mut Vec<&str>| {
        if event_name.is_some() || !data_lines.is_empty() {
            events.push(SseEvent {
                event: event_name
                    .take()
                    .unwrap_or_else(|| "message".to_string()),
                data: data_lines.join("\n"),
            });
            data_lines.clear();
        }
    };

    for raw_line in body.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.is_empty() {
            flush(&mut event_name, &mut data_lines);
            continue;
        }
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = field_value(line, "event") {
            event_name = Some(value.to_string());
        } else if let Some(value) = field_value(line, "data") {
            data_lines.push(value);
        }
    }
    flush(&mut event_name, &mut data_lines);

    events
}

/// `field: value` with at most one space after the colon stripped.
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Pull the generated image URL out of a streamed response. Prefers the
/// structured event payload; falls back to a raw scan so a stream with a
/// mangled framing still yields the URL when one is present at all.
pub fn extract_generated_image_url(body: &str) -> Option<String> {
    for event in parse_events(body) {
        if event.event != IMAGE_GENERATED_EVENT {
            continue;
        }
        if let Ok(payload) = serde_json::from_str::<Value>(&event.data) {
            if let Some(url) = payload.get("url").and_then(Value::as_str) {
                let url = url.trim();
                if !url.is_empty() {
                    return Some(url.to_string());
                }
            }
        }
    }

    url_fallback_pattern()
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str().to_string())
}

fn url_fallback_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""url":"([^"]+)""#).expect("valid url pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_default_events() {
        let body = "event: ping\ndata: 1\n\ndata: hello\n\n";
        let events = parse_events(body);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "ping");
        assert_eq!(events[0].data, "1");
        assert_eq!(events[1].event, "message");
        assert_eq!(events[1].data, "hello");
    }

    #[test]
    fn test_parse_multiline_data_and_crlf() {
        let body = "event: blob\r\ndata: line1\r\ndata: line2\r\n\r\n";
        let events = parse_events(body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn test_parse_flushes_unterminated_trailing_block() {
        let events = parse_events("event: tail\ndata: x");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "tail");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_extract_url_from_partial_succeeded_event() {
        let body = concat!(
            "event: image_generation.partial_succeeded\n",
            "data: {\"url\":\"https://cdn.example.com/out.png\",\"size\":\"2K\"}\n",
            "\n",
            "event: image_generation.completed\n",
            "data: {\"usage\":{\"generated_images\":1}}\n",
            "\n",
        );
        assert_eq!(
            extract_generated_image_url(body),
            Some("https://cdn.example.com/out.png".to_string())
        );
    }

    #[test]
    fn test_extract_ignores_other_events() {
        let body = concat!(
            "event: image_generation.completed\n",
            "data: {\"note\":\"no image here\"}\n",
            "\n",
        );
        assert_eq!(extract_generated_image_url(body), None);
    }

    #[test]
    fn test_extract_falls_back_to_raw_scan() {
        // Framing is broken (no event names), but the URL is still in there.
        let body = "data {\"url\":\"https://cdn.example.com/a.png\"}";
        assert_eq!(
            extract_generated_image_url(body),
            Some("https://cdn.example.com/a.png".to_string())
        );
    }

    #[test]
    fn test_extract_empty_url_rejected() {
        let body = concat!(
            "event: image_generation.partial_succeeded\n",
            "data: {\"url\":\"\"}\n",
            "\n",
        );
        assert_eq!(extract_generated_image_url(body), None);
    }

    #[test]
    fn test_comment_lines_ignored() {
        let body = ": keep-alive\nevent: ping\ndata: ok\n\n";
        let events = parse_events(body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "ok");
    }
}

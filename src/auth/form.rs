use once_cell::sync::Lazy;
use regex::Regex;

static INPUT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<input\b[^>]*>").expect("input tag pattern is valid")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern is valid")
});

/// Value of the first `<input name="{name}">` in `html`, if it carries a non-empty value.
pub fn hidden_input_value(html: &str, name: &str) -> Option<String> {
    for tag in INPUT_TAG.find_iter(html) {
        let mut field_name = None;
        let mut value = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let attr = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if attr.eq_ignore_ascii_case("name") {
                field_name = Some(raw);
            } else if attr.eq_ignore_ascii_case("value") {
                value = Some(raw);
            }
        }
        if field_name == Some(name) {
            return value
                .map(decode_entities)
                .filter(|v| !v.is_empty());
        }
    }
    None
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

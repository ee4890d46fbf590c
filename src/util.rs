//! Naming helpers shared by projection, signatures and templates
//!
//! All converters are pure functions of their input, so templates that call
//! them render identical bytes for identical models.

use regex::Regex;
use std::sync::OnceLock;

/// Words that stay upper-cased in Go identifiers
const GO_INITIALISMS: &[&str] = &[
    "ID", "API", "HTTP", "HTTPS", "IP", "JSON", "SQL", "TTL", "UUID", "URI", "URL", "TCP", "UDP",
    "FSM", "DTO", "UI", "IO", "S3", "JWT", "RPC", "AI",
];

struct NamePatterns {
    acronym_boundary: Regex,
    camel_boundary: Regex,
    token: Regex,
}

fn patterns() -> &'static NamePatterns {
    static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NamePatterns {
        acronym_boundary: Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("static pattern"),
        camel_boundary: Regex::new(r"([a-z0-9])([A-Z])").expect("static pattern"),
        token: Regex::new(r"[A-Za-z0-9]+").expect("static pattern"),
    })
}

/// Split an identifier into words on separators, acronym and camel boundaries
pub fn split_name(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    let p = patterns();
    let clean = s.replace(['_', '-', '.', '/'], " ");
    let clean = p.acronym_boundary.replace_all(&clean, "${1} ${2}");
    let clean = p.camel_boundary.replace_all(&clean, "${1} ${2}");
    let tokens: Vec<String> = p
        .token
        .find_iter(&clean)
        .map(|m| m.as_str().to_string())
        .collect();
    if tokens.is_empty() {
        vec![s.to_string()]
    } else {
        tokens
    }
}

fn capitalize(word: &str) -> String {
    let lower = word.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Exported Go identifier (PascalCase with initialisms)
///
/// # Examples
/// ```
/// use ang_codegen::util::export_name;
/// assert_eq!(export_name("user_id"), "UserID");
/// assert_eq!(export_name("httpServer"), "HTTPServer");
/// ```
pub fn export_name(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    if s.eq_ignore_ascii_case("ids") {
        return "IDs".to_string();
    }
    if s.eq_ignore_ascii_case("apikey") {
        return "APIKey".to_string();
    }
    if s.eq_ignore_ascii_case("apikeys") {
        return "APIKeys".to_string();
    }
    split_name(s)
        .iter()
        .map(|part| {
            let upper = part.to_uppercase();
            if GO_INITIALISMS.contains(&upper.as_str()) {
                upper
            } else {
                capitalize(part)
            }
        })
        .collect()
}

/// JSON property name: lowerCamel, `Id` rather than `ID`
///
/// # Examples
/// ```
/// use ang_codegen::util::json_name;
/// assert_eq!(json_name("UserID"), "userId");
/// ```
pub fn json_name(s: &str) -> String {
    split_name(s)
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let lower = part.to_lowercase();
            if i == 0 {
                lower
            } else if lower == "id" {
                "Id".to_string()
            } else {
                capitalize(&lower)
            }
        })
        .collect()
}

/// Database column name
pub fn db_name(s: &str) -> String {
    export_name(s).to_lowercase()
}

/// Upper-case the first character only
pub fn to_title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lower-case the first character only
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert PascalCase or camelCase to snake_case
///
/// # Examples
/// ```
/// use ang_codegen::util::to_snake_case;
/// assert_eq!(to_snake_case("HelloWorld"), "hello_world");
/// assert_eq!(to_snake_case("fooBar"), "foo_bar");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Go interpreted string literal for arbitrary text
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

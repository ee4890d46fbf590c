//! Editable regions that survive regeneration
//!
//! A region spans from a line starting with `ANG:BEGIN_CUSTOM <qualifier>` to
//! a line starting with `ANG:END_CUSTOM <qualifier>`, each after an optional
//! comment leader. The comment syntax itself does not matter; prose that
//! merely mentions a marker is not a marker.

use std::collections::BTreeMap;

pub const BEGIN_MARKER: &str = "ANG:BEGIN_CUSTOM";
pub const END_MARKER: &str = "ANG:END_CUSTOM";

/// Qualifier following `marker` when the marker is the first word of the
/// line after an optional comment leader (`//`, `#`, `<!--`, ...)
fn qualifier<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let word = line
        .trim_start()
        .trim_start_matches(|c: char| !c.is_alphanumeric() && !c.is_whitespace())
        .trim_start();
    let rest = word.strip_prefix(marker)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.split_whitespace().next()
}

/// Bodies of every complete region in `text`, keyed by qualifier.
///
/// A begin marker inside an open region abandons the open one.
pub fn extract(text: &str) -> BTreeMap<String, Vec<String>> {
    let mut blocks = BTreeMap::new();
    let mut open: Option<(String, Vec<String>)> = None;
    for line in text.lines() {
        if let Some(q) = qualifier(line, BEGIN_MARKER) {
            open = Some((q.to_string(), Vec::new()));
            continue;
        }
        if let Some((q, body)) = open.as_mut() {
            if qualifier(line, END_MARKER) == Some(q.as_str()) {
                if let Some((q, body)) = open.take() {
                    blocks.entry(q).or_insert(body);
                }
            } else {
                body.push(line.to_string());
            }
        }
    }
    blocks
}

/// Replace region bodies in `generated` with their `on_disk` counterparts.
///
/// Only qualifiers present in both texts are touched; a region without a
/// closing marker in `generated` keeps its generated body.
pub fn merge(generated: &str, on_disk: &str) -> String {
    let preserved = extract(on_disk);
    if preserved.is_empty() {
        return generated.to_string();
    }
    let closed = extract(generated);

    let mut out = Vec::new();
    let mut skipping: Option<&str> = None;
    for line in generated.lines() {
        if let Some(q) = skipping {
            if qualifier(line, END_MARKER) == Some(q) {
                out.push(line.to_string());
                skipping = None;
            }
            continue;
        }
        out.push(line.to_string());
        if let Some(q) = qualifier(line, BEGIN_MARKER) {
            if let (Some(body), true) = (preserved.get(q), closed.contains_key(q)) {
                out.extend(body.iter().cloned());
                skipping = Some(q);
            }
        }
    }
    let mut merged = out.join("\n");
    if generated.ends_with('\n') {
        merged.push('\n');
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const GENERATED: &str = "\
func (s *OrdersImpl) Cancel() error {
\t// ANG:BEGIN_CUSTOM Orders.Cancel
\treturn errors.New(501, \"Not Implemented\", \"Cancel\")
\t// ANG:END_CUSTOM Orders.Cancel
}

func (s *OrdersImpl) Ship() error {
\t// ANG:BEGIN_CUSTOM Orders.Ship
\treturn nil
\t// ANG:END_CUSTOM Orders.Ship
}
";

    #[test]
    fn test_disk_body_wins_for_shared_qualifier() {
        let disk = "\
\t// ANG:BEGIN_CUSTOM Orders.Cancel
\tif err := s.cancel(); err != nil {
\t\treturn err
\t}
\treturn nil
\t// ANG:END_CUSTOM Orders.Cancel
\t// ANG:BEGIN_CUSTOM Orders.Gone
\tstale()
\t// ANG:END_CUSTOM Orders.Gone
";
        let merged = merge(GENERATED, disk);
        assert!(merged.contains("\tif err := s.cancel(); err != nil {\n\t\treturn err\n\t}\n\treturn nil\n\t// ANG:END_CUSTOM Orders.Cancel"));
        assert!(!merged.contains("Not Implemented"));
        assert!(merged.contains("\t// ANG:BEGIN_CUSTOM Orders.Ship\n\treturn nil\n"));
        assert!(!merged.contains("stale()"));
        assert!(merged.ends_with("}\n"));
    }

    #[test]
    fn test_qualifier_match_is_exact() {
        let disk = "// ANG:BEGIN_CUSTOM orders.cancel\nmine()\n// ANG:END_CUSTOM orders.cancel\n";
        assert_eq!(merge(GENERATED, disk), GENERATED);
    }

    #[test]
    fn test_comment_syntax_independent() {
        let generated = "<!-- ANG:BEGIN_CUSTOM head -->\n<title/>\n<!-- ANG:END_CUSTOM head -->\n";
        let disk = "# ANG:BEGIN_CUSTOM head\n<title>Mine</title>\n# ANG:END_CUSTOM head\n";
        assert_eq!(
            merge(generated, disk),
            "<!-- ANG:BEGIN_CUSTOM head -->\n<title>Mine</title>\n<!-- ANG:END_CUSTOM head -->\n"
        );
    }

    #[test]
    fn test_marker_mentioned_in_prose_is_ignored() {
        let header = "// Code generated by ang 0.1.0. DO NOT EDIT outside ANG:BEGIN_CUSTOM regions.\n\
                      // input: sha256:0011223344556677 compiler: sha256:8899aabbccddeeff\n\n\
                      package service\n\n";
        let generated = format!("{header}{GENERATED}");
        let disk = generated.replace(
            "\treturn errors.New(501, \"Not Implemented\", \"Cancel\")",
            "\treturn s.cancel(ctx)",
        );
        assert_eq!(extract(&disk).len(), 2);
        let merged = merge(&generated, &disk);
        assert_eq!(merged, disk);
        assert!(qualifier("// ANG:BEGIN_CUSTOMER x", BEGIN_MARKER).is_none());
        assert_eq!(qualifier("\t//ANG:END_CUSTOM Orders.Ship", END_MARKER), Some("Orders.Ship"));
    }

    #[test]
    fn test_unclosed_region_is_abandoned_at_next_begin() {
        let disk = "// ANG:BEGIN_CUSTOM a\nlost()\n// ANG:BEGIN_CUSTOM b\nkept()\n// ANG:END_CUSTOM b\n";
        let blocks = extract(disk);
        assert_eq!(blocks.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(blocks["b"], vec!["kept()".to_string()]);
    }

    #[test]
    fn test_unclosed_generated_region_keeps_generated() {
        let generated = "// ANG:BEGIN_CUSTOM a\nnew()\n";
        let disk = "// ANG:BEGIN_CUSTOM a\nold()\n// ANG:END_CUSTOM a\n";
        assert_eq!(merge(generated, disk), generated);
        assert!(extract("// ANG:BEGIN_CUSTOM a\nnever closed\n").is_empty());
    }
}

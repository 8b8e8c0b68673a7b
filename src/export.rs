//! Text renderings of a model: Mermaid and PlantUML C4 diagrams, draw.io
//! documents and Markdown documentation.
//!
//! Each renderer is a [`Display`](std::fmt::Display) wrapper around a
//! borrowed [`Model`](crate::domain::Model), with a convenience function
//! returning the rendered `String`.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

mod drawio;
pub use drawio::{Drawio, drawio};

mod markdown;
pub use markdown::{Markdown, markdown};

mod mermaid;
pub use mermaid::{Mermaid, mermaid};

mod plantuml;
pub use plantuml::{PlantUml, plantuml};

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]").expect("valid regex"));

/// Turns an element id into a diagram identifier by replacing every
/// non-alphanumeric character with `_`.
#[must_use]
pub fn sanitize_id(id: &str) -> Cow<'_, str> {
    NON_ALPHANUMERIC.replace_all(id, "_")
}

/// Makes `text` safe inside a double-quoted diagram argument.
fn quoted(text: &str) -> Cow<'_, str> {
    if text.contains('"') {
        Cow::Owned(text.replace('"', "'"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("sys-1712345-abc" => "sys_1712345_abc")]
    #[test_case("plain" => "plain")]
    #[test_case("a.b c/d" => "a_b_c_d")]
    #[test_case("café" => "caf_")]
    fn sanitizes_ids(id: &str) -> String {
        sanitize_id(id).into_owned()
    }

    #[test]
    fn quotes_are_replaced() {
        assert_eq!(quoted(r#"the "main" API"#), "the 'main' API");
        assert!(matches!(quoted("fine"), Cow::Borrowed(_)));
    }
}

//! `.codespellrc` from `[global.codespell]`.

use super::make_header;
use crate::registry::ExceptionRegistry;

pub fn render(registry: &ExceptionRegistry) -> String {
    let mut lines = vec![make_header("#", &[]), "[codespell]".to_string()];

    let skip = registry.global_list("codespell", "skip");
    if !skip.is_empty() {
        lines.push(format!("skip = {}", skip.join(",")));
    }

    let ignore_words = registry.global_list("codespell", "ignore_words");
    if !ignore_words.is_empty() {
        lines.push(format!("ignore-words-list = {}", ignore_words.join(",")));
    }

    lines.push(String::new());
    lines.join("\n")
}

//! `.suppression-allowlist` from `[[inline_suppressions]]`.
//!
//! The suppression-comment hook greps changed lines against these patterns;
//! anything not listed is rejected.

use super::make_header;
use crate::registry::ExceptionRegistry;

const EXTRA_HEADER: [&str; 2] = [
    "Each non-comment line is a grep -E pattern matched case-insensitively",
    "against detected suppression comment lines. Only these patterns pass.",
];

pub fn render(registry: &ExceptionRegistry) -> String {
    let mut lines = vec![make_header("#", &EXTRA_HEADER)];

    for sup in &registry.inline_suppressions {
        lines.push(format!("# {} (files: {})", sup.reason, sup.glob.join(", ")));
        lines.push(sup.pattern.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_allowlist() {
        let reg = ExceptionRegistry::parse(
            r##"
schema_version = 1

[[inline_suppressions]]
pattern = "# noqa: E402"
glob = ["scripts/*.py", "tools/*.py"]
reason = "sys.path setup"

[[inline_suppressions]]
pattern = "eslint-disable-next-line no-console"
glob = "cli/**/*.ts"
reason = "CLI output"
"##,
        )
        .unwrap();
        let out = render(&reg);

        assert!(out.contains("# Each non-comment line is a grep -E pattern"));
        assert!(out.contains(
            "\n# sys.path setup (files: scripts/*.py, tools/*.py)\n# noqa: E402\n\n# CLI output (files: cli/**/*.ts)\neslint-disable-next-line no-console\n"
        ));
    }
}

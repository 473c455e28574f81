use std::fmt::Display;

/// Indentation step used when rendering operator trees.
pub const BASE_INDENT: usize = 2;

/// Prefix every line of `text` with `width` spaces.
pub fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render items one per line, joined by `separator`, then indent the block.
pub fn indent_joined<T: Display>(items: &[T], separator: &str) -> String {
    let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
    indent(&rendered.join(separator), BASE_INDENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_prefixes_every_line() {
        assert_eq!(indent("a\nb", 2), "  a\n  b");
    }

    #[test]
    fn indent_joined_uses_separator() {
        assert_eq!(indent_joined(&["x", "y"], "\n=>\n"), "  x\n  =>\n  y");
    }
}

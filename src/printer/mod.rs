//! Terminal printers for reports and operation listings.

use std::io::{self, Write};

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::operations::{Operation, Registry};

pub struct TextPrinter {
    pub color: bool,
}

impl Default for TextPrinter {
    fn default() -> Self {
        Self { color: io::stdout().is_terminal() }
    }
}

impl TextPrinter {
    pub fn print(&self, text: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", text)
    }

    pub fn operation_list(&self, registry: &Registry) -> io::Result<()> {
        self.write_list(&mut io::stdout().lock(), registry)
    }

    pub fn operation_detail(&self, registry: &Registry, op: &Operation) -> io::Result<()> {
        self.write_detail(&mut io::stdout().lock(), registry, op)
    }

    fn write_list(&self, out: &mut impl Write, registry: &Registry) -> io::Result<()> {
        for op in registry.operations() {
            let summary = op.description.split_whitespace().collect::<Vec<_>>().join(" ");
            if self.color {
                writeln!(out, "{}  [{}]  {}", op.name.green(), op.category.cyan(), summary)?;
            } else {
                writeln!(out, "{}  [{}]  {}", op.name, op.category, summary)?;
            }
        }
        Ok(())
    }

    fn write_detail(&self, out: &mut impl Write, registry: &Registry, op: &Operation) -> io::Result<()> {
        let title = if self.color { op.name.green().to_string() } else { op.name.to_string() };
        writeln!(out, "{} ({})\n", title, op.category)?;
        writeln!(out, "{}\n", registry.description(op))?;
        if op.params.is_empty() {
            return writeln!(out, "No parameters.");
        }
        writeln!(out, "Parameters:")?;
        for p in op.params {
            let req = if p.required { "required" } else { "optional" };
            writeln!(out, "  {:<20} {:?}, {}  {}", p.name, p.kind, req, p.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_listing_has_one_line_per_operation() {
        let registry = Registry::with_catalog(None);
        let printer = TextPrinter { color: false };
        let mut out = Vec::new();
        printer.write_list(&mut out, &registry).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), registry.len());
        assert!(text.contains("move_email  [organization]  Move emails"));
    }

    #[test]
    fn detail_lists_parameters() {
        let registry = Registry::with_catalog(Some("Sign as Sam".to_string()));
        let op = registry.get("manage_trash").unwrap();
        let mut out = Vec::new();
        TextPrinter { color: false }.write_detail(&mut out, &registry, op).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("manage_trash (trash)"));
        assert!(text.contains("User Preferences: Sign as Sam"));
        assert!(text.contains("max_deletes"));
    }

    #[test]
    fn write_errors_propagate() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let registry = Registry::with_catalog(None);
        let err = TextPrinter { color: false }.write_list(&mut Closed, &registry).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}

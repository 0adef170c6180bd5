//! Ansible INI inventory emission.

use std::fmt::Write;

/// One `[section]` of an inventory file.
#[derive(Debug, Clone)]
struct Section {
    name: String,
    lines: Vec<String>,
}

/// An Ansible INI inventory built section by section.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    header: Vec<String>,
    sections: Vec<Section>,
}

impl IniDocument {
    /// Creates an empty inventory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Adds a comment line before the first section.
    pub fn header_comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.header.push(text.into());
        self
    }

    /// Opens a new section; later lines go into it.
    pub fn section(&mut self, name: impl Into<String>) -> &mut Self {
        self.sections.push(Section {
            name: name.into(),
            lines: Vec::new(),
        });
        self
    }

    /// Appends a raw line to the current section.
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        if let Some(section) = self.sections.last_mut() {
            section.lines.push(line.into());
        }
        self
    }

    /// Appends a host line with `key=value` variables.
    pub fn host<'a, I>(&mut self, hostname: &str, vars: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut line = hostname.to_string();
        for (key, value) in vars {
            let _ = write!(line, " {key}={value}");
        }
        self.line(line)
    }

    /// Appends a `key=value` line.
    pub fn var(&mut self, key: &str, value: impl std::fmt::Display) -> &mut Self {
        self.line(format!("{key}={value}"))
    }

    /// Renders the inventory; sections are separated by a blank line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for comment in &self.header {
            let _ = writeln!(out, "# {comment}");
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 || !self.header.is_empty() {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", section.name);
            for line in &section.lines {
                let _ = writeln!(out, "{line}");
            }
        }
        out
    }
}

/// Quotes a value for an inventory line.
#[must_use]
pub fn quoted(value: &str) -> String {
    format!("\"{value}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sections() {
        let mut doc = IniDocument::new();
        doc.header_comment("Generated")
            .section("web")
            .host("h1", [("ansible_host", String::from("h1")), ("key", quoted("~/k"))])
            .section("empty")
            .section("web:vars")
            .var("env", "lab");

        let expected = "# Generated\n\
\n\
[web]\n\
h1 ansible_host=h1 key=\"~/k\"\n\
\n\
[empty]\n\
\n\
[web:vars]\n\
env=lab\n";
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn test_line_without_section_is_dropped() {
        let mut doc = IniDocument::new();
        doc.line("orphan");
        assert_eq!(doc.render(), "");
    }
}

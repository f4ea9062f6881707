//! Output composers: buffer emitted text and own the whitespace policy.
//!
//! The encoder only decides *where* a separator may go; the composer decides
//! what it looks like. [`CompactComposer`] writes no insignificant whitespace,
//! [`PrettyComposer`] breaks lines and indents nested elements.

/// Text sink used by the streaming encoder.
pub trait Composer {
    /// Enter one nesting level.
    fn indent(&mut self);

    /// Leave one nesting level.
    fn unindent(&mut self);

    /// Separator before an element start tag.
    fn new_element(&mut self);

    /// Separator before an attribute inside a start tag.
    fn new_attribute(&mut self);

    /// Raw text, written as is.
    fn append(&mut self, text: &str);

    /// Separator before a closing tag that follows child elements.
    fn append_line(&mut self);

    /// Consumes the composer, returning everything written.
    fn finish(self) -> String;
}

/// No insignificant whitespace. Used for round-trip stable output.
#[derive(Debug, Default)]
pub struct CompactComposer {
    buffer: String,
}

impl CompactComposer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Composer for CompactComposer {
    fn indent(&mut self) {}

    fn unindent(&mut self) {}

    fn new_element(&mut self) {}

    fn new_attribute(&mut self) {
        self.buffer.push(' ');
    }

    fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn append_line(&mut self) {}

    fn finish(self) -> String {
        self.buffer
    }
}

/// Human readable output: one element per line, nested levels indented by
/// `indent_width` spaces.
#[derive(Debug)]
pub struct PrettyComposer {
    buffer: String,
    indent_width: usize,
    level: usize,
}

impl PrettyComposer {
    pub fn new(indent_width: usize) -> Self {
        Self {
            buffer: String::new(),
            indent_width,
            level: 0,
        }
    }

    fn break_line(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer.push('\n');
        self.buffer
            .extend(std::iter::repeat_n(' ', self.level * self.indent_width));
    }
}

impl Default for PrettyComposer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Composer for PrettyComposer {
    fn indent(&mut self) {
        self.level += 1;
    }

    fn unindent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn new_element(&mut self) {
        self.break_line();
    }

    fn new_attribute(&mut self) {
        self.buffer.push(' ');
    }

    fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn append_line(&mut self) {
        self.break_line();
    }

    fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes `<a x="1"><b/></a>` through the composer hooks the way the encoder does.
    fn write_sample<C: Composer>(mut composer: C) -> String {
        composer.new_element();
        composer.append("<a");
        composer.new_attribute();
        composer.append("x=\"1\"");
        composer.append(">");
        composer.indent();
        composer.new_element();
        composer.append("<b/>");
        composer.unindent();
        composer.append_line();
        composer.append("</a>");
        composer.finish()
    }

    #[test]
    fn test_compact_composer() {
        assert_eq!(write_sample(CompactComposer::new()), r#"<a x="1"><b/></a>"#);
    }

    #[test]
    fn test_pretty_composer() {
        assert_eq!(
            write_sample(PrettyComposer::new(2)),
            "<a x=\"1\">\n  <b/>\n</a>"
        );
        assert_eq!(
            write_sample(PrettyComposer::new(4)),
            "<a x=\"1\">\n    <b/>\n</a>"
        );
    }

    #[test]
    fn test_unindent_saturates() {
        let mut composer = PrettyComposer::default();
        composer.unindent();
        composer.append("<a>");
        composer.append_line();
        composer.append("</a>");
        assert_eq!(composer.finish(), "<a>\n</a>");
    }
}

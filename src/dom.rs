//! HTML parser – turns the renderer's markup into a small DOM tree.
//!
//! Only the controlled subset the résumé templates emit is understood:
//! - Structural: div, section, header, p, h1-h4, ul, li, img
//! - Inline: span, a
//! - Styling via `class`, `style` and `dir` attributes
//!
//! `data-field` attributes name the elements that carry a specific data
//! field so callers can inspect rendered text without knowing the layout.

use std::collections::HashMap;

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    Section,
    Header,
    P,
    H1,
    H2,
    H3,
    H4,
    Ul,
    Li,
    Span,
    A,
    Img,
    Body,
    Html,
    Head,
    /// Anything else; styled as `display: none`.
    Unknown(String),
}

impl Tag {
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "section" => Tag::Section,
            "header" => Tag::Header,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "ul" => Tag::Ul,
            "li" => Tag::Li,
            "span" => Tag::Span,
            "a" => Tag::A,
            "img" => Tag::Img,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            other => Tag::Unknown(other.to_string()),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::A)
    }

    /// Blocks whose inline content is flowed as one wrapped paragraph.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::Li
        )
    }

    fn is_void(&self) -> bool {
        matches!(self, Tag::Img)
    }
}

/// A node in the DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// `dir` attribute, if any (`ltr` / `rtl`).
    pub fn dir(&self) -> Option<&str> {
        self.attr("dir")
    }

    /// Concatenated text of this subtree with whitespace runs collapsed.
    pub fn text_content(&self) -> String {
        let mut raw = String::new();
        collect_text(&self.children, &mut raw);
        collapse_whitespace(&raw)
    }
}

impl DomNode {
    pub fn text_content(&self) -> String {
        match self {
            DomNode::Text(t) => collapse_whitespace(t),
            DomNode::Element(e) => e.text_content(),
        }
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => {
                // Block boundaries separate words.
                out.push(' ');
                collect_text(&e.children, out);
                out.push(' ');
            }
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Depth-first search for the first element whose `data-field` equals `field`.
pub fn find_field<'a>(nodes: &'a [DomNode], field: &str) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.attr("data-field") == Some(field) => Some(e),
        DomNode::Element(e) => find_field(&e.children, field),
        DomNode::Text(_) => None,
    })
}

// ---------------------------------------------------------------------------
// Parser – recursive descent over the template subset
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser { input: html, pos: 0 };
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_inter_element_whitespace();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        match self.rest().find('<') {
            Some(offset) => self.pos += offset,
            None => self.pos = self.input.len(),
        }
        DomNode::Text(decode_entities(&self.input[start..self.pos]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let tag = Tag::parse(&self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Stray character inside the tag; skip it.
                self.bump();
                continue;
            }
            elem.attributes.insert(key, value);
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        elem.children = self.parse_nodes();

        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }
        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                match self.rest().find(quote) {
                    Some(offset) => self.pos += offset,
                    None => self.pos = self.input.len(),
                }
                let raw = &self.input[start..self.pos];
                if !self.eof() {
                    self.bump();
                }
                decode_entities(raw)
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.bump();
                }
                self.input[start..self.pos].to_string()
            }
        };
        (key, value)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Drop whitespace-only runs between tags; keep whitespace that leads
    /// into text.
    fn skip_inter_element_whitespace(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, terminator: &str) {
        match self.rest().find(terminator) {
            Some(offset) => self.pos += offset + terminator.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

/// Escape text for use in element content or a quoted attribute value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_section_with_dir() {
        let html = r#"<div dir="rtl" class="p-6"><section><h3>Skills</h3></section></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        let DomNode::Element(root) = &nodes[0] else {
            panic!("Expected element");
        };
        assert_eq!(root.tag, Tag::Div);
        assert_eq!(root.dir(), Some("rtl"));
        assert_eq!(root.classes(), vec!["p-6"]);
        let DomNode::Element(section) = &root.children[0] else {
            panic!("Expected section");
        };
        assert_eq!(section.tag, Tag::Section);
    }

    #[test]
    fn parse_void_img() {
        let nodes = parse_html(r#"<div><img src="data:image/png;base64,AA=="><p>x</p></div>"#);
        let DomNode::Element(div) = &nodes[0] else {
            panic!("Expected div");
        };
        assert_eq!(div.children.len(), 2);
        let DomNode::Element(img) = &div.children[0] else {
            panic!("Expected img");
        };
        assert_eq!(img.src(), Some("data:image/png;base64,AA=="));
    }

    #[test]
    fn escaped_text_round_trips_through_the_parser() {
        let name = r#"R&D <Lab> "Ops" O'Neil"#;
        let html = format!("<p title=\"{0}\">{0}</p>", escape_html(name));
        let nodes = parse_html(&html);
        let DomNode::Element(p) = &nodes[0] else {
            panic!("Expected p");
        };
        assert_eq!(p.text_content(), name);
        assert_eq!(p.attr("title"), Some(name));
    }

    #[test]
    fn entity_decoding_does_not_double_decode() {
        let nodes = parse_html("<p>&amp;lt;</p>");
        assert_eq!(nodes[0].text_content(), "&lt;");
    }

    #[test]
    fn finds_elements_by_data_field() {
        let html = r#"<div><section><p data-field="objective">Ship  it</p></section></div>"#;
        let nodes = parse_html(html);
        let found = find_field(&nodes, "objective").unwrap();
        assert_eq!(found.text_content(), "Ship it");
        assert!(find_field(&nodes, "missing").is_none());
    }

    #[test]
    fn text_content_separates_blocks() {
        let nodes = parse_html("<div><p>One</p><p>Two</p></div>");
        assert_eq!(nodes[0].text_content(), "One Two");
    }
}

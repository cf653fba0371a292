//! Purpose: Pretty-print JSON with optional ANSI color for terminal output.
//! Exports: render_pretty.
//! Role: Pure formatter behind the CLI's document and ack emission.
//! Invariants: With color off, output equals serde_json::to_string_pretty.
//! Invariants: Escape sequences never appear in non-color output.
use serde_json::{Map, Value};

const INDENT: &str = "  ";

// 8/16-color codes only; bright variants lose contrast on common themes.
#[derive(Clone, Copy)]
enum Tone {
    Key,
    Str,
    Num,
    Literal,
    Punct,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Key => "36",
            Tone::Str => "32",
            Tone::Num => "33",
            Tone::Literal => "35",
            Tone::Punct => "39",
        }
    }
}

pub fn render_pretty(value: &Value, color: bool) -> String {
    let mut painter = Painter {
        out: String::new(),
        color,
    };
    painter.value(value, 0);
    painter.out
}

struct Painter {
    out: String,
    color: bool,
}

impl Painter {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.paint("null", Tone::Literal),
            Value::Bool(true) => self.paint("true", Tone::Literal),
            Value::Bool(false) => self.paint("false", Tone::Literal),
            Value::Number(num) => self.paint(&num.to_string(), Tone::Num),
            Value::String(text) => self.string(text, Tone::Str),
            Value::Array(items) => self.array(items, depth),
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn string(&mut self, text: &str, tone: Tone) {
        let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
        self.paint(&encoded, tone);
    }

    fn array(&mut self, items: &[Value], depth: usize) {
        if items.is_empty() {
            self.paint("[]", Tone::Punct);
            return;
        }
        self.paint("[", Tone::Punct);
        self.out.push('\n');
        for (idx, item) in items.iter().enumerate() {
            self.indent(depth + 1);
            self.value(item, depth + 1);
            if idx + 1 < items.len() {
                self.paint(",", Tone::Punct);
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.paint("]", Tone::Punct);
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) {
        if map.is_empty() {
            self.paint("{}", Tone::Punct);
            return;
        }
        self.paint("{", Tone::Punct);
        self.out.push('\n');
        let len = map.len();
        for (idx, (key, value)) in map.iter().enumerate() {
            self.indent(depth + 1);
            self.string(key, Tone::Key);
            self.paint(":", Tone::Punct);
            self.out.push(' ');
            self.value(value, depth + 1);
            if idx + 1 < len {
                self.paint(",", Tone::Punct);
            }
            self.out.push('\n');
        }
        self.indent(depth);
        self.paint("}", Tone::Punct);
    }

    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
    }

    fn paint(&mut self, text: &str, tone: Tone) {
        if !self.color {
            self.out.push_str(text);
            return;
        }
        self.out.push_str("\u{1b}[");
        self.out.push_str(tone.code());
        self.out.push('m');
        self.out.push_str(text);
        self.out.push_str("\u{1b}[0m");
    }
}

//! Typed filter-graph records.
//!
//! Graph geometry is computed on structured values; the textual
//! `-filter_complex` form (and its escaping rules) exists only in the
//! renderers here. A segment is one link chain: input pad labels, a
//! filter chain, output pad labels.

/// One filter with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<FilterArg>,
}

#[derive(Debug, Clone, PartialEq)]
enum FilterArg {
    Positional(String),
    Named(String, String),
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a positional argument.
    pub fn pos(mut self, value: impl ToString) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Append a `key=value` argument.
    pub fn kv(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args
            .push(FilterArg::Named(key.into(), value.to_string()));
        self
    }

    fn render(&self) -> String {
        if self.args.is_empty() {
            return self.name.clone();
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| match arg {
                FilterArg::Positional(value) => value.clone(),
                FilterArg::Named(key, value) => format!("{key}={value}"),
            })
            .collect();
        format!("{}={}", self.name, args.join(":"))
    }
}

/// One chain of filters with its input and output pads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSegment {
    inputs: Vec<String>,
    chain: Vec<Filter>,
    outputs: Vec<String>,
}

impl FilterSegment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, label: impl Into<String>) -> Self {
        self.inputs.push(label.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.chain.push(filter);
        self
    }

    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }

    fn render(&self) -> String {
        let inputs: String = self.inputs.iter().map(|l| format!("[{l}]")).collect();
        let chain: Vec<String> = self.chain.iter().map(Filter::render).collect();
        let outputs: String = self.outputs.iter().map(|l| format!("[{l}]")).collect();
        format!("{inputs}{}{outputs}", chain.join(","))
    }
}

/// An ordered sequence of segments chained by shared pad labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    segments: Vec<FilterSegment>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: FilterSegment) {
        self.segments.push(segment);
    }

    /// Append another graph's segments, preserving order.
    pub fn append(&mut self, mut other: FilterGraph) {
        self.segments.append(&mut other.segments);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the whole graph to the encoder's textual form.
    pub fn render(&self) -> String {
        let rendered: Vec<String> = self.segments.iter().map(FilterSegment::render).collect();
        rendered.join(";")
    }
}

/// Escape text embedded in a filter argument (backslash, then colon).
pub fn escape_text(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace(':', "\\:")
}

//! Builds a document tree from the YAML event stream
//!
//! Working from events rather than a pre-resolved value keeps the scalar
//! style (plain or quoted) and the source marks, so numeric resolution only
//! applies to plain scalars and errors can point at the offending node.

use libyaml_safer::{Event, EventData, Mark, Parser, ScalarStyle};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};

use super::DocumentLoader;
use super::context::IncludeContext;
use super::error::{LoadError, ParseDiagnostic};
use super::scalar;

const MERGE_KEY: &str = "<<";

pub(crate) struct TreeBuilder<'a> {
    loader: &'a DocumentLoader,
    ctx: &'a IncludeContext,
    content: &'a str,
    events: VecDeque<Event>,
    anchors: HashMap<String, Value>,
}

impl<'a> TreeBuilder<'a> {
    pub(crate) fn new(
        loader: &'a DocumentLoader,
        ctx: &'a IncludeContext,
        content: &'a str,
    ) -> Result<Self, LoadError> {
        let events = read_events(content).map_err(|e| {
            let (offset, line, column) = locate_syntax_error(content);
            LoadError::Parse(ParseDiagnostic::new(
                ctx.file(),
                content,
                offset,
                line,
                column,
                e.to_string(),
                &ctx.chain(),
            ))
        })?;

        Ok(Self {
            loader,
            ctx,
            content,
            events,
            anchors: HashMap::new(),
        })
    }

    /// Build the single document in the stream; an empty stream is `null`
    pub(crate) fn build(mut self) -> Result<Value, LoadError> {
        let mut document = None;

        while let Some(event) = self.events.pop_front() {
            match event.data {
                EventData::StreamStart { .. } | EventData::DocumentEnd { .. } => {}
                EventData::StreamEnd { .. } => break,
                EventData::DocumentStart { .. } => {
                    if document.is_some() {
                        return Err(self.error_at(
                            &event.start_mark,
                            "multiple documents in one file are not supported",
                        ));
                    }
                    self.anchors.clear();
                    document = Some(self.build_node()?);
                }
                _ => return Err(self.error_at(&event.start_mark, "unexpected event")),
            }
        }

        Ok(document.unwrap_or(Value::Null))
    }

    fn next_event(&mut self) -> Result<Event, LoadError> {
        self.events.pop_front().ok_or_else(|| {
            self.error_at_offset(self.content.len(), "unexpected end of event stream")
        })
    }

    fn build_node(&mut self) -> Result<Value, LoadError> {
        let event = self.next_event()?;
        let mark = event.start_mark;

        match event.data {
            EventData::Alias { anchor, .. } => self
                .anchors
                .get(&anchor)
                .cloned()
                .ok_or_else(|| self.error_at(&mark, format!("unknown anchor '{anchor}'"))),

            EventData::Scalar {
                anchor,
                tag,
                value,
                style,
                ..
            } => {
                let plain = matches!(style, ScalarStyle::Plain);
                let node = match tag.as_deref() {
                    Some(tag) if tag == self.loader.options().include_tag => {
                        self.include(&value, &mark)?
                    }
                    Some(tag) => {
                        scalar::resolve_tagged(tag, &value, plain, self.loader.numeric_patterns())
                            .map_err(|reason| self.error_at(&mark, reason))?
                    }
                    None if plain => scalar::resolve_plain(&value, self.loader.numeric_patterns()),
                    None => Value::String(value),
                };
                self.remember(anchor, &node);
                Ok(node)
            }

            EventData::SequenceStart { anchor, tag, .. } => {
                self.reject_include_tag(tag.as_deref(), &mark, "a sequence")?;
                let mut items = Vec::new();
                loop {
                    if self.peek_is(|data| matches!(data, EventData::SequenceEnd { .. })) {
                        self.next_event()?;
                        break;
                    }
                    items.push(self.build_node()?);
                }
                let node = Value::Array(items);
                self.remember(anchor, &node);
                Ok(node)
            }

            EventData::MappingStart { anchor, tag, .. } => {
                self.reject_include_tag(tag.as_deref(), &mark, "a mapping")?;
                let node = Value::Object(self.build_mapping()?);
                self.remember(anchor, &node);
                Ok(node)
            }

            _ => Err(self.error_at(&mark, "unexpected event while reading a node")),
        }
    }

    fn build_mapping(&mut self) -> Result<Map<String, Value>, LoadError> {
        let mut entries = Map::new();
        let mut merged = Map::new();

        loop {
            if self.peek_is(|data| matches!(data, EventData::MappingEnd { .. })) {
                self.next_event()?;
                break;
            }

            let key_mark = self.peek_mark();
            let is_merge = self.peek_is(|data| {
                matches!(data, EventData::Scalar { value, style, .. }
                    if value == MERGE_KEY && matches!(style, ScalarStyle::Plain))
            });
            let key = self.build_node()?;
            let value = self.build_node()?;

            if is_merge {
                self.merge_into(&mut merged, value, &key_mark)?;
                continue;
            }

            let key = match key {
                Value::String(s) => s,
                Value::Null => "null".to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                _ => {
                    return Err(self.error_opt(
                        &key_mark,
                        "mapping keys must be scalars",
                    ));
                }
            };
            entries.insert(key, value);
        }

        // Explicit keys win over merged ones
        for (key, value) in entries {
            merged.insert(key, value);
        }
        Ok(merged)
    }

    fn merge_into(
        &self,
        merged: &mut Map<String, Value>,
        value: Value,
        mark: &Option<Mark>,
    ) -> Result<(), LoadError> {
        let sources = match value {
            Value::Object(map) => vec![map],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map),
                    _ => Err(self.error_opt(mark, "merge key sequence must contain mappings")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(self.error_opt(mark, "merge key value must be a mapping")),
        };

        for source in sources {
            for (key, value) in source {
                merged.entry(key).or_insert(value);
            }
        }
        Ok(())
    }

    fn include(&self, payload: &str, mark: &Mark) -> Result<Value, LoadError> {
        if payload.trim().is_empty() {
            return Err(LoadError::InvalidInclude {
                path: self.ctx.file().to_path_buf(),
                line: mark_line(mark),
                reason: "include path is empty".to_string(),
            });
        }
        self.loader.load_include(self.ctx, payload.trim())
    }

    fn reject_include_tag(
        &self,
        tag: Option<&str>,
        mark: &Mark,
        what: &str,
    ) -> Result<(), LoadError> {
        if tag == Some(self.loader.options().include_tag.as_str()) {
            return Err(LoadError::InvalidInclude {
                path: self.ctx.file().to_path_buf(),
                line: mark_line(mark),
                reason: format!("include payload must be a scalar path, found {what}"),
            });
        }
        Ok(())
    }

    fn remember(&mut self, anchor: Option<String>, node: &Value) {
        if let Some(anchor) = anchor {
            self.anchors.insert(anchor, node.clone());
        }
    }

    fn peek_is(&self, predicate: impl Fn(&EventData) -> bool) -> bool {
        self.events.front().is_some_and(|event| predicate(&event.data))
    }

    fn peek_mark(&self) -> Option<Mark> {
        self.events.front().map(|event| event.start_mark)
    }

    fn error_opt(&self, mark: &Option<Mark>, reason: impl Into<String>) -> LoadError {
        match mark {
            Some(mark) => self.error_at(mark, reason),
            None => self.error_at_offset(self.content.len(), reason),
        }
    }

    fn error_at(&self, mark: &Mark, reason: impl Into<String>) -> LoadError {
        LoadError::Parse(ParseDiagnostic::new(
            self.ctx.file(),
            self.content,
            mark.index as usize,
            mark_line(mark),
            mark.column as usize + 1,
            reason,
            &self.ctx.chain(),
        ))
    }

    fn error_at_offset(&self, offset: usize, reason: impl Into<String>) -> LoadError {
        let (line, column) = line_column(self.content, offset);
        LoadError::Parse(ParseDiagnostic::new(
            self.ctx.file(),
            self.content,
            offset,
            line,
            column,
            reason,
            &self.ctx.chain(),
        ))
    }
}

fn read_events(content: &str) -> Result<VecDeque<Event>, libyaml_safer::Error> {
    let mut input = content.as_bytes();
    let mut parser = Parser::new();
    parser.set_input_string(&mut input);

    let mut events = VecDeque::new();
    loop {
        let event = parser.parse()?;
        let done = matches!(event.data, EventData::StreamEnd { .. });
        events.push_back(event);
        if done {
            break;
        }
    }
    Ok(events)
}

/// Position of the first syntax error, as (byte offset, line, column)
///
/// serde_yaml runs the same libyaml grammar and reports a byte location.
fn locate_syntax_error(content: &str) -> (usize, usize, usize) {
    match serde_yaml::from_str::<serde_yaml::Value>(content) {
        Err(e) => match e.location() {
            Some(location) => (location.index(), location.line(), location.column()),
            None => (0, 1, 1),
        },
        Ok(_) => (0, 1, 1),
    }
}

fn mark_line(mark: &Mark) -> usize {
    mark.line as usize + 1
}

fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let before = &content[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
    (line, column)
}

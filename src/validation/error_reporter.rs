//! Renders validation violations against the source of the data file

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::collections::HashMap;
use std::path::Path;
use yaml_spanned::{Spanned, Value as YamlValue, from_str};

use super::error::Violation;

#[derive(Debug, Clone, Copy)]
pub struct SpanInfo {
    pub start: usize,
    pub end: usize,
}

#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    #[source_code]
    pub source_code: NamedSource<String>,

    #[label("{label}")]
    pub span: SourceSpan,

    pub label: String,
    pub message: String,

    #[help]
    pub help: Option<String>,
}

/// Maps JSON pointers of the top-level data file to their source spans
///
/// Values spliced in by an include have no span of their own; they are
/// reported at the include directive, the closest ancestor that has one.
pub struct SpannedDocument {
    spans: HashMap<String, SpanInfo>,
    key_spans: HashMap<String, SpanInfo>,
    source: String,
    file_path: String,
}

impl SpannedDocument {
    pub fn new(file_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let source = std::fs::read_to_string(file_path)?;
        let spanned_yaml: Spanned<YamlValue> = from_str(&source)?;

        let mut spans = HashMap::new();
        let mut key_spans = HashMap::new();
        Self::index(&spanned_yaml, String::new(), &mut spans, &mut key_spans);

        Ok(Self {
            spans,
            key_spans,
            source,
            file_path: file_path.display().to_string(),
        })
    }

    pub fn diagnostic(&self, violation: &Violation) -> ViolationDiagnostic {
        let instance_path = refine_instance_path(violation);
        let is_unexpected_key = instance_path != violation.instance_path;

        let span_info = is_unexpected_key
            .then(|| self.key_spans.get(&instance_path).copied())
            .flatten()
            .unwrap_or_else(|| self.closest_span(&instance_path));

        let help = if violation.branches.is_empty() {
            Some(format!("schema rule: {}", violation.schema_path))
        } else {
            let branches: Vec<String> = violation
                .branches
                .iter()
                .map(|b| format!("{} at {}", b.message, b.schema_path))
                .collect();
            Some(format!(
                "schema rule: {}\nbranch errors:\n  {}",
                violation.schema_path,
                branches.join("\n  ")
            ))
        };

        ViolationDiagnostic {
            source_code: crate::error_utils::create_named_source(
                Path::new(&self.file_path),
                self.source.clone(),
            ),
            span: SourceSpan::new(span_info.start.into(), span_info.end - span_info.start),
            label: if instance_path.is_empty() {
                "document".to_string()
            } else {
                instance_path
            },
            message: violation.message.clone(),
            help,
        }
    }

    /// Span of the longest prefix of `pointer` present in this file
    fn closest_span(&self, pointer: &str) -> SpanInfo {
        let mut candidate = pointer;
        loop {
            if let Some(span) = self.spans.get(candidate) {
                return *span;
            }
            match candidate.rfind('/') {
                Some(idx) => candidate = &candidate[..idx],
                None => return SpanInfo { start: 0, end: 0 },
            }
        }
    }

    fn index(
        spanned: &Spanned<YamlValue>,
        path: String,
        spans: &mut HashMap<String, SpanInfo>,
        key_spans: &mut HashMap<String, SpanInfo>,
    ) {
        spans.insert(path.clone(), span_of(spanned));

        match spanned.as_ref() {
            YamlValue::Sequence(seq) => {
                for (i, item) in seq.iter().enumerate() {
                    Self::index(item, format!("{path}/{i}"), spans, key_spans);
                }
            }
            YamlValue::Mapping(map) => {
                for (key_spanned, value_spanned) in map {
                    let key = match key_spanned.as_ref() {
                        YamlValue::String(key) => key.clone(),
                        YamlValue::Number(n) => match n.as_i64() {
                            Some(i) => i.to_string(),
                            None => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
                        },
                        YamlValue::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    let value_path = format!("{path}/{}", escape_pointer(&key));
                    key_spans.insert(value_path.clone(), span_of(key_spanned));
                    Self::index(value_spanned, value_path, spans, key_spans);
                }
            }
            YamlValue::Tagged(tagged_value) => {
                Self::index(&tagged_value.value, path, spans, key_spans);
            }
            _ => {}
        }
    }
}

fn span_of(spanned: &Spanned<YamlValue>) -> SpanInfo {
    let span = spanned.span();
    let start = span.start.unwrap_or_default().byte_index;
    let end = span.end.unwrap_or_default().byte_index.max(start);
    SpanInfo { start, end }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Point "additional properties" errors at the offending key itself
fn refine_instance_path(violation: &Violation) -> String {
    let message = &violation.message;
    if message.contains("Additional properties are not allowed")
        && let Some(start) = message.find("('")
        && let Some(end) = message[start + 2..].find('\'')
    {
        let prop_name = &message[start + 2..start + 2 + end];
        return format!("{}/{}", violation.instance_path, escape_pointer(prop_name));
    }
    violation.instance_path.clone()
}

//! Question sources and the plain-text question file format.
//!
//! A file is a metadata heading, the delimiter line, then records separated
//! by blank lines:
//!
//! ```text
//! Some heading the parser ignores.
//! <!========================================================!>
//! Question: Capital of France?
//! Answer:   #Paris# is the capital.
//!
//! Question: 2 + 2?
//! Answer:   4
//! Regexp:   ^4$
//! ```

use crate::types::QuestionRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Delimiter between the file heading and the question records.
const HEADING_END: &str = "<!========================================================!>";

#[derive(Debug, thiserror::Error)]
pub enum QuestionsError {
    #[error("failed to read question source {source_id:?}: {source}")]
    Io {
        source_id: String,
        #[source]
        source: std::io::Error,
    },
    #[error("question source {source_id:?} has no heading delimiter")]
    MissingDelimiter { source_id: String },
}

/// A named collection of questions. Returns every record it has; shuffling
/// and batching are the pool's job.
pub trait QuestionSource: Send {
    fn load(&self, source_id: &str) -> Result<Vec<QuestionRecord>, QuestionsError>;
}

/// Question source backed by `<dir>/<source_id>.txt` files.
#[derive(Debug, Clone)]
pub struct FileQuestionSource {
    dir: PathBuf,
}

impl FileQuestionSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl QuestionSource for FileQuestionSource {
    fn load(&self, source_id: &str) -> Result<Vec<QuestionRecord>, QuestionsError> {
        let path = self.dir.join(format!("{source_id}.txt"));
        let data = std::fs::read_to_string(&path).map_err(|e| QuestionsError::Io {
            source_id: source_id.to_string(),
            source: e,
        })?;
        parse_question_file(source_id, &path, &data)
    }
}

fn parse_question_file(
    source_id: &str,
    path: &Path,
    data: &str,
) -> Result<Vec<QuestionRecord>, QuestionsError> {
    let Some((_, body)) = data.split_once(HEADING_END) else {
        return Err(QuestionsError::MissingDelimiter {
            source_id: source_id.to_string(),
        });
    };

    let mut raw: Vec<HashMap<String, String>> = vec![HashMap::new()];

    for line in body.lines() {
        if let Some((key, value)) = parse_field(line) {
            if let Some(record) = raw.last_mut() {
                record.insert(key, value);
            }
        } else {
            raw.push(HashMap::new());
        }
    }

    let mut records = Vec::new();
    for mut fields in raw.into_iter().filter(|f| !f.is_empty()) {
        match (fields.remove("question"), fields.remove("answer")) {
            (Some(question), Some(answer)) => records.push(QuestionRecord {
                question,
                answer,
                regexp: fields.remove("regexp"),
            }),
            _ => {
                tracing::warn!(source_id, path = %path.display(), "skipping record without question or answer");
            }
        }
    }

    Ok(records)
}

/// Parse a `Key: value` line. Keys are word characters only and are
/// lowercased; at least one whitespace character must follow the colon.
fn parse_field(line: &str) -> Option<(String, String)> {
    let (key, rest) = line.split_once(':')?;
    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let value = rest.trim_start();
    if value.is_empty() || value.len() == rest.len() {
        return None;
    }
    Some((key.to_lowercase(), value.to_string()))
}

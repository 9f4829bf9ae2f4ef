//! Append-only JSON lines journal.

use super::{Mutation, PersistenceError, PersistenceResult, PersistenceSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one JSON object per mutation and line.
pub struct JournalSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JournalSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JournalSink<BufWriter<File>> {
    /// Append to a journal file, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .map_err(|e| {
                PersistenceError::Io(format!(
                    "Failed to open journal {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> PersistenceSink for JournalSink<W> {
    fn persist(&mut self, mutation: &Mutation) -> PersistenceResult<()> {
        let line = serde_json::to_string(mutation)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| PersistenceError::Io(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| PersistenceError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    #[test]
    fn test_writes_json_lines() {
        let mut sink = JournalSink::new(Vec::new());
        sink.persist(&Mutation::DeleteNode {
            node_id: "1".to_string(),
        })
        .unwrap();
        sink.persist(&Mutation::DeleteNode {
            node_id: "2".to_string(),
        })
        .unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            serde_json::from_str::<Mutation>(lines[1]).unwrap(),
            Mutation::DeleteNode {
                node_id: "2".to_string()
            }
        );
    }

    #[test]
    fn test_file_journal_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");

        for id in ["a", "b"] {
            let mut sink = JournalSink::open(&path).unwrap();
            sink.persist(&Mutation::DeleteNode {
                node_id: id.to_string(),
            })
            .unwrap();
        }

        let reader = BufReader::new(File::open(&path).unwrap());
        let ids: Vec<String> = reader
            .lines()
            .map(|line| match serde_json::from_str(&line.unwrap()).unwrap() {
                Mutation::DeleteNode { node_id } => node_id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}

//! Streaming JSON-lines dataset reader

use crate::instance::SharedAssembler;
use crate::types::{AnswerType, Instance};
use anyhow::{Context, Result};
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, info_span, Span};

/// Lazily turns a JSONL source into instances.
///
/// Each item is tagged with the 0-based line index it came from. Examples
/// are assembled concurrently (up to `workers`) but yielded in input order.
/// Skipped examples produce no item; fatal ones produce an `Err` and the
/// consumer decides whether to keep reading.
pub struct DatasetReader {
    assembler: SharedAssembler,
}

impl DatasetReader {
    pub fn new(assembler: SharedAssembler) -> Self {
        Self { assembler }
    }

    /// Open `path` and stream its instances. The file is closed when the
    /// stream is dropped, whether or not it was read to the end.
    pub async fn read(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<impl Stream<Item = Result<(usize, Instance)>> + Send + 'static> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Cannot open '{}'", path.display()))?;

        let session = info_span!("read_session", path = %path.display());
        session.in_scope(|| info!("Reading instances from lines in file"));

        Ok(self.stream_lines(BufReader::new(file), session))
    }

    /// Same pipeline over in-memory JSONL
    pub fn read_str(
        &self,
        content: &str,
    ) -> impl Stream<Item = Result<(usize, Instance)>> + Send + 'static {
        let session = info_span!("read_session", path = "<memory>");
        let cursor = std::io::Cursor::new(content.as_bytes().to_vec());
        self.stream_lines(BufReader::new(cursor), session)
    }

    fn stream_lines<R>(
        &self,
        reader: R,
        session: Span,
    ) -> impl Stream<Item = Result<(usize, Instance)>> + Send + 'static
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        // Stop at the first I/O error rather than polling a broken reader
        let lines = stream::unfold(Some(reader.lines()), |state| async move {
            let mut lines = state?;
            match lines.next_line().await {
                Ok(Some(line)) => Some((Ok(line), Some(lines))),
                Ok(None) => None,
                Err(e) => Some((Err(anyhow::Error::from(e).context("Read error")), None)),
            }
        });

        let assembler = Arc::clone(&self.assembler);
        let workers = assembler.config().workers.max(1);

        lines
            .enumerate()
            .filter(|(_, line)| future::ready(!matches!(line, Ok(l) if l.trim().is_empty())))
            .map(move |(idx, line)| {
                let assembler = Arc::clone(&assembler);
                let session = session.clone();
                async move {
                    let line = line?;
                    let task = tokio::task::spawn_blocking(move || {
                        session.in_scope(|| assembler.line_to_instance(&line))
                    });
                    let instance = task
                        .await
                        .context("Assembly task failed")?
                        .with_context(|| {
                            format!("Failed to assemble example on line {}", idx + 1)
                        })?;
                    Ok(instance.map(|instance| (idx, instance)))
                }
            })
            .buffered(workers)
            .filter_map(|res: Result<Option<(usize, Instance)>>| future::ready(res.transpose()))
    }
}

/// Running totals over a read session
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadSummary {
    pub instances: usize,
    pub failed: usize,
    pub supervised: usize,
    pub by_answer_type: BTreeMap<String, usize>,
    pub spans: usize,
    pub actions: usize,
    pub linked_actions: usize,
}

impl ReadSummary {
    pub fn record(&mut self, instance: &Instance) {
        self.instances += 1;
        self.spans += instance.spans.len();
        self.actions += instance.actions.actions.len();
        self.linked_actions += instance.actions.num_linked();
        if let Some(supervision) = &instance.supervision {
            self.supervised += 1;
            *self
                .by_answer_type
                .entry(supervision.gold_type.to_string())
                .or_insert(0) += 1;
        }
    }

    pub fn count_for(&self, answer_type: AnswerType) -> usize {
        self.by_answer_type
            .get(answer_type.tag())
            .copied()
            .unwrap_or(0)
    }
}

//! Streams a JSONL file of raw examples through the grounding pipeline

use anyhow::Context;
use futures::StreamExt;
use semqa_grounding::{DatasetReader, InstanceAssembler, ReadSummary, ReaderConfig, SampleGrammar};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let path = std::env::args()
        .skip(1)
        .find(|arg| !arg.starts_with("--"))
        .context("usage: semqa-reader <examples.jsonl> [--keep-going]")?;
    // Without --keep-going the first fatal example aborts the run
    let keep_going = std::env::args().any(|arg| arg == "--keep-going");

    let config = ReaderConfig::from_env()?;
    info!(
        "Accepted answer types: {:?}, workers: {}",
        config.accepted_answer_types, config.workers
    );

    let assembler = InstanceAssembler::new(Arc::new(SampleGrammar::new()), config);
    let reader = DatasetReader::new(assembler);

    let mut instances = Box::pin(reader.read(&path).await?);
    let mut summary = ReadSummary::default();

    while let Some(item) = instances.next().await {
        match item {
            Ok((_, instance)) => summary.record(&instance),
            Err(e) if keep_going => {
                error!("{:#}", e);
                summary.failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Read complete: {} instances ({} supervised), {} failed",
        summary.instances, summary.supervised, summary.failed
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

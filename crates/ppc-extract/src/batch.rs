//! Batch extraction over a fixed-width rayon pool.
//!
//! One sandbox per batch, one `task-{i}` directory per content id. Each task
//! looks the id up in the index, extracts it into its own directory, and
//! measures it; byte counts are combined with `try_reduce`.
//!
//! On the first failure rayon stops handing out new tasks, tasks already
//! running finish, every directory is released by its guard, and the error
//! is returned to the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use ppc_core::{PpcError, PpcResult};
use ppc_index::BlockIndex;
use rayon::prelude::*;
use tracing::{error, info};

use crate::sandbox::Sandbox;
use crate::ExtractContext;

/// Progress callback type (tasks_done, tasks_total)
pub type ProgressFn<'a> = dyn Fn(u64, u64) + Send + Sync + 'a;

/// Extract every id in `content_ids`, returning the total bytes extracted.
pub fn extract_batch(
    ctx: &ExtractContext<'_>,
    index: &dyn BlockIndex,
    content_ids: &[String],
    workers: usize,
    progress: Option<&ProgressFn<'_>>,
) -> PpcResult<u64> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("ppc-extract-{i}"))
        .build()
        .map_err(|e| PpcError::Config(format!("building worker pool: {e}")))?;

    let sandbox = Sandbox::create(ctx.output_dir, ctx.sandbox_prefix, "batch")?;
    let total = content_ids.len() as u64;
    let done = AtomicU64::new(0);

    let bytes = pool.install(|| {
        content_ids
            .par_iter()
            .enumerate()
            .map(|(i, content_id)| -> PpcResult<u64> {
                let bytes = extract_task(ctx, index, &sandbox, i, content_id)?;
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = progress {
                    progress(n, total);
                }
                Ok(bytes)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))
    })?;

    sandbox.close()?;
    info!(files = total, bytes, workers, "batch extracted");
    Ok(bytes)
}

fn extract_task(
    ctx: &ExtractContext<'_>,
    index: &dyn BlockIndex,
    sandbox: &Sandbox,
    task: usize,
    content_id: &str,
) -> PpcResult<u64> {
    let block = index
        .get(content_id)?
        .ok_or_else(|| PpcError::IndexMiss(content_id.to_string()))?;

    let dir = sandbox.task_dir(task)?;
    let archive = ctx.input_dir.join(&block);
    if let Err(e) = ctx.extractor.extract_member(&archive, content_id, dir.path()) {
        error!(content_id, block = %block, "extraction failed: {e}");
        return Err(e);
    }

    let extracted = dir.path().join(content_id);
    let bytes = match std::fs::metadata(&extracted) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => {
            error!(content_id, block = %block, "member missing after extraction");
            return Err(PpcError::MemberMissing(extracted));
        }
    };

    dir.close()?;
    Ok(bytes)
}

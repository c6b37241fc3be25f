use anyhow::Result;

/// Every command runs to completion before the next one, so one thread is all the cli needs.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

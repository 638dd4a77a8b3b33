use std::future::Future;
use std::io;

/// Runs `future` to completion on a current-thread runtime, then shuts the
/// runtime down without waiting for blocking tasks still in flight.
///
/// A verification prompt blocked on the terminal must not hold up exit after
/// an interrupt.
pub fn run_detached<F: Future>(future: F) -> io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

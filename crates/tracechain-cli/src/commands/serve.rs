//! Serve command implementation.

use tracechain_server::logging::init_logging;
use tracechain_server::ServeConfig;

pub fn run(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(config.log_format);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tracechain_server::serve(config))?;
    Ok(())
}

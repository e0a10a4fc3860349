use crate::error::Result;

/// Initialize the `env_logger` backend, configured by the `RUST_LOG` environment variable
pub fn set_default_logger() -> Result<()> {
    env_logger::try_init().map_err(err_map!(Unexpected, "Error initializing logger"))?;
    debug!("Initialized default logger");
    Ok(())
}

//! List command feature.
//!
//! This module owns and handles the "junksweep list" command behavior.

use crate::output;
use crate::registry::Registry;

pub(crate) fn handle_list() -> anyhow::Result<()> {
    let registry = Registry::detect()?;
    output::print_registry(&registry);
    Ok(())
}

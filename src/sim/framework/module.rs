use anyhow::Result;

use super::{Bus, SimContext};

/// A composable simulation module.
pub trait SimModule {
    /// Identifier used in error messages.
    fn name(&self) -> &'static str;

    /// One-time setup, called when the scene is initialized.
    fn init(&mut self, _ctx: &SimContext, _bus: &mut Bus) -> Result<()> {
        Ok(())
    }

    /// Advances the module by one step.
    fn step(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()>;
}

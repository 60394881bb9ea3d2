use anyhow::{Context, Result};

use super::{Bus, SimContext, SimModule};

/// Runs a sequence of simulation modules in insertion order.
pub struct Pipeline {
    modules: Vec<Box<dyn SimModule>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { modules: vec![] }
    }

    pub fn with_module<M: SimModule + 'static>(mut self, module: M) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn init(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        for module in self.modules.iter_mut() {
            let name = module.name();
            module
                .init(ctx, bus)
                .with_context(|| format!("module '{name}' failed to initialize"))?;
        }
        Ok(())
    }

    /// Steps every module; stops at the first failure.
    pub fn step(&mut self, ctx: &SimContext, bus: &mut Bus) -> Result<()> {
        for module in self.modules.iter_mut() {
            let name = module.name();
            module
                .step(ctx, bus)
                .with_context(|| format!("module '{name}' failed at t={}", ctx.time))?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

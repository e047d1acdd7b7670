use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Compiler and VM knobs, usually read from a TOML file.
///
/// ```toml
/// max_errors = 20
/// verify_stack = true
///
/// [switch]
/// min_table_density = 0.5
///
/// [vm]
/// max_steps = 10000000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Stop recording errors after this many; checking itself always completes.
    pub max_errors: Option<usize>,
    pub verify_stack: bool,
    pub switch: SwitchOptions,
    pub vm: VmOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchOptions {
    /// Below this fraction of populated keys a lookup switch is emitted.
    pub min_table_density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmOptions {
    /// Instruction budget for one run.
    pub max_steps: u64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_errors: None,
            verify_stack: true,
            switch: SwitchOptions::default(),
            vm: VmOptions::default(),
        }
    }
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self { min_table_density: 0.5 }
    }
}

impl Default for VmOptions {
    fn default() -> Self {
        Self { max_steps: 10_000_000 }
    }
}

impl CompileOptions {
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let options: CompileOptions = toml::from_str(src).context("invalid options")?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("loading options from {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let density = self.switch.min_table_density;
        if !(0.0..=1.0).contains(&density) {
            bail!("switch.min_table_density must be within 0..=1, got {}", density);
        }
        if self.vm.max_steps == 0 {
            bail!("vm.max_steps must be positive");
        }
        Ok(())
    }
}

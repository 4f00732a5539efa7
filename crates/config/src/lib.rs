// Zube - Z80 bus bridge for the Caravel management core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[serde(alias = "riscv32", alias = "rv32imc", alias = "picorv32", alias = "vexriscv")]
    RiscV,
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PeripheralConfig {
    pub id: String,
    pub r#type: String, // "housekeeping", "logic_analyzer", "z80_bridge"
    pub base_address: u64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub config: HashMap<String, serde_yaml::Value>,
}

impl PeripheralConfig {
    /// Integer entry of the free-form `config` map.
    pub fn config_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.config.get(key) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                anyhow::anyhow!(
                    "Field '{}' in 'config' of peripheral '{}' must be an unsigned integer",
                    key,
                    self.id
                )
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChipDescriptor {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub arch: Arch,
    pub peripherals: Vec<PeripheralConfig>,
}

impl ChipDescriptor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chip descriptor at {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse Chip Descriptor YAML")
    }

    pub fn peripheral(&self, id: &str) -> Option<&PeripheralConfig> {
        self.peripherals.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct BenchInputs {
    /// Chip descriptor, relative to the script. The built-in Caravel map when absent.
    #[serde(default)]
    pub chip: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchLimits {
    /// Firmware poll iterations per exchange before giving up on a reply.
    pub max_polls: u32,
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl Default for BenchLimits {
    fn default() -> Self {
        Self {
            max_polls: 20,
            max_cycles: None,
        }
    }
}

/// One Z80 round trip: a byte to the data port and a byte to the control port.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Exchange {
    pub data: u8,
    pub control: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
    Floating,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Runner failed before simulation started (e.g. script parse/validation error).
    ConfigError,
    Completed,
    NoReply,
    MaxCycles,
    MemoryViolation,
    BusFloating,
    PadMisconfigured,
    BridgeInactive,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EchoComplementAssertion {
    pub echo_complement: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResetPulseAssertion {
    pub reset_pulse: Vec<Level>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BaseAddressAssertion {
    pub base_address: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StopReasonAssertion {
    pub expected_stop_reason: StopReason,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum BenchAssertion {
    EchoComplement(EchoComplementAssertion),
    ResetPulse(ResetPulseAssertion),
    BaseAddress(BaseAddressAssertion),
    ExpectedStopReason(StopReasonAssertion),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BenchScript {
    pub schema_version: String,
    #[serde(default)]
    pub inputs: BenchInputs,
    #[serde(default)]
    pub limits: BenchLimits,
    /// Z80 I/O port the master talks to. Defaults to the firmware's base address.
    #[serde(default)]
    pub port: Option<u8>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub assertions: Vec<BenchAssertion>,
}

impl BenchScript {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open bench script at {:?}", path.as_ref()))?;
        let script: Self =
            serde_yaml::from_reader(f).context("Failed to parse Bench Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let script: Self = serde_yaml::from_str(yaml).context("Failed to parse Bench Script YAML")?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.limits.max_polls == 0 {
            anyhow::bail!("Limit 'max_polls' must be greater than zero");
        }

        if self.limits.max_cycles == Some(0) {
            anyhow::bail!("Limit 'max_cycles' must be greater than zero when set");
        }

        if let Some(port) = self.port {
            if port > 0xFD {
                anyhow::bail!(
                    "Port {:#04x} leaves no room for the control and status ports",
                    port
                );
            }
        }

        if let Some(chip) = &self.inputs.chip {
            if chip.trim().is_empty() {
                anyhow::bail!("Input 'chip' path cannot be empty");
            }
        }

        if self.exchanges.is_empty() && self.assertions.is_empty() {
            tracing::warn!("Bench script has neither exchanges nor assertions");
        }

        Ok(())
    }

    /// Chip descriptor path resolved against the directory holding the script.
    pub fn chip_path(&self, script_path: &Path) -> Option<PathBuf> {
        let chip = self.inputs.chip.as_ref()?;
        let chip = Path::new(chip);
        if chip.is_absolute() {
            return Some(chip.to_path_buf());
        }
        Some(
            script_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(chip),
        )
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_script() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_polls: 20
exchanges:
  - { data: 0, control: 1 }
  - { data: 0x3c, control: 0xff }
assertions:
  - echo_complement: true
  - base_address: 0x81
  - reset_pulse: [high, low, high]
"#;
        let script = BenchScript::from_yaml(yaml).unwrap();
        assert_eq!(script.exchanges.len(), 2);
        assert_eq!(
            script.exchanges[1],
            Exchange {
                data: 0x3C,
                control: 0xFF
            }
        );
        assert_eq!(script.assertions.len(), 3);
        assert!(matches!(
            &script.assertions[2],
            BenchAssertion::ResetPulse(a) if a.reset_pulse == vec![Level::High, Level::Low, Level::High]
        ));
        assert!(matches!(
            &script.assertions[1],
            BenchAssertion::BaseAddress(BaseAddressAssertion { base_address: 0x81 })
        ));
    }

    #[test]
    fn test_unsupported_schema_version() {
        let yaml = r#"
schema_version: "2.0"
limits:
  max_polls: 20
"#;
        let err = BenchScript::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("Unsupported schema_version"));
    }

    #[test]
    fn test_zero_max_polls() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_polls: 0
"#;
        let err = BenchScript::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("max_polls"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
schema_version: "1.0"
limits:
  max_polls: 5
  max_steps: 100
"#;
        assert!(BenchScript::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_byte_out_of_range_rejected() {
        let yaml = r#"
schema_version: "1.0"
exchanges:
  - { data: 256, control: 0 }
"#;
        assert!(BenchScript::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_port_too_high() {
        let yaml = r#"
schema_version: "1.0"
port: 0xfe
"#;
        let err = BenchScript::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("control and status ports"));
    }

    #[test]
    fn test_chip_path_resolves_next_to_script() {
        let yaml = r#"
schema_version: "1.0"
inputs:
  chip: chips/caravel.yaml
"#;
        let script = BenchScript::from_yaml(yaml).unwrap();
        let resolved = script
            .chip_path(Path::new("/work/bench/ping.yaml"))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("/work/bench/chips/caravel.yaml"));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("lots").is_err());
    }
}

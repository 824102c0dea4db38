use anyhow::Result;

use modlink_lib::toolchain::ToolchainConfig;

use crate::output::print_json;

pub fn cmd_info() -> Result<()> {
  println!("modlink v{}", env!("CARGO_PKG_VERSION"));
  println!("Default toolchain configuration:");
  print_json(&ToolchainConfig::default())
}

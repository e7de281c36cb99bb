//! Host detection for the standard test variables.

pub mod arch;
pub mod os;

use arch::Arch;
use os::Os;

/// Name of the test variable holding the OS family.
pub const OS_TYPE: &str = "os_type";
/// Name of the test variable holding the system name.
pub const SYSTEM: &str = "system";
/// Name of the test variable holding the CPU architecture.
pub const ARCHITECTURE: &str = "architecture";

/// Standard test variables describing the running host.
///
/// Variables whose value cannot be detected are left out, so expressions
/// testing them fail as undefined rather than matching a guess.
pub fn host_variables() -> Vec<(&'static str, &'static str)> {
  let mut vars = Vec::new();
  if let Some(os) = Os::current() {
    vars.push((OS_TYPE, os.os_type()));
    vars.push((SYSTEM, os.system()));
  }
  if let Some(arch) = Arch::current() {
    vars.push((ARCHITECTURE, arch.as_str()));
  }
  vars
}

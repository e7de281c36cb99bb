use std::fmt;

/// Operating systems that can be reported to conditional expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  FreeBsd,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::MacOs),
      "freebsd" => Some(Self::FreeBsd),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Value of the `os_type` test variable
  pub fn os_type(&self) -> &'static str {
    match self {
      Self::Windows => "Win32",
      _ => "Unix",
    }
  }

  /// Value of the `system` test variable
  pub fn system(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "macosx",
      Self::FreeBsd => "freebsd",
      Self::Windows => "win64",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.system())
  }
}

use crate::error::Error;
use crate::profile::TrustMode;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

fn default_command_timeout() -> Duration {
  Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS)
}

/// Filesystem layout and tunables for the lifecycle manager.
///
/// Every path is explicit so tests can point the whole system at a
/// temporary directory.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
  /// Easy-RSA working directory (contains the `pki/` store).
  pub easyrsa_dir: PathBuf,
  /// The `easyrsa` executable.
  pub easyrsa_bin: PathBuf,
  /// Directory rendered `.ovpn` profiles are written to.
  pub output_dir: PathBuf,
  /// Base client template prepended to every profile.
  pub template_path: PathBuf,
  /// Shared trust secret (tls-crypt or tls-auth key).
  pub trust_key_path: PathBuf,
  /// Flat block-list file, one suspended client name per line.
  pub blocklist_path: PathBuf,
  /// Where the regenerated CRL is copied for the VPN server to read.
  pub crl_path: PathBuf,
  /// Trust secret embedding convention.
  pub trust_mode: TrustMode,
  /// Upper bound on any single external PKI command.
  #[serde(default = "default_command_timeout", with = "timeout_secs")]
  pub command_timeout: Duration,
}

mod timeout_secs {
  use serde::Deserialize;
  use serde::Deserializer;
  use std::time::Duration;

  pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
  where
    D: Deserializer<'de>,
  {
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
  }
}

impl Config {
  /// Derive the layout used by Nyr's openvpn-install from a single server
  /// directory (conventionally `/etc/openvpn/server`).
  ///
  /// The trust mode is inferred from the trust-key filename: `tc.key` is
  /// a tls-crypt key, anything else is treated as a legacy tls-auth key.
  pub fn from_server_dir(server_dir: impl AsRef<Path>) -> Self {
    let base = server_dir.as_ref();
    let easyrsa_dir = base.join("easy-rsa");
    let trust_key_path = base.join("tc.key");
    let trust_mode = Self::infer_trust_mode(&trust_key_path);
    Config {
      easyrsa_bin: easyrsa_dir.join("easyrsa"),
      easyrsa_dir,
      output_dir: base.join("clients"),
      template_path: base.join("client-common.txt"),
      trust_key_path,
      blocklist_path: base.join("blocked_clients.txt"),
      crl_path: base.join("crl.pem"),
      trust_mode,
      command_timeout: default_command_timeout(),
    }
  }

  /// Load a configuration from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| {
      Error::Validation(format!("malformed configuration: {}", err))
    })
  }

  /// Easy-RSA's `pki/` store directory.
  pub fn pki_dir(&self) -> PathBuf {
    self.easyrsa_dir.join("pki")
  }

  /// Deterministic path of a client's rendered profile.
  pub fn profile_path(&self, name: &str) -> PathBuf {
    self.output_dir.join(format!("{}.ovpn", name))
  }

  fn infer_trust_mode(trust_key_path: &Path) -> TrustMode {
    let is_tls_crypt = trust_key_path
      .file_name()
      .and_then(|f| f.to_str())
      .map(|f| f.starts_with("tc"))
      .unwrap_or(false);
    if is_tls_crypt {
      TrustMode::TlsCrypt
    } else {
      TrustMode::TlsAuth
    }
  }
}

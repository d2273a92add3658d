use super::fake_pki::FakePki;
use ovpn_manager::ClientManager;
use ovpn_manager::Config;
use ovpn_manager::TrustMode;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// A scratch OpenVPN server directory with a template and trust key in
/// place, torn down with the temp dir.
pub struct TestEnv {
  #[allow(unused)]
  dir: TempDir,
  pub config: Config,
}

impl TestEnv {
  pub fn new() -> Self {
    Self::with_trust_mode(TrustMode::TlsCrypt)
  }

  pub fn with_trust_mode(trust_mode: TrustMode) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    std::fs::write(base.join("client-common.txt"), "client\ndev tun\n")
      .unwrap();
    std::fs::write(base.join("tc.key"), "TRUST-SECRET").unwrap();

    let easyrsa_dir = base.join("easy-rsa");
    let config = Config {
      easyrsa_bin: easyrsa_dir.join("easyrsa"),
      easyrsa_dir,
      output_dir: base.join("clients"),
      template_path: base.join("client-common.txt"),
      trust_key_path: base.join("tc.key"),
      blocklist_path: base.join("blocked_clients.txt"),
      crl_path: base.join("crl.pem"),
      trust_mode,
      command_timeout: Duration::from_secs(5),
    };

    TestEnv { dir, config }
  }

  pub fn manager(&self, backend: FakePki) -> ClientManager<FakePki> {
    ClientManager::new(self.config.clone(), backend)
  }

  pub fn blocklist_path(&self) -> PathBuf {
    self.config.blocklist_path.clone()
  }

  pub fn crl_path(&self) -> PathBuf {
    self.config.crl_path.clone()
  }
}

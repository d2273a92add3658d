use crate::backend::IssuedCredentials;
use crate::backend::PkiBackend;
use crate::config::Config;
use crate::error::issuance_err;
use crate::error::revocation_err;
use crate::error::Error;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use tracing::error;

/// [`PkiBackend`] implemented by shelling out to the Easy-RSA tool.
///
/// Commands run with the Easy-RSA directory as working directory and
/// `EASYRSA_BATCH=1` set; `build-client-full` and `revoke` can still
/// prompt for confirmation, so those get `yes` piped to stdin. Every
/// invocation is bounded by the configured timeout.
pub struct EasyRsa {
  dir: PathBuf,
  bin: PathBuf,
  timeout: Duration,
}

impl EasyRsa {
  pub fn new(config: &Config) -> Self {
    EasyRsa {
      dir: config.easyrsa_dir.clone(),
      bin: config.easyrsa_bin.clone(),
      timeout: config.command_timeout,
    }
  }

  fn pki_dir(&self) -> PathBuf {
    self.dir.join("pki")
  }

  /// Run `easyrsa` with `args`, returning stdout on success and a
  /// diagnostic string (exit status plus stderr, or the timeout note)
  /// on failure. The caller decides the error kind.
  async fn run(&self, args: &[&str]) -> Result<String, String> {
    let confirm =
      matches!(args.first(), Some(&"build-client-full") | Some(&"revoke"));
    debug!(bin = %self.bin.display(), ?args, "executing easyrsa");

    let mut child = Command::new(&self.bin)
      .args(args)
      .current_dir(&self.dir)
      .env("EASYRSA_BATCH", "1")
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|err| {
        format!("failed to spawn {}: {}", self.bin.display(), err)
      })?;

    if let Some(mut stdin) = child.stdin.take() {
      if confirm {
        // Under EASYRSA_BATCH=1 the child usually exits or closes stdin
        // without reading the confirmation; a broken pipe here is not a
        // failure.
        match stdin.write_all(b"yes\n").await {
          Ok(()) => {}
          Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {}
          Err(err) => {
            return Err(format!("failed to confirm prompt: {}", err));
          }
        }
      }
    }

    let output = tokio::time::timeout(self.timeout, child.wait_with_output())
      .await
      .map_err(|_| {
        format!("easyrsa {} timed out after {:?}", args.join(" "), self.timeout)
      })?
      .map_err(|err| format!("easyrsa did not complete: {}", err))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      error!(status = ?output.status.code(), %stderr, "easyrsa command failed");
      return Err(format!(
        "easyrsa {} failed ({}): {}",
        args.join(" "),
        output.status,
        stderr.trim()
      ));
    }

    debug!(%stdout, "easyrsa command succeeded");
    if !stderr.is_empty() {
      debug!(%stderr, "easyrsa stderr");
    }
    Ok(stdout)
  }

  fn issued_cert_path(&self, name: &str) -> PathBuf {
    self.pki_dir().join("issued").join(format!("{}.crt", name))
  }

  fn private_key_path(&self, name: &str) -> PathBuf {
    self.pki_dir().join("private").join(format!("{}.key", name))
  }

  fn request_path(&self, name: &str) -> PathBuf {
    self.pki_dir().join("reqs").join(format!("{}.req", name))
  }
}

async fn remove_if_present(path: &PathBuf) -> Result<(), Error> {
  match tokio::fs::remove_file(path).await {
    Ok(()) => Ok(()),
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(err) => Err(err.into()),
  }
}

impl PkiBackend for EasyRsa {
  async fn issue_certificate(
    &self,
    name: &str,
    passphrase_protected: bool,
  ) -> Result<IssuedCredentials, Error> {
    let mut args = vec!["build-client-full", name];
    if !passphrase_protected {
      args.push("nopass");
    }
    self.run(&args).await.map_err(issuance_err)?;

    let certificate = tokio::fs::read_to_string(self.issued_cert_path(name))
      .await
      .map_err(|err| {
        issuance_err(format!("issued certificate unreadable: {}", err))
      })?;
    let private_key = tokio::fs::read_to_string(self.private_key_path(name))
      .await
      .map_err(|err| {
        issuance_err(format!("issued private key unreadable: {}", err))
      })?;

    Ok(IssuedCredentials {
      certificate,
      private_key,
    })
  }

  async fn revoke_certificate(&self, name: &str) -> Result<(), Error> {
    if !self.issued_cert_path(name).exists() {
      return Err(Error::NotFound(name.to_string()));
    }
    self.run(&["revoke", name]).await.map_err(revocation_err)?;
    Ok(())
  }

  async fn regenerate_crl(&self) -> Result<Vec<u8>, Error> {
    self.run(&["gen-crl"]).await.map_err(revocation_err)?;

    // The VPN server's revocation enforcement goes stale if this is ever
    // skipped, so a missing file here is a hard error.
    let crl_path = self.pki_dir().join("crl.pem");
    tokio::fs::read(&crl_path).await.map_err(|err| {
      revocation_err(format!(
        "{} not found after gen-crl: {}",
        crl_path.display(),
        err
      ))
    })
  }

  async fn ca_certificate(&self) -> Result<String, Error> {
    Ok(tokio::fs::read_to_string(self.pki_dir().join("ca.crt")).await?)
  }

  async fn remove_client_artifacts(&self, name: &str) -> Result<(), Error> {
    remove_if_present(&self.issued_cert_path(name)).await?;
    remove_if_present(&self.private_key_path(name)).await?;
    remove_if_present(&self.request_path(name)).await?;
    Ok(())
  }
}

use crate::backend::PkiBackend;
use crate::blocklist::Blocklist;
use crate::config::Config;
use crate::easyrsa::EasyRsa;
use crate::error::validation_err;
use crate::error::Error;
use crate::profile::render_profile;
use crate::profile::ProfileMaterial;
use std::path::PathBuf;
use tracing::info;
use tracing::instrument;
use tracing::warn;
use tracing::Level;

/// Sequences PKI operations, profile rendering and block-list updates
/// into the client lifecycle workflows.
///
/// Owns no long-lived state of its own: the PKI store, the rendered
/// profiles and the block-list file are the source of truth and are
/// re-read on every operation.
pub struct ClientManager<B: PkiBackend> {
  config: Config,
  backend: B,
  blocklist: Blocklist,
}

/// A name is used as both the PKI common-name and a filesystem key, so
/// it must not be empty or carry path separators, newlines or NUL.
fn validate_name(name: &str) -> Result<(), Error> {
  if name.is_empty() {
    return Err(validation_err("name must not be empty"));
  }
  if name.contains(['/', '\\']) {
    return Err(validation_err(format!(
      "name must not contain path separators: {:?}",
      name
    )));
  }
  if name.contains(['\n', '\r', '\0']) {
    return Err(validation_err(format!(
      "name must not contain newlines or NUL: {:?}",
      name
    )));
  }
  Ok(())
}

impl ClientManager<EasyRsa> {
  /// A manager backed by the Easy-RSA installation the configuration
  /// points at.
  pub fn with_easyrsa(config: Config) -> Self {
    let backend = EasyRsa::new(&config);
    ClientManager::new(config, backend)
  }
}

impl<B: PkiBackend> ClientManager<B> {
  pub fn new(config: Config, backend: B) -> Self {
    let blocklist = Blocklist::new(config.blocklist_path.clone());
    ClientManager {
      config,
      backend,
      blocklist,
    }
  }

  /// Issue a certificate for `name` and render its inline `.ovpn`
  /// profile. Returns the profile path.
  ///
  /// If issuance fails (name collision, backend failure) no profile is
  /// written.
  #[instrument(level = Level::INFO, name = "ovpn_manager::ClientManager::create_client", err, skip(self))]
  pub async fn create_client(
    &self,
    name: &str,
    passphrase_protected: bool,
  ) -> Result<PathBuf, Error> {
    validate_name(name)?;

    let credentials = self
      .backend
      .issue_certificate(name, passphrase_protected)
      .await?;

    let material = ProfileMaterial {
      ca: self.backend.ca_certificate().await?,
      cert: credentials.certificate,
      key: credentials.private_key,
      trust_secret: tokio::fs::read_to_string(&self.config.trust_key_path)
        .await?,
    };
    let template =
      tokio::fs::read_to_string(&self.config.template_path).await?;
    let profile =
      render_profile(&template, &material, self.config.trust_mode);

    tokio::fs::create_dir_all(&self.config.output_dir).await?;
    let path = self.config.profile_path(name);
    tokio::fs::write(&path, profile).await?;

    info!(name, path = %path.display(), "generated client profile");
    Ok(path)
  }

  /// The deterministic path of `name`'s rendered profile.
  pub fn profile_path(&self, name: &str) -> PathBuf {
    self.config.profile_path(name)
  }

  /// Like [`ClientManager::profile_path`], but fails with
  /// [`Error::NotFound`] when no profile has been rendered for `name`.
  pub async fn profile(&self, name: &str) -> Result<PathBuf, Error> {
    validate_name(name)?;
    let path = self.config.profile_path(name);
    if tokio::fs::try_exists(&path).await? {
      Ok(path)
    } else {
      Err(Error::NotFound(name.to_string()))
    }
  }

  /// Revoke `name`'s certificate, refresh the CRL the VPN server reads,
  /// then clean up the client's local artifacts.
  ///
  /// Strictly ordered: nothing local is touched until the backend has
  /// both revoked the certificate and produced a fresh CRL, and a
  /// failure to install that CRL is a hard error. Artifact and
  /// block-list cleanup afterwards is best-effort.
  #[instrument(level = Level::INFO, name = "ovpn_manager::ClientManager::revoke_client", err, skip(self))]
  pub async fn revoke_client(&self, name: &str) -> Result<(), Error> {
    validate_name(name)?;

    self.backend.revoke_certificate(name).await?;
    let crl = self.backend.regenerate_crl().await?;
    tokio::fs::write(&self.config.crl_path, crl).await?;

    if let Err(err) = self.backend.remove_client_artifacts(name).await {
      warn!(name, %err, "failed to remove PKI artifacts");
    }
    let profile = self.config.profile_path(name);
    match tokio::fs::remove_file(&profile).await {
      Ok(()) => {}
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
      Err(err) => warn!(name, %err, "failed to remove profile"),
    }
    if let Err(err) = self.blocklist.remove(name).await {
      warn!(name, %err, "failed to clear block-list entry");
    }

    info!(name, "revoked client and refreshed CRL");
    Ok(())
  }

  /// Add `name` to the block-list. Idempotent: returns `false` when the
  /// client was already suspended.
  ///
  /// Certificate validity is unaffected; enforcement happens in the VPN
  /// server's per-connection check against the block-list file.
  pub async fn suspend_client(&self, name: &str) -> Result<bool, Error> {
    validate_name(name)?;
    let added = self.blocklist.add(name).await?;
    if added {
      info!(name, "client suspended");
    } else {
      info!(name, "client already suspended");
    }
    Ok(added)
  }

  /// Remove `name` from the block-list. Idempotent: returns `false` when
  /// the client was not suspended.
  pub async fn unsuspend_client(&self, name: &str) -> Result<bool, Error> {
    validate_name(name)?;
    let removed = self.blocklist.remove(name).await?;
    if removed {
      info!(name, "client unsuspended");
    }
    Ok(removed)
  }

  /// The suspended client names, in insertion order. Empty when the
  /// block-list file is absent or blank.
  pub async fn list_suspended(&self) -> Result<Vec<String>, Error> {
    self.blocklist.load().await
  }
}

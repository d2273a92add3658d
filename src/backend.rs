use crate::error::Error;
use std::future::Future;

/// A signed client certificate and its private key, as produced by the
/// PKI backend.
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
  /// The client certificate, PEM.
  pub certificate: String,
  /// The client private key, PEM.
  pub private_key: String,
}

/// The certificate-authority capability the lifecycle orchestrator is
/// built against.
///
/// All signing, revocation and CRL production happen behind this trait,
/// so lifecycle policy can be exercised with an in-memory fake instead
/// of a real Easy-RSA installation.
pub trait PkiBackend {
  /// Create a signed certificate/key pair for `name`. Fails with
  /// [`Error::Issuance`] when the backend refuses (duplicate name,
  /// non-zero exit, timeout).
  fn issue_certificate(
    &self,
    name: &str,
    passphrase_protected: bool,
  ) -> impl Future<Output = Result<IssuedCredentials, Error>> + Send;

  /// Revoke `name`'s certificate. [`Error::NotFound`] when no such
  /// certificate was ever issued.
  fn revoke_certificate(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<(), Error>> + Send;

  /// Produce an up-to-date certificate revocation list.
  fn regenerate_crl(
    &self,
  ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;

  /// The CA certificate, PEM. Embedded into every rendered profile.
  fn ca_certificate(
    &self,
  ) -> impl Future<Output = Result<String, Error>> + Send;

  /// Best-effort removal of the backend's per-client files (issued
  /// certificate, private key, signing request). Missing files are not
  /// errors.
  fn remove_client_artifacts(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<(), Error>> + Send;
}

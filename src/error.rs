#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The client name was rejected before any I/O took place.
  #[error("invalid client name: {0}")]
  Validation(String),

  /// The PKI backend refused or failed to issue a certificate. Carries
  /// the backend's diagnostic output.
  #[error("certificate issuance failed: {0}")]
  Issuance(String),

  /// Certificate revocation or CRL regeneration failed. The whole revoke
  /// operation is aborted and no local state is touched.
  #[error("revocation failed: {0}")]
  Revocation(String),

  /// No artifact exists for the referenced client name.
  #[error("client not found: {0}")]
  NotFound(String),

  /// Block-list, profile or template file I/O failed.
  #[error(transparent)]
  Storage(#[from] std::io::Error),
}

pub fn validation_err(msg: impl Into<String>) -> Error {
  Error::Validation(msg.into())
}

pub fn issuance_err(msg: impl Into<String>) -> Error {
  Error::Issuance(msg.into())
}

pub fn revocation_err(msg: impl Into<String>) -> Error {
  Error::Revocation(msg.into())
}

use serde::Deserialize;

/// How the shared trust secret is embedded in a rendered profile.
///
/// The two modes are mutually exclusive and selected once at deployment
/// time. `TlsCrypt` is the modern wrapped-trust convention; `TlsAuth` is
/// the legacy shared-trust convention, which additionally requires a
/// `key-direction` line in the client profile.
#[derive(Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum TrustMode {
  TlsCrypt,
  TlsAuth,
}

impl TrustMode {
  /// The inline-block tag the OpenVPN client expects for this mode.
  pub fn tag(&self) -> &'static str {
    match self {
      TrustMode::TlsCrypt => "tls-crypt",
      TrustMode::TlsAuth => "tls-auth",
    }
  }
}

/// The credential material embedded into a client profile.
#[derive(Debug)]
pub struct ProfileMaterial {
  /// The CA certificate, PEM.
  pub ca: String,
  /// The client certificate, PEM.
  pub cert: String,
  /// The client private key, PEM.
  pub key: String,
  /// The shared trust secret (tls-crypt or tls-auth key).
  pub trust_secret: String,
}

fn embed(tag: &str, content: &str) -> String {
  format!("<{}>\n{}\n</{}>\n", tag, content.trim(), tag)
}

/// Render a complete inline client profile.
///
/// Pure function: takes content, returns content. All file reads and the
/// final write are the orchestrator's responsibility, so profile assembly
/// is testable without a PKI backend.
///
/// The base template is normalized to a single trailing newline, then the
/// four credential blocks are appended in order ca, cert, key, trust.
/// Under [`TrustMode::TlsAuth`] a `key-direction 1` line follows the
/// trust block; under [`TrustMode::TlsCrypt`] it never does.
pub fn render_profile(
  template: &str,
  material: &ProfileMaterial,
  mode: TrustMode,
) -> String {
  let mut profile = format!("{}\n", template.trim_end());
  profile += &embed("ca", &material.ca);
  profile += &embed("cert", &material.cert);
  profile += &embed("key", &material.key);
  profile += &embed(mode.tag(), &material.trust_secret);
  if mode == TrustMode::TlsAuth {
    profile += "key-direction 1\n";
  }
  profile
}

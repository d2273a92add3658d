use ovpn_manager::Error;
use ovpn_manager::IssuedCredentials;
use ovpn_manager::PkiBackend;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory PKI backend so lifecycle policy is testable without an
/// Easy-RSA installation.
///
/// Tracks issued names (duplicate issuance is rejected, like the real
/// backend) and supports failure injection for the revocation path.
pub struct FakePki {
  issued: Mutex<HashSet<String>>,
  crl_generation: Mutex<u32>,
  pub fail_revoke: bool,
  pub fail_crl: bool,
}

impl FakePki {
  pub fn new() -> Self {
    FakePki {
      issued: Mutex::new(HashSet::new()),
      crl_generation: Mutex::new(0),
      fail_revoke: false,
      fail_crl: false,
    }
  }

  #[allow(unused)]
  pub fn is_issued(&self, name: &str) -> bool {
    self.issued.lock().unwrap().contains(name)
  }
}

impl PkiBackend for FakePki {
  async fn issue_certificate(
    &self,
    name: &str,
    _passphrase_protected: bool,
  ) -> Result<IssuedCredentials, Error> {
    let mut issued = self.issued.lock().unwrap();
    if !issued.insert(name.to_string()) {
      return Err(Error::Issuance(format!(
        "certificate for {} already exists",
        name
      )));
    }
    Ok(IssuedCredentials {
      certificate: format!("CERT-{}", name),
      private_key: format!("PRIVKEY-{}", name),
    })
  }

  async fn revoke_certificate(&self, name: &str) -> Result<(), Error> {
    if self.fail_revoke {
      return Err(Error::Revocation("injected revoke failure".to_string()));
    }
    let mut issued = self.issued.lock().unwrap();
    if !issued.remove(name) {
      return Err(Error::NotFound(name.to_string()));
    }
    Ok(())
  }

  async fn regenerate_crl(&self) -> Result<Vec<u8>, Error> {
    if self.fail_crl {
      return Err(Error::Revocation("injected CRL failure".to_string()));
    }
    let mut generation = self.crl_generation.lock().unwrap();
    *generation += 1;
    Ok(format!("CRL-{}", generation).into_bytes())
  }

  async fn ca_certificate(&self) -> Result<String, Error> {
    Ok("FAKE-CA".to_string())
  }

  async fn remove_client_artifacts(&self, _name: &str) -> Result<(), Error> {
    Ok(())
  }
}

mod backend;
mod blocklist;
mod config;
mod easyrsa;
mod error;
mod manager;
mod profile;

pub use backend::*;
pub use blocklist::Blocklist;
pub use config::Config;
pub use easyrsa::EasyRsa;
pub use error::Error;
pub use manager::ClientManager;
pub use profile::render_profile;
pub use profile::ProfileMaterial;
pub use profile::TrustMode;

use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use ovpn_manager::ClientManager;
use ovpn_manager::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// OpenVPN client lifecycle manager.
#[derive(Parser, Debug)]
#[command(name = "ovpnctl")]
#[command(version, about, long_about = None)]
struct Cli {
  /// OpenVPN server directory (Nyr openvpn-install layout)
  #[arg(long, default_value = "/etc/openvpn/server")]
  server_dir: PathBuf,

  /// JSON configuration file overriding the server-dir layout
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log level (trace, debug, info, warn, error)
  #[arg(long, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Issue a certificate and render the client's inline .ovpn profile
  Create {
    /// Client name (also the certificate common-name)
    name: String,

    /// Protect the private key with a passphrase
    #[arg(long)]
    passphrase: bool,
  },

  /// Revoke a client certificate and refresh the CRL
  Revoke {
    /// Client name
    name: String,
  },

  /// Add a client to the connection block-list
  Suspend {
    /// Client name
    name: String,
  },

  /// Remove a client from the connection block-list
  Unsuspend {
    /// Client name
    name: String,
  },

  /// List suspended clients
  #[command(alias = "blocked")]
  Suspended,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
    )
    .init();

  let config = match &cli.config {
    Some(path) => Config::load(path)?,
    None => Config::from_server_dir(&cli.server_dir),
  };
  let manager = ClientManager::with_easyrsa(config);

  match cli.command {
    Commands::Create { name, passphrase } => {
      let path = manager.create_client(&name, passphrase).await?;
      println!("{}", path.display());
    }
    Commands::Revoke { name } => {
      manager.revoke_client(&name).await?;
      println!("revoked {}", name);
    }
    Commands::Suspend { name } => {
      if manager.suspend_client(&name).await? {
        println!("suspended {}", name);
      } else {
        println!("{} is already suspended", name);
      }
    }
    Commands::Unsuspend { name } => {
      if manager.unsuspend_client(&name).await? {
        println!("unsuspended {}", name);
      } else {
        println!("{} is not suspended", name);
      }
    }
    Commands::Suspended => {
      let names = manager.list_suspended().await?;
      if names.is_empty() {
        println!("no suspended clients");
      } else {
        for name in names {
          println!("{}", name);
        }
      }
    }
  }

  Ok(())
}

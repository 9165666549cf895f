// src/main.rs
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use kubeconfig_issuer::{
    config::IssuerConfig,
    kubeconfig,
    secret::{self, FileSecretStore, ObjectKey, OwnerReference, Purpose, Secret, SecretStore},
    types::{CLUSTER_API_VERSION, CLUSTER_KIND},
    utils::{fs::replace_private, logging::setup_logging},
    Error, Result,
};

#[derive(Parser)]
#[command(author, version, about = "Issue and rotate cluster admin kubeconfigs", long_about = None)]
pub struct Args {
    #[arg(short, long, default_value = "issuer_config.json")]
    pub config: String,
    #[arg(short, long)]
    pub debug: bool,
    /// Overrides `store_dir` from the config file
    #[arg(long)]
    pub store_dir: Option<String>,
    /// Overrides `namespace` from the config file
    #[arg(short, long)]
    pub namespace: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a default config file
    InitConfig {
        #[arg(long)]
        force: bool,
    },
    /// Create the kubeconfig secret for a cluster
    Issue {
        #[arg(long)]
        cluster: String,
        /// Control plane endpoint, host:port
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        proxy_url: Option<String>,
        /// UID of the owning Cluster object
        #[arg(long, default_value = "")]
        owner_uid: String,
    },
    /// Report whether the kubeconfig client certificate needs rotation
    Check {
        #[arg(long)]
        cluster: String,
        #[arg(long)]
        threshold_hours: Option<u32>,
    },
    /// Replace the kubeconfig client certificate
    Rotate {
        #[arg(long)]
        cluster: String,
        /// Only rotate when the certificate expires within the threshold
        #[arg(long)]
        only_if_expiring: bool,
        #[arg(long)]
        threshold_hours: Option<u32>,
    },
    /// Print or save the kubeconfig
    Get {
        #[arg(long)]
        cluster: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config(args: &Args) -> Result<IssuerConfig> {
    let mut config = if Path::new(&args.config).exists() {
        IssuerConfig::load_from_file(&args.config)?
    } else {
        IssuerConfig::default()
    };

    if let Some(store_dir) = &args.store_dir {
        config.store_dir = store_dir.clone();
    }
    if let Some(namespace) = &args.namespace {
        config.namespace = namespace.clone();
    }
    config.debug |= args.debug;
    config.validate()?;
    Ok(config)
}

fn threshold(config: &IssuerConfig, hours: Option<u32>) -> Duration {
    hours
        .map(|h| Duration::hours(i64::from(h)))
        .unwrap_or_else(|| config.rotation_threshold())
}

fn kubeconfig_secret(store: &dyn SecretStore, namespace: &str, cluster: &str) -> Result<Secret> {
    let key = ObjectKey::new(namespace, secret::name(cluster, Purpose::Kubeconfig));
    Ok(store.get(&key)?)
}

fn init_config(path: &str, force: bool) -> Result<()> {
    if Path::new(path).exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists, use --force to overwrite",
            path
        )));
    }
    IssuerConfig::default().save_to_file(path)?;
    println!("wrote {}", path);
    Ok(())
}

fn run(args: Args, config: IssuerConfig) -> Result<()> {
    let store = FileSecretStore::new(config.store_path());
    let namespace = config.namespace.as_str();

    match args.command {
        Command::InitConfig { force } => init_config(&args.config, force)?,
        Command::Issue {
            cluster,
            endpoint,
            proxy_url,
            owner_uid,
        } => {
            let owner = OwnerReference {
                api_version: CLUSTER_API_VERSION.to_string(),
                kind: CLUSTER_KIND.to_string(),
                name: cluster.clone(),
                uid: owner_uid,
            };
            let key = ObjectKey::new(namespace, &cluster);
            let created = kubeconfig::create_secret_with_owner(
                &store,
                &key,
                &endpoint,
                owner,
                proxy_url.as_deref(),
            )?;
            println!("created secret {}", created.key());
        }
        Command::Check {
            cluster,
            threshold_hours,
        } => {
            let threshold = threshold(&config, threshold_hours);
            let secret = kubeconfig_secret(&store, namespace, &cluster)?;
            let now = Utc::now();

            for info in kubeconfig::client_certificates(&kubeconfig::from_secret(&secret)?)? {
                println!(
                    "{}: subject={} issuer={} serial={} not_after={} ({} days left)",
                    info.user,
                    info.subject,
                    info.issuer,
                    info.serial,
                    info.not_after.to_rfc3339(),
                    info.remaining(now).num_days()
                );
            }

            let needed = kubeconfig::needs_client_cert_rotation_at(&secret, threshold, now)?;
            println!(
                "rotation needed: {} (threshold {} hours)",
                if needed { "yes" } else { "no" },
                threshold.num_hours()
            );
        }
        Command::Rotate {
            cluster,
            only_if_expiring,
            threshold_hours,
        } => {
            let secret = kubeconfig_secret(&store, namespace, &cluster)?;
            if only_if_expiring {
                let threshold = threshold(&config, threshold_hours);
                if !kubeconfig::needs_client_cert_rotation(&secret, threshold)? {
                    info!(secret = %secret.key(), "client certificate not expiring, skipping");
                    println!("rotation not needed");
                    return Ok(());
                }
            }
            let rotated = kubeconfig::regenerate_secret(&store, &secret)?;
            println!(
                "rotated secret {} (resource version {})",
                rotated.key(),
                rotated.metadata.resource_version
            );
        }
        Command::Get { cluster, output } => {
            let secret = kubeconfig_secret(&store, namespace, &cluster)?;
            let data = kubeconfig::kubeconfig_bytes(&secret)?;
            match output {
                Some(path) => {
                    replace_private(&path, data)?;
                    println!("wrote {}", path.display());
                }
                None => io::stdout().write_all(data)?,
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // The config file may not exist yet.
    if let Command::InitConfig { force } = args.command {
        return match init_config(&args.config, force) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(config.log_file.as_deref(), config.debug) {
        eprintln!("Failed to setup logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            if let Error::DependentCertificateNotFound { .. } = e {
                eprintln!("The cluster CAs are not provisioned yet; retry once they exist.");
            }
            ExitCode::FAILURE
        }
    }
}

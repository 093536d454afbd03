// Copyright (c) 2025 - Cowboy AI, Inc.
//! Certificate Synchronization
//!
//! Every server outside the compute-node roles gets a certificate signed by
//! the monitoring CA. The certificate and the encrypted private key are
//! published in the cluster's private data:
//!
//! ```text
//! <ca>/<name>.{csr,key,crt}  ──copy crt───────────> <crtdst>/<name>.crt
//!                            ──encrypt key (0400)─> <crtdst>/<name>.key.enc
//! ```
//!
//! External tools sit behind [`PkiBackend`]. Equipment are processed one at a
//! time; a tool failure aborts the run after the summary of every outcome
//! recorded so far has been logged.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::domain::{Cluster, Equipment, Topology};
use crate::errors::{SyncError, SyncResult};

/// Mode of the published encrypted key
pub const ENCRYPTED_KEY_MODE: u32 = 0o400;

/// Environment variable carrying the key passphrase to `openssl`
pub const PASSPHRASE_ENV: &str = "MONSYNC_KEY_PASSPHRASE";

/// Certificate authority and key encryption operations
#[async_trait]
pub trait PkiBackend: Send + Sync {
    /// Create a private key and a CSR for `cn`
    async fn new_cert(&self, cn: &str, csr: &Path, key: &Path) -> SyncResult<()>;

    /// Sign a CSR with the CA
    async fn sign_csr(&self, csr: &Path, cert: &Path) -> SyncResult<()>;

    /// Encrypt a private key with a passphrase
    async fn encrypt_key(&self, key: &Path, output: &Path, passphrase: &str) -> SyncResult<()>;
}

#[async_trait]
impl<P: PkiBackend + ?Sized> PkiBackend for &P {
    async fn new_cert(&self, cn: &str, csr: &Path, key: &Path) -> SyncResult<()> {
        (**self).new_cert(cn, csr, key).await
    }

    async fn sign_csr(&self, csr: &Path, cert: &Path) -> SyncResult<()> {
        (**self).sign_csr(csr, cert).await
    }

    async fn encrypt_key(&self, key: &Path, output: &Path, passphrase: &str) -> SyncResult<()> {
        (**self).encrypt_key(key, output, passphrase).await
    }
}

/// `icinga2 pki` and `openssl` command line tools
#[derive(Debug, Clone)]
pub struct Icinga2Pki {
    icinga2: PathBuf,
    openssl: PathBuf,
}

impl Default for Icinga2Pki {
    fn default() -> Self {
        Self {
            icinga2: PathBuf::from("icinga2"),
            openssl: PathBuf::from("openssl"),
        }
    }
}

impl Icinga2Pki {
    pub fn new(icinga2: impl Into<PathBuf>, openssl: impl Into<PathBuf>) -> Self {
        Self {
            icinga2: icinga2.into(),
            openssl: openssl.into(),
        }
    }
}

/// Run a PKI tool, returning its standard output once logged
async fn run_tool(tool: &str, command: &mut Command) -> SyncResult<String> {
    // program and arguments only, the environment carries the passphrase
    let std_command = command.as_std();
    debug!(
        "running {} {:?}",
        std_command.get_program().to_string_lossy(),
        std_command.get_args().collect::<Vec<_>>()
    );
    let output = command.output().await.map_err(|e| SyncError::ExternalTool {
        tool: tool.to_string(),
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(SyncError::ExternalTool {
            tool: tool.to_string(),
            detail: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    for line in stdout.lines() {
        debug!("{}: {}", tool, line);
    }
    Ok(stdout)
}

#[async_trait]
impl PkiBackend for Icinga2Pki {
    async fn new_cert(&self, cn: &str, csr: &Path, key: &Path) -> SyncResult<()> {
        let mut command = Command::new(&self.icinga2);
        command
            .args(["pki", "new-cert", "--cn", cn, "--csr"])
            .arg(csr)
            .arg("--key")
            .arg(key);
        run_tool("icinga2 pki new-cert", &mut command).await?;
        Ok(())
    }

    async fn sign_csr(&self, csr: &Path, cert: &Path) -> SyncResult<()> {
        let mut command = Command::new(&self.icinga2);
        command
            .args(["pki", "sign-csr", "--csr"])
            .arg(csr)
            .arg("--cert")
            .arg(cert);
        run_tool("icinga2 pki sign-csr", &mut command).await?;
        Ok(())
    }

    async fn encrypt_key(&self, key: &Path, output: &Path, passphrase: &str) -> SyncResult<()> {
        let mut command = Command::new(&self.openssl);
        command
            .args(["aes-256-cbc", "-in"])
            .arg(key)
            .arg("-out")
            .arg(output)
            .arg("-pass")
            .arg(format!("env:{PASSPHRASE_ENV}"))
            .env(PASSPHRASE_ENV, passphrase);
        run_tool("openssl aes-256-cbc", &mut command).await?;
        Ok(())
    }
}

/// Key encryption passphrase of each cluster
///
/// ```toml
/// ge = "passphrase of cluster ge"
/// fr = "passphrase of cluster fr"
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClusterKeys {
    keys: BTreeMap<String, String>,
}

impl ClusterKeys {
    /// Load the keys file; a missing file yields no keys
    pub fn load(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            warn!("keys file {} does not exist", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_toml(&content)
            .map_err(|e| SyncError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            keys: toml::from_str(content)?,
        })
    }

    pub fn get(&self, cluster: &str) -> Option<&str> {
        self.keys.get(cluster).map(String::as_str)
    }
}

/// Result of the certificate synchronization of one equipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertOutcome {
    /// Certificate and encrypted key already published
    Present,
    /// New certificate issued and published (only announced in dry-run)
    Issued,
    /// Equipment not concerned
    Skipped(String),
    Failed(String),
}

impl fmt::Display for CertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Issued => f.write_str("issued"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertRecord {
    pub cluster: String,
    pub equipment: String,
    pub outcome: CertOutcome,
}

/// Outcomes of a certificate run, in processing order
#[derive(Debug, Clone, Default)]
pub struct CertReport {
    records: Vec<CertRecord>,
}

impl CertReport {
    fn record(&mut self, cluster: &Cluster, equipment: &Equipment, outcome: CertOutcome) {
        self.records.push(CertRecord {
            cluster: cluster.name().to_string(),
            equipment: equipment.name().to_string(),
            outcome,
        });
    }

    pub fn records(&self) -> &[CertRecord] {
        &self.records
    }

    pub fn outcome_of(&self, equipment: &str) -> Option<&CertOutcome> {
        self.records
            .iter()
            .find(|r| r.equipment == equipment)
            .map(|r| &r.outcome)
    }

    /// True when no certificate had to be issued and nothing failed
    pub fn all_ok(&self) -> bool {
        self.records
            .iter()
            .all(|r| matches!(r.outcome, CertOutcome::Present | CertOutcome::Skipped(_)))
    }

    pub fn count(&self, predicate: impl Fn(&CertOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }

    /// Log every outcome worth reporting and the totals
    pub fn log_summary(&self) {
        for record in &self.records {
            match &record.outcome {
                CertOutcome::Skipped(_) => {
                    debug!("{}/{}: {}", record.cluster, record.equipment, record.outcome)
                }
                CertOutcome::Failed(_) => {
                    error!("{}/{}: {}", record.cluster, record.equipment, record.outcome)
                }
                _ => info!("{}/{}: {}", record.cluster, record.equipment, record.outcome),
            }
        }
        info!(
            "certificates: {} present, {} issued, {} skipped, {} failed",
            self.count(|o| matches!(o, CertOutcome::Present)),
            self.count(|o| matches!(o, CertOutcome::Issued)),
            self.count(|o| matches!(o, CertOutcome::Skipped(_))),
            self.count(|o| matches!(o, CertOutcome::Failed(_))),
        );
    }
}

/// Source and destination files of one equipment
struct CertFiles {
    csr: PathBuf,
    key: PathBuf,
    crt: PathBuf,
    crt_dst: PathBuf,
    key_dst: PathBuf,
}

impl CertFiles {
    fn new(ca: &Path, dst: &Path, name: &str) -> Self {
        Self {
            csr: ca.join(format!("{name}.csr")),
            key: ca.join(format!("{name}.key")),
            crt: ca.join(format!("{name}.crt")),
            crt_dst: dst.join(format!("{name}.crt")),
            key_dst: dst.join(format!("{name}.key.enc")),
        }
    }

    fn published(&self) -> bool {
        self.crt_dst.exists() && self.key_dst.exists()
    }
}

/// Runs the certificate synchronization over a topology
pub struct CertificateSync<'a, P: PkiBackend> {
    pki: P,
    config: &'a RunConfig,
    keys: ClusterKeys,
    dry_run: bool,
}

impl<'a, P: PkiBackend> CertificateSync<'a, P> {
    pub fn new(pki: P, config: &'a RunConfig, keys: ClusterKeys) -> Self {
        Self {
            pki,
            config,
            keys,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process every equipment of every cluster in order.
    ///
    /// Missing lookups are recorded as failures and the run goes on; an
    /// external tool or filesystem failure aborts the run.
    pub async fn run(&self, topology: &Topology) -> SyncResult<CertReport> {
        let mut report = CertReport::default();

        for cluster in topology.clusters() {
            debug!("syncing certs for cluster {}", cluster.name());
            let dst = self.config.paths.certs_dir(cluster.name());

            for equipment in cluster {
                match self.sync_equipment(cluster, equipment, &dst).await {
                    Ok(outcome) => report.record(cluster, equipment, outcome),
                    Err(err @ SyncError::Lookup(_)) => {
                        warn!("{}", err);
                        report.record(cluster, equipment, CertOutcome::Failed(err.to_string()));
                    }
                    Err(err) => {
                        report.record(cluster, equipment, CertOutcome::Failed(err.to_string()));
                        report.log_summary();
                        return Err(err);
                    }
                }
            }
        }

        report.log_summary();
        if report.all_ok() {
            info!("all certificates are OK");
        }
        Ok(report)
    }

    async fn sync_equipment(
        &self,
        cluster: &Cluster,
        equipment: &Equipment,
        dst: &Path,
    ) -> SyncResult<CertOutcome> {
        let name = equipment.name();
        if !equipment.is_server() {
            debug!("skipping equipment {} in certs sync", name);
            return Ok(CertOutcome::Skipped("not a server".to_string()));
        }
        if let Some(role) = equipment
            .role()
            .filter(|role| self.config.certs.nodes_roles.iter().any(|r| r == role))
        {
            debug!("skipping equipment {} in certs sync", name);
            return Ok(CertOutcome::Skipped(format!("node role {role}")));
        }

        let files = CertFiles::new(&self.config.paths.ca, dst, name);
        debug!(
            "checking if {} certificate/key files exist in {}",
            name,
            dst.display()
        );
        if files.published() {
            debug!("certificate already exist for {}", name);
            return Ok(CertOutcome::Present);
        }

        let fqdn = equipment
            .fqdn()
            .ok_or_else(|| SyncError::Lookup(format!("server {name} has no fqdn")))?;
        let passphrase = self.keys.get(cluster.name()).ok_or_else(|| {
            SyncError::Lookup(format!("no encryption key for cluster {}", cluster.name()))
        })?;

        info!("creating new CSR, certificate and key for {}", name);
        if self.dry_run {
            info!("dry-run: not issuing certificate for {}", fqdn);
            return Ok(CertOutcome::Issued);
        }

        self.pki.new_cert(fqdn, &files.csr, &files.key).await?;
        self.pki.sign_csr(&files.csr, &files.crt).await?;

        tokio::fs::create_dir_all(dst)
            .await
            .map_err(|e| SyncError::io(dst, e))?;
        debug!(
            "copying crt {} to {}",
            files.crt.display(),
            files.crt_dst.display()
        );
        tokio::fs::copy(&files.crt, &files.crt_dst)
            .await
            .map_err(|e| SyncError::io(&files.crt_dst, e))?;

        debug!(
            "encoding key {} to {}",
            files.key.display(),
            files.key_dst.display()
        );
        self.pki
            .encrypt_key(&files.key, &files.key_dst, passphrase)
            .await?;

        debug!("setting strict mode on encoded key {}", files.key_dst.display());
        tokio::fs::set_permissions(
            &files.key_dst,
            std::fs::Permissions::from_mode(ENCRYPTED_KEY_MODE),
        )
        .await
        .map_err(|e| SyncError::io(&files.key_dst, e))?;

        Ok(CertOutcome::Issued)
    }
}

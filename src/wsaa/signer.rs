use std::process::Stdio;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::{AfipError, CertificateConfig};

/// Produces the base64 CMS (PKCS#7 signed-data, content attached) that
/// `loginCms` expects.
#[async_trait]
pub trait CmsSigner: Send + Sync {
    async fn sign(&self, tra: &str) -> Result<String, AfipError>;
}

/// Signs with the `openssl cms` command line tool, run as a child process
/// without blocking the runtime.
#[derive(Debug, Clone)]
pub struct OpensslSigner {
    config: CertificateConfig,
}

impl OpensslSigner {
    /// Fails with `MissingCertificate` if the certificate or key is absent.
    pub fn new(config: CertificateConfig) -> Result<Self, AfipError> {
        config.check()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CertificateConfig {
        &self.config
    }
}

#[async_trait]
impl CmsSigner for OpensslSigner {
    async fn sign(&self, tra: &str) -> Result<String, AfipError> {
        let mut child = Command::new(&self.config.openssl_bin)
            .arg("cms")
            .arg("-sign")
            .arg("-signer")
            .arg(&self.config.cert)
            .arg("-inkey")
            .arg(&self.config.pkey)
            .args(["-nodetach", "-outform", "der"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(tra.as_bytes()).await?;
        }
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(AfipError::Authentication(format!(
                "openssl cms failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(AfipError::Authentication("openssl cms produced no output".into()));
        }

        debug!(bytes = output.stdout.len(), "signed TRA");
        Ok(general_purpose::STANDARD.encode(&output.stdout))
    }
}

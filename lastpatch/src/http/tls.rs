//! TLS trust configuration for the API client

use std::path::{Path, PathBuf};

use reqwest::{Certificate, ClientBuilder};
use tracing::{debug, warn};

use crate::errors::LastPatchError;

/// Which certificates the client trusts when talking to the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Skip server certificate validation entirely
    pub insecure: bool,

    /// PEM bundle of CA certificates
    pub ca_file: Option<PathBuf>,

    /// Directory of PEM CA certificates
    pub ca_path: Option<PathBuf>,
}

impl TlsOptions {
    /// Whether custom CA material replaces the default trust roots
    pub fn has_custom_ca(&self) -> bool {
        self.ca_file.is_some() || self.ca_path.is_some()
    }

    /// Apply the trust settings to a client builder
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, LastPatchError> {
        if self.insecure {
            warn!("Server certificate validation is disabled");
            return Ok(builder.danger_accept_invalid_certs(true));
        }

        let mut builder = builder;

        if self.has_custom_ca() {
            let mut certs = Vec::new();
            if let Some(ca_file) = &self.ca_file {
                certs.extend(load_pem_file(ca_file)?);
            }
            if let Some(ca_path) = &self.ca_path {
                certs.extend(load_pem_dir(ca_path)?);
            }
            if certs.is_empty() {
                return Err(LastPatchError::ConfigError(
                    "No CA certificates found in --cafile/--capath".to_string(),
                ));
            }
            debug!("Trusting {} custom CA certificates", certs.len());
            builder = builder.tls_built_in_root_certs(false);
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        } else {
            let mut added = 0usize;
            for cert in rustls_native_certs::load_native_certs().unwrap_or_default() {
                if let Ok(cert) = Certificate::from_der(cert.as_ref()) {
                    builder = builder.add_root_certificate(cert);
                    added += 1;
                }
            }
            debug!("Added {} certificates from the system store", added);
        }

        Ok(builder)
    }
}

/// Read every certificate of a PEM bundle
fn load_pem_file(path: &Path) -> Result<Vec<Certificate>, LastPatchError> {
    let pem = std::fs::read(path).map_err(|e| {
        LastPatchError::ConfigError(format!("Failed to read CA file {}: {e}", path.display()))
    })?;

    let mut cursor = std::io::Cursor::new(pem);
    let mut certs = Vec::new();
    for der in rustls_pemfile::certs(&mut cursor) {
        let der = der.map_err(|e| {
            LastPatchError::ConfigError(format!("Invalid PEM in {}: {e}", path.display()))
        })?;
        let cert = Certificate::from_der(der.as_ref()).map_err(|e| {
            LastPatchError::ConfigError(format!("Invalid certificate in {}: {e}", path.display()))
        })?;
        certs.push(cert);
    }
    Ok(certs)
}

/// Read every PEM certificate found directly inside a directory.
///
/// Files that do not parse as PEM certificates are skipped.
fn load_pem_dir(dir: &Path) -> Result<Vec<Certificate>, LastPatchError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        LastPatchError::ConfigError(format!("Failed to read CA path {}: {e}", dir.display()))
    })?;

    let mut certs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match load_pem_file(&path) {
            Ok(found) => certs.extend(found),
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(certs)
}

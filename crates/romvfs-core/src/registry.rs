use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::media::Media;
use crate::scanner::{PatternMatch, PatternScanner};
use crate::signature::Signature;
use crate::vfs::{Mount, VfsDevice};

/// Constructs a device instance over the given media. The factory only
/// builds the instance; the registry drives initialization.
pub type DeviceFactory = Box<dyn Fn(Media) -> Result<Box<dyn VfsDevice>> + Send + Sync>;

struct RegisteredDevice {
    name: String,
    factory: DeviceFactory,
}

/// Maps signatures to the device implementations able to mount them.
///
/// The registry is an explicit object: build one, register adapters into
/// it, and hand it to whatever performs detection. Several devices may
/// share a signature; candidates are tried in registration order and the
/// first successful initialization wins.
#[derive(Default)]
pub struct DeviceRegistry {
    signatures: Vec<Signature>,
    devices: Vec<RegisteredDevice>,
    candidates: HashMap<Signature, Vec<usize>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signature to the scan set. Returns false when an equal
    /// signature is already registered (no-op).
    pub fn register_signature(&mut self, signature: Signature) -> bool {
        if self.signatures.contains(&signature) {
            return false;
        }
        self.signatures.push(signature);
        true
    }

    /// Associate a device factory with one or more signatures.
    ///
    /// The signatures are added to the scan set as needed. Registering a
    /// second device under an existing name is a conflict.
    pub fn register_device<F>(
        &mut self,
        name: &str,
        signatures: &[Signature],
        factory: F,
    ) -> Result<()>
    where
        F: Fn(Media) -> Result<Box<dyn VfsDevice>> + Send + Sync + 'static,
    {
        if self.devices.iter().any(|device| device.name == name) {
            return Err(Error::DeviceAlreadyRegistered(name.to_string()));
        }

        let index = self.devices.len();
        self.devices.push(RegisteredDevice {
            name: name.to_string(),
            factory: Box::new(factory),
        });

        for signature in signatures {
            self.register_signature(signature.clone());
            self.candidates
                .entry(signature.clone())
                .or_default()
                .push(index);
        }

        info!(
            "Registered device '{}' against {} signature(s)",
            name,
            signatures.len()
        );
        Ok(())
    }

    /// Every signature known to the registry.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Construct and initialize a device for a detected signature.
    ///
    /// Candidates registered against the signature are tried in
    /// registration order; the media is rewound before each attempt. The
    /// first device that initializes wins. When every candidate fails,
    /// the error aggregates each attempt's failure.
    pub fn create_device(&self, media: &Media, signature: &Signature) -> Result<Mount> {
        let Some(indices) = self.candidates.get(signature) else {
            return Err(Error::NoDeviceRegistered(signature.to_string()));
        };

        let mut attempts = Vec::new();

        for &index in indices {
            let registered = &self.devices[index];
            media.rewind()?;

            let instance = match (registered.factory)(media.clone()) {
                Ok(instance) => instance,
                Err(e) => {
                    attempts.push(format!("{}: {}", registered.name, e));
                    continue;
                }
            };

            let mut mount = Mount::new(instance);
            match mount.initialize() {
                Ok(()) => {
                    debug!(
                        "Signature [{}] mounted by device '{}'",
                        signature, registered.name
                    );
                    return Ok(mount);
                }
                Err(e) => attempts.push(format!("{}: {}", registered.name, e)),
            }
        }

        Err(Error::MountFailed {
            signature: signature.to_string(),
            attempts: attempts.join("; "),
        })
    }

    /// Scan the media against every registered signature.
    pub fn scan(&self, media: &Media) -> Result<Vec<PatternMatch>> {
        let mut scanner = PatternScanner::new();
        scanner.scan(&mut media.clone(), &self.signatures)
    }

    /// Full detection flow: scan, then try to mount each match in offset
    /// order, returning the first device that initializes.
    pub fn mount(&self, media: &Media) -> Result<Mount> {
        let matches = self.scan(media)?;
        debug!("Detection scan produced {} match(es)", matches.len());

        let mut last_failure = None;

        for m in matches {
            match self.create_device(media, &m.signature) {
                Ok(mount) => return Ok(mount),
                Err(e) => {
                    warn!(
                        "Signature [{}] at offset {} did not mount: {}",
                        m.signature, m.offset, e
                    );
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or(Error::UnrecognizedFormat))
    }
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::signature::{Signature, SignatureKind};

/// One signature definition as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEntry {
    #[serde(default)]
    pub kind: SignatureKind,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SignatureEntry {
    pub fn compile(&self) -> Result<Signature> {
        let mut signature = Signature::define(self.kind, &self.pattern)?;
        if let Some(description) = &self.description {
            signature = signature.describe(description);
        }
        Ok(signature)
    }
}

/// A named collection of signature definitions, serializable to JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureSet {
    pub version: String,
    pub entries: Vec<SignatureEntry>,
}

impl SignatureSet {
    /// Compile every entry; fails on the first malformed pattern.
    pub fn compile(&self) -> Result<Vec<Signature>> {
        self.entries.iter().map(SignatureEntry::compile).collect()
    }
}

pub fn load_signatures<P: AsRef<Path>>(path: P) -> Result<SignatureSet> {
    let content = fs::read_to_string(&path)?;
    let set = serde_json::from_str(&content)?;
    Ok(set)
}

pub fn save_signatures<P: AsRef<Path>>(path: P, signatures: &SignatureSet) -> Result<()> {
    let content = serde_json::to_string_pretty(signatures)?;
    fs::write(path, content)?;
    Ok(())
}

/// Well-known container magics shipped with the library.
///
/// The ISO-9660 marker is a content signature: `CD001` sits inside the
/// volume descriptor at sector 16 (offset 32769), not at the stream start.
pub fn builtin_signatures() -> Vec<Signature> {
    [
        (
            SignatureKind::Content,
            "43 44 30 30 31",
            "ISO-9660 volume descriptor marker (CD001)",
        ),
        (
            SignatureKind::Magic,
            "50 4B 03 04",
            "ZIP local file header",
        ),
        (SignatureKind::Magic, "1F 8B", "gzip member header"),
        (SignatureKind::Magic, "68 73 71 73", "SquashFS superblock"),
    ]
    .into_iter()
    .map(|(kind, pattern, description)| {
        Signature::define(kind, pattern)
            .expect("builtin signature patterns are valid")
            .describe(description)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_signatures_compile() {
        let builtins = builtin_signatures();
        assert!(!builtins.is_empty());

        let iso = &builtins[0];
        assert_eq!(iso.canonical_text(), "4344303031");
        assert_eq!(iso.kind(), SignatureKind::Content);
        assert!(iso.description().is_some());
    }

    #[test]
    fn test_set_round_trip() {
        let set = SignatureSet {
            version: "1".to_string(),
            entries: vec![
                SignatureEntry {
                    kind: SignatureKind::Magic,
                    pattern: "1F 8B".to_string(),
                    description: Some("gzip".to_string()),
                },
                SignatureEntry {
                    kind: SignatureKind::Content,
                    pattern: "43 4? 30".to_string(),
                    description: None,
                },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signatures.json");
        save_signatures(&path, &set).unwrap();

        let loaded = load_signatures(&path).unwrap();
        assert_eq!(loaded.version, "1");
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(loaded.entries[0].pattern, "1F 8B");

        let compiled = loaded.compile().unwrap();
        assert_eq!(compiled[1].canonical_text(), "434?30");
    }

    #[test]
    fn test_kind_defaults_to_content() {
        let entry: SignatureEntry = serde_json::from_str(r#"{"pattern": "AA BB"}"#).unwrap();
        assert_eq!(entry.kind, SignatureKind::Content);
    }

    #[test]
    fn test_compile_fails_on_malformed_entry() {
        let set = SignatureSet {
            version: "1".to_string(),
            entries: vec![SignatureEntry {
                kind: SignatureKind::Content,
                pattern: "XY".to_string(),
                description: None,
            }],
        };
        assert!(set.compile().is_err());
    }
}

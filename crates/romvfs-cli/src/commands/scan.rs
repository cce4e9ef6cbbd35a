use std::path::Path;

use anyhow::{Context, Result};
use romvfs_core::{Media, PatternScanner, builtin_signatures, load_signatures};
use tracing::info;

pub fn run(file: &Path, signature_file: Option<&Path>) -> Result<()> {
    let signatures = match signature_file {
        Some(path) => {
            let set = load_signatures(path)
                .with_context(|| format!("Failed to load signature set {}", path.display()))?;
            info!("Loaded {} signature(s) from {}", set.entries.len(), path.display());
            set.compile()?
        }
        None => builtin_signatures(),
    };

    let media = Media::open(file).with_context(|| format!("Failed to open {}", file.display()))?;

    let mut scanner = PatternScanner::new();
    let matches = scanner.scan(&mut media.clone(), &signatures)?;

    if matches.is_empty() {
        println!("No signature matches in {}", file.display());
        return Ok(());
    }

    println!("{} match(es) in {}:", matches.len(), file.display());
    for m in &matches {
        let description = m.signature.description().unwrap_or("-");
        println!(
            "  {:>12}  [{}]  {}",
            format!("{:#x}", m.offset),
            m.signature,
            description
        );
    }

    Ok(())
}

use anyhow::Result;
use romvfs_core::builtin_signatures;

pub fn run() -> Result<()> {
    for signature in builtin_signatures() {
        println!(
            "{:<8} [{}]  {}",
            signature.kind().to_string().to_lowercase(),
            signature,
            signature.description().unwrap_or("-")
        );
    }
    Ok(())
}

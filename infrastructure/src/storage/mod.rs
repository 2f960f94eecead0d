//! Filesystem adapters: stage artifacts and knowledge archives.

mod artifacts;
mod knowledge;

pub use artifacts::FileArtifactWriter;
pub use knowledge::JsonKnowledgeArchive;

use std::io::Write;
use std::path::Path;

/// Write through a sibling temporary file so readers never see a partial
/// document.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

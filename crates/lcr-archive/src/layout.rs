use std::fmt;
use std::path::{Path, PathBuf};

use lcr_types::LedgerSeq;

/// Kind of per-checkpoint archive file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// One ledger header record per ledger in the checkpoint.
    Ledger,
    /// One transaction set record per ledger with a non-empty set.
    Transactions,
}

impl FileCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Transactions => "transactions",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one archive file: a category and the checkpoint it covers.
///
/// Files are laid out as
/// `{category}/{hh}/{hh}/{hh}/{category}-{checkpoint as 8 hex digits}.rec`,
/// where the three directory levels are the leading hex digit pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArchiveFile {
    pub category: FileCategory,
    pub checkpoint: LedgerSeq,
}

impl ArchiveFile {
    pub fn new(category: FileCategory, checkpoint: LedgerSeq) -> Self {
        Self {
            category,
            checkpoint,
        }
    }

    /// Path relative to the archive root.
    pub fn relative_path(&self) -> PathBuf {
        let hex = format!("{:08x}", self.checkpoint);
        let name = self.category.name();
        PathBuf::from(name)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex[4..6])
            .join(format!("{name}-{hex}.rec"))
    }

    /// Path of the downloaded, decompressed file under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_file_path() {
        let file = ArchiveFile::new(FileCategory::Ledger, 0x7f);
        assert_eq!(
            file.relative_path(),
            PathBuf::from("ledger/00/00/00/ledger-0000007f.rec")
        );
    }

    #[test]
    fn transactions_file_path_uses_all_levels() {
        let file = ArchiveFile::new(FileCategory::Transactions, 0x0123_45bf);
        assert_eq!(
            file.local_path(Path::new("/tmp/archive")),
            PathBuf::from("/tmp/archive/transactions/01/23/45/transactions-012345bf.rec")
        );
    }

    #[test]
    fn categories_do_not_collide() {
        let ledger = ArchiveFile::new(FileCategory::Ledger, 63);
        let txs = ArchiveFile::new(FileCategory::Transactions, 63);
        assert_ne!(ledger.relative_path(), txs.relative_path());
    }
}

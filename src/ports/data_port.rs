//! Data access port trait.

use crate::domain::error::SigtraderError;
use crate::domain::table::Table;
use std::path::Path;

pub trait DataPort {
    /// Load a TOHLCV table. Implementations fail with `FileNotFound`,
    /// `WrongExtension`, a schema error, or `DataLoad` tagged with the path.
    fn load_tohlcv(&self, path: &Path) -> Result<Table, SigtraderError>;
}

//! Binding to the pdfium shared library.
//!
//! Lookup order:
//! 1. `PDFIUM_LIB_PATH`: a library file, or a directory containing the
//!    platform library (`libpdfium.so`, `libpdfium.dylib`, `pdfium.dll`).
//! 2. The platform library in the current directory.
//! 3. The system library search path.

use crate::error::DocstampError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium using the lookup order above.
pub fn bind_pdfium() -> Result<Pdfium, DocstampError> {
    if let Some(path) = std::env::var_os(PDFIUM_LIB_PATH_ENV).filter(|v| !v.is_empty()) {
        let lib = library_file(Path::new(&path));
        debug!("Binding pdfium from {}", lib.display());
        return Pdfium::bind_to_library(&lib)
            .map(Pdfium::new)
            .map_err(|e| {
                DocstampError::PdfiumBindingFailed(format!("{}: {}", lib.display(), e))
            });
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    Pdfium::bind_to_library(&local)
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| DocstampError::PdfiumBindingFailed(e.to_string()))
}

/// Resolve a directory to the platform library file inside it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

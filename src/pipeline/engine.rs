//! pdfium binding and PDF loading.
//!
//! pdfium is a C++ library loaded at runtime. Binding is attempted from the
//! most to the least specific location so a caller can always pin a copy:
//!
//! 1. `ReflowConfig::pdfium_library_path`
//! 2. `PDFIUM_LIB_PATH`
//! 3. the platform library name in the working directory
//! 4. the system library search path

use crate::config::ReflowConfig;
use crate::error::ReflowError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Bind to a pdfium library.
pub fn bind_pdfium(config: &ReflowConfig) -> Result<Pdfium, ReflowError> {
    let explicit = config
        .pdfium_library_path
        .clone()
        .or_else(|| std::env::var("PDFIUM_LIB_PATH").ok().map(PathBuf::from));

    let bindings = match explicit {
        Some(path) => {
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path).map_err(|e| {
                ReflowError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
            })?
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| ReflowError::PdfiumBindingFailed(e.to_string()))?,
    };

    Ok(Pdfium::new(bindings))
}

/// Open a PDF held in memory, mapping password failures to their own errors.
pub fn open_pdf<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ReflowError> {
    pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{:?}", e), password.is_some()))
}

fn classify_load_error(detail: &str, had_password: bool) -> ReflowError {
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            ReflowError::WrongPassword
        } else {
            ReflowError::PasswordRequired
        }
    } else {
        ReflowError::CorruptPdf {
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_errors_are_distinguished() {
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(PasswordError)", false),
            ReflowError::PasswordRequired
        ));
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(PasswordError)", true),
            ReflowError::WrongPassword
        ));
    }

    #[test]
    fn other_load_errors_are_corrupt_pdf() {
        match classify_load_error("PdfiumLibraryInternalError(FormatError)", false) {
            ReflowError::CorruptPdf { detail } => assert!(detail.contains("FormatError")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_library_fails_to_bind() {
        let config = ReflowConfig::builder()
            .pdfium_library_path("/definitely/not/libpdfium.so")
            .build()
            .unwrap();
        let err = bind_pdfium(&config).err().expect("binding must fail");
        assert!(matches!(err, ReflowError::PdfiumBindingFailed(_)));
    }
}

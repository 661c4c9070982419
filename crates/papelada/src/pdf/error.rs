use std::fmt;

/// Rasterization-specific errors.
#[derive(Debug, Clone)]
pub enum RasterError {
    InvalidPdf(String),
    EngineUnavailable(String),
    PageNotFound(u32),
    RenderFailed { page: u32, message: String },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            RasterError::EngineUnavailable(msg) => write!(f, "PDF engine unavailable: {}", msg),
            RasterError::PageNotFound(page) => write!(f, "Page {} not found", page),
            RasterError::RenderFailed { page, message } => {
                write!(f, "Page {} rendering failed: {}", page, message)
            }
        }
    }
}

impl std::error::Error for RasterError {}

pub type Result<T> = std::result::Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_display() {
        let err = RasterError::InvalidPdf("corrupted header".to_string());
        assert_eq!(err.to_string(), "Invalid PDF: corrupted header");
    }

    #[test]
    fn test_page_not_found_display() {
        let err = RasterError::PageNotFound(5);
        assert_eq!(err.to_string(), "Page 5 not found");
    }

    #[test]
    fn test_render_failed_display() {
        let err = RasterError::RenderFailed {
            page: 2,
            message: "bad content stream".to_string(),
        };
        assert_eq!(err.to_string(), "Page 2 rendering failed: bad content stream");
    }

    #[test]
    fn test_engine_unavailable_display() {
        let err = RasterError::EngineUnavailable("libpdfium.so not found".to_string());
        assert_eq!(err.to_string(), "PDF engine unavailable: libpdfium.so not found");
    }

    #[test]
    fn test_error_clone() {
        let err1 = RasterError::PageNotFound(3);
        let err2 = err1.clone();
        assert_eq!(err1.to_string(), err2.to_string());
    }
}

//! Exit codes following sysexits.h conventions.
//!
//! These codes let scripts tell a bad invocation apart from an unreadable
//! file, a failed upload, or a service that is not answering.

use visrag_core::GalleryError;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error (empty search query, bad configuration).
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// The service rejected an upload.
/// Maps to EX_DATAERR from sysexits.h.
pub const UPLOAD_FAILED: i32 = 65;

/// Cannot open input file.
/// Maps to EX_NOINPUT from sysexits.h.
pub const INPUT_ERROR: i32 = 66;

/// Image store service unreachable, timing out, or answering with errors.
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const SERVICE_UNAVAILABLE: i32 = 69;

/// Represents an exit code with optional error context.
pub struct ExitCode {
    pub code: i32,
    pub message: Option<String>,
}

impl ExitCode {
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");

        let gallery = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<GalleryError>());

        // Input files are read before anything is sent
        let code = if message.contains("Failed to read file") {
            INPUT_ERROR
        } else {
            match gallery {
                Some(GalleryError::EmptyQuery) | Some(GalleryError::Config(_)) => USAGE_ERROR,
                Some(GalleryError::UploadFailed { .. }) => UPLOAD_FAILED,
                Some(GalleryError::Io(_)) => INPUT_ERROR,
                Some(e) if e.is_transport() => SERVICE_UNAVAILABLE,
                _ => GENERAL_ERROR,
            }
        };

        Self {
            code,
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn code_of(err: GalleryError) -> i32 {
        let err = Err::<(), _>(err).context("command failed").unwrap_err();
        ExitCode::from_anyhow(&err).code
    }

    #[test]
    fn test_gallery_errors_map_to_sysexits() {
        assert_eq!(code_of(GalleryError::EmptyQuery), USAGE_ERROR);
        assert_eq!(code_of(GalleryError::Config("bad".into())), USAGE_ERROR);
        assert_eq!(
            code_of(GalleryError::UploadFailed {
                file: "a.jpg".into(),
                reason: "status 500".into()
            }),
            UPLOAD_FAILED
        );
        assert_eq!(
            code_of(GalleryError::Transport("refused".into())),
            SERVICE_UNAVAILABLE
        );
        assert_eq!(
            code_of(GalleryError::Status {
                endpoint: "list",
                status: 503
            }),
            SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unclassified_error_is_general() {
        let err = anyhow::anyhow!("Image 42 not found");
        let exit = ExitCode::from_anyhow(&err);
        assert_eq!(exit.code, GENERAL_ERROR);
        assert_eq!(exit.message.as_deref(), Some("Image 42 not found"));
    }

    #[test]
    fn test_unreadable_input_file() {
        let err = anyhow::anyhow!("No such file or directory")
            .context("Failed to read file: missing.jpg");
        assert_eq!(ExitCode::from_anyhow(&err).code, INPUT_ERROR);
    }
}

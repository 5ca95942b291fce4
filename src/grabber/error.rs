use std::os::raw::c_int;
use std::path::PathBuf;

use thiserror::Error;

use crate::grabber::sys;

#[derive(Error, Debug)]
pub enum GrabberError {
    #[error("Failed to load tisgrabber library {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("tisgrabber library is missing export {name}: {source}")]
    MissingSymbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("tisgrabber library was not initialized (IC_InitLibrary returned {0})")]
    NotInitialized(c_int),

    #[error("SDK returned a null grabber handle")]
    NullHandle,

    #[error("String passed to the SDK contains an interior NUL: {0:?}")]
    InvalidString(String),

    #[error("{0} is not allowed while the live stream is running")]
    LiveStreamRunning(&'static str),

    #[error("{0} is not allowed while a frame-ready callback is registered")]
    CallbackRegistered(&'static str),

    #[error("{op} failed: {name} ({code})")]
    Status {
        op: &'static str,
        code: c_int,
        name: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, GrabberError>;

/// Human readable name for a vendor status code.
///
/// Several sentinels share a value (-3 is both "not available" and "not in
/// live mode"), so the name lists every meaning.
pub fn status_name(code: c_int) -> &'static str {
    match code {
        sys::IC_SUCCESS => "IC_SUCCESS",
        sys::IC_ERROR => "IC_ERROR",
        sys::IC_NO_HANDLE => "IC_NO_HANDLE",
        sys::IC_NO_DEVICE => "IC_NO_DEVICE",
        sys::IC_NOT_AVAILABLE => "IC_NOT_AVAILABLE / IC_NOT_IN_LIVEMODE",
        sys::IC_PROPERTY_ITEM_NOT_AVAILABLE => "IC_PROPERTY_ITEM_NOT_AVAILABLE",
        sys::IC_PROPERTY_ELEMENT_NOT_AVAILABLE => "IC_PROPERTY_ELEMENT_NOT_AVAILABLE",
        sys::IC_PROPERTY_ELEMENT_WRONG_INTERFACE => "IC_PROPERTY_ELEMENT_WRONG_INTERFACE",
        sys::IC_INDEX_OUT_OF_RANGE => "IC_INDEX_OUT_OF_RANGE",
        sys::IC_FILE_NOT_FOUND => "IC_FILE_NOT_FOUND",
        _ => "unknown status",
    }
}

pub(crate) fn status(op: &'static str, code: c_int) -> GrabberError {
    GrabberError::Status {
        op,
        code,
        name: status_name(code),
    }
}

/// Turns a status-returning call into a `Result`. The code is kept as is.
pub(crate) fn check(op: &'static str, code: c_int) -> Result<()> {
    if code == sys::IC_SUCCESS {
        Ok(())
    } else {
        Err(status(op, code))
    }
}

/// Fails `op` while the stream is live, when the SDK may be inside a callback.
pub(crate) fn ensure_stopped(live: bool, op: &'static str) -> Result<()> {
    if live {
        Err(GrabberError::LiveStreamRunning(op))
    } else {
        Ok(())
    }
}

/// Fails `op` while a frame-ready callback holds a buffer size for the
/// current format.
pub(crate) fn ensure_no_frame_callback(registered: bool, op: &'static str) -> Result<()> {
    if registered {
        Err(GrabberError::CallbackRegistered(op))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes() {
        assert!(check("IC_StartLive", sys::IC_SUCCESS).is_ok());
    }

    #[test]
    fn failure_keeps_raw_code() {
        let err = check("IC_SnapImage", sys::IC_NOT_IN_LIVEMODE).unwrap_err();
        match err {
            GrabberError::Status { op, code, .. } => {
                assert_eq!(op, "IC_SnapImage");
                assert_eq!(code, -3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn display_names_the_sentinel() {
        let err = check("IC_OpenDevByUniqueName", sys::IC_NO_DEVICE).unwrap_err();
        assert_eq!(
            err.to_string(),
            "IC_OpenDevByUniqueName failed: IC_NO_DEVICE (-2)"
        );
    }

    #[test]
    fn unknown_codes_are_reported() {
        assert_eq!(status_name(42), "unknown status");
    }

    #[test]
    fn callbacks_cannot_change_while_live() {
        assert!(ensure_stopped(false, "IC_SetFrameReadyCallback").is_ok());
        let err = ensure_stopped(true, "IC_SetFrameReadyCallback").unwrap_err();
        assert!(matches!(err, GrabberError::LiveStreamRunning("IC_SetFrameReadyCallback")));
        assert_eq!(
            err.to_string(),
            "IC_SetFrameReadyCallback is not allowed while the live stream is running"
        );
    }

    #[test]
    fn format_cannot_change_under_a_frame_callback() {
        assert!(ensure_no_frame_callback(false, "IC_SetFormat").is_ok());
        let err = ensure_no_frame_callback(true, "IC_SetVideoFormat").unwrap_err();
        assert!(matches!(err, GrabberError::CallbackRegistered("IC_SetVideoFormat")));
    }
}

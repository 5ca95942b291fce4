//! Runtime loading of the tisgrabber dynamic library.
//!
//! The vendor library cannot be linked at build time, so every export is
//! resolved through `libloading` into a table of function pointers. The table
//! stays valid for as long as the [`GrabberLibrary`] that owns the `Library`
//! is alive; handles keep it alive through an `Arc`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use libloading::{Library, Symbol};
use tracing::{debug, info, instrument};

use crate::grabber::error::{GrabberError, Result, status};
use crate::grabber::sys;
use crate::grabber::types::DeviceInfo;

macro_rules! load_api {
    ($lib:expr, { $($name:ident),* $(,)? }) => {
        Api {
            $($name: load_symbol::<sys::$name>($lib, stringify!($name))?,)*
        }
    };
}

#[allow(non_snake_case)]
pub(crate) struct Api {
    pub IC_InitLibrary: sys::IC_InitLibrary,
    pub IC_CloseLibrary: sys::IC_CloseLibrary,
    pub IC_CreateGrabber: sys::IC_CreateGrabber,
    pub IC_ReleaseGrabber: sys::IC_ReleaseGrabber,
    pub IC_GetDeviceCount: sys::IC_GetDeviceCount,
    pub IC_GetUniqueNamefromList: sys::IC_GetUniqueNamefromList,
    pub IC_GetDevice: sys::IC_GetDevice,
    pub IC_OpenDevByUniqueName: sys::IC_OpenDevByUniqueName,
    pub IC_OpenVideoCaptureDevice: sys::IC_OpenVideoCaptureDevice,
    pub IC_CloseVideoCaptureDevice: sys::IC_CloseVideoCaptureDevice,
    pub IC_IsDevValid: sys::IC_IsDevValid,
    pub IC_LoadDeviceStateFromFile: sys::IC_LoadDeviceStateFromFile,
    pub IC_SaveDeviceStateToFile: sys::IC_SaveDeviceStateToFile,
    pub IC_ShowDeviceSelectionDialog: sys::IC_ShowDeviceSelectionDialog,
    pub IC_ShowPropertyDialog: sys::IC_ShowPropertyDialog,
    pub IC_SetHWnd: sys::IC_SetHWnd,
    pub IC_GetVideoFormatCount: sys::IC_GetVideoFormatCount,
    pub IC_GetVideoFormat: sys::IC_GetVideoFormat,
    pub IC_SetVideoFormat: sys::IC_SetVideoFormat,
    pub IC_GetVideoFormatWidth: sys::IC_GetVideoFormatWidth,
    pub IC_GetVideoFormatHeight: sys::IC_GetVideoFormatHeight,
    pub IC_GetInputChannelCount: sys::IC_GetInputChannelCount,
    pub IC_GetInputChannel: sys::IC_GetInputChannel,
    pub IC_GetVideoNormCount: sys::IC_GetVideoNormCount,
    pub IC_GetVideoNorm: sys::IC_GetVideoNorm,
    pub IC_SetFormat: sys::IC_SetFormat,
    pub IC_GetFormat: sys::IC_GetFormat,
    pub IC_SetFrameRate: sys::IC_SetFrameRate,
    pub IC_GetFrameRate: sys::IC_GetFrameRate,
    pub IC_StartLive: sys::IC_StartLive,
    pub IC_StopLive: sys::IC_StopLive,
    pub IC_IsLive: sys::IC_IsLive,
    pub IC_SetContinuousMode: sys::IC_SetContinuousMode,
    pub IC_SnapImage: sys::IC_SnapImage,
    pub IC_GetImageDescription: sys::IC_GetImageDescription,
    pub IC_GetImagePtr: sys::IC_GetImagePtr,
    pub IC_SaveImage: sys::IC_SaveImage,
    pub IC_GetCameraProperty: sys::IC_GetCameraProperty,
    pub IC_SetCameraProperty: sys::IC_SetCameraProperty,
    pub IC_IsPropertyAvailable: sys::IC_IsPropertyAvailable,
    pub IC_SetPropertyValue: sys::IC_SetPropertyValue,
    pub IC_GetPropertyValue: sys::IC_GetPropertyValue,
    pub IC_GetPropertyValueRange: sys::IC_GetPropertyValueRange,
    pub IC_SetPropertySwitch: sys::IC_SetPropertySwitch,
    pub IC_GetPropertySwitch: sys::IC_GetPropertySwitch,
    pub IC_PropertyOnePush: sys::IC_PropertyOnePush,
    pub IC_SetPropertyAbsoluteValue: sys::IC_SetPropertyAbsoluteValue,
    pub IC_GetPropertyAbsoluteValue: sys::IC_GetPropertyAbsoluteValue,
    pub IC_GetPropertyAbsoluteValueRange: sys::IC_GetPropertyAbsoluteValueRange,
    pub IC_SetFrameReadyCallback: sys::IC_SetFrameReadyCallback,
    pub IC_SetCallbacks: sys::IC_SetCallbacks,
}

fn load_symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T> {
    let mut symbol = Vec::with_capacity(name.len() + 1);
    symbol.extend_from_slice(name.as_bytes());
    symbol.push(0);
    // SAFETY: T is one of the function pointer types declared in `sys`, which
    // mirror the vendor header. The pointer is copied out of the Symbol and is
    // only used while `lib` is alive (both live in `GrabberLibrary`).
    let sym: Symbol<T> = unsafe { lib.get(&symbol) }
        .map_err(|source| GrabberError::MissingSymbol { name, source })?;
    Ok(*sym)
}

/// A loaded, optionally initialized, tisgrabber library.
pub struct GrabberLibrary {
    api: Api,
    path: PathBuf,
    initialized: bool,
    // Must outlive `api`; dropped last.
    _lib: Library,
}

impl GrabberLibrary {
    /// Library path used when none is configured: the 64-bit build lives in
    /// `./module`, the 32-bit build is looked up by name.
    pub fn default_path() -> PathBuf {
        if cfg!(target_pointer_width = "64") {
            PathBuf::from("./module/tisgrabber_x64.dll")
        } else {
            PathBuf::from("tisgrabber.dll")
        }
    }

    /// Loads the library and resolves every export the binding uses.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        // SAFETY: loading runs the library's initialisers; the vendor DLL has
        // no initialisation requirements beyond IC_InitLibrary, called later.
        let lib = unsafe { Library::new(&path) }.map_err(|source| GrabberError::Load {
            path: path.clone(),
            source,
        })?;

        let api = load_api!(&lib, {
            IC_InitLibrary,
            IC_CloseLibrary,
            IC_CreateGrabber,
            IC_ReleaseGrabber,
            IC_GetDeviceCount,
            IC_GetUniqueNamefromList,
            IC_GetDevice,
            IC_OpenDevByUniqueName,
            IC_OpenVideoCaptureDevice,
            IC_CloseVideoCaptureDevice,
            IC_IsDevValid,
            IC_LoadDeviceStateFromFile,
            IC_SaveDeviceStateToFile,
            IC_ShowDeviceSelectionDialog,
            IC_ShowPropertyDialog,
            IC_SetHWnd,
            IC_GetVideoFormatCount,
            IC_GetVideoFormat,
            IC_SetVideoFormat,
            IC_GetVideoFormatWidth,
            IC_GetVideoFormatHeight,
            IC_GetInputChannelCount,
            IC_GetInputChannel,
            IC_GetVideoNormCount,
            IC_GetVideoNorm,
            IC_SetFormat,
            IC_GetFormat,
            IC_SetFrameRate,
            IC_GetFrameRate,
            IC_StartLive,
            IC_StopLive,
            IC_IsLive,
            IC_SetContinuousMode,
            IC_SnapImage,
            IC_GetImageDescription,
            IC_GetImagePtr,
            IC_SaveImage,
            IC_GetCameraProperty,
            IC_SetCameraProperty,
            IC_IsPropertyAvailable,
            IC_SetPropertyValue,
            IC_GetPropertyValue,
            IC_GetPropertyValueRange,
            IC_SetPropertySwitch,
            IC_GetPropertySwitch,
            IC_PropertyOnePush,
            IC_SetPropertyAbsoluteValue,
            IC_GetPropertyAbsoluteValue,
            IC_GetPropertyAbsoluteValueRange,
            IC_SetFrameReadyCallback,
            IC_SetCallbacks,
        });

        debug!("Resolved tisgrabber exports");
        Ok(Self {
            api,
            path,
            initialized: false,
            _lib: lib,
        })
    }

    /// Calls `IC_InitLibrary`. `None` runs the SDK in trial mode.
    pub fn init(&mut self, license_key: Option<&str>) -> Result<()> {
        let key = license_key.map(to_cstring).transpose()?;
        let key_ptr = key.as_ref().map_or(ptr::null(), |k| k.as_ptr());
        let code = unsafe { (self.api.IC_InitLibrary)(key_ptr) };
        if code != sys::IC_SUCCESS {
            return Err(GrabberError::NotInitialized(code));
        }
        self.initialized = true;
        info!(path = %self.path.display(), trial = license_key.is_none(), "tisgrabber initialized");
        Ok(())
    }

    /// Loads and initializes the library in one step.
    pub fn open(path: impl AsRef<Path>, license_key: Option<&str>) -> Result<Arc<Self>> {
        let mut lib = Self::load(path)?;
        lib.init(license_key)?;
        Ok(Arc::new(lib))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn api(&self) -> Result<&Api> {
        if !self.initialized {
            return Err(GrabberError::NotInitialized(sys::IC_ERROR));
        }
        Ok(&self.api)
    }

    pub(crate) fn api_unchecked(&self) -> &Api {
        &self.api
    }

    /// Rebuilds the SDK's device list and returns its entries.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let api = self.api()?;
        let count = unsafe { (api.IC_GetDeviceCount)() };
        if count < 0 {
            return Err(status("IC_GetDeviceCount", count));
        }

        let mut devices = Vec::with_capacity(count as usize);
        for index in 0..count {
            let name = unsafe { from_c_str((api.IC_GetDevice)(index)) }
                .ok_or_else(|| status("IC_GetDevice", sys::IC_INDEX_OUT_OF_RANGE))?;
            let unique_name = unsafe { from_c_str((api.IC_GetUniqueNamefromList)(index)) }
                .ok_or_else(|| status("IC_GetUniqueNamefromList", sys::IC_INDEX_OUT_OF_RANGE))?;
            devices.push(DeviceInfo {
                index: index as usize,
                name,
                unique_name,
            });
        }
        debug!(count = devices.len(), "Enumerated devices");
        Ok(devices)
    }
}

impl Drop for GrabberLibrary {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { (self.api.IC_CloseLibrary)() }
        }
    }
}

pub(crate) fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| GrabberError::InvalidString(s.to_string()))
}

/// Copies a NUL-terminated string owned by the SDK. `None` for null pointers.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid for
/// the duration of the call.
pub(crate) unsafe fn from_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let s = unsafe { CStr::from_ptr(ptr) };
    Some(s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_reports_path() {
        let result = GrabberLibrary::load("/nonexistent/tisgrabber_x64.dll");
        match result {
            Err(GrabberError::Load { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/tisgrabber_x64.dll"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("loading a missing library succeeded"),
        }
    }

    #[test]
    fn default_path_matches_pointer_width() {
        let path = GrabberLibrary::default_path();
        if cfg!(target_pointer_width = "64") {
            assert!(path.ends_with("tisgrabber_x64.dll"));
        } else {
            assert_eq!(path, PathBuf::from("tisgrabber.dll"));
        }
    }

    #[test]
    fn interior_nul_is_rejected() {
        assert!(matches!(
            to_cstring("DFK\033UX264"),
            Err(GrabberError::InvalidString(_))
        ));
        assert_eq!(to_cstring("DFK 33UX264").unwrap().as_bytes(), b"DFK 33UX264");
    }

    #[test]
    fn null_c_str_is_none() {
        assert_eq!(unsafe { from_c_str(ptr::null()) }, None);
        let owned = CString::new("Y800 (640x480)").unwrap();
        assert_eq!(
            unsafe { from_c_str(owned.as_ptr()) }.as_deref(),
            Some("Y800 (640x480)")
        );
    }
}

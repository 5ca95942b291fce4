//! Raw declarations for the tisgrabber C ABI.
//!
//! The library is never linked at build time: every export is described here
//! as a function pointer type and resolved at runtime by
//! [`GrabberLibrary`](crate::grabber::GrabberLibrary).

#![allow(non_snake_case, non_camel_case_types)]

use std::os::raw::{c_char, c_float, c_int, c_long, c_uchar, c_ulong, c_void};

pub const IC_SUCCESS: c_int = 1;
pub const IC_ERROR: c_int = 0;
pub const IC_NO_HANDLE: c_int = -1;
pub const IC_NO_DEVICE: c_int = -2;
pub const IC_NOT_AVAILABLE: c_int = -3;
pub const IC_NO_PROPERTYSET: c_int = -3;
pub const IC_DEFAULT_WINDOW_SIZE_SET: c_int = -3;
pub const IC_NOT_IN_LIVEMODE: c_int = -3;
pub const IC_PROPERTY_ITEM_NOT_AVAILABLE: c_int = -4;
pub const IC_PROPERTY_ELEMENT_NOT_AVAILABLE: c_int = -5;
pub const IC_PROPERTY_ELEMENT_WRONG_INTERFACE: c_int = -6;
pub const IC_INDEX_OUT_OF_RANGE: c_int = -7;

// Returned by IC_LoadDeviceStateFromFile and friends.
pub const IC_WRONG_XML_FORMAT: c_int = -1;
pub const IC_WRONG_INCOMPATIBLE_XML: c_int = -3;
pub const IC_NOT_ALL_PROPERTIES_RESTORED: c_int = -4;
pub const IC_DEVICE_NOT_FOUND: c_int = -5;
pub const IC_FILE_NOT_FOUND: c_int = 35;

/// Opaque grabber object. Only ever handled through `*mut HGRABBER`.
#[repr(C)]
pub struct HGRABBER {
    pub unused: c_int,
}

/// Opaque codec object used for AVI capture.
#[repr(C)]
pub struct HCODEC {
    pub unused: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FILTERPARAMETER {
    pub Name: [c_char; 30],
    pub Type: c_int,
}

#[repr(C)]
#[derive(Debug)]
pub struct HFRAMEFILTER {
    pub pFilter: *mut c_void,
    pub bHasDialog: c_int,
    pub ParameterCount: c_int,
    pub Parameters: *mut FILTERPARAMETER,
}

/// Pixel formats the SDK can deliver into memory.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum COLORFORMAT {
    Y800 = 0,
    RGB24 = 1,
    RGB32 = 2,
    UYVY = 3,
    Y16 = 4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FRAMEFILTER_PARAM_TYPE {
    eParamLong = 0,
    eParamBoolean = 1,
    eParamFloat = 2,
    eParamString = 3,
    eParamData = 4,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IMG_FILETYPE {
    FILETYPE_BMP = 0,
    FILETYPE_JPEG = 1,
}

pub type FRAME_READY_CALLBACK = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    pData: *mut c_uchar,
    frameNumber: c_ulong,
    user: *mut c_void,
);

pub type DEVICE_LOST_CALLBACK = unsafe extern "system" fn(hGrabber: *mut HGRABBER, user: *mut c_void);

// Library lifetime
pub type IC_InitLibrary = unsafe extern "system" fn(szLicenseKey: *const c_char) -> c_int;
pub type IC_CloseLibrary = unsafe extern "system" fn();

// Grabber lifetime and device selection
pub type IC_CreateGrabber = unsafe extern "system" fn() -> *mut HGRABBER;
pub type IC_ReleaseGrabber = unsafe extern "system" fn(phGrabber: *mut *mut HGRABBER);
pub type IC_GetDeviceCount = unsafe extern "system" fn() -> c_int;
pub type IC_GetUniqueNamefromList = unsafe extern "system" fn(iIndex: c_int) -> *const c_char;
pub type IC_GetDevice = unsafe extern "system" fn(iIndex: c_int) -> *const c_char;
pub type IC_OpenDevByUniqueName =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, szUniqueName: *const c_char) -> c_int;
pub type IC_OpenVideoCaptureDevice =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, szDeviceName: *const c_char) -> c_int;
pub type IC_CloseVideoCaptureDevice = unsafe extern "system" fn(hGrabber: *mut HGRABBER);
pub type IC_IsDevValid = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_LoadDeviceStateFromFile =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, szFileName: *const c_char) -> *mut HGRABBER;
pub type IC_SaveDeviceStateToFile =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, szFileName: *const c_char) -> c_int;
pub type IC_ShowDeviceSelectionDialog =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> *mut HGRABBER;
pub type IC_ShowPropertyDialog = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_SetHWnd = unsafe extern "system" fn(hGrabber: *mut HGRABBER, hWnd: isize) -> c_int;

// Video formats, channels and norms
pub type IC_GetVideoFormatCount = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_GetVideoFormat =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, iIndex: c_int) -> *const c_char;
pub type IC_SetVideoFormat =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, szFormat: *const c_char) -> c_int;
pub type IC_GetVideoFormatWidth = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_GetVideoFormatHeight = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_GetInputChannelCount = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_GetInputChannel =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, iIndex: c_int) -> *const c_char;
pub type IC_GetVideoNormCount = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_GetVideoNorm =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, iIndex: c_int) -> *const c_char;
pub type IC_SetFormat = unsafe extern "system" fn(hGrabber: *mut HGRABBER, format: c_int) -> c_int;
pub type IC_GetFormat = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_SetFrameRate = unsafe extern "system" fn(hGrabber: *mut HGRABBER, fps: c_float) -> c_int;
pub type IC_GetFrameRate = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_float;

// Streaming and frames
pub type IC_StartLive = unsafe extern "system" fn(hGrabber: *mut HGRABBER, iShow: c_int) -> c_int;
pub type IC_StopLive = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_IsLive = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> c_int;
pub type IC_SetContinuousMode = unsafe extern "system" fn(hGrabber: *mut HGRABBER, cont: c_int) -> c_int;
pub type IC_SnapImage =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, iTimeOutMillisek: c_int) -> c_int;
pub type IC_GetImageDescription = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    lWidth: *mut c_long,
    lHeight: *mut c_long,
    iBitsPerPixel: *mut c_int,
    format: *mut c_int,
) -> c_int;
pub type IC_GetImagePtr = unsafe extern "system" fn(hGrabber: *mut HGRABBER) -> *mut c_uchar;
pub type IC_SaveImage = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    szFileName: *const c_char,
    ft: c_int,
    quality: c_long,
) -> c_int;

// Properties
pub type IC_GetCameraProperty =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, eProperty: c_int, lValue: *mut c_long) -> c_int;
pub type IC_SetCameraProperty =
    unsafe extern "system" fn(hGrabber: *mut HGRABBER, eProperty: c_int, lValue: c_long) -> c_int;
pub type IC_IsPropertyAvailable = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
) -> c_int;
pub type IC_SetPropertyValue = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Value: c_int,
) -> c_int;
pub type IC_GetPropertyValue = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Value: *mut c_long,
) -> c_int;
pub type IC_GetPropertyValueRange = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Min: *mut c_long,
    Max: *mut c_long,
) -> c_int;
pub type IC_SetPropertySwitch = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    On: c_int,
) -> c_int;
pub type IC_GetPropertySwitch = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    On: *mut c_long,
) -> c_int;
pub type IC_PropertyOnePush = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
) -> c_int;
pub type IC_SetPropertyAbsoluteValue = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Value: c_float,
) -> c_int;
pub type IC_GetPropertyAbsoluteValue = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Value: *mut c_float,
) -> c_int;
pub type IC_GetPropertyAbsoluteValueRange = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    Property: *const c_char,
    Element: *const c_char,
    Min: *mut c_float,
    Max: *mut c_float,
) -> c_int;

// Callbacks
pub type IC_SetFrameReadyCallback = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    cb: Option<FRAME_READY_CALLBACK>,
    x1_argument_in_void_userdata: *mut c_void,
) -> c_int;
pub type IC_SetCallbacks = unsafe extern "system" fn(
    hGrabber: *mut HGRABBER,
    cb: Option<FRAME_READY_CALLBACK>,
    x1_argument_in_void_userdata: *mut c_void,
    dlCB: Option<DEVICE_LOST_CALLBACK>,
    x2_argument_in_void_userdata: *mut c_void,
) -> c_int;

//! Owned grabber handle and its device operations.

use std::os::raw::{c_float, c_int, c_long, c_uchar, c_ulong, c_void};
use std::path::Path;
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::common::flip_rows;
use crate::grabber::error::{GrabberError, Result, check, ensure_no_frame_callback, ensure_stopped, status};
use crate::grabber::library::{Api, GrabberLibrary, from_c_str, to_cstring};
use crate::grabber::sys;
use crate::grabber::types::{ImageDescription, ImageFileType, PropertyRange, SinkFormat};

type FrameCallback = Box<dyn FnMut(u64, &[u8]) + Send>;
type DeviceLostCallback = Box<dyn FnMut() + Send>;

struct CallbackState {
    callback: FrameCallback,
    buffer_len: usize,
}

/// Arguments for one `IC_SetCallbacks` call.
type Registration = (
    Option<sys::FRAME_READY_CALLBACK>,
    *mut c_void,
    Option<sys::DEVICE_LOST_CALLBACK>,
    *mut c_void,
);

/// Closures registered with the SDK for one handle.
///
/// Heap-allocated so the pointers handed to the SDK stay put.
#[derive(Default)]
struct CallbackSlots {
    frame: Option<Box<CallbackState>>,
    device_lost: Option<Box<DeviceLostCallback>>,
}

impl CallbackSlots {
    fn is_registered(&self) -> bool {
        self.frame.is_some() || self.device_lost.is_some()
    }

    fn registration(&mut self) -> Registration {
        let (frame_cb, frame_user) = match self.frame.as_mut() {
            Some(state) => (
                Some(frame_ready_trampoline as sys::FRAME_READY_CALLBACK),
                &mut **state as *mut CallbackState as *mut c_void,
            ),
            None => (None, ptr::null_mut()),
        };
        let (lost_cb, lost_user) = match self.device_lost.as_mut() {
            Some(lost) => (
                Some(device_lost_trampoline as sys::DEVICE_LOST_CALLBACK),
                &mut **lost as *mut DeviceLostCallback as *mut c_void,
            ),
            None => (None, ptr::null_mut()),
        };
        (frame_cb, frame_user, lost_cb, lost_user)
    }
}

/// A grabber object created by the SDK, released when dropped.
pub struct Grabber {
    lib: Arc<GrabberLibrary>,
    raw: NonNull<sys::HGRABBER>,
    callbacks: CallbackSlots,
}

// The SDK allows a grabber to be used from any single thread at a time.
unsafe impl Send for Grabber {}

fn path_arg(path: &Path) -> Result<std::ffi::CString> {
    to_cstring(&path.to_string_lossy())
}

fn timeout_ms(timeout: Option<Duration>) -> c_int {
    match timeout {
        Some(t) => t.as_millis().min(c_int::MAX as u128) as c_int,
        None => -1,
    }
}

unsafe extern "system" fn frame_ready_trampoline(
    _grabber: *mut sys::HGRABBER,
    data: *mut c_uchar,
    frame_number: c_ulong,
    user: *mut c_void,
) {
    if user.is_null() || data.is_null() {
        return;
    }
    // SAFETY: `user` is the CallbackState registered by
    // `set_frame_ready_callback`. It is only replaced or freed while the
    // stream is stopped, and Drop unregisters it first.
    let state = unsafe { &mut *(user as *mut CallbackState) };
    // SAFETY: the SDK hands over a full frame of the current video format.
    // The format cannot change while this state is registered.
    let frame = unsafe { std::slice::from_raw_parts(data, state.buffer_len) };
    (state.callback)(frame_number as u64, frame);
}

unsafe extern "system" fn device_lost_trampoline(_grabber: *mut sys::HGRABBER, user: *mut c_void) {
    if user.is_null() {
        return;
    }
    // SAFETY: `user` is the boxed closure registered by
    // `set_device_lost_callback`, only replaced while the stream is stopped.
    let callback = unsafe { &mut *(user as *mut DeviceLostCallback) };
    callback();
}

impl Grabber {
    /// Creates an empty grabber; no device is open yet.
    pub fn new(lib: Arc<GrabberLibrary>) -> Result<Self> {
        let ptr = unsafe { (lib.api()?.IC_CreateGrabber)() };
        Self::from_raw(lib, ptr)
    }

    fn from_raw(lib: Arc<GrabberLibrary>, ptr: *mut sys::HGRABBER) -> Result<Self> {
        NonNull::new(ptr)
            .map(|raw| Grabber {
                lib,
                raw,
                callbacks: CallbackSlots::default(),
            })
            .ok_or(GrabberError::NullHandle)
    }

    fn api(&self) -> &Api {
        // A Grabber can only be created from an initialized library.
        self.lib.api_unchecked()
    }

    fn ptr(&self) -> *mut sys::HGRABBER {
        self.raw.as_ptr()
    }

    pub fn library(&self) -> &Arc<GrabberLibrary> {
        &self.lib
    }

    /// Opens a device by "model serial" unique name.
    #[instrument(skip(self))]
    pub fn open(&mut self, unique_name: &str) -> Result<()> {
        ensure_no_frame_callback(self.callbacks.frame.is_some(), "IC_OpenDevByUniqueName")?;
        let name = to_cstring(unique_name)?;
        let code = unsafe { (self.api().IC_OpenDevByUniqueName)(self.ptr(), name.as_ptr()) };
        check("IC_OpenDevByUniqueName", code)?;
        info!("Opened device");
        Ok(())
    }

    /// Opens the first device matching a model name, e.g. "DFK 72AUC02".
    #[instrument(skip(self))]
    pub fn open_by_name(&mut self, name: &str) -> Result<()> {
        ensure_no_frame_callback(self.callbacks.frame.is_some(), "IC_OpenVideoCaptureDevice")?;
        let name = to_cstring(name)?;
        let code = unsafe { (self.api().IC_OpenVideoCaptureDevice)(self.ptr(), name.as_ptr()) };
        check("IC_OpenVideoCaptureDevice", code)
    }

    pub fn is_valid(&self) -> bool {
        unsafe { (self.api().IC_IsDevValid)(self.ptr()) == sys::IC_SUCCESS }
    }

    pub fn close(&mut self) {
        unsafe { (self.api().IC_CloseVideoCaptureDevice)(self.ptr()) }
    }

    /// Creates a grabber from a device-state XML file written by
    /// [`save_device_state`](Self::save_device_state).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_device_state(lib: Arc<GrabberLibrary>, path: impl AsRef<Path>) -> Result<Self> {
        let file = path_arg(path.as_ref())?;
        let ptr = unsafe { (lib.api()?.IC_LoadDeviceStateFromFile)(ptr::null_mut(), file.as_ptr()) };
        Self::from_raw(lib, ptr)
    }

    pub fn save_device_state(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = path_arg(path.as_ref())?;
        let code = unsafe { (self.api().IC_SaveDeviceStateToFile)(self.ptr(), file.as_ptr()) };
        check("IC_SaveDeviceStateToFile", code)
    }

    /// Opens a device from a saved state file, falling back to a device
    /// selected by unique name, then writes the state file back.
    pub fn open_with_state(
        lib: Arc<GrabberLibrary>,
        state_path: impl AsRef<Path>,
        fallback_unique_name: Option<&str>,
    ) -> Result<Self> {
        let state_path = state_path.as_ref();

        let restored = if state_path.is_file() {
            match Self::load_device_state(lib.clone(), state_path) {
                Ok(g) if g.is_valid() => Some(g),
                Ok(_) => {
                    warn!(path = %state_path.display(), "Device state file did not yield a valid device");
                    None
                }
                Err(e) => {
                    warn!(path = %state_path.display(), error = %e, "Failed to restore device state");
                    None
                }
            }
        } else {
            None
        };

        let grabber = match restored {
            Some(g) => g,
            None => {
                let mut g = Self::new(lib)?;
                match fallback_unique_name {
                    Some(name) => g.open(name)?,
                    None => return Err(status("IC_IsDevValid", sys::IC_NO_DEVICE)),
                }
                g
            }
        };

        if grabber.is_valid() {
            grabber.save_device_state(state_path)?;
        }
        Ok(grabber)
    }

    /// Shows the vendor's device selection dialog. Replaces the handle with
    /// the one the dialog returns.
    ///
    /// Callbacks registered on the old handle are unregistered and dropped
    /// when the handle changes; register them again on the new device.
    pub fn show_device_selection_dialog(&mut self) -> Result<()> {
        let ptr = unsafe { (self.api().IC_ShowDeviceSelectionDialog)(self.ptr()) };
        let raw = NonNull::new(ptr).ok_or(GrabberError::NullHandle)?;
        if raw != self.raw {
            self.unregister_callbacks();
            let mut old = self.raw.as_ptr();
            unsafe { (self.api().IC_ReleaseGrabber)(&mut old) };
            self.raw = raw;
            if std::mem::take(&mut self.callbacks).is_registered() {
                warn!("Device changed; dropped callbacks registered on the previous handle");
            }
        }
        Ok(())
    }

    pub fn show_property_dialog(&self) -> Result<()> {
        let code = unsafe { (self.api().IC_ShowPropertyDialog)(self.ptr()) };
        check("IC_ShowPropertyDialog", code)
    }

    /// Sets the window the live video is drawn into.
    pub fn set_window(&self, hwnd: isize) -> Result<()> {
        let code = unsafe { (self.api().IC_SetHWnd)(self.ptr(), hwnd) };
        check("IC_SetHWnd", code)
    }

    fn string_list(
        &self,
        count_op: &'static str,
        count: c_int,
        item_op: &'static str,
        get: impl Fn(c_int) -> *const std::os::raw::c_char,
    ) -> Result<Vec<String>> {
        if count < 0 {
            return Err(status(count_op, count));
        }
        (0..count)
            .map(|i| {
                unsafe { from_c_str(get(i)) }.ok_or_else(|| status(item_op, sys::IC_INDEX_OUT_OF_RANGE))
            })
            .collect()
    }

    pub fn video_formats(&self) -> Result<Vec<String>> {
        let api = self.api();
        let count = unsafe { (api.IC_GetVideoFormatCount)(self.ptr()) };
        self.string_list("IC_GetVideoFormatCount", count, "IC_GetVideoFormat", |i| unsafe {
            (api.IC_GetVideoFormat)(self.ptr(), i)
        })
    }

    pub fn input_channels(&self) -> Result<Vec<String>> {
        let api = self.api();
        let count = unsafe { (api.IC_GetInputChannelCount)(self.ptr()) };
        self.string_list("IC_GetInputChannelCount", count, "IC_GetInputChannel", |i| unsafe {
            (api.IC_GetInputChannel)(self.ptr(), i)
        })
    }

    pub fn video_norms(&self) -> Result<Vec<String>> {
        let api = self.api();
        let count = unsafe { (api.IC_GetVideoNormCount)(self.ptr()) };
        self.string_list("IC_GetVideoNormCount", count, "IC_GetVideoNorm", |i| unsafe {
            (api.IC_GetVideoNorm)(self.ptr(), i)
        })
    }

    /// Selects a video format by name, e.g. "RGB24 (1280x960)".
    pub fn set_video_format(&self, format: &str) -> Result<()> {
        ensure_no_frame_callback(self.callbacks.frame.is_some(), "IC_SetVideoFormat")?;
        let format = to_cstring(format)?;
        let code = unsafe { (self.api().IC_SetVideoFormat)(self.ptr(), format.as_ptr()) };
        check("IC_SetVideoFormat", code)
    }

    pub fn video_format_size(&self) -> (usize, usize) {
        let api = self.api();
        let w = unsafe { (api.IC_GetVideoFormatWidth)(self.ptr()) };
        let h = unsafe { (api.IC_GetVideoFormatHeight)(self.ptr()) };
        (w.max(0) as usize, h.max(0) as usize)
    }

    pub fn set_frame_rate(&self, fps: f32) -> Result<()> {
        let code = unsafe { (self.api().IC_SetFrameRate)(self.ptr(), fps as c_float) };
        check("IC_SetFrameRate", code)
    }

    pub fn frame_rate(&self) -> f32 {
        unsafe { (self.api().IC_GetFrameRate)(self.ptr()) }
    }

    pub fn set_sink_format(&self, format: SinkFormat) -> Result<()> {
        ensure_no_frame_callback(self.callbacks.frame.is_some(), "IC_SetFormat")?;
        let code = unsafe { (self.api().IC_SetFormat)(self.ptr(), format.to_raw()) };
        check("IC_SetFormat", code)
    }

    pub fn sink_format(&self) -> SinkFormat {
        SinkFormat::from_raw(unsafe { (self.api().IC_GetFormat)(self.ptr()) })
    }

    /// Starts the stream. With `show == false` frames are delivered to memory
    /// only, without a live window.
    pub fn start_live(&self, show: bool) -> Result<()> {
        let code = unsafe { (self.api().IC_StartLive)(self.ptr(), show as c_int) };
        check("IC_StartLive", code)?;
        debug!(show, "Live stream started");
        Ok(())
    }

    pub fn stop_live(&self) -> Result<()> {
        let code = unsafe { (self.api().IC_StopLive)(self.ptr()) };
        check("IC_StopLive", code)?;
        debug!("Live stream stopped");
        Ok(())
    }

    pub fn is_live(&self) -> bool {
        unsafe { (self.api().IC_IsLive)(self.ptr()) == sys::IC_SUCCESS }
    }

    /// `true` copies every frame into memory automatically; `false` requires
    /// [`snap`](Self::snap) for each frame. The SDK's flag is inverted.
    pub fn set_continuous_mode(&self, continuous: bool) -> Result<()> {
        let code = unsafe { (self.api().IC_SetContinuousMode)(self.ptr(), (!continuous) as c_int) };
        check("IC_SetContinuousMode", code)
    }

    /// Waits for the next frame. `None` waits without a timeout.
    pub fn snap(&self, timeout: Option<Duration>) -> Result<()> {
        let code = unsafe { (self.api().IC_SnapImage)(self.ptr(), timeout_ms(timeout)) };
        check("IC_SnapImage", code)
    }

    pub fn image_description(&self) -> Result<ImageDescription> {
        let mut width: c_long = 0;
        let mut height: c_long = 0;
        let mut bits: c_int = 0;
        let mut format: c_int = 0;
        let code = unsafe {
            (self.api().IC_GetImageDescription)(self.ptr(), &mut width, &mut height, &mut bits, &mut format)
        };
        check("IC_GetImageDescription", code)?;
        Ok(ImageDescription::from_sdk(width, height, bits, format))
    }

    /// Copies the last snapped frame out of the SDK's buffer.
    ///
    /// The SDK stores frames bottom-up; rows are returned top-down.
    pub fn read_frame(&self) -> Result<(ImageDescription, Vec<u8>)> {
        let desc = self.image_description()?;
        let ptr = unsafe { (self.api().IC_GetImagePtr)(self.ptr()) };
        if ptr.is_null() {
            return Err(status("IC_GetImagePtr", sys::IC_ERROR));
        }
        // SAFETY: the SDK's buffer holds one frame of the current description
        // and is not written again until the next snap on this handle, which
        // cannot happen while `&self` is borrowed here.
        let src = unsafe { std::slice::from_raw_parts(ptr as *const u8, desc.buffer_len()) };
        Ok((desc, top_down(&desc, src)))
    }

    /// Saves the last snapped frame through the SDK. `quality` only applies to
    /// JPEG (1-100).
    pub fn save_image(&self, path: impl AsRef<Path>, file_type: ImageFileType, quality: u8) -> Result<()> {
        let file = path_arg(path.as_ref())?;
        let code = unsafe {
            (self.api().IC_SaveImage)(self.ptr(), file.as_ptr(), file_type.to_raw(), quality.min(100) as c_long)
        };
        check("IC_SaveImage", code)
    }

    pub fn property_available(&self, property: &str, element: Option<&str>) -> Result<bool> {
        let property = to_cstring(property)?;
        let element = element.map(to_cstring).transpose()?;
        let element_ptr = element.as_ref().map_or(ptr::null(), |e| e.as_ptr());
        let code = unsafe { (self.api().IC_IsPropertyAvailable)(self.ptr(), property.as_ptr(), element_ptr) };
        Ok(code == sys::IC_SUCCESS)
    }

    pub fn set_property_value(&self, property: &str, element: &str, value: i32) -> Result<()> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let code = unsafe { (self.api().IC_SetPropertyValue)(self.ptr(), p.as_ptr(), e.as_ptr(), value) };
        check("IC_SetPropertyValue", code)
    }

    pub fn property_value(&self, property: &str, element: &str) -> Result<i32> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let mut value: c_long = 0;
        let code = unsafe { (self.api().IC_GetPropertyValue)(self.ptr(), p.as_ptr(), e.as_ptr(), &mut value) };
        check("IC_GetPropertyValue", code)?;
        Ok(value as i32)
    }

    pub fn property_value_range(&self, property: &str, element: &str) -> Result<PropertyRange<i32>> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let (mut min, mut max): (c_long, c_long) = (0, 0);
        let code = unsafe {
            (self.api().IC_GetPropertyValueRange)(self.ptr(), p.as_ptr(), e.as_ptr(), &mut min, &mut max)
        };
        check("IC_GetPropertyValueRange", code)?;
        Ok(PropertyRange {
            min: min as i32,
            max: max as i32,
        })
    }

    pub fn set_property_switch(&self, property: &str, element: &str, on: bool) -> Result<()> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let code = unsafe { (self.api().IC_SetPropertySwitch)(self.ptr(), p.as_ptr(), e.as_ptr(), on as c_int) };
        check("IC_SetPropertySwitch", code)
    }

    pub fn property_switch(&self, property: &str, element: &str) -> Result<bool> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let mut on: c_long = 0;
        let code = unsafe { (self.api().IC_GetPropertySwitch)(self.ptr(), p.as_ptr(), e.as_ptr(), &mut on) };
        check("IC_GetPropertySwitch", code)?;
        Ok(on != 0)
    }

    pub fn property_one_push(&self, property: &str, element: &str) -> Result<()> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let code = unsafe { (self.api().IC_PropertyOnePush)(self.ptr(), p.as_ptr(), e.as_ptr()) };
        check("IC_PropertyOnePush", code)
    }

    /// Sets a value through the absolute interface (seconds, dB, ...).
    pub fn set_property_absolute_value(&self, property: &str, element: &str, value: f32) -> Result<()> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let code =
            unsafe { (self.api().IC_SetPropertyAbsoluteValue)(self.ptr(), p.as_ptr(), e.as_ptr(), value as c_float) };
        check("IC_SetPropertyAbsoluteValue", code)
    }

    pub fn property_absolute_value(&self, property: &str, element: &str) -> Result<f32> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let mut value: c_float = 0.0;
        let code =
            unsafe { (self.api().IC_GetPropertyAbsoluteValue)(self.ptr(), p.as_ptr(), e.as_ptr(), &mut value) };
        check("IC_GetPropertyAbsoluteValue", code)?;
        Ok(value)
    }

    pub fn property_absolute_value_range(&self, property: &str, element: &str) -> Result<PropertyRange<f32>> {
        let (p, e) = (to_cstring(property)?, to_cstring(element)?);
        let (mut min, mut max): (c_float, c_float) = (0.0, 0.0);
        let code = unsafe {
            (self.api().IC_GetPropertyAbsoluteValueRange)(self.ptr(), p.as_ptr(), e.as_ptr(), &mut min, &mut max)
        };
        check("IC_GetPropertyAbsoluteValueRange", code)?;
        Ok(PropertyRange { min, max })
    }

    /// Reads a DirectShow camera property by its numeric id.
    pub fn camera_property(&self, property: i32) -> Result<i32> {
        let mut value: c_long = 0;
        let code = unsafe { (self.api().IC_GetCameraProperty)(self.ptr(), property, &mut value) };
        check("IC_GetCameraProperty", code)?;
        Ok(value as i32)
    }

    pub fn set_camera_property(&self, property: i32, value: i32) -> Result<()> {
        let code = unsafe { (self.api().IC_SetCameraProperty)(self.ptr(), property, value as c_long) };
        check("IC_SetCameraProperty", code)
    }

    /// Registers a closure called from the SDK's thread for every new frame.
    ///
    /// The slice is the SDK's buffer (bottom-up rows) and is only valid during
    /// the call. Fails while the stream is live. The buffer size is taken
    /// from the current format, which cannot be changed until the callback
    /// is cleared.
    pub fn set_frame_ready_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(u64, &[u8]) + Send + 'static,
    {
        ensure_stopped(self.is_live(), "IC_SetFrameReadyCallback")?;
        let buffer_len = self.image_description()?.buffer_len();
        let mut state = Box::new(CallbackState {
            callback: Box::new(callback),
            buffer_len,
        });
        let user = &mut *state as *mut CallbackState as *mut c_void;
        let code =
            unsafe { (self.api().IC_SetFrameReadyCallback)(self.ptr(), Some(frame_ready_trampoline), user) };
        check("IC_SetFrameReadyCallback", code)?;
        self.callbacks.frame = Some(state);
        Ok(())
    }

    /// Registers a closure called from the SDK's thread when the device is
    /// unplugged or stops responding. Keeps the frame-ready callback, if any.
    /// Fails while the stream is live.
    pub fn set_device_lost_callback<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut() + Send + 'static,
    {
        ensure_stopped(self.is_live(), "IC_SetCallbacks")?;
        let lost: Box<DeviceLostCallback> = Box::new(Box::new(callback));
        let previous = self.callbacks.device_lost.replace(lost);
        let (frame_cb, frame_user, lost_cb, lost_user) = self.callbacks.registration();
        let code = unsafe { (self.api().IC_SetCallbacks)(self.ptr(), frame_cb, frame_user, lost_cb, lost_user) };
        if let Err(e) = check("IC_SetCallbacks", code) {
            // The SDK still holds the previous closure.
            self.callbacks.device_lost = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Unregisters the frame-ready callback. Fails while the stream is live.
    pub fn clear_frame_ready_callback(&mut self) -> Result<()> {
        ensure_stopped(self.is_live(), "IC_SetFrameReadyCallback")?;
        let code = unsafe { (self.api().IC_SetFrameReadyCallback)(self.ptr(), None, ptr::null_mut()) };
        check("IC_SetFrameReadyCallback", code)?;
        self.callbacks.frame = None;
        Ok(())
    }

    /// Stops the stream and detaches every callback from the current handle.
    /// The closures themselves stay in `self.callbacks`.
    fn unregister_callbacks(&self) {
        if !self.callbacks.is_registered() {
            return;
        }
        let api = self.api();
        unsafe {
            (api.IC_StopLive)(self.ptr());
            (api.IC_SetCallbacks)(self.ptr(), None, ptr::null_mut(), None, ptr::null_mut());
        }
    }
}

/// Copies a bottom-up SDK frame with its rows in top-down order.
fn top_down(desc: &ImageDescription, src: &[u8]) -> Vec<u8> {
    let mut data = src.to_vec();
    flip_rows(&mut data, desc.width * desc.bytes_per_pixel());
    data
}

impl Drop for Grabber {
    fn drop(&mut self) {
        self.unregister_callbacks();
        let mut raw = self.raw.as_ptr();
        unsafe { (self.api().IC_ReleaseGrabber)(&mut raw) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_none_waits_forever() {
        assert_eq!(timeout_ms(None), -1);
    }

    #[test]
    fn timeout_is_passed_in_milliseconds() {
        assert_eq!(timeout_ms(Some(Duration::from_secs(2))), 2000);
        assert_eq!(timeout_ms(Some(Duration::from_micros(1500))), 1);
    }

    #[test]
    fn huge_timeout_saturates() {
        assert_eq!(timeout_ms(Some(Duration::from_secs(u64::MAX))), c_int::MAX);
    }

    #[test]
    fn trampoline_forwards_frame_number_and_bytes() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut state = CallbackState {
            callback: Box::new(move |n: u64, bytes: &[u8]| sink.lock().unwrap().push((n, bytes.to_vec()))),
            buffer_len: 4,
        };
        let mut frame = [1u8, 2, 3, 4];
        unsafe {
            frame_ready_trampoline(
                ptr::null_mut(),
                frame.as_mut_ptr(),
                7,
                &mut state as *mut CallbackState as *mut c_void,
            );
        }
        assert_eq!(*seen.lock().unwrap(), vec![(7, vec![1, 2, 3, 4])]);
    }

    #[test]
    fn device_lost_trampoline_calls_closure() {
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = hits.clone();
        let mut callback: DeviceLostCallback = Box::new(move || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        unsafe {
            device_lost_trampoline(ptr::null_mut(), &mut callback as *mut DeviceLostCallback as *mut c_void);
            device_lost_trampoline(ptr::null_mut(), ptr::null_mut());
        }
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    fn desc(width: usize, height: usize, format: SinkFormat, bits_per_pixel: usize) -> ImageDescription {
        ImageDescription {
            width,
            height,
            bits_per_pixel,
            format,
        }
    }

    #[test]
    fn frames_are_copied_top_down() {
        // Two RGB24 pixels per row, bottom row first as the SDK stores it.
        let src = [
            1, 1, 1, 2, 2, 2, // bottom
            3, 3, 3, 4, 4, 4, // middle
            5, 5, 5, 6, 6, 6, // top
        ];
        let data = top_down(&desc(2, 3, SinkFormat::Rgb24, 24), &src);
        assert_eq!(
            data,
            vec![5, 5, 5, 6, 6, 6, 3, 3, 3, 4, 4, 4, 1, 1, 1, 2, 2, 2]
        );
    }

    #[test]
    fn single_row_frames_are_unchanged() {
        let data = top_down(&desc(3, 1, SinkFormat::Y800, 8), &[7, 8, 9]);
        assert_eq!(data, vec![7, 8, 9]);
    }

    #[test]
    fn empty_frames_copy_nothing() {
        assert!(top_down(&desc(0, 4, SinkFormat::Y800, 8), &[]).is_empty());
        assert!(top_down(&desc(4, 0, SinkFormat::Rgb32, 32), &[]).is_empty());
    }

    fn noop_lost() -> DeviceLostCallback {
        Box::new(|| {})
    }

    #[test]
    fn empty_slots_unregister_everything() {
        let mut slots = CallbackSlots::default();
        assert!(!slots.is_registered());
        let (frame_cb, frame_user, lost_cb, lost_user) = slots.registration();
        assert!(frame_cb.is_none() && lost_cb.is_none());
        assert!(frame_user.is_null() && lost_user.is_null());
    }

    #[test]
    fn registration_points_at_the_boxed_closures() {
        let mut slots = CallbackSlots {
            frame: Some(Box::new(CallbackState {
                callback: Box::new(|_: u64, _: &[u8]| {}),
                buffer_len: 1,
            })),
            device_lost: Some(Box::new(noop_lost())),
        };
        let frame_addr = slots.frame.as_deref().map(|s| s as *const CallbackState as *mut c_void);
        let lost_addr = slots.device_lost.as_deref().map(|l| l as *const DeviceLostCallback as *mut c_void);

        let (frame_cb, frame_user, lost_cb, lost_user) = slots.registration();
        assert!(frame_cb.is_some() && lost_cb.is_some());
        assert_eq!(Some(frame_user), frame_addr);
        assert_eq!(Some(lost_user), lost_addr);
    }

    #[test]
    fn swapped_handle_starts_without_callbacks() {
        let mut slots = CallbackSlots {
            frame: None,
            device_lost: Some(Box::new(noop_lost())),
        };
        let dropped = std::mem::take(&mut slots);
        assert!(dropped.is_registered());
        assert!(!slots.is_registered());
        let (_, frame_user, lost_cb, lost_user) = slots.registration();
        assert!(frame_user.is_null() && lost_cb.is_none() && lost_user.is_null());
    }

    #[test]
    fn trampoline_ignores_null_user_data() {
        let mut frame = [0u8; 4];
        unsafe {
            frame_ready_trampoline(ptr::null_mut(), frame.as_mut_ptr(), 1, ptr::null_mut());
        }
    }
}

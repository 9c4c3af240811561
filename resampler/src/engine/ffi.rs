//! FFI bindings to libsoxr.

use std::os::raw::{c_char, c_double, c_uint, c_ulong, c_void};

/// Opaque soxr handle type.
pub enum SoxrHandle {}

/// Opaque error type (const char*). Null means success.
pub type SoxrError = *const c_char;

/// Interleaved float64, the only datatype the engine exchanges with soxr.
pub const SOXR_FLOAT64_I: c_uint = 1;

/// I/O specification structure.
#[repr(C)]
pub struct SoxrIoSpec {
    pub itype: c_uint,
    pub otype: c_uint,
    pub scale: c_double,
    pub e: *mut c_void,
    pub flags: c_ulong,
}

/// Quality specification structure.
#[repr(C)]
pub struct SoxrQualitySpec {
    pub precision: c_double,
    pub phase_response: c_double,
    pub passband_end: c_double,
    pub stopband_begin: c_double,
    pub e: *mut c_void,
    pub flags: c_ulong,
}

/// Runtime specification structure.
#[repr(C)]
pub struct SoxrRuntimeSpec {
    pub log2_min_dft_size: c_uint,
    pub log2_large_dft_size: c_uint,
    pub coef_size_kbytes: c_uint,
    pub num_threads: c_uint,
    pub e: *mut c_void,
    pub flags: c_ulong,
}

unsafe extern "C" {
    pub fn soxr_io_spec(itype: c_uint, otype: c_uint) -> SoxrIoSpec;

    pub fn soxr_quality_spec(recipe: c_ulong, flags: c_ulong) -> SoxrQualitySpec;

    pub fn soxr_runtime_spec(num_threads: c_uint) -> SoxrRuntimeSpec;

    /// Creates a new soxr resampler.
    pub fn soxr_create(
        input_rate: c_double,
        output_rate: c_double,
        num_channels: c_uint,
        error: *mut SoxrError,
        io_spec: *const SoxrIoSpec,
        quality_spec: *const SoxrQualitySpec,
        runtime_spec: *const SoxrRuntimeSpec,
    ) -> *mut SoxrHandle;

    /// Processes samples. A null `input` signals end of input.
    pub fn soxr_process(
        handle: *mut SoxrHandle,
        input: *const c_void,
        input_len: usize,
        input_done: *mut usize,
        output: *mut c_void,
        output_len: usize,
        output_done: *mut usize,
    ) -> SoxrError;

    /// Output frames currently held back.
    pub fn soxr_delay(handle: *mut SoxrHandle) -> c_double;

    /// Clears internal state, keeping the configuration.
    pub fn soxr_clear(handle: *mut SoxrHandle) -> SoxrError;

    /// Deletes the resampler and frees resources.
    pub fn soxr_delete(handle: *mut SoxrHandle);
}

/// Safe wrapper to get error message.
pub fn error_string(err: SoxrError) -> Option<String> {
    if err.is_null() {
        None
    } else {
        unsafe {
            let c_str = std::ffi::CStr::from_ptr(err);
            Some(c_str.to_string_lossy().into_owned())
        }
    }
}

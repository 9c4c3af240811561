//! Native libsoxr engine.

use std::ptr;

use tracing::debug;

use super::ffi::{self, SOXR_FLOAT64_I, SoxrHandle};
use super::{Engine, EngineResult};
use crate::config::ConverterConfig;

/// Owns one soxr handle. The handle is deleted exactly once, on drop.
pub(crate) struct SoxrEngine {
    handle: *mut SoxrHandle,
    channels: usize,
}

// Safety: the handle is only reached through `&mut self`, and soxr keeps no
// thread-local state.
unsafe impl Send for SoxrEngine {}

impl Drop for SoxrEngine {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::soxr_delete(self.handle) };
            self.handle = ptr::null_mut();
        }
    }
}

impl SoxrEngine {
    pub(crate) fn new(
        input_rate: f64,
        output_rate: f64,
        channels: usize,
        config: &ConverterConfig,
    ) -> EngineResult<Self> {
        let num_channels = u32::try_from(channels)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| format!("invalid channel count {}", channels))?;
        let quality = config.quality();
        let runtime = config.runtime();
        let (recipe, flags) = quality.to_recipe();

        let handle = unsafe {
            let io_spec = ffi::soxr_io_spec(SOXR_FLOAT64_I, SOXR_FLOAT64_I);

            let mut quality_spec = ffi::soxr_quality_spec(recipe as _, flags as _);
            if let Some(pb) = quality.passband_end {
                quality_spec.passband_end = pb;
            }
            if let Some(sb) = quality.stopband_begin {
                quality_spec.stopband_begin = sb;
            }

            let mut runtime_spec = ffi::soxr_runtime_spec(runtime.num_threads);
            runtime_spec.flags = runtime.coef_interpolation.flags() as _;

            let mut error: ffi::SoxrError = ptr::null();
            let handle = ffi::soxr_create(
                input_rate,
                output_rate,
                num_channels,
                &mut error,
                &io_spec,
                &quality_spec,
                &runtime_spec,
            );
            if handle.is_null() || !error.is_null() {
                if !handle.is_null() {
                    ffi::soxr_delete(handle);
                }
                let msg = ffi::error_string(error).unwrap_or_else(|| "unknown error".to_string());
                return Err(msg);
            }
            handle
        };

        debug!(
            "soxr engine: {} -> {} Hz, channels={}, recipe={:#x}, flags={:#x}",
            input_rate, output_rate, channels, recipe, flags
        );
        Ok(Self { handle, channels })
    }

    fn check(err: ffi::SoxrError) -> EngineResult<()> {
        match ffi::error_string(err) {
            Some(msg) => Err(msg),
            None => Ok(()),
        }
    }
}

impl Engine for SoxrEngine {
    fn name(&self) -> &'static str {
        "soxr"
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn process(&mut self, input: &[f64], output: &mut [f64]) -> EngineResult<(usize, usize)> {
        let mut idone = 0usize;
        let mut odone = 0usize;
        let err = unsafe {
            ffi::soxr_process(
                self.handle,
                input.as_ptr().cast(),
                input.len() / self.channels,
                &mut idone,
                output.as_mut_ptr().cast(),
                output.len() / self.channels,
                &mut odone,
            )
        };
        Self::check(err)?;
        Ok((idone, odone))
    }

    fn drain(&mut self, output: &mut [f64]) -> EngineResult<usize> {
        let mut odone = 0usize;
        let err = unsafe {
            ffi::soxr_process(
                self.handle,
                ptr::null(),
                0,
                ptr::null_mut(),
                output.as_mut_ptr().cast(),
                output.len() / self.channels,
                &mut odone,
            )
        };
        Self::check(err)?;
        Ok(odone)
    }

    fn delay(&self) -> f64 {
        unsafe { ffi::soxr_delay(self.handle) }
    }

    fn reset(&mut self) -> EngineResult<()> {
        Self::check(unsafe { ffi::soxr_clear(self.handle) })
    }
}

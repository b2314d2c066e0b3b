use std::ptr;
use std::sync::RwLock;

use wind_sim_core::{QualityPreset, Settings, Simulation, SimulationConfig};

use crate::error::{DefaultWindSimError, WindSimErrorCode};
use crate::helpers::{require_finite, track_error, track_result};

/// The main wind simulation context.
///
/// # Thread Safety
/// The simulation is protected by an `RwLock`, so the instance can be shared
/// between a render thread reading buffers and an input thread feeding
/// strokes:
/// - **Multiple concurrent readers** (buffer copies, queries): `.read()` lock
/// - **Exclusive writer** (frame advance, input, settings): `.write()` lock
///
/// ## Host loop example
/// ```c
/// WindSimInstance* sim = NULL;
/// if (wind_sim_new(canvas_w, canvas_h, 1, &sim) != Ok) {
///     return;
/// }
///
/// // every display frame
/// wind_sim_advance_frame(sim, elapsed_seconds, NULL);
/// wind_sim_copy_particles(sim, xs, ys, prev_xs, prev_ys, capacity);
///
/// wind_sim_destroy(sim);
/// ```
pub struct WindSimInstance {
    pub(crate) sim: RwLock<Simulation>,
}

impl WindSimInstance {
    pub(crate) fn new(
        world_width: f32,
        world_height: f32,
        quality: QualityPreset,
    ) -> Result<Box<Self>, DefaultWindSimError> {
        require_finite("world_width", world_width)?;
        require_finite("world_height", world_height)?;
        let settings = Settings {
            quality,
            ..Settings::default()
        };
        let sim = Simulation::with_settings(
            world_width,
            world_height,
            SimulationConfig::default(),
            settings,
        )?;
        Ok(Box::new(Self {
            sim: RwLock::new(sim),
        }))
    }
}

/// Decode a quality code: 0 = Low, 1 = High.
pub(crate) fn quality_from_code(code: u8) -> Result<QualityPreset, DefaultWindSimError> {
    match code {
        0 => Ok(QualityPreset::Low),
        1 => Ok(QualityPreset::High),
        other => Err(DefaultWindSimError::invalid_parameter(format!(
            "Unknown quality code {other}, expected 0 (Low) or 1 (High)"
        ))),
    }
}

/// Create a new wind simulation and return it via out-parameter.
///
/// This function follows standard C error handling conventions:
/// - Returns `WindSimErrorCode::Ok` (0) on success with a valid instance in `out_instance`
/// - Returns a non-zero error code on failure with `out_instance` set to null
///
/// Parameters
/// - `world_width`, `world_height`: canvas size in pixels. Non-positive sizes are
///   clamped to one pixel; non-finite sizes are rejected.
/// - `quality`: requested quality tier, 0 = Low, 1 = High. If High cannot be
///   allocated the simulation starts at Low instead.
/// - `out_instance`: Pointer to receive the created instance. Must be non-null.
///
/// Returns
/// - `WindSimErrorCode::Ok` (0): success, `out_instance` contains valid pointer
/// - `WindSimErrorCode::NullPointer`: `out_instance` is null
/// - `WindSimErrorCode::InvalidParameter`: non-finite size or unknown quality code
/// - `WindSimErrorCode::AllocationFailed`: not even the Low tier fits in memory
///
/// Call `wind_sim_get_last_error()` for a human-readable description.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller takes ownership of the returned instance and MUST call
///   `wind_sim_destroy` exactly once.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_new(
    world_width: f32,
    world_height: f32,
    quality: u8,
    out_instance: *mut *mut WindSimInstance,
) -> WindSimErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultWindSimError::null_pointer("out_instance"));
    }

    let created = quality_from_code(quality)
        .and_then(|quality| WindSimInstance::new(world_width, world_height, quality));
    match track_result(created) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            WindSimErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroys a wind simulation previously created by `wind_sim_new`.
///
/// Behavior:
/// - If `ptr` is null, this function is a no-op.
/// - Otherwise ownership is reclaimed with `Box::from_raw` and the simulation
///   and all of its buffers are freed.
///
/// # Safety
/// - The pointer MUST have been created by `wind_sim_new`.
/// - The pointer MUST NOT have been freed already.
/// - After calling this function, the caller must not use the pointer again.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_destroy(ptr: *mut WindSimInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: `ptr` came from `Box::into_raw` in `wind_sim_new` and has not been freed
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

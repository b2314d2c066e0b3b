//! Read-only queries and buffer copy-out.
//!
//! All functions here take the simulation read lock, so a render thread can
//! copy buffers while nothing else is writing. Buffers are copied into
//! caller-owned memory; the caller sizes them from `wind_sim_get_dimensions`.

use std::slice;

use wind_sim_core::{ForceKind, QualityPreset, Simulation};

use crate::error::{DefaultWindSimError, WindSimErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_wind_sim};
use crate::instance::WindSimInstance;

/// Grid and particle sizes, needed to allocate copy-out buffers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindSimDimensions {
    /// Grid nodes per row
    pub grid_width: usize,
    /// Grid rows
    pub grid_height: usize,
    /// Particles in the arena
    pub particle_count: usize,
    /// World width in pixels
    pub world_width: f32,
    /// World height in pixels
    pub world_height: f32,
    /// Tier the buffers are built at (0 = Low, 1 = High)
    pub quality: u8,
    /// Simulated seconds since the last reset
    pub time: f32,
}

/// Coarse flow statistics for the audio layer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindSimFlowStats {
    /// Mean wind speed (px/s)
    pub mean_speed: f32,
    /// Mean absolute vorticity (1/s)
    pub mean_vorticity: f32,
    /// Nodes sampled
    pub samples: usize,
}

/// A placed force source.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindSimForceSource {
    /// Stable id, never 0
    pub id: u32,
    /// 0 = attractor, 1 = repeller, 2 = dipole
    pub kind: u8,
    /// Position in world pixels
    pub x: f32,
    pub y: f32,
    /// Unit direction (dipole axis)
    pub dir_x: f32,
    pub dir_y: f32,
    /// Acceleration scale
    pub strength: f32,
    /// Reach in world pixels
    pub radius: f32,
}

fn copy_into<T: Copy>(
    name: &str,
    src: &[T],
    dst: *mut T,
    capacity: usize,
) -> Result<(), DefaultWindSimError> {
    if dst.is_null() {
        return Err(DefaultWindSimError::null_pointer(name));
    }
    if capacity < src.len() {
        return Err(DefaultWindSimError::buffer_too_small(name, capacity, src.len()));
    }
    // SAFETY: `dst` is non-null and the caller guarantees `capacity` writable elements
    let dst = unsafe { slice::from_raw_parts_mut(dst, src.len()) };
    dst.copy_from_slice(src);
    Ok(())
}

/// Run a read-locked copy against the instance behind `ptr`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `wind_sim_new`.
unsafe fn read<F>(ptr: *const WindSimInstance, f: F) -> WindSimErrorCode
where
    F: FnOnce(&Simulation) -> Result<(), DefaultWindSimError>,
{
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_wind_sim(instance, f)?
    })
}

/// Fill `out_dims` with the current grid and particle sizes.
///
/// Sizes change after `wind_sim_resize`, `wind_sim_set_quality` and any frame
/// whose report says the quality changed; query again before copying.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_dims` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_get_dimensions(
    ptr: *const WindSimInstance,
    out_dims: *mut WindSimDimensions,
) -> WindSimErrorCode {
    if out_dims.is_null() {
        return track_error(&DefaultWindSimError::null_pointer("out_dims"));
    }
    unsafe {
        read(ptr, |sim| {
            let shape = sim.state().shape();
            let (world_width, world_height) = sim.world_size();
            *out_dims = WindSimDimensions {
                grid_width: shape.width,
                grid_height: shape.height,
                particle_count: sim.state().particles().count(),
                world_width,
                world_height,
                quality: u8::from(sim.quality() == QualityPreset::High),
                time: sim.state().time(),
            };
            Ok(())
        })
    }
}

/// Copy the velocity components into `out_u` and `out_v`, row-major, one
/// value per grid node (px/s).
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_u` and `out_v` must each point to `capacity` writable floats.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_velocity(
    ptr: *const WindSimInstance,
    out_u: *mut f32,
    out_v: *mut f32,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe {
        read(ptr, |sim| {
            let velocity = sim.state().velocity();
            copy_into("out_u", velocity.u(), out_u, capacity)?;
            copy_into("out_v", velocity.v(), out_v, capacity)
        })
    }
}

/// Copy the smoke density grid, row-major.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out` must point to `capacity` writable floats.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_smoke(
    ptr: *const WindSimInstance,
    out: *mut f32,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe { read(ptr, |sim| copy_into("out", sim.state().smoke().data(), out, capacity)) }
}

/// Copy the temperature grid, row-major. Zero unless physics is wind + temperature.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out` must point to `capacity` writable floats.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_temperature(
    ptr: *const WindSimInstance,
    out: *mut f32,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe {
        read(ptr, |sim| {
            copy_into("out", sim.state().temperature().data(), out, capacity)
        })
    }
}

/// Copy the obstacle mask, row-major; 1 = wall, 0 = fluid.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out` must point to `capacity` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_obstacles(
    ptr: *const WindSimInstance,
    out: *mut u8,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe { read(ptr, |sim| copy_into("out", sim.state().obstacles().data(), out, capacity)) }
}

/// Copy signed vorticity per node, row-major, for the heatmap overlay.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out` must point to `capacity` writable floats.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_vorticity(
    ptr: *const WindSimInstance,
    out: *mut f32,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe {
        read(ptr, |sim| {
            let velocity = sim.state().velocity();
            let shape = *velocity.shape();
            let vorticity: Vec<f32> = (0..shape.height)
                .flat_map(|iy| (0..shape.width).map(move |ix| (ix, iy)))
                .map(|(ix, iy)| velocity.vorticity_at(ix, iy))
                .collect();
            copy_into("out", &vorticity, out, capacity)
        })
    }
}

/// Copy particle positions and their previous positions (for trails).
///
/// A particle that wrapped this step has `prev == current`, so the renderer
/// never draws a streak across the canvas.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - Each output pointer must point to `capacity` writable floats.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_particles(
    ptr: *const WindSimInstance,
    out_x: *mut f32,
    out_y: *mut f32,
    out_prev_x: *mut f32,
    out_prev_y: *mut f32,
    capacity: usize,
) -> WindSimErrorCode {
    unsafe {
        read(ptr, |sim| {
            let particles = sim.state().particles();
            copy_into("out_x", particles.x(), out_x, capacity)?;
            copy_into("out_y", particles.y(), out_y, capacity)?;
            copy_into("out_prev_x", particles.prev_x(), out_prev_x, capacity)?;
            copy_into("out_prev_y", particles.prev_y(), out_prev_y, capacity)
        })
    }
}

/// Mean speed and vorticity sampled every `stride` nodes (0 is treated as 1).
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_stats` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_flow_stats(
    ptr: *const WindSimInstance,
    stride: usize,
    out_stats: *mut WindSimFlowStats,
) -> WindSimErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultWindSimError::null_pointer("out_stats"));
    }
    unsafe {
        read(ptr, |sim| {
            let stats = sim.flow_stats(stride);
            *out_stats = WindSimFlowStats {
                mean_speed: stats.mean_speed,
                mean_vorticity: stats.mean_vorticity,
                samples: stats.samples,
            };
            Ok(())
        })
    }
}

/// Copy the placed force sources, sorted by id.
///
/// `out_len` receives the number of sources. If `out` is null only the count
/// is written, so callers can size the buffer first.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_len` must be a valid, non-null pointer to writable memory.
/// - `out`, if non-null, must point to `capacity` writable elements.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_copy_force_sources(
    ptr: *const WindSimInstance,
    out: *mut WindSimForceSource,
    capacity: usize,
    out_len: *mut usize,
) -> WindSimErrorCode {
    if out_len.is_null() {
        return track_error(&DefaultWindSimError::null_pointer("out_len"));
    }
    unsafe {
        read(ptr, |sim| {
            let sources: Vec<WindSimForceSource> = sim
                .force_sources()
                .iter()
                .map(|source| WindSimForceSource {
                    id: source.id.0,
                    kind: match source.kind {
                        ForceKind::Attractor => 0,
                        ForceKind::Repeller => 1,
                        ForceKind::Dipole => 2,
                    },
                    x: source.position.x,
                    y: source.position.y,
                    dir_x: source.direction.x,
                    dir_y: source.direction.y,
                    strength: source.strength,
                    radius: source.radius,
                })
                .collect();
            *out_len = sources.len();
            if out.is_null() {
                return Ok(());
            }
            copy_into("out", &sources, out, capacity)
        })
    }
}

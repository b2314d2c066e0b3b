//! Frame advance, input and control-panel entry points.
//!
//! Every function here takes the simulation write lock. Numeric arguments
//! that are not finite are rejected with `InvalidParameter` before the
//! engine sees them; enum arguments are passed as small integer codes.

use wind_sim_core::{
    BrushMode, ForceKind, ForceSourceId, Mode, Modifiers, OverlayMode, PhysicsMode, StrokeEvent,
    Theme, Tool, Vec2,
};

use crate::error::{DefaultWindSimError, WindSimErrorCode};
use crate::helpers::{
    handle_ffi_result_error, instance_from_ptr, require_finite, with_wind_sim_mut,
};
use crate::instance::{quality_from_code, WindSimInstance};

/// Modifier bit: Shift held (erase obstacles, place repellers).
pub const WIND_SIM_MOD_SHIFT: u32 = 1;
/// Modifier bit: Alt held (inject cold, place dipoles).
pub const WIND_SIM_MOD_ALT: u32 = 1 << 1;
/// Modifier bit: touch held in place (inject cold).
pub const WIND_SIM_MOD_LONG_PRESS: u32 = 1 << 2;

/// What one call to `wind_sim_advance_frame` did.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindSimFrameReport {
    /// Fixed steps executed this frame
    pub steps: u32,
    /// Whether the governor switched quality tiers this frame
    pub quality_changed: bool,
    /// Tier the buffers are built at after this frame (0 = Low, 1 = High)
    pub quality: u8,
}

fn modifiers_from_bits(bits: u32) -> Modifiers {
    Modifiers {
        shift: bits & WIND_SIM_MOD_SHIFT != 0,
        alt: bits & WIND_SIM_MOD_ALT != 0,
        long_press: bits & WIND_SIM_MOD_LONG_PRESS != 0,
    }
}

fn stroke_event(
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    modifiers: u32,
) -> Result<StrokeEvent, DefaultWindSimError> {
    Ok(StrokeEvent::new(
        require_finite("x", x)?,
        require_finite("y", y)?,
        require_finite("vx", vx)?,
        require_finite("vy", vy)?,
    )
    .with_modifiers(modifiers_from_bits(modifiers)))
}

fn unknown_code(name: &str, code: u8) -> DefaultWindSimError {
    DefaultWindSimError::invalid_parameter(format!("Unknown {name} code {code}"))
}

/// Run a write-locked body against the instance behind `ptr`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `wind_sim_new`.
unsafe fn update<F>(ptr: *const WindSimInstance, f: F) -> WindSimErrorCode
where
    F: FnOnce(&mut wind_sim_core::Simulation) -> Result<(), DefaultWindSimError>,
{
    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_wind_sim_mut(instance, f)?
    })
}

/// Advance the simulation by one display frame.
///
/// `elapsed_seconds` is the wall time since the previous frame. It is clamped
/// before it feeds the fixed-step accumulator, so a long stall never runs a
/// burst of catch-up steps. The governor may switch quality tiers at the end
/// of the frame; `out_report` (optional) says whether it did.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_report` must be null or a valid pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_advance_frame(
    ptr: *const WindSimInstance,
    elapsed_seconds: f32,
    out_report: *mut WindSimFrameReport,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            let report = sim.advance_frame(require_finite("elapsed_seconds", elapsed_seconds)?);
            if !out_report.is_null() {
                *out_report = WindSimFrameReport {
                    steps: report.steps,
                    quality_changed: report.quality_change.is_some(),
                    quality: u8::from(sim.quality() == wind_sim_core::QualityPreset::High),
                };
            }
            Ok(())
        })
    }
}

/// Run exactly one fixed step, bypassing the frame clock.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_step(ptr: *const WindSimInstance) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.step();
            Ok(())
        })
    }
}

/// Follow a canvas resize. Every grid is rebuilt for the new size; particles
/// keep their positions, wrapped into the new bounds.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_resize(
    ptr: *const WindSimInstance,
    world_width: f32,
    world_height: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.resize(
                require_finite("world_width", world_width)?,
                require_finite("world_height", world_height)?,
            )?;
            Ok(())
        })
    }
}

/// Zero every field and reseed particles. Obstacles and force sources stay.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_reset(ptr: *const WindSimInstance) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.reset();
            Ok(())
        })
    }
}

/// Remove every obstacle.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_clear_obstacles(ptr: *const WindSimInstance) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.clear_obstacles();
            Ok(())
        })
    }
}

// ============================================================================
// Input
// ============================================================================

/// Begin a stroke at world position `(x, y)` with pointer velocity
/// `(vx, vy)` in px/ms. `modifiers` is a mask of `WIND_SIM_MOD_*` bits.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_stroke_start(
    ptr: *const WindSimInstance,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    modifiers: u32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.stroke_start(&stroke_event(x, y, vx, vy, modifiers)?);
            Ok(())
        })
    }
}

/// Continue the current stroke. Arguments as for `wind_sim_stroke_start`.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_stroke_move(
    ptr: *const WindSimInstance,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    modifiers: u32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.stroke_move(&stroke_event(x, y, vx, vy, modifiers)?);
            Ok(())
        })
    }
}

/// Finish the current stroke.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_stroke_end(ptr: *const WindSimInstance) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.stroke_end();
            Ok(())
        })
    }
}

/// A quick tap: a doubled impulse that injects for a short pulse.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_tap(
    ptr: *const WindSimInstance,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    modifiers: u32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.tap(&stroke_event(x, y, vx, vy, modifiers)?);
            Ok(())
        })
    }
}

/// Touch held in place; heat injected by the current stroke turns cold.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_long_press(
    ptr: *const WindSimInstance,
    x: f32,
    y: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.long_press(&stroke_event(x, y, 0.0, 0.0, WIND_SIM_MOD_LONG_PRESS)?);
            Ok(())
        })
    }
}

/// Pinch distance change in pixels; grows or shrinks the brush.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_pinch(
    ptr: *const WindSimInstance,
    delta: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.pinch(require_finite("delta", delta)?);
            Ok(())
        })
    }
}

/// Mouse wheel delta; positive scrolls down and shrinks the brush.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_wheel(
    ptr: *const WindSimInstance,
    delta: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.wheel(require_finite("delta", delta)?);
            Ok(())
        })
    }
}

/// Multi-finger tap: place a force source at `(x, y)` when force fields are on.
///
/// `out_id` (optional) receives the new source id, or 0 when nothing was
/// placed. Ids start at 1.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_id` must be null or a valid pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_multi_finger_tap(
    ptr: *const WindSimInstance,
    x: f32,
    y: f32,
    modifiers: u32,
    out_id: *mut u32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            let placed = sim.multi_finger_tap(&stroke_event(x, y, 0.0, 0.0, modifiers)?);
            if !out_id.is_null() {
                *out_id = placed.map_or(0, |id| id.0);
            }
            Ok(())
        })
    }
}

// ============================================================================
// Force sources
// ============================================================================

/// Place a force source directly.
///
/// `kind`: 0 = attractor, 1 = repeller, 2 = dipole (pointing along
/// `(dir_x, dir_y)`). `out_id` (optional) receives the new id.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_id` must be null or a valid pointer to writable memory.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn wind_sim_add_force_source(
    ptr: *const WindSimInstance,
    kind: u8,
    x: f32,
    y: f32,
    dir_x: f32,
    dir_y: f32,
    strength: f32,
    radius: f32,
    out_id: *mut u32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            let kind = match kind {
                0 => ForceKind::Attractor,
                1 => ForceKind::Repeller,
                2 => ForceKind::Dipole,
                other => return Err(unknown_code("force kind", other)),
            };
            let id = sim.add_force_source(
                kind,
                Vec2::new(require_finite("x", x)?, require_finite("y", y)?),
                Vec2::new(require_finite("dir_x", dir_x)?, require_finite("dir_y", dir_y)?),
                require_finite("strength", strength)?,
                require_finite("radius", radius)?,
            );
            if !out_id.is_null() {
                *out_id = id.0;
            }
            Ok(())
        })
    }
}

/// Remove a force source. `out_removed` (optional) says whether it existed.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `wind_sim_new` or null.
/// - `out_removed` must be null or a valid pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_remove_force_source(
    ptr: *const WindSimInstance,
    id: u32,
    out_removed: *mut bool,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            let removed = sim.remove_force_source(ForceSourceId(id));
            if !out_removed.is_null() {
                *out_removed = removed;
            }
            Ok(())
        })
    }
}

/// Remove every force source.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_clear_force_sources(
    ptr: *const WindSimInstance,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.clear_force_sources();
            Ok(())
        })
    }
}

// ============================================================================
// Control panel
// ============================================================================

/// Display mode: 0 = particles, 1 = smoke.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_mode(
    ptr: *const WindSimInstance,
    mode: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_mode(match mode {
                0 => Mode::Particles,
                1 => Mode::Smoke,
                other => return Err(unknown_code("mode", other)),
            });
            Ok(())
        })
    }
}

/// Brush: 0 = push, 1 = vortex.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_brush_mode(
    ptr: *const WindSimInstance,
    brush: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_brush_mode(match brush {
                0 => BrushMode::Push,
                1 => BrushMode::Vortex,
                other => return Err(unknown_code("brush", other)),
            });
            Ok(())
        })
    }
}

/// Tool: 0 = wind, 1 = obstacles.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_tool(
    ptr: *const WindSimInstance,
    tool: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_tool(match tool {
                0 => Tool::Wind,
                1 => Tool::Obstacles,
                other => return Err(unknown_code("tool", other)),
            });
            Ok(())
        })
    }
}

/// Manually choose a quality tier (0 = Low, 1 = High), overriding the governor.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_quality(
    ptr: *const WindSimInstance,
    quality: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_quality(quality_from_code(quality)?)?;
            Ok(())
        })
    }
}

/// Physics: 0 = wind, 1 = wind + temperature.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_physics(
    ptr: *const WindSimInstance,
    physics: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_physics(match physics {
                0 => PhysicsMode::Wind,
                1 => PhysicsMode::WindTemperature,
                other => return Err(unknown_code("physics", other)),
            });
            Ok(())
        })
    }
}

/// Theme: 0 = classic, 1 = ember, 2 = snow, 3 = neon.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_theme(
    ptr: *const WindSimInstance,
    theme: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            let theme = Theme::ALL
                .get(usize::from(theme))
                .copied()
                .ok_or_else(|| unknown_code("theme", theme))?;
            sim.set_theme(theme);
            Ok(())
        })
    }
}

/// Overlay: 0 = none, 1 = vectors, 2 = streamlines, 3 = vorticity, 4 = temperature.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_overlay(
    ptr: *const WindSimInstance,
    overlay: u8,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_overlay(match overlay {
                0 => OverlayMode::None,
                1 => OverlayMode::Vectors,
                2 => OverlayMode::Streamlines,
                3 => OverlayMode::Vorticity,
                4 => OverlayMode::Temperature,
                other => return Err(unknown_code("overlay", other)),
            });
            Ok(())
        })
    }
}

/// Buoyancy strength, clamped to `[0, 2]`.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_buoyancy_strength(
    ptr: *const WindSimInstance,
    strength: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_buoyancy_strength(require_finite("strength", strength)?);
            Ok(())
        })
    }
}

/// Trail strength, clamped to `[0, 1]`.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_trail_strength(
    ptr: *const WindSimInstance,
    strength: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_trail_strength(require_finite("strength", strength)?);
            Ok(())
        })
    }
}

/// Sound volume, clamped to `[0, 1]`.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_volume(
    ptr: *const WindSimInstance,
    volume: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_volume(require_finite("volume", volume)?);
            Ok(())
        })
    }
}

/// Brush radius in pixels, clamped to `[12, 160]`.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_brush_radius(
    ptr: *const WindSimInstance,
    radius: f32,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_brush_radius(require_finite("radius", radius)?);
            Ok(())
        })
    }
}

/// Whether the renderer should tint obstacle cells.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_show_obstacles(
    ptr: *const WindSimInstance,
    show: bool,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_show_obstacles(show);
            Ok(())
        })
    }
}

/// Stickier wind: less damping and less smoothing.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_wind_memory(
    ptr: *const WindSimInstance,
    enabled: bool,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_wind_memory(enabled);
            Ok(())
        })
    }
}

/// Whether placed force sources act on the wind.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_force_fields(
    ptr: *const WindSimInstance,
    enabled: bool,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_force_fields(enabled);
            Ok(())
        })
    }
}

/// Whether the host should play flow sound.
///
/// # Safety
/// `ptr` must be a valid pointer returned by `wind_sim_new` or null.
#[no_mangle]
pub unsafe extern "C" fn wind_sim_set_sound_enabled(
    ptr: *const WindSimInstance,
    enabled: bool,
) -> WindSimErrorCode {
    unsafe {
        update(ptr, |sim| {
            sim.set_sound_enabled(enabled);
            Ok(())
        })
    }
}

//! C ABI over `wind-sim-core`.
//!
//! A host (browser shell, game engine, native app) owns the window, decodes
//! gestures and draws. It creates one instance per canvas with
//! `wind_sim_new`, feeds normalised input events, calls
//! `wind_sim_advance_frame` once per display frame and copies the buffers it
//! renders from. Every fallible call returns a `WindSimErrorCode`; details are
//! available from `wind_sim_get_last_error` on the same thread.
//!
//! The C header `WindSimFFI.h` is generated by the build script.

mod error;
mod helpers;
mod instance;
mod queries;
mod simulation;

pub use error::{wind_sim_get_last_error, wind_sim_get_last_error_code, WindSimErrorCode};
pub use instance::{wind_sim_destroy, wind_sim_new, WindSimInstance};
pub use queries::*;
pub use simulation::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::ptr;

    fn create(quality: u8) -> *mut WindSimInstance {
        let mut sim = ptr::null_mut();
        let code = unsafe { wind_sim_new(800.0, 600.0, quality, &mut sim) };
        assert_eq!(code, WindSimErrorCode::Ok);
        assert!(!sim.is_null());
        sim
    }

    fn dimensions(sim: *const WindSimInstance) -> WindSimDimensions {
        let mut dims = WindSimDimensions::default();
        let code = unsafe { wind_sim_get_dimensions(sim, &mut dims) };
        assert_eq!(code, WindSimErrorCode::Ok);
        dims
    }

    #[test]
    fn test_new_and_destroy() {
        let sim = create(1);
        let dims = dimensions(sim);
        assert_eq!((dims.grid_width, dims.grid_height), (68, 51));
        assert_eq!(dims.quality, 1);
        assert!(dims.particle_count > 0);
        unsafe { wind_sim_destroy(sim) };
        // Null is a no-op
        unsafe { wind_sim_destroy(ptr::null_mut()) };
    }

    #[test]
    fn test_new_rejects_bad_arguments() {
        let mut sim = ptr::null_mut();
        let code = unsafe { wind_sim_new(800.0, 600.0, 7, &mut sim) };
        assert_eq!(code, WindSimErrorCode::InvalidParameter);
        assert!(sim.is_null());
        assert_eq!(wind_sim_get_last_error_code(), WindSimErrorCode::InvalidParameter);
        let message = unsafe { CStr::from_ptr(wind_sim_get_last_error()) };
        assert!(message.to_string_lossy().contains("quality"));

        let code = unsafe { wind_sim_new(f32::NAN, 600.0, 0, &mut sim) };
        assert_eq!(code, WindSimErrorCode::InvalidParameter);

        let code = unsafe { wind_sim_new(800.0, 600.0, 0, ptr::null_mut()) };
        assert_eq!(code, WindSimErrorCode::NullPointer);
    }

    #[test]
    fn test_new_clamps_huge_world() {
        let mut sim = ptr::null_mut();
        let code = unsafe { wind_sim_new(1.0e30, 600.0, 0, &mut sim) };
        assert_eq!(code, WindSimErrorCode::Ok);
        let dims = dimensions(sim);
        assert_eq!(dims.grid_width, wind_sim_core::solver::MAX_GRID_DIM);
        assert_eq!(dims.world_width, 1.0e30);
        unsafe {
            assert_eq!(wind_sim_step(sim), WindSimErrorCode::Ok);
            assert_eq!(wind_sim_resize(sim, f32::MAX, 1.0e30), WindSimErrorCode::Ok);
            wind_sim_destroy(sim);
        }
    }

    #[test]
    fn test_null_instance_is_reported() {
        let code = unsafe { wind_sim_advance_frame(ptr::null(), 0.016, ptr::null_mut()) };
        assert_eq!(code, WindSimErrorCode::NullPointer);
        assert!(!wind_sim_get_last_error().is_null());
    }

    #[test]
    fn test_success_clears_last_error() {
        let sim = create(0);
        let code = unsafe { wind_sim_set_mode(sim, 9) };
        assert_eq!(code, WindSimErrorCode::InvalidParameter);
        let code = unsafe { wind_sim_set_mode(sim, 1) };
        assert_eq!(code, WindSimErrorCode::Ok);
        assert_eq!(wind_sim_get_last_error_code(), WindSimErrorCode::Ok);
        assert!(wind_sim_get_last_error().is_null());
        unsafe { wind_sim_destroy(sim) };
    }

    #[test]
    fn test_stroke_then_copy_velocity() {
        let sim = create(0);
        let dims = dimensions(sim);
        let cells = dims.grid_width * dims.grid_height;

        unsafe {
            assert_eq!(wind_sim_stroke_start(sim, 400.0, 300.0, 0.4, 0.0, 0), WindSimErrorCode::Ok);
            let mut report = WindSimFrameReport::default();
            assert_eq!(wind_sim_advance_frame(sim, 0.06, &mut report), WindSimErrorCode::Ok);
            assert_eq!(report.steps, 3);
            assert_eq!(wind_sim_stroke_end(sim), WindSimErrorCode::Ok);
        }

        let mut u = vec![0.0_f32; cells];
        let mut v = vec![0.0_f32; cells];
        let code = unsafe { wind_sim_copy_velocity(sim, u.as_mut_ptr(), v.as_mut_ptr(), cells) };
        assert_eq!(code, WindSimErrorCode::Ok);
        assert!(u.iter().any(|&value| value > 0.0));

        let mut stats = WindSimFlowStats::default();
        let code = unsafe { wind_sim_flow_stats(sim, 4, &mut stats) };
        assert_eq!(code, WindSimErrorCode::Ok);
        assert!(stats.mean_speed > 0.0);
        unsafe { wind_sim_destroy(sim) };
    }

    #[test]
    fn test_copy_rejects_short_buffer() {
        let sim = create(0);
        let mut smoke = vec![0.0_f32; 4];
        let code = unsafe { wind_sim_copy_smoke(sim, smoke.as_mut_ptr(), smoke.len()) };
        assert_eq!(code, WindSimErrorCode::BufferTooSmall);
        let code = unsafe { wind_sim_copy_smoke(sim, ptr::null_mut(), 1_000_000) };
        assert_eq!(code, WindSimErrorCode::NullPointer);
        unsafe { wind_sim_destroy(sim) };
    }

    #[test]
    fn test_copy_particles() {
        let sim = create(0);
        let count = dimensions(sim).particle_count;
        let mut x = vec![-1.0_f32; count];
        let mut y = vec![-1.0_f32; count];
        let mut prev_x = vec![-1.0_f32; count];
        let mut prev_y = vec![-1.0_f32; count];
        let code = unsafe {
            wind_sim_copy_particles(
                sim,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                prev_x.as_mut_ptr(),
                prev_y.as_mut_ptr(),
                count,
            )
        };
        assert_eq!(code, WindSimErrorCode::Ok);
        assert!(x.iter().all(|&px| (0.0..800.0).contains(&px)));
        assert!(y.iter().all(|&py| (0.0..600.0).contains(&py)));
        unsafe { wind_sim_destroy(sim) };
    }

    #[test]
    fn test_force_sources_round_trip() {
        let sim = create(0);
        let mut id = 0;
        unsafe {
            let code = wind_sim_add_force_source(
                sim, 2, 100.0, 100.0, 1.0, 0.0, 5000.0, 80.0, &mut id,
            );
            assert_eq!(code, WindSimErrorCode::Ok);
            assert_ne!(id, 0);

            let mut len = 0;
            assert_eq!(
                wind_sim_copy_force_sources(sim, ptr::null_mut(), 0, &mut len),
                WindSimErrorCode::Ok
            );
            assert_eq!(len, 1);
            let mut sources = vec![WindSimForceSource::default(); len];
            assert_eq!(
                wind_sim_copy_force_sources(sim, sources.as_mut_ptr(), sources.len(), &mut len),
                WindSimErrorCode::Ok
            );
            assert_eq!(sources[0].id, id);
            assert_eq!(sources[0].kind, 2);

            let mut removed = false;
            wind_sim_remove_force_source(sim, id, &mut removed);
            assert!(removed);
            wind_sim_remove_force_source(sim, id, &mut removed);
            assert!(!removed);

            assert_eq!(
                wind_sim_add_force_source(sim, 5, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, ptr::null_mut()),
                WindSimErrorCode::InvalidParameter
            );
            wind_sim_destroy(sim);
        }
    }

    #[test]
    fn test_resize_changes_dimensions() {
        let sim = create(0);
        let before = dimensions(sim);
        let code = unsafe { wind_sim_resize(sim, 400.0, 300.0) };
        assert_eq!(code, WindSimErrorCode::Ok);
        let after = dimensions(sim);
        assert!(after.grid_width < before.grid_width);
        assert_eq!(after.world_width, 400.0);
        unsafe { wind_sim_destroy(sim) };
    }
}

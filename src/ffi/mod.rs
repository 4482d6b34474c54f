use std::ptr;
use crate::display::{compass_frame, FRAME_SIZE};
use crate::search::{Decision, SearchPlanner, Turn};
use crate::signal::{angle_for_rssi, RssiSmoother, SignalRange};

pub const PF_FIRST_FIX: i32 = 0;
pub const PF_STRONGER: i32 = 1;
pub const PF_WEAKER: i32 = 2;
pub const PF_UNCHANGED: i32 = 3;
pub const PF_NOT_FOUND: i32 = 4;

pub struct PfSmoother{
    inner: RssiSmoother,
}

pub struct PfPlanner{
    inner: SearchPlanner,
}

#[no_mangle]
pub extern "C" fn pf_angle_for_rssi(rssi: f32) -> f32{
    angle_for_rssi(rssi)
}

#[no_mangle]
pub extern "C" fn pf_smoother_new(window: usize) -> *mut PfSmoother{
    if window == 0{
        return ptr::null_mut();
    }
    Box::into_raw(Box::new(PfSmoother{ inner: RssiSmoother::new(window) }))
}

#[no_mangle]
pub unsafe extern "C" fn pf_smoother_free(smoother: *mut PfSmoother){
    if !smoother.is_null(){
        unsafe{ drop(Box::from_raw(smoother)); }
    }
}

/// Returns the new average, NaN on a null handle
#[no_mangle]
pub unsafe extern "C" fn pf_smoother_push(smoother: *mut PfSmoother, rssi: f32) -> f32{
    if smoother.is_null(){
        return f32::NAN;
    }
    unsafe{
        let s = &mut *smoother;
        s.inner.push(rssi)
    }
}

#[no_mangle]
pub extern "C" fn pf_planner_new(window: usize, min_rssi: f32, max_rssi: f32) -> *mut PfPlanner{
    if window == 0 || max_rssi <= min_rssi{
        return ptr::null_mut();
    }
    let planner = SearchPlanner::new(window, SignalRange{ min_rssi, max_rssi });
    Box::into_raw(Box::new(PfPlanner{ inner: planner }))
}

#[no_mangle]
pub unsafe extern "C" fn pf_planner_free(planner: *mut PfPlanner){
    if !planner.is_null(){
        unsafe{ drop(Box::from_raw(planner)); }
    }
}

/// Classify a scan result (`found == false` means the phone was not seen).
/// Writes the smoothed RSSI to `out_smoothed` when there is one. Returns a PF_* code, -1 on a null handle.
#[no_mangle]
pub unsafe extern "C" fn pf_planner_decide(
    planner: *mut PfPlanner,
    found: bool,
    rssi: f32,
    out_smoothed: *mut f32,
) -> i32{
    if planner.is_null(){
        return -1;
    }

    unsafe{
        let p = &mut *planner;
        let decision = p.inner.decide(if found{ Some(rssi) }else{ None });

        if let Some(smoothed) = decision.smoothed(){
            if !out_smoothed.is_null(){
                *out_smoothed = smoothed;
            }
        }

        match decision{
            Decision::FirstFix{ .. } => PF_FIRST_FIX,
            Decision::Stronger{ .. } => PF_STRONGER,
            Decision::Weaker{ .. } => PF_WEAKER,
            Decision::Unchanged{ .. } => PF_UNCHANGED,
            Decision::NotFound => PF_NOT_FOUND,
        }
    }
}

/// Record a 90 degree turn, returns the new heading
#[no_mangle]
pub unsafe extern "C" fn pf_planner_turn(planner: *mut PfPlanner, right: bool) -> u16{
    if planner.is_null(){
        return 0;
    }
    unsafe{
        let p = &mut *planner;
        let turn = if right{ Turn::Right }else{ Turn::Left };
        p.inner.apply_turn(turn).degrees()
    }
}

#[no_mangle]
pub unsafe extern "C" fn pf_planner_heading(planner: *const PfPlanner) -> u16{
    if planner.is_null(){
        return 0;
    }
    unsafe{
        let p = &*planner;
        p.inner.heading().degrees()
    }
}

/// Render the compass into `out_frame` (SSD1306 page layout, FRAME_SIZE bytes)
#[no_mangle]
pub unsafe extern "C" fn pf_render_compass(
    heading_deg: f32,
    has_rssi: bool,
    rssi: f32,
    out_frame: *mut u8,
    max_len: usize,
) -> i32{
    if out_frame.is_null(){
        return -1;
    }
    if max_len < FRAME_SIZE{
        return -2;
    }

    let frame = compass_frame(heading_deg, if has_rssi{ Some(rssi) }else{ None });
    unsafe{
        ptr::copy_nonoverlapping(frame.as_bytes().as_ptr(), out_frame, FRAME_SIZE);
    }
    FRAME_SIZE as i32
}

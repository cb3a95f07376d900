//! Hardware timers using ESP-IDF's esp_timer API.
//!
//! - a periodic sensor tick that pushes [`Event::SensorTick`];
//! - a one-shot retry countdown ([`RetryTimer`]) that pushes
//!   [`Event::RetryTimerExpired`].
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they can call `push_event()` directly.

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};
use crate::app::ports::RetryTimerPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
static mut SENSOR_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: SENSOR_TIMER is written once in `start_sensor_tick()` before any
/// timer callbacks fire.  Only called from the single main task.
#[cfg(target_os = "espidf")]
unsafe fn sensor_timer() -> esp_timer_handle_t {
    unsafe { SENSOR_TIMER }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn sensor_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::SensorTick);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn retry_expired_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::RetryTimerExpired);
}

/// Start the periodic sensor tick.
#[cfg(target_os = "espidf")]
pub fn start_sensor_tick(period_ms: u32) {
    // SAFETY: SENSOR_TIMER is written here once at boot from the main
    // task before the callback can fire.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(sensor_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"sensor".as_ptr(),
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut SENSOR_TIMER);
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: sensor timer create failed (rc={}), no ticks", ret);
            return;
        }
        let ret = esp_timer_start_periodic(SENSOR_TIMER, u64::from(period_ms) * 1_000);
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: sensor timer start failed (rc={})", ret);
            return;
        }
    }
    info!("hw_timer: sensor tick every {} ms", period_ms);
}

#[cfg(not(target_os = "espidf"))]
pub fn start_sensor_tick(period_ms: u32) {
    log::info!("hw_timer(sim): sensor tick ({period_ms} ms) not started");
}

// ── Retry countdown ───────────────────────────────────────────

/// One-shot send-retry backoff timer.
pub struct RetryTimer {
    #[cfg(target_os = "espidf")]
    handle: esp_timer_handle_t,
    #[cfg(not(target_os = "espidf"))]
    armed_ms: Option<u32>,
}

#[cfg(target_os = "espidf")]
impl RetryTimer {
    pub fn new() -> Self {
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        let args = esp_timer_create_args_t {
            callback: Some(retry_expired_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"retry".as_ptr(),
            skip_unhandled_events: false,
        };
        // SAFETY: `handle` outlives the call; created once from the main task.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK as i32 {
            log::error!("hw_timer: retry timer create failed (rc={}), retries disabled", ret);
            handle = core::ptr::null_mut();
        }
        Self { handle }
    }
}

#[cfg(target_os = "espidf")]
impl RetryTimerPort for RetryTimer {
    fn arm(&mut self, duration_ms: u32) {
        if self.handle.is_null() {
            return;
        }
        // SAFETY: handle created in new(); stop on an idle timer only
        // returns ESP_ERR_INVALID_STATE.
        unsafe {
            esp_timer_stop(self.handle);
            let ret = esp_timer_start_once(self.handle, u64::from(duration_ms) * 1_000);
            if ret != ESP_OK as i32 {
                log::warn!("hw_timer: retry timer start failed (rc={})", ret);
            }
        }
    }

    fn disarm(&mut self) {
        if !self.handle.is_null() {
            // SAFETY: see arm().
            unsafe {
                esp_timer_stop(self.handle);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl RetryTimer {
    pub fn new() -> Self {
        Self { armed_ms: None }
    }

    /// Countdown currently running, if any (host only).
    pub fn armed_ms(&self) -> Option<u32> {
        self.armed_ms
    }
}

#[cfg(not(target_os = "espidf"))]
impl RetryTimerPort for RetryTimer {
    fn arm(&mut self, duration_ms: u32) {
        log::debug!("hw_timer(sim): retry armed for {duration_ms} ms");
        self.armed_ms = Some(duration_ms);
    }

    fn disarm(&mut self) {
        self.armed_ms = None;
    }
}

impl Default for RetryTimer {
    fn default() -> Self {
        Self::new()
    }
}

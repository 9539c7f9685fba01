//! System power-management hooks.
//!
//! Mirrors the platform's PM-ops table: the runtime calls `suspend` on
//! the way down and `resume` on wake.  Implementations must not block
//! on in-flight work in `suspend`.

use crate::app::ports::{GpioPort, PwmPort};
use crate::app::service::HapticDevice;

pub trait PowerManaged {
    fn suspend(&self);
    fn resume(&self);
}

impl<P: PwmPort, G: GpioPort> PowerManaged for HapticDevice<P, G> {
    fn suspend(&self) {
        HapticDevice::suspend(self);
    }

    fn resume(&self) {
        HapticDevice::resume(self);
    }
}

/// Suspend every registered device, in registration order.
pub fn suspend_all(devices: &[&dyn PowerManaged]) {
    for dev in devices {
        dev.suspend();
    }
}

/// Resume every registered device, in reverse registration order.
pub fn resume_all(devices: &[&dyn PowerManaged]) {
    for dev in devices.iter().rev() {
        dev.resume();
    }
}

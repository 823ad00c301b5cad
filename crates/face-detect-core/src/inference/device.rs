//! Device selection for inference.

use candle_core::Device;
use tracing::info;

/// Which device the detector should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DevicePreference {
    /// Use a GPU when one was compiled in and is available, else CPU.
    #[default]
    Auto,
    /// Always use the CPU.
    Cpu,
}

/// Returns the device to run inference on.
///
/// With [`DevicePreference::Auto`], tries Metal (macOS) or CUDA when the
/// matching feature is enabled, falling back to CPU.
#[must_use]
pub fn select_device(preference: DevicePreference) -> Device {
    if preference == DevicePreference::Cpu {
        info!("Using CPU for inference (forced)");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device for inference");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device for inference");
            return device;
        }
    }

    info!("Using CPU for inference");
    Device::Cpu
}

//! Instance creation against the system Vulkan loader.
//!
//! Machines without a loader or driver skip these tests.

use std::ffi::c_char;

use renderer_rhi::RhiError;
use renderer_rhi::instance::Instance;
use renderer_rhi::vk;

/// Creates an instance, or returns `None` when this machine cannot run Vulkan.
fn try_instance(extensions: &[*const c_char]) -> Option<Result<Instance, RhiError>> {
    match Instance::new(false, extensions) {
        Err(RhiError::LoadingError(e)) => {
            eprintln!("Skipping: Vulkan loader unavailable ({})", e);
            None
        }
        Err(RhiError::VulkanError(
            vk::Result::ERROR_INCOMPATIBLE_DRIVER | vk::Result::ERROR_INITIALIZATION_FAILED,
        )) => {
            eprintln!("Skipping: no usable Vulkan driver");
            None
        }
        result => Some(result),
    }
}

#[test]
fn test_instance_without_validation() {
    let Some(result) = try_instance(&[]) else {
        return;
    };
    let instance = result.expect("Instance creation failed");
    assert!(!instance.has_validation());

    let devices = unsafe { instance.handle().enumerate_physical_devices() };
    assert!(devices.is_ok());
}

#[test]
fn test_unknown_extension_is_rejected() {
    let bogus = c"VK_NOT_A_REAL_extension";
    let Some(result) = try_instance(&[bogus.as_ptr()]) else {
        return;
    };
    match result {
        Err(RhiError::ExtensionNotSupported(message)) => {
            assert!(message.contains("VK_NOT_A_REAL_extension"));
        }
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Instance accepted an unknown extension"),
    }
}

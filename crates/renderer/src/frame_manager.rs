//! Frames in flight and the acquire/submit/present cycle.
//!
//! Each of the [`MAX_FRAMES_IN_FLIGHT`] slots owns a command buffer, an
//! `image_available` semaphore, a `render_finished` semaphore and an
//! `in_flight` fence created signaled. One frame runs through:
//!
//! ```text
//! 1. wait on in_flight        (CPU waits for the slot's previous submission)
//! 2. acquire image            (signals image_available)
//! 3. reset in_flight, record  (only once an image was acquired)
//! 4. submit                   (waits image_available at COLOR_ATTACHMENT_OUTPUT,
//!                              signals render_finished and in_flight)
//! 5. present                  (waits render_finished)
//! 6. advance to the next slot
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use renderer_rhi::device::Device;
//! use renderer_rhi::command::CommandPool;
//! use renderer_rhi::swapchain::Swapchain;
//! use renderer_renderer::frame_manager::FrameManager;
//!
//! # fn example(
//! #     device: Arc<Device>,
//! #     command_pool: &CommandPool,
//! #     swapchain: &Swapchain,
//! # ) -> Result<(), renderer_rhi::RhiError> {
//! let mut frames = FrameManager::new(device.clone(), command_pool)?;
//!
//! frames.wait_for_frame()?;
//! let Some(_image_index) = frames.acquire_next_image(swapchain)? else {
//!     // Swapchain is out of date: recreate it and try again.
//!     return Ok(());
//! };
//! let cmd = frames.begin_frame()?;
//! // Record commands into `cmd`...
//! # let _ = cmd;
//! frames.end_frame()?;
//! frames.submit(device.graphics_queue())?;
//! let needs_recreate = frames.present(swapchain, device.present_queue())?;
//! frames.next_frame();
//! # let _ = needs_recreate;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use renderer_rhi::command::{CommandBuffer, CommandPool};
use renderer_rhi::device::Device;
use renderer_rhi::swapchain::Swapchain;
use renderer_rhi::sync::{Fence, MAX_FRAMES_IN_FLIGHT, Semaphore, next_frame_index};
use renderer_rhi::{RhiError, RhiResult};

/// Resources owned by one frame slot.
pub struct FrameData {
    command_buffer: CommandBuffer,
    image_available: Semaphore,
    render_finished: Semaphore,
    in_flight: Fence,
}

impl FrameData {
    fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), command_pool)?;
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        // Signaled so the first wait on this slot returns immediately.
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
        })
    }

    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    #[inline]
    pub fn render_finished(&self) -> &Semaphore {
        &self.render_finished
    }

    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

/// Outcome of a swapchain acquire, separated from the Vulkan call so the
/// policy can be tested without a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Render to this image. `suboptimal` asks for a recreate after present.
    Ready { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface; nothing was acquired.
    OutOfDate,
}

impl AcquireOutcome {
    pub fn from_result(result: Result<(u32, bool), vk::Result>) -> RhiResult<Self> {
        match result {
            Ok((image_index, suboptimal)) => Ok(Self::Ready {
                image_index,
                suboptimal,
            }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Self::OutOfDate),
            Err(e) => Err(RhiError::VulkanError(e)),
        }
    }
}

/// Maps a present result to "the swapchain must be recreated".
pub fn present_needs_recreate(result: Result<bool, vk::Result>) -> RhiResult<bool> {
    match result {
        Ok(suboptimal) => Ok(suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
        Err(e) => Err(RhiError::VulkanError(e)),
    }
}

/// The swapchain image held by the current frame between acquire and present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct AcquiredImage {
    image_index: Option<u32>,
    suboptimal: bool,
}

impl AcquiredImage {
    /// Stores the acquire outcome and returns the image to render to, if any.
    fn record(&mut self, outcome: AcquireOutcome) -> Option<u32> {
        *self = match outcome {
            AcquireOutcome::Ready {
                image_index,
                suboptimal,
            } => Self {
                image_index: Some(image_index),
                suboptimal,
            },
            AcquireOutcome::OutOfDate => Self::default(),
        };
        self.image_index
    }

    /// Errors unless an image is held. Guards the fence reset in `begin_frame`.
    fn require(&self) -> RhiResult<u32> {
        self.image_index.ok_or_else(|| {
            RhiError::SwapchainError("begin_frame called without an acquired image".to_string())
        })
    }

    /// Hands the held image to `present` and releases it.
    ///
    /// Returns true if the swapchain should be recreated, either because
    /// presentation reported it or because the acquire was suboptimal.
    fn present_with<F>(&mut self, present: F) -> RhiResult<bool>
    where
        F: FnOnce(u32) -> Result<bool, vk::Result>,
    {
        let image_index = self.image_index.take().ok_or_else(|| {
            RhiError::SwapchainError("present called without an acquired image".to_string())
        })?;
        let suboptimal = std::mem::take(&mut self.suboptimal);
        Ok(present_needs_recreate(present(image_index))? || suboptimal)
    }
}

/// Drives the per-frame synchronization of the draw loop.
///
/// Not thread-safe; used from the render thread only.
pub struct FrameManager {
    device: Arc<Device>,
    frames: Vec<FrameData>,
    current_frame: usize,
    acquired: AcquiredImage,
}

impl FrameManager {
    pub fn new(device: Arc<Device>, command_pool: &CommandPool) -> RhiResult<Self> {
        let frames = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|i| {
                debug!("Creating frame data for slot {}", i);
                FrameData::new(device.clone(), command_pool)
            })
            .collect::<RhiResult<Vec<_>>>()?;

        info!(
            "Frame manager created with {} frames in flight",
            MAX_FRAMES_IN_FLIGHT
        );

        Ok(Self {
            device,
            frames,
            current_frame: 0,
            acquired: AcquiredImage::default(),
        })
    }

    #[inline]
    pub fn current_frame(&self) -> &FrameData {
        &self.frames[self.current_frame]
    }

    /// Slot index in `0..MAX_FRAMES_IN_FLIGHT`.
    #[inline]
    pub fn current_frame_index(&self) -> usize {
        self.current_frame
    }

    /// Swapchain image acquired for the current frame, if any.
    #[inline]
    pub fn image_index(&self) -> Option<u32> {
        self.acquired.image_index
    }

    /// Blocks until the slot's previous submission has finished.
    pub fn wait_for_frame(&self) -> RhiResult<()> {
        self.current_frame().in_flight.wait(u64::MAX)
    }

    /// Acquires the next swapchain image, signaling the slot's
    /// `image_available` semaphore.
    ///
    /// Returns `None` if the swapchain is out of date and must be recreated
    /// before drawing. The slot's fence is left untouched in that case.
    pub fn acquire_next_image(&mut self, swapchain: &Swapchain) -> RhiResult<Option<u32>> {
        let semaphore = self.current_frame().image_available.handle();
        let outcome = AcquireOutcome::from_result(swapchain.acquire_next_image(semaphore))?;
        match outcome {
            AcquireOutcome::Ready {
                suboptimal: true, ..
            } => debug!("Swapchain suboptimal during acquire"),
            AcquireOutcome::OutOfDate => debug!("Swapchain out of date during acquire"),
            AcquireOutcome::Ready { .. } => {}
        }
        Ok(self.acquired.record(outcome))
    }

    /// Resets the slot's fence and command buffer and begins recording.
    ///
    /// Must follow a successful [`acquire_next_image`](Self::acquire_next_image).
    pub fn begin_frame(&self) -> RhiResult<&CommandBuffer> {
        self.acquired.require()?;

        let frame = self.current_frame();
        frame.in_flight.reset()?;
        frame.command_buffer.reset()?;
        frame.command_buffer.begin()?;
        Ok(&frame.command_buffer)
    }

    pub fn end_frame(&self) -> RhiResult<()> {
        self.current_frame().command_buffer.end()
    }

    /// Submits the recorded command buffer to `queue`.
    pub fn submit(&self, queue: vk::Queue) -> RhiResult<()> {
        let frame = self.current_frame();

        let wait_semaphores = [frame.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [frame.command_buffer.handle()];
        let signal_semaphores = [frame.render_finished.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer finished recording in end_frame and the
        // fence was reset in begin_frame.
        unsafe {
            self.device
                .handle()
                .queue_submit(queue, &[submit_info], frame.in_flight.handle())?;
        }
        Ok(())
    }

    /// Presents the acquired image once `render_finished` is signaled.
    ///
    /// Returns true if the swapchain should be recreated, either because
    /// presentation reported it out of date or suboptimal, or because the
    /// acquire already did.
    pub fn present(&mut self, swapchain: &Swapchain, queue: vk::Queue) -> RhiResult<bool> {
        let wait = self.current_frame().render_finished.handle();
        self.acquired
            .present_with(|image_index| swapchain.present(queue, image_index, wait))
    }

    /// Advances to the next slot, wrapping at [`MAX_FRAMES_IN_FLIGHT`].
    pub fn next_frame(&mut self) {
        self.current_frame = next_frame_index(self.current_frame);
    }

    /// Blocks until every slot's last submission has finished.
    pub fn wait_for_all_frames(&self) -> RhiResult<()> {
        for frame in &self.frames {
            frame.in_flight.wait(u64::MAX)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_ready() {
        let outcome = AcquireOutcome::from_result(Ok((2, false))).unwrap();
        assert_eq!(
            outcome,
            AcquireOutcome::Ready {
                image_index: 2,
                suboptimal: false
            }
        );
    }

    #[test]
    fn test_acquire_suboptimal_still_renders() {
        let outcome = AcquireOutcome::from_result(Ok((0, true))).unwrap();
        assert!(matches!(
            outcome,
            AcquireOutcome::Ready {
                suboptimal: true,
                ..
            }
        ));
    }

    #[test]
    fn test_acquire_out_of_date() {
        let outcome =
            AcquireOutcome::from_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap();
        assert_eq!(outcome, AcquireOutcome::OutOfDate);
    }

    #[test]
    fn test_acquire_device_lost_is_error() {
        let err = AcquireOutcome::from_result(Err(vk::Result::ERROR_DEVICE_LOST)).unwrap_err();
        assert!(matches!(
            err,
            RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST)
        ));
    }

    #[test]
    fn test_present_results() {
        assert!(!present_needs_recreate(Ok(false)).unwrap());
        assert!(present_needs_recreate(Ok(true)).unwrap());
        assert!(present_needs_recreate(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap());
        assert!(present_needs_recreate(Err(vk::Result::ERROR_SURFACE_LOST_KHR)).is_err());
    }

    #[test]
    fn test_out_of_date_acquire_blocks_begin_frame() {
        let mut acquired = AcquiredImage::default();
        assert!(acquired.require().is_err());

        assert_eq!(acquired.record(AcquireOutcome::OutOfDate), None);
        assert!(matches!(
            acquired.require(),
            Err(RhiError::SwapchainError(_))
        ));
    }

    #[test]
    fn test_out_of_date_acquire_drops_previous_image() {
        let mut acquired = AcquiredImage::default();
        acquired.record(AcquireOutcome::Ready {
            image_index: 1,
            suboptimal: true,
        });
        acquired.record(AcquireOutcome::OutOfDate);
        assert_eq!(acquired, AcquiredImage::default());
    }

    #[test]
    fn test_present_uses_acquired_image() {
        let mut acquired = AcquiredImage::default();
        let ready = AcquireOutcome::Ready {
            image_index: 2,
            suboptimal: false,
        };
        assert_eq!(acquired.record(ready), Some(2));
        assert_eq!(acquired.require().unwrap(), 2);

        let mut presented = None;
        let recreate = acquired
            .present_with(|index| {
                presented = Some(index);
                Ok(false)
            })
            .unwrap();
        assert_eq!(presented, Some(2));
        assert!(!recreate);
    }

    #[test]
    fn test_suboptimal_acquire_requests_recreate_after_present() {
        let mut acquired = AcquiredImage::default();
        acquired.record(AcquireOutcome::Ready {
            image_index: 0,
            suboptimal: true,
        });
        assert!(acquired.present_with(|_| Ok(false)).unwrap());

        // The flag is consumed by the present that reported it.
        acquired.record(AcquireOutcome::Ready {
            image_index: 1,
            suboptimal: false,
        });
        assert!(!acquired.present_with(|_| Ok(false)).unwrap());
    }

    #[test]
    fn test_present_releases_image() {
        let mut acquired = AcquiredImage::default();
        acquired.record(AcquireOutcome::Ready {
            image_index: 0,
            suboptimal: false,
        });
        acquired.present_with(|_| Ok(false)).unwrap();

        assert_eq!(acquired.image_index, None);
        assert!(acquired.require().is_err());
        assert!(matches!(
            acquired.present_with(|_| Ok(false)),
            Err(RhiError::SwapchainError(_))
        ));
    }

    #[test]
    fn test_present_out_of_date_requests_recreate() {
        let mut acquired = AcquiredImage::default();
        acquired.record(AcquireOutcome::Ready {
            image_index: 0,
            suboptimal: false,
        });
        assert!(
            acquired
                .present_with(|_| Err(vk::Result::ERROR_OUT_OF_DATE_KHR))
                .unwrap()
        );
    }

    #[test]
    fn test_frame_manager_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameManager>();
        assert_send::<FrameData>();
    }
}

use std::mem;
use std::ptr;

use anyhow::{Context as _, Result};
use ash::vk;
use glam::{Mat4, Vec3, Vec4};
use ignis::allocators::MemoryLocation;
use ignis::command::{CmdBuffer, CommandBufferExecutable, CommandBufferRecording};
use ignis::descriptor::DescriptorWriter;
use ignis::resource::{Buffer, BufferCreateInfo};
use ignis::util::ReleaseTicket;

use crate::context::Engine;

/// Bounded safety net for the per-frame fence; exceeding it is fatal
const FRAME_FENCE_TIMEOUT_NS: u64 = 1_000_000_000;

/// Background compute workgroup footprint
const COMPUTE_WORKGROUP_SIZE: u32 = 16;

/// Per-frame uniform data read by the geometry pass
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GpuSceneData {
    pub view: Mat4,
    pub proj: Mat4,
    pub viewproj: Mat4,
    pub ambient_color: Vec4,
    pub sunlight_direction: Vec4,
    pub sunlight_color: Vec4,
}

/// Per-draw push constants; vertices are fetched through the buffer address
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct GpuDrawPushConstants {
    pub world_matrix: Mat4,
    pub vertex_buffer: vk::DeviceAddress,
}

/// Byte view over a push-constant/uniform struct for the raw upload calls
fn as_bytes<T: Sized>(value: &T) -> &[u8] {
    unsafe { std::slice::from_raw_parts(value as *const T as *const u8, mem::size_of::<T>()) }
}

fn dispatch_groups(extent: u32) -> u32 {
    (extent as f32 / COMPUTE_WORKGROUP_SIZE as f32).ceil() as u32
}

impl Engine {
    /// Runs one iteration of the frame protocol: wait on the slot's fence, reclaim the
    /// slot's transient resources, acquire, record all passes into one command buffer,
    /// submit, present, advance. Surface staleness abandons the frame without advancing;
    /// every other failure is unrecoverable and propagates to the caller.
    pub fn draw(&mut self) -> Result<()> {
        let frame_index = self.frames.current_index();

        // 1-2: wait for this slot's previous submission, then reclaim its resources
        {
            let slot = &mut self.frames.slots[frame_index];
            slot.render_fence
                .wait(FRAME_FENCE_TIMEOUT_NS)
                .context("frame fence wait exceeded its timeout")?;
            slot.deletion_queue.flush_resources();
            slot.descriptors.reset_pools()?;
        }

        let render_extent = self.swapchain.render_extent(self.controls.render_scale);
        if render_extent.width == 0 || render_extent.height == 0 {
            return Ok(());
        }

        // 3: acquire a presentable image; staleness abandons the frame for a resize
        let acquired = self.swapchain.swapchain.acquire_next_image(
            FRAME_FENCE_TIMEOUT_NS,
            &self.frames.slots[frame_index].swapchain_semaphore,
        );
        let image_index = match acquired {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    self.swapchain.resize_requested = true;
                }
                image_index
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.swapchain.resize_requested = true;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        // only now is a submission certain; the fence stays signaled across abandoned frames
        self.frames.slots[frame_index].render_fence.reset()?;

        // 4: record every pass into the slot's command buffer
        let cmd = self.frames.slots[frame_index].command_buffer.clone();
        cmd.reset(vk::CommandBufferResetFlags::empty())?;
        let cmd = cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;

        self.swapchain.targets.draw_image.transition(
            &cmd,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::GENERAL,
        );
        self.draw_background(&cmd, render_extent);

        self.swapchain.targets.draw_image.transition(
            &cmd,
            vk::ImageLayout::GENERAL,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );
        self.swapchain.targets.depth_image.transition(
            &cmd,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
        );
        self.draw_geometry(&cmd, render_extent)?;

        // upscale point: blit the rendered region into the presentable image
        self.swapchain.targets.draw_image.transition(
            &cmd,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        );
        self.swapchain.images[image_index as usize].transition(
            &cmd,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        self.swapchain.targets.draw_image.blit_to(
            &cmd,
            &self.swapchain.images[image_index as usize],
            render_extent,
            self.swapchain.swapchain.extent(),
        );

        // UI overlay renders into the presentable image, not the offscreen target
        self.swapchain.images[image_index as usize].transition(
            &cmd,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );
        let overlay_view = self.swapchain.image_views[image_index as usize].handle();
        let overlay_extent = self.swapchain.swapchain.extent();
        self.overlay
            .record_draw_commands(&cmd, overlay_view, overlay_extent);
        self.swapchain.images[image_index as usize].transition(
            &cmd,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );

        let cmd = cmd.end()?;

        // 5: one submission; waits for the acquired image, signals render + slot fence
        let slot = &self.frames.slots[frame_index];
        let cmd_submit_info = cmd.submit_info();
        let submit_info = CommandBufferExecutable::submit_info_sync(
            &[cmd_submit_info],
            &[slot
                .swapchain_semaphore
                .submit_info(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)],
            &[slot
                .render_semaphore
                .submit_info(vk::PipelineStageFlags2::ALL_GRAPHICS)],
        );
        cmd.submit(
            self.queue.handle(),
            &[submit_info],
            slot.render_fence.handle(),
        )?;

        // 6: present; staleness here is handled at the top of the next iteration
        let presented = self
            .swapchain
            .swapchain
            .present(&self.queue, image_index, &slot.render_semaphore);
        match presented {
            Ok(suboptimal) => {
                if suboptimal {
                    self.swapchain.resize_requested = true;
                }
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.swapchain.resize_requested = true;
            }
            Err(err) => return Err(err.into()),
        }

        // 7: advance the monotonic frame counter
        self.frames.advance();
        Ok(())
    }

    /// Background compute pass: the selected effect writes the whole render extent of the
    /// offscreen color target as a storage image.
    fn draw_background(&mut self, cmd: &CommandBufferRecording, render_extent: vk::Extent2D) {
        let effect_index = self.controls.clamp_to(self.background_effects.len());
        let Some(effect) = self.background_effects.get(effect_index) else {
            return;
        };
        let device = self.device.get_handle();
        unsafe {
            device.cmd_bind_pipeline(
                cmd.handle(),
                vk::PipelineBindPoint::COMPUTE,
                effect.pipeline.handle(),
            );
            device.cmd_bind_descriptor_sets(
                cmd.handle(),
                vk::PipelineBindPoint::COMPUTE,
                effect.pipeline.layout(),
                0,
                &[self.draw_image_descriptor_set],
                &[],
            );
            device.cmd_push_constants(
                cmd.handle(),
                effect.pipeline.layout(),
                vk::ShaderStageFlags::COMPUTE,
                0,
                as_bytes(&effect.data),
            );
            device.cmd_dispatch(
                cmd.handle(),
                dispatch_groups(render_extent.width),
                dispatch_groups(render_extent.height),
                1,
            );
        }
    }

    /// Geometry pass over the offscreen color+depth targets at the scaled render extent
    fn draw_geometry(
        &mut self,
        cmd: &CommandBufferRecording,
        render_extent: vk::Extent2D,
    ) -> Result<()> {
        let device = self.device.clone();
        let color_view = self.swapchain.targets.draw_image_view.handle();
        let depth_view = self.swapchain.targets.depth_image_view.handle();

        // frame-scoped uniform buffer; reclaimed when this slot's fence next clears
        let scene_data = self.scene_data(render_extent);
        let mut scene_buffer = Buffer::new(BufferCreateInfo {
            allocator: &self.allocator,
            size: mem::size_of::<GpuSceneData>() as vk::DeviceSize,
            usage_flags: vk::BufferUsageFlags::UNIFORM_BUFFER,
            location: MemoryLocation::CpuToGpu,
            name: "scene data",
        })?;
        scene_buffer
            .mapped_slice_mut()
            .context("scene data buffer is not host visible")?
            [..mem::size_of::<GpuSceneData>()]
            .copy_from_slice(as_bytes(&scene_data));
        let scene_buffer_handle = scene_buffer.handle();

        let frame_index = self.frames.current_index();
        let slot = &mut self.frames.slots[frame_index];
        let scene_descriptor_set = slot
            .descriptors
            .allocate(self.scene_data_descriptor_layout.handle())?;
        slot.deletion_queue.push(ReleaseTicket::Buffer(scene_buffer));
        let mut writer = DescriptorWriter::default();
        writer.write_buffer(
            0,
            scene_buffer_handle,
            mem::size_of::<GpuSceneData>() as vk::DeviceSize,
            0,
            vk::DescriptorType::UNIFORM_BUFFER,
        );
        writer.update_set(&device, scene_descriptor_set);

        let color_attachment = vk::RenderingAttachmentInfo {
            s_type: vk::StructureType::RENDERING_ATTACHMENT_INFO,
            p_next: ptr::null(),
            image_view: color_view,
            image_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            load_op: vk::AttachmentLoadOp::LOAD,
            store_op: vk::AttachmentStoreOp::STORE,
            ..Default::default()
        };
        // reverse depth: the far plane clears to zero
        let depth_attachment = vk::RenderingAttachmentInfo {
            s_type: vk::StructureType::RENDERING_ATTACHMENT_INFO,
            p_next: ptr::null(),
            image_view: depth_view,
            image_layout: vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 0.0,
                    stencil: 0,
                },
            },
            ..Default::default()
        };
        let rendering_info = vk::RenderingInfo {
            s_type: vk::StructureType::RENDERING_INFO,
            p_next: ptr::null(),
            flags: vk::RenderingFlags::empty(),
            render_area: vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent: render_extent,
            },
            layer_count: 1,
            view_mask: 0,
            color_attachment_count: 1,
            p_color_attachments: &color_attachment,
            p_depth_attachment: &depth_attachment,
            p_stencil_attachment: ptr::null(),
            _marker: Default::default(),
        };

        let raw = device.get_handle();
        unsafe {
            raw.cmd_begin_rendering(cmd.handle(), &rendering_info);
            raw.cmd_bind_pipeline(
                cmd.handle(),
                vk::PipelineBindPoint::GRAPHICS,
                self.mesh_pipeline.handle(),
            );
            raw.cmd_set_viewport(
                cmd.handle(),
                0,
                &[vk::Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: render_extent.width as f32,
                    height: render_extent.height as f32,
                    min_depth: 0.0,
                    max_depth: 1.0,
                }],
            );
            raw.cmd_set_scissor(
                cmd.handle(),
                0,
                &[vk::Rect2D {
                    offset: vk::Offset2D::default(),
                    extent: render_extent,
                }],
            );
            raw.cmd_bind_descriptor_sets(
                cmd.handle(),
                vk::PipelineBindPoint::GRAPHICS,
                self.mesh_pipeline.layout(),
                0,
                &[scene_descriptor_set, self.texture_descriptor_set],
                &[],
            );
            for mesh in self.meshes.iter() {
                let push_constants = GpuDrawPushConstants {
                    world_matrix: Mat4::IDENTITY,
                    vertex_buffer: mesh.buffers.vertex_buffer_address,
                };
                raw.cmd_push_constants(
                    cmd.handle(),
                    self.mesh_pipeline.layout(),
                    vk::ShaderStageFlags::VERTEX,
                    0,
                    as_bytes(&push_constants),
                );
                raw.cmd_bind_index_buffer(
                    cmd.handle(),
                    mesh.buffers.index_buffer.handle(),
                    0,
                    vk::IndexType::UINT32,
                );
                for surface in mesh.surfaces.iter() {
                    raw.cmd_draw_indexed(cmd.handle(), surface.count, 1, surface.start_index, 0, 0);
                }
            }
            raw.cmd_end_rendering(cmd.handle());
        }
        Ok(())
    }

    fn scene_data(&self, render_extent: vk::Extent2D) -> GpuSceneData {
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let aspect = render_extent.width as f32 / render_extent.height as f32;
        let mut proj = Mat4::perspective_infinite_reverse_rh(70f32.to_radians(), aspect, 0.1);
        // Vulkan clip space is y-down
        proj.y_axis.y *= -1.0;
        GpuSceneData {
            view,
            proj,
            viewproj: proj * view,
            ambient_color: Vec4::splat(0.1),
            sunlight_direction: Vec4::new(0.0, 1.0, 0.5, 1.0),
            sunlight_color: Vec4::ONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{slot_index, FRAME_OVERLAP};

    /// Mirror of the frame protocol over mock fences and a scriptable acquire: wait,
    /// reclaim, acquire, submit, present, advance. Submission retires when the slot is
    /// next waited on, like a GPU that is never more than one frame behind.
    struct FrameLoopModel {
        fence_signaled: [bool; FRAME_OVERLAP],
        outstanding: [bool; FRAME_OVERLAP],
        reclaims: [u32; FRAME_OVERLAP],
        frame_number: u64,
        resize_requested: bool,
        slots_used: Vec<usize>,
    }

    impl FrameLoopModel {
        /// All fences start signaled so the first uses of each slot never block
        fn init() -> Self {
            Self {
                fence_signaled: [true; FRAME_OVERLAP],
                outstanding: [false; FRAME_OVERLAP],
                reclaims: [0; FRAME_OVERLAP],
                frame_number: 0,
                resize_requested: false,
                slots_used: Vec::new(),
            }
        }

        fn step(&mut self, acquire_stale: bool) {
            let index = slot_index(self.frame_number);
            // wait: returns once the slot's previous submission has retired
            if self.outstanding[index] {
                self.outstanding[index] = false;
                self.fence_signaled[index] = true;
            }
            assert!(self.fence_signaled[index], "wait would block forever");
            // reclaim happens before the acquire status is known
            self.reclaims[index] += 1;
            if acquire_stale {
                self.resize_requested = true;
                return;
            }
            self.fence_signaled[index] = false;
            // at most one outstanding submission per slot
            assert!(!self.outstanding[index]);
            self.outstanding[index] = true;
            self.slots_used.push(index);
            self.frame_number += 1;
        }

        fn resize(&mut self) {
            self.resize_requested = false;
        }
    }

    #[test]
    fn cold_start_leaves_fences_signaled_and_counter_zero() {
        let model = FrameLoopModel::init();
        assert!(model.fence_signaled.iter().all(|signaled| *signaled));
        assert_eq!(model.frame_number, 0);
    }

    #[test]
    fn steady_loop_alternates_slots() {
        let mut model = FrameLoopModel::init();
        for _ in 0..5 {
            model.step(false);
        }
        assert_eq!(model.frame_number, 5);
        assert_eq!(model.slots_used, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn stale_acquire_abandons_the_frame_without_advancing() {
        let mut model = FrameLoopModel::init();
        for _ in 0..3 {
            model.step(false);
        }
        assert_eq!(model.frame_number, 3);

        model.step(true);
        assert!(model.resize_requested);
        assert_eq!(model.frame_number, 3);
        // the reclaim still ran for the abandoned iteration
        assert_eq!(model.reclaims[slot_index(3)], 2);

        model.resize();
        model.step(false);
        assert_eq!(model.frame_number, 4);
    }

    #[test]
    fn long_runs_never_double_submit_a_slot() {
        let mut model = FrameLoopModel::init();
        for iteration in 0..1000 {
            model.step(iteration % 97 == 0);
            if model.resize_requested {
                model.resize();
            }
        }
    }

    #[test]
    fn compute_dispatch_covers_the_render_extent() {
        assert_eq!(dispatch_groups(1700), 107);
        assert_eq!(dispatch_groups(900), 57);
        assert_eq!(dispatch_groups(16), 1);
        assert_eq!(dispatch_groups(17), 2);
        assert_eq!(dispatch_groups(1), 1);
    }
}

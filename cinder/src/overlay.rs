use ash::vk;
use ignis::command::CommandBufferRecording;

/// Narrow seam for the external UI overlay: it declares widgets on `new_frame` and records
/// its draw commands into the supplied command buffer, targeting the presentable image view
/// directly rather than the offscreen draw target.
pub trait OverlayRenderer {
    fn new_frame(&mut self);

    fn record_draw_commands(
        &mut self,
        cmd: &CommandBufferRecording,
        target_view: vk::ImageView,
        target_extent: vk::Extent2D,
    );
}

/// Headless stand-in when no overlay backend is wired up
#[derive(Debug, Default)]
pub struct NullOverlay;

impl OverlayRenderer for NullOverlay {
    fn new_frame(&mut self) {}

    fn record_draw_commands(
        &mut self,
        _cmd: &CommandBufferRecording,
        _target_view: vk::ImageView,
        _target_extent: vk::Extent2D,
    ) {
    }
}

/// The two pieces of engine state the overlay's widgets mutate. The render pass sequencer
/// reads them fresh every frame, so edits take effect on the next frame at the latest.
#[derive(Debug, Clone, Copy)]
pub struct OverlayControls {
    pub background_effect: usize,
    pub render_scale: f32,
}

impl Default for OverlayControls {
    fn default() -> Self {
        Self {
            background_effect: 0,
            render_scale: 1.0,
        }
    }
}

impl OverlayControls {
    /// Selected effect index, clamped to the available effects
    pub fn clamp_to(&mut self, effect_count: usize) -> usize {
        if effect_count == 0 {
            return 0;
        }
        self.background_effect = self.background_effect.min(effect_count - 1);
        self.background_effect
    }
}

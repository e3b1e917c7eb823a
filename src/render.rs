//! Recorded render commands and their grouping into render passes.
//!
//! The RHI does not talk to a render pass while commands are issued. Clears and
//! draws are recorded as [`RenderCommand`]s and turned into passes only when the
//! frame is submitted:
//!
//! - a clear starts a new pass that clears its attachments on load
//! - draws recorded before the first clear load whatever the target holds
//! - clears without draws in between collapse into the last one

/// Everything one indexed draw needs, captured when it was recorded.
///
/// wgpu handles are reference counted, so the captured clones stay valid even
/// if the render array or a texture is dropped before the frame is submitted.
#[derive(Clone, Debug)]
pub struct DrawCall {
    pub pipeline: Option<wgpu::RenderPipeline>,
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub index_buffer: wgpu::Buffer,
    pub index_format: wgpu::IndexFormat,
    pub index_count: u32,
    /// Texture units at record time, indexed by bind group slot.
    pub bind_groups: Vec<Option<wgpu::BindGroup>>,
}

impl DrawCall {
    /// Encodes the draw into `render_pass`. Returns `false` if no pipeline was
    /// bound when the draw was recorded, in which case nothing is encoded.
    pub fn encode(&self, render_pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(pipeline) = &self.pipeline else {
            return false;
        };
        render_pass.set_pipeline(pipeline);
        for (slot, group) in self.bind_groups.iter().enumerate() {
            if let Some(group) = group {
                render_pass.set_bind_group(slot as u32, group, &[]);
            }
        }
        for (slot, buffer) in self.vertex_buffers.iter().enumerate() {
            render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        true
    }
}

/// A recorded command. Generic over the draw payload so pass planning does
/// not depend on GPU handles.
#[derive(Clone, Debug)]
pub enum RenderCommand<D = DrawCall> {
    Clear { color: wgpu::Color },
    Draw(D),
}

/// One render pass: an optional clear on load, followed by draws.
#[derive(Clone, Debug, PartialEq)]
pub struct PassPlan<D = DrawCall> {
    /// `None` loads the existing contents of the target.
    pub clear: Option<wgpu::Color>,
    pub draws: Vec<D>,
}

impl<D> PassPlan<D> {
    fn load() -> Self {
        Self {
            clear: None,
            draws: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.clear.is_none() && self.draws.is_empty()
    }
}

/// Groups `commands` into render passes in recording order.
pub fn plan_passes<D>(commands: impl IntoIterator<Item = RenderCommand<D>>) -> Vec<PassPlan<D>> {
    let mut passes = Vec::new();
    let mut current = PassPlan::load();
    for command in commands {
        match command {
            RenderCommand::Clear { color } => {
                if !current.draws.is_empty() {
                    passes.push(std::mem::replace(&mut current, PassPlan::load()));
                }
                current.clear = Some(color);
            }
            RenderCommand::Draw(draw) => current.draws.push(draw),
        }
    }
    if !current.is_empty() {
        passes.push(current);
    }
    passes
}

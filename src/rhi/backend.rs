//! The wgpu realisation of [`Rhi`].

use std::iter;

use crate::{
    config::RhiConfig,
    context::Gpu,
    data_structures::{render_array::RenderArray, texture::DepthBuffer},
    error::RhiError,
    render::{DrawCall, RenderCommand, plan_passes},
    rhi::{MAX_TEXTURE_UNITS, RenderApiType, Rhi, resolve_index_count},
};

/// Records commands against a wgpu device and submits them per frame.
#[derive(Debug)]
pub struct WgpuRhi {
    api: RenderApiType,
    gpu: Gpu,
    clear_color: wgpu::Color,
    pipeline: Option<wgpu::RenderPipeline>,
    /// One entry per bind group slot, at most [`MAX_TEXTURE_UNITS`].
    texture_units: Vec<Option<wgpu::BindGroup>>,
    commands: Vec<RenderCommand>,
    depth_enabled: bool,
    depth: Option<DepthBuffer>,
}

impl WgpuRhi {
    /// Creates the RHI for the device in `gpu`.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device and queue commands are recorded for and submitted to
    /// * `config` provides the initial clear color and whether a depth buffer is attached
    pub fn new(gpu: Gpu, config: &RhiConfig) -> Self {
        let units = gpu.device.limits().max_bind_groups.min(MAX_TEXTURE_UNITS) as usize;
        log::debug!("{} texture units available", units);
        Self {
            api: gpu.api,
            gpu,
            clear_color: config.clear_color(),
            pipeline: None,
            texture_units: vec![None; units],
            commands: Vec::new(),
            depth_enabled: config.depth_buffer,
            depth: None,
        }
    }

    /// Commands recorded since the last submit.
    pub fn pending_commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of texture units, the device's bind group limit capped at
    /// [`MAX_TEXTURE_UNITS`].
    pub fn texture_unit_count(&self) -> u32 {
        self.texture_units.len() as u32
    }

    pub fn texture_unit(&self, slot: u32) -> Option<&wgpu::BindGroup> {
        self.texture_units.get(slot as usize)?.as_ref()
    }

    /// Returns the depth view for a target of the given size, recreating the
    /// buffer when the target was resized.
    fn depth_view(&mut self, width: u32, height: u32) -> Option<wgpu::TextureView> {
        if !self.depth_enabled {
            return None;
        }
        if !self.depth.as_ref().is_some_and(|d| d.matches(width, height)) {
            log::debug!("Creating {}x{} depth buffer", width, height);
            self.depth = Some(DepthBuffer::new(
                &self.gpu.device,
                width,
                height,
                "depth buffer",
            ));
        }
        self.depth.as_ref().map(|d| d.view.clone())
    }
}

impl Rhi for WgpuRhi {
    fn api_type(&self) -> RenderApiType {
        self.api
    }

    fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    fn clear_buffer(&mut self) {
        self.commands.push(RenderCommand::Clear {
            color: self.clear_color,
        });
    }

    fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        self.pipeline = Some(pipeline.clone());
    }

    fn bind_texture_unit(
        &mut self,
        slot: u32,
        bind_group: Option<&wgpu::BindGroup>,
    ) -> Result<(), RhiError> {
        let available = self.texture_units.len() as u32;
        let unit = self
            .texture_units
            .get_mut(slot as usize)
            .ok_or(RhiError::InvalidBindingTarget { slot, available })?;
        *unit = bind_group.cloned();
        Ok(())
    }

    fn draw_elements(&mut self, array: &RenderArray, index_count: u32) -> Result<(), RhiError> {
        let index_count = resolve_index_count(index_count, array.index_count())?;
        self.commands.push(RenderCommand::Draw(DrawCall {
            pipeline: self.pipeline.clone(),
            vertex_buffers: array.vertex_buffers().to_vec(),
            index_buffer: array.index_buffer().clone(),
            index_format: array.index_format(),
            index_count,
            bind_groups: self.texture_units.clone(),
        }));
        Ok(())
    }

    fn submit(&mut self, target: &wgpu::Texture) -> Option<wgpu::SubmissionIndex> {
        if self.commands.is_empty() {
            return None;
        }
        let passes = plan_passes(std::mem::take(&mut self.commands));
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = self.depth_view(target.width(), target.height());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RHI Encoder"),
            });
        for pass in &passes {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("RHI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match pass.clear {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: depth_view.as_ref().map(|view| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: match pass.clear {
                                Some(_) => wgpu::LoadOp::Clear(1.0),
                                None => wgpu::LoadOp::Load,
                            },
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            for draw in &pass.draws {
                if !draw.encode(&mut render_pass) {
                    log::warn!("you attempted to draw without a pipeline bound; draw skipped");
                }
            }
        }
        Some(self.gpu.queue.submit(iter::once(encoder.finish())))
    }
}

//! Vertex and index buffers grouped for one draw call.

use wgpu::util::DeviceExt;

use crate::context::Gpu;

/// Index element types a [`RenderArray`] can be built from.
pub trait IndexElement: bytemuck::Pod {
    const FORMAT: wgpu::IndexFormat;
}

impl IndexElement for u16 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint16;
}

impl IndexElement for u32 {
    const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;
}

/// One or more vertex buffers plus the index buffer that draws them.
///
/// Vertex buffers are bound to consecutive slots in the order they were added,
/// so per-instance data can follow the per-vertex buffer.
#[derive(Debug)]
pub struct RenderArray {
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
}

impl RenderArray {
    /// Uploads `vertices` and `indices` into a new vertex and index buffer.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device the buffers are created on
    /// * `label` prefixes the labels of both buffers
    /// * `vertices` is the per-vertex data, bound to slot 0
    /// * `indices` is the index data; its element type picks the index format
    pub fn new<V: bytemuck::Pod, I: IndexElement>(
        gpu: &Gpu,
        label: &str,
        vertices: &[V],
        indices: &[I],
    ) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} vertex buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} index buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Self {
            vertex_buffers: vec![vertex_buffer],
            index_buffer,
            index_format: I::FORMAT,
            index_count: indices.len() as u32,
        }
    }

    /// Adds another vertex buffer, bound to the next free slot.
    ///
    /// # Arguments
    ///
    /// * `gpu` is the device the buffer is created on
    /// * `label` names the buffer
    /// * `data` is the buffer contents
    pub fn add_vertex_buffer<V: bytemuck::Pod>(&mut self, gpu: &Gpu, label: &str, data: &[V]) {
        let buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.vertex_buffers.push(buffer);
    }

    pub fn vertex_buffers(&self) -> &[wgpu::Buffer] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_format(&self) -> wgpu::IndexFormat {
        self.index_format
    }

    /// Number of indices stored in the index buffer.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

use std::path::{Path, PathBuf};

use gameworld_rhi::{Context, Gpu, RenderApiType, RhiConfig, WgpuRhi};

/// Device and queue of wgpu's no-op backend. Every call is validated but
/// nothing is executed, so no adapter is needed.
pub fn noop_gpu() -> Gpu {
    let ctx = futures::executor::block_on(Context::new(
        &RhiConfig::new(RenderApiType::Noop),
        None,
    ))
    .expect("the noop backend is always available");
    ctx.gpu
}

/// Like [`noop_gpu`], but the device enforces `limits`.
pub fn noop_gpu_with_limits(limits: wgpu::Limits) -> Gpu {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::NOOP,
        backend_options: wgpu::BackendOptions {
            noop: wgpu::NoopBackendOptions { enable: true },
            ..Default::default()
        },
        ..Default::default()
    });
    let adapter = futures::executor::block_on(
        instance.request_adapter(&wgpu::RequestAdapterOptions::default()),
    )
    .expect("the noop backend is always available");
    let (device, queue) = futures::executor::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("limited noop device"),
            required_limits: limits,
            ..Default::default()
        },
    ))
    .expect("the noop adapter accepts any limits");
    Gpu {
        api: RenderApiType::Noop,
        device,
        queue,
    }
}

pub fn noop_rhi() -> WgpuRhi {
    WgpuRhi::new(noop_gpu(), &RhiConfig::new(RenderApiType::Noop))
}

/// Writes a `width` x `height` PNG with `channels` channels, filled with `value`.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, channels: u8, value: u8) -> PathBuf {
    let path = dir.join(name);
    match channels {
        1 => image::GrayImage::from_pixel(width, height, image::Luma([value]))
            .save(&path)
            .unwrap(),
        2 => image::GrayAlphaImage::from_pixel(width, height, image::LumaA([value, 255]))
            .save(&path)
            .unwrap(),
        3 => image::RgbImage::from_pixel(width, height, image::Rgb([value; 3]))
            .save(&path)
            .unwrap(),
        4 => image::RgbaImage::from_pixel(width, height, image::Rgba([value; 4]))
            .save(&path)
            .unwrap(),
        n => panic!("no fixture for {n} channels"),
    }
    path
}

/// Six square RGBA faces named after their cube face.
pub fn write_cube_faces(dir: &Path, edge: u32) -> [PathBuf; 6] {
    ["px", "nx", "py", "ny", "pz", "nz"].map(|name| write_png(dir, &format!("{name}.png"), edge, edge, 4, 200))
}

#[cfg(feature = "integration-tests")]
pub fn gpu_context() -> Context {
    futures::executor::block_on(Context::new(&RhiConfig::new(RenderApiType::Primary), None))
        .expect("integration tests need a GPU adapter")
}

/// Copies array layer `layer` of `texture` back to the CPU, rows tightly packed.
#[cfg(feature = "integration-tests")]
pub fn read_layer(gpu: &Gpu, texture: &wgpu::Texture, layer: u32, bytes_per_pixel: u32) -> Vec<u8> {
    let (width, height) = (texture.width(), texture.height());
    let row = width * bytes_per_pixel;
    // copies need 256 byte aligned rows
    let padded_row = row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let output_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        size: (padded_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: Some("readback buffer"),
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    gpu.device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })
        .unwrap();
    futures::executor::block_on(rx.receive()).unwrap().unwrap();

    let data = buffer_slice.get_mapped_range();
    let pixels = data
        .chunks(padded_row as usize)
        .flat_map(|r| &r[..row as usize])
        .copied()
        .collect();
    drop(data);
    output_buffer.unmap();
    pixels
}

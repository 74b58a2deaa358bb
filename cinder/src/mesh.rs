use std::mem;
use std::path::Path;

use anyhow::{Context, Result};
use ash::vk;
use glam::{Vec3, Vec4};
use ignis::allocators::{GpuAllocator, MemoryLocation};
use ignis::command::CmdBuffer;
use ignis::resource::{Buffer, BufferCreateInfo};
use ignis::traits::Destructible;
use ignis::util::ImmediateSubmit;

/// Interleaved vertex layout; uvs are split around the vec3s to avoid padding
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub uv_x: f32,
    pub normal: Vec3,
    pub uv_y: f32,
    pub color: Vec4,
}

/// GPU-resident geometry of one mesh; vertices are pulled through the buffer address
pub struct GpuMeshBuffers {
    pub index_buffer: Buffer,
    pub vertex_buffer: Buffer,
    pub vertex_buffer_address: vk::DeviceAddress,
}

/// One indexed draw range within a mesh
#[derive(Debug, Clone, Copy)]
pub struct GeoSurface {
    pub start_index: u32,
    pub count: u32,
}

pub struct MeshAsset {
    pub name: String,
    pub surfaces: Vec<GeoSurface>,
    pub buffers: GpuMeshBuffers,
}

/// Places vertex/index data on the GPU, staging through a host visible buffer and copying
/// on the immediate-submit channel. Setup-time only; stalls the calling thread.
pub fn upload_mesh(
    allocator: &GpuAllocator,
    immediate: &ImmediateSubmit,
    indices: &[u32],
    vertices: &[Vertex],
) -> Result<GpuMeshBuffers> {
    let vertex_buffer_size = mem::size_of_val(vertices) as vk::DeviceSize;
    let index_buffer_size = mem::size_of_val(indices) as vk::DeviceSize;

    let vertex_buffer = Buffer::new(BufferCreateInfo {
        allocator,
        size: vertex_buffer_size,
        usage_flags: vk::BufferUsageFlags::STORAGE_BUFFER
            | vk::BufferUsageFlags::TRANSFER_DST
            | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS,
        location: MemoryLocation::GpuOnly,
        name: "mesh vertices",
    })?;
    let vertex_buffer_address = vertex_buffer.address();
    let index_buffer = Buffer::new(BufferCreateInfo {
        allocator,
        size: index_buffer_size,
        usage_flags: vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
        location: MemoryLocation::GpuOnly,
        name: "mesh indices",
    })?;

    let mut staging = Buffer::new(BufferCreateInfo {
        allocator,
        size: vertex_buffer_size + index_buffer_size,
        usage_flags: vk::BufferUsageFlags::TRANSFER_SRC,
        location: MemoryLocation::CpuToGpu,
        name: "mesh staging",
    })?;
    {
        let mapped = staging
            .mapped_slice_mut()
            .context("staging buffer is not host visible")?;
        mapped[..vertex_buffer_size as usize].copy_from_slice(bytemuck::cast_slice(vertices));
        mapped[vertex_buffer_size as usize..(vertex_buffer_size + index_buffer_size) as usize]
            .copy_from_slice(bytemuck::cast_slice(indices));
    }

    immediate.submit(|ctx| {
        let vertex_copy = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: vertex_buffer_size,
        };
        let index_copy = vk::BufferCopy {
            src_offset: vertex_buffer_size,
            dst_offset: 0,
            size: index_buffer_size,
        };
        unsafe {
            ctx.device.get_handle().cmd_copy_buffer(
                ctx.cmd.handle(),
                staging.handle(),
                vertex_buffer.handle(),
                &[vertex_copy],
            );
            ctx.device.get_handle().cmd_copy_buffer(
                ctx.cmd.handle(),
                staging.handle(),
                index_buffer.handle(),
                &[index_copy],
            );
        }
    })?;

    staging.destroy();

    Ok(GpuMeshBuffers {
        index_buffer,
        vertex_buffer,
        vertex_buffer_address,
    })
}

/// Imports every mesh of a glTF/glb file and uploads it. Absence or a malformed file is
/// surfaced as a recoverable error; the caller decides how far to escalate.
pub fn load_gltf_meshes<P: AsRef<Path>>(
    allocator: &GpuAllocator,
    immediate: &ImmediateSubmit,
    path: P,
) -> Result<Vec<MeshAsset>> {
    let path = path.as_ref();
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("importing meshes from {}", path.display()))?;

    let mut assets = Vec::new();
    for mesh in document.meshes() {
        let mut indices: Vec<u32> = Vec::new();
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut surfaces: Vec<GeoSurface> = Vec::new();

        for primitive in mesh.primitives() {
            let reader = primitive
                .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

            let start_index = indices.len() as u32;
            let vertex_offset = vertices.len() as u32;

            let primitive_indices: Vec<u32> = reader
                .read_indices()
                .map(|read| read.into_u32().collect())
                .unwrap_or_default();
            surfaces.push(GeoSurface {
                start_index,
                count: primitive_indices.len() as u32,
            });
            indices.extend(primitive_indices.into_iter().map(|index| index + vertex_offset));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|read| read.collect())
                .unwrap_or_default();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|read| read.collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|read| read.into_f32().collect())
                .unwrap_or_default();
            let colors: Vec<[f32; 4]> = reader
                .read_colors(0)
                .map(|read| read.into_rgba_f32().collect())
                .unwrap_or_default();

            for (index, position) in positions.iter().enumerate() {
                let uv = uvs.get(index).copied().unwrap_or([0.0, 0.0]);
                vertices.push(Vertex {
                    position: Vec3::from_array(*position),
                    uv_x: uv[0],
                    normal: normals
                        .get(index)
                        .copied()
                        .map(Vec3::from_array)
                        .unwrap_or(Vec3::Z),
                    uv_y: uv[1],
                    color: colors
                        .get(index)
                        .copied()
                        .map(Vec4::from_array)
                        .unwrap_or(Vec4::ONE),
                });
            }
        }

        let name = mesh.name().unwrap_or("unnamed").to_string();
        let buffers_gpu = upload_mesh(allocator, immediate, indices.as_slice(), vertices.as_slice())?;
        assets.push(MeshAsset {
            name,
            surfaces,
            buffers: buffers_gpu,
        });
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_has_no_padding() {
        assert_eq!(mem::size_of::<Vertex>(), 48);
        assert_eq!(mem::offset_of!(Vertex, uv_x), 12);
        assert_eq!(mem::offset_of!(Vertex, normal), 16);
        assert_eq!(mem::offset_of!(Vertex, uv_y), 28);
        assert_eq!(mem::offset_of!(Vertex, color), 32);
    }
}

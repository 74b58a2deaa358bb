use std::ptr;

use ash::vk;

enum WriteSource {
    Image(usize),
    Buffer(usize),
}

struct WriteEntry {
    binding: u32,
    descriptor_type: vk::DescriptorType,
    source: WriteSource,
}

/// Batches descriptor writes so a set can be filled in one `vkUpdateDescriptorSets` call.
/// Image/buffer infos are stored by value; pointers are only formed inside `update_set`.
#[derive(Default)]
pub struct DescriptorWriter {
    image_infos: Vec<vk::DescriptorImageInfo>,
    buffer_infos: Vec<vk::DescriptorBufferInfo>,
    entries: Vec<WriteEntry>,
}

impl DescriptorWriter {
    pub fn write_image(
        &mut self,
        binding: u32,
        image_view: vk::ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
        descriptor_type: vk::DescriptorType,
    ) -> &mut Self {
        self.image_infos.push(vk::DescriptorImageInfo {
            sampler,
            image_view,
            image_layout: layout,
        });
        self.entries.push(WriteEntry {
            binding,
            descriptor_type,
            source: WriteSource::Image(self.image_infos.len() - 1),
        });
        self
    }

    pub fn write_buffer(
        &mut self,
        binding: u32,
        buffer: vk::Buffer,
        size: vk::DeviceSize,
        offset: vk::DeviceSize,
        descriptor_type: vk::DescriptorType,
    ) -> &mut Self {
        self.buffer_infos.push(vk::DescriptorBufferInfo {
            buffer,
            offset,
            range: size,
        });
        self.entries.push(WriteEntry {
            binding,
            descriptor_type,
            source: WriteSource::Buffer(self.buffer_infos.len() - 1),
        });
        self
    }

    pub fn clear(&mut self) {
        self.image_infos.clear();
        self.buffer_infos.clear();
        self.entries.clear();
    }

    pub fn update_set(&self, device: &crate::device::LogicalDevice, set: vk::DescriptorSet) {
        let writes: Vec<vk::WriteDescriptorSet> = self
            .entries
            .iter()
            .map(|entry| {
                let mut write = vk::WriteDescriptorSet {
                    s_type: vk::StructureType::WRITE_DESCRIPTOR_SET,
                    p_next: ptr::null(),
                    dst_set: set,
                    dst_binding: entry.binding,
                    dst_array_element: 0,
                    descriptor_count: 1,
                    descriptor_type: entry.descriptor_type,
                    p_image_info: ptr::null(),
                    p_buffer_info: ptr::null(),
                    p_texel_buffer_view: ptr::null(),
                    _marker: Default::default(),
                };
                match entry.source {
                    WriteSource::Image(index) => write.p_image_info = &self.image_infos[index],
                    WriteSource::Buffer(index) => write.p_buffer_info = &self.buffer_infos[index],
                }
                write
            })
            .collect();
        unsafe {
            device
                .get_handle()
                .update_descriptor_sets(writes.as_slice(), &[]);
        }
    }
}

//! Resource descriptors describe the shape of a buffer or image, without owning any memory.

use ash::vk;
use static_assertions::assert_impl_all;

use crate::allocator::memory_type::MemoryType;

/// Type of a resource in the render graph.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ResourceType {
    /// Image resource
    #[default]
    Image,
    /// Buffer resource
    Buffer,
}

/// Describes a buffer resource.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Where the buffer memory should live.
    pub memory_type: MemoryType,
    /// Size of the buffer in bytes. Zero means the size is not yet known.
    pub size: u64,
    /// Buffer usage flags.
    pub usage: vk::BufferUsageFlags,
}

/// Describes an image resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageDesc {
    /// Where the image memory should live.
    pub memory_type: MemoryType,
    /// Dimensionality of the image. Decides which extent components must be non-zero.
    pub ty: vk::ImageType,
    /// Pixel format
    pub format: vk::Format,
    /// Size of the image. Unused components should be 1.
    pub extent: vk::Extent3D,
    /// Number of mip levels
    pub mip_levels: u32,
    /// Number of array layers
    pub array_layers: u32,
    /// Sample count, anything above one makes this a multisampled image.
    pub samples: vk::SampleCountFlags,
    /// Image usage flags.
    pub usage: vk::ImageUsageFlags,
}

impl Default for ImageDesc {
    fn default() -> Self {
        Self {
            memory_type: MemoryType::GpuOnly,
            ty: vk::ImageType::TYPE_2D,
            format: vk::Format::UNDEFINED,
            extent: vk::Extent3D {
                width: 0,
                height: 0,
                depth: 1,
            },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            usage: vk::ImageUsageFlags::empty(),
        }
    }
}

impl ImageDesc {
    /// Whether this image can be used as a color or depth-stencil attachment.
    pub fn is_attachment(&self) -> bool {
        self.usage
            .intersects(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    /// Whether this image has more than one sample per pixel.
    pub fn is_multisampled(&self) -> bool {
        !self.samples.is_empty() && self.samples != vk::SampleCountFlags::TYPE_1
    }

    /// Returns true if every extent component required by the image type is non-zero.
    pub fn is_valid(&self) -> bool {
        let extent = self.extent;
        if self.ty == vk::ImageType::TYPE_3D {
            extent.width != 0 && extent.height != 0 && extent.depth != 0
        } else if self.ty == vk::ImageType::TYPE_2D {
            extent.width != 0 && extent.height != 0
        } else {
            extent.width != 0
        }
    }
}

/// Semantic shape of a render graph resource. A descriptor with a zero size or extent is invalid,
/// and means the shape has not been decided yet. Pass types can fill in such descriptors while the graph
/// is compiled, for example by copying the descriptor of one of their inputs.
///
/// # Example
/// ```
/// # use phobos_rg::*;
/// let desc = ResourceDescriptor::image_2d(MemoryType::GpuOnly, vk::Format::R8G8B8A8_UNORM, 1280, 720, vk::ImageUsageFlags::COLOR_ATTACHMENT);
/// assert!(desc.is_valid());
/// assert!(!ResourceDescriptor::default().is_valid());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceDescriptor {
    /// Buffer resource
    Buffer(BufferDesc),
    /// Image resource
    Image(ImageDesc),
}

assert_impl_all!(ResourceDescriptor: Send, Sync, Copy);

impl Default for ResourceDescriptor {
    /// The default descriptor is an empty buffer, which is not valid.
    fn default() -> Self {
        ResourceDescriptor::Buffer(BufferDesc::default())
    }
}

impl ResourceDescriptor {
    /// Describe a buffer of `size` bytes.
    pub fn buffer(memory_type: MemoryType, size: u64, usage: vk::BufferUsageFlags) -> Self {
        ResourceDescriptor::Buffer(BufferDesc {
            memory_type,
            size,
            usage,
        })
    }

    /// Describe a single-sampled 2D image with one mip level and one layer.
    pub fn image_2d(memory_type: MemoryType, format: vk::Format, width: u32, height: u32, usage: vk::ImageUsageFlags) -> Self {
        ResourceDescriptor::Image(ImageDesc {
            memory_type,
            format,
            extent: vk::Extent3D {
                width,
                height,
                depth: 1,
            },
            usage,
            ..Default::default()
        })
    }

    /// Returns the same descriptor with a different sample count. Has no effect on buffers.
    pub fn with_samples(self, samples: vk::SampleCountFlags) -> Self {
        match self {
            ResourceDescriptor::Image(image) => ResourceDescriptor::Image(ImageDesc {
                samples,
                ..image
            }),
            buffer => buffer,
        }
    }

    /// Get the resource type of this descriptor
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceDescriptor::Buffer(_) => ResourceType::Buffer,
            ResourceDescriptor::Image(_) => ResourceType::Image,
        }
    }

    /// Get the memory type hint of this descriptor
    pub fn memory_type(&self) -> MemoryType {
        match self {
            ResourceDescriptor::Buffer(buffer) => buffer.memory_type,
            ResourceDescriptor::Image(image) => image.memory_type,
        }
    }

    /// A descriptor is valid if none of its sizes are zero.
    pub fn is_valid(&self) -> bool {
        match self {
            ResourceDescriptor::Buffer(buffer) => buffer.size != 0,
            ResourceDescriptor::Image(image) => image.is_valid(),
        }
    }
}

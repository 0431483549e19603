//! Usage classes of transient heap segments.

use bitflags::bitflags;

use crate::resource::desc::ResourceDescriptor;

bitflags! {
    /// Resource classes a heap segment can hold. Segments are matched by capability rather than by exact
    /// descriptor, so dissimilar resources with compatible requirements can share memory over time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeapUsage: u32 {
        /// Buffers
        const BUFFER = 0x01;
        /// Images usable as color or depth-stencil attachments
        const IMAGE_RT_DS = 0x02;
        /// Images that are never used as attachments
        const IMAGE_NON_RT_DS = 0x04;
        /// Multisampled images
        const IMAGE_MSAA = 0x08;
    }
}

impl HeapUsage {
    /// The usage flags a segment must contain to hold a resource with this descriptor.
    pub fn required_for(desc: &ResourceDescriptor) -> Self {
        match desc {
            ResourceDescriptor::Buffer(_) => HeapUsage::BUFFER,
            ResourceDescriptor::Image(image) => {
                let mut usage = if image.is_attachment() {
                    HeapUsage::IMAGE_RT_DS
                } else {
                    HeapUsage::IMAGE_NON_RT_DS
                };
                if image.is_multisampled() {
                    usage |= HeapUsage::IMAGE_MSAA;
                }
                usage
            }
        }
    }
}

use anyhow::Result;

use framework::*;
use phobos_rg::prelude::*;

mod framework;

#[test]
fn free_list_first_fit() {
    let mut list = FreeList::new(1024);
    assert_eq!(list.allocate(100, 1), Some(0));
    assert_eq!(list.allocate(100, 1), Some(100));
    assert_eq!(list.ranges(), &[200..1024]);
    assert_eq!(list.allocate(2000, 1), None);
    assert_eq!(list.free_bytes(), 824);
}

#[test]
fn free_list_alignment_splits_block() {
    let mut list = FreeList::new(1024);
    assert_eq!(list.allocate(10, 1), Some(0));
    // Leaves a gap before and a remainder after the aligned allocation
    assert_eq!(list.allocate(64, 64), Some(64));
    assert_eq!(list.ranges(), &[10..64, 128..1024]);
    // Exactly fills the gap
    assert_eq!(list.allocate(54, 1), Some(10));
    assert_eq!(list.ranges(), &[128..1024]);
    // Aligned to the end of the block, only a gap is left
    assert_eq!(list.allocate(512, 512), Some(512));
    assert_eq!(list.ranges(), &[128..512]);
}

#[test]
fn free_list_skips_blocks_too_small_after_alignment() {
    let mut list = FreeList::new(1024);
    list.allocate(1, 1);
    list.allocate(300, 1);
    list.release(1..301);
    assert_eq!(list.ranges(), &[1..1024]);
    // The aligned start leaves a gap of 1..256 in front
    assert_eq!(list.allocate(256, 256), Some(256));
    assert_eq!(list.ranges(), &[1..256, 512..1024]);
}

#[test]
fn free_list_release_merges_neighbours() {
    let mut list = FreeList::new(400);
    for _ in 0..4 {
        list.allocate(100, 1);
    }
    assert!(list.ranges().is_empty());

    list.release(100..200);
    assert_eq!(list.ranges(), &[100..200]);
    // Merges with the next range
    list.release(0..100);
    assert_eq!(list.ranges(), &[0..200]);
    // No neighbour
    list.release(300..400);
    assert_eq!(list.ranges(), &[0..200, 300..400]);
    // Merges with both
    list.release(200..300);
    assert_eq!(list.ranges(), &[0..400]);
}

#[test]
fn free_list_coalescing_is_order_independent() {
    let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
    for order in orders {
        let mut list = FreeList::new(1024);
        let offsets = (0..4).map(|_| list.allocate(256, 256).unwrap()).collect::<Vec<_>>();
        for index in order {
            list.release(offsets[index]..offsets[index] + 256);
        }
        assert_eq!(list.ranges(), &[0..1024], "release order {order:?}");
        assert_eq!(list.free_bytes(), 1024);
    }
}

#[test]
fn heap_usage_follows_descriptor() {
    assert_eq!(HeapUsage::required_for(&buffer(16)), HeapUsage::BUFFER);
    assert_eq!(HeapUsage::required_for(&render_target(8, 8)), HeapUsage::IMAGE_RT_DS);
    let sampled = ResourceDescriptor::image_2d(MemoryType::GpuOnly, vk::Format::R8_UNORM, 8, 8, vk::ImageUsageFlags::SAMPLED);
    assert_eq!(HeapUsage::required_for(&sampled), HeapUsage::IMAGE_NON_RT_DS);
    let msaa = render_target(8, 8).with_samples(vk::SampleCountFlags::TYPE_4);
    assert_eq!(HeapUsage::required_for(&msaa), HeapUsage::IMAGE_RT_DS | HeapUsage::IMAGE_MSAA);
}

#[test]
fn heap_reuses_released_memory() -> Result<()> {
    let device = MockDevice::new();
    let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());

    let a = heap.allocate(&buffer(256))?;
    let b = heap.allocate(&buffer(256))?;
    assert_eq!(heap.allocation_range(a), Some((0, 0..256)));
    assert_eq!(heap.allocation_range(b), Some((0, 256..512)));

    heap.release(a);
    assert!(heap.resource(a).is_none());
    let c = heap.allocate(&buffer(100))?;
    // Sized and aligned by the device
    assert_eq!(heap.allocation_range(c), Some((0, 0..256)));

    assert_eq!(heap.segment_count(), 1);
    assert_eq!(heap.reserved_bytes(), DEFAULT_SEGMENT_SIZE);
    assert_eq!(heap.live_allocations(), 2);
    assert_eq!(device.state().heaps.len(), 1);
    assert_eq!(device.state().placed_resources, 3);

    heap.release(b);
    heap.release(c);
    assert_eq!(heap.free_ranges(0).unwrap(), &[0..DEFAULT_SEGMENT_SIZE]);
    Ok(())
}

#[test]
fn heap_separates_incompatible_resources() -> Result<()> {
    let device = MockDevice::new();
    let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());

    let buf = heap.allocate(&buffer(256))?;
    let rt = heap.allocate(&render_target(16, 16))?;
    let readback = heap.allocate(&ResourceDescriptor::buffer(MemoryType::GpuToCpu, 256, vk::BufferUsageFlags::TRANSFER_DST))?;
    let buf2 = heap.allocate(&buffer(256))?;

    assert_eq!(heap.segment_count(), 3);
    assert_eq!(heap.allocation_range(buf).unwrap().0, 0);
    assert_eq!(heap.allocation_range(rt).unwrap().0, 1);
    assert_eq!(heap.allocation_range(readback).unwrap().0, 2);
    assert_eq!(heap.allocation_range(buf2).unwrap().0, 0);
    assert_eq!(heap.segment_usage(1), Some(HeapUsage::IMAGE_RT_DS));

    let state = device.state();
    let locations = state.heaps.iter().map(|heap| heap.0).collect::<Vec<_>>();
    assert_eq!(
        locations,
        vec![MemoryLocation::GpuOnly, MemoryLocation::GpuOnly, MemoryLocation::GpuToCpu]
    );
    Ok(())
}

#[test]
fn large_allocation_gets_its_own_segment() -> Result<()> {
    let device = MockDevice::new();
    let settings = HeapSettings {
        segment_size: 4096,
    };
    let mut heap = TransientHeap::new(device.clone(), settings);

    let small = heap.allocate(&buffer(1024))?;
    let large = heap.allocate(&buffer(10_000))?;
    assert_eq!(heap.allocation_range(small).unwrap().0, 0);
    assert_eq!(heap.allocation_range(large), Some((1, 0..10_240)));
    assert_eq!(heap.reserved_bytes(), 4096 + 10_240);
    assert_eq!(device.state().heaps[1].2, 10_240);
    Ok(())
}

#[test]
fn failed_placement_returns_the_range() -> Result<()> {
    let device = MockDevice::new();
    let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());
    let a = heap.allocate(&buffer(256))?;

    device.state().fail_placement = true;
    assert!(heap.allocate(&buffer(512)).is_err());
    assert_eq!(heap.free_ranges(0).unwrap(), &[256..DEFAULT_SEGMENT_SIZE]);
    assert_eq!(heap.live_allocations(), 1);

    device.state().fail_placement = false;
    let b = heap.allocate(&buffer(512))?;
    assert_eq!(heap.allocation_range(b), Some((0, 256..768)));
    heap.release(a);
    heap.release(b);
    Ok(())
}

#[test]
fn stale_release_is_ignored() -> Result<()> {
    let _ = pretty_env_logger::try_init();
    let mut heap = TransientHeap::new(MockDevice::new(), HeapSettings::default());
    let a = heap.allocate(&buffer(256))?;
    heap.release(a);
    heap.release(a);
    assert_eq!(heap.free_ranges(0).unwrap(), &[0..DEFAULT_SEGMENT_SIZE]);

    // A new allocation in the same slot does not resolve through the old handle
    let b = heap.allocate(&buffer(256))?;
    assert_ne!(a, b);
    assert!(heap.resource(a).is_none());
    heap.release(a);
    assert_eq!(heap.live_allocations(), 1);
    heap.release(b);
    Ok(())
}

#[test]
fn invalid_descriptor_is_rejected() {
    let device = MockDevice::new();
    let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());
    let err = heap.allocate(&ResourceDescriptor::default()).unwrap_err();
    assert!(matches!(error_of(&err), Error::InvalidResourceDesc(_)));
    assert_eq!(device.state().object_count(), 0);
}

#[test]
fn segments_are_created_at_the_resource_location() -> Result<()> {
    let device = MockDevice::new();
    let mut heap = TransientHeap::new(device.clone(), HeapSettings::default());
    let upload = heap.allocate(&ResourceDescriptor::buffer(MemoryType::CpuToGpu, 64, vk::BufferUsageFlags::UNIFORM_BUFFER))?;
    let local = heap.allocate(&buffer(64))?;
    assert_eq!(buffer(16).memory_type(), MemoryType::default());

    let state = device.state();
    assert_eq!(state.heaps[0].0, MemoryLocation::CpuToGpu);
    assert_eq!(state.heaps[1].0, MemoryLocation::GpuOnly);
    drop(state);
    heap.release(upload);
    heap.release(local);
    Ok(())
}

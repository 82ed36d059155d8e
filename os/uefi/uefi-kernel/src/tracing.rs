//! # Trace output

use kernel_boot::Handoff;
use kernel_boot::memory_map::memory_type_name;
use kernel_serial::serial_trace;

pub fn trace_handoff(handoff: &Handoff) {
    let map = &handoff.memory_map;
    let meta = map.meta();

    serial_trace!("Handoff state in kernel:\n");
    serial_trace!(
        "   ST ptr = {:018x}",
        handoff.env.system_table().as_ptr() as usize
    );
    serial_trace!(", image = {:018x}", handoff.env.image().as_ptr() as usize);
    serial_trace!("\n");
    serial_trace!(" MMAP key = {}", meta.key.0);
    serial_trace!(", MMAP len = {}", meta.map_size);
    serial_trace!(", MMAP desc size = {}", meta.desc_size);
    serial_trace!(", MMAP desc version = {}", meta.desc_version);
    serial_trace!("\n");

    for desc in map.descriptors() {
        serial_trace!(
            "   {:<20} {:016x} {:>10} pages\n",
            memory_type_name(desc.ty),
            desc.phys_start,
            desc.page_count
        );
    }

    let summary = map.summary();
    serial_trace!(
        " {} descriptors, {} pages, {} usable ({} MiB)\n",
        summary.descriptors,
        summary.total_pages,
        summary.usable_pages,
        summary.usable_bytes() >> 20
    );

    if handoff.report.is_degraded() {
        serial_trace!(" degraded modules: {:?}\n", handoff.report.degraded);
    }
}
